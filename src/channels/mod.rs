pub mod base;
pub mod telegram;

pub use base::GroupChannel;
pub use telegram::TelegramChannel;
