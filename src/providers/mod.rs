pub mod base;
pub mod openrouter;

pub use base::{CompletionProvider, CompletionRequest};
pub use openrouter::OpenRouterProvider;
