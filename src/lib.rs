#![warn(clippy::pedantic)]
// Noisy doc/signature lints that would require annotating every pub function
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::uninlined_format_args)]
// Intentional casts in the timing/scoring math (char counts, second fractions)
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod chat;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod persona;
pub mod providers;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
