#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use
)]

pub mod app;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod error;
pub mod memory;
pub mod modes;
pub mod outbox;
pub mod providers;
pub mod speech;
pub mod vault;

pub use config::Config;
