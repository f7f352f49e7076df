pub mod config;
pub mod error;
pub mod fs;
pub mod installer;
pub mod logging;
pub mod types;
pub mod utils;

pub use colored::Colorize;
