//! Subcommand implementations

pub mod channels;
pub mod config;
pub mod doctor;
pub mod run;
pub mod summarize;
