pub mod categorize;
pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod report;
pub mod stats;
pub mod sync;
pub mod tracker;
