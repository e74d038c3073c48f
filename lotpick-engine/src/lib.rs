pub mod api;
pub mod config;
pub mod derive;
pub mod draw;
pub mod engine;
pub mod error;
pub mod progress;
pub mod select;
pub mod tally;
