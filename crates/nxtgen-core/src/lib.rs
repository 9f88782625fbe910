pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod finding;
pub mod io;
pub mod mcp;
pub mod paths;
pub mod pipeline;
pub mod repository;
pub mod script;
pub mod sequencer;
pub mod target;
pub mod types;
pub mod workflow;

pub use error::{NxtgenError, Result};
