pub mod config;
pub mod events;
pub mod findings;
pub mod sequences;
pub mod servers;
pub mod steps;
pub mod workflows;
