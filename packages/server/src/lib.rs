// Expert Search Service - API Core
//
// This crate submits long-running expert searches to the Clado deep-research
// API, polls every search in the background until it finishes, and writes the
// results and progress back to the project tables.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
