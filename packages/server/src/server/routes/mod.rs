// HTTP routes
pub mod expert_search;
pub mod health;

pub use expert_search::*;
pub use health::*;
