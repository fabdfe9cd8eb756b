pub mod expert;
pub mod project;

pub use expert::NewExpert;
pub use project::ProjectTracking;
