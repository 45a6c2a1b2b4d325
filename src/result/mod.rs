pub mod report;

pub use report::{RunReport, RunStatus};
