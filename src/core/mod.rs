pub mod error;
pub mod lifecycle;
pub mod segment;

pub use error::{Result, SweepError};
pub use lifecycle::{LifecycleState, SkipReason, classify};
pub use segment::{MarkerState, SegmentName, WalSegment};
