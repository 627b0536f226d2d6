//! Network subsystem — raw OS probes and the report aggregator.

pub mod aggregator;
pub mod probe;

pub use aggregator::{Aggregator, NetReport};
pub use probe::{OsProbe, Probe};
