//! Strategy — review scoring, acceptance filtering, and point budgeting.

pub mod budget;
pub mod confidence;
pub mod filter;

pub use budget::{affordable, Affordable, Costed};
pub use confidence::ConfidenceScorer;
pub use filter::{EntryFilter, FilterOutcome};
