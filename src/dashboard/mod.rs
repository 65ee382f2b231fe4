//! Lead analytics computed over the members fetched from Mailchimp.
//!
//! Everything here is pure: callers pass the records and the current time, which keeps the
//! week/day boundaries testable.

pub mod insights;
pub mod lead_filter;
pub mod segments;

pub use insights::{audience_breakdown, filter_options, Insights};
pub use lead_filter::{DatePreset, LeadFilter, LeadPage};
pub use segments::Segment;
