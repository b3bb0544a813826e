//! Canonical trial records and the aggregation workflow.

pub mod trial;
