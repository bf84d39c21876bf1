//! Requested-document policies.

pub mod review;

pub use review::{ReviewPolicy, ReviewUrgency, TriagedDocument};
