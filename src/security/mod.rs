//! Request admission against the block store.

pub mod admission;

pub use admission::{Admission, AdmissionDecision};
