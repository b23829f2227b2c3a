//! Repository for blocked IP addresses.

mod models;
mod queries;

pub use models::{BlockOptions, BlockRecord, BlockStatus, BlockUpdate, ListFilter};
pub use queries::BlockRepository;
