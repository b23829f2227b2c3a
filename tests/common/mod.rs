//! Integration test common infrastructure.
//!
//! Builds in-process admin API routers over fresh databases and spawns
//! `ipacld` processes for end-to-end runs.

pub mod api;
pub mod server;

#[allow(unused_imports)]
pub use api::TestApi;
#[allow(unused_imports)]
pub use server::TestServer;
