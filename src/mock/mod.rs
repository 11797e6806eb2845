//! A lightweight in-process HTTP server that stands in for the upstream
//! quote and completion providers, so the fetchers and the HTTP boundary
//! can be exercised without contacting real services.

mod server;

pub use server::*;
