//! HTTP control API
//!
//! Lets a UI drive the scanning station over REST and follow it over SSE.

pub mod health;
pub mod scan;
pub mod sse;

pub use health::health_routes;
pub use scan::scan_routes;
pub use sse::event_stream;
