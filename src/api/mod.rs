//! HTTP API.
//!
//! Staff register and log in on the open routes; everything touching
//! patient data sits behind a bearer-token middleware stack:
//! Auth → Audit → Handler.
//!
//! The router is composable: `api_router()` returns a `Router` that can
//! be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::serve;
pub use types::ApiContext;
