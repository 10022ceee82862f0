//! Q.Vote ballot submission backend.
//!
//! The crate is laid out hexagonally: [`domain`] owns the vote transaction
//! rules and the ports it needs, [`inbound`] adapts HTTP onto the driving
//! port, and [`outbound`] implements the driven ports over PostgreSQL or an
//! in-process store.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
