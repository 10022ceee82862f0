//! Outbound adapters implementing the domain's repository ports.
//!
//! - **memory**: in-process document store, used without a database and by
//!   the integration suites
//! - **persistence**: PostgreSQL repositories using Diesel
//!
//! Adapters translate between domain documents and storage representations
//! and hold no business rules.

pub mod memory;
pub mod persistence;
