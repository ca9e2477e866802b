//! QUADS API client.
//!
//! Typed asynchronous methods for every QUADS resource (hosts, clouds,
//! schedules, assignments, interfaces, disks, memory, processors, vlans,
//! moves) on top of the `quads-core` transport.
//!
//! ```no_run
//! use quads_api::{QuadsApi, QueryParams};
//!
//! # async fn run() -> quads_api::Result<()> {
//! let api = QuadsApi::builder("https://quads.example.com/api/v3")?
//!     .with_basic_auth("admin", "password")
//!     .build()?;
//!
//! let hosts = api
//!     .scoped(|api| async move {
//!         api.filter_hosts(&QueryParams::from([("model", "r640")])).await
//!     })
//!     .await?;
//! println!("{hosts}");
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod client;
pub mod routes;
pub mod transport;

pub use client::{QuadsApi, QuadsApiBuilder};
pub use quads_core::{ApiResponse, Error, ErrorKind, QueryParams};
pub use transport::QuadsTransport;

/// Convenient result alias that reuses the shared QUADS error type.
pub type Result<T> = quads_core::Result<T>;
