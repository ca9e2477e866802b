//! # quads-core
//!
//! Transport core for talking to a QUADS server.
//!
//! This crate owns everything the resource catalog relies on: configuration,
//! the error taxonomy, retry policy, URL and query-string construction, and
//! the authenticated [`session::QuadsSession`] that performs requests.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and status classification
//! - [`config`] - Client configuration, loadable from serde maps or the environment
//! - [`client`] - HTTP client settings and retry policy
//! - [`endpoint`] - Endpoints and URL joining
//! - [`query`] - Query-string builder for filter mappings
//! - [`session`] - Authenticated session and the `request` primitive

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod query;
pub mod session;

// Re-export commonly used types
pub use endpoint::{join_url, path_segment, Endpoint};
pub use error::{Error, ErrorKind, Result};
pub use query::QueryParams;
pub use session::{ApiResponse, AuthState, QuadsSession, QuadsSessionBuilder};
