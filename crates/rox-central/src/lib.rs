//! rox-central
//!
//! Client-side view of the StackRox Central API.
//!
//! - `types`: remote representations of clusters and init bundles
//! - `enums`: closed name↔code tables for the enumerated remote fields
//! - `api`: the `CentralApi` service contract, `Transport` and `Connection`
//! - `rest`: REST/JSON transport over TLS with bearer-token auth

pub mod api;
pub mod endpoint;
pub mod enums;
pub mod error;
pub mod rest;
pub mod retry;
pub mod token;
pub mod types;

pub use crate::api::{BoxFuture, CentralApi, Channel, Connection, Transport};
pub use crate::endpoint::Endpoint;
pub use crate::error::{format_err_chain, RemoteError};
pub use crate::rest::RestTransport;
pub use crate::retry::{RetryConfig, RetryPolicy};
pub use crate::token::BearerToken;
