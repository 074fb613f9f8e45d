//! Console-side client for the storefront API: an authenticated push
//! connection plus the request/response calls used to reconcile after a
//! missed push.

pub mod client;
pub mod connection;
pub mod error;
pub mod sse;

pub use client::{ConsoleClient, StaticToken, TokenSource};
pub use connection::{ConnectionState, HubConnection};
pub use error::ConsoleError;
