//! Error types for clusterset-dns.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in the DNS server.
#[derive(Debug, Error)]
pub enum DnsError {
    /// IO error (network, file, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Inventory client error
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// DNS protocol error
    #[error("DNS protocol error: {0}")]
    Proto(#[from] hickory_proto::ProtoError),
}

/// Errors surfaced by the node inventory.
///
/// The query path does not distinguish between variants: every one of them
/// turns into a SERVFAIL for the question being answered.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Transport failure (connect, TLS, body read, client-side timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The inventory answered with a non-200 status.
    #[error("API request failed with status {status}: {body}")]
    Status {
        /// Status code returned by the inventory.
        status: reqwest::StatusCode,
        /// Response body, kept verbatim for logging.
        body: String,
    },

    /// The response body was not the expected JSON document.
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The lookup deadline expired before the inventory answered.
    #[error("inventory lookup timed out after {0:?}")]
    Timeout(Duration),

    /// The configured base URL cannot be used to build request URLs.
    #[error("invalid inventory URL: {0}")]
    InvalidUrl(String),
}
