//! Clusterset DNS - A DNS server answering multi-cluster service names from a
//! Headscale node inventory.
//!
//! Queries for `<service>.<namespace>.svc.clusterset.local` are answered by
//! listing the nodes known to a Headscale coordination server, picking the
//! ones whose name mentions both the service and the namespace, and
//! synthesizing A, AAAA, SRV and TXT records from them. Nothing is cached:
//! every question reads the inventory.
//!
//! ## Features
//!
//! - A / AAAA records from node addresses
//! - One SRV record pointing at the service owner name
//! - TXT metadata naming the cluster and clusterset
//! - Pass-through of names outside the clusterset zones to a next handler,
//!   SERVFAIL when there is none
//! - Graceful shutdown support
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        clusterset-dns                           │
//! │                                                                 │
//! │  ┌──────────────────┐    ┌──────────────────┐                  │
//! │  │ Headscale Client │◀───│ Endpoint         │                  │
//! │  │ (REST /api/v1)   │    │ Resolver         │                  │
//! │  └──────────────────┘    └────────▲─────────┘                  │
//! │                                   │                             │
//! │                          ┌────────┴─────────┐                  │
//! │                          │  Query Engine    │                  │
//! │                          │  (zone, parse,   │                  │
//! │                          │   synthesize)    │                  │
//! │                          └────────▲─────────┘                  │
//! │                                   │                             │
//! │                          ┌────────┴─────────┐                  │
//! │                          │  Clusterset      │◀── UDP/TCP       │
//! │                          │  Handler         │──▶ next handler  │
//! │                          └──────────────────┘                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## DNS Resolution
//!
//! ```text
//! web.prod.svc.clusterset.local  A
//!   → service "web", namespace "prod"
//!   → list nodes, keep names containing "web" and "prod"
//!   → return A records with each node's IPv4 addresses
//! ```
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use clusterset_dns::{Config, DnsServer};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config: Config = load_config().validated().unwrap();
//!
//!     let shutdown = CancellationToken::new();
//!     let server = DnsServer::new(config).unwrap();
//!     server.run(shutdown).await.unwrap();
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod headscale;
pub mod identity;
pub mod inventory;
pub mod metrics;
pub mod records;
pub mod resolver;
pub mod server;
pub mod telemetry;
pub mod zone;

// Re-export main types
pub use config::{ClustersetConfig, Config, DnsConfig, InventoryConfig, TelemetryConfig};
pub use engine::{Disposition, QueryEngine, QueryOutcome};
pub use error::{DnsError, InventoryError};
pub use handler::ClustersetHandler;
pub use headscale::HeadscaleClient;
pub use identity::ServiceIdentity;
pub use inventory::{InventoryClient, Node};
pub use resolver::EndpointResolver;
pub use server::DnsServer;
