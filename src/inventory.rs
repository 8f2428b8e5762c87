//! Node inventory contract.
//!
//! The inventory is the mesh control plane (Headscale) that knows every node
//! of every cluster in the clusterset. Queries only ever read from it; the
//! write operations are part of the contract so that tooling built on the
//! same client can provision users.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InventoryError;

/// A node (endpoint) registered in the inventory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Node {
    /// Opaque node identifier.
    pub id: String,
    /// Machine key of the node.
    pub machine_key: String,
    /// WireGuard node key.
    pub node_key: String,
    /// Disco key used for path discovery.
    pub disco_key: String,
    /// Addresses as reported by the inventory, v4 and v6 mixed, unparsed.
    pub ip_addresses: Vec<String>,
    /// Display name. Endpoint matching is done against this field.
    pub name: String,
    /// Owning user. One user per member cluster by convention.
    pub user: User,
    /// Last time the node checked in.
    pub last_seen: Option<DateTime<Utc>>,
    /// Key expiry.
    pub expiry: Option<DateTime<Utc>>,
    /// Registration time.
    pub created_at: Option<DateTime<Utc>>,
    /// How the node was registered (auth key, CLI, OIDC).
    pub register_method: String,
    /// Whether the node is currently connected to the control plane.
    pub online: bool,
    /// Subnet routes approved for this node.
    pub approved_routes: Vec<String>,
    /// Subnet routes advertised by this node.
    pub available_routes: Vec<String>,
}

/// A user (node owner) in the inventory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    /// Opaque user identifier.
    pub id: String,
    /// Unique user name.
    pub name: String,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Human readable name.
    pub display_name: String,
    /// Contact email.
    pub email: String,
}

/// Body of `GET /api/v1/node`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListNodesResponse {
    /// All nodes visible to the API key.
    pub nodes: Vec<Node>,
}

/// Body of `GET /api/v1/node/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetNodeResponse {
    /// The requested node.
    pub node: Node,
}

/// Body of `GET /api/v1/health`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthResponse {
    /// Whether the inventory can reach its database.
    pub database_connectivity: bool,
}

/// Body of `POST /api/v1/user`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// Unique user name.
    pub name: String,
    /// Human readable name.
    pub display_name: String,
    /// Contact email.
    pub email: String,
}

/// Response of `POST /api/v1/user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserResponse {
    /// The created user.
    pub user: User,
}

/// Operations offered by the node inventory.
///
/// Only [`InventoryClient::list_nodes`] is on the query path. Implementations
/// must be safe to call concurrently from many in-flight queries.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// List every node, optionally restricted server-side to one user.
    async fn list_nodes(&self, user_filter: Option<&str>) -> Result<Vec<Node>, InventoryError>;

    /// Fetch a single node by id.
    async fn get_node(&self, node_id: &str) -> Result<Node, InventoryError>;

    /// Report the inventory's own health.
    async fn health(&self) -> Result<HealthResponse, InventoryError>;

    /// Create a user.
    async fn create_user(&self, request: &CreateUserRequest) -> Result<User, InventoryError>;
}
