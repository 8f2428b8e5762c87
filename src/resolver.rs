//! Endpoint resolution against the node inventory.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use crate::error::InventoryError;
use crate::identity::ServiceIdentity;
use crate::inventory::{InventoryClient, Node};

/// Default deadline for one inventory round trip made on behalf of a query.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Decides whether a node serves a given service identity.
///
/// Implementations must be pure: the answer depends only on the node and the
/// identity.
pub trait EndpointMatcher: Send + Sync {
    /// Returns true when `node` is an endpoint of `identity`.
    fn matches(&self, node: &Node, identity: &ServiceIdentity) -> bool;
}

/// Matches nodes whose display name contains both the service and the
/// namespace, case-insensitively and in any order.
///
/// The inventory has no notion of services or namespaces, so node names are
/// the only signal available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameSubstringMatcher;

impl EndpointMatcher for NameSubstringMatcher {
    fn matches(&self, node: &Node, identity: &ServiceIdentity) -> bool {
        let name = node.name.to_lowercase();
        name.contains(&identity.service().to_lowercase())
            && name.contains(&identity.namespace().to_lowercase())
    }
}

/// Resolves service identities to inventory nodes.
#[derive(Clone)]
pub struct EndpointResolver {
    client: Arc<dyn InventoryClient>,
    matcher: Arc<dyn EndpointMatcher>,
    timeout: Duration,
}

impl EndpointResolver {
    /// Create a resolver using [`NameSubstringMatcher`].
    pub fn new(client: Arc<dyn InventoryClient>) -> Self {
        Self {
            client,
            matcher: Arc::new(NameSubstringMatcher),
            timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Replace the matching policy.
    pub fn with_matcher(mut self, matcher: Arc<dyn EndpointMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Set the deadline for each inventory lookup.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// List all inventory nodes and keep those matching `identity`.
    ///
    /// Inventory order is preserved. An empty result is not an error; any
    /// inventory failure, including the deadline expiring, is returned as is.
    pub async fn find_endpoints(
        &self,
        identity: &ServiceIdentity,
    ) -> Result<Vec<Node>, InventoryError> {
        let nodes = tokio::time::timeout(self.timeout, self.client.list_nodes(None))
            .await
            .map_err(|_| InventoryError::Timeout(self.timeout))??;

        let total = nodes.len();
        let matched: Vec<Node> = nodes
            .into_iter()
            .filter(|node| {
                let hit = self.matcher.matches(node, identity);
                trace!(node = %node.name, %identity, hit, "endpoint match");
                hit
            })
            .collect();

        debug!(%identity, total, matched = matched.len(), "resolved endpoints");
        Ok(matched)
    }
}
