//! DNS server setup and lifecycle management.

use hickory_server::ServerFuture;
use std::sync::Arc;
use tokio::net::{TcpListener, UdpSocket};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::engine::QueryEngine;
use crate::error::DnsError;
use crate::handler::ClustersetHandler;
use crate::headscale::HeadscaleClient;
use crate::inventory::InventoryClient;
use crate::metrics::RequestCounter;
use crate::resolver::EndpointResolver;

/// Check the inventory once at startup; failures are logged, never fatal.
async fn check_inventory(client: &dyn InventoryClient) {
    match client.health().await {
        Ok(health) if health.database_connectivity => {
            info!("Inventory reachable");
        }
        Ok(_) => {
            warn!("Inventory reachable but reports no database connectivity");
        }
        Err(e) => {
            warn!(error = %e, "Inventory health check failed, queries will SERVFAIL until it recovers");
        }
    }
}

/// DNS server answering clusterset queries from a Headscale inventory.
pub struct DnsServer {
    config: Config,
    client: Arc<dyn InventoryClient>,
}

impl DnsServer {
    /// Create a server talking to the Headscale API named in the configuration.
    pub fn new(config: Config) -> Result<Self, DnsError> {
        let client = HeadscaleClient::from_config(&config.inventory)?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Create a server using the given inventory client.
    pub fn with_client(config: Config, client: Arc<dyn InventoryClient>) -> Self {
        Self { config, client }
    }

    /// Build the query engine serving this configuration.
    pub fn engine(&self) -> QueryEngine {
        let resolver = EndpointResolver::new(self.client.clone())
            .with_timeout(self.config.inventory.lookup_timeout());
        let requests = RequestCounter::new(self.config.dns.server_label());
        QueryEngine::new(self.config.clusterset.clone(), resolver, requests)
    }

    /// Run the DNS server until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), DnsError> {
        let dns = &self.config.dns;
        info!(
            listen_addr = %dns.listen_addr,
            zones = ?self.config.clusterset.zones,
            inventory = %self.config.inventory.url,
            "Starting clusterset-dns server"
        );

        if self.config.clusterset.zones.iter().any(|z| z == ".") {
            warn!("Root zone \".\" is configured; it never matches a query name and every query will SERVFAIL");
        }

        check_inventory(self.client.as_ref()).await;

        let handler = ClustersetHandler::new(self.engine());
        let mut server = ServerFuture::new(handler);

        // Bind UDP
        let udp_socket = UdpSocket::bind(dns.listen_addr).await?;
        info!(addr = %dns.listen_addr, "DNS UDP listening");
        server.register_socket(udp_socket);

        // Bind TCP
        let tcp_listener = TcpListener::bind(dns.listen_addr).await?;
        info!(addr = %dns.listen_addr, "DNS TCP listening");
        server.register_listener(tcp_listener, dns.tcp_timeout());

        info!(
            zones = ?self.config.clusterset.zones,
            "DNS server ready to serve queries"
        );

        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("DNS server shutdown requested");
            }
            result = server.block_until_done() => {
                if let Err(e) = result {
                    error!("DNS server error: {}", e);
                }
            }
        }

        info!("DNS server stopped");
        Ok(())
    }
}
