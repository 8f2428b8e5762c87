//! Configuration types for clusterset-dns.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::DnsError;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// DNS server configuration.
    pub dns: DnsConfig,

    /// Clusterset zones and record settings.
    #[serde(default)]
    pub clusterset: ClustersetConfig,

    /// Node inventory (Headscale) connection.
    pub inventory: InventoryConfig,

    /// Telemetry configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Config {
    /// Validate the configuration and normalize the clusterset zones.
    pub fn validated(mut self) -> Result<Self, DnsError> {
        self.clusterset = self.clusterset.normalized()?;
        self.inventory.validate()?;
        Ok(self)
    }
}

/// DNS server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    /// Address for DNS server to listen on (UDP and TCP).
    pub listen_addr: SocketAddr,

    /// Idle timeout for TCP connections, in seconds.
    #[serde(default = "default_tcp_timeout")]
    pub tcp_timeout_secs: u64,

    /// Instance label attached to the request counter.
    /// Defaults to `dns://<listen_addr>`.
    #[serde(default)]
    pub server_label: Option<String>,
}

impl DnsConfig {
    /// Label identifying this serving instance in metrics.
    pub fn server_label(&self) -> String {
        self.server_label
            .clone()
            .unwrap_or_else(|| format!("dns://{}", self.listen_addr))
    }

    /// TCP idle timeout as a [`Duration`].
    pub fn tcp_timeout(&self) -> Duration {
        Duration::from_secs(self.tcp_timeout_secs)
    }
}

/// Clusterset settings shared read-only by every query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClustersetConfig {
    /// Zones this server is authoritative for (e.g. `clusterset.local`).
    #[serde(default = "default_zones")]
    pub zones: Vec<String>,

    /// TTL for synthesized records in seconds.
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Name of the local cluster, published in TXT records.
    #[serde(default = "default_cluster_name")]
    pub cluster_name: String,

    /// Name of the clusterset, published in TXT records.
    #[serde(default = "default_clusterset_name")]
    pub clusterset_name: String,
}

impl Default for ClustersetConfig {
    fn default() -> Self {
        Self {
            zones: default_zones(),
            ttl: default_ttl(),
            cluster_name: default_cluster_name(),
            clusterset_name: default_clusterset_name(),
        }
    }
}

impl ClustersetConfig {
    /// Lowercase the zones and strip leading/trailing dots.
    ///
    /// The root zone `.` is kept as is. An empty zone list, or a zone that is
    /// empty once the dots are stripped, is rejected.
    pub fn normalized(mut self) -> Result<Self, DnsError> {
        if self.zones.is_empty() {
            return Err(DnsError::Config(
                "clusterset.zones must contain at least one zone".to_string(),
            ));
        }

        let mut zones = Vec::with_capacity(self.zones.len());
        for zone in &self.zones {
            let zone = zone.trim().to_ascii_lowercase();
            if zone == "." {
                zones.push(zone);
                continue;
            }
            let trimmed = zone.trim_matches('.');
            if trimmed.is_empty() {
                return Err(DnsError::Config(format!("invalid zone {zone:?}")));
            }
            zones.push(trimmed.to_string());
        }

        self.zones = zones;
        Ok(self)
    }
}

/// Node inventory connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Base URL of the Headscale API (e.g. `http://headscale:8080`).
    pub url: String,

    /// API key sent as a bearer token.
    pub api_key: String,

    /// Timeout applied by the HTTP client to every request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Deadline for the endpoint lookup performed while answering a query, in seconds.
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_secs: u64,
}

impl InventoryConfig {
    fn validate(&self) -> Result<(), DnsError> {
        if self.url.trim().is_empty() {
            return Err(DnsError::Config("inventory.url is required".to_string()));
        }
        if self.api_key.is_empty() {
            return Err(DnsError::Config("inventory.api_key is required".to_string()));
        }
        Ok(())
    }

    /// Per-request HTTP timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Endpoint lookup deadline.
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level filter (e.g., "info", "debug", "clusterset_dns=debug,warn").
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prometheus metrics exporter address.
    #[serde(default)]
    pub prometheus_addr: Option<SocketAddr>,

    /// OpenTelemetry configuration.
    #[serde(default)]
    pub opentelemetry: Option<OpenTelemetryConfig>,
}

/// OpenTelemetry exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenTelemetryConfig {
    /// OTLP endpoint (e.g., "http://localhost:4317").
    pub endpoint: String,

    /// Service name for traces.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            prometheus_addr: None,
            opentelemetry: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "clusterset-dns".to_string()
}

fn default_tcp_timeout() -> u64 {
    30
}

fn default_zones() -> Vec<String> {
    vec![".".to_string()]
}

fn default_ttl() -> u32 {
    300
}

fn default_cluster_name() -> String {
    "default-cluster".to_string()
}

fn default_clusterset_name() -> String {
    "default-clusterset".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_lookup_timeout() -> u64 {
    5
}
