//! Answer record construction.

use hickory_proto::rr::rdata::{A, AAAA, SRV, TXT};
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::debug;

use crate::config::ClustersetConfig;
use crate::identity::ServiceIdentity;
use crate::inventory::Node;

/// SRV priority advertised for every service.
pub const SRV_PRIORITY: u16 = 10;
/// SRV weight advertised for every service.
pub const SRV_WEIGHT: u16 = 10;
/// SRV port advertised for every service.
pub const SRV_PORT: u16 = 80;

/// Builds answer records from resolved endpoints.
///
/// Every builder is a pure function of its inputs, so the same endpoints
/// always produce the same records in the same order.
#[derive(Debug, Clone)]
pub struct RecordSynthesizer {
    ttl: u32,
    cluster_name: String,
    clusterset_name: String,
}

impl RecordSynthesizer {
    /// Create a synthesizer stamping `ttl` on every record.
    pub fn new(ttl: u32, cluster_name: impl Into<String>, clusterset_name: impl Into<String>) -> Self {
        Self {
            ttl,
            cluster_name: cluster_name.into(),
            clusterset_name: clusterset_name.into(),
        }
    }

    /// Create a synthesizer from the clusterset configuration.
    pub fn from_config(config: &ClustersetConfig) -> Self {
        Self::new(
            config.ttl,
            config.cluster_name.clone(),
            config.clusterset_name.clone(),
        )
    }

    /// Build the answers for a question of type `rtype`.
    ///
    /// Returns `None` for record types that are not served. The caller
    /// answers those with an empty NOERROR.
    pub fn synthesize(
        &self,
        rtype: RecordType,
        endpoints: &[Node],
        identity: &ServiceIdentity,
    ) -> Result<Option<Vec<Record>>, hickory_proto::ProtoError> {
        let records = match rtype {
            RecordType::A => self.a_records(endpoints, identity)?,
            RecordType::AAAA => self.aaaa_records(endpoints, identity)?,
            RecordType::SRV => self.srv_records(endpoints, identity)?,
            RecordType::TXT => self.txt_records(endpoints, identity)?,
            _ => return Ok(None),
        };
        Ok(Some(records))
    }

    /// One A record per IPv4 address across all endpoints. Addresses shared
    /// by several endpoints are not deduplicated.
    pub fn a_records(
        &self,
        endpoints: &[Node],
        identity: &ServiceIdentity,
    ) -> Result<Vec<Record>, hickory_proto::ProtoError> {
        let name = identity.owner_name()?;
        Ok(addresses(endpoints)
            .filter_map(|ip| match ip {
                Address::V4(v4) => Some(self.record(name.clone(), RData::A(A::from(v4)))),
                Address::V6(_) => None,
            })
            .collect())
    }

    /// One AAAA record per address that has no IPv4 form.
    pub fn aaaa_records(
        &self,
        endpoints: &[Node],
        identity: &ServiceIdentity,
    ) -> Result<Vec<Record>, hickory_proto::ProtoError> {
        let name = identity.owner_name()?;
        Ok(addresses(endpoints)
            .filter_map(|ip| match ip {
                Address::V6(v6) => Some(self.record(name.clone(), RData::AAAA(AAAA::from(v6)))),
                Address::V4(_) => None,
            })
            .collect())
    }

    /// A single SRV record fronting all endpoints, or nothing when there are none.
    pub fn srv_records(
        &self,
        endpoints: &[Node],
        identity: &ServiceIdentity,
    ) -> Result<Vec<Record>, hickory_proto::ProtoError> {
        if endpoints.is_empty() {
            return Ok(Vec::new());
        }

        let srv = SRV::new(SRV_PRIORITY, SRV_WEIGHT, SRV_PORT, identity.owner_name()?);
        Ok(vec![self.record(identity.srv_name()?, RData::SRV(srv))])
    }

    /// A single TXT record describing the service, or nothing when there are no endpoints.
    pub fn txt_records(
        &self,
        endpoints: &[Node],
        identity: &ServiceIdentity,
    ) -> Result<Vec<Record>, hickory_proto::ProtoError> {
        if endpoints.is_empty() {
            return Ok(Vec::new());
        }

        let txt = TXT::new(vec![
            format!("cluster={}", self.cluster_name),
            format!("clusterset={}", self.clusterset_name),
            format!("service={}", identity.service()),
            format!("namespace={}", identity.namespace()),
        ]);
        Ok(vec![self.record(identity.owner_name()?, RData::TXT(txt))])
    }

    fn record(&self, name: Name, rdata: RData) -> Record {
        let mut record = Record::from_rdata(name, self.ttl, rdata);
        record.set_dns_class(DNSClass::IN);
        record
    }
}

/// An endpoint address sorted into the record type that carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Address {
    V4(Ipv4Addr),
    V6(Ipv6Addr),
}

impl From<IpAddr> for Address {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => Address::V4(v4),
            // IPv4-mapped addresses have a 4-byte form and are served as A.
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => Address::V4(v4),
                None => Address::V6(v6),
            },
        }
    }
}

/// Every parseable address of every endpoint, in inventory order.
fn addresses(endpoints: &[Node]) -> impl Iterator<Item = Address> + '_ {
    endpoints.iter().flat_map(|node| {
        node.ip_addresses
            .iter()
            .filter_map(move |raw| match raw.trim().parse::<IpAddr>() {
                Ok(ip) => Some(Address::from(ip)),
                Err(_) => {
                    debug!(node = %node.name, address = %raw, "skipping unparseable address");
                    None
                }
            })
    })
}
