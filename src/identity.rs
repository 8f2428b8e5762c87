//! Multi-cluster service names.
//!
//! Names follow `<service>.<namespace>.svc.clusterset.local`. Any labels in
//! front of the service label (for example `_http._tcp` on SRV questions)
//! are ignored.

use hickory_proto::rr::Name;
use std::fmt;

/// Fixed suffix of every clusterset service name, in label order.
pub const CLUSTERSET_SUFFIX: [&str; 3] = ["svc", "clusterset", "local"];

/// Service and protocol labels prepended to SRV owner names.
pub const SRV_PREFIX: [&str; 2] = ["_http", "_tcp"];

/// The (service, namespace) pair a question refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceIdentity {
    service: String,
    namespace: String,
}

impl ServiceIdentity {
    /// Build an identity from its parts.
    pub fn new(service: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            namespace: namespace.into(),
        }
    }

    /// Parse a lowercase DNS name in dotted form, with or without the trailing dot.
    ///
    /// Labels are split on every `.`; use [`ServiceIdentity::from_labels`]
    /// for names taken off the wire.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.strip_suffix('.').unwrap_or(name);
        let labels: Vec<&str> = name.split('.').collect();
        Self::from_labels(&labels)
    }

    /// Read the identity from lowercase labels, root label excluded.
    ///
    /// Returns `None` when there are fewer than five labels, the name does
    /// not end in `svc.clusterset.local`, or the service or namespace label
    /// is not valid UTF-8.
    pub fn from_labels<L: AsRef<[u8]>>(labels: &[L]) -> Option<Self> {
        if labels.len() < 5 {
            return None;
        }

        let (head, suffix) = labels.split_at(labels.len() - CLUSTERSET_SUFFIX.len());
        let suffix_matches = suffix
            .iter()
            .zip(CLUSTERSET_SUFFIX)
            .all(|(label, expected)| label.as_ref() == expected.as_bytes());
        if !suffix_matches {
            return None;
        }

        let namespace = std::str::from_utf8(head[head.len() - 1].as_ref()).ok()?;
        let service = std::str::from_utf8(head[head.len() - 2].as_ref()).ok()?;
        Some(Self::new(service, namespace))
    }

    /// Service label.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Namespace label.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Owner name of the A, AAAA and TXT records: `service.namespace.svc.clusterset.local.`
    ///
    /// The suffix is always the literal `svc.clusterset.local.`, whichever
    /// configured zone the question was accepted under.
    pub fn owner_name(&self) -> Result<Name, hickory_proto::ProtoError> {
        let mut labels = vec![self.service.as_str(), self.namespace.as_str()];
        labels.extend(CLUSTERSET_SUFFIX);
        Name::from_labels(labels.into_iter().map(str::as_bytes))
    }

    /// Owner name of the SRV record: `_http._tcp.service.namespace.svc.clusterset.local.`
    pub fn srv_name(&self) -> Result<Name, hickory_proto::ProtoError> {
        let mut labels: Vec<&str> = SRV_PREFIX.to_vec();
        labels.extend([self.service.as_str(), self.namespace.as_str()]);
        labels.extend(CLUSTERSET_SUFFIX);
        Name::from_labels(labels.into_iter().map(str::as_bytes))
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.service, self.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_service_and_namespace() {
        let id = ServiceIdentity::parse("my-service.my-namespace.svc.clusterset.local.").unwrap();
        assert_eq!(id.service(), "my-service");
        assert_eq!(id.namespace(), "my-namespace");
    }

    #[test]
    fn test_parse_rejects_other_domains() {
        assert!(ServiceIdentity::parse("invalid.domain.com.").is_none());
        assert!(ServiceIdentity::parse("a.b.svc.cluster.local.").is_none());
        assert!(ServiceIdentity::parse("a.b.pod.clusterset.local.").is_none());
    }

    #[test]
    fn test_parse_rejects_too_few_labels() {
        assert!(ServiceIdentity::parse("ns.svc.clusterset.local.").is_none());
        assert!(ServiceIdentity::parse("svc.clusterset.local.").is_none());
        assert!(ServiceIdentity::parse("").is_none());
    }

    #[test]
    fn test_parse_trailing_dot_is_optional() {
        assert_eq!(
            ServiceIdentity::parse("my-service.my-namespace.svc.clusterset.local."),
            ServiceIdentity::parse("my-service.my-namespace.svc.clusterset.local"),
        );
    }

    #[test]
    fn test_parse_ignores_leading_labels() {
        let id = ServiceIdentity::parse("a.b.my-service.my-namespace.svc.clusterset.local.").unwrap();
        assert_eq!(id, ServiceIdentity::new("my-service", "my-namespace"));

        let srv = ServiceIdentity::parse("_http._tcp.web.prod.svc.clusterset.local.").unwrap();
        assert_eq!(srv, ServiceIdentity::new("web", "prod"));
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        // Callers lowercase first.
        assert!(ServiceIdentity::parse("a.b.SVC.clusterset.local.").is_none());
    }

    #[test]
    fn test_from_labels_keeps_escaped_dots() {
        let name = Name::from_ascii("my\\.svc.ns.svc.clusterset.local.").unwrap();
        let labels: Vec<&[u8]> = name.iter().collect();

        let id = ServiceIdentity::from_labels(&labels).unwrap();
        assert_eq!(id, ServiceIdentity::new("my.svc", "ns"));
        assert_eq!(id.owner_name().unwrap(), name);
    }

    #[test]
    fn test_from_labels_rejects_non_utf8() {
        let name = Name::from_ascii("\\255.ns.svc.clusterset.local.").unwrap();
        let labels: Vec<&[u8]> = name.iter().collect();
        assert!(ServiceIdentity::from_labels(&labels).is_none());
    }

    #[test]
    fn test_owner_name() {
        let id = ServiceIdentity::new("my-service", "my-namespace");
        let name = id.owner_name().unwrap();
        assert!(name.is_fqdn());
        assert_eq!(name.to_string(), "my-service.my-namespace.svc.clusterset.local.");
    }

    #[test]
    fn test_srv_name() {
        let id = ServiceIdentity::new("web", "prod");
        assert_eq!(
            id.srv_name().unwrap().to_string(),
            "_http._tcp.web.prod.svc.clusterset.local."
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(ServiceIdentity::new("web", "prod").to_string(), "web.prod");
    }
}
