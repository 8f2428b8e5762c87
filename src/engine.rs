//! Per-question query handling.

use hickory_proto::op::ResponseCode;
use hickory_proto::rr::{Name, Record, RecordType};
use std::sync::Arc;
use tracing::debug;

use crate::config::ClustersetConfig;
use crate::error::InventoryError;
use crate::identity::ServiceIdentity;
use crate::metrics::{self, QueryResult, RequestCounter, Timer};
use crate::records::RecordSynthesizer;
use crate::resolver::EndpointResolver;
use crate::zone;

/// What the engine decided to do with a question.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// Not in a configured zone; hand the question to the next handler unchanged.
    Delegate,
    /// Answered authoritatively.
    Answered(QueryOutcome),
}

/// The answer to one authoritative question.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    /// Response code to send.
    pub response_code: ResponseCode,
    /// Answer section.
    pub answers: Vec<Record>,
}

impl QueryOutcome {
    fn no_error(answers: Vec<Record>) -> Self {
        Self {
            response_code: ResponseCode::NoError,
            answers,
        }
    }

    fn nx_domain() -> Self {
        Self {
            response_code: ResponseCode::NXDomain,
            answers: Vec::new(),
        }
    }
}

/// Answers clusterset questions.
///
/// Holds only read-only state, so one engine serves all concurrent queries.
#[derive(Clone)]
pub struct QueryEngine {
    config: Arc<ClustersetConfig>,
    resolver: EndpointResolver,
    synthesizer: RecordSynthesizer,
    requests: RequestCounter,
}

impl QueryEngine {
    /// Create an engine from its collaborators.
    pub fn new(
        config: ClustersetConfig,
        resolver: EndpointResolver,
        requests: RequestCounter,
    ) -> Self {
        let synthesizer = RecordSynthesizer::from_config(&config);
        Self {
            config: Arc::new(config),
            resolver,
            synthesizer,
            requests,
        }
    }

    /// Configured clusterset settings.
    pub fn config(&self) -> &ClustersetConfig {
        &self.config
    }

    /// Handle one question.
    ///
    /// The name is lowercased and matched label by label. Only an inventory
    /// failure produces an error; the caller answers it with SERVFAIL.
    /// Malformed service names are a normal NXDOMAIN outcome and unsupported
    /// record types an empty NOERROR.
    pub async fn handle(
        &self,
        name: &Name,
        rtype: RecordType,
    ) -> Result<Disposition, InventoryError> {
        let name = name.to_lowercase();
        let labels: Vec<&[u8]> = name.iter().collect();

        if !zone::is_authoritative(&labels, &self.config.zones) {
            debug!(%name, "not in a clusterset zone, delegating");
            return Ok(Disposition::Delegate);
        }

        self.requests.increment();
        let timer = Timer::start();
        let rtype_str = rtype.to_string();

        let Some(identity) = ServiceIdentity::from_labels(&labels) else {
            debug!(%name, "invalid clusterset service name");
            metrics::record_query(&rtype_str, QueryResult::NxDomain, timer.elapsed());
            return Ok(Disposition::Answered(QueryOutcome::nx_domain()));
        };

        debug!(
            service = identity.service(),
            namespace = identity.namespace(),
            rtype = %rtype,
            "clusterset query"
        );

        let endpoints = match self.resolver.find_endpoints(&identity).await {
            Ok(endpoints) => endpoints,
            Err(e) => {
                metrics::record_query(&rtype_str, QueryResult::Error, timer.elapsed());
                return Err(e);
            }
        };
        metrics::record_endpoints_matched(endpoints.len());

        match self.synthesizer.synthesize(rtype, &endpoints, &identity) {
            Ok(Some(answers)) => {
                debug!(%identity, rtype = %rtype, count = answers.len(), "returning records");
                metrics::record_query(&rtype_str, QueryResult::Success, timer.elapsed());
                Ok(Disposition::Answered(QueryOutcome::no_error(answers)))
            }
            Ok(None) => {
                debug!(%identity, rtype = %rtype, "unsupported record type");
                metrics::record_query(&rtype_str, QueryResult::Unsupported, timer.elapsed());
                Ok(Disposition::Answered(QueryOutcome::no_error(Vec::new())))
            }
            // Only reachable when the SRV prefix pushes the owner past 255 bytes.
            Err(e) => {
                debug!(%identity, error = %e, "cannot build owner name");
                metrics::record_query(&rtype_str, QueryResult::NxDomain, timer.elapsed());
                Ok(Disposition::Answered(QueryOutcome::nx_domain()))
            }
        }
    }
}
