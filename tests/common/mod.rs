//! Shared test infrastructure for clusterset integration tests.

#![allow(dead_code)]

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{DNSClass, LowerName, Name, RData, RecordSet, RecordType};
use hickory_proto::serialize::binary::{BinDecodable, BinDecoder, BinEncoder};
use hickory_server::authority::{
    Authority, AuthorityObject, Catalog, LookupControlFlow, LookupError, LookupOptions,
    LookupRecords, MessageRequest, MessageResponse, UpdateResult, ZoneType,
};
use hickory_server::proto::rr::Record;
use hickory_server::proto::xfer::Protocol;
use hickory_server::server::{Request, RequestHandler, RequestInfo, ResponseHandler, ResponseInfo};

use clusterset_dns::config::ClustersetConfig;
use clusterset_dns::inventory::{CreateUserRequest, HealthResponse, InventoryClient, Node, User};
use clusterset_dns::metrics::RequestCounter;
use clusterset_dns::{ClustersetHandler, EndpointResolver, InventoryError, QueryEngine};

// --- Constants ---

pub const CLUSTERSET_ZONE: &str = "clusterset.local";
pub const FALLBACK_IP: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 53);

// --- TestResponseHandler ---

/// Captures the serialized DNS response for inspection in tests.
///
/// The response is serialized via `MessageResponse::destructive_emit()` and
/// stored as raw wire-format bytes, which can then be parsed with
/// `Message::from_vec()`.
#[derive(Clone)]
pub struct TestResponseHandler {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl TestResponseHandler {
    pub fn new() -> Self {
        Self {
            buf: Arc::new(Mutex::new(Vec::with_capacity(512))),
        }
    }

    /// Parse the captured wire bytes into a `Message` for assertions.
    pub fn into_message(self) -> Message {
        let buf = self.buf.lock().unwrap();
        assert!(!buf.is_empty(), "no response was captured");
        Message::from_vec(&buf).expect("failed to parse captured DNS response")
    }
}

#[async_trait]
impl ResponseHandler for TestResponseHandler {
    async fn send_response<'a>(
        &mut self,
        response: MessageResponse<
            '_,
            'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
        >,
    ) -> io::Result<ResponseInfo> {
        let mut buf = self.buf.lock().unwrap();
        buf.clear();
        let mut encoder = BinEncoder::new(&mut *buf);
        encoder.set_max_size(u16::MAX);
        let info = response
            .destructive_emit(&mut encoder)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(info)
    }
}

// --- Inventory fixtures ---

/// In-memory inventory returning a fixed node list, or failing every call.
pub struct FixtureInventory {
    nodes: Vec<Node>,
    fail: bool,
    calls: AtomicUsize,
}

impl FixtureInventory {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            nodes: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `list_nodes` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn unavailable() -> InventoryError {
        InventoryError::Status {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            body: "inventory down".to_string(),
        }
    }
}

#[async_trait]
impl InventoryClient for FixtureInventory {
    async fn list_nodes(&self, _user_filter: Option<&str>) -> Result<Vec<Node>, InventoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Self::unavailable());
        }
        Ok(self.nodes.clone())
    }

    async fn get_node(&self, node_id: &str) -> Result<Node, InventoryError> {
        self.nodes
            .iter()
            .find(|n| n.id == node_id)
            .cloned()
            .ok_or_else(Self::unavailable)
    }

    async fn health(&self) -> Result<HealthResponse, InventoryError> {
        Ok(HealthResponse {
            database_connectivity: !self.fail,
        })
    }

    async fn create_user(&self, request: &CreateUserRequest) -> Result<User, InventoryError> {
        Ok(User {
            name: request.name.clone(),
            ..Default::default()
        })
    }
}

/// Build a node with the given name and addresses.
pub fn node(id: &str, name: &str, addrs: &[&str]) -> Node {
    Node {
        id: id.to_string(),
        name: name.to_string(),
        ip_addresses: addrs.iter().map(|a| a.to_string()).collect(),
        online: true,
        ..Default::default()
    }
}

/// Two matching `web`/`prod` nodes and one unrelated node.
pub fn sample_nodes() -> Vec<Node> {
    vec![
        node("1", "web-prod-1", &["100.64.0.1", "fd7a:115c:a1e0::1"]),
        node("2", "web-prod-2", &["100.64.0.2", "fd7a:115c:a1e0::2"]),
        node("3", "db-staging-1", &["100.64.0.3"]),
    ]
}

// --- Config builders ---

pub fn test_clusterset_config() -> ClustersetConfig {
    ClustersetConfig {
        zones: vec![CLUSTERSET_ZONE.to_string()],
        ttl: 60,
        cluster_name: "cluster-a".to_string(),
        clusterset_name: "prod-set".to_string(),
    }
}

// --- Fallback authority ---

/// Answers every A question with [`FALLBACK_IP`]; stands in for the next
/// handler in the chain.
pub struct FallbackAuthority {
    origin: LowerName,
}

impl FallbackAuthority {
    pub fn new() -> Self {
        Self {
            origin: LowerName::from(Name::root()),
        }
    }
}

#[async_trait]
impl Authority for FallbackAuthority {
    type Lookup = LookupRecords;

    fn zone_type(&self) -> ZoneType {
        ZoneType::Primary
    }

    fn is_axfr_allowed(&self) -> bool {
        false
    }

    fn origin(&self) -> &LowerName {
        &self.origin
    }

    async fn lookup(
        &self,
        name: &LowerName,
        rtype: RecordType,
        lookup_options: LookupOptions,
    ) -> LookupControlFlow<Self::Lookup> {
        if rtype != RecordType::A {
            return LookupControlFlow::Break(Err(LookupError::ResponseCode(
                ResponseCode::NoError,
            )));
        }
        let name = Name::from(name.clone());
        let mut record = Record::from_rdata(name.clone(), 30, RData::A(A::from(FALLBACK_IP)));
        record.set_dns_class(DNSClass::IN);
        let mut record_set = RecordSet::new(name, RecordType::A, 0);
        record_set.insert(record, 0);
        LookupControlFlow::Break(Ok(LookupRecords::new(
            lookup_options,
            Arc::new(record_set),
        )))
    }

    async fn search(
        &self,
        request_info: RequestInfo<'_>,
        lookup_options: LookupOptions,
    ) -> LookupControlFlow<Self::Lookup> {
        Authority::lookup(
            self,
            request_info.query.name(),
            request_info.query.query_type(),
            lookup_options,
        )
        .await
    }

    async fn get_nsec_records(
        &self,
        _name: &LowerName,
        _lookup_options: LookupOptions,
    ) -> LookupControlFlow<Self::Lookup> {
        LookupControlFlow::Break(Err(LookupError::ResponseCode(ResponseCode::NoError)))
    }

    async fn update(&self, _update: &MessageRequest) -> UpdateResult<bool> {
        Err(ResponseCode::NotImp)
    }
}

// --- Handler construction ---

/// Build a query engine over `inventory`.
pub fn build_engine(config: ClustersetConfig, inventory: Arc<dyn InventoryClient>) -> QueryEngine {
    let resolver = EndpointResolver::new(inventory);
    QueryEngine::new(config, resolver, RequestCounter::noop())
}

/// Build a handler with nothing behind it.
pub fn build_handler(
    config: ClustersetConfig,
    inventory: Arc<dyn InventoryClient>,
) -> ClustersetHandler {
    ClustersetHandler::new(build_engine(config, inventory))
}

/// Build a handler followed by a Catalog holding [`FallbackAuthority`] at the root.
pub fn build_chained_handler(
    config: ClustersetConfig,
    inventory: Arc<dyn InventoryClient>,
) -> ClustersetHandler<Catalog> {
    let fallback: Arc<dyn AuthorityObject> = Arc::new(FallbackAuthority::new());
    let mut catalog = Catalog::new();
    catalog.upsert(LowerName::from(Name::root()), vec![fallback]);
    ClustersetHandler::with_next(build_engine(config, inventory), catalog)
}

// --- Query/Request construction ---

/// Build wire-format bytes for a DNS query.
pub fn build_query_bytes(name: &str, record_type: RecordType, id: u16) -> Vec<u8> {
    let mut msg = Message::new();
    msg.set_id(id);
    msg.set_message_type(MessageType::Query);
    msg.set_op_code(OpCode::Query);
    msg.set_recursion_desired(true);
    let mut query = Query::new();
    query.set_name(Name::from_ascii(name).unwrap());
    query.set_query_type(record_type);
    query.set_query_class(DNSClass::IN);
    msg.add_query(query);
    msg.to_vec().unwrap()
}

/// Parse wire bytes into a MessageRequest.
pub fn parse_message_request(bytes: &[u8]) -> MessageRequest {
    let mut decoder = BinDecoder::new(bytes);
    MessageRequest::read(&mut decoder).expect("failed to parse MessageRequest")
}

/// Build a full `Request` from a loopback client.
pub fn build_request(name: &str, record_type: RecordType, id: u16) -> Request {
    let bytes = build_query_bytes(name, record_type, id);
    let msg = parse_message_request(&bytes);
    let src: SocketAddr = "127.0.0.1:40000".parse().unwrap();
    Request::new(msg, src, Protocol::Udp)
}

// --- Response helpers ---

/// Execute a query through `handler` and return the parsed response.
pub async fn execute_query<H: RequestHandler>(
    handler: &H,
    name: &str,
    record_type: RecordType,
    id: u16,
) -> Message {
    let request = build_request(name, record_type, id);
    let response = TestResponseHandler::new();
    handler.handle_request(&request, response.clone()).await;
    response.into_message()
}

/// Extract A addresses from a response.
pub fn extract_a_ips(msg: &Message) -> Vec<Ipv4Addr> {
    let mut ips: Vec<Ipv4Addr> = msg
        .answers()
        .iter()
        .filter_map(|r| match r.data() {
            RData::A(a) => Some(Ipv4Addr::from(*a)),
            _ => None,
        })
        .collect();
    ips.sort();
    ips
}

/// Extract AAAA addresses from a response.
pub fn extract_aaaa_ips(msg: &Message) -> Vec<Ipv6Addr> {
    let mut ips: Vec<Ipv6Addr> = msg
        .answers()
        .iter()
        .filter_map(|r| match r.data() {
            RData::AAAA(aaaa) => Some(Ipv6Addr::from(*aaaa)),
            _ => None,
        })
        .collect();
    ips.sort();
    ips
}

/// Assert response code.
pub fn assert_response_code(msg: &Message, expected: ResponseCode) {
    assert_eq!(
        msg.response_code(),
        expected,
        "expected {:?}, got {:?}",
        expected,
        msg.response_code()
    );
}
