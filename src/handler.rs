//! Hickory request handler answering clusterset questions.
//!
//! The handler sits in front of any other request handler (typically a
//! [`Catalog`]). Questions under the clusterset zones are answered here,
//! with the response code decided by the [`QueryEngine`]; everything else
//! is passed to the next handler unchanged, or failed with SERVFAIL when
//! there is none.

use hickory_proto::op::{Edns, Header, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::Record;
use hickory_server::authority::{Catalog, MessageResponse, MessageResponseBuilder};
use hickory_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};
use tracing::{debug, error, warn};

use crate::engine::{Disposition, QueryEngine, QueryOutcome};

/// [`RequestHandler`] wrapping a [`QueryEngine`] and an optional next handler.
pub struct ClustersetHandler<N = Catalog> {
    engine: QueryEngine,
    next: Option<N>,
}

impl ClustersetHandler {
    /// Create a handler with nothing behind it: questions outside the
    /// clusterset zones are answered with SERVFAIL.
    pub fn new(engine: QueryEngine) -> Self {
        Self { engine, next: None }
    }
}

impl<N: RequestHandler> ClustersetHandler<N> {
    /// Create a handler that passes questions outside the clusterset zones to `next`.
    pub fn with_next(engine: QueryEngine, next: N) -> Self {
        Self {
            engine,
            next: Some(next),
        }
    }

    /// The query engine backing this handler.
    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    async fn lookup<R: ResponseHandler>(&self, request: &Request, response_handle: R) -> ResponseInfo {
        let info = match request.request_info() {
            Ok(info) => info,
            Err(e) => {
                debug!(error = %e, "request without exactly one question");
                return send_error(request, response_handle, ResponseCode::FormErr).await;
            }
        };
        let name = info.query.name();
        let rtype = info.query.query_type();

        match self.engine.handle(name, rtype).await {
            Ok(Disposition::Answered(outcome)) => send_answer(request, response_handle, &outcome).await,
            Ok(Disposition::Delegate) => self.delegate(request, response_handle).await,
            Err(e) => {
                error!(%name, ?rtype, error = %e, "Error handling clusterset query");
                send_error(request, response_handle, ResponseCode::ServFail).await
            }
        }
    }

    async fn delegate<R: ResponseHandler>(&self, request: &Request, response_handle: R) -> ResponseInfo {
        match &self.next {
            Some(next) => next.handle_request(request, response_handle).await,
            None => {
                debug!("no next handler, failing query");
                send_error(request, response_handle, ResponseCode::ServFail).await
            }
        }
    }
}

#[async_trait::async_trait]
impl<N: RequestHandler> RequestHandler for ClustersetHandler<N> {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        response_handle: R,
    ) -> ResponseInfo {
        match request.message_type() {
            MessageType::Query => match request.op_code() {
                OpCode::Query => self.lookup(request, response_handle).await,
                _ => self.delegate_or_refuse(request, response_handle).await,
            },
            MessageType::Response => {
                warn!("got a response as a request from id: {}", request.id());
                send_error(request, response_handle, ResponseCode::FormErr).await
            }
        }
    }
}

impl<N: RequestHandler> ClustersetHandler<N> {
    /// Updates and notifies belong to whatever sits behind us.
    async fn delegate_or_refuse<R: ResponseHandler>(
        &self,
        request: &Request,
        response_handle: R,
    ) -> ResponseInfo {
        match &self.next {
            Some(next) => next.handle_request(request, response_handle).await,
            None => {
                warn!("unimplemented op_code: {:?}", request.op_code());
                send_error(request, response_handle, ResponseCode::NotImp).await
            }
        }
    }
}

/// Send an authoritative answer with the engine's response code.
async fn send_answer<R: ResponseHandler>(
    request: &Request,
    response_handle: R,
    outcome: &QueryOutcome,
) -> ResponseInfo {
    let mut header = Header::response_from_request(request.header());
    header.set_authoritative(true);
    header.set_response_code(outcome.response_code);

    let mut builder = MessageResponseBuilder::from_message_request(request);
    if let Some(edns) = response_edns(request) {
        builder.edns(edns);
    }

    let response = builder.build(
        header,
        outcome.answers.iter(),
        None.iter(),
        None.iter(),
        None.iter(),
    );
    send_response(response, response_handle).await
}

/// Sends an error response back to the client.
async fn send_error<R: ResponseHandler>(
    request: &Request,
    response_handle: R,
    code: ResponseCode,
) -> ResponseInfo {
    let response =
        MessageResponseBuilder::from_message_request(request).error_msg(request.header(), code);
    send_response(response, response_handle).await
}

async fn send_response<'a, R: ResponseHandler>(
    response: MessageResponse<
        '_,
        'a,
        impl Iterator<Item = &'a Record> + Send + 'a,
        impl Iterator<Item = &'a Record> + Send + 'a,
        impl Iterator<Item = &'a Record> + Send + 'a,
        impl Iterator<Item = &'a Record> + Send + 'a,
    >,
    mut response_handle: R,
) -> ResponseInfo {
    match response_handle.send_response(response).await {
        Ok(info) => info,
        Err(e) => {
            error!("failed to send response: {}", e);
            let mut header = Header::new();
            header.set_response_code(ResponseCode::ServFail);
            header.into()
        }
    }
}

/// Mirror the client's EDNS settings, if it sent any.
fn response_edns(request: &Request) -> Option<Edns> {
    let req_edns = request.edns()?;
    let mut resp_edns = Edns::new();
    resp_edns.set_max_payload(req_edns.max_payload().max(512));
    resp_edns.set_version(req_edns.version());
    resp_edns.set_dnssec_ok(req_edns.flags().dnssec_ok);
    Some(resp_edns)
}
