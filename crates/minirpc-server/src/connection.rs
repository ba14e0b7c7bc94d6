//! Per-connection request handling.
//!
//! Each accepted connection runs [`serve_connection`] as a local task on the
//! serving thread. The task reads one request at a time, answers it, and
//! returns when the peer closes, sends the close signal, or the stream fails.

use tokio::io::{AsyncRead, AsyncWrite};

use minirpc_common::protocol::error::Result;
use minirpc_common::transport::TcpTransportAsync;
use minirpc_common::{CallResponse, FindResponse, FunctionId, RequestKind};

use crate::state::{ConnectionId, ServerState};

/// Why a connection stopped being serviced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// EOF at a request boundary.
    PeerClosed,
    /// The peer sent the close header (or an unknown kind).
    CloseRequested,
    /// A read or write failed, or framing could not be recovered.
    Failed,
}

/// Services requests on `stream` until it ends.
pub async fn serve_connection<S>(mut stream: S, conn_id: ConnectionId, state: &ServerState) -> Disconnect
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let header = match TcpTransportAsync::receive_header(&mut stream).await {
            Ok(Some(header)) => header,
            Ok(None) => {
                tracing::info!("Connection {} closed by peer", conn_id);
                return Disconnect::PeerClosed;
            }
            Err(e) => {
                tracing::error!("Connection {}: {}", conn_id, e);
                return Disconnect::Failed;
            }
        };

        let outcome = match header.kind {
            RequestKind::Find => handle_find(&mut stream, conn_id, header.arg, state).await,
            RequestKind::Call => handle_call(&mut stream, conn_id, header.arg, state).await,
            RequestKind::Close => {
                tracing::info!("Connection {} requested close", conn_id);
                return Disconnect::CloseRequested;
            }
            RequestKind::Unknown(kind) => {
                tracing::warn!("Connection {} sent unknown request kind {}, closing", conn_id, kind);
                return Disconnect::CloseRequested;
            }
        };

        if let Err(e) = outcome {
            tracing::error!("Connection {}: {}", conn_id, e);
            return Disconnect::Failed;
        }
    }
}

/// Reads `name_len` bytes of name and answers with its id, or 0.
async fn handle_find<S>(stream: &mut S, conn_id: ConnectionId, name_len: u16, state: &ServerState) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let name = TcpTransportAsync::receive_message(stream, name_len as usize, "reading function name").await?;
    let response = FindResponse::from_id(state.registry.lookup_by_name(&name));

    match response {
        FindResponse::Found(id) => {
            tracing::debug!("Connection {}: find '{}' -> {}", conn_id, String::from_utf8_lossy(&name), id);
        }
        FindResponse::NotFound => {
            tracing::debug!("Connection {}: find '{}' -> not found", conn_id, String::from_utf8_lossy(&name));
        }
    }

    let reply = state.codec.encode_find_response(response);
    TcpTransportAsync::send_message(stream, &reply).await
}

/// Reads a length-prefixed payload, runs the handler for `fid`, and writes
/// the response.
///
/// Only stream-level failures are returned as errors. Everything that goes
/// wrong after the body has been read in full (bad payload, unknown id,
/// failing handler) is answered with a zero length and the connection stays up.
async fn handle_call<S>(stream: &mut S, conn_id: ConnectionId, fid: FunctionId, state: &ServerState) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let len_buf: [u8; 4] = TcpTransportAsync::receive_array(stream, "reading payload length").await?;
    let len = state.codec.decode_length(len_buf)?;
    let body = TcpTransportAsync::receive_message(stream, len, "reading payload").await?;

    let response = dispatch(conn_id, fid, &body, state);
    let reply = match state.codec.encode_call_response(&response) {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!("Connection {}: cannot encode result of function {}: {}", conn_id, fid, e);
            state.codec.encode_call_response(&CallResponse::Failed)?
        }
    };

    TcpTransportAsync::send_message(stream, &reply).await
}

fn dispatch(conn_id: ConnectionId, fid: FunctionId, body: &[u8], state: &ServerState) -> CallResponse {
    let payload = match state.codec.decode_payload(body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("Connection {}: undecodable arguments for function {}: {}", conn_id, fid, e);
            return CallResponse::Failed;
        }
    };

    let handler = match state.registry.lookup_by_id(fid) {
        Ok(handler) => handler,
        Err(e) => {
            tracing::warn!("Connection {}: {}", conn_id, e);
            return CallResponse::Failed;
        }
    };

    tracing::debug!(
        "Connection {}: calling function {} (data1={}, data2_len={})",
        conn_id,
        fid,
        payload.data1,
        payload.data2_len()
    );

    // runs on the serving thread; every other connection waits until it returns
    let response = CallResponse::from_handler_result(handler(&payload));
    if !response.is_success() {
        tracing::warn!("Connection {}: function {} returned no usable result", conn_id, fid);
    }
    response
}
