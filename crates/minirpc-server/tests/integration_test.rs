// Integration tests for minirpc-server
//
// These tests bind a real server on a random loopback port, serve it from a
// background thread, then connect blocking clients to resolve and call
// functions.

use minirpc_client::{ClientConfig, Handle, MinirpcClient};
use minirpc_common::protocol::error::MinirpcError;
use minirpc_common::RpcPayload;
use minirpc_server::{Server, ServerConfig};
use std::io::{Read, Write};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// ============================================================================
// Test Helpers
// ============================================================================

/// Adds `data1` and the first byte of `data2`.
fn add2(input: &RpcPayload) -> Option<RpcPayload> {
    let rhs = *input.data2.as_ref()?.first()? as i8;
    Some(RpcPayload::new(input.data1 + rhs as i64))
}

fn new_server() -> Server {
    let config = ServerConfig::new(0)
        .unwrap()
        .with_bind(IpAddr::V4(Ipv4Addr::LOCALHOST));
    Server::bind(config).expect("Failed to bind server")
}

/// Start a server in a background thread, returning its address.
///
/// The thread serves until the test process exits.
fn start_server(server: Server) -> SocketAddr {
    let addr = server.local_addr().expect("Failed to get local address");
    thread::spawn(move || {
        server.serve_all().expect("Server failed");
    });
    addr
}

fn connect(addr: SocketAddr) -> MinirpcClient {
    MinirpcClient::connect(&addr.ip().to_string(), addr.port() as u32).expect("Failed to connect")
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_find_and_call_add2() {
    let mut server = new_server();
    assert_eq!(server.register("add2", add2).unwrap(), 1);
    let addr = start_server(server);

    let mut client = connect(addr);
    let handle = client.find("add2").unwrap();
    assert_eq!(handle.fid(), 1);

    let result = client.call(&handle, &RpcPayload::new(5).with_data2(vec![3])).unwrap();
    assert_eq!(result.data1, 8);
    assert!(result.data2.is_none());
    assert_eq!(result.data2_len(), 0);

    client.close();
}

#[test]
fn test_find_unregistered_is_not_found() {
    let mut server = new_server();
    server.register("add2", add2).unwrap();
    let addr = start_server(server);

    let mut client = connect(addr);
    assert!(matches!(client.find("sub2"), Err(MinirpcError::NotFound(_))));

    // the connection is still usable afterwards
    assert_eq!(client.find("add2").unwrap().fid(), 1);
}

#[test]
fn test_find_is_idempotent() {
    let mut server = new_server();
    server.register("first", add2).unwrap();
    server.register("second", add2).unwrap();
    let addr = start_server(server);

    let mut client = connect(addr);
    let a = client.find("second").unwrap();
    let b = client.find("second").unwrap();
    assert_eq!(a, b);
    assert_eq!(a.fid(), 2);
}

#[test]
fn test_longest_name_resolves() {
    let name = "n".repeat(1000);
    let mut server = new_server();
    server.register(&name, add2).unwrap();
    let addr = start_server(server);

    let mut client = connect(addr);
    assert_eq!(client.find(&name).unwrap().fid(), 1);
}

// ============================================================================
// Registration semantics over the wire
// ============================================================================

#[test]
fn test_reregistration_serves_newest_handler() {
    let mut server = new_server();
    let first = server.register("op", |_: &RpcPayload| Some(RpcPayload::new(1))).unwrap();
    let second = server.register("op", |_: &RpcPayload| Some(RpcPayload::new(2))).unwrap();
    assert_eq!(first, second);
    let addr = start_server(server);

    let mut client = connect(addr);
    let handle = client.find("op").unwrap();
    assert_eq!(handle.fid(), first);
    assert_eq!(client.call(&handle, &RpcPayload::new(0)).unwrap().data1, 2);
}

// ============================================================================
// Failed calls
// ============================================================================

#[test]
fn test_call_unregistered_id_is_remote_error() {
    let mut server = new_server();
    server.register("add2", add2).unwrap();
    let addr = start_server(server);

    // a handle for an id this server never assigned, obtained from another server
    let mut other = new_server();
    other.register("a", add2).unwrap();
    other.register("b", add2).unwrap();
    other.register("c", add2).unwrap();
    let other_addr = start_server(other);
    let stale: Handle = connect(other_addr).find("c").unwrap();
    assert_eq!(stale.fid(), 3);

    let mut client = connect(addr);
    let result = client.call(&stale, &RpcPayload::new(1));
    assert!(matches!(result, Err(MinirpcError::Remote)));

    // failure is contained to the call
    let handle = client.find("add2").unwrap();
    assert_eq!(client.call(&handle, &RpcPayload::new(1).with_data2(vec![1])).unwrap().data1, 2);
}

#[test]
fn test_handler_failure_is_remote_error() {
    let mut server = new_server();
    server.register("add2", add2).unwrap();
    let addr = start_server(server);

    let mut client = connect(addr);
    let handle = client.find("add2").unwrap();

    // add2 requires data2
    let result = client.call(&handle, &RpcPayload::new(5));
    assert!(matches!(result, Err(MinirpcError::Remote)));
}

#[test]
fn test_inconsistent_handler_result_is_remote_error() {
    let mut server = new_server();
    server
        .register("broken", |_: &RpcPayload| Some(RpcPayload::new(1).with_data2(Vec::new())))
        .unwrap();
    let addr = start_server(server);

    let mut client = connect(addr);
    let handle = client.find("broken").unwrap();
    assert!(matches!(client.call(&handle, &RpcPayload::new(0)), Err(MinirpcError::Remote)));
}

#[test]
fn test_oversized_result_is_remote_error() {
    let config = ServerConfig::new(0)
        .unwrap()
        .with_bind(IpAddr::V4(Ipv4Addr::LOCALHOST))
        .with_max_payload_len(64);
    let mut server = Server::bind(config).unwrap();
    server
        .register("big", |_: &RpcPayload| Some(RpcPayload::new(0).with_data2(vec![7u8; 128])))
        .unwrap();
    let addr = start_server(server);

    let mut client = connect(addr);
    let handle = client.find("big").unwrap();
    assert!(matches!(client.call(&handle, &RpcPayload::new(0)), Err(MinirpcError::Remote)));
}

#[test]
fn test_result_over_client_ceiling_ends_session() {
    let mut server = new_server();
    server
        .register("sized", |input: &RpcPayload| {
            if input.data1 == 1 {
                Some(RpcPayload::new(20).with_data2(vec![0u8; 20]))
            } else {
                Some(RpcPayload::new(42))
            }
        })
        .unwrap();
    let addr = start_server(server);

    let config = ClientConfig::new().with_max_payload_len(16);
    let mut client =
        MinirpcClient::connect_with_config(&addr.ip().to_string(), addr.port() as u32, config).unwrap();
    let handle = client.find("sized").unwrap();

    let first = client.call(&handle, &RpcPayload::new(1));
    assert!(matches!(first, Err(MinirpcError::PayloadTooLarge { len: 32, max: 16 })));

    // leftover bytes of the first result are never read as the second
    let second = client.call(&handle, &RpcPayload::new(2));
    assert!(matches!(second, Err(MinirpcError::Transport(_))));

    let mut fresh = connect(addr);
    let handle = fresh.find("sized").unwrap();
    assert_eq!(fresh.call(&handle, &RpcPayload::new(2)).unwrap(), RpcPayload::new(42));
}

// ============================================================================
// Payload handling
// ============================================================================

#[test]
fn test_data2_bytes_round_trip_through_handler() {
    let mut server = new_server();
    server.register("echo", |input: &RpcPayload| Some(input.clone())).unwrap();
    let addr = start_server(server);

    let mut client = connect(addr);
    let handle = client.find("echo").unwrap();

    let data2: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();
    let payload = RpcPayload::new(-9_000_000_000).with_data2(data2);
    assert_eq!(client.call(&handle, &payload).unwrap(), payload);

    let bare = RpcPayload::new(i64::MAX);
    assert_eq!(client.call(&handle, &bare).unwrap(), bare);
}

// ============================================================================
// Connection lifecycle
// ============================================================================

#[test]
fn test_raw_close_header_ends_connection() {
    let mut server = new_server();
    server.register("add2", add2).unwrap();
    let addr = start_server(server);

    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.write_all(&[0, 0, 0, 0]).unwrap();

    // server closes its end, so the read sees EOF
    let mut buf = [0u8; 1];
    assert_eq!(stream.read(&mut buf).unwrap(), 0);
}

#[test]
fn test_abandoned_partial_request_does_not_block_others() {
    let mut server = new_server();
    server.register("add2", add2).unwrap();
    let addr = start_server(server);

    // header announces a 4-byte name but only sends two
    let mut stalled = TcpStream::connect(addr).unwrap();
    stalled.write_all(&[0, 1, 0, 4, b'a', b'd']).unwrap();

    let mut client = connect(addr);
    assert_eq!(client.find("add2").unwrap().fid(), 1);

    drop(stalled);
}

#[test]
fn test_concurrent_clients_get_their_own_responses() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut server = new_server();
    server.register("add2", add2).unwrap();
    server
        .register("tag", move |input: &RpcPayload| {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(RpcPayload::new(input.data1 * 10).with_data2(input.data1.to_be_bytes().to_vec()))
        })
        .unwrap();
    let addr = start_server(server);

    let workers: Vec<_> = (0..8i64)
        .map(|worker| {
            thread::spawn(move || {
                let mut client = connect(addr);
                let add = client.find("add2").unwrap();
                let tag = client.find("tag").unwrap();

                for i in 0..50i64 {
                    let seed = worker * 1000 + i;
                    let tagged = client.call(&tag, &RpcPayload::new(seed)).unwrap();
                    assert_eq!(tagged.data1, seed * 10);
                    assert_eq!(tagged.data2, Some(seed.to_be_bytes().to_vec()));

                    let sum = client
                        .call(&add, &RpcPayload::new(worker).with_data2(vec![i as u8]))
                        .unwrap();
                    assert_eq!(sum.data1, worker + i);
                }
                client.close();
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("worker panicked");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 8 * 50);
}
