//! End-to-end scenarios against the real worker pipeline — malformed
//! request, unsupported method, cold-fetch-then-warm-hit, oversize bypass —
//! driven over loopback TCP with an in-process fake origin standing in for
//! a real upstream server. Eviction order and pin safety are cache-internal
//! properties and are covered by `proxy-cache`'s own test suite instead of
//! being re-driven through a socket here.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use proxy_cache::Cache;
use proxy_core::MAX_OBJECT_SIZE;
use proxy_server::handle_connection;

/// Spawns a fake origin that replies to every connection with `body` after
/// reading (and discarding) one request up to the blank line terminating its
/// headers. Returns the bound address and a shared count of accepted
/// connections, so tests can assert the origin was (or wasn't) hit again.
fn spawn_fake_origin(body: Vec<u8>) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake origin");
    let addr = listener.local_addr().expect("fake origin local addr");
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&connections);

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            counter.fetch_add(1, Ordering::SeqCst);
            let body = body.clone();
            thread::spawn(move || {
                read_request_headers(&mut stream);
                let _ = stream.write_all(&body);
            });
        }
    });

    (addr, connections)
}

/// Reads bytes off `stream` until the blank line that terminates request
/// headers; the fake origin doesn't care what it was actually asked for.
fn read_request_headers(stream: &mut TcpStream) {
    let mut byte = [0u8; 1];
    let mut seen = Vec::new();
    loop {
        match stream.read(&mut byte) {
            Ok(0) | Err(_) => return,
            Ok(_) => {
                seen.push(byte[0]);
                if seen.ends_with(b"\r\n\r\n") {
                    return;
                }
            }
        }
    }
}

/// Hands `request` to a freshly spawned worker sharing `cache`, and returns
/// everything the worker wrote back before it closed the connection.
fn round_trip(cache: &Arc<Cache>, request: &[u8]) -> Vec<u8> {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind client-facing listener");
    let addr = listener.local_addr().expect("listener local addr");
    let cache = Arc::clone(cache);

    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept one connection");
        handle_connection(stream, cache);
    });

    let mut client = TcpStream::connect(addr).expect("connect to worker");
    client.write_all(request).expect("write request");

    let mut response = Vec::new();
    client.read_to_end(&mut response).expect("read response to EOF");

    server.join().expect("worker thread panicked");
    response
}

#[test]
fn malformed_request_line_yields_400() {
    let cache = Cache::new();
    let response = round_trip(&cache, b"GARBAGE\r\n\r\n");
    let text = String::from_utf8(response).expect("response is valid utf-8");

    assert!(text.starts_with("HTTP/1.0 400 Bad Request\r\n"));
    assert!(text.contains("Content-Type: text/html\r\n"));
    assert!(text.contains("400: Bad Request"));
}

#[test]
fn unsupported_method_yields_501() {
    let cache = Cache::new();
    let response = round_trip(&cache, b"PUT /x HTTP/1.0\r\n\r\n");
    let text = String::from_utf8(response).expect("response is valid utf-8");

    assert!(text.starts_with("HTTP/1.0 501 Not Implemented\r\n"));
    assert!(text.contains("501: Not Implemented"));
}

#[test]
fn cold_fetch_then_warm_hit_contacts_the_origin_exactly_once() {
    let body: Vec<u8> = b"XYZ".iter().cycle().take(50).copied().collect();
    let (origin_addr, connections) = spawn_fake_origin(body.clone());
    let cache = Cache::new();

    let request = format!("GET http://{origin_addr}/a HTTP/1.0\r\n\r\n").into_bytes();

    let first = round_trip(&cache, &request);
    assert_eq!(first, body, "cold fetch should relay the origin's bytes verbatim");
    assert_eq!(connections.load(Ordering::SeqCst), 1);

    let second = round_trip(&cache, &request);
    assert_eq!(second, body, "warm hit should serve identical bytes from cache");
    assert_eq!(
        connections.load(Ordering::SeqCst),
        1,
        "the second request must be served from cache, not a second origin connection"
    );
}

#[test]
fn oversize_response_bypasses_the_cache() {
    let body = vec![7u8; MAX_OBJECT_SIZE + 1];
    let (origin_addr, connections) = spawn_fake_origin(body.clone());
    let cache = Cache::new();

    let request = format!("GET http://{origin_addr}/big HTTP/1.0\r\n\r\n").into_bytes();

    let first = round_trip(&cache, &request);
    assert_eq!(first, body, "the client must still receive every byte");
    assert_eq!(connections.load(Ordering::SeqCst), 1);

    let second = round_trip(&cache, &request);
    assert_eq!(second, body);
    assert_eq!(
        connections.load(Ordering::SeqCst),
        2,
        "an object over the cap must never be cached, so the second request refetches"
    );
}
