//! Connection Tests
//!
//! Tests verify:
//! - Sends write exact bytes, and refused sends write nothing
//! - Reads that time out or would block change nothing
//! - Replies assembled across many small reads
//! - Fatal failures break the connection and record the last error
//! - Request helpers

use std::io::ErrorKind;

use redwire::protocol::DecoderPhase;
use redwire::{ClientConfig, Connection, Value, WireError};

use crate::scripted_stream::{ScriptedStream, Step};

fn connection(stream: ScriptedStream) -> Connection<ScriptedStream> {
    Connection::with_stream(stream, ClientConfig::default())
}

fn written(conn: &Connection<ScriptedStream>) -> Vec<u8> {
    conn.stream().map(|s| s.written().to_vec()).unwrap_or_default()
}

/// Read until at least one reply is queued, returning the number of reads taken
fn read_until_reply(conn: &mut Connection<ScriptedStream>) -> usize {
    let mut reads = 0;
    while conn.pending_replies() == 0 {
        conn.read().unwrap();
        reads += 1;
        assert!(reads < 10_000, "reply never completed");
    }
    reads
}

// =============================================================================
// Unattached
// =============================================================================

#[test]
fn test_send_without_stream() {
    let mut conn = Connection::<ScriptedStream>::new(ClientConfig::default());

    let err = conn.send(&[Value::text("PING")]).unwrap_err();

    assert!(matches!(err, WireError::Parameter(_)));
    assert!(!conn.is_broken());
    assert!(conn.last_error().unwrap().contains("no stream attached"));
}

#[test]
fn test_read_without_stream() {
    let mut conn = Connection::<ScriptedStream>::new(ClientConfig::default());

    let err = conn.read().unwrap_err();

    assert!(matches!(err, WireError::Parameter(_)));
    assert!(!conn.is_attached());
}

// =============================================================================
// Send
// =============================================================================

#[test]
fn test_send_multi_bulk_bytes() {
    let mut conn = connection(ScriptedStream::new());

    let n = conn
        .send_multi_bulk(&[Value::text("SET"), Value::text("key"), Value::binary(b"value")])
        .unwrap();

    assert_eq!(written(&conn), b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n");
    assert_eq!(n, 33);
    assert!(conn.last_error().is_none());
}

#[test]
fn test_send_inline_and_bulk_bytes() {
    let mut conn = connection(ScriptedStream::new());

    conn.send(&[Value::text("GET"), Value::text("key")]).unwrap();
    conn.send_bulk(&[Value::text("SET"), Value::text("key"), Value::binary(b"\x00")])
        .unwrap();

    assert_eq!(written(&conn), b"GET key\r\nSET key 1\r\n\x00\r\n");
}

#[test]
fn test_refused_send_writes_nothing() {
    let mut conn = connection(ScriptedStream::new());

    let err = conn
        .send(&[Value::text("SET"), Value::text("key"), Value::binary(b"v")])
        .unwrap_err();

    assert!(matches!(err, WireError::ArgumentType { .. }));
    assert!(written(&conn).is_empty());
    assert!(!conn.is_broken());
    assert!(conn.last_error().unwrap().contains("none of the arguments"));
}

#[test]
fn test_send_survives_short_writes() {
    let mut conn = connection(ScriptedStream::new().write_limit(2));

    conn.send_multi_bulk(&[Value::text("PING")]).unwrap();

    assert_eq!(written(&conn), b"*1\r\n$4\r\nPING\r\n");
}

#[test]
fn test_write_failure_breaks_connection() {
    let mut conn = connection(ScriptedStream::new().failing_writes());

    let err = conn.send_multi_bulk(&[Value::text("PING")]).unwrap_err();

    assert!(matches!(err, WireError::Io(_)));
    assert!(conn.is_broken());
}

// =============================================================================
// Read
// =============================================================================

#[test]
fn test_read_counts_completed_replies() {
    let mut conn = connection(
        ScriptedStream::new()
            .data(b"+O")
            .data(b"K\r\n:1\r\n$3\r\nab"),
    );

    assert_eq!(conn.read().unwrap(), 0);
    assert_eq!(conn.read().unwrap(), 2);
    assert_eq!(conn.pending_replies(), 2);
    assert_eq!(conn.decoder_phase(), DecoderPhase::ReadingBulk { len: 3 });
}

#[test]
fn test_would_block_changes_nothing() {
    let mut conn = connection(
        ScriptedStream::new()
            .data(b"$5\r\nhe")
            .step(Step::WouldBlock)
            .step(Step::TimedOut)
            .data(b"llo\r\n"),
    );

    conn.read().unwrap();
    let phase = conn.decoder_phase();
    let buffered = conn.buffered_len();

    assert_eq!(conn.read().unwrap(), 0);
    assert_eq!(conn.read().unwrap(), 0);
    assert_eq!(conn.decoder_phase(), phase);
    assert_eq!(conn.buffered_len(), buffered);
    assert!(!conn.is_broken());
    assert!(conn.last_error().is_none());

    assert_eq!(conn.read().unwrap(), 1);
    assert_eq!(
        conn.pop_reply().unwrap().as_single(),
        Some(&Value::binary(b"hello"))
    );
}

#[test]
fn test_interrupted_receive_is_retried() {
    let mut conn = connection(
        ScriptedStream::new()
            .step(Step::Fail(ErrorKind::Interrupted))
            .step(Step::Fail(ErrorKind::Interrupted))
            .data(b"+OK\r\n"),
    );

    assert_eq!(conn.read().unwrap(), 1);
    assert!(!conn.is_broken());
    assert!(conn.last_error().is_none());
}

#[test]
fn test_reply_assembled_from_tiny_reads() {
    let mut conn = connection(
        ScriptedStream::new()
            .data(b"*3\r\n$3\r\nfoo\r\n:42\r\n$-1\r\n+OK\r\n")
            .max_read(3),
    );

    read_until_reply(&mut conn);

    let reply = conn.pop_reply().unwrap();
    assert_eq!(
        reply.values(),
        &[Value::binary(b"foo"), Value::Integer(42), Value::Nil]
    );
}

#[test]
fn test_large_reply_sized_by_needed_hint() {
    let payload = vec![b'z'; 10_000];
    let mut wire = b"$10000\r\n".to_vec();
    wire.extend_from_slice(&payload);
    wire.extend_from_slice(b"\r\n");

    let config = ClientConfig::builder()
        .initial_buffer_capacity(16)
        .read_chunk_size(16)
        .build();
    let mut conn = Connection::with_stream(ScriptedStream::new().data(&wire), config);

    let reads = read_until_reply(&mut conn);

    assert!(reads <= 2, "took {} reads", reads);
    assert_eq!(
        conn.pop_reply().unwrap().as_single().and_then(Value::as_bytes),
        Some(payload.as_slice())
    );
    assert_eq!(conn.buffered_len(), 0);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_peer_close_breaks_connection() {
    let mut conn = connection(ScriptedStream::new().step(Step::Eof));

    let err = conn.read().unwrap_err();

    assert!(matches!(err, WireError::Connection(_)));
    assert!(conn.is_broken());
    assert!(conn.last_error().unwrap().contains("connection closed by peer"));
}

#[test]
fn test_io_failure_breaks_connection() {
    let mut conn = connection(ScriptedStream::new().step(Step::Fail(ErrorKind::ConnectionReset)));

    let err = conn.read().unwrap_err();

    assert!(matches!(err, WireError::Io(_)));
    assert!(conn.is_broken());
}

#[test]
fn test_protocol_error_breaks_connection() {
    let mut conn = connection(ScriptedStream::new().data(b"+OK\r\n%bogus\r\n"));

    let err = conn.read().unwrap_err();

    assert!(matches!(err, WireError::Protocol(_)));
    assert!(conn.is_broken());
    assert!(conn.last_error().unwrap().contains("Protocol error"));
    assert_eq!(conn.pending_replies(), 1, "replies decoded before the error stay queued");
}

#[test]
fn test_broken_connection_refuses_further_io() {
    let mut conn = connection(ScriptedStream::new().step(Step::Eof));
    let _ = conn.read();

    let err = conn.send_multi_bulk(&[Value::text("PING")]).unwrap_err();

    assert!(matches!(err, WireError::Connection(_)));
    assert!(written(&conn).is_empty());
    assert!(conn.read().is_err());
}

#[test]
fn test_attach_clears_failure_state() {
    let mut conn = connection(ScriptedStream::new().data(b"+OK\r\n").step(Step::Eof));
    conn.read().unwrap();
    let _ = conn.read();
    assert!(conn.is_broken());

    conn.attach(ScriptedStream::new().data(b":1\r\n"));

    assert!(!conn.is_broken());
    assert!(conn.last_error().is_none());
    assert_eq!(conn.pending_replies(), 0);
    assert_eq!(conn.read().unwrap(), 1);
}

#[test]
fn test_detach_returns_stream() {
    let mut conn = connection(ScriptedStream::new());
    conn.send(&[Value::text("PING")]).unwrap();

    let stream = conn.detach().unwrap();

    assert_eq!(stream.written(), b"PING\r\n");
    assert!(!conn.is_attached());
}

// =============================================================================
// Request Helpers
// =============================================================================

#[test]
fn test_request_returns_reply() {
    let mut conn = connection(ScriptedStream::new().data(b"+PONG\r\n").max_read(2));

    let reply = conn.request(&[Value::text("PING")]).unwrap();

    assert_eq!(reply.as_single(), Some(&Value::text("PONG")));
    assert_eq!(written(&conn), b"*1\r\n$4\r\nPING\r\n");
}

#[test]
fn test_request_requires_empty_queue() {
    let mut conn = connection(ScriptedStream::new().data(b"+OK\r\n"));
    conn.read().unwrap();

    let err = conn.request(&[Value::text("PING")]).unwrap_err();

    assert!(matches!(err, WireError::Parameter(_)));
    assert!(written(&conn).is_empty());
    assert!(!conn.is_broken());
}

#[test]
fn test_request_times_out() {
    let mut conn = connection(ScriptedStream::new().step(Step::TimedOut));

    let err = conn.request(&[Value::text("PING")]).unwrap_err();

    assert!(matches!(err, WireError::Connection(_)));
    assert!(conn.last_error().unwrap().contains("timed out"));
}

#[test]
fn test_request_survives_interrupted_receive() {
    let mut conn = connection(
        ScriptedStream::new()
            .step(Step::Fail(ErrorKind::Interrupted))
            .data(b":1\r\n"),
    );

    assert!(conn.exists(b"k").unwrap());
    assert!(!conn.is_broken());
}

#[test]
fn test_exists() {
    let mut conn = connection(ScriptedStream::new().data(b":1\r\n:0\r\n").max_read(4));

    assert!(conn.exists(b"present").unwrap());
    assert!(!conn.exists(b"absent").unwrap());
    assert_eq!(
        written(&conn),
        b"*2\r\n$6\r\nEXISTS\r\n$7\r\npresent\r\n*2\r\n$6\r\nEXISTS\r\n$6\r\nabsent\r\n"
    );
}

#[test]
fn test_request_integer_server_error() {
    let mut conn = connection(ScriptedStream::new().data(b"-ERR wrong kind of value\r\n"));

    let err = conn.request_integer(&[Value::text("INCR"), Value::text("k")]).unwrap_err();

    assert!(matches!(err, WireError::Server(ref msg) if msg == "ERR wrong kind of value"));
    assert!(!conn.is_broken());
    assert!(conn.last_error().is_some());
}

#[test]
fn test_request_integer_unexpected_reply() {
    let mut conn = connection(ScriptedStream::new().data(b"+OK\r\n"));

    let err = conn.request_integer(&[Value::text("INCR"), Value::text("k")]).unwrap_err();

    assert!(matches!(err, WireError::UnexpectedReply(_)));
    assert!(!conn.is_broken());
}
