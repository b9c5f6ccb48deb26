//! Unit tests for the intercepting reader over scripted sources
//!
//! These use `tokio-test`'s io mock to control exactly how bytes arrive from
//! the underlying stream: split mid-line, split mid-token, or interrupted by
//! a read error.

use std::io::{Error as IoError, ErrorKind};

use permashell::{InterceptReader, SentinelToken};

async fn drain<R: tokio::io::AsyncRead + Unpin>(reader: &mut InterceptReader<R>) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let chunk = reader.next_chunk().await.expect("read should succeed");
        if chunk.is_empty() {
            break;
        }
        out.extend_from_slice(chunk);
    }
    out
}

#[tokio::test]
async fn test_line_split_across_reads() {
    let token = SentinelToken::generate();
    let sentinel = format!("{} 0\n", token);
    let mock = tokio_test::io::Builder::new()
        .read(b"hel")
        .read(b"lo\n")
        .read(sentinel.as_bytes())
        .build();

    let mut reader = InterceptReader::new(mock, token);
    assert_eq!(drain(&mut reader).await, b"hello\n");
    assert_eq!(reader.exit_status(), Some(0));
}

#[tokio::test]
async fn test_sentinel_split_across_reads() {
    let token = SentinelToken::generate();
    let sentinel = format!("{} 17\n", token);
    let (head, tail) = sentinel.as_bytes().split_at(10);
    let mock = tokio_test::io::Builder::new()
        .read(b"payload\n")
        .read(head)
        .read(tail)
        .build();

    let mut reader = InterceptReader::new(mock, token);
    assert_eq!(drain(&mut reader).await, b"payload\n");
    assert_eq!(reader.exit_status(), Some(17));
}

#[tokio::test]
async fn test_read_error_propagates_unchanged() {
    let token = SentinelToken::generate();
    let mock = tokio_test::io::Builder::new()
        .read(b"before the failure\n")
        .read_error(IoError::new(ErrorKind::ConnectionReset, "pipe broke"))
        .build();

    let mut reader = InterceptReader::new(mock, token);

    let first = reader.next_chunk().await.expect("first line should arrive");
    assert_eq!(first, b"before the failure\n");

    let err = reader
        .next_chunk()
        .await
        .expect_err("the injected error should surface");
    assert_eq!(err.kind(), ErrorKind::ConnectionReset);
    assert_eq!(reader.exit_status(), None);
}

#[tokio::test]
async fn test_multiline_output_before_sentinel() {
    let token = SentinelToken::generate();
    let data = format!("one\ntwo\nthree\n{} 2\n", token);
    let mock = tokio_test::io::Builder::new().read(data.as_bytes()).build();

    let mut reader = InterceptReader::new(mock, token);
    assert_eq!(drain(&mut reader).await, b"one\ntwo\nthree\n");
    assert_eq!(reader.exit_status(), Some(2));
}

#[tokio::test]
async fn test_small_buffer_capacity_still_works() {
    let token = SentinelToken::generate();
    let data = format!("a line much longer than the buffer capacity\n{} 6\n", token);
    let mock = tokio_test::io::Builder::new().read(data.as_bytes()).build();

    // Capacity far below the line length; read_until grows the line buffer.
    let mut reader = InterceptReader::with_capacity(8, mock, token);
    assert_eq!(
        drain(&mut reader).await,
        b"a line much longer than the buffer capacity\n"
    );
    assert_eq!(reader.exit_status(), Some(6));
}
