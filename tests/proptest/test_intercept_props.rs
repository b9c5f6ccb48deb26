//! Property-based tests for the intercepting reader

use proptest::prelude::*;

use permashell::{InterceptReader, SentinelToken};

/// Run the reader to end-of-stream on a single-threaded runtime
fn drain(data: Vec<u8>, token: SentinelToken) -> (Vec<u8>, Option<i32>) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime should build");
    rt.block_on(async move {
        let mut reader = InterceptReader::new(std::io::Cursor::new(data), token);
        let mut out = Vec::new();
        loop {
            let chunk = reader.next_chunk().await.expect("in-memory reads succeed");
            if chunk.is_empty() {
                break;
            }
            out.extend_from_slice(chunk);
        }
        let status = reader.exit_status();
        (out, status)
    })
}

proptest! {
    /// Lines that do not carry the live token pass through byte-identical
    /// and never terminate the stream.
    #[test]
    fn sentinel_free_lines_pass_through(
        lines in proptest::collection::vec("[ -~]{0,60}", 0..16)
    ) {
        let token = SentinelToken::generate();
        let mut data = String::new();
        for line in &lines {
            data.push_str(line);
            data.push('\n');
        }

        let (out, status) = drain(data.clone().into_bytes(), token);
        prop_assert_eq!(out, data.into_bytes());
        prop_assert_eq!(status, None);
    }

    /// Every status a shell can report round-trips through the sentinel line.
    #[test]
    fn any_shell_status_round_trips(status in 0i32..=255) {
        let token = SentinelToken::generate();
        let data = format!("{} {}\n", token, status);

        let (out, got) = drain(data.into_bytes(), token);
        prop_assert!(out.is_empty());
        prop_assert_eq!(got, Some(status));
    }

    /// Output preceding the sentinel is delivered unmodified and in order,
    /// including a final line with no trailing newline.
    #[test]
    fn payload_before_sentinel_is_preserved(
        payload in proptest::collection::vec("[ -~]{0,40}", 0..8),
        tail in "[a-zA-Z]{0,12}",
        status in 0i32..=255
    ) {
        let token = SentinelToken::generate();
        let mut expected = String::new();
        for line in &payload {
            expected.push_str(line);
            expected.push('\n');
        }
        expected.push_str(&tail);

        // The unterminated tail lands on the same line as the sentinel echo.
        let data = format!("{}{} {}\n", expected, token, status);
        let (out, got) = drain(data.into_bytes(), token);
        prop_assert_eq!(out, expected.into_bytes());
        prop_assert_eq!(got, Some(status));
    }
}
