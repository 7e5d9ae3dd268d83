//! エンコーダーと Request のプロパティテスト

use http11_request::{
    BodyFraming, Request, RequestAssembler, Version, encode_chunk, encode_chunks,
};
use pbt::{body, chunks, headers, origin_target, request_head};
use proptest::prelude::*;

fn http_version() -> impl Strategy<Value = Version> {
    prop_oneof![Just(Version::Http10), Just(Version::Http11)]
}

fn parse(wire: &[u8]) -> Request {
    let mut assembler = RequestAssembler::new();
    assert!(assembler.append_data(wire));
    assembler.into_request().unwrap()
}

// ========================================
// エンコードしたリクエストを再びパースできること
// ========================================

proptest! {
    #[test]
    fn encoded_request_parses_back(
        version in http_version(),
        target in origin_target(),
        headers in headers(),
        body in body()
    ) {
        let mut request = Request::with_version("POST", &target, version);
        for (name, value) in &headers {
            request.add_header(name, value);
        }
        let request = request.body(body.clone());

        let parsed = parse(&request.encode());
        prop_assert_eq!(&parsed.method, "POST");
        prop_assert_eq!(&parsed.target, &target);
        prop_assert_eq!(parsed.version, version);
        prop_assert_eq!(&parsed.headers.as_slice()[..headers.len()], headers.as_slice());
        prop_assert_eq!(parsed.body.as_bytes(), body.as_slice());
        if body.is_empty() {
            prop_assert_eq!(parsed.framing, BodyFraming::None);
        } else {
            prop_assert_eq!(parsed.framing, BodyFraming::Fixed(body.len() as u64));
            let body_len = body.len().to_string();
            prop_assert_eq!(parsed.get_header("content-length"), Some(body_len.as_str()));
        }
    }
}

proptest! {
    #[test]
    fn chunked_request_reencodes_identically(chunks in chunks()) {
        let refs: Vec<&[u8]> = chunks.iter().map(|c| c.as_slice()).collect();
        let mut wire = request_head(
            "POST",
            "/stream",
            &[("Transfer-Encoding".to_string(), "chunked".to_string())],
        );
        wire.extend_from_slice(&encode_chunks(&refs));

        let parsed = parse(&wire);
        prop_assert!(parsed.is_chunked());
        prop_assert_eq!(parsed.encode(), wire);
    }
}

proptest! {
    #[test]
    fn encode_chunk_valid(data in body()) {
        let chunk = encode_chunk(&data);

        if data.is_empty() {
            prop_assert_eq!(&chunk, b"0\r\n\r\n");
        } else {
            let expected_size = format!("{:x}\r\n", data.len());
            prop_assert!(chunk.starts_with(expected_size.as_bytes()));
            prop_assert!(chunk.ends_with(b"\r\n"));
            prop_assert_eq!(chunk.len(), expected_size.len() + data.len() + 2);
        }
    }
}

proptest! {
    #[test]
    fn keep_alive_follows_version_and_connection(
        version in http_version(),
        connection in prop_oneof![
            Just(None),
            Just(Some("close")),
            Just(Some("keep-alive")),
            Just(Some("Keep-Alive, Upgrade")),
        ]
    ) {
        let mut request = Request::with_version("GET", "/", version);
        if let Some(value) = connection {
            request.add_header("Connection", value);
        }
        let expected = match connection {
            Some("close") => false,
            Some(_) => true,
            None => version == Version::Http11,
        };
        prop_assert_eq!(parse(&request.encode()).is_keep_alive(), expected);
    }
}
