#![no_main]

use arbitrary::Arbitrary;
use http11_request::{RequestAssembler, encode_chunks};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct FuzzChunked {
    chunks: Vec<Vec<u8>>,
    split_hint: u8,
    trailer: Option<(u8, u8)>,
}

fn normalize_chunks(mut chunks: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
    chunks.retain(|chunk| !chunk.is_empty());
    if chunks.len() > 64 {
        chunks.truncate(64);
    }
    chunks
}

fuzz_target!(|input: FuzzChunked| {
    let chunks = normalize_chunks(input.chunks);
    let refs: Vec<&[u8]> = chunks.iter().map(|c| c.as_slice()).collect();

    let mut wire = b"POST /upload HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();
    let mut body = encode_chunks(&refs);
    if let Some((name, value)) = input.trailer {
        // 終端の CRLF の前にトレーラーを差し込む
        body.truncate(body.len() - 2);
        body.extend_from_slice(format!("X-T{}: {}\r\n\r\n", name, value).as_bytes());
    }
    wire.extend_from_slice(&body);

    let split_size = usize::from(input.split_hint).max(1);
    let mut assembler = RequestAssembler::new();
    for part in wire.chunks(split_size) {
        assert!(assembler.append_data(part));
    }
    assert!(assembler.is_complete());
    assert_eq!(assembler.body().as_bytes(), chunks.concat().as_slice());
    assert_eq!(assembler.body().chunks().len(), chunks.len());

    let request = assembler.into_request().unwrap();
    assert_eq!(request.encode(), wire);
});
