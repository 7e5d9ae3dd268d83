#![no_main]

use arbitrary::Arbitrary;
use http11_request::{BodyFraming, Request, RequestAssembler};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct FuzzRequest {
    method_index: u8,
    path: Vec<u8>,
    headers: Vec<(u8, u8)>,
    body: Vec<u8>,
}

const METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"];

fn sanitize_path(path: &[u8]) -> String {
    let mut s = String::from("/");
    for b in path.iter().take(64) {
        if b.is_ascii_alphanumeric() || matches!(b, b'/' | b'-' | b'_' | b'.' | b'?' | b'=') {
            s.push(*b as char);
        }
    }
    s
}

fuzz_target!(|input: FuzzRequest| {
    let method = METHODS[usize::from(input.method_index) % METHODS.len()];
    let path = sanitize_path(&input.path);

    let mut request = Request::new(method, &path);
    for (name, value) in input.headers.iter().take(16) {
        request.add_header(&format!("X-F{}", name), &format!("v{}", value));
    }
    let request = request.body(input.body.clone());

    let wire = request.encode();
    let mut assembler = RequestAssembler::new();
    assert!(assembler.append_data(&wire));
    assert!(assembler.is_complete());
    assert!(assembler.take_remaining().is_empty());

    let parsed = assembler.into_request().unwrap();
    assert_eq!(parsed.method, method);
    assert_eq!(parsed.target, path);
    assert_eq!(parsed.body.as_bytes(), input.body.as_slice());
    if input.body.is_empty() {
        assert_eq!(parsed.framing, BodyFraming::None);
    }
});
