#![no_main]

use arbitrary::Arbitrary;
use http11_request::{ParseState, ParserOptions, RequestAssembler};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    data: Vec<u8>,
    split_size: u8,
    strict: bool,
}

fn options(strict: bool) -> ParserOptions {
    if strict {
        ParserOptions::strict()
    } else {
        ParserOptions::default()
    }
}

fuzz_target!(|input: FuzzInput| {
    let split_size = usize::from(input.split_size).max(1);

    // データを一度に渡す
    let mut whole = RequestAssembler::with_options(options(input.strict));
    whole.append_data(&input.data);

    // データを分割して渡す (ストリーミングシナリオ)
    let mut split = RequestAssembler::with_options(options(input.strict));
    let mut header_complete = false;
    for part in input.data.chunks(split_size) {
        let ok = split.append_data(part);
        // ヘッダー完了フラグは一度 true になったら戻らない
        assert!(!header_complete || split.header_complete());
        header_complete = split.header_complete();
        if !ok {
            assert!(split.is_failed());
            assert!(!split.append_data(b"\r\n"));
            break;
        }
    }

    // 分割位置で結果が変わらない
    assert_eq!(whole.state(), split.state());
    assert_eq!(whole.header_complete(), split.header_complete());
    if whole.state() == ParseState::Complete {
        assert_eq!(whole.body().as_bytes(), split.body().as_bytes());
    }

    // 入力終了後は完了か失敗のどちらか
    split.end_of_input();
    assert!(split.is_complete() || split.is_failed());
});
