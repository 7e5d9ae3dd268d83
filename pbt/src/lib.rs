//! PBT テスト共通ユーティリティ

use proptest::prelude::*;
use proptest::sample::Index;

// ========================================
// リクエスト要素の生成
// ========================================

/// メソッド: よく使うものと任意の token
pub fn method() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("GET".to_string()),
        Just("POST".to_string()),
        Just("PUT".to_string()),
        Just("DELETE".to_string()),
        Just("OPTIONS".to_string()),
        Just("PATCH".to_string()),
        "[A-Z]{1,10}".prop_map(|s| s),
    ]
}

/// origin-form のターゲット
pub fn origin_target() -> impl Strategy<Value = String> {
    "/[a-zA-Z0-9/_.-]{0,32}(\\?[a-z0-9=&]{1,16})?".prop_map(|s| s)
}

/// ヘッダー名: フレーミングに関わる名前と衝突しないよう X- を付ける
pub fn header_name() -> impl Strategy<Value = String> {
    "X-[A-Za-z0-9-]{1,16}".prop_map(|s| s)
}

/// ヘッダー値: 前後に空白を含まない可視 ASCII
pub fn header_value() -> impl Strategy<Value = String> {
    "[!-~]([ !-~]{0,30}[!-~])?".prop_map(|s| s)
}

pub fn headers() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::vec((header_name(), header_value()), 0..8)
}

pub fn body() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..256)
}

/// 空でないチャンクの列
pub fn chunks() -> impl Strategy<Value = Vec<Vec<u8>>> {
    proptest::collection::vec(proptest::collection::vec(any::<u8>(), 1..64), 0..6)
}

// ========================================
// 入力の分割
// ========================================

/// 分割位置
pub fn split_points() -> impl Strategy<Value = Vec<Index>> {
    proptest::collection::vec(any::<Index>(), 0..8)
}

/// data を分割位置で切り分ける
///
/// 分割位置が重なった場合は空の断片になる。
pub fn split<'a>(data: &'a [u8], points: &[Index]) -> Vec<&'a [u8]> {
    let mut cuts: Vec<usize> = points.iter().map(|p| p.index(data.len() + 1)).collect();
    cuts.sort_unstable();

    let mut pieces = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        pieces.push(&data[start..cut]);
        start = cut;
    }
    pieces.push(&data[start..]);
    pieces
}

/// リクエストラインとヘッダーを組み立てる (空行まで)
pub fn request_head(method: &str, target: &str, headers: &[(String, String)]) -> Vec<u8> {
    let mut head = format!("{} {} HTTP/1.1\r\n", method, target);
    for (name, value) in headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("\r\n");
    head.into_bytes()
}
