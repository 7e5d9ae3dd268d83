//! ヘッダーフィールドの保持とパース (RFC 7230 Section 3.2)

use std::collections::HashMap;

use crate::error::Error;

/// 順序付きのヘッダーリスト
///
/// 到着順の `(名前, 値)` 列と、小文字化した名前から位置への索引を持つ。
/// 同じ名前のヘッダーはマージせず、別々のエントリとして保持する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, String)>,
    index: HashMap<String, Vec<usize>>,
}

impl Headers {
    /// 空のヘッダーリストを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// ヘッダーを末尾に追加
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.index
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(self.fields.len());
        self.fields.push((name, value.into()));
    }

    /// 直前のヘッダーの値に継続行の内容を連結 (obs-fold)
    ///
    /// 直前のヘッダーがない場合は `false` を返す。
    pub(crate) fn extend_last(&mut self, continuation: &str) -> bool {
        let Some((_, value)) = self.fields.last_mut() else {
            return false;
        };
        if !continuation.is_empty() {
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(continuation);
        }
        true
    }

    /// ヘッダーを取得 (大文字小文字を区別しない)
    ///
    /// 同名のヘッダーが複数ある場合は最初のものを返す。
    pub fn get(&self, name: &str) -> Option<&str> {
        let first = *self.positions(name).first()?;
        Some(self.fields[first].1.as_str())
    }

    /// 指定した名前のヘッダーをすべて到着順に取得
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.positions(name)
            .iter()
            .map(|&i| self.fields[i].1.as_str())
            .collect()
    }

    /// ヘッダーが存在するか確認
    pub fn contains(&self, name: &str) -> bool {
        !self.positions(name).is_empty()
    }

    /// ヘッダーを到着順に列挙
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// ヘッダー数
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// ヘッダーが空か確認
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `(名前, 値)` のスライスとして取得
    pub fn as_slice(&self) -> &[(String, String)] {
        &self.fields
    }

    /// カンマ区切りのリストとして値を列挙 (RFC 7230 Section 7)
    ///
    /// 同名の複数ヘッダーは 1 つのリストとして連結し、空要素は読み飛ばす。
    pub fn tokens<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.get_all(name)
            .into_iter()
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    fn positions(&self, name: &str) -> &[usize] {
        // 索引キーは小文字。呼び出し側が既に小文字ならアロケーションしない
        let found = if name.bytes().any(|b| b.is_ascii_uppercase()) {
            self.index.get(&name.to_ascii_lowercase())
        } else {
            self.index.get(name)
        };
        found.map_or(&[], Vec::as_slice)
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

/// ヘッダーブロック内の 1 行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldLine<'a> {
    /// name ":" value
    Field { name: &'a str, value: &'a str },
    /// 空白で始まる継続行 (obs-fold)。内容は前後の空白を除去済み
    Continuation(&'a str),
}

/// 終端を除いたヘッダー行をパース
///
/// 名前と値は前後の空白を除去する。名前は token でなければならない。
pub(crate) fn parse_field_line(line: &[u8]) -> Result<FieldLine<'_>, Error> {
    let line = std::str::from_utf8(line)
        .map_err(|e| Error::header_field(format!("invalid UTF-8: {e}")))?;

    if line.starts_with([' ', '\t']) {
        let content = trim_ows(line);
        if !is_field_value(content) {
            return Err(Error::header_field(
                "continuation line contains control characters",
            ));
        }
        return Ok(FieldLine::Continuation(content));
    }

    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| Error::header_field(format!("missing colon: {line:?}")))?;
    let name = trim_ows(name);
    let value = trim_ows(value);

    if !is_token(name) {
        return Err(Error::header_field(format!("invalid name: {name:?}")));
    }
    if !is_field_value(value) {
        return Err(Error::header_field(format!(
            "value of {name} contains control characters"
        )));
    }

    Ok(FieldLine::Field { name, value })
}

/// ヘッダー行をパースしてヘッダーリストに反映
///
/// 継続行は直前のヘッダーの値に連結する。ヘッダーブロックとトレーラーで共通。
pub(crate) fn apply_field_line(
    headers: &mut Headers,
    line: &[u8],
    allow_obs_fold: bool,
) -> Result<(), Error> {
    match parse_field_line(line)? {
        FieldLine::Field { name, value } => headers.append(name, value),
        FieldLine::Continuation(_) if !allow_obs_fold => {
            return Err(Error::header_field("obsolete line folding is not allowed"));
        }
        FieldLine::Continuation(content) => {
            if !headers.extend_last(content) {
                return Err(Error::header_field(
                    "continuation line without a preceding field",
                ));
            }
        }
    }
    Ok(())
}

/// OWS (SP / HTAB) を前後から除去
pub(crate) fn trim_ows(s: &str) -> &str {
    s.trim_matches(|c| c == ' ' || c == '\t')
}

/// token = 1*tchar
pub(crate) fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_token_char)
}

/// tchar か確認
pub(crate) fn is_token_char(b: u8) -> bool {
    matches!(
        b,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' |
        b'0'..=b'9' | b'A'..=b'Z' | b'^' | b'_' | b'`' | b'a'..=b'z' | b'|' | b'~'
    )
}

/// ヘッダー値に制御文字 (HTAB 以外) を含まないか確認
///
/// field-vchar = VCHAR / obs-text, SP と HTAB は field-content に含まれる
fn is_field_value(value: &str) -> bool {
    value
        .bytes()
        .all(|b| matches!(b, 0x09 | 0x20..=0x7E | 0x80..=0xFF))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut headers = Headers::new();
        headers.append("Content-Type", "text/plain");
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert!(headers.contains("Content-type"));
        assert!(!headers.contains("Content-Length"));
    }

    #[test]
    fn duplicates_preserved_in_order() {
        let headers: Headers = [("Cookie", "a=1"), ("Host", "x"), ("cookie", "b=2")]
            .into_iter()
            .collect();
        assert_eq!(headers.len(), 3);
        assert_eq!(headers.get("Cookie"), Some("a=1"));
        assert_eq!(headers.get_all("COOKIE"), vec!["a=1", "b=2"]);
        let names: Vec<&str> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Cookie", "Host", "cookie"]);
    }

    #[test]
    fn extend_last_folds_with_single_space() {
        let mut headers = Headers::new();
        assert!(!headers.extend_last("orphan"));
        headers.append("X-Long", "first");
        assert!(headers.extend_last("second"));
        assert!(headers.extend_last(""));
        assert_eq!(headers.get("x-long"), Some("first second"));
    }

    #[test]
    fn tokens_span_multiple_fields() {
        let headers: Headers = [
            ("Transfer-Encoding", "gzip, "),
            ("Transfer-Encoding", "chunked"),
        ]
        .into_iter()
        .collect();
        let tokens: Vec<&str> = headers.tokens("transfer-encoding").collect();
        assert_eq!(tokens, vec!["gzip", "chunked"]);
    }

    #[test]
    fn parse_field() {
        assert_eq!(
            parse_field_line(b"Host:  example.com \t").unwrap(),
            FieldLine::Field {
                name: "Host",
                value: "example.com"
            }
        );
        assert_eq!(
            parse_field_line(b"X-Empty:").unwrap(),
            FieldLine::Field {
                name: "X-Empty",
                value: ""
            }
        );
        assert_eq!(
            parse_field_line(b"X-Time: 12:30").unwrap(),
            FieldLine::Field {
                name: "X-Time",
                value: "12:30"
            }
        );
    }

    #[test]
    fn parse_continuation() {
        assert_eq!(
            parse_field_line(b" \t more text ").unwrap(),
            FieldLine::Continuation("more text")
        );
    }

    #[test]
    fn parse_invalid_fields() {
        for line in [
            &b"no colon here"[..],
            b": value",
            b"Bad Name: value",
            b"Bad@Name: value",
            b"Name: val\x00ue",
            b"Name: \xff",
        ] {
            let e = parse_field_line(line).unwrap_err();
            assert_eq!(e.kind(), ErrorKind::MalformedHeaderField, "{line:?}");
        }
    }

    #[test]
    fn apply_folds_continuation() {
        let mut headers = Headers::new();
        apply_field_line(&mut headers, b"X-Folded: one", true).unwrap();
        apply_field_line(&mut headers, b"\ttwo", true).unwrap();
        assert_eq!(headers.get("X-Folded"), Some("one two"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn apply_rejects_orphan_or_disallowed_continuation() {
        let mut headers = Headers::new();
        let e = apply_field_line(&mut headers, b" orphan", true).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MalformedHeaderField);

        headers.append("A", "b");
        let e = apply_field_line(&mut headers, b" folded", false).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MalformedHeaderField);
        assert_eq!(headers.get("A"), Some("b"));
    }

    #[test]
    fn token_chars() {
        for name in ["Accept", "X_Custom", "X.Y", "X!#$%&'*+^`|~"] {
            assert!(is_token(name), "{name}");
        }
        for name in ["", "a b", "a:b", "a(b)", "a\"b"] {
            assert!(!is_token(name), "{name}");
        }
    }
}
