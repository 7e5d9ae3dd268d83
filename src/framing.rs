//! ボディのフレーミング判定 (RFC 7230 Section 3.3.3)

use crate::error::{Error, ErrorKind};
use crate::headers::Headers;
use crate::options::ParserOptions;

/// ボディの区切り方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    /// ボディなし
    None,
    /// Content-Length で指定された固定長
    Fixed(u64),
    /// Transfer-Encoding: chunked
    Chunked,
    /// 接続が閉じるまでがボディ
    ///
    /// 完了は呼び出し側が入力終了を通知した時点で決まる。
    UntilClose,
}

/// 慣習的にボディを持たないメソッド
const BODYLESS_METHODS: &[&str] = &["GET", "HEAD", "TRACE"];

/// ヘッダーからフレーミングを決定
///
/// 優先順位:
/// 1. Transfer-Encoding に chunked が含まれる -> Chunked (Content-Length は無視)
/// 2. Content-Length がある -> Fixed
/// 3. ボディを持たないメソッド、またはボディを示すヘッダーがない -> None
/// 4. それ以外 (chunked 以外の Transfer-Encoding) -> UntilClose
pub(crate) fn determine(
    method: &str,
    headers: &Headers,
    options: &ParserOptions,
) -> Result<BodyFraming, Error> {
    let has_transfer_encoding = headers.contains("Transfer-Encoding");
    let chunked = headers
        .tokens("Transfer-Encoding")
        .any(|t| t.eq_ignore_ascii_case("chunked"));

    if chunked {
        if options.reject_ambiguous_framing && headers.contains("Content-Length") {
            return Err(Error::new(
                ErrorKind::ConflictingFraming,
                "both Transfer-Encoding: chunked and Content-Length",
            ));
        }
        return Ok(BodyFraming::Chunked);
    }

    if let Some(len) = parse_content_length(headers)? {
        return Ok(BodyFraming::Fixed(len));
    }

    if !has_transfer_encoding || BODYLESS_METHODS.iter().any(|m| *m == method) {
        return Ok(BodyFraming::None);
    }

    if !options.allow_until_close {
        return Err(Error::new(
            ErrorKind::UnsupportedFraming,
            "request body length cannot be determined",
        ));
    }
    Ok(BodyFraming::UntilClose)
}

/// Content-Length ヘッダーを解析
///
/// 複数ある場合はすべて同じ値でなければならない。
fn parse_content_length(headers: &Headers) -> Result<Option<u64>, Error> {
    let mut value: Option<u64> = None;
    for raw in headers.get_all("Content-Length") {
        let parsed = parse_content_length_value(raw)?;
        match value {
            Some(prev) if prev != parsed => {
                return Err(Error::new(
                    ErrorKind::ConflictingContentLength,
                    format!("{prev} != {parsed}"),
                ));
            }
            _ => value = Some(parsed),
        }
    }
    Ok(value)
}

fn parse_content_length_value(input: &str) -> Result<u64, Error> {
    let input = input.trim();
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::header_field(format!(
            "invalid Content-Length: {input:?}"
        )));
    }
    input
        .parse::<u64>()
        .map_err(|_| Error::header_field("Content-Length overflow"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(fields: &[(&str, &str)]) -> Headers {
        fields.iter().copied().collect()
    }

    fn decide(method: &str, fields: &[(&str, &str)]) -> Result<BodyFraming, Error> {
        determine(method, &headers(fields), &ParserOptions::default())
    }

    #[test]
    fn no_body_headers() {
        assert_eq!(decide("GET", &[("Host", "x")]).unwrap(), BodyFraming::None);
        assert_eq!(decide("POST", &[]).unwrap(), BodyFraming::None);
    }

    #[test]
    fn content_length() {
        assert_eq!(
            decide("POST", &[("Content-Length", "42")]).unwrap(),
            BodyFraming::Fixed(42)
        );
        assert_eq!(
            decide("GET", &[("content-length", "0")]).unwrap(),
            BodyFraming::Fixed(0)
        );
    }

    #[test]
    fn identical_content_lengths_are_accepted() {
        assert_eq!(
            decide("POST", &[("Content-Length", "5"), ("Content-Length", "5")]).unwrap(),
            BodyFraming::Fixed(5)
        );
    }

    #[test]
    fn conflicting_content_lengths() {
        let e = decide("POST", &[("Content-Length", "4"), ("Content-Length", "5")]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::ConflictingContentLength);
    }

    #[test]
    fn invalid_content_length() {
        for value in ["", "-1", "+5", "1.5", "abc", "99999999999999999999999"] {
            let e = decide("POST", &[("Content-Length", value)]).unwrap_err();
            assert_eq!(e.kind(), ErrorKind::MalformedHeaderField, "{value}");
        }
    }

    #[test]
    fn chunked_wins_over_content_length() {
        assert_eq!(
            decide(
                "POST",
                &[("Content-Length", "10"), ("Transfer-Encoding", "chunked")]
            )
            .unwrap(),
            BodyFraming::Chunked
        );
        // 無視される Content-Length は検証もしない
        assert_eq!(
            decide(
                "POST",
                &[("Transfer-Encoding", "CHUNKED"), ("Content-Length", "x")]
            )
            .unwrap(),
            BodyFraming::Chunked
        );
    }

    #[test]
    fn chunked_token_in_list() {
        assert_eq!(
            decide("POST", &[("Transfer-Encoding", "gzip, chunked")]).unwrap(),
            BodyFraming::Chunked
        );
        assert_eq!(
            decide("POST", &[("Transfer-Encoding", "CHUNKED")]).unwrap(),
            BodyFraming::Chunked
        );
        // トークンとして一致しない場合は chunked とみなさない
        assert_eq!(
            decide("POST", &[("Transfer-Encoding", "xchunked")]).unwrap(),
            BodyFraming::UntilClose
        );
    }

    #[test]
    fn ambiguous_framing_rejected_when_configured() {
        let options = ParserOptions {
            reject_ambiguous_framing: true,
            ..ParserOptions::default()
        };
        let h = headers(&[("Transfer-Encoding", "chunked"), ("Content-Length", "3")]);
        let e = determine("POST", &h, &options).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::ConflictingFraming);
    }

    #[test]
    fn non_chunked_transfer_encoding() {
        assert_eq!(
            decide("POST", &[("Transfer-Encoding", "gzip")]).unwrap(),
            BodyFraming::UntilClose
        );
        assert_eq!(
            decide("GET", &[("Transfer-Encoding", "gzip")]).unwrap(),
            BodyFraming::None
        );
        let h = headers(&[("Transfer-Encoding", "gzip")]);
        let e = determine("POST", &h, &ParserOptions::strict()).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::UnsupportedFraming);
    }
}
