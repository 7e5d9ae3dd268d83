use std::fmt;

/// パースエラーの種類
///
/// いずれも終端的なエラーで、発生後はそのリクエストのパースを続行できない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// リクエストラインが不正
    MalformedRequestLine,
    /// ヘッダーフィールドが不正
    MalformedHeaderField,
    /// 値の異なる Content-Length ヘッダーが複数ある
    ConflictingContentLength,
    /// チャンクサイズ行が不正
    MalformedChunkSize,
    /// HTTP/1.0, HTTP/1.1 以外のバージョン
    UnsupportedVersion,
    /// チャンクデータの後に行終端がない
    MalformedChunkedBody,
    /// Transfer-Encoding: chunked と Content-Length が同時に指定されている
    ///
    /// `ParserOptions::reject_ambiguous_framing` が有効な場合のみ発生する。
    ConflictingFraming,
    /// 接続終了までをボディとするフレーミングが許可されていない
    UnsupportedFraming,
    /// メッセージの途中で入力が終了した
    IncompleteMessage,
}

impl ErrorKind {
    fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MalformedRequestLine => "malformed request line",
            ErrorKind::MalformedHeaderField => "malformed header field",
            ErrorKind::ConflictingContentLength => "conflicting Content-Length",
            ErrorKind::MalformedChunkSize => "malformed chunk size",
            ErrorKind::UnsupportedVersion => "unsupported HTTP version",
            ErrorKind::MalformedChunkedBody => "malformed chunked body",
            ErrorKind::ConflictingFraming => "conflicting Transfer-Encoding and Content-Length",
            ErrorKind::UnsupportedFraming => "unsupported body framing",
            ErrorKind::IncompleteMessage => "incomplete message",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP リクエストのパースエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct Error {
    kind: ErrorKind,
    detail: String,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub(crate) fn request_line(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedRequestLine, detail)
    }

    pub(crate) fn header_field(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedHeaderField, detail)
    }

    pub(crate) fn chunk_size(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedChunkSize, detail)
    }

    /// エラーの種類を取得
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// エラーの詳細メッセージを取得
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_detail() {
        let e = Error::request_line("empty method");
        assert_eq!(e.to_string(), "malformed request line: empty method");
        assert_eq!(e.kind(), ErrorKind::MalformedRequestLine);
        assert_eq!(e.detail(), "empty method");
    }
}
