//! リクエストラインのパース (RFC 7230 Section 3.1.1)
//!
//! request-line = method SP request-target SP HTTP-version CRLF

use std::fmt;

use crate::error::{Error, ErrorKind};
use crate::headers::is_token;

/// HTTP バージョン
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    /// HTTP/1.0
    Http10,
    /// HTTP/1.1
    Http11,
}

impl Version {
    /// バージョン文字列をパース
    ///
    /// HTTP-version = HTTP-name "/" DIGIT "." DIGIT
    ///
    /// 文法に合わない場合は `MalformedRequestLine`、
    /// 文法には合うが 1.0 / 1.1 以外の場合は `UnsupportedVersion` を返す。
    pub fn parse(s: &str) -> Result<Self, Error> {
        let b = s.as_bytes();
        let grammatical = b.len() == 8
            && b.starts_with(b"HTTP/")
            && b[5].is_ascii_digit()
            && b[6] == b'.'
            && b[7].is_ascii_digit();
        if !grammatical {
            return Err(Error::request_line(format!("invalid HTTP version: {s:?}")));
        }
        match (b[5], b[7]) {
            (b'1', b'0') => Ok(Version::Http10),
            (b'1', b'1') => Ok(Version::Http11),
            _ => Err(Error::new(ErrorKind::UnsupportedVersion, s)),
        }
    }

    /// バージョン文字列を取得
    pub fn as_str(self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// request-target の形式 (RFC 7230 Section 5.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetForm {
    /// origin-form: absolute-path [ "?" query ]
    /// 例: /path/to/resource?query=value
    Origin,
    /// absolute-form: absolute-URI
    /// 例: http://example.com/path
    Absolute,
    /// authority-form: host:port (CONNECT 用)
    Authority,
    /// asterisk-form: "*" (OPTIONS 用)
    Asterisk,
}

impl TargetForm {
    /// request-target の形式を判定
    ///
    /// 判定のみで、形式ごとの詳細な検証は行わない。
    pub fn of(target: &str) -> Self {
        if target == "*" {
            TargetForm::Asterisk
        } else if target.starts_with('/') {
            TargetForm::Origin
        } else if target.contains("://") {
            TargetForm::Absolute
        } else {
            TargetForm::Authority
        }
    }
}

/// リクエストライン
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// HTTP メソッド (GET, POST, etc.)
    pub method: String,
    /// request-target (解釈せずにそのまま保持)
    pub target: String,
    /// HTTP バージョン
    pub version: Version,
}

impl RequestLine {
    /// メソッド、ターゲット、バージョンからリクエストラインを作成
    ///
    /// バイト列からパースした場合と同じ検証を行う。
    pub fn new(method: &str, target: &str, version: Version) -> Result<Self, Error> {
        validate_method(method)?;
        validate_target(target)?;
        Ok(Self {
            method: method.to_string(),
            target: target.to_string(),
            version,
        })
    }

    /// 終端を除いた 1 行をパース
    pub fn parse(line: &[u8]) -> Result<Self, Error> {
        let line = std::str::from_utf8(line)
            .map_err(|e| Error::request_line(format!("invalid UTF-8: {e}")))?;

        // 単一の SP で区切る。連続した SP は空トークンとなりエラーになる
        let parts: Vec<&str> = line.split(' ').collect();
        let [method, target, version] = parts.as_slice() else {
            return Err(Error::request_line(format!(
                "expected 3 tokens, found {}",
                parts.len()
            )));
        };
        if method.is_empty() || target.is_empty() || version.is_empty() {
            return Err(Error::request_line("empty token"));
        }

        validate_method(method)?;
        validate_target(target)?;
        let version = Version::parse(version)?;

        Ok(Self {
            method: (*method).to_string(),
            target: (*target).to_string(),
            version,
        })
    }

    /// request-target の形式を取得
    pub fn target_form(&self) -> TargetForm {
        TargetForm::of(&self.target)
    }
}

impl fmt::Display for RequestLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.method, self.target, self.version)
    }
}

/// ターゲットのパス部分を取得
///
/// absolute-form の場合はスキームと authority を取り除く。
pub(crate) fn target_path(target: &str) -> &str {
    let without_query = target.split(['?', '#']).next().unwrap_or(target);
    match TargetForm::of(target) {
        TargetForm::Absolute => {
            let after_scheme = without_query
                .split_once("://")
                .map_or(without_query, |(_, rest)| rest);
            after_scheme.find('/').map_or("/", |i| &after_scheme[i..])
        }
        _ => without_query,
    }
}

/// ターゲットのクエリ部分を取得
pub(crate) fn target_query(target: &str) -> Option<&str> {
    let (_, query) = target.split_once('?')?;
    Some(query.split('#').next().unwrap_or(query))
}

fn validate_method(method: &str) -> Result<(), Error> {
    if !is_token(method) {
        return Err(Error::request_line(format!("invalid method: {method:?}")));
    }
    Ok(())
}

/// request-target には制御文字と空白を含めない (RFC 7230 Section 3.1.1)
fn validate_target(target: &str) -> Result<(), Error> {
    if target.is_empty() {
        return Err(Error::request_line("empty request-target"));
    }
    if target.bytes().any(|b| b <= 0x20 || b == 0x7F) {
        return Err(Error::request_line(
            "request-target contains control characters",
        ));
    }
    Ok(())
}
