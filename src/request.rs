use crate::body::Body;
use crate::framing::BodyFraming;
use crate::headers::Headers;
use crate::request_line::{TargetForm, Version, target_path, target_query};

/// HTTP リクエスト
///
/// `RequestAssembler::into_request()` で取り出した完了済みのリクエスト、
/// またはビルダーで組み立てたリクエスト。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP メソッド (GET, POST, etc.)
    pub method: String,
    /// request-target
    pub target: String,
    /// HTTP バージョン
    pub version: Version,
    /// ヘッダー
    pub headers: Headers,
    /// ボディ
    pub body: Body,
    /// ボディのフレーミング
    pub framing: BodyFraming,
}

impl Request {
    /// 新しいリクエストを作成 (HTTP/1.1)
    pub fn new(method: &str, target: &str) -> Self {
        Self::with_version(method, target, Version::Http11)
    }

    /// バージョンを指定してリクエストを作成
    pub fn with_version(method: &str, target: &str, version: Version) -> Self {
        Self {
            method: method.to_string(),
            target: target.to_string(),
            version,
            headers: Headers::new(),
            body: Body::new(),
            framing: BodyFraming::None,
        }
    }

    /// ヘッダーを追加 (ビルダーパターン)
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.append(name, value);
        self
    }

    /// ボディを設定 (ビルダーパターン)
    ///
    /// フレーミングは固定長になる。
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.framing = BodyFraming::Fixed(body.len() as u64);
        self.body = Body::from(body);
        self
    }

    /// ヘッダーを追加
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.append(name, value);
    }

    /// ヘッダーを取得 (大文字小文字を区別しない)
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// 指定した名前のヘッダーをすべて取得
    pub fn get_headers(&self, name: &str) -> Vec<&str> {
        self.headers.get_all(name)
    }

    /// ヘッダーが存在するか確認
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains(name)
    }

    /// request-target の形式を取得
    pub fn target_form(&self) -> TargetForm {
        TargetForm::of(&self.target)
    }

    /// パス部分を取得
    pub fn path(&self) -> &str {
        target_path(&self.target)
    }

    /// クエリ部分を取得
    pub fn query(&self) -> Option<&str> {
        target_query(&self.target)
    }

    /// キープアライブ接続かどうかを判定
    ///
    /// HTTP/1.1 ではデフォルトでキープアライブ
    /// HTTP/1.0 では Connection: keep-alive が必要
    /// Connection ヘッダーはカンマ区切りのトークンリストとして扱い、close を優先する
    pub fn is_keep_alive(&self) -> bool {
        let mut has_keep_alive = false;
        for token in self.headers.tokens("Connection") {
            if token.eq_ignore_ascii_case("close") {
                return false;
            }
            if token.eq_ignore_ascii_case("keep-alive") {
                has_keep_alive = true;
            }
        }
        has_keep_alive || self.version == Version::Http11
    }

    /// 固定長ボディの長さを取得
    pub fn content_length(&self) -> Option<u64> {
        match self.framing {
            BodyFraming::Fixed(len) => Some(len),
            _ => None,
        }
    }

    /// ボディが chunked で送られたか確認
    pub fn is_chunked(&self) -> bool {
        self.framing == BodyFraming::Chunked
    }

    /// Expect: 100-continue が指定されているか確認
    pub fn expects_continue(&self) -> bool {
        self.version == Version::Http11
            && self
                .headers
                .tokens("Expect")
                .any(|t| t.eq_ignore_ascii_case("100-continue"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let request = Request::new("POST", "/submit?x=1")
            .header("Host", "example.com")
            .body(b"data".to_vec());
        assert_eq!(request.get_header("host"), Some("example.com"));
        assert_eq!(request.content_length(), Some(4));
        assert_eq!(request.path(), "/submit");
        assert_eq!(request.query(), Some("x=1"));
        assert_eq!(request.target_form(), TargetForm::Origin);
    }

    #[test]
    fn keep_alive() {
        assert!(Request::new("GET", "/").is_keep_alive());
        assert!(!Request::new("GET", "/").header("Connection", "close").is_keep_alive());
        assert!(
            !Request::new("GET", "/")
                .header("Connection", "keep-alive, Close")
                .is_keep_alive()
        );
        assert!(!Request::with_version("GET", "/", Version::Http10).is_keep_alive());
        assert!(
            Request::with_version("GET", "/", Version::Http10)
                .header("Connection", "Keep-Alive")
                .is_keep_alive()
        );
    }

    #[test]
    fn expects_continue() {
        let request = Request::new("PUT", "/f").header("Expect", "100-Continue");
        assert!(request.expects_continue());
        let request = Request::with_version("PUT", "/f", Version::Http10)
            .header("Expect", "100-continue");
        assert!(!request.expects_continue());
    }
}
