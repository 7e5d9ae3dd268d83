//! tokio_http11_request エラー型

/// tokio_http11_request エラー
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O エラー
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// HTTP パースエラー
    #[error("HTTP parse error: {0}")]
    Parse(#[from] http11_request::Error),
    /// 読み取りタイムアウト
    #[error("read timeout")]
    Timeout,
    /// 未消費のまま溜まっているデータが上限を超えた
    #[error("buffer overflow: {size} bytes buffered (limit {limit})")]
    BufferOverflow { size: usize, limit: usize },
    /// リクエストラインとヘッダーが上限を超えた
    #[error("request head too large: {size} bytes (limit {limit})")]
    HeadTooLarge { size: u64, limit: usize },
    /// ボディが上限を超えた
    #[error("request body too large: {size} bytes (limit {limit})")]
    BodyTooLarge { size: u64, limit: usize },
    /// ヘッダー検査でリクエストが拒否された
    #[error("request rejected: {0}")]
    Rejected(String),
    /// リクエストの途中で接続が閉じられた
    #[error("connection closed")]
    ConnectionClosed,
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::Timeout
    }
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
