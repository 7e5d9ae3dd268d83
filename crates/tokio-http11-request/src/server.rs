//! HTTP サーバー
//!
//! 接続ごとに `RequestReader` を動かし、完了したリクエストをハンドラーに渡す。
//!
//! ## 使い方
//!
//! ```ignore
//! use tokio_http11_request::{Request, Server};
//!
//! async fn handler(request: Request) -> Vec<u8> {
//!     b"HTTP/1.1 204 No Content\r\n\r\n".to_vec()
//! }
//!
//! let server = Server::bind("0.0.0.0:8080").await?;
//! server.serve(handler).await?;
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use http11_request::{ParserOptions, Request};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::TcpListener;

use crate::error::{Error, Result};
use crate::limits::ReadLimits;
use crate::reader::RequestReader;

const BAD_REQUEST: &[u8] =
    b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
const PAYLOAD_TOO_LARGE: &[u8] =
    b"HTTP/1.1 413 Payload Too Large\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
const HEADER_FIELDS_TOO_LARGE: &[u8] =
    b"HTTP/1.1 431 Request Header Fields Too Large\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

/// HTTP リクエストハンドラー
pub trait Handler: Send + Sync + 'static {
    /// リクエストを処理してエンコード済みのレスポンスを返す
    fn handle(&self, request: Request) -> impl Future<Output = Vec<u8>> + Send;
}

/// 関数からハンドラーを作成
impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Vec<u8>> + Send,
{
    fn handle(&self, request: Request) -> impl Future<Output = Vec<u8>> + Send {
        (self)(request)
    }
}

/// HTTP サーバー
pub struct Server {
    listener: TcpListener,
    config: ConnectionConfig,
}

#[derive(Debug, Clone)]
struct ConnectionConfig {
    limits: ReadLimits,
    options: ParserOptions,
    max_requests_per_connection: u32,
    write_buffer_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            limits: ReadLimits::default(),
            options: ParserOptions::default(),
            max_requests_per_connection: 1000,
            write_buffer_size: 65536,
        }
    }
}

impl Server {
    /// 指定アドレスにバインド
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            config: ConnectionConfig::default(),
        })
    }

    /// Keep-Alive タイムアウトを設定
    ///
    /// 読み取りが進まない時間の上限として使う。
    pub fn keep_alive_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.limits.idle_timeout = timeout;
        self
    }

    /// 1 接続あたりの最大リクエスト数を設定
    pub fn max_requests_per_connection(mut self, max: u32) -> Self {
        self.config.max_requests_per_connection = max;
        self
    }

    /// 読み取りバッファサイズを設定
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.limits.read_buffer_size = size;
        self
    }

    /// 書き込みバッファサイズを設定
    pub fn write_buffer_size(mut self, size: usize) -> Self {
        self.config.write_buffer_size = size;
        self
    }

    /// 読み取りの制限を設定
    pub fn limits(mut self, limits: ReadLimits) -> Self {
        self.config.limits = limits;
        self
    }

    /// パーサーのポリシーを設定
    pub fn options(mut self, options: ParserOptions) -> Self {
        self.config.options = options;
        self
    }

    /// ローカルアドレスを取得
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// サーバーを起動
    pub async fn serve<H: Handler>(self, handler: H) -> Result<()> {
        let config = Arc::new(self.config);
        let handler = Arc::new(handler);

        loop {
            let (stream, peer_addr) = self.listener.accept().await?;
            let config = config.clone();
            let handler = handler.clone();

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, &config, handler.as_ref()).await {
                    log::warn!("connection error from {peer_addr}: {e}");
                }
            });
        }
    }

    /// 単一の接続を処理
    pub async fn handle_one<H: Handler>(self, handler: H) -> Result<()> {
        let (stream, _peer_addr) = self.listener.accept().await?;
        handle_connection(stream, &self.config, &handler).await
    }
}

/// 接続を処理
async fn handle_connection<S, H>(stream: S, config: &ConnectionConfig, handler: &H) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    H: Handler,
{
    let (reader, writer) = tokio::io::split(stream);
    let mut reader =
        RequestReader::with_limits(reader, config.limits.clone()).options(config.options);
    let mut writer = BufWriter::with_capacity(config.write_buffer_size, writer);
    let mut request_count = 0u32;

    loop {
        let request = match reader.read_request().await {
            Ok(Some(request)) => request,
            Ok(None) => return Ok(()),
            Err(e) => {
                if let Some(response) = error_response(&e) {
                    log::debug!("rejecting request: {e}");
                    writer.write_all(response).await?;
                    writer.flush().await?;
                }
                return Err(e);
            }
        };
        request_count += 1;

        let should_keep_alive =
            request.is_keep_alive() && request_count < config.max_requests_per_connection;

        let response = handler.handle(request).await;
        writer.write_all(&response).await?;
        writer.flush().await?;

        if !should_keep_alive {
            return Ok(());
        }
    }
}

/// 読み取りエラーに対応する固定レスポンス
///
/// I/O エラー、タイムアウト、接続終了の場合は何も返さずに閉じる。
fn error_response(e: &Error) -> Option<&'static [u8]> {
    match e {
        Error::Parse(_) | Error::Rejected(_) => Some(BAD_REQUEST),
        Error::BodyTooLarge { .. } => Some(PAYLOAD_TOO_LARGE),
        Error::HeadTooLarge { .. } | Error::BufferOverflow { .. } => Some(HEADER_FIELDS_TOO_LARGE),
        Error::Io(_) | Error::Timeout | Error::ConnectionClosed => None,
    }
}
