//! tokio_http11_request - Tokio integration for http11_request
//!
//! tokio の `AsyncRead` から受信したバイト列を `RequestAssembler` に渡し、
//! 完了したリクエストを取り出す。
//!
//! ## 特徴
//!
//! - **http11_request ベース**: Sans I/O パーサーをベースにした設計
//! - **非同期 I/O**: tokio による完全非同期対応
//! - **制限**: バッファ、ヘッダー、ボディのサイズとアイドルタイムアウト
//! - **Keep-Alive**: パイプライン化されたリクエストの引き継ぎ
//!
//! ## リクエストの読み取り
//!
//! ```ignore
//! use tokio_http11_request::{ReadLimits, RequestReader};
//!
//! let mut reader = RequestReader::with_limits(stream, ReadLimits::default());
//! while let Some(request) = reader.read_request().await? {
//!     // ...
//! }
//! ```
//!
//! ## サーバー
//!
//! ```ignore
//! use tokio_http11_request::{Request, Server};
//!
//! async fn handler(request: Request) -> Vec<u8> {
//!     b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n".to_vec()
//! }
//!
//! let server = Server::bind("0.0.0.0:8080").await?;
//! server.serve(handler).await?;
//! ```

pub mod error;
mod limits;
pub mod reader;
pub mod server;

pub use error::{Error, Result};
pub use limits::ReadLimits;
pub use reader::RequestReader;
pub use server::{Handler, Server};

// http11_request の型を re-export
pub use http11_request::{ParserOptions, Request};
