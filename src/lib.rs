//! # http11_request
//!
//! インクリメンタルな HTTP/1.x リクエストパーサー (Sans I/O)
//!
//! ## 特徴
//!
//! - **Sans I/O**: I/O を完全に分離した設計
//! - **インクリメンタル**: 任意の位置で分割されたデータを順番に受け取れる
//! - **ヘッダー完了通知**: ボディ受信前にヘッダーを検査できる
//!
//! ## 使い方
//!
//! ```rust
//! use http11_request::{ParseState, RequestAssembler};
//!
//! let mut assembler = RequestAssembler::new();
//!
//! // 受信したデータを順番に渡す
//! assert!(assembler.append_data(b"POST /upload HTTP/1.1\r\nContent-Le"));
//! assert!(assembler.append_data(b"ngth: 5\r\n\r\n"));
//!
//! // ボディ受信前にヘッダーを検査できる
//! assert!(assembler.header_complete());
//! assert_eq!(assembler.headers().get("content-length"), Some("5"));
//! assert_eq!(assembler.state(), ParseState::AwaitingBody);
//!
//! assert!(assembler.append_data(b"hello"));
//! assert!(assembler.is_complete());
//!
//! let request = assembler.into_request().unwrap();
//! assert_eq!(request.body.as_bytes(), b"hello");
//! ```
//!
//! ### リクエストの作成
//!
//! ```rust
//! use http11_request::Request;
//!
//! let request = Request::new("POST", "/submit")
//!     .header("Host", "example.com")
//!     .body(b"data".to_vec());
//! let bytes = request.encode();
//! assert!(bytes.ends_with(b"Content-Length: 4\r\n\r\ndata"));
//! ```

mod assembler;
mod body;
mod chunked;
mod cursor;
mod encoder;
mod error;
mod framing;
mod headers;
mod options;
mod request;
mod request_line;

pub use assembler::{HeaderCompleteFlag, ParseState, Progress, RequestAssembler};
pub use body::{Body, Chunk};
pub use cursor::ByteCursor;
pub use encoder::{encode_chunk, encode_chunks, encode_request, encode_request_headers};
pub use error::{Error, ErrorKind};
pub use framing::BodyFraming;
pub use headers::Headers;
pub use options::ParserOptions;
pub use request::Request;
pub use request_line::{RequestLine, TargetForm, Version};
