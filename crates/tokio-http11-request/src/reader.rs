//! 非同期ストリームからのリクエスト読み取り
//!
//! ## 使い方
//!
//! ```ignore
//! use tokio_http11_request::RequestReader;
//!
//! let mut reader = RequestReader::new(stream);
//! while let Some(request) = reader.read_request().await? {
//!     println!("{} {}", request.method, request.target);
//! }
//! ```

use http11_request::{BodyFraming, ParseState, ParserOptions, Request, RequestAssembler};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Error, Result};
use crate::limits::ReadLimits;

/// `AsyncRead` からリクエストを 1 つずつ読み取る
///
/// パイプライン化されたリクエストは次の `read_request()` に引き継ぐ。
#[derive(Debug)]
pub struct RequestReader<R> {
    reader: R,
    limits: ReadLimits,
    options: ParserOptions,
    buf: Vec<u8>,
    residue: Vec<u8>,
    eof: bool,
}

impl<R: AsyncRead + Unpin> RequestReader<R> {
    /// デフォルトの制限で作成
    pub fn new(reader: R) -> Self {
        Self::with_limits(reader, ReadLimits::default())
    }

    /// 制限を指定して作成
    pub fn with_limits(reader: R, limits: ReadLimits) -> Self {
        let buf = vec![0u8; limits.read_buffer_size.max(1)];
        Self {
            reader,
            limits,
            options: ParserOptions::default(),
            buf,
            residue: Vec::new(),
            eof: false,
        }
    }

    /// パーサーのポリシーを指定
    pub fn options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// 制限を取得
    pub fn limits(&self) -> &ReadLimits {
        &self.limits
    }

    /// 次のリクエストの先頭として保持しているバイト数
    pub fn pending_len(&self) -> usize {
        self.residue.len()
    }

    /// 内部のリーダーを取得
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// 内部のリーダーを取り出す
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// リクエストを 1 つ読み取る
    ///
    /// リクエストの間で接続が閉じられた場合は `Ok(None)` を返す。
    pub async fn read_request(&mut self) -> Result<Option<Request>> {
        self.read_request_with(|_| Ok(())).await
    }

    /// ヘッダー完了時に検査しながらリクエストを 1 つ読み取る
    ///
    /// `inspect` はヘッダーのパースが完了した時点で 1 度だけ呼ばれる。
    /// `Err` を返すとボディを読まずに `Error::Rejected` で終了する。
    pub async fn read_request_with<F>(&mut self, mut inspect: F) -> Result<Option<Request>>
    where
        F: FnMut(&RequestAssembler) -> std::result::Result<(), String>,
    {
        let mut assembler = RequestAssembler::with_options(self.options);
        let mut inspected = false;

        let residue = std::mem::take(&mut self.residue);
        if !residue.is_empty() {
            self.feed(&mut assembler, &residue, &mut inspected, &mut inspect)?;
        }

        while !assembler.is_complete() {
            if self.eof {
                self.finish(&mut assembler)?;
                if assembler.state() == ParseState::AwaitingRequestLine {
                    return Ok(None);
                }
                break;
            }

            let read = tokio::time::timeout(self.limits.idle_timeout, self.reader.read(&mut self.buf));
            let n = read.await??;
            if n == 0 {
                self.eof = true;
                continue;
            }

            self.feed(&mut assembler, &self.buf[..n], &mut inspected, &mut inspect)?;
        }

        self.residue = assembler.take_remaining();
        let request = assembler.into_request()?;
        log::debug!(
            "request read: {} {} ({} body bytes)",
            request.method,
            request.target,
            request.body.len()
        );
        Ok(Some(request))
    }

    fn feed<F>(
        &self,
        assembler: &mut RequestAssembler,
        data: &[u8],
        inspected: &mut bool,
        inspect: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&RequestAssembler) -> std::result::Result<(), String>,
    {
        let consumed_before = assembler.consumed();
        let completed_before = assembler.header_complete();
        assembler.try_append(data)?;

        if !assembler.header_complete() {
            let size = assembler.buffered_len();
            return self.check_head(assembler.consumed() + size as u64, size);
        }

        // ヘッダーブロックが今回の入力で完了した場合も制限を適用する
        if !completed_before {
            let head = assembler.head_len().unwrap_or(assembler.consumed());
            let pending = head.saturating_sub(consumed_before);
            self.check_head(head, usize::try_from(pending).unwrap_or(usize::MAX))?;
        }

        let declared = match assembler.framing() {
            Some(BodyFraming::Fixed(len)) => len,
            _ => assembler.body().len() as u64,
        };
        if declared > self.limits.max_body_size as u64 {
            return Err(Error::BodyTooLarge {
                size: declared,
                limit: self.limits.max_body_size,
            });
        }

        if !assembler.is_complete() && assembler.buffered_len() > self.limits.max_buffer_size {
            return Err(Error::BufferOverflow {
                size: assembler.buffered_len(),
                limit: self.limits.max_buffer_size,
            });
        }

        if !*inspected {
            *inspected = true;
            inspect(assembler).map_err(Error::Rejected)?;
        }
        Ok(())
    }

    /// ヘッダーブロックのサイズと、未消費のまま保持していたバイト数を検査する
    fn check_head(&self, head: u64, buffered: usize) -> Result<()> {
        if buffered > self.limits.max_buffer_size {
            return Err(Error::BufferOverflow {
                size: buffered,
                limit: self.limits.max_buffer_size,
            });
        }
        if head > self.limits.max_head_size as u64 {
            return Err(Error::HeadTooLarge {
                size: head,
                limit: self.limits.max_head_size,
            });
        }
        Ok(())
    }

    /// 入力の終了をアセンブラーに伝える
    fn finish(&self, assembler: &mut RequestAssembler) -> Result<()> {
        match assembler.state() {
            ParseState::AwaitingRequestLine if assembler.buffered_len() == 0 => Ok(()),
            ParseState::AwaitingRequestLine | ParseState::AwaitingHeaders => {
                Err(Error::ConnectionClosed)
            }
            _ => {
                assembler.try_end_of_input()?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http11_request::{ErrorKind, Version};
    use tokio::io::AsyncWriteExt;

    use super::*;

    #[tokio::test]
    async fn reads_single_request() {
        let input: &[u8] = b"POST /upload HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\n\r\nhello";
        let mut reader = RequestReader::new(input);
        let request = reader.read_request().await.unwrap().unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.target, "/upload");
        assert_eq!(request.version, Version::Http11);
        assert_eq!(request.body.as_bytes(), b"hello");
        assert!(reader.read_request().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reads_pipelined_requests() {
        let input: &[u8] = b"GET /1 HTTP/1.1\r\n\r\nGET /2 HTTP/1.1\r\n\r\n\r\n";
        let limits = ReadLimits {
            read_buffer_size: 7,
            ..ReadLimits::default()
        };
        let mut reader = RequestReader::with_limits(input, limits);
        let first = reader.read_request().await.unwrap().unwrap();
        assert_eq!(first.target, "/1");
        let second = reader.read_request().await.unwrap().unwrap();
        assert_eq!(second.target, "/2");
        assert!(reader.read_request().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn until_close_body_ends_with_stream() {
        let input: &[u8] = b"POST / HTTP/1.1\r\nTransfer-Encoding: gzip\r\n\r\nraw bytes";
        let mut reader = RequestReader::new(input);
        let request = reader.read_request().await.unwrap().unwrap();
        assert_eq!(request.body.as_bytes(), b"raw bytes");
    }

    #[tokio::test]
    async fn close_in_head_is_error() {
        let input: &[u8] = b"GET / HTTP/1.1\r\nHost: x\r\n";
        let mut reader = RequestReader::new(input);
        assert!(matches!(
            reader.read_request().await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn close_in_body_is_incomplete() {
        let input: &[u8] = b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc";
        let mut reader = RequestReader::new(input);
        match reader.read_request().await {
            Err(Error::Parse(e)) => assert_eq!(e.kind(), ErrorKind::IncompleteMessage),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn parse_error_is_reported() {
        let input: &[u8] = b"GET  /x HTTP/1.1\r\n\r\n";
        let mut reader = RequestReader::new(input);
        match reader.read_request().await {
            Err(Error::Parse(e)) => assert_eq!(e.kind(), ErrorKind::MalformedRequestLine),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn head_too_large() {
        let mut input = b"GET / HTTP/1.1\r\nX-Long: ".to_vec();
        input.extend(std::iter::repeat_n(b'a', 200));
        input.extend_from_slice(b"\r\n\r\n");
        let limits = ReadLimits {
            max_head_size: 100,
            read_buffer_size: 16,
            ..ReadLimits::default()
        };
        let mut reader = RequestReader::with_limits(&input[..], limits);
        assert!(matches!(
            reader.read_request().await,
            Err(Error::HeadTooLarge { limit: 100, .. })
        ));
    }

    #[tokio::test]
    async fn head_too_large_in_single_read() {
        let mut input = b"GET / HTTP/1.1\r\nX-Long: ".to_vec();
        input.extend(std::iter::repeat_n(b'a', 200));
        input.extend_from_slice(b"\r\n\r\n");
        let limits = ReadLimits {
            max_head_size: 100,
            ..ReadLimits::default()
        };
        let mut reader = RequestReader::with_limits(&input[..], limits);
        assert!(matches!(
            reader.read_request().await,
            Err(Error::HeadTooLarge {
                size: 228,
                limit: 100
            })
        ));
    }

    #[tokio::test]
    async fn head_buffer_overflow_in_single_read() {
        let mut input = b"GET / HTTP/1.1\r\nX-A: ".to_vec();
        input.extend(std::iter::repeat_n(b'a', 60));
        input.extend_from_slice(b"\r\n\r\n");
        let limits = ReadLimits {
            max_buffer_size: 50,
            ..ReadLimits::default()
        };
        let mut reader = RequestReader::with_limits(&input[..], limits);
        assert!(matches!(
            reader.read_request().await,
            Err(Error::BufferOverflow {
                size: 85,
                limit: 50
            })
        ));
    }

    #[tokio::test]
    async fn head_within_limit_with_body_in_same_read() {
        // ヘッダーブロックは 40 バイト、ボディを含めると 140 バイト
        let mut input = b"POST / HTTP/1.1\r\nContent-Length: 100\r\n\r\n".to_vec();
        input.extend(std::iter::repeat_n(b'b', 100));
        let limits = ReadLimits {
            max_head_size: 40,
            max_buffer_size: 40,
            ..ReadLimits::default()
        };
        let mut reader = RequestReader::with_limits(&input[..], limits);
        let request = reader.read_request().await.unwrap().unwrap();
        assert_eq!(request.body.len(), 100);
    }

    #[tokio::test]
    async fn declared_body_too_large() {
        let input: &[u8] = b"POST / HTTP/1.1\r\nContent-Length: 1000\r\n\r\n";
        let limits = ReadLimits {
            max_body_size: 10,
            ..ReadLimits::default()
        };
        let mut reader = RequestReader::with_limits(input, limits);
        assert!(matches!(
            reader.read_request().await,
            Err(Error::BodyTooLarge { size: 1000, .. })
        ));
    }

    #[tokio::test]
    async fn chunked_body_too_large() {
        let input: &[u8] =
            b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n8\r\n12345678\r\n8\r\n12345678\r\n0\r\n\r\n";
        let limits = ReadLimits {
            max_body_size: 10,
            ..ReadLimits::default()
        };
        let mut reader = RequestReader::with_limits(input, limits);
        assert!(matches!(
            reader.read_request().await,
            Err(Error::BodyTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn rejected_at_header_complete() {
        let input: &[u8] = b"PUT /big HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc";
        let mut reader = RequestReader::new(input);
        let mut calls = 0;
        let result = reader
            .read_request_with(|assembler| {
                calls += 1;
                if assembler.method() == Some("PUT") {
                    Err("PUT not allowed".to_string())
                } else {
                    Ok(())
                }
            })
            .await;
        assert_eq!(calls, 1);
        match result {
            Err(Error::Rejected(reason)) => assert_eq!(reason, "PUT not allowed"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn idle_timeout() {
        let (client, server) = tokio::io::duplex(64);
        let limits = ReadLimits {
            idle_timeout: Duration::from_millis(20),
            ..ReadLimits::default()
        };
        let mut reader = RequestReader::with_limits(server, limits);
        let mut client = client;
        client.write_all(b"GET / HTTP/1.1\r\n").await.unwrap();
        assert!(matches!(reader.read_request().await, Err(Error::Timeout)));
    }
}
