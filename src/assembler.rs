//! リクエストアセンブラー
//!
//! 受信したバイト列を少しずつ受け取り、リクエストライン、ヘッダー、ボディの順に
//! パースを進める状態機械。I/O は一切行わない。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::body::{Body, BodyProgress, BodyReader};
use crate::cursor::ByteCursor;
use crate::error::{Error, ErrorKind};
use crate::framing::{self, BodyFraming};
use crate::headers::{Headers, apply_field_line};
use crate::options::ParserOptions;
use crate::request::Request;
use crate::request_line::{RequestLine, Version};

/// パース状態
///
/// 前にしか進まない。`Failed` になった後は何も受け付けない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// リクエストライン待ち
    AwaitingRequestLine,
    /// ヘッダー待ち
    AwaitingHeaders,
    /// ボディ待ち
    AwaitingBody,
    /// 完了
    Complete,
    /// 失敗
    Failed(ErrorKind),
}

/// `try_append()` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// データ不足
    Incomplete,
    /// リクエスト完了
    Complete,
}

/// ヘッダー完了フラグ
///
/// 別スレッドからポーリングするためのハンドル。
/// 一度 true になったら false には戻らない。
#[derive(Debug, Clone, Default)]
pub struct HeaderCompleteFlag(Arc<AtomicBool>);

impl HeaderCompleteFlag {
    /// ヘッダーのパースが完了しているか確認
    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// HTTP リクエストアセンブラー (Sans I/O)
///
/// 接続ごとに 1 つ作成し、受信したデータを順番に `append_data()` に渡す。
///
/// ```rust
/// use http11_request::{BodyFraming, RequestAssembler, Version};
///
/// let mut assembler = RequestAssembler::new();
/// assert!(assembler.append_data(b"GET /hello HTTP/1.1\r\nHo"));
/// assert!(!assembler.header_complete());
/// assert!(assembler.append_data(b"st: x\r\n\r\n"));
/// assert!(assembler.header_complete());
/// assert!(assembler.is_complete());
///
/// let request = assembler.into_request().unwrap();
/// assert_eq!(request.method, "GET");
/// assert_eq!(request.target, "/hello");
/// assert_eq!(request.version, Version::Http11);
/// assert_eq!(request.framing, BodyFraming::None);
/// ```
#[derive(Debug)]
pub struct RequestAssembler {
    options: ParserOptions,
    cursor: ByteCursor,
    state: ParseState,
    request_line: Option<RequestLine>,
    headers: Headers,
    framing: Option<BodyFraming>,
    body_reader: Option<BodyReader>,
    body: Body,
    header_complete: HeaderCompleteFlag,
    head_len: Option<u64>,
    error: Option<Error>,
}

impl Default for RequestAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestAssembler {
    /// 新しいアセンブラーを作成
    pub fn new() -> Self {
        Self::with_options(ParserOptions::default())
    }

    /// ポリシーを指定してアセンブラーを作成
    pub fn with_options(options: ParserOptions) -> Self {
        Self {
            options,
            cursor: ByteCursor::new(),
            state: ParseState::AwaitingRequestLine,
            request_line: None,
            headers: Headers::new(),
            framing: None,
            body_reader: None,
            body: Body::new(),
            header_complete: HeaderCompleteFlag::default(),
            head_len: None,
            error: None,
        }
    }

    /// メソッド、ターゲット、バージョンから完了済みのリクエストを作成
    ///
    /// 内部リダイレクトやテスト用。ヘッダーとボディは空。
    pub fn synthetic(method: &str, target: &str, version: Version) -> Result<Self, Error> {
        let mut assembler = Self::new();
        assembler.request_line = Some(RequestLine::new(method, target, version)?);
        assembler.framing = Some(BodyFraming::None);
        assembler.state = ParseState::Complete;
        assembler.header_complete.set();
        assembler.head_len = Some(0);
        Ok(assembler)
    }

    /// ポリシーを取得
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// データを追加してパースを進める
    ///
    /// パースが失敗していなければ `true` を返す (データ不足、完了を含む)。
    /// 一度 `false` を返した後は、以降のデータをすべて拒否する。
    pub fn append_data(&mut self, data: &[u8]) -> bool {
        self.try_append(data).is_ok()
    }

    /// データを追加してパースを進める
    ///
    /// 完了後に渡されたデータは、次のリクエストの先頭として保持する。
    pub fn try_append(&mut self, data: &[u8]) -> Result<Progress, Error> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        self.cursor.append(data);
        self.drive().map_err(|e| self.fail(e))
    }

    /// 入力の終了 (接続のクローズ) を通知
    ///
    /// 接続終了までをボディとするリクエストはここで完了する。
    pub fn end_of_input(&mut self) -> bool {
        self.try_end_of_input().is_ok()
    }

    /// 入力の終了 (接続のクローズ) を通知
    ///
    /// メッセージが揃っていない場合は `IncompleteMessage` で失敗する。
    pub fn try_end_of_input(&mut self) -> Result<Progress, Error> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        let result = match self.state {
            ParseState::Complete => return Ok(Progress::Complete),
            ParseState::AwaitingBody => match &mut self.body_reader {
                Some(reader) => reader.finish(),
                None => Err(Error::new(ErrorKind::IncompleteMessage, "missing body reader")),
            },
            ParseState::AwaitingRequestLine | ParseState::AwaitingHeaders => Err(Error::new(
                ErrorKind::IncompleteMessage,
                "input ended before the end of the header block",
            )),
            ParseState::Failed(kind) => Err(Error::new(kind, "parse already failed")),
        };
        result
            .and_then(|()| self.drive())
            .map_err(|e| self.fail(e))
    }

    fn fail(&mut self, e: Error) -> Error {
        log::debug!("request parse failed: {e}");
        self.state = ParseState::Failed(e.kind());
        self.error = Some(e.clone());
        e
    }

    /// 溜まっているデータで進められるところまで状態機械を進める
    fn drive(&mut self) -> Result<Progress, Error> {
        loop {
            match self.state {
                ParseState::AwaitingRequestLine => {
                    let Some(line) = self.cursor.peek_line() else {
                        return Ok(Progress::Incomplete);
                    };
                    // リクエストライン前の空行は読み飛ばす (RFC 7230 Section 3.5)
                    if !line.is_empty() {
                        let request_line = RequestLine::parse(line)?;
                        log::trace!("request line: {request_line}");
                        self.request_line = Some(request_line);
                        self.state = ParseState::AwaitingHeaders;
                    }
                    self.cursor.consume_line();
                }
                ParseState::AwaitingHeaders => {
                    let Some(line) = self.cursor.peek_line() else {
                        return Ok(Progress::Incomplete);
                    };
                    if line.is_empty() {
                        self.cursor.consume_line();
                        self.complete_headers()?;
                    } else {
                        apply_field_line(&mut self.headers, line, self.options.allow_obs_fold)?;
                        self.cursor.consume_line();
                    }
                }
                ParseState::AwaitingBody => {
                    let Some(reader) = self.body_reader.as_mut() else {
                        return Err(Error::new(ErrorKind::IncompleteMessage, "missing body reader"));
                    };
                    match reader.advance(&mut self.cursor, &mut self.body)? {
                        BodyProgress::NeedMore => return Ok(Progress::Incomplete),
                        BodyProgress::Complete => {
                            log::debug!("request complete: {} body bytes", self.body.len());
                            self.body_reader = None;
                            self.state = ParseState::Complete;
                        }
                    }
                }
                ParseState::Complete => return Ok(Progress::Complete),
                ParseState::Failed(kind) => {
                    return Err(Error::new(kind, "parse already failed"));
                }
            }
        }
    }

    /// ヘッダーブロック終了時の処理
    ///
    /// ヘッダー完了フラグを立ててからフレーミングを決定する。
    fn complete_headers(&mut self) -> Result<(), Error> {
        self.head_len = Some(self.cursor.consumed());
        self.header_complete.set();
        let method = self
            .request_line
            .as_ref()
            .map_or("", |line| line.method.as_str());
        let framing = framing::determine(method, &self.headers, &self.options)?;
        log::debug!(
            "header complete: {} headers, framing {framing:?}",
            self.headers.len()
        );
        self.framing = Some(framing);
        self.body_reader = Some(BodyReader::new(framing, &self.options));
        self.state = ParseState::AwaitingBody;
        Ok(())
    }

    /// ヘッダーのパースが完了しているか確認
    pub fn header_complete(&self) -> bool {
        self.header_complete.get()
    }

    /// 別スレッドから参照するためのヘッダー完了フラグを取得
    pub fn header_complete_flag(&self) -> HeaderCompleteFlag {
        self.header_complete.clone()
    }

    /// パース状態を取得
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// リクエストが完了しているか確認
    pub fn is_complete(&self) -> bool {
        self.state == ParseState::Complete
    }

    /// パースが失敗しているか確認
    pub fn is_failed(&self) -> bool {
        matches!(self.state, ParseState::Failed(_))
    }

    /// 失敗の原因を取得
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// リクエストラインを取得
    pub fn request_line(&self) -> Option<&RequestLine> {
        self.request_line.as_ref()
    }

    /// HTTP メソッドを取得
    pub fn method(&self) -> Option<&str> {
        self.request_line.as_ref().map(|l| l.method.as_str())
    }

    /// request-target を取得
    pub fn target(&self) -> Option<&str> {
        self.request_line.as_ref().map(|l| l.target.as_str())
    }

    /// HTTP バージョンを取得
    pub fn version(&self) -> Option<Version> {
        self.request_line.as_ref().map(|l| l.version)
    }

    /// これまでにパースしたヘッダー
    ///
    /// ヘッダー完了前は途中までの内容を返す。
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// フレーミングを取得 (ヘッダー完了後のみ)
    pub fn framing(&self) -> Option<BodyFraming> {
        self.framing
    }

    /// これまでに受信したボディ
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// 未消費のまま保持しているバイト数
    pub fn buffered_len(&self) -> usize {
        self.cursor.len()
    }

    /// これまでに消費したバイト数
    pub fn consumed(&self) -> u64 {
        self.cursor.consumed()
    }

    /// ヘッダーブロックのバイト数
    ///
    /// 先頭の空行、リクエストライン、ヘッダー、終端の空行を含む。
    /// ヘッダー完了前は `None`。
    pub fn head_len(&self) -> Option<u64> {
        self.head_len
    }

    /// 完了後に残っているデータを取り出す
    ///
    /// パイプライン化された次のリクエストの先頭が入っている。
    /// 完了前に呼ぶと空を返す。
    pub fn take_remaining(&mut self) -> Vec<u8> {
        if self.state != ParseState::Complete {
            return Vec::new();
        }
        self.cursor.take_remaining()
    }

    /// 完了したリクエストを取り出す
    pub fn into_request(self) -> Result<Request, Error> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let (Some(line), Some(framing), ParseState::Complete) =
            (self.request_line, self.framing, self.state)
        else {
            return Err(Error::new(
                ErrorKind::IncompleteMessage,
                "request is not complete",
            ));
        };
        Ok(Request {
            method: line.method,
            target: line.target,
            version: line.version,
            headers: self.headers,
            body: self.body,
            framing,
        })
    }
}
