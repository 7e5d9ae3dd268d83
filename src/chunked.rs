//! chunked 転送コーディングのデコード (RFC 7230 Section 4.1)
//!
//! ```text
//! chunked-body = *chunk last-chunk trailer-part CRLF
//! chunk        = chunk-size [ chunk-ext ] CRLF chunk-data CRLF
//! last-chunk   = 1*("0") [ chunk-ext ] CRLF
//! ```

use crate::body::{Body, BodyProgress};
use crate::cursor::ByteCursor;
use crate::error::{Error, ErrorKind};
use crate::headers::{apply_field_line, trim_ows};
use crate::options::ParserOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkPhase {
    /// チャンクサイズ行待ち
    Size,
    /// チャンクデータ待ち
    Data { remaining: u64 },
    /// チャンクデータ後の行終端待ち
    DataEnd,
    /// トレーラーヘッダー待ち
    Trailers,
    /// 完了
    Done,
}

#[derive(Debug)]
pub(crate) struct ChunkedDecoder {
    phase: ChunkPhase,
    allow_obs_fold: bool,
}

impl ChunkedDecoder {
    pub fn new(options: &ParserOptions) -> Self {
        Self {
            phase: ChunkPhase::Size,
            allow_obs_fold: options.allow_obs_fold,
        }
    }

    pub fn advance(
        &mut self,
        cursor: &mut ByteCursor,
        body: &mut Body,
    ) -> Result<BodyProgress, Error> {
        loop {
            match self.phase {
                ChunkPhase::Size => {
                    let Some(line) = cursor.peek_line() else {
                        return Ok(BodyProgress::NeedMore);
                    };
                    let (size, extensions) = parse_chunk_size_line(line)?;
                    cursor.consume_line();
                    log::trace!("chunk size {size}");
                    if size == 0 {
                        self.phase = ChunkPhase::Trailers;
                    } else {
                        body.begin_chunk(size, extensions);
                        self.phase = ChunkPhase::Data { remaining: size };
                    }
                }
                ChunkPhase::Data { remaining } => {
                    let data = cursor.take_up_to(usize::try_from(remaining).unwrap_or(usize::MAX));
                    if data.is_empty() {
                        return Ok(BodyProgress::NeedMore);
                    }
                    body.extend(data);
                    let remaining = remaining - data.len() as u64;
                    self.phase = if remaining == 0 {
                        ChunkPhase::DataEnd
                    } else {
                        ChunkPhase::Data { remaining }
                    };
                }
                ChunkPhase::DataEnd => {
                    let terminator = match cursor.as_slice() {
                        [b'\r', b'\n', ..] => 2,
                        [b'\n', ..] => 1,
                        [] | [b'\r'] => return Ok(BodyProgress::NeedMore),
                        _ => {
                            return Err(Error::new(
                                ErrorKind::MalformedChunkedBody,
                                "expected CRLF after chunk data",
                            ));
                        }
                    };
                    cursor.take(terminator);
                    self.phase = ChunkPhase::Size;
                }
                ChunkPhase::Trailers => {
                    let Some(line) = cursor.peek_line() else {
                        return Ok(BodyProgress::NeedMore);
                    };
                    if line.is_empty() {
                        cursor.consume_line();
                        self.phase = ChunkPhase::Done;
                    } else {
                        apply_field_line(body.trailers_mut(), line, self.allow_obs_fold)?;
                        cursor.consume_line();
                    }
                }
                ChunkPhase::Done => return Ok(BodyProgress::Complete),
            }
        }
    }
}

/// チャンクサイズ行をパース
///
/// chunk-size は 16 進数。`;` 以降のチャンク拡張は解釈せずに返す。
fn parse_chunk_size_line(line: &[u8]) -> Result<(u64, String), Error> {
    let line = std::str::from_utf8(line)
        .map_err(|e| Error::chunk_size(format!("invalid UTF-8: {e}")))?;
    let (size, extensions) = line.split_once(';').unwrap_or((line, ""));
    let size = trim_ows(size);
    if size.is_empty() || !size.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::chunk_size(format!("invalid chunk size: {size:?}")));
    }
    let size = u64::from_str_radix(size, 16)
        .map_err(|_| Error::chunk_size(format!("chunk size overflow: {size}")))?;
    Ok((size, trim_ows(extensions).to_string()))
}
