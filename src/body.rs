//! ボディの取り出し

use crate::chunked::ChunkedDecoder;
use crate::cursor::ByteCursor;
use crate::error::{Error, ErrorKind};
use crate::framing::BodyFraming;
use crate::headers::Headers;
use crate::options::ParserOptions;

/// chunked ボディ内の 1 チャンク
///
/// データ本体は `Body` に連結して保持し、ここではその範囲を記録する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 宣言されたチャンクサイズ
    pub size: u64,
    /// ボディ内での開始位置
    pub offset: usize,
    /// チャンク拡張 (`;` 以降、未解釈)
    pub extensions: String,
}

/// リクエストボディ
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    data: Vec<u8>,
    chunks: Vec<Chunk>,
    trailers: Headers,
}

impl Body {
    /// 空のボディを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// ボディのバイト列
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// ボディのバイト数
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// ボディが空か確認
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// chunked で受信したチャンクの一覧 (終端チャンクは含まない)
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// チャンクのデータを取得
    pub fn chunk_data(&self, chunk: &Chunk) -> &[u8] {
        let start = chunk.offset.min(self.data.len());
        let end = usize::try_from(chunk.size)
            .ok()
            .and_then(|size| start.checked_add(size))
            .map_or(self.data.len(), |end| end.min(self.data.len()));
        &self.data[start..end]
    }

    /// トレーラーヘッダー
    pub fn trailers(&self) -> &Headers {
        &self.trailers
    }

    /// ボディのバイト列を取り出す
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub(crate) fn extend(&mut self, data: &[u8]) {
        self.data.extend_from_slice(data);
    }

    pub(crate) fn begin_chunk(&mut self, size: u64, extensions: String) {
        self.chunks.push(Chunk {
            size,
            offset: self.data.len(),
            extensions,
        });
    }

    pub(crate) fn trailers_mut(&mut self) -> &mut Headers {
        &mut self.trailers
    }
}

impl From<Vec<u8>> for Body {
    fn from(data: Vec<u8>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }
}

/// ボディ読み取りの進捗
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodyProgress {
    /// データ不足
    NeedMore,
    /// ボディ完了
    Complete,
}

#[derive(Debug)]
enum ReaderState {
    Fixed { remaining: u64 },
    Chunked(ChunkedDecoder),
    UntilClose,
    Done,
}

/// フレーミングに従ってカーソルからボディを取り出す
#[derive(Debug)]
pub(crate) struct BodyReader {
    state: ReaderState,
}

impl BodyReader {
    pub fn new(framing: BodyFraming, options: &ParserOptions) -> Self {
        let state = match framing {
            BodyFraming::None | BodyFraming::Fixed(0) => ReaderState::Done,
            BodyFraming::Fixed(len) => ReaderState::Fixed { remaining: len },
            BodyFraming::Chunked => ReaderState::Chunked(ChunkedDecoder::new(options)),
            BodyFraming::UntilClose => ReaderState::UntilClose,
        };
        Self { state }
    }

    /// 取り出せるだけボディを取り出す
    pub fn advance(
        &mut self,
        cursor: &mut ByteCursor,
        body: &mut Body,
    ) -> Result<BodyProgress, Error> {
        match &mut self.state {
            ReaderState::Fixed { remaining } => {
                let data = cursor.take_up_to(clamp(*remaining));
                body.extend(data);
                *remaining -= data.len() as u64;
                if *remaining > 0 {
                    return Ok(BodyProgress::NeedMore);
                }
            }
            ReaderState::Chunked(decoder) => {
                if decoder.advance(cursor, body)? == BodyProgress::NeedMore {
                    return Ok(BodyProgress::NeedMore);
                }
            }
            ReaderState::UntilClose => {
                body.extend(cursor.take_up_to(usize::MAX));
                return Ok(BodyProgress::NeedMore);
            }
            ReaderState::Done => {}
        }
        self.state = ReaderState::Done;
        Ok(BodyProgress::Complete)
    }

    /// 入力の終了を通知
    ///
    /// 接続終了までをボディとする場合はここで完了する。
    /// それ以外でボディが揃っていなければ `IncompleteMessage` になる。
    pub fn finish(&mut self) -> Result<(), Error> {
        match &self.state {
            ReaderState::UntilClose | ReaderState::Done => {
                self.state = ReaderState::Done;
                Ok(())
            }
            ReaderState::Fixed { remaining } => Err(Error::new(
                ErrorKind::IncompleteMessage,
                format!("{remaining} bytes of body missing"),
            )),
            ReaderState::Chunked(_) => Err(Error::new(
                ErrorKind::IncompleteMessage,
                "chunked body ended before the last chunk",
            )),
        }
    }
}

fn clamp(len: u64) -> usize {
    usize::try_from(len).unwrap_or(usize::MAX)
}
