//! 受信バイト列のカーソル
//!
//! ネットワークから届いたチャンクを追記し、行単位またはバイト数単位で消費する。
//! 消費済みのデータは次の追記時に破棄されるため、1 リクエストの間に
//! バッファが際限なく伸びることはない。

/// 追記専用の受信バッファ
#[derive(Debug, Default)]
pub struct ByteCursor {
    buf: Vec<u8>,
    /// buf 内の未消費データの開始位置
    pos: usize,
    /// pos から LF が存在しないことを確認済みのバイト数
    scanned: usize,
    /// 検出済みの行 (終端を除いた長さ, 終端込みの長さ)
    line: Option<(usize, usize)>,
    consumed: u64,
}

impl ByteCursor {
    /// 空のカーソルを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// データを追記
    ///
    /// 未消費のデータは保持したまま、消費済みの領域だけを破棄する。
    pub fn append(&mut self, data: &[u8]) {
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
        self.buf.extend_from_slice(data);
    }

    /// 未消費のバイト数
    pub fn len(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// 未消費のデータがないか確認
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// これまでに消費したバイト数
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// 未消費のデータを覗く
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    /// 次の行を覗く
    ///
    /// CRLF または LF で終わる行が揃っていれば、終端を除いた内容を返す。
    /// 揃っていなければ `None` を返し、何も消費しない。
    /// 探索済みの位置は記録されるので、追記のたびに先頭から探し直すことはない。
    pub fn peek_line(&mut self) -> Option<&[u8]> {
        if self.line.is_none() {
            let pending = &self.buf[self.pos..];
            match pending[self.scanned..].iter().position(|&b| b == b'\n') {
                Some(offset) => {
                    let lf = self.scanned + offset;
                    let len = if lf > 0 && pending[lf - 1] == b'\r' {
                        lf - 1
                    } else {
                        lf
                    };
                    self.line = Some((len, lf + 1));
                }
                None => {
                    self.scanned = pending.len();
                    return None;
                }
            }
        }
        let (len, _) = self.line?;
        Some(&self.buf[self.pos..self.pos + len])
    }

    /// `peek_line()` で見つけた行を終端ごと消費
    ///
    /// 行が見つかっていない場合は何もせず `false` を返す。
    pub fn consume_line(&mut self) -> bool {
        match self.line {
            Some((_, total)) => {
                self.advance(total);
                true
            }
            None => false,
        }
    }

    /// ちょうど `n` バイトを消費して返す
    ///
    /// `n` バイトに満たない場合は `None` を返し、何も消費しない。
    pub fn take(&mut self, n: usize) -> Option<&[u8]> {
        if self.len() < n {
            return None;
        }
        let start = self.pos;
        self.advance(n);
        Some(&self.buf[start..start + n])
    }

    /// 最大 `max` バイトを消費して返す
    pub fn take_up_to(&mut self, max: usize) -> &[u8] {
        let n = self.len().min(max);
        let start = self.pos;
        self.advance(n);
        &self.buf[start..start + n]
    }

    /// 未消費のデータをすべて取り出す
    ///
    /// パイプライン化された次のリクエストの先頭などを呼び出し側に返すために使う。
    /// 取り出したデータは消費済みバイト数に数えない。
    pub fn take_remaining(&mut self) -> Vec<u8> {
        let mut rest = std::mem::take(&mut self.buf);
        rest.drain(..self.pos);
        self.pos = 0;
        self.scanned = 0;
        self.line = None;
        rest
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
        self.consumed += n as u64;
        self.scanned = self.scanned.saturating_sub(n);
        self.line = None;
    }
}
