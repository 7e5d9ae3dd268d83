/// パーサーの動作ポリシー
///
/// サイズや時間の制限はここには含めない。それらは接続を管理する呼び出し側で適用する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// 空白で始まる継続行 (obs-fold) を直前のヘッダー値に連結する (デフォルト: true)
    ///
    /// false の場合、継続行は `MalformedHeaderField` になる。
    pub allow_obs_fold: bool,
    /// Transfer-Encoding: chunked と Content-Length の同時指定を拒否する (デフォルト: false)
    ///
    /// false の場合は chunked を優先し、Content-Length を無視する。
    /// true の場合は `ConflictingFraming` になる。
    pub reject_ambiguous_framing: bool,
    /// 接続終了までをボディとするフレーミングを許可する (デフォルト: true)
    ///
    /// false の場合、長さを決定できないボディは `UnsupportedFraming` になる。
    pub allow_until_close: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            allow_obs_fold: true,
            reject_ambiguous_framing: false,
            allow_until_close: true,
        }
    }
}

impl ParserOptions {
    /// 曖昧な入力をすべて拒否する設定を作成
    ///
    /// リクエストスマグリングの余地を残したくないプロキシの背後で使う。
    pub fn strict() -> Self {
        Self {
            allow_obs_fold: false,
            reject_ambiguous_framing: true,
            allow_until_close: false,
        }
    }
}
