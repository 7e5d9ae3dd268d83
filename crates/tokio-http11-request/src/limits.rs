use std::time::Duration;

/// 読み取りの制限設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadLimits {
    /// 未消費のまま保持できる最大バイト数 (デフォルト: 64KB)
    pub max_buffer_size: usize,
    /// リクエストラインとヘッダーの最大サイズ (デフォルト: 64KB)
    pub max_head_size: usize,
    /// 最大ボディサイズ (デフォルト: 10MB)
    pub max_body_size: usize,
    /// 1 回の読み取りで使うバッファサイズ (デフォルト: 8KB)
    pub read_buffer_size: usize,
    /// 読み取りが進まない場合のタイムアウト (デフォルト: 60 秒)
    pub idle_timeout: Duration,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            max_buffer_size: 64 * 1024,      // 64KB
            max_head_size: 64 * 1024,        // 64KB
            max_body_size: 10 * 1024 * 1024, // 10MB
            read_buffer_size: 8 * 1024,      // 8KB
            idle_timeout: Duration::from_secs(60),
        }
    }
}

impl ReadLimits {
    /// 制限なしの設定を作成
    ///
    /// 読み取りバッファサイズはデフォルトのまま。
    pub fn unlimited() -> Self {
        Self {
            max_buffer_size: usize::MAX,
            max_head_size: usize::MAX,
            max_body_size: usize::MAX,
            idle_timeout: Duration::MAX,
            ..Self::default()
        }
    }
}
