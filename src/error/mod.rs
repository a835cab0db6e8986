use thiserror::Error;

pub type Result<T> = std::result::Result<T, DissectError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DissectError {
    #[error("バッファが不足しています: 必要 {needed} バイト, 残り {available} バイト")]
    Truncated { needed: usize, available: usize },

    #[error("不正なパケットです: {0}")]
    Malformed(String),
}
