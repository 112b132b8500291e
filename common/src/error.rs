//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// チャット応答のエンベロープ（choices[0].message.content）が読めない
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
