use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanAiError {
    #[error("APIキーが設定されていません。`scan-ai config --set-api-key YOUR_KEY` で設定してください")]
    MissingCredential,

    #[error("画像変換エラー: {0}")]
    ImageConversion(String),

    #[error("ネットワークエラー: {0}")]
    Network(String),

    #[error("レート制限 (retry-after: {retry_after:?})")]
    RateLimited { retry_after: Option<u64> },

    #[error("サーバーエラー ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("APIレスポンスが不正: {0}")]
    InvalidResponse(String),

    #[error("解析がキャンセルされました")]
    Cancelled,

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("保存エラー: {0}")]
    Storage(String),

    #[error("レコードが見つかりません: {0}")]
    RecordNotFound(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(scan_ai_common::Error),
}

impl From<scan_ai_common::Error> for ScanAiError {
    fn from(e: scan_ai_common::Error) -> Self {
        match e {
            scan_ai_common::Error::InvalidResponse(reason) => ScanAiError::InvalidResponse(reason),
            other => ScanAiError::Common(other),
        }
    }
}

impl From<rusqlite::Error> for ScanAiError {
    fn from(e: rusqlite::Error) -> Self {
        ScanAiError::Storage(e.to_string())
    }
}

impl ScanAiError {
    /// 利用者向けメッセージ（分類ごとに1つ）
    pub fn user_message(&self) -> String {
        match self {
            ScanAiError::MissingCredential => {
                "OpenAI API key not configured. Please add your API key in Settings.".to_string()
            }
            ScanAiError::ImageConversion(_) => {
                "Failed to process the image. Please try again.".to_string()
            }
            ScanAiError::Network(_) => {
                "Network error. Please check your connection and try again.".to_string()
            }
            ScanAiError::RateLimited { retry_after: Some(seconds) } => format!(
                "Too many requests. Please wait {} seconds and try again.",
                seconds
            ),
            ScanAiError::RateLimited { retry_after: None } => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            ScanAiError::Server { status, .. } => {
                format!("Server error ({}). Please try again later.", status)
            }
            ScanAiError::InvalidResponse(reason) => {
                format!("Unexpected response from AI service. {}", reason)
            }
            ScanAiError::Cancelled => "Analysis cancelled.".to_string(),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }

    /// 「もう一度試す」で回復し得るか（APIキー未設定は設定が必要）
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScanAiError::ImageConversion(_)
                | ScanAiError::Network(_)
                | ScanAiError::RateLimited { .. }
                | ScanAiError::Server { .. }
                | ScanAiError::InvalidResponse(_)
                | ScanAiError::Cancelled
        )
    }

    /// レート制限時の再試行までの秒数
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            ScanAiError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanAiError>;
