//! チャット補完APIへの送信と失敗分類
//!
//! 自動リトライはしない（再試行は呼び出し側の判断）

use crate::credentials::CredentialStore;
use crate::error::{Result, ScanAiError};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::RETRY_AFTER;
use scan_ai_common::ChatRequest;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
pub const TOTAL_TIMEOUT: Duration = Duration::from_secs(60);

/// リクエスト送信。成功時は応答ボディを返す
#[async_trait]
pub trait Transport: Send + Sync {
    /// 送信前提（APIキーなど）の確認。画像処理より先に呼ばれる
    fn ready(&self) -> Result<()> {
        Ok(())
    }

    async fn send(&self, request: &ChatRequest, cancel: &CancellationToken) -> Result<Vec<u8>>;
}

/// HTTPS + Bearer 認証
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    credentials: Arc<dyn CredentialStore>,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(TOTAL_TIMEOUT)
            .build()
            .map_err(|e| ScanAiError::Network(format!("HTTPクライアント作成失敗: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            credentials,
        })
    }

    /// 空白のみのキーは未設定扱い
    fn api_key(&self) -> Result<String> {
        self.credentials
            .get()?
            .filter(|key| !key.trim().is_empty())
            .ok_or(ScanAiError::MissingCredential)
    }

    async fn post(&self, api_key: &str, request: &ChatRequest) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ScanAiError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| ScanAiError::Network(e.to_string()))?;

        debug!("HTTP {} ({} bytes)", status, body.len());
        classify_response(status, retry_after.as_deref(), body.to_vec())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn ready(&self) -> Result<()> {
        self.api_key().map(|_| ())
    }

    async fn send(&self, request: &ChatRequest, cancel: &CancellationToken) -> Result<Vec<u8>> {
        // キー未設定ならネットワークに触れずに終了
        let api_key = self.api_key()?;

        if cancel.is_cancelled() {
            return Err(ScanAiError::Cancelled);
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                warn!("送信中にキャンセルされました");
                Err(ScanAiError::Cancelled)
            }
            result = self.post(&api_key, request) => result,
        }
    }
}

/// HTTPステータスを分類
///
/// * 429 → `RateLimited`（`Retry-After` が整数秒なら付与）
/// * 2xx 以外 → `Server`
/// * 2xx → ボディ
pub fn classify_response(status: u16, retry_after: Option<&str>, body: Vec<u8>) -> Result<Vec<u8>> {
    match status {
        429 => Err(ScanAiError::RateLimited {
            retry_after: retry_after.and_then(|v| v.trim().parse::<u64>().ok()),
        }),
        200..=299 => Ok(body),
        _ => Err(ScanAiError::Server {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentialStore;
    use scan_ai_common::{build_chat_request, Mode, ModelParams, PromptContext};

    #[test]
    fn test_classify_success() {
        let body = classify_response(200, None, b"{}".to_vec()).unwrap();
        assert_eq!(body, b"{}");
    }

    #[test]
    fn test_classify_rate_limited_with_header() {
        let err = classify_response(429, Some("30"), Vec::new()).unwrap_err();
        assert!(matches!(err, ScanAiError::RateLimited { retry_after: Some(30) }));
        assert_eq!(err.retry_after(), Some(30));
    }

    #[test]
    fn test_classify_rate_limited_without_header() {
        let err = classify_response(429, None, Vec::new()).unwrap_err();
        assert!(matches!(err, ScanAiError::RateLimited { retry_after: None }));

        // HTTP日付形式は秒数として扱わない
        let err = classify_response(429, Some("Wed, 21 Oct 2015 07:28:00 GMT"), Vec::new()).unwrap_err();
        assert!(matches!(err, ScanAiError::RateLimited { retry_after: None }));
    }

    #[test]
    fn test_classify_server_error() {
        let err = classify_response(500, None, b"boom".to_vec()).unwrap_err();
        match err {
            ScanAiError::Server { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected: {other:?}"),
        }

        assert!(matches!(
            classify_response(401, None, Vec::new()),
            Err(ScanAiError::Server { status: 401, .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_credential_short_circuits() {
        // 接続できないポートを指定。送信すれば Network になる
        let transport = HttpTransport::new(
            "http://127.0.0.1:9/v1/chat/completions",
            Arc::new(MemoryCredentialStore::new()),
        )
        .unwrap();
        let request = build_chat_request("", Mode::Weight, &PromptContext::default(), &ModelParams::default());

        let err = transport.send(&request, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ScanAiError::MissingCredential));
    }

    #[test]
    fn test_ready_requires_credential() {
        let missing = HttpTransport::new("http://127.0.0.1:9/", Arc::new(MemoryCredentialStore::new()))
            .unwrap();
        assert!(matches!(missing.ready(), Err(ScanAiError::MissingCredential)));

        let present = HttpTransport::new(
            "http://127.0.0.1:9/",
            Arc::new(MemoryCredentialStore::with_secret("sk-test")),
        )
        .unwrap();
        assert!(present.ready().is_ok());
    }

    #[tokio::test]
    async fn test_blank_credential_is_missing() {
        let transport = HttpTransport::new(
            "http://127.0.0.1:9/",
            Arc::new(MemoryCredentialStore::with_secret("  ")),
        )
        .unwrap();
        let request = build_chat_request("", Mode::Weight, &PromptContext::default(), &ModelParams::default());

        let err = transport.send(&request, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ScanAiError::MissingCredential));
    }

    #[tokio::test]
    async fn test_already_cancelled() {
        let transport = HttpTransport::new(
            "http://127.0.0.1:9/",
            Arc::new(MemoryCredentialStore::with_secret("sk-test")),
        )
        .unwrap();
        let request = build_chat_request("", Mode::Weight, &PromptContext::default(), &ModelParams::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = transport.send(&request, &cancel).await.unwrap_err();
        assert!(matches!(err, ScanAiError::Cancelled));
    }
}
