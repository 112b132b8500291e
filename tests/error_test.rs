//! エラーケーステスト
//!
//! 失敗分類・利用者向けメッセージ・再試行可否を検証

use scan_ai::error::ScanAiError;
use scan_ai::imaging;
use scan_ai_common::parse_response;
use scan_ai_common::Mode;

/// 画像として読めないバイト列
#[test]
fn test_image_conversion_error() {
    let result = imaging::decode(b"not an image");
    let err = result.unwrap_err();
    assert!(matches!(err, ScanAiError::ImageConversion(_)));
    assert_eq!(err.user_message(), "Failed to process the image. Please try again.");
    assert!(err.is_retryable());
}

/// 応答エンベロープ不正 → InvalidResponse に変換される
#[test]
fn test_invalid_envelope_maps_to_invalid_response() {
    let err: ScanAiError = parse_response(b"{\"choices\": []}", Mode::Weight)
        .unwrap_err()
        .into();
    match &err {
        ScanAiError::InvalidResponse(reason) => {
            assert_eq!(reason, "Could not extract content from response.");
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(
        err.user_message(),
        "Unexpected response from AI service. Could not extract content from response."
    );
}

/// 分類ごとのメッセージ
#[test]
fn test_user_messages() {
    assert_eq!(
        ScanAiError::MissingCredential.user_message(),
        "OpenAI API key not configured. Please add your API key in Settings."
    );
    assert_eq!(
        ScanAiError::Network("timed out".into()).user_message(),
        "Network error. Please check your connection and try again."
    );
    assert_eq!(
        ScanAiError::RateLimited { retry_after: Some(30) }.user_message(),
        "Too many requests. Please wait 30 seconds and try again."
    );
    assert_eq!(
        ScanAiError::RateLimited { retry_after: None }.user_message(),
        "Too many requests. Please wait a moment and try again."
    );
    assert_eq!(
        ScanAiError::Server { status: 503, body: String::new() }.user_message(),
        "Server error (503). Please try again later."
    );
}

/// APIキー未設定のみ再試行不可
#[test]
fn test_retryable() {
    let retryable = vec![
        ScanAiError::ImageConversion("x".into()),
        ScanAiError::Network("x".into()),
        ScanAiError::RateLimited { retry_after: None },
        ScanAiError::Server { status: 500, body: String::new() },
        ScanAiError::InvalidResponse("x".into()),
        ScanAiError::Cancelled,
    ];
    for err in retryable {
        assert!(err.is_retryable(), "{err:?}");
    }
    assert!(!ScanAiError::MissingCredential.is_retryable());
}

/// ScanAiErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        ScanAiError::Config("テスト設定エラー".to_string()),
        ScanAiError::Storage("DB接続に失敗".to_string()),
        ScanAiError::RecordNotFound("1234".to_string()),
        ScanAiError::Network("接続拒否".to_string()),
        ScanAiError::MissingCredential,
        ScanAiError::Cancelled,
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// retry_after はレート制限時のみ
#[test]
fn test_retry_after() {
    assert_eq!(ScanAiError::RateLimited { retry_after: Some(7) }.retry_after(), Some(7));
    assert_eq!(ScanAiError::Server { status: 429, body: String::new() }.retry_after(), None);
}
