//! チャット補完APIのワイヤー型
//!
//! リクエスト本文の組み立て（プロンプト対 + 画像Data URL + 固定パラメータ）と、
//! 応答エンベロープの型

use crate::mode::Mode;
use crate::prompts::{system_prompt, user_prompt, PromptContext};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 800;

/// 画像の解像度ヒント（トークン節約のため常に low）
pub const IMAGE_DETAIL: &str = "low";

/// リクエスト本文
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

/// system はテキスト、user は画像+テキストのパーツ配列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    ImageUrl { image_url: ImageUrl },
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
    pub detail: String,
}

/// 応答エンベロープ `{choices:[{message:{content}}]}`
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// モデル呼び出しの固定パラメータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelParams {
    pub model: String,
    pub max_tokens: u32,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// JPEGのBase64をData URLに包む
pub fn jpeg_data_url(base64_jpeg: &str) -> String {
    format!("data:image/jpeg;base64,{}", base64_jpeg)
}

/// リクエスト本文を組み立てる
///
/// # Arguments
/// * `base64_jpeg` - 縮小・圧縮済み画像のBase64
/// * `mode` - 解析モード
/// * `ctx` - 単位系・翻訳先言語
/// * `params` - モデル名・最大トークン数
pub fn build_chat_request(
    base64_jpeg: &str,
    mode: Mode,
    ctx: &PromptContext,
    params: &ModelParams,
) -> ChatRequest {
    ChatRequest {
        model: params.model.clone(),
        max_tokens: params.max_tokens,
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: MessageContent::Text(system_prompt(mode, ctx)),
            },
            ChatMessage {
                role: "user".to_string(),
                content: MessageContent::Parts(vec![
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: jpeg_data_url(base64_jpeg),
                            detail: IMAGE_DETAIL.to_string(),
                        },
                    },
                    ContentPart::Text {
                        text: user_prompt(mode, ctx),
                    },
                ]),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_request_wire_format() {
        let ctx = PromptContext::default();
        let request = build_chat_request("QUJD", Mode::Weight, &ctx, &ModelParams::default());
        let json: Value = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 800);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], system_prompt(Mode::Weight, &ctx));
        assert_eq!(json["messages"][1]["role"], "user");

        let parts = &json["messages"][1]["content"];
        assert_eq!(parts[0]["type"], "image_url");
        assert_eq!(parts[0]["image_url"]["url"], "data:image/jpeg;base64,QUJD");
        assert_eq!(parts[0]["image_url"]["detail"], "low");
        assert_eq!(parts[1]["type"], "text");
        assert_eq!(parts[1]["text"], user_prompt(Mode::Weight, &ctx));
    }

    #[test]
    fn test_custom_model_params() {
        let params = ModelParams {
            model: "gpt-4o".to_string(),
            max_tokens: 400,
        };
        let request = build_chat_request("", Mode::Translate, &PromptContext::default(), &params);
        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.max_tokens, 400);
    }

    #[test]
    fn test_response_envelope() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"hi"}}]}"#;
        let response: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.choices[0].message.content.as_deref(), Some("hi"));
    }
}
