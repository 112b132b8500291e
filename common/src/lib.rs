//! Scan AI Common Library
//!
//! CLI（と将来の他フロントエンド）で共有される、I/Oを持たない解析コア:
//! モード定義・プロンプト・結果型・応答パーサー・永続化コーデック

pub mod codec;
pub mod coerce;
pub mod error;
pub mod mode;
pub mod parser;
pub mod prompts;
pub mod request;
pub mod types;

pub use codec::{decode_payload, encode_payload, PersistedRecord};
pub use error::{Error, Result};
pub use mode::{Mode, ResponseShape, UnitSystem};
pub use parser::{extract_json, extract_reply_text, parse_reply, parse_response};
pub use prompts::{system_prompt, user_prompt, PromptContext};
pub use request::{build_chat_request, ChatRequest, ModelParams};
pub use types::{
    AnalysisOutcome, CalorieItem, Confidence, DimensionItem, ObjectCountItem, Payload, PlantItem,
    Thumbnail, TranslationPayload, WeightItem,
};
