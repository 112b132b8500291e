//! 永続化コーデック
//!
//! 解析結果 ⇔ 汎用レコード（共通スカラー + モード固有ペイロードのJSONブロブ + サムネイル）
//!
//! ブロブのスキーマはモデル応答のフィールド名から `explanation` を除いたもの。
//! 要素ごとのサムネイルは保存せず、復元時にレコードの1枚を全要素に付け直す

use crate::error::Result;
use crate::mode::Mode;
use crate::types::{
    AnalysisOutcome, CalorieItem, DimensionItem, ObjectCountItem, Payload, PlantItem, Thumbnail,
    TranslationPayload, WeightItem,
};
use chrono::{DateTime, Utc};
use log::warn;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// 履歴一覧で翻訳テキストを切り詰める文字数
const SUMMARY_MAX_CHARS: usize = 60;

/// 保存済みの解析結果
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub mode: Mode,
    pub title: String,
    pub value: String,
    pub detail: String,
    pub explanation: String,
    /// 圧縮済みサムネイル（JPEG）
    pub thumbnail: Option<Vec<u8>>,
    /// モード固有ペイロード（JSON）
    pub payload: Option<Vec<u8>>,
}

impl PersistedRecord {
    /// 解析結果から新規レコードを作成（保存時に1回だけ）
    pub fn from_outcome(outcome: &AnalysisOutcome) -> Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            mode: outcome.mode(),
            title: outcome.title.clone(),
            value: outcome.value.clone(),
            detail: outcome.detail.clone(),
            explanation: outcome.explanation.clone(),
            thumbnail: outcome.thumbnail.as_deref().map(<[u8]>::to_vec),
            payload: encode_payload(&outcome.payload)?,
        })
    }

    /// 表示用の解析結果に復元
    ///
    /// ブロブがモードと一致しない・壊れている場合もエラーにせず、
    /// ペイロードが空の結果を返す
    pub fn to_outcome(&self) -> AnalysisOutcome {
        let payload = match &self.payload {
            Some(blob) => decode_payload(self.mode, blob),
            None => Payload::empty(self.mode),
        };

        let mut outcome = AnalysisOutcome {
            title: self.title.clone(),
            value: self.value.clone(),
            detail: self.detail.clone(),
            explanation: self.explanation.clone(),
            raw_text: String::new(),
            payload,
            thumbnail: None,
        };
        let thumbnail: Option<Thumbnail> = self.thumbnail.as_deref().map(Thumbnail::from);
        outcome.attach_thumbnail(thumbnail);
        outcome
    }

    /// 履歴一覧の1行表示
    pub fn summary(&self) -> String {
        if self.mode == Mode::Translate {
            let translated = self
                .payload
                .as_deref()
                .and_then(|blob| serde_json::from_slice::<TranslationPayload>(blob).ok());
            if let Some(item) = translated {
                return truncate(&item.translated_text, SUMMARY_MAX_CHARS);
            }
            return self.value.clone();
        }

        if self.value.is_empty() {
            self.title.clone()
        } else {
            self.value.clone()
        }
    }
}

/// ペイロードをブロブに変換。要素がなければ `None`
pub fn encode_payload(payload: &Payload) -> Result<Option<Vec<u8>>> {
    if payload.is_empty() {
        return Ok(None);
    }

    let blob = match payload {
        Payload::Weight(items) => serde_json::to_vec(items)?,
        Payload::Dimensions(items) => serde_json::to_vec(items)?,
        Payload::Calories(items) => serde_json::to_vec(items)?,
        Payload::PlantId(items) => serde_json::to_vec(items)?,
        Payload::Translate(item) => serde_json::to_vec(item)?,
        Payload::ObjectCount(items) => serde_json::to_vec(items)?,
    };
    Ok(Some(blob))
}

/// ブロブをモードに従って復元。失敗時は空ペイロード
pub fn decode_payload(mode: Mode, blob: &[u8]) -> Payload {
    match mode {
        Mode::Weight => decode_blob::<Vec<WeightItem>>(mode, blob).map(Payload::Weight),
        Mode::Dimensions => decode_blob::<Vec<DimensionItem>>(mode, blob).map(Payload::Dimensions),
        Mode::Calories => decode_blob::<Vec<CalorieItem>>(mode, blob).map(Payload::Calories),
        Mode::PlantId => decode_blob::<Vec<PlantItem>>(mode, blob).map(Payload::PlantId),
        Mode::Translate => decode_blob::<TranslationPayload>(mode, blob)
            .map(|item| Payload::Translate(Some(item))),
        Mode::ObjectCount => decode_blob::<Vec<ObjectCountItem>>(mode, blob).map(Payload::ObjectCount),
    }
    .unwrap_or_else(|| Payload::empty(mode))
}

fn decode_blob<T: DeserializeOwned>(mode: Mode, blob: &[u8]) -> Option<T> {
    match serde_json::from_slice(blob) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{}: ペイロードを復元できません ({})", mode.id(), e);
            None
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}…", head)
    } else {
        text.to_string()
    }
}
