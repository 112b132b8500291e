//! 解析結果の型定義
//!
//! パーサー・表示・永続化コーデックで共有される型:
//! - 各モードの要素型（WeightItem など）
//! - Payload: モード固有データ（モードごとに1バリアント）
//! - AnalysisOutcome: 1回の解析結果

use crate::mode::Mode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 圧縮済みサムネイル（JPEGバイト列）。要素間で共有される
pub type Thumbnail = Arc<[u8]>;

/// 重量推定（1物体）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightItem {
    pub name: String,
    /// 10進数の文字列（例: "150", "1.5"）
    pub weight: String,
    pub unit: String,
    #[serde(skip)]
    pub thumbnail: Option<Thumbnail>,
}

/// 寸法推定（1物体）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionItem {
    pub name: String,
    pub length: String,
    pub width: String,
    pub height: String,
    pub unit: String,
    #[serde(skip)]
    pub thumbnail: Option<Thumbnail>,
}

impl DimensionItem {
    /// "30 × 20 × 15 cm" 形式
    pub fn formatted(&self) -> String {
        format!("{} × {} × {} {}", self.length, self.width, self.height, self.unit)
    }
}

/// カロリー推定（1品目）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalorieItem {
    pub name: String,
    pub portion: String,
    pub calories: i64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(skip)]
    pub thumbnail: Option<Thumbnail>,
}

impl CalorieItem {
    /// "P: 12g · C: 30.5g · F: 4g" 形式
    pub fn formatted_macros(&self) -> String {
        format!(
            "P: {}g · C: {}g · F: {}g",
            format_grams(self.protein),
            format_grams(self.carbs),
            format_grams(self.fat)
        )
    }
}

/// 整数値なら小数なし、それ以外は小数1桁
pub fn format_grams(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

/// 植物同定の確信度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

impl Confidence {
    /// モデル出力の確信度文字列を寛容に解釈（不明値は medium）
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Confidence::High,
            "low" => Confidence::Low,
            _ => Confidence::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

/// 植物同定（1種）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantItem {
    pub common_name: String,
    pub scientific_name: String,
    pub description: String,
    pub confidence: Confidence,
    #[serde(skip)]
    pub thumbnail: Option<Thumbnail>,
}

/// 物体カウント（1種類）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectCountItem {
    pub name: String,
    pub count: i64,
    pub category: String,
    #[serde(skip)]
    pub thumbnail: Option<Thumbnail>,
}

/// 翻訳結果（リストではなく単体）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationPayload {
    pub translated_text: String,
    pub source_language: String,
    #[serde(rename = "translationNotes")]
    pub notes: String,
    #[serde(skip)]
    pub thumbnail: Option<Thumbnail>,
}

/// モード固有データ
///
/// バリアントがモードと1対1に対応するため、
/// 「モードに一致するペイロードだけが存在する」ことが型で保証される
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "items", rename_all = "snake_case")]
pub enum Payload {
    Weight(Vec<WeightItem>),
    Dimensions(Vec<DimensionItem>),
    Calories(Vec<CalorieItem>),
    PlantId(Vec<PlantItem>),
    Translate(Option<TranslationPayload>),
    ObjectCount(Vec<ObjectCountItem>),
}

impl Payload {
    /// 空のペイロード（要素なし状態）
    pub fn empty(mode: Mode) -> Self {
        match mode {
            Mode::Weight => Payload::Weight(Vec::new()),
            Mode::Dimensions => Payload::Dimensions(Vec::new()),
            Mode::Calories => Payload::Calories(Vec::new()),
            Mode::PlantId => Payload::PlantId(Vec::new()),
            Mode::Translate => Payload::Translate(None),
            Mode::ObjectCount => Payload::ObjectCount(Vec::new()),
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Payload::Weight(_) => Mode::Weight,
            Payload::Dimensions(_) => Mode::Dimensions,
            Payload::Calories(_) => Mode::Calories,
            Payload::PlantId(_) => Mode::PlantId,
            Payload::Translate(_) => Mode::Translate,
            Payload::ObjectCount(_) => Mode::ObjectCount,
        }
    }

    /// 要素数（翻訳は 0 または 1）
    pub fn len(&self) -> usize {
        match self {
            Payload::Weight(items) => items.len(),
            Payload::Dimensions(items) => items.len(),
            Payload::Calories(items) => items.len(),
            Payload::PlantId(items) => items.len(),
            Payload::Translate(item) => usize::from(item.is_some()),
            Payload::ObjectCount(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn set_thumbnail(&mut self, thumbnail: Option<Thumbnail>) {
        match self {
            Payload::Weight(items) => items.iter_mut().for_each(|i| i.thumbnail = thumbnail.clone()),
            Payload::Dimensions(items) => items.iter_mut().for_each(|i| i.thumbnail = thumbnail.clone()),
            Payload::Calories(items) => items.iter_mut().for_each(|i| i.thumbnail = thumbnail.clone()),
            Payload::PlantId(items) => items.iter_mut().for_each(|i| i.thumbnail = thumbnail.clone()),
            Payload::Translate(item) => {
                if let Some(item) = item {
                    item.thumbnail = thumbnail;
                }
            }
            Payload::ObjectCount(items) => items.iter_mut().for_each(|i| i.thumbnail = thumbnail.clone()),
        }
    }
}

/// 1回の解析結果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub title: String,
    /// 主値（例: "150 g", "400 kcal"）
    pub value: String,
    pub detail: String,
    pub explanation: String,
    /// モデル応答そのまま（診断用）
    pub raw_text: String,
    pub payload: Payload,
    #[serde(skip)]
    pub thumbnail: Option<Thumbnail>,
}

impl AnalysisOutcome {
    /// 共通フィールドのみの結果（ペイロードは空）
    pub fn generic(
        mode: Mode,
        title: impl Into<String>,
        value: impl Into<String>,
        detail: impl Into<String>,
        explanation: impl Into<String>,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            detail: detail.into(),
            explanation: explanation.into(),
            raw_text: raw_text.into(),
            payload: Payload::empty(mode),
            thumbnail: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.payload.mode()
    }

    /// サムネイルを結果と全要素に付与
    pub fn attach_thumbnail(&mut self, thumbnail: Option<Thumbnail>) {
        self.payload.set_thumbnail(thumbnail.clone());
        self.thumbnail = thumbnail;
    }

    pub fn weight_items(&self) -> &[WeightItem] {
        match &self.payload {
            Payload::Weight(items) => items,
            _ => &[],
        }
    }

    pub fn dimension_items(&self) -> &[DimensionItem] {
        match &self.payload {
            Payload::Dimensions(items) => items,
            _ => &[],
        }
    }

    pub fn calorie_items(&self) -> &[CalorieItem] {
        match &self.payload {
            Payload::Calories(items) => items,
            _ => &[],
        }
    }

    pub fn plant_items(&self) -> &[PlantItem] {
        match &self.payload {
            Payload::PlantId(items) => items,
            _ => &[],
        }
    }

    pub fn object_counts(&self) -> &[ObjectCountItem] {
        match &self.payload {
            Payload::ObjectCount(items) => items,
            _ => &[],
        }
    }

    pub fn translation(&self) -> Option<&TranslationPayload> {
        match &self.payload {
            Payload::Translate(item) => item.as_ref(),
            _ => None,
        }
    }

    // 集計値は保存せず毎回計算する

    pub fn total_calories(&self) -> i64 {
        saturating_total(self.calorie_items().iter().map(|i| i.calories))
    }

    pub fn total_protein(&self) -> f64 {
        self.calorie_items().iter().map(|i| i.protein).sum()
    }

    pub fn total_carbs(&self) -> f64 {
        self.calorie_items().iter().map(|i| i.carbs).sum()
    }

    pub fn total_fat(&self) -> f64 {
        self.calorie_items().iter().map(|i| i.fat).sum()
    }

    pub fn total_object_count(&self) -> i64 {
        saturating_total(self.object_counts().iter().map(|i| i.count))
    }
}

/// 整数の合計（桁あふれ時は上限・下限で止める）
pub fn saturating_total(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0, i64::saturating_add)
}
