//! 解析モード定義
//!
//! 6種類の解析モードと、モードごとの応答形状（パーサー/コーデックが参照するタグ）

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 解析モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Weight,
    Dimensions,
    Calories,
    PlantId,
    Translate,
    ObjectCount,
}

/// モデル応答の期待形状
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{"objects":[{"name","weight","unit"}]}`
    WeightList,
    /// `{"objects":[{"name","length","width","height","unit"}]}`
    DimensionList,
    /// `{"items":[{"name","portion","calories","protein","carbs","fat"}]}`
    CalorieList,
    /// `{"translatedText","sourceLanguage","translationNotes"}`（配列ではない）
    Translation,
    /// `{"plants":[{"commonName","scientificName","description","confidence"}]}`
    PlantList,
    /// `{"objects":[{"name","count","category"}]}`
    ObjectCountList,
}

impl ResponseShape {
    /// リスト形状の場合の配列フィールド名
    pub fn array_field(&self) -> Option<&'static str> {
        match self {
            ResponseShape::WeightList
            | ResponseShape::DimensionList
            | ResponseShape::ObjectCountList => Some("objects"),
            ResponseShape::CalorieList => Some("items"),
            ResponseShape::PlantList => Some("plants"),
            ResponseShape::Translation => None,
        }
    }
}

impl Mode {
    pub const ALL: [Mode; 6] = [
        Mode::Weight,
        Mode::Dimensions,
        Mode::Calories,
        Mode::PlantId,
        Mode::Translate,
        Mode::ObjectCount,
    ];

    /// 永続化・CLIで使う安定ID
    pub fn id(&self) -> &'static str {
        match self {
            Mode::Weight => "weight",
            Mode::Dimensions => "dimensions",
            Mode::Calories => "calories",
            Mode::PlantId => "plant_id",
            Mode::Translate => "translate",
            Mode::ObjectCount => "object_count",
        }
    }

    /// 表示名（パース失敗時のタイトルにも使う）
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Weight => "Digital Scale",
            Mode::Dimensions => "Tape Measure",
            Mode::Calories => "Calorie Counter",
            Mode::PlantId => "Plant Identifier",
            Mode::Translate => "Translate",
            Mode::ObjectCount => "Object Counter",
        }
    }

    pub fn response_shape(&self) -> ResponseShape {
        match self {
            Mode::Weight => ResponseShape::WeightList,
            Mode::Dimensions => ResponseShape::DimensionList,
            Mode::Calories => ResponseShape::CalorieList,
            Mode::PlantId => ResponseShape::PlantList,
            Mode::Translate => ResponseShape::Translation,
            Mode::ObjectCount => ResponseShape::ObjectCountList,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Mode {
    type Err = Error;

    /// IDまたは表示名（大文字小文字・区切り文字は無視）から変換
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        Mode::ALL
            .iter()
            .copied()
            .find(|mode| {
                let id: String = mode.id().chars().filter(|c| *c != '_').collect();
                let label: String = mode
                    .label()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .map(|c| c.to_ascii_lowercase())
                    .collect();
                key == id || key == label
            })
            .ok_or_else(|| Error::UnknownMode(s.to_string()))
    }
}

/// 単位系（プロンプト内の単位表現を切り替える）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    Metric,
    #[default]
    Imperial,
}

impl UnitSystem {
    pub fn weight_units(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "grams (g) or kilograms (kg)",
            UnitSystem::Imperial => "ounces (oz) or pounds (lb)",
        }
    }

    pub fn length_units(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "centimeters (cm)",
            UnitSystem::Imperial => "inches (in)",
        }
    }

    pub fn portion_units(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "grams or milliliters",
            UnitSystem::Imperial => "ounces or cups",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitSystem::Metric => f.write_str("metric"),
            UnitSystem::Imperial => f.write_str("imperial"),
        }
    }
}
