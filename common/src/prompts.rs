//! プロンプト生成モジュール
//!
//! モードごとのシステムプロンプト・ユーザープロンプトを生成する。
//! どちらも (モード, 単位系, 翻訳先言語) の純関数。

use crate::mode::{Mode, UnitSystem};

/// プロンプト生成に使う利用者設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    pub units: UnitSystem,
    /// 翻訳モードの翻訳先（端末ロケール相当）
    pub target_language: String,
}

impl Default for PromptContext {
    fn default() -> Self {
        Self {
            units: UnitSystem::default(),
            target_language: "English".to_string(),
        }
    }
}

impl PromptContext {
    pub fn new(units: UnitSystem, target_language: impl Into<String>) -> Self {
        Self {
            units,
            target_language: target_language.into(),
        }
    }
}

const JSON_ONLY: &str = "Respond with ONLY the JSON object. No markdown, no commentary.";

/// システムプロンプト生成
///
/// 各モードの厳密なJSON応答形式を指示する
pub fn system_prompt(mode: Mode, ctx: &PromptContext) -> String {
    match mode {
        Mode::Weight => format!(
            r#"You are a digital scale. Estimate the weight of every distinct object visible in the photo.
Use {units}. Weights must be plain numbers without the unit.

Output format (strictly this JSON object):
{{
  "objects": [
    {{ "name": "object name", "weight": "150", "unit": "g" }}
  ],
  "explanation": "how the estimate was made"
}}

{JSON_ONLY}"#,
            units = ctx.units.weight_units(),
        ),
        Mode::Dimensions => format!(
            r#"You are a tape measure. Estimate the length, width and height of every distinct object visible in the photo.
Use {units}. Dimensions must be plain numbers without the unit.

Output format (strictly this JSON object):
{{
  "objects": [
    {{ "name": "object name", "length": "30", "width": "20", "height": "15", "unit": "cm" }}
  ],
  "explanation": "reference objects used for scale"
}}

{JSON_ONLY}"#,
            units = ctx.units.length_units(),
        ),
        Mode::Calories => format!(
            r#"You are a nutritionist. Identify every food item in the photo and estimate its calories and macronutrients.
Describe portions in {portion}. Calories are whole kcal; protein, carbs and fat are grams.

Output format (strictly this JSON object):
{{
  "items": [
    {{ "name": "food name", "portion": "1 cup", "calories": 200, "protein": 5, "carbs": 30.5, "fat": 4 }}
  ],
  "explanation": "assumptions about ingredients and portion size"
}}

{JSON_ONLY}"#,
            portion = ctx.units.portion_units(),
        ),
        Mode::PlantId => format!(
            r#"You are a botanist. Identify every plant visible in the photo.
Confidence must be one of "high", "medium" or "low".

Output format (strictly this JSON object):
{{
  "plants": [
    {{ "commonName": "Monstera", "scientificName": "Monstera deliciosa", "description": "short care and identification notes", "confidence": "high" }}
  ],
  "explanation": "visible features used for identification"
}}

{JSON_ONLY}"#
        ),
        Mode::Translate => format!(
            r#"You are a translator. Read all text visible in the photo and translate it into {language}.
Preserve line breaks. Name the detected source language in English.

Output format (strictly this JSON object):
{{
  "translatedText": "the translation",
  "sourceLanguage": "Japanese",
  "translationNotes": "idioms, ambiguities or unreadable parts"
}}

{JSON_ONLY}"#,
            language = ctx.target_language,
        ),
        Mode::ObjectCount => format!(
            r#"You are an object counter. Count every distinct type of object visible in the photo.
Counts are whole numbers. Group each type under a short category such as "Food", "Electronics" or "Other".

Output format (strictly this JSON object):
{{
  "objects": [
    {{ "name": "coin", "count": 12, "category": "Other" }}
  ],
  "explanation": "how overlapping or partial objects were counted"
}}

{JSON_ONLY}"#
        ),
    }
}

/// ユーザープロンプト生成（画像に添えるテキスト）
pub fn user_prompt(mode: Mode, ctx: &PromptContext) -> String {
    match mode {
        Mode::Weight => format!(
            "Estimate the weight of each object in this image in {}.",
            ctx.units.weight_units()
        ),
        Mode::Dimensions => format!(
            "Estimate the dimensions of each object in this image in {}.",
            ctx.units.length_units()
        ),
        Mode::Calories => "Estimate the calories and macros of the food in this image.".to_string(),
        Mode::PlantId => "Identify the plants in this image.".to_string(),
        Mode::Translate => format!(
            "Translate all text in this image into {}.",
            ctx.target_language
        ),
        Mode::ObjectCount => "Count the objects in this image.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_names_reply_fields() {
        let ctx = PromptContext::default();
        let expected: &[(Mode, &[&str])] = &[
            (Mode::Weight, &["\"objects\"", "\"weight\"", "\"unit\"", "\"explanation\""]),
            (Mode::Dimensions, &["\"length\"", "\"width\"", "\"height\""]),
            (Mode::Calories, &["\"items\"", "\"portion\"", "\"calories\"", "\"protein\"", "\"carbs\"", "\"fat\""]),
            (Mode::PlantId, &["\"plants\"", "\"commonName\"", "\"scientificName\"", "\"confidence\""]),
            (Mode::Translate, &["\"translatedText\"", "\"sourceLanguage\"", "\"translationNotes\""]),
            (Mode::ObjectCount, &["\"objects\"", "\"count\"", "\"category\""]),
        ];

        for (mode, fields) in expected {
            let prompt = system_prompt(*mode, &ctx);
            for field in *fields {
                assert!(prompt.contains(field), "{:?} prompt lacks {}", mode, field);
            }
        }
    }

    #[test]
    fn test_unit_preference_changes_phrasing() {
        let metric = PromptContext::new(UnitSystem::Metric, "English");
        let imperial = PromptContext::new(UnitSystem::Imperial, "English");

        assert!(system_prompt(Mode::Weight, &metric).contains("kilograms"));
        assert!(system_prompt(Mode::Weight, &imperial).contains("pounds"));
        assert!(user_prompt(Mode::Dimensions, &metric).contains("centimeters"));
        assert!(user_prompt(Mode::Dimensions, &imperial).contains("inches"));
    }

    #[test]
    fn test_translate_uses_target_language() {
        let ctx = PromptContext::new(UnitSystem::Metric, "German");
        assert!(system_prompt(Mode::Translate, &ctx).contains("into German"));
        assert!(user_prompt(Mode::Translate, &ctx).contains("German"));
    }

    #[test]
    fn test_prompts_are_deterministic() {
        let ctx = PromptContext::default();
        for mode in Mode::ALL {
            assert_eq!(system_prompt(mode, &ctx), system_prompt(mode, &ctx));
            assert_eq!(user_prompt(mode, &ctx), user_prompt(mode, &ctx));
        }
    }
}
