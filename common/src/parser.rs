//! APIレスポンスパーサー
//!
//! チャット応答エンベロープからモデルの返答テキストを取り出し、
//! モードごとの型付き結果に変換する。
//!
//! 返答テキストは3段階で解釈する:
//! 1. モード固有のJSON形状（要素ごとに寛容な型変換、必須欠落要素は除外）
//! 2. 汎用JSON（`title`/`value`/`detail`/`explanation` キー）
//! 3. プレーンテキスト（返答全体を `value` に）
//!
//! エンベロープが読めない場合を除き、失敗せず必ず結果を返す

use crate::coerce;
use crate::error::{Error, Result};
use crate::mode::{Mode, ResponseShape};
use crate::request::ChatResponse;
use crate::types::{
    saturating_total, AnalysisOutcome, CalorieItem, Confidence, DimensionItem, ObjectCountItem,
    Payload, PlantItem, TranslationPayload, WeightItem,
};
use log::{debug, warn};
use serde_json::{Map, Value};

type Object = Map<String, Value>;

/// 応答本文（HTTPボディ）を解析
///
/// # Returns
/// * `Ok(AnalysisOutcome)` - 最善努力の解析結果
/// * `Err(Error::InvalidResponse)` - エンベロープ形状が不明
pub fn parse_response(body: &[u8], mode: Mode) -> Result<AnalysisOutcome> {
    let reply = extract_reply_text(body)?;
    Ok(parse_reply(&reply, mode))
}

/// エンベロープから `choices[0].message.content` を取り出す
pub fn extract_reply_text(body: &[u8]) -> Result<String> {
    let response: ChatResponse = serde_json::from_slice(body).map_err(|e| {
        Error::InvalidResponse(format!("Could not extract content from response. ({})", e))
    })?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| Error::InvalidResponse("Could not extract content from response.".into()))
}

/// 返答テキストからJSON部分を抽出
///
/// 抽出優先順位:
/// 1. テキスト全体がJSONオブジェクトとして読めればそのまま
/// 2. ```json ... ``` ブロック（言語指定なしのフェンスも可）
/// 3. 最初の `{` から最後の `}` まで
///
/// # Examples
/// ```
/// use scan_ai_common::extract_json;
///
/// let reply = "```json\n{\"value\": \"1 kg\"}\n```";
/// assert_eq!(extract_json(reply), Some("{\"value\": \"1 kg\"}"));
/// assert_eq!(extract_json("about 2 kilograms"), None);
/// ```
pub fn extract_json(reply: &str) -> Option<&str> {
    // 値の中にフェンス記号を含む正しいJSONを切り取らない
    let trimmed = reply.trim();
    if trimmed.starts_with('{') && serde_json::from_str::<Object>(trimmed).is_ok() {
        return Some(trimmed);
    }

    for marker in ["```json", "```"] {
        if let Some(start_marker) = reply.find(marker) {
            let start = start_marker + marker.len();
            if let Some(end_offset) = reply[start..].find("```") {
                return Some(reply[start..start + end_offset].trim());
            }
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (end > start).then(|| &trimmed[start..=end])
}

/// 返答テキストを解析（失敗しない）
pub fn parse_reply(reply: &str, mode: Mode) -> AnalysisOutcome {
    let parsed = extract_json(reply).and_then(|json| serde_json::from_str::<Value>(json).ok());

    match parsed {
        Some(Value::Object(obj)) => {
            parse_shaped(&obj, reply, mode).unwrap_or_else(|| parse_generic(&obj, reply, mode))
        }
        _ => {
            debug!("{}: JSONとして解釈できないためテキストとして扱います", mode.id());
            parse_plain_text(reply, mode)
        }
    }
}

/// 1段目: モード固有の形状
///
/// 配列フィールドがない・配列でない場合は `None`（汎用JSONへ）。
/// 有効な要素が0件なら、タイトルはモード名、値は合計（カロリー・個数）か返答全体
fn parse_shaped(obj: &Object, raw: &str, mode: Mode) -> Option<AnalysisOutcome> {
    let explanation = coerce::text_or_default(obj, "explanation");

    let outcome = match mode.response_shape() {
        ResponseShape::Translation => return parse_translation(obj, raw),
        ResponseShape::WeightList => {
            let items = map_elements(obj, mode, weight_item)?;
            let Some(first) = items.first() else {
                return Some(empty_list(mode, raw.to_string(), explanation, raw));
            };
            AnalysisOutcome {
                title: first.name.clone(),
                value: format!("{} {}", first.weight, first.unit).trim_end().to_string(),
                detail: count_note(items.len(), "objects"),
                explanation,
                raw_text: raw.to_string(),
                payload: Payload::Weight(items),
                thumbnail: None,
            }
        }
        ResponseShape::DimensionList => {
            let items = map_elements(obj, mode, dimension_item)?;
            let Some(first) = items.first() else {
                return Some(empty_list(mode, raw.to_string(), explanation, raw));
            };
            AnalysisOutcome {
                title: first.name.clone(),
                value: first.formatted().trim_end().to_string(),
                detail: count_note(items.len(), "objects"),
                explanation,
                raw_text: raw.to_string(),
                payload: Payload::Dimensions(items),
                thumbnail: None,
            }
        }
        ResponseShape::CalorieList => {
            let items = map_elements(obj, mode, calorie_item)?;
            let total = saturating_total(items.iter().map(|i| i.calories));
            let value = format!("{} kcal", total);
            let Some(first) = items.first() else {
                return Some(empty_list(mode, value, explanation, raw));
            };
            // 1品目のみの場合は detail に分量を入れる
            let detail = if items.len() > 1 {
                count_note(items.len(), "food items")
            } else {
                first.portion.clone()
            };
            AnalysisOutcome {
                title: first.name.clone(),
                value,
                detail,
                explanation,
                raw_text: raw.to_string(),
                payload: Payload::Calories(items),
                thumbnail: None,
            }
        }
        ResponseShape::PlantList => {
            let items = map_elements(obj, mode, plant_item)?;
            let Some(first) = items.first() else {
                return Some(empty_list(mode, raw.to_string(), explanation, raw));
            };
            let detail = if items.len() > 1 {
                count_note(items.len(), "plants")
            } else {
                first.scientific_name.clone()
            };
            AnalysisOutcome {
                title: first.common_name.clone(),
                value: first.common_name.clone(),
                detail,
                explanation,
                raw_text: raw.to_string(),
                payload: Payload::PlantId(items),
                thumbnail: None,
            }
        }
        ResponseShape::ObjectCountList => {
            let items = map_elements(obj, mode, object_count_item)?;
            let total = saturating_total(items.iter().map(|i| i.count));
            let value = format!("{} object{}", total, if total == 1 { "" } else { "s" });
            let Some(first) = items.first() else {
                return Some(empty_list(mode, value, explanation, raw));
            };
            AnalysisOutcome {
                title: first.name.clone(),
                value,
                detail: count_note(items.len(), "types"),
                explanation,
                raw_text: raw.to_string(),
                payload: Payload::ObjectCount(items),
                thumbnail: None,
            }
        }
    };

    Some(outcome)
}

/// 認識できたが要素0件のリスト
fn empty_list(mode: Mode, value: String, explanation: String, raw: &str) -> AnalysisOutcome {
    AnalysisOutcome::generic(mode, mode.label(), value, "", explanation, raw)
}

/// 翻訳は単体オブジェクト。`translatedText` がなければ汎用JSONへ
fn parse_translation(obj: &Object, raw: &str) -> Option<AnalysisOutcome> {
    let translated_text = coerce::text(obj.get("translatedText"))?;
    let source_language = coerce::identifier(obj.get("sourceLanguage"))
        .unwrap_or_else(|| "Unknown".to_string());
    let notes = coerce::text_or_default(obj, "translationNotes");

    Some(AnalysisOutcome {
        title: "Translation".to_string(),
        value: translated_text.clone(),
        detail: format!("From {}", source_language),
        explanation: notes.clone(),
        raw_text: raw.to_string(),
        payload: Payload::Translate(Some(TranslationPayload {
            translated_text,
            source_language,
            notes,
            thumbnail: None,
        })),
        thumbnail: None,
    })
}

/// 配列フィールドの各要素を変換。必須フィールド欠落の要素は除外する
///
/// フィールドがない・配列でない場合のみ `None`
fn map_elements<T>(obj: &Object, mode: Mode, convert: fn(&Object) -> Option<T>) -> Option<Vec<T>> {
    let field = mode.response_shape().array_field()?;
    let elements = obj.get(field)?.as_array()?;

    let items: Vec<T> = elements
        .iter()
        .filter_map(Value::as_object)
        .filter_map(convert)
        .collect();

    let dropped = elements.len() - items.len();
    if dropped > 0 {
        warn!("{}: {}件の要素を必須フィールド欠落のため除外", mode.id(), dropped);
    }

    Some(items)
}

fn count_note(count: usize, noun: &str) -> String {
    if count > 1 {
        format!("{} {} detected", count, noun)
    } else {
        String::new()
    }
}

fn weight_item(obj: &Object) -> Option<WeightItem> {
    Some(WeightItem {
        name: coerce::identifier(obj.get("name"))?,
        weight: coerce::decimal_string(obj.get("weight"))?,
        unit: coerce::text(obj.get("unit"))?,
        thumbnail: None,
    })
}

fn dimension_item(obj: &Object) -> Option<DimensionItem> {
    Some(DimensionItem {
        name: coerce::identifier(obj.get("name"))?,
        length: coerce::decimal_string(obj.get("length"))?,
        width: coerce::decimal_string(obj.get("width"))?,
        height: coerce::decimal_string(obj.get("height"))?,
        unit: coerce::text(obj.get("unit"))?,
        thumbnail: None,
    })
}

fn calorie_item(obj: &Object) -> Option<CalorieItem> {
    Some(CalorieItem {
        name: coerce::identifier(obj.get("name"))?,
        portion: coerce::text_or_default(obj, "portion"),
        calories: coerce::integer(obj.get("calories")).unwrap_or(0),
        protein: coerce::decimal(obj.get("protein")).unwrap_or(0.0),
        carbs: coerce::decimal(obj.get("carbs")).unwrap_or(0.0),
        fat: coerce::decimal(obj.get("fat")).unwrap_or(0.0),
        thumbnail: None,
    })
}

fn plant_item(obj: &Object) -> Option<PlantItem> {
    Some(PlantItem {
        common_name: coerce::identifier(obj.get("commonName"))?,
        scientific_name: coerce::identifier(obj.get("scientificName"))?,
        description: coerce::text_or_default(obj, "description"),
        confidence: coerce::text(obj.get("confidence"))
            .map(|c| Confidence::parse_lenient(&c))
            .unwrap_or_default(),
        thumbnail: None,
    })
}

fn object_count_item(obj: &Object) -> Option<ObjectCountItem> {
    Some(ObjectCountItem {
        name: coerce::identifier(obj.get("name"))?,
        count: coerce::integer(obj.get("count")).unwrap_or(1),
        category: coerce::identifier(obj.get("category")).unwrap_or_else(|| "Other".to_string()),
        thumbnail: None,
    })
}

/// 2段目: 汎用JSON
fn parse_generic(obj: &Object, raw: &str, mode: Mode) -> AnalysisOutcome {
    AnalysisOutcome::generic(
        mode,
        coerce::text(obj.get("title")).unwrap_or_else(|| mode.label().to_string()),
        coerce::decimal_string(obj.get("value")).unwrap_or_else(|| raw.trim().to_string()),
        coerce::text_or_default(obj, "detail"),
        coerce::text_or_default(obj, "explanation"),
        raw,
    )
}

/// 3段目: プレーンテキスト
fn parse_plain_text(raw: &str, mode: Mode) -> AnalysisOutcome {
    AnalysisOutcome::generic(mode, mode.label(), raw.trim(), "", "", raw)
}
