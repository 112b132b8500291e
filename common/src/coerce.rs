//! 寛容な型変換
//!
//! モデルは数値を数値でも文字列でも返すため、
//! スカラー型ごとに1つの変換関数を用意して全パーサーで共用する

use serde_json::{Map, Value};

/// 文字列フィールド（数値は受け付けない）
pub fn text(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

/// 識別用の文字列フィールド（空白のみは欠落扱い）
pub fn identifier(value: Option<&Value>) -> Option<String> {
    text(value)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// 10進数を文字列で保持するフィールド
///
/// 数値は整数値なら小数点なしで文字列化する（150.0 → "150"）
pub fn decimal_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().map(format_decimal)
            }
        }
        _ => None,
    }
}

/// 整数フィールド（小数は四捨五入、数値文字列も可）
pub fn integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<i64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.round() as i64)
            })
        }
        _ => None,
    }
}

/// 小数フィールド（数値文字列も可）
pub fn decimal(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// オブジェクトから文字列フィールドを取得（欠落時は空文字）
pub fn text_or_default(obj: &Map<String, Value>, key: &str) -> String {
    text(obj.get(key)).unwrap_or_default()
}

fn format_decimal(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
