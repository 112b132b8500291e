//! 履歴保存テスト
//!
//! 応答パース → レコード化 → SQLite保存 → 復元 の一連を検証

use scan_ai::pipeline;
use scan_ai::store::{RecordStore, SqliteRecordStore};
use scan_ai_common::{parse_reply, Mode, Thumbnail};
use std::sync::Arc;
use tempfile::tempdir;

fn calorie_outcome() -> scan_ai_common::AnalysisOutcome {
    let reply = r#"{"items":[
        {"name":"Rice","portion":"1 cup","calories":200,"protein":4,"carbs":45,"fat":0.5},
        {"name":"Chicken","portion":"100g","calories":165,"protein":31,"carbs":0,"fat":3.6}
    ],"explanation":"Estimated from plate size"}"#;
    let mut outcome = parse_reply(reply, Mode::Calories);
    outcome.attach_thumbnail(Some(Thumbnail::from(vec![0xFF, 0xD8, 0xFF, 0xD9])));
    outcome
}

/// ファイルDBに保存し、開き直しても読める
#[test]
fn test_save_and_reopen() {
    let dir = tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("nested").join("history.sqlite3");

    let outcome = calorie_outcome();
    let id = {
        let store = SqliteRecordStore::open(&db_path).unwrap();
        pipeline::save(&store, &outcome).unwrap().id
    };

    let store = SqliteRecordStore::open(&db_path).unwrap();
    let record = store.get(&id).unwrap().expect("record exists");
    assert_eq!(record.mode, Mode::Calories);
    assert_eq!(record.value, "365 kcal");
    assert_eq!(record.explanation, "Estimated from plate size");

    let restored = record.to_outcome();
    assert_eq!(restored.calorie_items().len(), 2);
    assert_eq!(restored.total_calories(), 365);
    assert_eq!(restored.calorie_items()[1].name, "Chicken");
    assert!(restored.raw_text.is_empty());

    // サムネイルは全要素で1つを共有
    let thumb = restored.thumbnail.clone().expect("thumbnail");
    assert_eq!(&thumb[..], &[0xFF, 0xD8, 0xFF, 0xD9]);
    for item in restored.calorie_items() {
        assert!(Arc::ptr_eq(item.thumbnail.as_ref().unwrap(), &thumb));
    }
}

/// 一覧は新しい順・件数制限あり
#[test]
fn test_history_order_and_limit() {
    let store = SqliteRecordStore::open_in_memory().unwrap();

    let replies = [
        (Mode::Weight, r#"{"objects":[{"name":"Apple","weight":"150","unit":"g"}]}"#),
        (Mode::PlantId, r#"{"plants":[{"commonName":"Monstera","scientificName":"Monstera deliciosa"}]}"#),
        (Mode::ObjectCount, r#"{"objects":[{"name":"Coin","count":5}]}"#),
    ];

    let mut ids = Vec::new();
    for (mode, reply) in replies {
        let record = pipeline::save(&store, &parse_reply(reply, mode)).unwrap();
        ids.push(record.id);
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    let recent = store.list_recent(10).unwrap();
    let listed: Vec<_> = recent.iter().map(|r| r.id).collect();
    assert_eq!(listed, ids.iter().rev().copied().collect::<Vec<_>>());
    assert_eq!(recent[0].summary(), "5 objects");
    assert_eq!(recent[1].summary(), "Monstera");
    assert_eq!(recent[2].summary(), "150 g");

    assert_eq!(store.list_recent(2).unwrap().len(), 2);
}

/// 翻訳の一覧表示は翻訳文の先頭60文字
#[test]
fn test_translation_summary_truncated() {
    let store = SqliteRecordStore::open_in_memory().unwrap();
    let long_text = "a".repeat(80);
    let reply = format!(
        r#"{{"translatedText":"{}","sourceLanguage":"Spanish","translationNotes":""}}"#,
        long_text
    );

    pipeline::save(&store, &parse_reply(&reply, Mode::Translate)).unwrap();

    let record = store.list_recent(1).unwrap().remove(0);
    let summary = record.summary();
    assert_eq!(summary, format!("{}…", "a".repeat(60)));

    let restored = record.to_outcome();
    assert_eq!(restored.translation().unwrap().source_language, "Spanish");
}

/// 削除
#[test]
fn test_delete_record() {
    let store = SqliteRecordStore::open_in_memory().unwrap();
    let reply = r#"{"objects":[{"name":"Box","length":"10","width":"5","height":"3","unit":"in"}]}"#;
    let record = pipeline::save(&store, &parse_reply(reply, Mode::Dimensions)).unwrap();

    assert!(store.delete(&record.id).unwrap());
    assert!(store.get(&record.id).unwrap().is_none());
    assert!(store.list_recent(10).unwrap().is_empty());
}

/// ペイロードのない汎用結果も保存できる
#[test]
fn test_save_generic_outcome() {
    let store = SqliteRecordStore::open_in_memory().unwrap();
    let outcome = parse_reply("I cannot tell the weight from this photo.", Mode::Weight);
    let record = pipeline::save(&store, &outcome).unwrap();
    assert!(record.payload.is_none());

    let loaded = store.get(&record.id).unwrap().unwrap();
    let restored = loaded.to_outcome();
    assert_eq!(restored.title, "Digital Scale");
    assert!(restored.payload.is_empty());
}
