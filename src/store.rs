//! 解析履歴のSQLite保存

use crate::error::{Result, ScanAiError};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};
use scan_ai_common::{Mode, PersistedRecord};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// 保存済みレコードの読み書き
pub trait RecordStore: Send + Sync {
    fn insert(&self, record: &PersistedRecord) -> Result<()>;
    /// 新しい順
    fn list_recent(&self, limit: usize) -> Result<Vec<PersistedRecord>>;
    fn get(&self, id: &Uuid) -> Result<Option<PersistedRecord>>;
    /// 削除したら `true`
    fn delete(&self, id: &Uuid) -> Result<bool>;
}

const COLUMNS: &str =
    "id, created_at, mode, title, value, detail, explanation, thumbnail, payload";

/// SQLiteストレージ（scan_records）
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// 新規接続（親ディレクトリがなければ作成）
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)
            .map_err(|e| ScanAiError::Storage(format!("DB接続に失敗: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        debug!("履歴DB: {}", path.display());
        Ok(store)
    }

    /// in-memory DB（テスト用）
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ScanAiError::Storage(format!("in-memory DB作成に失敗: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ScanAiError::Storage("DB接続のロックに失敗".to_string()))
    }

    /// スキーママイグレーション
    fn migrate(&self) -> Result<()> {
        self.conn()?
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS scan_records (
                    id          TEXT PRIMARY KEY,
                    created_at  TEXT NOT NULL,
                    mode        TEXT NOT NULL,
                    title       TEXT NOT NULL DEFAULT '',
                    value       TEXT NOT NULL DEFAULT '',
                    detail      TEXT NOT NULL DEFAULT '',
                    explanation TEXT NOT NULL DEFAULT '',
                    thumbnail   BLOB,
                    payload     BLOB
                );

                CREATE INDEX IF NOT EXISTS idx_scan_records_created
                    ON scan_records(created_at DESC);
                ",
            )
            .map_err(|e| ScanAiError::Storage(format!("マイグレーション失敗: {e}")))?;
        Ok(())
    }
}

impl RecordStore for SqliteRecordStore {
    fn insert(&self, record: &PersistedRecord) -> Result<()> {
        self.conn()?
            .execute(
                "INSERT INTO scan_records (id, created_at, mode, title, value, detail, explanation, thumbnail, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.id.to_string(),
                    format_timestamp(&record.created_at),
                    record.mode.id(),
                    record.title,
                    record.value,
                    record.detail,
                    record.explanation,
                    record.thumbnail,
                    record.payload,
                ],
            )
            .map_err(|e| ScanAiError::Storage(format!("レコード挿入失敗: {e}")))?;
        Ok(())
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<PersistedRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {COLUMNS} FROM scan_records ORDER BY created_at DESC, rowid DESC LIMIT ?1"
            ))
            .map_err(|e| ScanAiError::Storage(format!("クエリ準備失敗: {e}")))?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![limit], RawRecord::from_row)
            .map_err(|e| ScanAiError::Storage(format!("履歴取得失敗: {e}")))?;

        let mut records = Vec::new();
        for row in rows {
            let raw = row.map_err(|e| ScanAiError::Storage(format!("行読み取り失敗: {e}")))?;
            records.push(raw.into_record()?);
        }
        Ok(records)
    }

    fn get(&self, id: &Uuid) -> Result<Option<PersistedRecord>> {
        let raw = self
            .conn()?
            .query_row(
                &format!("SELECT {COLUMNS} FROM scan_records WHERE id = ?1"),
                params![id.to_string()],
                RawRecord::from_row,
            )
            .optional()
            .map_err(|e| ScanAiError::Storage(format!("レコード取得失敗: {e}")))?;

        raw.map(RawRecord::into_record).transpose()
    }

    fn delete(&self, id: &Uuid) -> Result<bool> {
        let affected = self
            .conn()?
            .execute(
                "DELETE FROM scan_records WHERE id = ?1",
                params![id.to_string()],
            )
            .map_err(|e| ScanAiError::Storage(format!("レコード削除失敗: {e}")))?;
        if affected > 0 {
            info!("履歴から削除: {}", id);
        }
        Ok(affected > 0)
    }
}

/// 固定幅（マイクロ秒・Z）で保存し、文字列順 = 時刻順にする
fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// DBの1行（変換前）
struct RawRecord {
    id: String,
    created_at: String,
    mode: String,
    title: String,
    value: String,
    detail: String,
    explanation: String,
    thumbnail: Option<Vec<u8>>,
    payload: Option<Vec<u8>>,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: row.get(1)?,
            mode: row.get(2)?,
            title: row.get(3)?,
            value: row.get(4)?,
            detail: row.get(5)?,
            explanation: row.get(6)?,
            thumbnail: row.get(7)?,
            payload: row.get(8)?,
        })
    }

    fn into_record(self) -> Result<PersistedRecord> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| ScanAiError::Storage(format!("不正なID '{}': {e}", self.id)))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| ScanAiError::Storage(format!("不正な日時 '{}': {e}", self.created_at)))?
            .with_timezone(&Utc);
        let mode = self.mode.parse::<Mode>().unwrap_or_else(|_| {
            warn!("未知のモード '{}' を weight として読み込みます", self.mode);
            Mode::Weight
        });

        Ok(PersistedRecord {
            id,
            created_at,
            mode,
            title: self.title,
            value: self.value,
            detail: self.detail,
            explanation: self.explanation,
            thumbnail: self.thumbnail,
            payload: self.payload,
        })
    }
}
