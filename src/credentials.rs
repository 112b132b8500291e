//! APIキー保管
//!
//! 名前付きの秘密情報1件を get/set/delete する。
//! プロセス外（設定ディレクトリのファイル、所有者のみ読み書き可）に保存する

use crate::config::Config;
use crate::error::{Result, ScanAiError};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub const OPENAI_KEY_NAME: &str = "openai-api-key";

/// 環境変数が設定されていればファイルより優先する
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub trait CredentialStore: Send + Sync {
    /// 未設定なら `None`
    fn get(&self) -> Result<Option<String>>;
    fn set(&self, secret: &str) -> Result<()>;
    fn delete(&self) -> Result<()>;
}

/// JSONファイル保存（{名前: 値}）
pub struct FileCredentialStore {
    path: PathBuf,
    name: String,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// `~/.config/scan-ai/credentials.json` のOpenAIキー
    pub fn openai() -> Result<Self> {
        Ok(Self::new(Config::credentials_path()?, OPENAI_KEY_NAME))
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_all(&self, secrets: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path)?;
        file.write_all(serde_json::to_string_pretty(secrets)?.as_bytes())?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(&self.name))
    }

    fn set(&self, secret: &str) -> Result<()> {
        let mut secrets = self.read_all()?;
        secrets.insert(self.name.clone(), secret.to_string());
        self.write_all(&secrets)
    }

    fn delete(&self) -> Result<()> {
        let mut secrets = self.read_all()?;
        if secrets.remove(&self.name).is_some() {
            self.write_all(&secrets)?;
        }
        Ok(())
    }
}

/// メモリ保持（テスト・環境変数用）
#[derive(Default)]
pub struct MemoryCredentialStore {
    secret: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Mutex::new(Some(secret.into())),
        }
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.secret
            .lock()
            .map_err(|_| ScanAiError::Config("credential lock poisoned".into()))
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Option<String>> {
        Ok(self.slot()?.clone())
    }

    fn set(&self, secret: &str) -> Result<()> {
        *self.slot()? = Some(secret.to_string());
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        *self.slot()? = None;
        Ok(())
    }
}

/// 解析に使うキー保管先（環境変数 → ファイルの順）
pub fn default_store() -> Result<Arc<dyn CredentialStore>> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.trim().is_empty() {
            return Ok(Arc::new(MemoryCredentialStore::with_secret(key)));
        }
    }
    Ok(Arc::new(FileCredentialStore::openai()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_get_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"), OPENAI_KEY_NAME);
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_file_store_set_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("credentials.json");
        let store = FileCredentialStore::new(&path, OPENAI_KEY_NAME);

        store.set("sk-test").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("sk-test"));

        store.set("sk-other").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("sk-other"));

        store.delete().unwrap();
        assert_eq!(store.get().unwrap(), None);
        store.delete().unwrap();
    }

    #[test]
    fn test_file_store_names_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let openai = FileCredentialStore::new(&path, OPENAI_KEY_NAME);
        let other = FileCredentialStore::new(&path, "other");

        openai.set("sk-1").unwrap();
        other.set("xyz").unwrap();
        openai.delete().unwrap();

        assert_eq!(openai.get().unwrap(), None);
        assert_eq!(other.get().unwrap().as_deref(), Some("xyz"));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        FileCredentialStore::new(&path, OPENAI_KEY_NAME).set("sk").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.get().unwrap(), None);
        store.set("k").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("k"));
        store.delete().unwrap();
        assert_eq!(store.get().unwrap(), None);
    }
}
