use crate::features::homes::models::Home;
use crate::shared::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// アプリケーションディレクトリ名
const APP_DIR_NAME: &str = "household-hub";

/// 状態ファイル名
const STATE_FILE_NAME: &str = "client_state.json";

/// 再訪時にログインを省略するために保存する状態
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub active_home_id: String,
    pub home: Home,
}

/// クライアント状態のJSONファイル
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// ユーザー設定ディレクトリ配下の既定の場所
    pub fn default_location() -> AppResult<Self> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            AppError::configuration("ユーザー設定ディレクトリを取得できませんでした")
        })?;
        Ok(Self::new(config_dir.join(APP_DIR_NAME).join(STATE_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 保存された状態を読み込む
    ///
    /// ファイルがない場合と壊れている場合は `None` を返す。
    pub fn load(&self) -> AppResult<Option<PersistedState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&content) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                log::warn!("クライアント状態を読み込めませんでした: path={:?}, error={e}", self.path);
                Ok(None)
            }
        }
    }

    pub fn save(&self, state: &PersistedState) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
                log::info!("クライアント状態ディレクトリを作成しました: {parent:?}");
            }
        }
        let content = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, content)?;
        log::debug!("クライアント状態を保存しました: home={}", state.active_home_id);
        Ok(())
    }

    pub fn clear(&self) -> AppResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            log::debug!("クライアント状態を削除しました: {:?}", self.path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::homes::normalize::{normalize_home, RawHome};
    use tempfile::TempDir;

    fn state() -> PersistedState {
        let (mut home, _) = normalize_home(RawHome::default(), "₪");
        home.id = "home-1".to_string();
        home.name = "Levi".to_string();
        PersistedState {
            active_home_id: home.id.clone(),
            home,
        }
    }

    #[test]
    fn test_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let file = StateFile::new(dir.path().join("nested").join("state.json"));

        assert_eq!(file.load().unwrap(), None);

        file.save(&state()).unwrap();
        assert_eq!(file.load().unwrap(), Some(state()));

        let raw = fs::read_to_string(file.path()).unwrap();
        assert!(raw.contains("\"activeHomeId\""));

        file.clear().unwrap();
        assert!(!file.path().exists());
        file.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let file = StateFile::new(dir.path().join("state.json"));
        fs::write(file.path(), "{ not json").unwrap();

        assert_eq!(file.load().unwrap(), None);
    }
}
