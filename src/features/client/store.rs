//! クライアント側のホーム状態
//!
//! サーバーが正とするホームのローカルコピーを保持し、楽観的更新のための
//! スナップショットと復元、読み込み中フラグを提供する。

use super::persistence::{PersistedState, StateFile};
use crate::features::homes::models::Home;
use crate::shared::errors::{AppError, AppResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// 楽観的更新の直前に取得したホームの複製
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot(Option<Home>);

/// ホーム状態のコンテナ
#[derive(Debug, Default)]
pub struct HomeStore {
    home: Mutex<Option<Home>>,
    pending: AtomicUsize,
    state_file: Option<StateFile>,
}

/// 読み込み中フラグのガード（ドロップ時に必ず解除する）
#[derive(Debug)]
pub struct LoadingGuard<'a> {
    pending: &'a AtomicUsize,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

impl HomeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 置き換えのたびに状態ファイルへ保存するストア
    pub fn with_state_file(state_file: StateFile) -> Self {
        Self {
            state_file: Some(state_file),
            ..Self::default()
        }
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Option<Home>>> {
        self.home
            .lock()
            .map_err(|e| AppError::concurrency(format!("ホーム状態のロック取得失敗: {e}")))
    }

    /// 現在のホームの複製
    pub fn current(&self) -> Option<Home> {
        self.lock().ok().and_then(|home| home.clone())
    }

    pub fn home_id(&self) -> Option<String> {
        self.lock()
            .ok()
            .and_then(|home| home.as_ref().map(|h| h.id.clone()))
    }

    /// サーバーから受け取ったホームで丸ごと置き換える
    pub fn replace(&self, home: Home) -> AppResult<()> {
        let persisted = PersistedState {
            active_home_id: home.id.clone(),
            home: home.clone(),
        };
        *self.lock()? = Some(home);

        if let Some(ref file) = self.state_file {
            // 保存の失敗で画面の状態は巻き戻さない
            if let Err(e) = file.save(&persisted) {
                log::warn!("クライアント状態の保存に失敗しました: {}", e.details());
            }
        }
        Ok(())
    }

    /// ホームを破棄し、保存された状態も削除する
    pub fn clear(&self) -> AppResult<()> {
        *self.lock()? = None;
        if let Some(ref file) = self.state_file {
            file.clear()?;
        }
        Ok(())
    }

    /// 保存された状態を読み込む
    pub fn load_persisted(&self) -> AppResult<Option<PersistedState>> {
        match self.state_file {
            Some(ref file) => file.load(),
            None => Ok(None),
        }
    }

    pub fn snapshot(&self) -> AppResult<Snapshot> {
        Ok(Snapshot(self.lock()?.clone()))
    }

    /// スナップショットを取得してから変更を適用する
    ///
    /// 変更が失敗した場合はスナップショットの状態に戻してからエラーを返す。
    pub fn apply<F, T>(&self, mutation: F) -> AppResult<(Snapshot, T)>
    where
        F: FnOnce(&mut Home) -> AppResult<T>,
    {
        let mut guard = self.lock()?;
        let snapshot = Snapshot(guard.clone());
        let home = guard
            .as_mut()
            .ok_or_else(|| AppError::validation("ホームが選択されていません"))?;

        match mutation(home) {
            Ok(value) => Ok((snapshot, value)),
            Err(e) => {
                *guard = snapshot.0;
                Err(e)
            }
        }
    }

    /// スナップショットの状態にそのまま戻す
    pub fn rollback(&self, snapshot: Snapshot) -> AppResult<()> {
        *self.lock()? = snapshot.0;
        log::debug!("楽観的更新を取り消しました");
        Ok(())
    }

    pub fn is_loading(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    pub fn begin_loading(&self) -> LoadingGuard<'_> {
        self.pending.fetch_add(1, Ordering::SeqCst);
        LoadingGuard {
            pending: &self.pending,
        }
    }
}
