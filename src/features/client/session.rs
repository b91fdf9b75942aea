use super::api_client::HomeApi;
use super::notify::{Notification, Notifier};
use super::store::HomeStore;
use crate::features::homes::models::{CreateHomeDto, Home, LoginDto};
use crate::shared::errors::{AppError, AppResult};
use std::sync::Arc;

/// ログイン状態（アクティブなホーム）を管理する
#[derive(Clone)]
pub struct SessionStore {
    api: Arc<dyn HomeApi>,
    store: Arc<HomeStore>,
    notifier: Arc<dyn Notifier>,
}

impl SessionStore {
    pub fn new(api: Arc<dyn HomeApi>, store: Arc<HomeStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            store,
            notifier,
        }
    }

    pub fn active_home(&self) -> Option<Home> {
        self.store.current()
    }

    pub fn is_logged_in(&self) -> bool {
        self.store.home_id().is_some()
    }

    /// ホームを作成してそのままログインする
    pub async fn create_home(&self, dto: CreateHomeDto) -> AppResult<Home> {
        let _loading = self.store.begin_loading();
        let home = self.api.create_home(&dto).await.map_err(|e| self.report(e))?;
        self.store.replace(home.clone())?;
        log::info!("ホームを作成しました: id={}", home.id);
        Ok(home)
    }

    pub async fn login(&self, dto: LoginDto) -> AppResult<Home> {
        let _loading = self.store.begin_loading();
        let home = self.api.login(&dto).await.map_err(|e| self.report(e))?;
        self.store.replace(home.clone())?;
        log::info!("ログインしました: id={}", home.id);
        Ok(home)
    }

    pub fn logout(&self) -> AppResult<()> {
        self.store.clear()?;
        log::info!("ログアウトしました");
        Ok(())
    }

    /// 保存されたホームを復元し、サーバーで再検証する
    ///
    /// サーバーにホームが存在しなければ保存された状態を破棄する。
    /// 通信できない場合は保存されたコピーを使い続ける。
    pub async fn restore(&self) -> AppResult<Option<Home>> {
        let Some(persisted) = self.store.load_persisted()? else {
            return Ok(None);
        };
        self.store.replace(persisted.home)?;

        let _loading = self.store.begin_loading();
        match self.api.get_home(&persisted.active_home_id).await {
            Ok(home) => {
                self.store.replace(home.clone())?;
                log::info!("保存されたホームを再検証しました: id={}", home.id);
                Ok(Some(home))
            }
            Err(AppError::NotFound(_)) | Err(AppError::Unauthorized(_)) => {
                log::warn!(
                    "保存されたホームがサーバーに存在しません: id={}",
                    persisted.active_home_id
                );
                self.store.clear()?;
                self.notifier
                    .notify(Notification::info("ホームが見つかりません。再度ログインしてください"));
                Ok(None)
            }
            Err(e) => {
                log::warn!("ホームを再検証できませんでした: {}", e.details());
                self.notifier.notify(Notification::error(e.user_message()));
                Ok(self.store.current())
            }
        }
    }

    /// サーバーから最新のホームを取得する
    pub async fn refresh(&self) -> AppResult<Home> {
        let home_id = self
            .store
            .home_id()
            .ok_or_else(|| AppError::validation("ホームが選択されていません"))?;
        let _loading = self.store.begin_loading();
        let home = self.api.get_home(&home_id).await.map_err(|e| self.report(e))?;
        self.store.replace(home.clone())?;
        Ok(home)
    }

    fn report(&self, error: AppError) -> AppError {
        self.notifier.notify(Notification::error(error.user_message()));
        error
    }
}
