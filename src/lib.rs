// 機能モジュール構造
pub mod features;
pub mod shared;

use features::ai::generator::{generator_from_config, ItemTreeGenerator};
use log::info;
use rusqlite::Connection;
use shared::config::environment::{
    initialize_logging_system, load_environment_variables, AiConfig, ServerConfig,
};
use shared::database::{initialize_database, initialize_in_memory_database};
use shared::errors::AppResult;
use std::sync::{Arc, Mutex};

/// アプリケーション状態（データベース接続・設定・AI生成器を保持）
pub struct AppState {
    pub db: Mutex<Connection>,
    pub config: ServerConfig,
    pub ai: Arc<dyn ItemTreeGenerator>,
}

impl AppState {
    pub fn new(db: Connection, config: ServerConfig, ai: Arc<dyn ItemTreeGenerator>) -> Self {
        Self {
            db: Mutex::new(db),
            config,
            ai,
        }
    }

    /// インメモリデータベースを使う状態を作成する
    pub fn in_memory(config: ServerConfig, ai: Arc<dyn ItemTreeGenerator>) -> AppResult<Self> {
        Ok(Self::new(initialize_in_memory_database()?, config, ai))
    }
}

/// サーバーを起動し、Ctrl+Cで停止するまで待ち受ける
pub async fn run() -> AppResult<()> {
    // 環境変数を読み込み（.envファイルがある場合）
    load_environment_variables();

    // ログシステムを初期化
    initialize_logging_system();

    info!("アプリケーション初期化を開始します...");

    let config = ServerConfig::from_env()?;
    let ai_config = AiConfig::from_env();
    let ai = generator_from_config(&ai_config)?;

    info!("データベースを初期化しています...");
    let db = initialize_database(&config.database_path)?;
    info!("データベースの初期化が完了しました");

    let addr = config.socket_addr()?;
    let state = Arc::new(AppState::new(db, config, ai));

    let listener = features::server::bind(addr).await?;
    info!("アプリケーション初期化が完了しました");

    features::server::serve(state, listener, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("終了シグナルの待機に失敗しました: {e}");
        }
    })
    .await
}

/// テスト用のアプリケーション状態（インメモリDB・AI無効）
#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    AppState::in_memory(
        ServerConfig::default(),
        Arc::new(features::ai::generator::DisabledGenerator),
    )
    .unwrap()
}

/// テスト用のホームを作成する（アクセスコード「4321」、初期ユーザー「Dana」）
#[cfg(test)]
pub(crate) fn create_test_home(state: &AppState, name: &str) -> features::homes::models::Home {
    features::homes::commands::create_home(
        state,
        features::homes::models::CreateHomeDto {
            name: name.to_string(),
            access_code: "4321".to_string(),
            initial_user_name: "Dana".to_string(),
            icon_class: None,
            color_class: None,
            currency: None,
        },
    )
    .unwrap()
}
