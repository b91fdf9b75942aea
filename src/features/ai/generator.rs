use crate::features::lists::models::{CreateItemDto, ListType};
use crate::shared::config::AiConfig;
use crate::shared::errors::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// AIが生成する入れ子のアイテム
pub type GeneratedNode = CreateItemDto;

/// 変換の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PromptKind {
    /// レシピから買い物リストを作る
    Recipe,
    /// タスクを手順に分解する
    TaskBreakdown,
}

impl PromptKind {
    /// 生成結果を追加するリスト
    pub fn target_list(&self) -> ListType {
        match self {
            PromptKind::Recipe => ListType::Shopping,
            PromptKind::TaskBreakdown => ListType::Tasks,
        }
    }
}

/// AIサービスへの入力
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiPrompt {
    pub kind: PromptKind,
    pub text: String,
}

/// テキストから入れ子のアイテムを生成する
#[async_trait]
pub trait ItemTreeGenerator: Send + Sync {
    async fn generate_item_tree(&self, prompt: &AiPrompt) -> AppResult<GeneratedNode>;
}

/// HTTP経由のAIサービス
///
/// `{kind, text}` をPOSTし、アイテムのJSONを受け取る。リトライはしない。
pub struct HttpItemTreeGenerator {
    client: Client,
    service_url: String,
}

impl HttpItemTreeGenerator {
    pub fn new(service_url: impl Into<String>, timeout_seconds: u64) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| AppError::configuration(format!("HTTPクライアント初期化失敗: {e}")))?;

        Ok(Self {
            client,
            service_url: service_url.into(),
        })
    }
}

#[async_trait]
impl ItemTreeGenerator for HttpItemTreeGenerator {
    async fn generate_item_tree(&self, prompt: &AiPrompt) -> AppResult<GeneratedNode> {
        log::debug!("AIサービスへリクエスト送信: kind={:?}", prompt.kind);

        let response = self
            .client
            .post(&self.service_url)
            .json(prompt)
            .send()
            .await
            .map_err(|e| AppError::external_service("AIサービス".to_string(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("AIサービスがエラーを返しました: status={status}, body={body}");
            return Err(AppError::external_service(
                "AIサービス".to_string(),
                format!("ステータス {status}"),
            ));
        }

        let node: GeneratedNode = response.json().await.map_err(|e| {
            AppError::external_service("AIサービス".to_string(), format!("レスポンス解析エラー: {e}"))
        })?;

        node.validate().map_err(|e| {
            AppError::external_service(
                "AIサービス".to_string(),
                format!("不正な生成結果: {}", e.details()),
            )
        })?;

        log::info!(
            "AIサービスが{}個の子アイテムを生成しました",
            node.sub_items.len()
        );
        Ok(node)
    }
}

/// AIサービスが設定されていない場合の実装
pub struct DisabledGenerator;

#[async_trait]
impl ItemTreeGenerator for DisabledGenerator {
    async fn generate_item_tree(&self, _prompt: &AiPrompt) -> AppResult<GeneratedNode> {
        Err(AppError::external_service(
            "AIサービス",
            "AI_SERVICE_URLが設定されていません",
        ))
    }
}

/// 設定に応じた生成器を作成する
pub fn generator_from_config(config: &AiConfig) -> AppResult<Arc<dyn ItemTreeGenerator>> {
    match config.service_url {
        Some(ref url) => {
            url::Url::parse(url)
                .map_err(|e| AppError::configuration(format!("AI_SERVICE_URLが不正です: {e}")))?;
            log::info!("AIサービスを有効化しました: {url}");
            Ok(Arc::new(HttpItemTreeGenerator::new(
                url.clone(),
                config.timeout_seconds,
            )?))
        }
        None => {
            log::info!("AIサービスは無効です");
            Ok(Arc::new(DisabledGenerator))
        }
    }
}
