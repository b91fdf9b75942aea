use super::generator::{AiPrompt, PromptKind};
use crate::features::homes::commands::{get_home, mutate_home};
use crate::features::homes::models::Home;
use crate::features::lists::engine;
use crate::shared::errors::AppResult;
use crate::shared::utils::{validate_required_field, validate_text_length};
use crate::AppState;
use serde::{Deserialize, Serialize};

/// AIに渡すテキストの最大文字数
pub const MAX_PROMPT_LENGTH: usize = 4000;

/// AI変換リクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiTextDto {
    pub text: String,
}

/// レシピのテキストから買い物アイテムを作成し、買い物リストに追加する
pub async fn transform_recipe(state: &AppState, home_id: &str, dto: AiTextDto) -> AppResult<Home> {
    generate_into_list(state, home_id, PromptKind::Recipe, dto).await
}

/// タスクを手順に分解し、タスクリストに追加する
pub async fn breakdown_task(state: &AppState, home_id: &str, dto: AiTextDto) -> AppResult<Home> {
    generate_into_list(state, home_id, PromptKind::TaskBreakdown, dto).await
}

/// 生成中はデータベースロックを保持しない
async fn generate_into_list(
    state: &AppState,
    home_id: &str,
    kind: PromptKind,
    dto: AiTextDto,
) -> AppResult<Home> {
    validate_required_field(&dto.text, "テキスト")?;
    validate_text_length(&dto.text, MAX_PROMPT_LENGTH, "テキスト")?;

    // 存在しないホームに対してAIを呼ばない
    get_home(state, home_id)?;

    let prompt = AiPrompt {
        kind,
        text: dto.text.trim().to_string(),
    };
    let node = state.ai.generate_item_tree(&prompt).await.map_err(|e| {
        log::error!("AI生成に失敗しました: home={home_id}, error={}", e.details());
        e
    })?;

    let list_type = kind.target_list();
    mutate_home(state, home_id, |home| {
        let id = engine::add_item(home, list_type, node)?;
        log::info!("AI生成アイテムを追加しました: home={}, list={list_type}, id={id}", home.id);
        Ok(())
    })
}
