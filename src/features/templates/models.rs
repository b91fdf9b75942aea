use crate::features::lists::models::ListType;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::{validate_required_field, validate_text_length};
use serde::{Deserialize, Serialize};

/// テンプレート名の最大文字数
pub const MAX_TEMPLATE_NAME_LENGTH: usize = 100;

/// テンプレートに含まれるアイテム
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateItem {
    pub text: String,
    #[serde(default)]
    pub created_by: String,
}

/// 名前付きのアイテム一覧プリセット
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    #[serde(rename = "type")]
    pub list_type: ListType,
    #[serde(default)]
    pub items: Vec<TemplateItem>,
}

/// テンプレート保存用DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTemplateDto {
    pub name: String,
    #[serde(rename = "type")]
    pub list_type: ListType,
    /// 省略時は対象リストのルートアイテムから作成する
    #[serde(default)]
    pub items: Option<Vec<TemplateItem>>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl SaveTemplateDto {
    pub fn validate(&self) -> AppResult<()> {
        validate_required_field(&self.name, "テンプレート名")?;
        validate_text_length(self.name.trim(), MAX_TEMPLATE_NAME_LENGTH, "テンプレート名")?;
        if let Some(ref items) = self.items {
            if items.iter().any(|item| item.text.trim().is_empty()) {
                return Err(AppError::validation(
                    "テンプレートのアイテムのテキストは必須項目です",
                ));
            }
        }
        Ok(())
    }
}
