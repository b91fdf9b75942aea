use crate::features::lists::models::SHARED_ASSIGNEE;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::{validate_required_field, validate_text_length};
use serde::{Deserialize, Serialize};

/// ユーザー名の最大文字数
pub const MAX_USER_NAME_LENGTH: usize = 50;

/// ユーザー追加用DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddUserDto {
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// ユーザー更新用DTO
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserDto {
    pub name: Option<String>,
    pub is_admin: Option<bool>,
}

/// ユーザー名のバリデーション
///
/// 担当者の既定値 `shared` と同じ名前は使えない。
pub fn validate_user_name(name: &str) -> AppResult<()> {
    validate_required_field(name, "ユーザー名")?;
    validate_text_length(name.trim(), MAX_USER_NAME_LENGTH, "ユーザー名")?;
    if name.trim().eq_ignore_ascii_case(SHARED_ASSIGNEE) {
        return Err(AppError::validation(format!(
            "「{SHARED_ASSIGNEE}」はユーザー名として使用できません"
        )));
    }
    Ok(())
}
