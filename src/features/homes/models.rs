use crate::features::finances::models::Finances;
use crate::features::lists::models::{Item, ListType};
use crate::features::templates::models::Template;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::{validate_required_field, validate_text_length};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// アイコンの既定値
pub const DEFAULT_ICON_CLASS: &str = "fa-home";

/// 配色の既定値
pub const DEFAULT_COLOR_CLASS: &str = "bg-primary";

/// ホーム名の最大文字数
pub const MAX_HOME_NAME_LENGTH: usize = 100;

/// アクセスコードの最小文字数
pub const MIN_ACCESS_CODE_LENGTH: usize = 4;

/// ホームのメンバー
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl User {
    pub fn new(name: impl Into<String>, is_admin: bool) -> Self {
        Self {
            name: name.into(),
            is_admin,
        }
    }

    /// 大文字小文字を区別せずに名前を比較する
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

/// 1世帯分の集約
///
/// アクセスコードのハッシュは集約に含めず、ストアの列にのみ保存する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Home {
    pub id: String,
    pub name: String,
    pub icon_class: String,
    pub color_class: String,
    pub users: Vec<User>,
    pub shopping_list: Vec<Item>,
    pub tasks_list: Vec<Item>,
    pub archived_items: Vec<Item>,
    pub templates: Vec<Template>,
    pub list_categories: Vec<String>,
    pub finances: Finances,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Home {
    pub fn list(&self, list_type: ListType) -> &Vec<Item> {
        match list_type {
            ListType::Shopping => &self.shopping_list,
            ListType::Tasks => &self.tasks_list,
        }
    }

    pub fn list_mut(&mut self, list_type: ListType) -> &mut Vec<Item> {
        match list_type {
            ListType::Shopping => &mut self.shopping_list,
            ListType::Tasks => &mut self.tasks_list,
        }
    }

    pub fn find_user(&self, name: &str) -> Option<&User> {
        self.users.iter().find(|user| user.has_name(name))
    }

    pub fn admin_count(&self) -> usize {
        self.users.iter().filter(|user| user.is_admin).count()
    }
}

/// ホーム作成用DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHomeDto {
    pub name: String,
    pub access_code: String,
    pub initial_user_name: String,
    #[serde(default)]
    pub icon_class: Option<String>,
    #[serde(default)]
    pub color_class: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl CreateHomeDto {
    pub fn validate(&self) -> AppResult<()> {
        validate_required_field(&self.name, "ホーム名")?;
        validate_text_length(self.name.trim(), MAX_HOME_NAME_LENGTH, "ホーム名")?;
        validate_required_field(&self.initial_user_name, "ユーザー名")?;
        validate_access_code(&self.access_code)
    }
}

/// ログイン用DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginDto {
    pub name: String,
    pub access_code: String,
}

/// ホーム更新用DTO（指定されたフィールドのみ置き換える）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHomeDto {
    pub name: Option<String>,
    pub icon_class: Option<String>,
    pub color_class: Option<String>,
    pub list_categories: Option<Vec<String>>,
    pub templates: Option<Vec<Template>>,
}

impl UpdateHomeDto {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(ref name) = self.name {
            validate_required_field(name, "ホーム名")?;
            validate_text_length(name.trim(), MAX_HOME_NAME_LENGTH, "ホーム名")?;
        }
        if let Some(ref categories) = self.list_categories {
            for category in categories {
                validate_required_field(category, "カテゴリ")?;
            }
        }
        Ok(())
    }

    /// 指定されたフィールドをホームに反映する
    pub fn apply(self, home: &mut Home) {
        if let Some(name) = self.name {
            home.name = name.trim().to_string();
        }
        if let Some(icon_class) = self.icon_class {
            home.icon_class = icon_class;
        }
        if let Some(color_class) = self.color_class {
            home.color_class = color_class;
        }
        if let Some(list_categories) = self.list_categories {
            home.list_categories = list_categories
                .into_iter()
                .map(|c| c.trim().to_string())
                .collect();
        }
        if let Some(templates) = self.templates {
            home.templates = templates;
        }
    }
}

/// アクセスコードのバリデーション
pub fn validate_access_code(code: &str) -> AppResult<()> {
    validate_required_field(code, "アクセスコード")?;
    if code.chars().count() < MIN_ACCESS_CODE_LENGTH {
        return Err(AppError::validation(format!(
            "アクセスコードは{MIN_ACCESS_CODE_LENGTH}文字以上で入力してください"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_name_comparison_ignores_case() {
        let user = User::new("Dana", true);
        assert!(user.has_name("dana"));
        assert!(user.has_name(" DANA "));
        assert!(!user.has_name("Dan"));
    }

    #[test]
    fn test_create_home_dto_validation() {
        let mut dto = CreateHomeDto {
            name: "Levi family".to_string(),
            access_code: "1234".to_string(),
            initial_user_name: "Dana".to_string(),
            icon_class: None,
            color_class: None,
            currency: None,
        };
        assert!(dto.validate().is_ok());

        dto.access_code = "12".to_string();
        assert!(dto.validate().is_err());

        dto.access_code = "1234".to_string();
        dto.initial_user_name = "  ".to_string();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_update_home_dto_rejects_empty_category() {
        let dto = UpdateHomeDto {
            list_categories: Some(vec!["dairy".to_string(), "".to_string()]),
            ..UpdateHomeDto::default()
        };
        assert!(dto.validate().is_err());
    }
}
