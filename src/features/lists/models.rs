use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::{deserialize_flexible_id, generate_item_id, validate_required_field};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// 既定カテゴリ（削除不可）
pub const GENERAL_CATEGORY: &str = "general";

/// 担当者が特定のユーザーでないことを表す値
pub const SHARED_ASSIGNEE: &str = "shared";

/// リストの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    Shopping,
    Tasks,
}

impl ListType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListType::Shopping => "shopping",
            ListType::Tasks => "tasks",
        }
    }
}

impl fmt::Display for ListType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shopping" => Ok(ListType::Shopping),
            "tasks" => Ok(ListType::Tasks),
            other => Err(AppError::validation(format!(
                "リストの種類は'shopping'または'tasks'である必要があります: {other}"
            ))),
        }
    }
}

/// 買い物・タスクのアイテム（子アイテムを持てる）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(deserialize_with = "deserialize_flexible_id")]
    pub id: String,
    pub text: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub is_urgent: bool,
    #[serde(default = "default_assignee")]
    pub assigned_to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub sub_items: Vec<Item>,
    /// アーカイブ中のみ設定される元のリスト
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_lenient_list_type"
    )]
    pub original_list: Option<ListType>,
}

impl Item {
    /// 既定値を持つ新しいアイテムを作成する
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            category: default_category(),
            completed: false,
            is_urgent: false,
            assigned_to: default_assignee(),
            comment: None,
            sub_items: Vec::new(),
            original_list: None,
        }
    }

    /// 子アイテムを持つフォルダを作成する
    pub fn folder(id: impl Into<String>, text: impl Into<String>, sub_items: Vec<Item>) -> Self {
        Self {
            sub_items,
            ..Self::new(id, text)
        }
    }

    pub fn is_folder(&self) -> bool {
        !self.sub_items.is_empty()
    }

    /// 自身とすべての子孫の完了状態を設定する
    pub fn set_completed_recursive(&mut self, completed: bool) {
        self.completed = completed;
        for child in &mut self.sub_items {
            child.set_completed_recursive(completed);
        }
    }

    /// 自身を含む部分木のノード数
    pub fn node_count(&self) -> usize {
        1 + self.sub_items.iter().map(Item::node_count).sum::<usize>()
    }
}

fn default_category() -> String {
    GENERAL_CATEGORY.to_string()
}

fn default_assignee() -> String {
    SHARED_ASSIGNEE.to_string()
}

/// 未知のリスト名は「タグなし」として読み込む（復元時はタスクリストへ戻る）
fn deserialize_lenient_list_type<'de, D>(deserializer: D) -> Result<Option<ListType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.parse().ok()))
}

/// アイテム作成用DTO（AIが生成した入れ子構造もそのまま受け付ける）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemDto {
    pub text: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub is_urgent: Option<bool>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub sub_items: Vec<CreateItemDto>,
}

impl CreateItemDto {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// すべてのノードのテキストが空でないことを確認する
    pub fn validate(&self) -> AppResult<()> {
        validate_required_field(&self.text, "アイテムのテキスト")?;
        self.sub_items.iter().try_for_each(CreateItemDto::validate)
    }

    /// 自身とすべての子孫に新しいIDを割り当ててアイテムに変換する
    pub fn into_item(self) -> Item {
        self.into_item_with(&mut generate_item_id)
    }

    /// ID生成関数を指定してアイテムに変換する
    pub fn into_item_with<F>(self, next_id: &mut F) -> Item
    where
        F: FnMut() -> String,
    {
        let id = next_id();
        Item {
            id,
            text: self.text.trim().to_string(),
            category: self
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(default_category),
            completed: self.completed.unwrap_or(false),
            is_urgent: self.is_urgent.unwrap_or(false),
            assigned_to: self
                .assigned_to
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(default_assignee),
            comment: self.comment.filter(|c| !c.trim().is_empty()),
            sub_items: self
                .sub_items
                .into_iter()
                .map(|child| child.into_item_with(next_id))
                .collect(),
            original_list: None,
        }
    }
}

/// アイテム更新用DTO（指定されたフィールドのみ浅くマージする）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemDto {
    pub text: Option<String>,
    pub category: Option<String>,
    pub completed: Option<bool>,
    pub is_urgent: Option<bool>,
    pub assigned_to: Option<String>,
    /// 空文字列はコメントの削除
    pub comment: Option<String>,
}

impl UpdateItemDto {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(ref text) = self.text {
            validate_required_field(text, "アイテムのテキスト")?;
        }
        if let Some(ref category) = self.category {
            validate_required_field(category, "カテゴリ")?;
        }
        if let Some(ref assigned_to) = self.assigned_to {
            validate_required_field(assigned_to, "担当者")?;
        }
        Ok(())
    }

    /// 変更を適用する。完了状態は子孫にも伝播する。
    pub fn apply(&self, mut item: Item) -> Item {
        if let Some(ref text) = self.text {
            item.text = text.trim().to_string();
        }
        if let Some(ref category) = self.category {
            item.category = category.clone();
        }
        if let Some(is_urgent) = self.is_urgent {
            item.is_urgent = is_urgent;
        }
        if let Some(ref assigned_to) = self.assigned_to {
            item.assigned_to = assigned_to.clone();
        }
        if let Some(ref comment) = self.comment {
            item.comment = if comment.trim().is_empty() {
                None
            } else {
                Some(comment.clone())
            };
        }
        if let Some(completed) = self.completed {
            item.set_completed_recursive(completed);
        }
        item
    }
}

/// フォルダ化（グループ化）用DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupItemsDto {
    pub dragged_id: String,
    pub target_id: String,
    pub folder_name: String,
}
