//! リストとアーカイブの間のアイテム移動

use super::models::{Item, ListType};
use super::tree;
use crate::features::homes::models::Home;
use crate::shared::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 削除系操作の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RemovalKind {
    /// アーカイブへの移動（復元可能）
    Archive,
    ClearCompleted,
    PermanentDelete,
    ClearList,
    DeleteArchived,
    ClearArchive,
}

impl RemovalKind {
    /// 元に戻せる操作かどうか
    pub fn is_reversible(&self) -> bool {
        matches!(self, RemovalKind::Archive)
    }

    /// 実行前にユーザーの確認が必要かどうか
    pub fn requires_confirmation(&self) -> bool {
        !self.is_reversible()
    }
}

impl fmt::Display for RemovalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RemovalKind::Archive => "アーカイブ",
            RemovalKind::ClearCompleted => "完了済みの削除",
            RemovalKind::PermanentDelete => "完全削除",
            RemovalKind::ClearList => "リストの全削除",
            RemovalKind::DeleteArchived => "アーカイブからの削除",
            RemovalKind::ClearArchive => "アーカイブの全削除",
        };
        f.write_str(label)
    }
}

/// アイテムを部分木ごとアーカイブに移す
pub fn archive_item(home: &mut Home, list_type: ListType, item_id: &str) -> AppResult<()> {
    let list = std::mem::take(home.list_mut(list_type));
    let (list, removed) = tree::remove_by_id(list, item_id);
    *home.list_mut(list_type) = list;

    let mut item = removed.ok_or_else(|| AppError::not_found("アイテム"))?;
    item.original_list = Some(list_type);
    home.archived_items.push(item);
    Ok(())
}

/// アーカイブから元のリストへ戻す
///
/// 元のリストが不明な場合はタスクリストに戻す。
///
/// # 戻り値
/// 戻した先のリスト
pub fn restore_item(home: &mut Home, item_id: &str) -> AppResult<ListType> {
    let mut item = take_archived(home, item_id)?;
    let destination = item.original_list.take().unwrap_or(ListType::Tasks);
    home.list_mut(destination).push(item);
    Ok(destination)
}

/// アーカイブのアイテムを完全に削除する
pub fn delete_archived_item(home: &mut Home, item_id: &str) -> AppResult<Item> {
    take_archived(home, item_id)
}

/// アーカイブを空にする
pub fn clear_archive(home: &mut Home) -> usize {
    std::mem::take(&mut home.archived_items).len()
}

fn take_archived(home: &mut Home, item_id: &str) -> AppResult<Item> {
    let position = home
        .archived_items
        .iter()
        .position(|item| item.id == item_id)
        .ok_or_else(|| AppError::not_found("アーカイブのアイテム"))?;
    Ok(home.archived_items.remove(position))
}
