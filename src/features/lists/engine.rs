//! ホーム集約上のリスト操作（永続化を含まない）

use super::models::{CreateItemDto, GroupItemsDto, Item, ListType, UpdateItemDto};
use super::tree;
use crate::features::homes::models::Home;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::{generate_item_id, validate_required_field};

/// ルートの末尾にアイテムを追加する
///
/// # 戻り値
/// 追加したアイテムのID
pub fn add_item(home: &mut Home, list_type: ListType, dto: CreateItemDto) -> AppResult<String> {
    dto.validate()?;
    let item = dto.into_item();
    let id = item.id.clone();
    home.list_mut(list_type).push(item);
    Ok(id)
}

/// 任意の階層のアイテムを更新する
pub fn update_item(
    home: &mut Home,
    list_type: ListType,
    item_id: &str,
    patch: &UpdateItemDto,
) -> AppResult<Item> {
    patch.validate()?;
    let list = std::mem::take(home.list_mut(list_type));
    let (list, updated) = tree::update_by_id(list, item_id, patch);
    *home.list_mut(list_type) = list;
    updated.ok_or_else(|| AppError::not_found("アイテム"))
}

/// 任意の階層のアイテムを部分木ごと完全に削除する
pub fn delete_item_permanently(
    home: &mut Home,
    list_type: ListType,
    item_id: &str,
) -> AppResult<Item> {
    let list = std::mem::take(home.list_mut(list_type));
    let (list, removed) = tree::remove_by_id(list, item_id);
    *home.list_mut(list_type) = list;
    removed.ok_or_else(|| AppError::not_found("アイテム"))
}

/// 完了済みのアイテムをすべての階層から削除する
///
/// # 戻り値
/// 削除したノード数
pub fn clear_completed(home: &mut Home, list_type: ListType) -> usize {
    let list = std::mem::take(home.list_mut(list_type));
    let before: usize = list.iter().map(Item::node_count).sum();
    let list = tree::filter_completed(list);
    let after: usize = list.iter().map(Item::node_count).sum();
    *home.list_mut(list_type) = list;
    before - after
}

/// リストを空にする
pub fn clear_list(home: &mut Home, list_type: ListType) -> usize {
    std::mem::take(home.list_mut(list_type)).len()
}

/// ルートの2つのアイテムをフォルダにまとめる
///
/// # 戻り値
/// 作成したフォルダのID（同じアイテム同士の場合は`None`）
pub fn group_items(
    home: &mut Home,
    list_type: ListType,
    dto: &GroupItemsDto,
) -> AppResult<Option<String>> {
    if dto.dragged_id == dto.target_id {
        return Ok(None);
    }
    validate_required_field(&dto.folder_name, "フォルダ名")?;

    let folder_id = generate_item_id();
    let list = home.list(list_type).clone();
    let list = tree::group_items(
        list,
        &dto.dragged_id,
        &dto.target_id,
        folder_id.clone(),
        &dto.folder_name,
    )?;
    *home.list_mut(list_type) = list;
    Ok(Some(folder_id))
}

/// フォルダを解除し、子アイテムをその位置に展開する
pub fn ungroup_folder(home: &mut Home, list_type: ListType, folder_id: &str) -> AppResult<()> {
    let list = home.list(list_type).clone();
    let list = tree::ungroup_folder(list, folder_id)?;
    *home.list_mut(list_type) = list;
    Ok(())
}
