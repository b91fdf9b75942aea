use super::archive;
use super::engine;
use super::models::{CreateItemDto, GroupItemsDto, ListType, UpdateItemDto};
use crate::features::homes::commands::mutate_home;
use crate::features::homes::models::Home;
use crate::shared::errors::AppResult;
use crate::AppState;

/// アイテムを追加する
///
/// # 引数
/// * `state` - アプリケーション状態
/// * `home_id` - ホームID
/// * `list_type` - 追加先のリスト
/// * `dto` - アイテム作成用DTO（子アイテムを含められる）
///
/// # 戻り値
/// 保存後のホーム
pub fn add_item(
    state: &AppState,
    home_id: &str,
    list_type: ListType,
    dto: CreateItemDto,
) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        let id = engine::add_item(home, list_type, dto)?;
        log::info!("アイテムを追加しました: home={}, list={list_type}, id={id}", home.id);
        Ok(())
    })
}

/// 任意の階層のアイテムを更新する
pub fn update_item(
    state: &AppState,
    home_id: &str,
    list_type: ListType,
    item_id: &str,
    dto: UpdateItemDto,
) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        engine::update_item(home, list_type, item_id, &dto)?;
        log::info!("アイテムを更新しました: home={}, list={list_type}, id={item_id}", home.id);
        Ok(())
    })
}

/// アイテムを削除する
///
/// `permanent` が偽ならアーカイブへ移し、真なら完全に削除する。
pub fn remove_item(
    state: &AppState,
    home_id: &str,
    list_type: ListType,
    item_id: &str,
    permanent: bool,
) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        if permanent {
            engine::delete_item_permanently(home, list_type, item_id)?;
            log::info!("アイテムを完全に削除しました: home={}, id={item_id}", home.id);
        } else {
            archive::archive_item(home, list_type, item_id)?;
            log::info!("アイテムをアーカイブしました: home={}, id={item_id}", home.id);
        }
        Ok(())
    })
}

/// 完了済みのアイテムを削除する
pub fn clear_completed(state: &AppState, home_id: &str, list_type: ListType) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        let removed = engine::clear_completed(home, list_type);
        log::info!(
            "完了済みのアイテムを削除しました: home={}, list={list_type}, count={removed}",
            home.id
        );
        Ok(())
    })
}

/// リストを空にする
pub fn clear_list(state: &AppState, home_id: &str, list_type: ListType) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        let removed = engine::clear_list(home, list_type);
        log::info!("リストを空にしました: home={}, list={list_type}, count={removed}", home.id);
        Ok(())
    })
}

/// 2つのアイテムをフォルダにまとめる
pub fn group_items(
    state: &AppState,
    home_id: &str,
    list_type: ListType,
    dto: GroupItemsDto,
) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        if let Some(folder_id) = engine::group_items(home, list_type, &dto)? {
            log::info!("フォルダを作成しました: home={}, folder={folder_id}", home.id);
        }
        Ok(())
    })
}

/// フォルダを解除する
pub fn ungroup_folder(
    state: &AppState,
    home_id: &str,
    list_type: ListType,
    folder_id: &str,
) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        engine::ungroup_folder(home, list_type, folder_id)?;
        log::info!("フォルダを解除しました: home={}, folder={folder_id}", home.id);
        Ok(())
    })
}

/// アーカイブのアイテムを元のリストに戻す
pub fn restore_archived_item(state: &AppState, home_id: &str, item_id: &str) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        let destination = archive::restore_item(home, item_id)?;
        log::info!(
            "アイテムを復元しました: home={}, id={item_id}, list={destination}",
            home.id
        );
        Ok(())
    })
}

/// アーカイブのアイテムを完全に削除する
pub fn delete_archived_item(state: &AppState, home_id: &str, item_id: &str) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        archive::delete_archived_item(home, item_id)?;
        log::info!("アーカイブのアイテムを削除しました: home={}, id={item_id}", home.id);
        Ok(())
    })
}

/// アーカイブを空にする
pub fn clear_archive(state: &AppState, home_id: &str) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        let removed = archive::clear_archive(home);
        log::info!("アーカイブを空にしました: home={}, count={removed}", home.id);
        Ok(())
    })
}
