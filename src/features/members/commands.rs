use super::models::{AddUserDto, UpdateUserDto};
use super::roster;
use crate::features::homes::commands::mutate_home;
use crate::features::homes::models::Home;
use crate::shared::errors::AppResult;
use crate::AppState;

/// ユーザーを追加する
pub fn add_user(state: &AppState, home_id: &str, dto: AddUserDto) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        roster::add_user(home, &dto)?;
        log::info!("ユーザーを追加しました: home={}, user={}", home.id, dto.name.trim());
        Ok(())
    })
}

/// ユーザー名・管理者フラグを更新する
pub fn update_user(
    state: &AppState,
    home_id: &str,
    name: &str,
    dto: UpdateUserDto,
) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        roster::update_user(home, name, &dto)?;
        log::info!("ユーザーを更新しました: home={}, user={name}", home.id);
        Ok(())
    })
}

/// ユーザーを削除する
pub fn remove_user(state: &AppState, home_id: &str, name: &str) -> AppResult<Home> {
    mutate_home(state, home_id, |home| {
        let removed = roster::remove_user(home, name)?;
        log::info!("ユーザーを削除しました: home={}, user={}", home.id, removed.name);
        Ok(())
    })
}
