use super::access_code::{hash_access_code, verify_access_code};
use super::models::{
    CreateHomeDto, Home, LoginDto, UpdateHomeDto, User, DEFAULT_COLOR_CLASS, DEFAULT_ICON_CLASS,
};
use super::normalize::{normalize_home, RawHome};
use super::repository;
use crate::features::finances::defaults::empty_finances;
use crate::features::lists::models::GENERAL_CATEGORY;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::generate_home_id;
use crate::AppState;
use chrono::Utc;
use rusqlite::Connection;
use std::sync::MutexGuard;

/// データベースロックを取得する
pub fn lock_db(state: &AppState) -> AppResult<MutexGuard<'_, Connection>> {
    state
        .db
        .lock()
        .map_err(|e| AppError::concurrency(format!("データベースロック取得失敗: {e}")))
}

/// ホームを読み込み、変更し、保存する
///
/// 読み込みから保存までデータベースロックを保持するため、
/// 同じプロセス内の変更は直列化される。
/// 変更関数がエラーを返した場合は何も保存しない。
///
/// # 戻り値
/// 保存後の正規化済みホーム
pub fn mutate_home<F>(state: &AppState, home_id: &str, mutation: F) -> AppResult<Home>
where
    F: FnOnce(&mut Home) -> AppResult<()>,
{
    let db = lock_db(state)?;
    let mut home = repository::find_by_id(&db, home_id, &state.config.default_currency)?;

    mutation(&mut home)?;

    let (home, _) = normalize_home(RawHome::from(home), &state.config.default_currency);
    repository::save(&db, &home)?;
    Ok(home)
}

/// ホームを作成する
///
/// # 引数
/// * `state` - アプリケーション状態
/// * `dto` - ホーム作成用DTO
///
/// # 戻り値
/// 作成されたホーム、名前が重複する場合は競合エラー
pub fn create_home(state: &AppState, dto: CreateHomeDto) -> AppResult<Home> {
    dto.validate()?;

    let currency = dto
        .currency
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| state.config.default_currency.clone());

    let home = Home {
        id: generate_home_id(),
        name: dto.name.trim().to_string(),
        icon_class: dto
            .icon_class
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ICON_CLASS.to_string()),
        color_class: dto
            .color_class
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COLOR_CLASS.to_string()),
        users: vec![User::new(dto.initial_user_name.trim(), true)],
        shopping_list: Vec::new(),
        tasks_list: Vec::new(),
        archived_items: Vec::new(),
        templates: Vec::new(),
        list_categories: vec![GENERAL_CATEGORY.to_string()],
        finances: empty_finances(&currency),
        created_at: Some(Utc::now()),
    };

    let access_code = hash_access_code(&dto.access_code);

    let db = lock_db(state)?;
    repository::insert(&db, &home, &access_code)?;

    log::info!("ホームを作成しました: id={}, name={}", home.id, home.name);
    Ok(home)
}

/// ホーム名とアクセスコードで認証する
///
/// 名前の不一致とコードの不一致は区別しない。
pub fn login(state: &AppState, dto: LoginDto) -> AppResult<Home> {
    let db = lock_db(state)?;

    let credentials = repository::find_credentials_by_name(&db, &dto.name)?;
    let home_id = match credentials {
        Some(credentials) if verify_access_code(&dto.access_code, &credentials.access_code) => {
            credentials.id
        }
        _ => {
            log::warn!("ログインに失敗しました: name={}", dto.name.trim());
            return Err(AppError::Unauthorized(
                "ホーム名またはアクセスコードが正しくありません".to_string(),
            ));
        }
    };

    log::info!("ログインしました: id={home_id}");
    repository::find_by_id(&db, &home_id, &state.config.default_currency)
}

/// ホームを取得する
pub fn get_home(state: &AppState, home_id: &str) -> AppResult<Home> {
    let db = lock_db(state)?;
    repository::find_by_id(&db, home_id, &state.config.default_currency)
}

/// ホームの基本情報を更新する
pub fn update_home(state: &AppState, home_id: &str, dto: UpdateHomeDto) -> AppResult<Home> {
    dto.validate()?;

    mutate_home(state, home_id, |home| {
        dto.apply(home);
        log::info!("ホーム情報を更新しました: id={}", home.id);
        Ok(())
    })
}
