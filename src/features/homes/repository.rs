use super::access_code::HashedAccessCode;
use super::models::Home;
use super::normalize::{normalize_home, RawHome};
use crate::shared::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

/// ログイン照合用の資格情報
#[derive(Debug, Clone)]
pub struct HomeCredentials {
    pub id: String,
    pub access_code: HashedAccessCode,
}

/// ホームを新規作成する
///
/// # 引数
/// * `conn` - データベース接続
/// * `home` - 保存する集約
/// * `access_code` - ハッシュ化済みのアクセスコード
///
/// # 戻り値
/// 成功時は`()`、名前が重複する場合は競合エラー
pub fn insert(conn: &Connection, home: &Home, access_code: &HashedAccessCode) -> AppResult<()> {
    let now = Utc::now().to_rfc3339();
    let created_at = home
        .created_at
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| now.clone());
    let document = serde_json::to_string(home)?;

    conn.execute(
        "INSERT INTO homes (id, name, access_code_hash, access_code_salt, document, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            home.id,
            home.name,
            access_code.hash,
            access_code.salt,
            document,
            created_at,
            now
        ],
    )
    .map_err(|e| map_unique_violation(e, &home.name))?;

    Ok(())
}

/// IDでホームを取得し、正規化して返す
///
/// 行のID・名前・作成日時がドキュメントの値より優先される。
pub fn find_by_id(conn: &Connection, id: &str, default_currency: &str) -> AppResult<Home> {
    let row = conn
        .query_row(
            "SELECT id, name, document, created_at FROM homes WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    let (row_id, row_name, document, created_at) = row.ok_or_else(|| AppError::not_found("ホーム"))?;

    let raw: RawHome = serde_json::from_str(&document)?;
    let (mut home, _) = normalize_home(raw, default_currency);
    home.id = row_id;
    home.name = row_name;
    if home.created_at.is_none() {
        home.created_at = DateTime::parse_from_rfc3339(&created_at)
            .ok()
            .map(|at| at.with_timezone(&Utc));
    }

    Ok(home)
}

/// 名前（大文字小文字を区別しない）で資格情報を取得する
pub fn find_credentials_by_name(conn: &Connection, name: &str) -> AppResult<Option<HomeCredentials>> {
    conn.query_row(
        "SELECT id, access_code_hash, access_code_salt FROM homes WHERE name = ?1",
        params![name.trim()],
        |row| {
            Ok(HomeCredentials {
                id: row.get(0)?,
                access_code: HashedAccessCode {
                    hash: row.get(1)?,
                    salt: row.get(2)?,
                },
            })
        },
    )
    .optional()
    .map_err(AppError::from)
}

/// 集約全体を上書き保存する
///
/// # 戻り値
/// 成功時は`()`、存在しない場合は未発見エラー、名前が重複する場合は競合エラー
pub fn save(conn: &Connection, home: &Home) -> AppResult<()> {
    let now = Utc::now().to_rfc3339();
    let document = serde_json::to_string(home)?;

    let affected = conn
        .execute(
            "UPDATE homes SET name = ?1, document = ?2, updated_at = ?3 WHERE id = ?4",
            params![home.name, document, now, home.id],
        )
        .map_err(|e| map_unique_violation(e, &home.name))?;

    if affected == 0 {
        return Err(AppError::not_found("ホーム"));
    }

    Ok(())
}

/// 名前の一意制約違反を競合エラーに変換する
fn map_unique_violation(error: rusqlite::Error, name: &str) -> AppError {
    match error {
        rusqlite::Error::SqliteFailure(ref failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            AppError::conflict(format!("ホーム名「{name}」は既に使われています"))
        }
        other => AppError::from(other),
    }
}
