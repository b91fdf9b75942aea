use crate::shared::errors::{AppError, AppResult};
use rusqlite::Connection;
use std::path::Path;

/// データベース接続を初期化し、テーブル作成とマイグレーションを実行する
///
/// # 引数
/// * `database_path` - SQLiteデータベースファイルのパス
///
/// # 戻り値
/// データベース接続、または失敗時はエラー
///
/// # 処理内容
/// 1. 親ディレクトリの確保
/// 2. データベース接続の開設
/// 3. テーブル作成とマイグレーションの実行
pub fn initialize_database(database_path: &Path) -> AppResult<Connection> {
    if let Some(parent) = database_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::configuration(format!("データディレクトリの作成に失敗: {e}"))
            })?;
            log::info!("データディレクトリを作成: {:?}", parent);
        }
    }

    let conn = Connection::open(database_path)?;

    create_tables(&conn)?;

    log::info!("データベースを初期化しました: {:?}", database_path);

    Ok(conn)
}

/// メモリ上のデータベースを初期化する（テスト・一時利用向け）
pub fn initialize_in_memory_database() -> AppResult<Connection> {
    let conn = Connection::open_in_memory()?;
    create_tables(&conn)?;
    Ok(conn)
}

/// データベーステーブルを作成する
///
/// ホームは集約全体を1つのJSONドキュメントとして保存する。
/// 名前とアクセスコードのハッシュはドキュメントの外に置く。
pub fn create_tables(conn: &Connection) -> AppResult<()> {
    let table_exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='homes'",
        [],
        |row| row.get(0),
    )?;

    if table_exists == 0 {
        create_homes_table(conn)?;
        log::info!("新規データベースを作成しました（homesスキーマ）");
    } else {
        log::info!("既存のデータベースを確認中...");
        migrate_existing_tables(conn)?;
    }

    create_indexes(conn)?;

    Ok(())
}

/// ホームテーブルを作成する
fn create_homes_table(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE homes (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            access_code_hash TEXT NOT NULL,
            access_code_salt TEXT NOT NULL,
            document TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// 既存テーブルのマイグレーションを実行する
fn migrate_existing_tables(conn: &Connection) -> AppResult<()> {
    // 初期バージョンにはupdated_atがなかった
    if !check_column_exists(conn, "homes", "updated_at") {
        log::info!("updated_atカラムを追加します...");
        conn.execute(
            "ALTER TABLE homes ADD COLUMN updated_at TEXT NOT NULL DEFAULT ''",
            [],
        )?;
        conn.execute(
            "UPDATE homes SET updated_at = created_at WHERE updated_at = ''",
            [],
        )?;
    }

    Ok(())
}

/// インデックスを作成する
fn create_indexes(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_homes_updated_at ON homes(updated_at)",
        [],
    )?;

    Ok(())
}

/// テーブルに指定されたカラムが存在するかチェックする
///
/// # 戻り値
/// カラムが存在する場合はtrue、存在しないかエラーの場合はfalse
fn check_column_exists(conn: &Connection, table_name: &str, column_name: &str) -> bool {
    let query = format!("PRAGMA table_info({table_name})");

    match conn.prepare(&query) {
        Ok(mut stmt) => match stmt.query_map([], |row| row.get::<_, String>(1)) {
            Ok(rows) => rows.flatten().any(|col_name| col_name == column_name),
            Err(_) => false,
        },
        Err(_) => false,
    }
}
