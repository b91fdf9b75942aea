use crate::shared::errors::{AppError, AppResult};
use chrono_tz::Tz;
use std::net::SocketAddr;
use std::path::PathBuf;

/// アプリケーションの実行環境を表す列挙型
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Environment {
    /// 開発環境
    Development,
    /// プロダクション環境
    Production,
}

/// 環境設定を管理する構造体
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    /// 実行環境
    pub environment: String,
    /// デバッグモードの有効/無効
    pub debug_mode: bool,
    /// ログレベル
    pub log_level: String,
}

impl EnvironmentConfig {
    /// 環境変数から設定を読み込む
    ///
    /// # 戻り値
    /// 環境設定
    pub fn from_env() -> Self {
        let environment = get_environment();
        let debug_mode = environment == Environment::Development;
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| {
            if debug_mode {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

        Self {
            environment: format!("{environment:?}").to_lowercase(),
            debug_mode,
            log_level,
        }
    }

    /// プロダクション環境かどうかを判定
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// 現在の実行環境を判定する
///
/// # 判定ロジック
/// 1. 実行時環境変数 ENVIRONMENT を確認
/// 2. デバッグビルドの場合は Development
/// 3. リリースビルドの場合は Production
pub fn get_environment() -> Environment {
    if let Ok(env_var) = std::env::var("ENVIRONMENT") {
        let env = match env_var.as_str() {
            "production" => Environment::Production,
            _ => Environment::Development,
        };
        log::debug!("環境判定: 実行時環境変数を使用 -> {env_var} -> {env:?}");
        return env;
    }

    let env = if cfg!(debug_assertions) {
        Environment::Development
    } else {
        Environment::Production
    };
    log::debug!(
        "環境判定: ビルド設定を使用 -> debug_assertions={} -> {env:?}",
        cfg!(debug_assertions)
    );
    env
}

/// 環境に応じたデータベースファイル名を取得する
///
/// # ファイル名の規則
/// - 開発環境: "dev_household.db"
/// - プロダクション環境: "household.db"
pub fn get_database_filename(env: Environment) -> &'static str {
    match env {
        Environment::Development => "dev_household.db",
        Environment::Production => "household.db",
    }
}

/// 環境に応じた.envファイルを読み込む
pub fn load_environment_variables() {
    let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

    let env_file = match environment.as_str() {
        "production" => ".env.production",
        _ => ".env",
    };

    log::info!("環境: {environment}, 読み込み対象: {env_file}");

    match dotenv::from_filename(env_file) {
        Ok(_) => {
            log::info!("{env_file}ファイルを読み込みました");
        }
        Err(_) => {
            // 環境固有のファイルがない場合は、デフォルトの.envを試行
            if env_file != ".env" && dotenv::dotenv().is_ok() {
                log::warn!("{env_file}が見つからないため、デフォルトの.envファイルを読み込みました");
            } else {
                log::warn!("環境変数ファイルが見つかりません。直接設定された環境変数を使用します。");
            }
        }
    }
}

/// ログシステムを初期化する
///
/// # 処理内容
/// 1. 環境設定を取得
/// 2. ログレベルを設定
/// 3. env_loggerを初期化
pub fn initialize_logging_system() {
    let env_config = EnvironmentConfig::from_env();

    let log_level = match env_config.log_level.to_lowercase().as_str() {
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => fallback_log_level(&env_config),
    };

    let initialized = env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(false)
        .try_init();
    if let Err(e) = initialized {
        log::debug!("ロガーは既に初期化されています: {e}");
        return;
    }

    log::info!(
        "ログシステムを初期化しました: level={}, environment={}",
        env_config.log_level,
        env_config.environment
    );
}

/// 認識できないログレベルが指定されたときのレベル
fn fallback_log_level(env_config: &EnvironmentConfig) -> log::LevelFilter {
    if env_config.is_production() {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Debug
    }
}

/// RESTサーバーの設定
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 待ち受けホスト
    pub host: String,
    /// 待ち受けポート
    pub port: u16,
    /// SQLiteデータベースファイルのパス
    pub database_path: PathBuf,
    /// 新規ホームの既定通貨
    pub default_currency: String,
    /// 月次集計に使うタイムゾーン
    pub timezone: Tz,
}

impl ServerConfig {
    /// 環境変数からサーバー設定を読み込む
    pub fn from_env() -> AppResult<Self> {
        log::debug!("ServerConfig::from_env() - 環境変数の読み込みを開始");

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|e| AppError::configuration(format!("PORTのパースに失敗しました: {e}")))?;

        let database_path = std::env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(get_database_filename(get_environment())));

        let default_currency =
            std::env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| "₪".to_string());

        let timezone_name =
            std::env::var("APP_TIMEZONE").unwrap_or_else(|_| "Asia/Jerusalem".to_string());
        let timezone = timezone_name.parse::<Tz>().map_err(|e| {
            AppError::configuration(format!("APP_TIMEZONEが不正です ({timezone_name}): {e}"))
        })?;

        let config = Self {
            host,
            port,
            database_path,
            default_currency,
            timezone,
        };
        config.validate()?;

        log::info!(
            "サーバー設定: addr={}:{}, database={:?}, currency={}, timezone={}",
            config.host,
            config.port,
            config.database_path,
            config.default_currency,
            config.timezone
        );

        Ok(config)
    }

    /// 設定を検証する
    pub fn validate(&self) -> AppResult<()> {
        if self.default_currency.trim().is_empty() {
            return Err(AppError::configuration("既定通貨が空です"));
        }
        self.socket_addr().map(|_| ())
    }

    /// 待ち受けアドレスを取得する
    pub fn socket_addr(&self) -> AppResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::configuration(format!("待ち受けアドレスが不正です: {e}")))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_path: PathBuf::from(get_database_filename(Environment::Development)),
            default_currency: "₪".to_string(),
            timezone: chrono_tz::Asia::Jerusalem,
        }
    }
}

/// AIサービス連携の設定
#[derive(Debug, Clone, Default)]
pub struct AiConfig {
    /// AIサービスのエンドポイント（未設定の場合は無効）
    pub service_url: Option<String>,
    /// リクエストのタイムアウト（秒）
    pub timeout_seconds: u64,
}

impl AiConfig {
    /// 環境変数からAI設定を読み込む
    pub fn from_env() -> Self {
        let service_url = std::env::var("AI_SERVICE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let timeout_seconds = std::env::var("AI_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or_else(|_| {
                log::warn!("AI_TIMEOUT_SECONDSのパースに失敗しました。デフォルト値30秒を使用します");
                30
            });

        match &service_url {
            Some(url) => log::info!("AIサービス: {url} (timeout={timeout_seconds}s)"),
            None => log::info!("AI_SERVICE_URLが未設定のため、AI機能は無効です"),
        }

        Self {
            service_url,
            timeout_seconds,
        }
    }

    /// AI機能が有効かどうか
    pub fn is_enabled(&self) -> bool {
        self.service_url.is_some()
    }
}

/// クライアント側のAPI接続設定
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// APIサーバーのベースURL
    pub base_url: String,
    /// APIリクエストのタイムアウト（秒）
    pub timeout_seconds: u64,
}

impl ApiConfig {
    /// 環境変数からAPI設定を読み込む
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

        let timeout_seconds = std::env::var("API_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or_else(|_| {
                log::warn!(
                    "API_TIMEOUT_SECONDSのパースに失敗しました。デフォルト値30秒を使用します"
                );
                30
            });

        log::info!("API設定: base_url={base_url}, timeout={timeout_seconds}s");

        Self {
            base_url,
            timeout_seconds,
        }
    }

    /// 設定を検証する
    pub fn validate(&self) -> AppResult<()> {
        if self.base_url.is_empty() {
            return Err(AppError::configuration(
                "APIサーバーのベースURLが設定されていません",
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(AppError::configuration(
                "APIタイムアウトは0より大きい値である必要があります",
            ));
        }

        url::Url::parse(&self.base_url)
            .map_err(|e| AppError::configuration(format!("APIサーバーのURLが不正です: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_database_filename() {
        assert_eq!(
            get_database_filename(Environment::Development),
            "dev_household.db"
        );
        assert_eq!(get_database_filename(Environment::Production), "household.db");
    }

    #[test]
    fn test_get_environment() {
        let env = get_environment();
        assert!(matches!(
            env,
            Environment::Development | Environment::Production
        ));
    }

    #[test]
    fn test_fallback_log_level_follows_environment() {
        let dev_config = EnvironmentConfig {
            environment: "development".to_string(),
            debug_mode: true,
            log_level: "debug".to_string(),
        };

        let prod_config = EnvironmentConfig {
            environment: "production".to_string(),
            debug_mode: false,
            log_level: "info".to_string(),
        };

        assert!(!dev_config.is_production());
        assert!(prod_config.is_production());
        assert_eq!(fallback_log_level(&dev_config), log::LevelFilter::Debug);
        assert_eq!(fallback_log_level(&prod_config), log::LevelFilter::Info);
    }

    #[test]
    fn test_initialize_logging_twice() {
        initialize_logging_system();
        initialize_logging_system();
        assert!(log::max_level() >= log::LevelFilter::Error);
    }

    #[test]
    fn test_server_config_validation() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.socket_addr().unwrap().port(), 8080);

        let broken = ServerConfig {
            host: "not a host".to_string(),
            ..ServerConfig::default()
        };
        assert!(matches!(
            broken.validate(),
            Err(AppError::Configuration(_))
        ));

        let no_currency = ServerConfig {
            default_currency: "  ".to_string(),
            ..ServerConfig::default()
        };
        assert!(no_currency.validate().is_err());
    }

    #[test]
    fn test_api_config_validation() {
        let config = ApiConfig {
            base_url: "http://localhost:8080".to_string(),
            timeout_seconds: 30,
        };
        assert!(config.validate().is_ok());

        let zero_timeout = ApiConfig {
            timeout_seconds: 0,
            ..config.clone()
        };
        assert!(zero_timeout.validate().is_err());

        let bad_url = ApiConfig {
            base_url: "::::".to_string(),
            ..config
        };
        assert!(bad_url.validate().is_err());
    }

    #[test]
    fn test_ai_config_disabled_by_default() {
        let config = AiConfig::default();
        assert!(!config.is_enabled());
    }

    #[test]
    fn test_load_environment_variables() {
        // パニックしないことを確認
        load_environment_variables();
    }
}
