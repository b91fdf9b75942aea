//! ホームAPIクライアント
//!
//! RESTサーバーと通信する `HttpHomeApi` と、同じルーティングをプロセス内で
//! 実行する `InProcessHomeApi` を提供する。

use super::request::{ApiRoute, HomeRequest};
use crate::features::finances::summary::MonthlySummary;
use crate::features::homes::models::{CreateHomeDto, Home, LoginDto};
use crate::features::server::router::dispatch;
use crate::shared::config::ApiConfig;
use crate::shared::errors::{AppError, AppResult};
use crate::AppState;
use async_trait::async_trait;
use hyper::Method;
use log::{debug, info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// クライアントから見たホームAPI
#[async_trait]
pub trait HomeApi: Send + Sync {
    async fn create_home(&self, dto: &CreateHomeDto) -> AppResult<Home>;
    async fn login(&self, dto: &LoginDto) -> AppResult<Home>;
    async fn get_home(&self, home_id: &str) -> AppResult<Home>;
    /// 変更リクエストを送り、正規化済みのホーム全体を受け取る
    async fn execute(&self, home_id: &str, request: &HomeRequest) -> AppResult<Home>;
    async fn monthly_summary(&self, home_id: &str, year: i32, month: u32)
        -> AppResult<MonthlySummary>;
}

/// APIサーバーからのエラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub timestamp: Option<String>,
}

/// エラーレスポンスを `AppError` に戻す
///
/// 構造化されていない本文はステータスコードから推定する。
pub fn error_from_response(status: u16, body: &str) -> AppError {
    if let Ok(response) = serde_json::from_str::<ErrorResponse>(body) {
        debug!(
            "APIサーバーから構造化エラーレスポンスを受信: code={}, message={}",
            response.error.code, response.error.message
        );
        let message = response.error.message;
        return match response.error.code.as_str() {
            "VALIDATION_ERROR" | "MALFORMED_JSON" => AppError::Validation(message),
            "NOT_FOUND" => AppError::NotFound(message),
            "CONFLICT" => AppError::Conflict(message),
            "UNAUTHORIZED" => AppError::Unauthorized(message),
            code => AppError::ExternalService(format!("APIサーバーエラー: {code} - {message}")),
        };
    }

    warn!("APIサーバーから非構造化エラーレスポンス: status={status}, body={body}");
    match status {
        400 => AppError::Validation("リクエストの形式が正しくありません".to_string()),
        401 => AppError::Unauthorized("認証に失敗しました。再度ログインしてください".to_string()),
        404 => AppError::NotFound("指定されたリソースが見つかりません".to_string()),
        409 => AppError::Conflict("データが競合しました".to_string()),
        502 => AppError::ExternalService("APIサーバーとの通信でエラーが発生しました".to_string()),
        503 => AppError::ExternalService("APIサーバーが一時的に利用できません".to_string()),
        504 => AppError::ExternalService("APIサーバーからの応答がタイムアウトしました".to_string()),
        _ => AppError::ExternalService(format!("APIサーバーエラー: status={status}")),
    }
}

/// APIクライアント設定
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    /// 接続失敗時のGETリクエストの再試行回数
    pub max_retries: u32,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_seconds: 30,
            max_retries: 2,
        }
    }
}

impl From<ApiConfig> for ApiClientConfig {
    fn from(config: ApiConfig) -> Self {
        Self {
            base_url: config.base_url,
            timeout_seconds: config.timeout_seconds,
            ..Self::default()
        }
    }
}

/// RESTサーバーと通信するクライアント
pub struct HttpHomeApi {
    client: Client,
    base_url: Url,
    config: ApiClientConfig,
}

impl HttpHomeApi {
    /// 環境変数の設定でクライアントを作成
    pub fn from_env() -> AppResult<Self> {
        let config = ApiConfig::from_env();
        config.validate()?;
        Self::new_with_config(config.into())
    }

    /// 設定を指定してクライアントを作成
    pub fn new_with_config(config: ApiClientConfig) -> AppResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| AppError::configuration(format!("APIサーバーのURLが不正です: {e}")))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::configuration(format!("HTTPクライアント初期化失敗: {e}")))?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    async fn send<T: DeserializeOwned>(&self, route: ApiRoute) -> AppResult<T> {
        let url = route.url(&self.base_url)?;
        let method = reqwest::Method::from_bytes(route.method.as_str().as_bytes())
            .map_err(|e| AppError::configuration(format!("HTTPメソッドが不正です: {e}")))?;
        info!("{method}リクエスト送信: path={}", url.path());

        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(ref body) = route.body {
            request = request.json(body);
        }

        let retries = if method == reqwest::Method::GET {
            self.config.max_retries
        } else {
            0
        };
        let mut attempts = 0;
        let response = loop {
            let Some(cloned_request) = request.try_clone() else {
                return Err(AppError::ExternalService(
                    "リクエストのクローンに失敗しました".to_string(),
                ));
            };
            match cloned_request.send().await {
                Ok(response) => break response,
                Err(e) if attempts < retries => {
                    attempts += 1;
                    let delay = Duration::from_millis(250 * 2_u64.pow(attempts));
                    warn!(
                        "APIリクエスト失敗、リトライします: attempt={attempts}/{retries}, delay={delay:?}, error={e}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(AppError::ExternalService(format!(
                        "APIサーバーへの接続に失敗しました: {e}"
                    )))
                }
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "レスポンス読み取り失敗".to_string());
            return Err(error_from_response(status.as_u16(), &text));
        }

        let result = response
            .json::<T>()
            .await
            .map_err(|e| AppError::ExternalService(format!("レスポンス解析エラー: {e}")))?;
        info!("{method}リクエスト成功: path={}", url.path());
        Ok(result)
    }
}

#[async_trait]
impl HomeApi for HttpHomeApi {
    async fn create_home(&self, dto: &CreateHomeDto) -> AppResult<Home> {
        self.send(ApiRoute::new(Method::POST, ["homes"]).with_body(dto)?)
            .await
    }

    async fn login(&self, dto: &LoginDto) -> AppResult<Home> {
        self.send(ApiRoute::new(Method::POST, ["homes", "login"]).with_body(dto)?)
            .await
    }

    async fn get_home(&self, home_id: &str) -> AppResult<Home> {
        self.send(ApiRoute::new(Method::GET, ["homes", home_id])).await
    }

    async fn execute(&self, home_id: &str, request: &HomeRequest) -> AppResult<Home> {
        self.send(request.route(home_id)?).await
    }

    async fn monthly_summary(
        &self,
        home_id: &str,
        year: i32,
        month: u32,
    ) -> AppResult<MonthlySummary> {
        self.send(summary_route(home_id, year, month)).await
    }
}

/// サーバーと同じルーターをプロセス内で呼び出すクライアント
///
/// 単一プロセスで動かす場合や、ソケットを使わずにクライアントを検証する場合に使う。
pub struct InProcessHomeApi {
    state: Arc<AppState>,
}

impl InProcessHomeApi {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    async fn send<T: DeserializeOwned>(&self, route: ApiRoute) -> AppResult<T> {
        let base = Url::parse("http://localhost/")
            .map_err(|e| AppError::configuration(format!("URLの作成に失敗しました: {e}")))?;
        let url = route.url(&base)?;
        let body = match route.body {
            Some(ref body) => serde_json::to_vec(body)?,
            None => Vec::new(),
        };

        let response = dispatch(&self.state, &route.method, url.path(), url.query(), &body).await;
        if !response.status.is_success() {
            return Err(error_from_response(
                response.status.as_u16(),
                &response.body.to_string(),
            ));
        }
        Ok(serde_json::from_value(response.body)?)
    }
}

#[async_trait]
impl HomeApi for InProcessHomeApi {
    async fn create_home(&self, dto: &CreateHomeDto) -> AppResult<Home> {
        self.send(ApiRoute::new(Method::POST, ["homes"]).with_body(dto)?)
            .await
    }

    async fn login(&self, dto: &LoginDto) -> AppResult<Home> {
        self.send(ApiRoute::new(Method::POST, ["homes", "login"]).with_body(dto)?)
            .await
    }

    async fn get_home(&self, home_id: &str) -> AppResult<Home> {
        self.send(ApiRoute::new(Method::GET, ["homes", home_id])).await
    }

    async fn execute(&self, home_id: &str, request: &HomeRequest) -> AppResult<Home> {
        self.send(request.route(home_id)?).await
    }

    async fn monthly_summary(
        &self,
        home_id: &str,
        year: i32,
        month: u32,
    ) -> AppResult<MonthlySummary> {
        self.send(summary_route(home_id, year, month)).await
    }
}

fn summary_route(home_id: &str, year: i32, month: u32) -> ApiRoute {
    ApiRoute::new(
        Method::GET,
        [
            "homes".to_string(),
            home_id.to_string(),
            "finance".to_string(),
            "summary".to_string(),
            year.to_string(),
            month.to_string(),
        ],
    )
}
