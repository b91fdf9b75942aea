//! RESTリクエストを各コマンドに振り分ける

use crate::features::ai::commands as ai;
use crate::features::finances::commands as finances;
use crate::features::homes::commands as homes;
use crate::features::homes::models::Home;
use crate::features::lists::commands as lists;
use crate::features::lists::models::ListType;
use crate::features::members::commands as members;
use crate::features::templates::commands as templates;
use crate::shared::errors::{AppError, AppResult, ErrorSeverity};
use crate::AppState;
use chrono::Utc;
use hyper::{Method, StatusCode};
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use url::form_urlencoded;

/// ルーティング結果（ステータスとJSON本文）
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    fn ok<T: Serialize>(value: &T) -> AppResult<Self> {
        Ok(Self {
            status: StatusCode::OK,
            body: serde_json::to_value(value)?,
        })
    }

    fn created<T: Serialize>(value: &T) -> AppResult<Self> {
        Ok(Self {
            status: StatusCode::CREATED,
            body: serde_json::to_value(value)?,
        })
    }

    /// エラーを `{"error": {code, message, timestamp}}` に変換する
    pub fn from_error(error: &AppError) -> Self {
        Self {
            status: error.status_code(),
            body: json!({
                "error": {
                    "code": error.code(),
                    "message": error.user_message(),
                    "timestamp": Utc::now().to_rfc3339(),
                }
            }),
        }
    }
}

/// リクエストを処理し、必ずレスポンスを返す
///
/// # 引数
/// * `state` - アプリケーション状態
/// * `method` - HTTPメソッド
/// * `path` - パス（パーセントエンコードされたまま）
/// * `query` - クエリ文字列
/// * `body` - リクエスト本文
pub async fn dispatch(
    state: &AppState,
    method: &Method,
    path: &str,
    query: Option<&str>,
    body: &[u8],
) -> ApiResponse {
    log::debug!("リクエスト受信: {method} {path}");

    match decode_and_route(state, method, path, query, body).await {
        Ok(response) => response,
        Err(error) => {
            match error.severity() {
                ErrorSeverity::High => {
                    log::error!("リクエスト処理エラー: {method} {path}: {}", error.details())
                }
                ErrorSeverity::Medium | ErrorSeverity::Low => {
                    log::warn!("リクエスト処理エラー: {method} {path}: {}", error.details())
                }
            }
            ApiResponse::from_error(&error)
        }
    }
}

async fn decode_and_route(
    state: &AppState,
    method: &Method,
    path: &str,
    query: Option<&str>,
    body: &[u8],
) -> AppResult<ApiResponse> {
    let segments = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(decode_segment)
        .collect::<AppResult<Vec<String>>>()?;
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
    route(state, method, &segments, query, body).await
}

async fn route(
    state: &AppState,
    method: &Method,
    segments: &[&str],
    query: Option<&str>,
    body: &[u8],
) -> AppResult<ApiResponse> {
    match (method, segments) {
        (&Method::GET, ["health"]) => ApiResponse::ok(&json!({ "status": "ok" })),

        (&Method::POST, ["homes"]) => {
            ApiResponse::created(&homes::create_home(state, parse_body(body)?)?)
        }
        (&Method::POST, ["homes", "login"]) => ApiResponse::ok(&homes::login(state, parse_body(body)?)?),
        (&Method::GET, ["homes", home_id]) => ApiResponse::ok(&homes::get_home(state, home_id)?),
        (&Method::PUT, ["homes", home_id]) => {
            ApiResponse::ok(&homes::update_home(state, home_id, parse_body(body)?)?)
        }

        (_, ["homes", home_id, "users", rest @ ..]) => route_users(state, method, home_id, rest, body),
        (_, ["homes", home_id, "archive", rest @ ..]) => route_archive(state, method, home_id, rest),
        (_, ["homes", home_id, "templates", rest @ ..]) => {
            route_templates(state, method, home_id, rest, body)
        }
        (_, ["homes", home_id, "finance", rest @ ..]) => {
            route_finance(state, method, home_id, rest, body)
        }

        (&Method::POST, ["homes", home_id, "ai", "transform-recipe"]) => {
            ApiResponse::ok(&ai::transform_recipe(state, home_id, parse_body(body)?).await?)
        }
        (&Method::POST, ["homes", home_id, "ai", "breakdown-task"]) => {
            ApiResponse::ok(&ai::breakdown_task(state, home_id, parse_body(body)?).await?)
        }

        (_, ["homes", home_id, list, rest @ ..]) => {
            let list_type: ListType = list.parse()?;
            route_list(state, method, home_id, list_type, rest, query, body)
        }

        _ => Err(AppError::not_found(format!("ルート {method} /{}", segments.join("/")))),
    }
}

fn route_users(
    state: &AppState,
    method: &Method,
    home_id: &str,
    rest: &[&str],
    body: &[u8],
) -> AppResult<ApiResponse> {
    let home = match (method, rest) {
        (&Method::POST, []) => members::add_user(state, home_id, parse_body(body)?)?,
        (&Method::PUT, [name]) => members::update_user(state, home_id, name, parse_body(body)?)?,
        (&Method::DELETE, [name]) => members::remove_user(state, home_id, name)?,
        _ => return Err(unknown_route(method, home_id, "users", rest)),
    };
    ApiResponse::ok(&home)
}

fn route_archive(
    state: &AppState,
    method: &Method,
    home_id: &str,
    rest: &[&str],
) -> AppResult<ApiResponse> {
    let home = match (method, rest) {
        (&Method::POST, [item_id, "restore"]) => lists::restore_archived_item(state, home_id, item_id)?,
        (&Method::DELETE, [item_id]) => lists::delete_archived_item(state, home_id, item_id)?,
        (&Method::DELETE, []) => lists::clear_archive(state, home_id)?,
        _ => return Err(unknown_route(method, home_id, "archive", rest)),
    };
    ApiResponse::ok(&home)
}

fn route_templates(
    state: &AppState,
    method: &Method,
    home_id: &str,
    rest: &[&str],
    body: &[u8],
) -> AppResult<ApiResponse> {
    let home = match (method, rest) {
        (&Method::POST, []) => templates::save_template(state, home_id, parse_body(body)?)?,
        (&Method::POST, [name, "apply"]) => templates::apply_template(state, home_id, name)?,
        (&Method::DELETE, [name]) => templates::delete_template(state, home_id, name)?,
        _ => return Err(unknown_route(method, home_id, "templates", rest)),
    };
    ApiResponse::ok(&home)
}

fn route_finance(
    state: &AppState,
    method: &Method,
    home_id: &str,
    rest: &[&str],
    body: &[u8],
) -> AppResult<ApiResponse> {
    if let (&Method::GET, ["summary", year, month]) = (method, rest) {
        let year: i32 = parse_number(year, "年")?;
        let month: u32 = parse_number(month, "月")?;
        return ApiResponse::ok(&finances::get_summary(state, home_id, year, month)?);
    }

    let home: Home = match (method, rest) {
        (&Method::POST, ["bills"]) => finances::add_bill(state, home_id, parse_body(body)?)?,
        (&Method::PUT, ["bills", id]) => finances::update_bill(state, home_id, id, parse_body(body)?)?,
        (&Method::DELETE, ["bills", id]) => finances::delete_bill(state, home_id, id)?,
        (&Method::POST, ["bills", id, "pay"]) => finances::pay_bill(state, home_id, id)?,
        (&Method::DELETE, ["paid-bills", id]) => finances::delete_paid_bill(state, home_id, id)?,

        (&Method::POST, ["income"]) => finances::add_income(state, home_id, parse_body(body)?)?,
        (&Method::PUT, ["income", id]) => {
            finances::update_income(state, home_id, id, parse_body(body)?)?
        }
        (&Method::DELETE, ["income", id]) => finances::delete_income(state, home_id, id)?,

        (&Method::POST, ["savings-goals"]) => {
            finances::add_savings_goal(state, home_id, parse_body(body)?)?
        }
        (&Method::PUT, ["savings-goals", id]) => {
            finances::update_savings_goal(state, home_id, id, parse_body(body)?)?
        }
        (&Method::DELETE, ["savings-goals", id]) => finances::delete_savings_goal(state, home_id, id)?,
        (&Method::POST, ["savings-goals", id, "deposit"]) => {
            finances::deposit(state, home_id, id, parse_body(body)?)?
        }

        (&Method::POST, ["budgets"]) => {
            finances::add_expense_category(state, home_id, parse_body(body)?)?
        }
        (&Method::PUT, ["budgets", name]) => {
            finances::update_expense_category(state, home_id, name, parse_body(body)?)?
        }
        (&Method::DELETE, ["budgets", name]) => {
            finances::delete_expense_category(state, home_id, name)?
        }

        (&Method::PUT, ["settings"]) => finances::update_settings(state, home_id, parse_body(body)?)?,

        _ => return Err(unknown_route(method, home_id, "finance", rest)),
    };
    ApiResponse::ok(&home)
}

fn route_list(
    state: &AppState,
    method: &Method,
    home_id: &str,
    list_type: ListType,
    rest: &[&str],
    query: Option<&str>,
    body: &[u8],
) -> AppResult<ApiResponse> {
    let home = match (method, rest) {
        (&Method::POST, []) => lists::add_item(state, home_id, list_type, parse_body(body)?)?,
        (&Method::POST, ["clear-completed"]) => lists::clear_completed(state, home_id, list_type)?,
        (&Method::DELETE, ["clear"]) => lists::clear_list(state, home_id, list_type)?,
        (&Method::POST, ["group"]) => lists::group_items(state, home_id, list_type, parse_body(body)?)?,
        (&Method::POST, [folder_id, "ungroup"]) => {
            lists::ungroup_folder(state, home_id, list_type, folder_id)?
        }
        (&Method::PUT, [item_id]) => {
            lists::update_item(state, home_id, list_type, item_id, parse_body(body)?)?
        }
        (&Method::DELETE, [item_id]) => {
            lists::remove_item(state, home_id, list_type, item_id, is_permanent(query))?
        }
        _ => return Err(unknown_route(method, home_id, list_type.as_str(), rest)),
    };
    ApiResponse::ok(&home)
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> AppResult<T> {
    if body.is_empty() {
        return Err(AppError::validation("リクエスト本文が空です"));
    }
    Ok(serde_json::from_slice(body)?)
}

fn parse_number<T: std::str::FromStr>(value: &str, field: &str) -> AppResult<T> {
    value
        .parse()
        .map_err(|_| AppError::validation(format!("{field}は数値で指定してください: {value}")))
}

/// `?permanent=true` の判定
fn is_permanent(query: Option<&str>) -> bool {
    query
        .map(|q| {
            form_urlencoded::parse(q.as_bytes())
                .any(|(key, value)| key == "permanent" && value == "true")
        })
        .unwrap_or(false)
}

/// パスセグメントのパーセントデコード（`+` `&` `=` はそのまま）
fn decode_segment(segment: &str) -> AppResult<String> {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| AppError::validation(format!("パスがUTF-8として不正です: {e}")))
}

fn unknown_route(method: &Method, home_id: &str, area: &str, rest: &[&str]) -> AppError {
    AppError::not_found(format!(
        "ルート {method} /homes/{home_id}/{area}/{}",
        rest.join("/")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_state;

    async fn call(state: &AppState, method: Method, path: &str, body: Value) -> ApiResponse {
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path, None),
        };
        let body = if body.is_null() {
            Vec::new()
        } else {
            serde_json::to_vec(&body).unwrap()
        };
        dispatch(state, &method, path, query, &body).await
    }

    async fn create(state: &AppState) -> String {
        let response = call(
            state,
            Method::POST,
            "/homes",
            json!({"name": "Levi", "accessCode": "4321", "initialUserName": "Dana"}),
        )
        .await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let state = test_state();
        let response = call(&state, Method::GET, "/health", Value::Null).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["status"], "ok");
    }

    #[tokio::test]
    async fn test_home_lifecycle_and_login() {
        let state = test_state();
        let id = create(&state).await;

        let response = call(
            &state,
            Method::POST,
            "/homes/login",
            json!({"name": "levi", "accessCode": "4321"}),
        )
        .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["id"], id.as_str());
        assert!(response.body.get("accessCode").is_none());

        let response = call(
            &state,
            Method::POST,
            "/homes/login",
            json!({"name": "Levi", "accessCode": "0000"}),
        )
        .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body["error"]["code"], "UNAUTHORIZED");
        assert!(response.body["error"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_item_archive_and_permanent_delete() {
        let state = test_state();
        let id = create(&state).await;

        let response = call(
            &state,
            Method::POST,
            &format!("/homes/{id}/shopping"),
            json!({"text": "Milk"}),
        )
        .await;
        assert_eq!(response.status, StatusCode::OK);
        let milk = response.body["shoppingList"][0]["id"].as_str().unwrap().to_string();

        let response = call(
            &state,
            Method::DELETE,
            &format!("/homes/{id}/shopping/{milk}"),
            Value::Null,
        )
        .await;
        assert_eq!(response.body["archivedItems"][0]["originalList"], "shopping");

        let response = call(
            &state,
            Method::POST,
            &format!("/homes/{id}/archive/{milk}/restore"),
            Value::Null,
        )
        .await;
        assert_eq!(response.body["shoppingList"][0]["text"], "Milk");

        let response = call(
            &state,
            Method::DELETE,
            &format!("/homes/{id}/shopping/{milk}?permanent=true"),
            Value::Null,
        )
        .await;
        assert_eq!(response.body["shoppingList"], json!([]));
        assert_eq!(response.body["archivedItems"], json!([]));
    }

    #[tokio::test]
    async fn test_unknown_list_type_is_bad_request() {
        let state = test_state();
        let id = create(&state).await;

        let response = call(
            &state,
            Method::POST,
            &format!("/homes/{id}/groceries"),
            json!({"text": "Milk"}),
        )
        .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_missing_home_and_route() {
        let state = test_state();

        let response = call(&state, Method::GET, "/homes/missing", Value::Null).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);

        let response = call(&state, Method::PATCH, "/nowhere", Value::Null).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let state = test_state();
        let id = create(&state).await;

        let response = dispatch(
            &state,
            &Method::POST,
            &format!("/homes/{id}/tasks"),
            None,
            b"{not json",
        )
        .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"]["code"], "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_users_with_encoded_names() {
        let state = test_state();
        let id = create(&state).await;

        call(
            &state,
            Method::POST,
            &format!("/homes/{id}/users"),
            json!({"name": "Avi Cohen"}),
        )
        .await;
        let response = call(
            &state,
            Method::DELETE,
            &format!("/homes/{id}/users/Avi%20Cohen"),
            Value::Null,
        )
        .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["users"].as_array().unwrap().len(), 1);

        let response = call(
            &state,
            Method::DELETE,
            &format!("/homes/{id}/users/Dana"),
            Value::Null,
        )
        .await;
        assert_eq!(response.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_finance_routes() {
        let state = test_state();
        let id = create(&state).await;

        let response = call(
            &state,
            Method::POST,
            &format!("/homes/{id}/finance/bills"),
            json!({
                "text": "Rent",
                "amount": 4500,
                "dueDate": "2024-03-01",
                "recurring": {"frequency": "monthly"}
            }),
        )
        .await;
        assert_eq!(response.status, StatusCode::OK);
        let bill = response.body["finances"]["expectedBills"][0]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = call(
            &state,
            Method::POST,
            &format!("/homes/{id}/finance/bills/{bill}/pay"),
            Value::Null,
        )
        .await;
        assert_eq!(response.body["finances"]["paidBills"].as_array().unwrap().len(), 1);
        assert_eq!(
            response.body["finances"]["expectedBills"][0]["dueDate"],
            "2024-04-01"
        );

        let response = call(
            &state,
            Method::GET,
            &format!("/homes/{id}/finance/summary/2024/13"),
            Value::Null,
        )
        .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);

        let response = call(
            &state,
            Method::GET,
            &format!("/homes/{id}/finance/summary/2024/abc"),
            Value::Null,
        )
        .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ai_disabled_is_bad_gateway() {
        let state = test_state();
        let id = create(&state).await;

        let response = call(
            &state,
            Method::POST,
            &format!("/homes/{id}/ai/transform-recipe"),
            json!({"text": "Shakshuka"}),
        )
        .await;
        assert_eq!(response.status, StatusCode::BAD_GATEWAY);
        assert_eq!(response.body["error"]["code"], "UPSTREAM_SERVICE_ERROR");
    }

    #[tokio::test]
    async fn test_names_with_query_characters() {
        use crate::features::client::request::HomeRequest;

        let state = test_state();
        let id = create(&state).await;

        for name in ["Tom & Jerry", "x=y"] {
            let response = call(
                &state,
                Method::POST,
                &format!("/homes/{id}/users"),
                json!({ "name": name }),
            )
            .await;
            assert_eq!(response.status, StatusCode::OK);
        }

        let base = url::Url::parse("http://localhost:8080").unwrap();
        let path = HomeRequest::RemoveUser {
            name: "Tom & Jerry".to_string(),
        }
        .route(&id)
        .unwrap()
        .url(&base)
        .unwrap()
        .path()
        .to_string();
        let response = call(&state, Method::DELETE, &path, Value::Null).await;
        assert_eq!(response.status, StatusCode::OK);

        let response = call(
            &state,
            Method::DELETE,
            &format!("/homes/{id}/users/x=y"),
            Value::Null,
        )
        .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["users"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_utf8_path_is_bad_request() {
        let state = test_state();
        let response = call(&state, Method::GET, "/homes/%FF", Value::Null).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_decode_segment_and_permanent_flag() {
        assert_eq!(decode_segment("Avi%20Cohen").unwrap(), "Avi Cohen");
        assert_eq!(decode_segment("a+b").unwrap(), "a+b");
        assert_eq!(decode_segment("a=b&c").unwrap(), "a=b&c");
        assert!(is_permanent(Some("permanent=true")));
        assert!(!is_permanent(Some("permanent=false")));
        assert!(!is_permanent(None));
    }
}
