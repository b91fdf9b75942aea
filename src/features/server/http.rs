use super::router::{dispatch, ApiResponse};
use crate::shared::errors::{AppError, AppResult};
use crate::AppState;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

/// 指定アドレスでリスナーを作成する
pub async fn bind(addr: SocketAddr) -> AppResult<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    log::info!("HTTPサーバーを開始しました: http://{}", listener.local_addr()?);
    Ok(listener)
}

/// `shutdown` が完了するまで接続を受け付ける
///
/// 各接続は独立したタスクで処理し、接続単位の失敗はログに残すだけでサーバーは止めない。
pub async fn serve<F>(state: Arc<AppState>, listener: TcpListener, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, state).await {
                            log::error!("接続処理エラー: peer={peer}, error={}", e.details());
                        }
                    });
                }
                Err(e) => {
                    log::error!("接続受け入れエラー: {e}");
                    return Err(AppError::from(e));
                }
            },
            _ = &mut shutdown => {
                log::info!("HTTPサーバーを停止します");
                return Ok(());
            }
        }
    }
}

/// TCP接続を処理する
async fn handle_connection(stream: TcpStream, state: Arc<AppState>) -> AppResult<()> {
    let io = TokioIo::new(stream);
    let service = service_fn(move |req| handle_request(req, Arc::clone(&state)));

    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
        log::warn!("HTTP接続処理エラー: {err}");
    }
    Ok(())
}

/// HTTPリクエストを処理する
async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let response = match body.collect().await {
        Ok(collected) => {
            let bytes = collected.to_bytes();
            dispatch(
                &state,
                &parts.method,
                parts.uri.path(),
                parts.uri.query(),
                &bytes,
            )
            .await
        }
        Err(e) => {
            log::warn!("リクエスト本文の読み込みに失敗しました: {e}");
            ApiResponse::from_error(&AppError::validation("リクエスト本文を読み込めませんでした"))
        }
    };

    Ok(into_http_response(response))
}

fn into_http_response(response: ApiResponse) -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(&response.body).unwrap_or_default();
    let mut http_response = Response::new(Full::new(Bytes::from(body)));
    *http_response.status_mut() = response.status;
    http_response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    http_response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_state;
    use serde_json::{json, Value};
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_serves_json_over_tcp() {
        let state = Arc::new(test_state());
        let listener = bind(SocketAddr::from(([127, 0, 0, 1], 0))).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();

        let server = tokio::spawn(serve(state, listener, async move {
            let _ = stopped.await;
        }));

        let client = reqwest::Client::new();
        let health: Value = client
            .get(format!("http://{addr}/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");

        let response = client
            .post(format!("http://{addr}/homes"))
            .json(&json!({"name": "Levi", "accessCode": "4321", "initialUserName": "Dana"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        assert_eq!(
            response.headers()["content-type"],
            "application/json; charset=utf-8"
        );

        let response = client
            .post(format!("http://{addr}/homes"))
            .json(&json!({"name": "levi", "accessCode": "9999", "initialUserName": "Avi"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 409);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"]["code"], "CONFLICT");

        stop.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
