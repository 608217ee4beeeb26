use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{recommendations, records, schemes, settings, stats};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(schemes::router())
                .merge(records::router())
                .merge(recommendations::router())
                .merge(settings::router())
                .merge(stats::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    #[tokio::test]
    async fn health() {
        let app = build_app(AppState::fake().await);
        let res = app
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn duplicate_record_date_conflicts() {
        let app = build_app(AppState::fake().await);
        let body = json!({
            "date": "2024-03-01",
            "meals": {"A": "rice", "B": "tofu", "C": "soup"}
        });

        let (status, created) = call(&app, "POST", "/api/v1/records", Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["success"], true);
        assert_eq!(created["data"]["date"], "2024-03-01");

        let (status, err) = call(&app, "POST", "/api/v1/records", Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["success"], false);
    }

    #[tokio::test]
    async fn generate_then_confirm_consumes_pool() {
        let app = build_app(AppState::fake().await);

        let (status, before) = call(&app, "GET", "/api/v1/recommendations/pool", None).await;
        assert_eq!(status, StatusCode::OK);
        let remaining_a = before["data"]["remaining"]["A"].as_u64().unwrap();

        let (status, generated) = call(
            &app,
            "POST",
            "/api/v1/recommendations",
            Some(json!({"count": 2, "startDate": "2024-05-01"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let recs = generated["data"].as_array().unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0]["date"], "2024-05-01");
        assert_eq!(recs[1]["date"], "2024-05-02");
        let id = recs[0]["id"].as_str().unwrap().to_string();

        let uri = format!("/api/v1/recommendations/{id}/confirm");
        let (status, confirmed) = call(&app, "POST", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(confirmed["data"]["record"]["date"], "2024-05-01");

        let (_, after) = call(&app, "GET", "/api/v1/recommendations/pool", None).await;
        assert_eq!(
            after["data"]["remaining"]["A"].as_u64().unwrap(),
            remaining_a - 1
        );

        let (status, _) = call(&app, "POST", &uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn default_scheme_cannot_be_deleted() {
        let app = build_app(AppState::fake().await);
        let (_, schemes) = call(&app, "GET", "/api/v1/schemes", None).await;
        let id = schemes["data"][0]["id"].as_str().unwrap().to_string();

        let (status, _) = call(&app, "DELETE", &format!("/api/v1/schemes/{id}"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn stats_reject_unknown_granularity() {
        let app = build_app(AppState::fake().await);
        let (status, _) = call(&app, "GET", "/api/v1/stats?granularity=year", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, body) = call(&app, "GET", "/api/v1/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["overview"]["totalRecords"], 0);
    }
}
