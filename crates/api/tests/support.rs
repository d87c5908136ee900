use std::sync::Arc;

use authbridge_api::{build_router, AppContext};
use authbridge_domain::{AppConfig, ProviderClientConfig, SecurityConfig};
use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::MockServer;

pub const TOKEN_KEY: &str = "api-test-token-key";
pub const JWT_SECRET: &str = "api-test-jwt-secret";

/// Router over a real context: temp SQLite file, WireMock token endpoint.
pub struct TestApp {
    pub router: Router,
    pub ctx: Arc<AppContext>,
    pub provider: MockServer,
    _temp_dir: TempDir,
}

/// Collected response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .expect("response should carry a Location header")
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("body should be JSON")
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let provider = MockServer::start().await;
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let config = test_config(&temp_dir, &provider.uri());

        let ctx = Arc::new(AppContext::new(config).await.expect("context should build"));
        let router = build_router(Arc::clone(&ctx));

        Self { router, ctx, provider, _temp_dir: temp_dir }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::builder().uri(uri).body(Body::empty()).expect("request")).await
    }

    pub async fn get_with_bearer(&self, uri: &str, token: &str) -> TestResponse {
        let request = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .expect("request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.expect("router responds");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body collected");
        TestResponse { status, headers, body: String::from_utf8_lossy(&bytes).into_owned() }
    }

    /// Count stored refresh-token rows.
    pub fn token_rows(&self) -> i64 {
        let conn = self.ctx.db.get_connection().expect("connection");
        conn.query_row("SELECT COUNT(*) FROM tokens", [], |row| row.get(0)).expect("count")
    }
}

pub fn test_config(temp_dir: &TempDir, provider_uri: &str) -> AppConfig {
    let mut config = AppConfig {
        security: SecurityConfig {
            token_key: TOKEN_KEY.to_string(),
            assertion_secret: JWT_SECRET.to_string(),
        },
        providers: vec![ProviderClientConfig {
            provider: "google".into(),
            client_id: "test-client".into(),
            client_secret: "test-secret".into(),
            redirect_uri: "http://localhost:9090/callback".into(),
            scopes: vec!["openid".into(), "email".into()],
            auth_url: format!("{provider_uri}/auth"),
            token_url: format!("{provider_uri}/token"),
        }],
        ..AppConfig::default()
    };
    config.database.path = temp_dir.path().join("authbridge.db").to_string_lossy().into_owned();
    config.database.pool_size = 2;
    config
}

/// Decoded value of query parameter `name` in `url`.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| urlencoding::decode(value).expect("valid encoding").into_owned())
    })
}
