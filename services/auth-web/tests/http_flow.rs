//! HTTP scenarios against the router on an in-memory store

use argon2::Params;
use async_trait::async_trait;
use auth_web::{build_router, AppState, Config};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::TimeDelta;
use gatehouse_auth_core::{AuthConfig, AuthService, CookieJar, CredentialVerifier, ManualClock};
use gatehouse_db::{DbError, DbResult, InMemoryUserStore, NewUser, UserRow, UserStore};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "http-flow-test-secret-0123456789abcdef!!";

// ============================================================================
// Harness
// ============================================================================

struct TestApp {
    router: Router,
    clock: ManualClock,
}

fn test_app_with(users: Arc<dyn UserStore>) -> TestApp {
    let clock = ManualClock::starting_now();
    let config = Config {
        http_port: 0,
        database_url: None,
        auth: AuthConfig::new(SECRET).with_store_timeout(Duration::from_millis(500)),
        request_timeout: Duration::from_secs(10),
        metrics_enabled: false,
        log_level: "info".to_string(),
    };
    let auth = AuthService::from_parts(
        config.auth.clone(),
        Arc::clone(&users),
        Arc::new(clock.clone()),
        CredentialVerifier::with_params(Params::new(1024, 1, 1, None).unwrap()),
    )
    .unwrap();
    let router = build_router(AppState::new(auth, users, config), None);
    TestApp { router, clock }
}

fn test_app() -> TestApp {
    test_app_with(Arc::new(InMemoryUserStore::new()))
}

/// Browser stand-in: keeps cookies between requests
struct Client<'a> {
    app: &'a TestApp,
    jar: CookieJar,
}

impl<'a> Client<'a> {
    fn new(app: &'a TestApp) -> Self {
        Self {
            app,
            jar: CookieJar::new(),
        }
    }

    async fn send(&mut self, mut request: Request<Body>) -> Response {
        if let Some(cookie) = self.jar.to_header_value() {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }
        let response = self.app.router.clone().oneshot(request).await.unwrap();
        for value in response.headers().get_all(header::SET_COOKIE) {
            let value = value.to_str().unwrap();
            let (pair, attributes) = value.split_once(';').unwrap_or((value, ""));
            let (name, cookie_value) = pair.split_once('=').unwrap();
            if cookie_value.is_empty() || attributes.contains("Max-Age=-1") {
                self.jar.remove(name);
            } else {
                self.jar.insert(name, cookie_value);
            }
        }
        response
    }

    async fn get(&mut self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> Response {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn register(&mut self, email: &str) -> Response {
        self.post_form(
            "/users",
            &[
                ("name", "Ada"),
                ("email", email),
                ("password", "secret123"),
                ("password_confirmation", "secret123"),
            ],
        )
        .await
    }

    async fn login(&mut self, email: &str, password: &str) -> Response {
        self.post_form("/sessions", &[("email", email), ("password", password)])
            .await
    }
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_anonymous_index() {
    let app = test_app();
    let mut client = Client::new(&app);
    let response = client.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Hello, guest"));
}

#[tokio::test]
async fn test_register_signs_in() {
    let app = test_app();
    let mut client = Client::new(&app);

    let response = client.register("a@example.com").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let set_cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .find(|v| v.starts_with("token="))
        .unwrap();
    assert!(set_cookie.contains("Path=/"));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Expires="));

    let index = body_text(client.get("/").await).await;
    assert!(index.contains("Hello, Ada"));
    assert!(index.contains("a@example.com"));
}

#[tokio::test]
async fn test_registration_validation_messages() {
    let app = test_app();
    let mut client = Client::new(&app);

    let blank = client.post_form("/users", &[]).await;
    assert_eq!(blank.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(blank).await.contains("Can&#39;t be blank"));

    let invalid = client
        .post_form(
            "/users",
            &[
                ("name", "Ada"),
                ("email", "not-an-email"),
                ("password", "secret123"),
                ("password_confirmation", "secret124"),
            ],
        )
        .await;
    assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(invalid).await;
    assert!(html.contains("Is invalid"));
    assert!(html.contains("Must be equals password"));
    assert!(client.jar.get("token").is_none());
}

#[tokio::test]
async fn test_duplicate_email_already_taken() {
    let app = test_app();
    let mut first = Client::new(&app);
    first.register("a@example.com").await;

    let mut second = Client::new(&app);
    let response = second.register("a@example.com").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("Already taken"));
    assert!(second.jar.get("token").is_none());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = test_app();
    Client::new(&app).register("a@example.com").await;

    let mut client = Client::new(&app);
    let wrong_password = client.login("a@example.com", "nope").await;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_password = body_text(wrong_password).await;

    let unknown_email = client.login("b@example.com", "secret123").await;
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    let unknown_email = body_text(unknown_email).await;

    assert_eq!(
        wrong_password.replace("a@example.com", ""),
        unknown_email.replace("b@example.com", "")
    );
    assert!(client.jar.get("token").is_none());
}

#[tokio::test]
async fn test_login_and_logout() {
    let app = test_app();
    Client::new(&app).register("a@example.com").await;

    let mut client = Client::new(&app);
    let response = client.login("a@example.com", "secret123").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(client.jar.get("token").is_some());
    assert_eq!(client.get("/account").await.status(), StatusCode::OK);

    let response = client.get("/sessions/destroy").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(client.jar.get("token").is_none());
    assert_eq!(client.get("/account").await.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_logout_when_anonymous_just_redirects() {
    let app = test_app();
    let mut client = Client::new(&app);
    let response = client.post_form("/sessions/destroy", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_redirect_continuation_through_login() {
    let app = test_app();
    Client::new(&app).register("a@example.com").await;
    let mut client = Client::new(&app);

    // Protected page detours through the login form
    let response = client.get("/account").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/sessions/new?redirect_to=%2Faccount");

    let response = client.get("/sessions/new?redirect_to=%2Faccount").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(client.jar.get("redirectTo"), Some("/account"));

    // The form posts without the query parameter; the side cookie carries it
    let response = client.login("a@example.com", "secret123").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/account");
    assert!(client.jar.get("redirectTo").is_none());

    let account = client.get("/account").await;
    assert_eq!(account.status(), StatusCode::OK);
    assert!(body_text(account).await.contains("Ada"));

    // Continuation was consumed; later decisions use the default
    let response = client.get("/sessions/new").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_failed_login_keeps_continuation() {
    let app = test_app();
    Client::new(&app).register("a@example.com").await;
    let mut client = Client::new(&app);

    client.get("/sessions/new?redirect_to=%2Fdashboard").await;
    client.login("a@example.com", "wrong").await;
    assert_eq!(client.jar.get("redirectTo"), Some("/dashboard"));

    let response = client.login("a@example.com", "secret123").await;
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn test_offsite_redirect_ignored() {
    let app = test_app();
    Client::new(&app).register("a@example.com").await;
    let mut client = Client::new(&app);

    client
        .get("/sessions/new?redirect_to=https%3A%2F%2Fevil.example%2F")
        .await;
    assert!(client.jar.get("redirectTo").is_none());

    let response = client.login("a@example.com", "secret123").await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_sign_out_link_cannot_ride_the_continuation() {
    let app = test_app();
    Client::new(&app).register("a@example.com").await;
    let mut client = Client::new(&app);

    client
        .get("/sessions/new?redirect_to=%2Fsessions%2Fdestroy")
        .await;
    assert!(client.jar.get("redirectTo").is_none());

    let response = client
        .post_form(
            "/sessions?redirect_to=%2Fsessions%2Fdestroy",
            &[("email", "a@example.com"), ("password", "secret123")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(client.get("/account").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_signed_in_users_bounced_from_guest_pages() {
    let app = test_app();
    let mut client = Client::new(&app);
    client.register("a@example.com").await;

    for uri in ["/sessions/new", "/users/new"] {
        let response = client.get(uri).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), "/");
    }
    let response = client.login("a@example.com", "secret123").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let response = client.register("b@example.com").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_expired_session_is_anonymous() {
    let app = test_app();
    let mut client = Client::new(&app);
    client.register("a@example.com").await;
    assert_eq!(client.get("/account").await.status(), StatusCode::OK);

    app.clock.advance(TimeDelta::hours(6));
    let response = client.get("/account").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(body_text(client.get("/").await).await.contains("Hello, guest"));
}

#[tokio::test]
async fn test_tampered_cookie_is_anonymous() {
    let app = test_app();
    let mut client = Client::new(&app);
    client.register("a@example.com").await;

    let token = client.jar.get("token").unwrap().to_string();
    let (signing_input, _) = token.rsplit_once('.').unwrap();
    client.jar.insert("token", format!("{signing_input}.AAAA"));

    assert_eq!(client.get("/account").await.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_health_and_request_id() {
    let app = test_app();
    let mut client = Client::new(&app);

    let response = client.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("healthy"));

    let response = client.get("/").await;
    assert!(response.headers().contains_key("x-request-id"));

    let response = client.get("/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains(r#""status":"ready""#));
    assert!(body.contains(r#""reachable":true"#));
    assert_eq!(client.get("/metrics").await.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Store outages
// ============================================================================

struct DownStore;

#[async_trait]
impl UserStore for DownStore {
    async fn find_by_id(&self, _: Uuid) -> DbResult<Option<UserRow>> {
        Err(DbError::Unavailable("down".into()))
    }

    async fn find_by_email(&self, _: &str) -> DbResult<Option<UserRow>> {
        Err(DbError::Unavailable("down".into()))
    }

    async fn insert(&self, _: NewUser) -> DbResult<UserRow> {
        Err(DbError::Unavailable("down".into()))
    }

    async fn exists_by_email(&self, _: &str) -> DbResult<bool> {
        Err(DbError::Unavailable("down".into()))
    }

    async fn ping(&self) -> DbResult<()> {
        Err(DbError::Unavailable("down".into()))
    }
}

#[tokio::test]
async fn test_store_outage() {
    let app = test_app_with(Arc::new(DownStore));
    let mut client = Client::new(&app);

    let response = client.get("/ready").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(body_text(response).await.contains(r#""reachable":false"#));
    assert_eq!(
        client.login("a@example.com", "secret123").await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(
        client.register("a@example.com").await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert!(body_text(client.get("/").await).await.contains("Hello, guest"));
}
