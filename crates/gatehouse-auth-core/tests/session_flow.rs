//! End-to-end session flows through the public API
//!
//! Drives login, request authentication, redirect continuation and logout
//! against a simulated browser cookie jar.

mod common;

use chrono::TimeDelta;
use common::{memory_service, service_with, FailingUserStore, SlowUserStore, TEST_SECRET};
use gatehouse_auth_core::{
    AuthConfig, AuthError, Clock, CookieJar, ManualClock, NewAccount, ResponseCookies, TokenError,
    REDIRECT_COOKIE_NAME, SESSION_COOKIE_NAME,
};
use gatehouse_db::InMemoryUserStore;
use gatehouse_types::{User, UserId};
use std::sync::Arc;
use std::time::Duration;

fn ada() -> NewAccount {
    NewAccount {
        name: "Ada".to_string(),
        email: "a@example.com".to_string(),
        password: "secret123".to_string(),
    }
}

#[tokio::test]
async fn test_login_sets_cookie_expiring_after_ttl() {
    let clock = ManualClock::starting_now();
    let (service, _) = memory_service(&clock);
    service.register(ada(), &mut ResponseCookies::new()).await.unwrap();

    let mut response = ResponseCookies::new();
    let user = service
        .login("a@example.com", "secret123", &mut response)
        .await
        .unwrap();

    let cookie = response.get(SESSION_COOKIE_NAME).unwrap();
    let expected = clock.now() + TimeDelta::hours(5);
    assert!((cookie.expires - expected).num_seconds().abs() <= 1);
    assert!(cookie.options.http_only);
    assert_eq!(cookie.options.path, "/");

    let mut client = CookieJar::new();
    client.apply(&response, clock.now());
    assert!(service.gate().is_authenticated(&client));
    let current = service.gate().current_user(&client).await.unwrap();
    assert_eq!(current.id, user.id);
    assert_eq!(current.email, "a@example.com");
}

#[tokio::test]
async fn test_request_without_cookie_is_anonymous() {
    let clock = ManualClock::starting_now();
    let (service, _) = memory_service(&clock);
    let client = CookieJar::new();
    assert!(!service.gate().is_authenticated(&client));
    assert!(service.gate().current_user(&client).await.is_none());
}

#[tokio::test]
async fn test_token_six_hours_later_is_expired() {
    let clock = ManualClock::starting_now();
    let (service, _) = memory_service(&clock);
    let mut response = ResponseCookies::new();
    service.register(ada(), &mut response).await.unwrap();
    let mut client = CookieJar::new();
    client.apply(&response, clock.now());

    clock.advance(TimeDelta::hours(6));
    assert!(!service.gate().is_authenticated(&client));
    assert!(matches!(
        service.gate().identify(&client),
        Err(AuthError::Token(TokenError::Expired))
    ));
}

#[tokio::test]
async fn test_redirect_continuation_survives_login() {
    let clock = ManualClock::starting_now();
    let (service, _) = memory_service(&clock);
    service.register(ada(), &mut ResponseCookies::new()).await.unwrap();
    let mut client = CookieJar::new();

    // Anonymous visit carrying a destination
    let mut first = ResponseCookies::new();
    assert!(service.redirects().capture(Some("/dashboard"), &mut first));
    client.apply(&first, clock.now());
    assert_eq!(client.get(REDIRECT_COOKIE_NAME), Some("/dashboard"));

    // Credentials posted without the query parameter
    let mut second = ResponseCookies::new();
    service
        .login("a@example.com", "secret123", &mut second)
        .await
        .unwrap();
    let redirect = service
        .redirects()
        .consume_and_redirect(None, &client, &mut second, "/");
    client.apply(&second, clock.now());

    assert_eq!(redirect.location(), "/dashboard");
    assert!(!client.contains(REDIRECT_COOKIE_NAME));
    assert!(service.gate().is_authenticated(&client));
}

#[tokio::test]
async fn test_deleted_user_resolves_to_none() {
    let clock = ManualClock::starting_now();
    let (service, store) = memory_service(&clock);
    let mut response = ResponseCookies::new();
    let user = service.register(ada(), &mut response).await.unwrap();
    let mut client = CookieJar::new();
    client.apply(&response, clock.now());

    store.delete(user.id.0);
    assert!(service.gate().current_user(&client).await.is_none());
}

#[tokio::test]
async fn test_tampered_cookie_is_anonymous() {
    let clock = ManualClock::starting_now();
    let (service, _) = memory_service(&clock);
    let mut response = ResponseCookies::new();
    service.register(ada(), &mut response).await.unwrap();

    let token = response.get(SESSION_COOKIE_NAME).unwrap().value.clone();
    let mut forged = token.into_bytes();
    let last = forged.len() - 1;
    forged[last] = if forged[last] == b'A' { b'B' } else { b'A' };
    let mut client = CookieJar::new();
    client.insert(SESSION_COOKIE_NAME, String::from_utf8(forged).unwrap());

    assert!(matches!(
        service.gate().identify(&client),
        Err(AuthError::Token(TokenError::InvalidSignature))
    ));
    assert!(service.gate().current_user(&client).await.is_none());
}

#[tokio::test]
async fn test_token_from_other_secret_is_rejected() {
    let clock = ManualClock::starting_now();
    let (service, _) = memory_service(&clock);
    let other = service_with(
        Arc::new(InMemoryUserStore::new()),
        &clock,
        AuthConfig::new("a-completely-different-secret-value-0123"),
    );
    let mut response = ResponseCookies::new();
    other.register(ada(), &mut response).await.unwrap();

    let mut client = CookieJar::new();
    client.apply(&response, clock.now());
    assert!(!service.gate().is_authenticated(&client));
}

#[tokio::test]
async fn test_failing_store_fails_closed() {
    let clock = ManualClock::starting_now();
    let service = service_with(
        Arc::new(FailingUserStore),
        &clock,
        AuthConfig::new(TEST_SECRET),
    );

    let login = service
        .login("a@example.com", "secret123", &mut ResponseCookies::new())
        .await;
    assert!(matches!(login, Err(AuthError::StoreUnavailable(_))));

    let user = User {
        id: UserId::new(),
        name: "Ada".to_string(),
        email: "a@example.com".to_string(),
        created_at: clock.now(),
    };
    let mut response = ResponseCookies::new();
    service.start_session(&user, &mut response).unwrap();
    let mut client = CookieJar::new();
    client.apply(&response, clock.now());

    assert!(service.gate().is_authenticated(&client));
    assert!(service.gate().current_user(&client).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_slow_store_times_out_to_anonymous() {
    let clock = ManualClock::starting_now();
    let inner = Arc::new(InMemoryUserStore::new());
    let slow = Arc::new(SlowUserStore::new(Arc::clone(&inner), Duration::from_secs(30)));
    let config = AuthConfig::new(TEST_SECRET).with_store_timeout(Duration::from_millis(100));
    let service = service_with(slow, &clock, config);

    let mut response = ResponseCookies::new();
    service.register(ada(), &mut response).await.unwrap();
    assert_eq!(inner.len(), 1);

    let mut client = CookieJar::new();
    client.apply(&response, clock.now());
    assert!(matches!(
        service.gate().load_user(&client).await,
        Err(AuthError::StoreUnavailable(_))
    ));
    assert!(service.gate().current_user(&client).await.is_none());
}
