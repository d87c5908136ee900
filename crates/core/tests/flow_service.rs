//! End-to-end behaviour of `FlowService` over in-memory ports.

mod support;

use authbridge_core::{
    AuthMethod, Credentials, GetTokenRequest, RedirectTarget, StartFlowRequest, TokenPayload,
};
use authbridge_domain::{BridgeError, CacheMode, Platform, TokenRecord};
use support::{state_from_url, token_set, Harness};

fn start(
    user: &str,
    platform: Platform,
    challenge: Option<&str>,
    mode: CacheMode,
) -> StartFlowRequest {
    StartFlowRequest {
        provider: "google".into(),
        user_id: user.into(),
        platform,
        return_scheme: Some("myapp".into()),
        challenge: challenge.map(str::to_string),
        cache_mode: mode,
    }
}

fn challenge_credentials(user: &str, challenge: &str) -> Credentials {
    Credentials {
        assertion: None,
        user_id: Some(user.into()),
        challenge: Some(challenge.into()),
    }
}

#[tokio::test]
async fn start_flow_builds_provider_url_and_registers_challenge() {
    let h = Harness::new();

    let url = h
        .service
        .start_flow(start("alice", Platform::Ios, Some("xyz"), CacheMode::Persistent))
        .await
        .expect("flow starts");

    assert!(url.starts_with("https://accounts.example.com/o/oauth2/auth?"));
    assert!(url.contains("client_id=google-client"));
    assert!(url.contains("access_type=offline"));
    assert!(url.contains("prompt=consent"));
    assert!(url.contains("login_hint=alice"));
    assert_eq!(state_from_url(&url), "google:alice:ios:myapp:persistent");
    assert_eq!(h.challenges.len(), 1);
}

#[tokio::test]
async fn start_flow_rejects_missing_user_and_unknown_provider() {
    let h = Harness::new();

    let err = h
        .service
        .start_flow(start("", Platform::Ios, None, CacheMode::Persistent))
        .await
        .expect_err("user is required");
    assert!(matches!(err, BridgeError::BadRequest(_)));

    let mut request = start("alice", Platform::Ios, Some("xyz"), CacheMode::Persistent);
    request.provider = "github".into();
    let err = h.service.start_flow(request).await.expect_err("provider is unknown");
    assert!(matches!(err, BridgeError::UnknownProvider(p) if p == "github"));
    assert!(h.challenges.is_empty());
}

#[tokio::test]
async fn start_flow_rejects_delimiter_in_user_id() {
    let h = Harness::new();

    let err = h
        .service
        .start_flow(start("ali:ce", Platform::Ios, None, CacheMode::Persistent))
        .await
        .expect_err("delimiter rejected");
    assert!(matches!(err, BridgeError::BadRequest(_)));
}

#[tokio::test]
async fn challenge_flow_delivers_token_once() {
    let h = Harness::new();
    h.provider.queue_exchange(Ok(token_set("at-0", Some("rt-1"))));
    h.provider.queue_refresh(Ok(token_set("at-1", None)));

    let url = h
        .service
        .start_flow(start("alice", Platform::Ios, Some("xyz"), CacheMode::Persistent))
        .await
        .expect("flow starts");
    h.service.complete_flow(&state_from_url(&url), "CODE1").await.expect("callback succeeds");
    assert_eq!(h.provider.exchanged_codes(), vec!["CODE1"]);

    let request = GetTokenRequest {
        provider: "google".into(),
        cache_mode: CacheMode::Persistent,
        credentials: challenge_credentials("alice", "xyz"),
    };
    let payload = h.service.get_token(request.clone()).await.expect("token delivered");

    assert_eq!(payload.access_token(), "at-1");
    let jwt = payload.jwt().expect("challenge success mints an assertion");
    assert_eq!(h.signer.verify(jwt).expect("valid assertion").subject, "alice");
    assert_eq!(h.provider.refreshed_with(), vec!["rt-1"]);

    let err = h.service.get_token(request).await.expect_err("challenge is single use");
    assert!(matches!(err, BridgeError::Unauthorized(_)));
}

#[tokio::test]
async fn persistent_callback_stores_encrypted_refresh_token() {
    let h = Harness::new();
    h.provider.queue_exchange(Ok(token_set("at", Some("rt-secret"))));

    let outcome = h
        .service
        .complete_flow("google:alice:desktop::persistent", "CODE1")
        .await
        .expect("callback succeeds");

    assert_eq!(outcome.platform, Platform::Desktop);
    assert_eq!(outcome.target, RedirectTarget::Page { provider: "google".into() });

    let record = h.tokens.get("google", "alice").expect("record written");
    assert_ne!(record.encrypted_refresh_token, "rt-secret");
    assert_eq!(
        h.cipher.decrypt_from_string(&record.encrypted_refresh_token).expect("decrypts"),
        "rt-secret"
    );
}

#[tokio::test]
async fn mobile_callback_deep_links_with_assertion() {
    let h = Harness::new();
    h.provider.queue_exchange(Ok(token_set("at", Some("rt"))));

    let outcome = h
        .service
        .complete_flow("google:alice:android:myapp:persistent", "CODE1")
        .await
        .expect("callback succeeds");

    let RedirectTarget::DeepLink(link) = outcome.target else {
        panic!("mobile platforms deep link");
    };
    assert!(link.starts_with("myapp://auth/callback?jwt="));
    assert!(link.ends_with("&provider=google&user=alice"));

    let jwt = link
        .split_once("jwt=")
        .and_then(|(_, rest)| rest.split('&').next())
        .expect("jwt parameter");
    assert_eq!(h.signer.verify(jwt).expect("valid assertion").subject, "alice");
}

#[tokio::test]
async fn mobile_callback_without_scheme_uses_default() {
    let h = Harness::new();
    h.provider.queue_exchange(Ok(token_set("at", Some("rt"))));

    let outcome = h
        .service
        .complete_flow("google:alice:ios::persistent", "CODE1")
        .await
        .expect("callback succeeds");

    assert!(matches!(
        outcome.target,
        RedirectTarget::DeepLink(link) if link.starts_with("authbridge://auth/callback?")
    ));
}

#[tokio::test]
async fn malformed_state_is_rejected_before_exchange() {
    let h = Harness::new();

    let err = h
        .service
        .complete_flow("google:alice:ios", "CODE1")
        .await
        .expect_err("short state");

    assert!(matches!(err, BridgeError::InvalidState(_)));
    assert!(h.provider.exchanged_codes().is_empty());
}

#[tokio::test]
async fn missing_refresh_token_fails_persistent_exchange() {
    let h = Harness::new();
    h.provider.queue_exchange(Ok(token_set("at", None)));

    let err = h
        .service
        .complete_flow("google:alice:ios:myapp:persistent", "CODE1")
        .await
        .expect_err("refresh token required");

    assert!(matches!(err, BridgeError::ExchangeFailed(_)));
    assert_eq!(h.tokens.len(), 0);
}

#[tokio::test]
async fn rejected_code_surfaces_exchange_failure() {
    let h = Harness::new();

    let err = h
        .service
        .complete_flow("google:alice:ios:myapp:persistent", "BAD")
        .await
        .expect_err("provider rejects code");

    assert!(matches!(err, BridgeError::ExchangeFailed(_)));
    assert_eq!(h.tokens.len(), 0);
}

#[tokio::test]
async fn ephemeral_tokens_are_single_use() {
    let h = Harness::new();
    h.provider.queue_exchange(Ok(token_set("at-eph", None)));

    h.service
        .complete_flow("google:alice:desktop::ephemeral", "CODE1")
        .await
        .expect("ephemeral flow accepts access-token-only responses");
    assert_eq!(h.tokens.len(), 0);

    let assertion = h.signer.issue("alice").expect("assertion");
    let request = GetTokenRequest {
        provider: "google".into(),
        cache_mode: CacheMode::Ephemeral,
        credentials: Credentials { assertion: Some(assertion), ..Credentials::default() },
    };

    let payload = h.service.get_token(request.clone()).await.expect("first read");
    assert!(matches!(
        &payload,
        TokenPayload::Ephemeral { access_token, expires_in: 3600, jwt: None, .. }
            if access_token == "at-eph"
    ));

    let err = h.service.get_token(request).await.expect_err("second read");
    assert!(matches!(err, BridgeError::NotLoggedIn(_)));
}

#[tokio::test]
async fn invalid_assertion_does_not_fall_back_to_challenge() {
    let h = Harness::new();
    h.challenges.register("alice", "xyz", Platform::Ios);

    let credentials = Credentials {
        assertion: Some("not-a-jwt".into()),
        user_id: Some("alice".into()),
        challenge: Some("xyz".into()),
    };
    let err = h.service.authenticate(&credentials).expect_err("bad assertion");

    assert!(matches!(err, BridgeError::Unauthorized(_)));
    assert_eq!(h.challenges.len(), 1, "challenge must survive a rejected assertion");
}

#[tokio::test]
async fn valid_assertion_authenticates_subject() {
    let h = Harness::new();
    let assertion = h.signer.issue("bob").expect("assertion");

    let auth = h
        .service
        .authenticate(&Credentials {
            assertion: Some(assertion),
            user_id: Some("alice".into()),
            challenge: None,
        })
        .expect("assertion accepted");

    assert_eq!(auth.user_id, "bob");
    assert_eq!(auth.method, AuthMethod::Assertion);
    assert!(auth.issued_assertion.is_none());
}

#[tokio::test]
async fn missing_credentials_are_unauthorized() {
    let h = Harness::new();

    let err = h.service.authenticate(&Credentials::default()).expect_err("no credentials");
    assert!(matches!(err, BridgeError::Unauthorized(_)));

    let err = h
        .service
        .authenticate(&challenge_credentials("alice", "never-registered"))
        .expect_err("unknown challenge");
    assert!(matches!(err, BridgeError::Unauthorized(_)));
}

#[tokio::test]
async fn rotated_refresh_token_is_persisted() {
    let h = Harness::new();
    let sealed = h.cipher.encrypt_to_string("rt-old").expect("sealed");
    h.tokens.insert(TokenRecord::new("google", "alice", sealed));
    h.provider.queue_refresh(Ok(token_set("at", Some("rt-new"))));

    h.service
        .retrieve_access_token("google", "alice", CacheMode::Persistent)
        .await
        .expect("refresh succeeds");

    let record = h.tokens.get("google", "alice").expect("record");
    let stored = h.cipher.decrypt_from_string(&record.encrypted_refresh_token).expect("decrypts");
    assert_eq!(stored, "rt-new");
    assert_eq!(h.tokens.write_count(), 1);
}

#[tokio::test]
async fn unchanged_refresh_token_is_not_rewritten() {
    let h = Harness::new();
    let sealed = h.cipher.encrypt_to_string("rt-same").expect("sealed");
    h.tokens.insert(TokenRecord::new("google", "alice", sealed));
    h.provider.queue_refresh(Ok(token_set("at-1", Some("rt-same"))));
    h.provider.queue_refresh(Ok(token_set("at-2", None)));

    for _ in 0..2 {
        h.service
            .retrieve_access_token("google", "alice", CacheMode::Persistent)
            .await
            .expect("refresh succeeds");
    }

    assert_eq!(h.tokens.write_count(), 0);
}

#[tokio::test]
async fn rotation_write_failure_is_swallowed() {
    let h = Harness::new();
    let sealed = h.cipher.encrypt_to_string("rt-old").expect("sealed");
    h.tokens.insert(TokenRecord::new("google", "alice", sealed.clone()));
    h.tokens.fail_writes(true);
    h.provider.queue_refresh(Ok(token_set("at", Some("rt-new"))));

    let tokens = h
        .service
        .retrieve_access_token("google", "alice", CacheMode::Persistent)
        .await
        .expect("access token still delivered");

    assert_eq!(tokens.access_token, "at");
    assert_eq!(h.tokens.get("google", "alice").expect("record").encrypted_refresh_token, sealed);
}

#[tokio::test]
async fn lookup_ignores_case_of_provider_and_user() {
    let h = Harness::new();
    let sealed = h.cipher.encrypt_to_string("rt").expect("sealed");
    h.tokens.insert(TokenRecord::new("google", "Alice", sealed));
    h.provider.queue_refresh(Ok(token_set("at", None)));

    let tokens = h
        .service
        .retrieve_access_token("google", "alice", CacheMode::Persistent)
        .await
        .expect("case-insensitive hit");
    assert_eq!(tokens.access_token, "at");
}

#[tokio::test]
async fn retrieval_failures_map_to_taxonomy() {
    let h = Harness::new();

    let err = h
        .service
        .retrieve_access_token("google", "nobody", CacheMode::Persistent)
        .await
        .expect_err("nothing stored");
    assert!(matches!(err, BridgeError::NotLoggedIn(_)));

    h.tokens.insert(TokenRecord::new("google", "mallory", "bm90IGEgc2VhbGVkIHZhbHVl"));
    let err = h
        .service
        .retrieve_access_token("google", "mallory", CacheMode::Persistent)
        .await
        .expect_err("garbage ciphertext");
    assert!(matches!(err, BridgeError::DecryptFailed(_)));

    let sealed = h.cipher.encrypt_to_string("rt").expect("sealed");
    h.tokens.insert(TokenRecord::new("google", "carol", sealed));
    let err = h
        .service
        .retrieve_access_token("google", "carol", CacheMode::Persistent)
        .await
        .expect_err("provider rejects refresh");
    assert!(matches!(err, BridgeError::RefreshFailed(_)));
}

#[tokio::test]
async fn get_token_requires_provider() {
    let h = Harness::new();
    h.challenges.register("alice", "xyz", Platform::Ios);

    let err = h
        .service
        .get_token(GetTokenRequest {
            provider: String::new(),
            cache_mode: CacheMode::Persistent,
            credentials: challenge_credentials("alice", "xyz"),
        })
        .await
        .expect_err("provider required");

    assert!(matches!(err, BridgeError::BadRequest(_)));
    assert_eq!(h.challenges.len(), 1);
}
