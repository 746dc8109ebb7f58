use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use loyalty_engine::{db_types::User, AuthApi, AuthApiError};

use super::{
    helpers::{call, get_request, post_request, token_issuer, valid_token},
    mocks::{MockAccountManager, MockAuthManager},
};
use crate::{
    auth::hash_password,
    routes::{LoginRoute, MyBalanceRoute, RegisterRoute},
};

const ALICE: &str = r#"{"login": "alice", "password": "correct horse"}"#;

fn configure_auth(auth_manager: MockAuthManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(RegisterRoute::<MockAuthManager>::new())
            .service(LoginRoute::<MockAuthManager>::new())
            .app_data(web::Data::new(AuthApi::new(auth_manager)));
    }
}

fn alice_with_password(password: &str) -> User {
    User { id: "u-1".into(), username: "alice".into(), password_hash: hash_password(password).unwrap() }
}

#[actix_web::test]
async fn register_logs_the_user_in() {
    let _ = env_logger::try_init().ok();
    let mut auth_manager = MockAuthManager::new();
    auth_manager
        .expect_create_user()
        .withf(|user| user.username == "alice" && user.password_hash.starts_with("$argon2id$"))
        .times(1)
        .returning(|user| Ok(User { id: "u-1".into(), username: user.username, password_hash: user.password_hash }));
    let req = TestRequest::post()
        .uri("/register")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(ALICE);
    let res = call(req, configure_auth(auth_manager)).await;
    assert_eq!(res.status, StatusCode::OK);
    let cookie = res.headers.get("set-cookie").expect("No cookie was set").to_str().unwrap();
    assert!(cookie.starts_with("Authorization="));
    let header = res.headers.get("authorization").expect("No Authorization header").to_str().unwrap();
    let token = header.strip_prefix("Bearer ").unwrap();
    let claims = token_issuer().validate(token).expect("Token should be valid");
    assert_eq!(claims.sub, "u-1");
    assert_eq!(claims.username, "alice");
    assert!(res.body.contains(token));
}

#[actix_web::test]
async fn register_with_taken_login() {
    let _ = env_logger::try_init().ok();
    let mut auth_manager = MockAuthManager::new();
    auth_manager.expect_create_user().returning(|user| Err(AuthApiError::UsernameTaken(user.username)));
    let (status, body) = post_request("", "/register", "application/json", ALICE, configure_auth(auth_manager)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"The login 'alice' is already taken"}"#);
}

#[actix_web::test]
async fn register_with_bad_requests() {
    let _ = env_logger::try_init().ok();
    for (content_type, body) in [
        ("application/json", "{not json"),
        ("application/json", r#"{"login": "alice"}"#),
        ("application/json", r#"{"login": "", "password": "pwd"}"#),
        ("application/json", r#"{"login": "alice", "password": ""}"#),
        ("text/plain", ALICE),
    ] {
        let mut auth_manager = MockAuthManager::new();
        auth_manager.expect_create_user().never();
        let (status, _) = post_request("", "/register", content_type, body, configure_auth(auth_manager)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{content_type} {body}");
    }
}

#[actix_web::test]
async fn login_with_correct_password() {
    let _ = env_logger::try_init().ok();
    let mut auth_manager = MockAuthManager::new();
    let alice = alice_with_password("correct horse");
    auth_manager
        .expect_fetch_user_by_username()
        .withf(|name| name == "alice")
        .returning(move |_| Ok(Some(alice.clone())));
    let req = TestRequest::post()
        .uri("/login")
        .insert_header(("Content-Type", "application/json; charset=utf-8"))
        .set_payload(ALICE);
    let res = call(req, configure_auth(auth_manager)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.headers.get("set-cookie").is_some());
}

#[actix_web::test]
async fn login_with_wrong_password_or_unknown_user() {
    let _ = env_logger::try_init().ok();
    let mut auth_manager = MockAuthManager::new();
    let alice = alice_with_password("battery staple");
    auth_manager.expect_fetch_user_by_username().returning(move |_| Ok(Some(alice.clone())));
    let (status, _) = post_request("", "/login", "application/json", ALICE, configure_auth(auth_manager)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut auth_manager = MockAuthManager::new();
    auth_manager.expect_fetch_user_by_username().returning(|_| Ok(None));
    let (status, body) = post_request("", "/login", "application/json", ALICE, configure_auth(auth_manager)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. Invalid login or password."}"#);
}

fn configure_balance(cfg: &mut ServiceConfig) {
    let mut account_manager = MockAccountManager::new();
    account_manager.expect_fetch_balance().returning(|_| Ok(Default::default()));
    cfg.service(MyBalanceRoute::<MockAccountManager>::new())
        .app_data(web::Data::new(loyalty_engine::AccountApi::new(account_manager)));
}

#[actix_web::test]
async fn protected_routes_need_a_valid_token() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request("", "/balance", configure_balance).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut token = valid_token();
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    let (status, _) = get_request(&token, "/balance", configure_balance).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get_request(&valid_token(), "/balance", configure_balance).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn token_in_cookie_is_accepted() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get()
        .uri("/balance")
        .cookie(actix_web::cookie::Cookie::new("Authorization", valid_token()));
    let res = call(req, configure_balance).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, r#"{"current":0.0,"withdrawn":0.0}"#);
}
