use std::time::Duration;

use actix_web::{
    body::MessageBody,
    http::{header::HeaderMap, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use log::debug;
use loyalty_engine::db_types::User;

use crate::{auth::TokenIssuer, config::AuthConfig};

// Test secret for issuing tokens. DO NOT re-use this anywhere.
pub const TEST_SECRET: &str = "b4db54f75421a02b0d0056fb7203df23c742b25e41283976bdaa7fe63de1ad23";

pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new(TEST_SECRET, Duration::from_secs(30 * 60))
}

pub fn token_issuer() -> TokenIssuer {
    TokenIssuer::new(&get_auth_config())
}

pub fn test_user() -> User {
    User { id: "u-1".into(), username: "alice".into(), password_hash: String::new() }
}

pub fn valid_token() -> String {
    token_issuer().issue_token(&test_user()).expect("Failed to issue token")
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

pub async fn call(req: TestRequest, configure: impl FnOnce(&mut ServiceConfig)) -> TestResponse {
    let app = App::new().app_data(web::Data::new(token_issuer())).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let headers = res.headers().clone();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    TestResponse { status, headers, body }
}

pub async fn get_request(token: &str, path: &str, configure: impl FnOnce(&mut ServiceConfig)) -> (StatusCode, String) {
    let mut req = TestRequest::get().uri(path);
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    let res = call(req, configure).await;
    (res.status, res.body)
}

pub async fn post_request(
    token: &str,
    path: &str,
    content_type: &str,
    body: &str,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    let mut req =
        TestRequest::post().uri(path).insert_header(("Content-Type", content_type)).set_payload(body.to_string());
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    let res = call(req, configure).await;
    (res.status, res.body)
}
