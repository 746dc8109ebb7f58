use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use loyalty_engine::{
    db_types::{Order, OrderNumber, OrderStatusType, Points},
    AccountApi,
    InsertOrderResult,
    OrderFlowApi,
};

use super::{
    helpers::{get_request, post_request, valid_token},
    mocks::{MockAccountManager, MockGateway},
};
use crate::routes::{MyOrdersRoute, UploadOrderRoute};

fn order(number: &str, customer: &str, status: OrderStatusType, accrual: i64) -> Order {
    Order {
        number: OrderNumber::from(number),
        customer: customer.into(),
        status,
        accrual: Points::from(accrual),
        uploaded_at: Utc.with_ymd_and_hms(2024, 3, 11, 9, 30, 0).unwrap(),
        ts: 1_710_149_400_000,
    }
}

fn configure_upload(gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(UploadOrderRoute::<MockGateway>::new()).app_data(web::Data::new(OrderFlowApi::new(gateway)));
    }
}

fn gateway_returning(result: InsertOrderResult) -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway
        .expect_store_order()
        .withf(|number, user_id| number.as_str() == "12345678903" && user_id == "u-1")
        .times(1)
        .returning(move |_, _| Ok(result.clone()));
    gateway
}

#[actix_web::test]
async fn upload_new_order() {
    let _ = env_logger::try_init().ok();
    let gateway = gateway_returning(InsertOrderResult::Inserted(order("12345678903", "u-1", OrderStatusType::New, 0)));
    let (status, _) =
        post_request(&valid_token(), "/orders", "text/plain", "12345678903\n", configure_upload(gateway)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

#[actix_web::test]
async fn upload_order_twice() {
    let _ = env_logger::try_init().ok();
    let gateway = gateway_returning(InsertOrderResult::AlreadyLoadedBySameUser(order(
        "12345678903",
        "u-1",
        OrderStatusType::Processing,
        0,
    )));
    let (status, _) = post_request(&valid_token(), "/orders", "text/plain", "12345678903", configure_upload(gateway)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn upload_someone_elses_order() {
    let _ = env_logger::try_init().ok();
    let gateway = gateway_returning(InsertOrderResult::ConflictWithOtherUser(OrderNumber::from("12345678903")));
    let (status, body) =
        post_request(&valid_token(), "/orders", "text/plain", "12345678903", configure_upload(gateway)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"Order 12345678903 has already been uploaded by another user"}"#);
}

#[actix_web::test]
async fn upload_rejects_bad_input_before_touching_the_store() {
    let _ = env_logger::try_init().ok();
    for (token, content_type, body, expected) in [
        (valid_token(), "text/plain", "12345678904", StatusCode::UNPROCESSABLE_ENTITY),
        (valid_token(), "text/plain", "non int", StatusCode::UNPROCESSABLE_ENTITY),
        (valid_token(), "application/json", "12345678903", StatusCode::BAD_REQUEST),
        (String::new(), "text/plain", "12345678903", StatusCode::UNAUTHORIZED),
    ] {
        let mut gateway = MockGateway::new();
        gateway.expect_store_order().never();
        let (status, _) = post_request(&token, "/orders", content_type, body, configure_upload(gateway)).await;
        assert_eq!(status, expected, "{content_type} {body}");
    }
}

fn configure_list(orders: Vec<Order>) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let mut account_manager = MockAccountManager::new();
        account_manager
            .expect_fetch_orders_for_user()
            .withf(|user_id| user_id == "u-1")
            .returning(move |_| Ok(orders.clone()));
        cfg.service(MyOrdersRoute::<MockAccountManager>::new()).app_data(web::Data::new(AccountApi::new(account_manager)));
    }
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let orders = vec![
        order("12345678903", "u-1", OrderStatusType::Processed, 50_000),
        order("79927398713", "u-1", OrderStatusType::Processing, 0),
    ];
    let (status, body) = get_request(&valid_token(), "/orders", configure_list(orders)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ORDERS_JSON);
}

#[actix_web::test]
async fn fetch_my_orders_when_there_are_none() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&valid_token(), "/orders", configure_list(vec![])).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

const ORDERS_JSON: &str = r#"[{"number":"12345678903","status":"PROCESSED","accrual":500.0,"uploaded_at":"2024-03-11T09:30:00Z"},{"number":"79927398713","status":"PROCESSING","uploaded_at":"2024-03-11T09:30:00Z"}]"#;
