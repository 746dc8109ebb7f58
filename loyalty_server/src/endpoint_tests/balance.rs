use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use loyalty_engine::{
    db_types::{OrderNumber, Points, UserBalance, Withdrawal},
    AccountApi,
    OrderFlowApi,
    WithdrawalResult,
};

use super::{
    helpers::{get_request, post_request, valid_token},
    mocks::{MockAccountManager, MockGateway},
};
use crate::routes::{BalanceWithdrawalsRoute, MyBalanceRoute, MyWithdrawalsRoute, WithdrawRoute};

fn withdrawal(number: &str, amount: i64) -> Withdrawal {
    Withdrawal {
        number: OrderNumber::from(number),
        customer: "u-1".into(),
        amount: Points::from(amount),
        processed_at: Utc.with_ymd_and_hms(2024, 3, 11, 10, 0, 0).unwrap(),
        ts: 1_710_151_200_000,
    }
}

fn configure_accounts(withdrawals: Vec<Withdrawal>) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let mut account_manager = MockAccountManager::new();
        account_manager
            .expect_fetch_balance()
            .withf(|user_id| user_id == "u-1")
            .returning(|_| Ok(UserBalance { current: Points::from(50_050), withdrawn: Points::from_points(42) }));
        account_manager.expect_fetch_withdrawals_for_user().returning(move |_| Ok(withdrawals.clone()));
        cfg.service(MyBalanceRoute::<MockAccountManager>::new())
            .service(MyWithdrawalsRoute::<MockAccountManager>::new())
            .service(BalanceWithdrawalsRoute::<MockAccountManager>::new())
            .app_data(web::Data::new(AccountApi::new(account_manager)));
    }
}

#[actix_web::test]
async fn fetch_my_balance() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&valid_token(), "/balance", configure_accounts(vec![])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"current":500.5,"withdrawn":42.0}"#);
}

#[actix_web::test]
async fn fetch_my_withdrawals_on_both_paths() {
    let _ = env_logger::try_init().ok();
    let withdrawals = vec![withdrawal("2377225624", 75_100), withdrawal("10000000066", 250)];
    for path in ["/withdrawals", "/balance/withdrawals"] {
        let (status, body) = get_request(&valid_token(), path, configure_accounts(withdrawals.clone())).await;
        assert_eq!(status, StatusCode::OK, "{path}");
        assert_eq!(body, WITHDRAWALS_JSON, "{path}");
    }
    let (status, _) = get_request(&valid_token(), "/withdrawals", configure_accounts(vec![])).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

fn configure_withdraw(gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(WithdrawRoute::<MockGateway>::new()).app_data(web::Data::new(OrderFlowApi::new(gateway)));
    }
}

fn gateway_returning(result: WithdrawalResult) -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway
        .expect_record_withdrawal()
        .withf(|w| w.customer == "u-1" && w.number.as_str() == "2377225624" && w.amount == Points::from_points(751))
        .times(1)
        .returning(move |_| Ok(result.clone()));
    gateway
}

const WITHDRAW_751: &str = r#"{"order": "2377225624", "sum": 751}"#;

#[actix_web::test]
async fn withdraw_points() {
    let _ = env_logger::try_init().ok();
    let gateway = gateway_returning(WithdrawalResult::Recorded(withdrawal("2377225624", 75_100)));
    let (status, body) =
        post_request(&valid_token(), "/balance/withdraw", "application/json", WITHDRAW_751, configure_withdraw(gateway))
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"order":"2377225624","sum":751.0,"processed_at":"2024-03-11T10:00:00Z"}"#);
}

#[actix_web::test]
async fn withdraw_without_enough_points() {
    let _ = env_logger::try_init().ok();
    let gateway = gateway_returning(WithdrawalResult::InsufficientFunds);
    let (status, _) =
        post_request(&valid_token(), "/balance/withdraw", "application/json", WITHDRAW_751, configure_withdraw(gateway))
            .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
}

#[actix_web::test]
async fn withdraw_twice_against_the_same_order() {
    let _ = env_logger::try_init().ok();
    let gateway = gateway_returning(WithdrawalResult::AlreadyExists(OrderNumber::from("2377225624")));
    let (status, _) =
        post_request(&valid_token(), "/balance/withdraw", "application/json", WITHDRAW_751, configure_withdraw(gateway))
            .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn withdraw_rejects_bad_input_before_touching_the_store() {
    let _ = env_logger::try_init().ok();
    for (body, expected) in [
        (r#"{"order": "2377225625", "sum": 751}"#, StatusCode::UNPROCESSABLE_ENTITY),
        (r#"{"order": "2377225624", "sum": 0}"#, StatusCode::UNPROCESSABLE_ENTITY),
        (r#"{"order": "2377225624", "sum": -5}"#, StatusCode::UNPROCESSABLE_ENTITY),
        (r#"{"order": "2377225624"}"#, StatusCode::BAD_REQUEST),
        (r#"{"order": "2377225624", "sum": "lots"}"#, StatusCode::BAD_REQUEST),
    ] {
        let mut gateway = MockGateway::new();
        gateway.expect_record_withdrawal().never();
        let (status, _) =
            post_request(&valid_token(), "/balance/withdraw", "application/json", body, configure_withdraw(gateway))
                .await;
        assert_eq!(status, expected, "{body}");
    }
}

const WITHDRAWALS_JSON: &str = r#"[{"order":"2377225624","sum":751.0,"processed_at":"2024-03-11T10:00:00Z"},{"order":"10000000066","sum":2.5,"processed_at":"2024-03-11T10:00:00Z"}]"#;
