//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Password hashing is CPU-bound, so it is pushed onto the blocking
//! thread pool with [`web::block`]. Everything else is I/O and is awaited.
use actix_web::{
    cookie::Cookie,
    get,
    http::header,
    web,
    HttpRequest,
    HttpResponse,
    Responder,
};
use log::*;
use loyalty_engine::{
    db_types::User,
    traits::{AccountManagement, AuthManagement, InsertOrderResult, LoyaltyGatewayDatabase, WithdrawalResult},
    AccountApi,
    AuthApi,
    OrderFlowApi,
};
use serde::de::DeserializeOwned;

use crate::{
    auth::{hash_password, verify_password, Claims, TokenIssuer, AUTH_COOKIE},
    data_objects::{Credentials, JsonResponse, OrderResponse, TokenResponse, WithdrawRequest, WithdrawalResponse},
    errors::{AuthError, ServerError},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(register => Post "/register" impl AuthManagement);
/// Route handler for user registration
///
/// Expects a JSON body `{"login": "...", "password": "..."}`. On success, the new user is logged in straight away: the
/// session token is returned in the body, in the `Authorization` cookie and in the `Authorization` header.
pub async fn register<A>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<AuthApi<A>>,
    issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError>
where
    A: AuthManagement,
{
    trace!("💻️ Received registration request");
    let creds = credentials_from_body(&req, &body)?;
    let password = creds.password;
    let password_hash = web::block(move || hash_password(&password))
        .await
        .map_err(|e| ServerError::Unspecified(format!("Password hashing was cancelled. {e}")))??;
    let user = api.register_user(&creds.login, &password_hash).await?;
    debug!("💻️ Registered user {}", user.username);
    session_response(&user, &issuer)
}

route!(login => Post "/login" impl AuthManagement);
/// Route handler for logging in
///
/// Unknown logins and wrong passwords get the same 401 response.
pub async fn login<A>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<AuthApi<A>>,
    issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError>
where
    A: AuthManagement,
{
    trace!("💻️ Received login request");
    let creds = credentials_from_body(&req, &body)?;
    let user = api.user_by_username(&creds.login).await?.ok_or_else(|| {
        debug!("💻️ Login attempt for unknown user {}", creds.login);
        AuthError::InvalidCredentials
    })?;
    let password = creds.password;
    let stored_hash = user.password_hash.clone();
    let verified = web::block(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| ServerError::Unspecified(format!("Password verification was cancelled. {e}")))?;
    if !verified {
        debug!("💻️ Wrong password for {}", user.username);
        return Err(AuthError::InvalidCredentials.into());
    }
    session_response(&user, &issuer)
}

fn credentials_from_body(req: &HttpRequest, body: &[u8]) -> Result<Credentials, ServerError> {
    check_content_type(req, "application/json")?;
    let creds = parse_json::<Credentials>(body)?;
    if creds.login.trim().is_empty() || creds.password.is_empty() {
        return Err(AuthError::MissingCredentials.into());
    }
    Ok(creds)
}

fn session_response(user: &User, issuer: &TokenIssuer) -> Result<HttpResponse, ServerError> {
    let token = issuer.issue_token(user)?;
    let cookie = Cookie::build(AUTH_COOKIE, token.clone()).path("/").http_only(true).finish();
    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .json(TokenResponse { token }))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(upload_order => Post "/orders" impl LoyaltyGatewayDatabase);
/// Route handler for uploading an order number
///
/// The body is the order number as plain text. Responses:
/// * `202` the order is new and will be processed.
/// * `200` the order had already been uploaded by this user.
/// * `409` the order had already been uploaded by another user.
/// * `422` the order number fails the Luhn check.
pub async fn upload_order<B>(
    claims: Claims,
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: LoyaltyGatewayDatabase,
{
    check_content_type(&req, "text/plain")?;
    let raw = std::str::from_utf8(&body)
        .map_err(|e| ServerError::InvalidRequestBody(format!("Order number is not valid UTF-8. {e}")))?;
    debug!("💻️ POST order {} for {}", raw.trim(), claims.username);
    match api.submit_order(raw, &claims.sub).await? {
        InsertOrderResult::Inserted(order) => {
            Ok(HttpResponse::Accepted().json(JsonResponse::success(format!("Order {} accepted", order.number))))
        },
        InsertOrderResult::AlreadyLoadedBySameUser(order) => {
            Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Order {} was already uploaded", order.number))))
        },
        InsertOrderResult::ConflictWithOtherUser(number) => Err(ServerError::OrderOwnedByAnotherUser(number.0)),
    }
}

route!(my_orders => Get "/orders" impl AccountManagement);
/// Route handler for listing the authenticated user's orders, most recently uploaded first.
///
/// Returns `204 No Content` if the user has not uploaded any orders.
pub async fn my_orders<B: AccountManagement>(
    claims: Claims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for {}", claims.username);
    let orders = api.orders_for_user(&claims.sub).await?;
    if orders.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let orders = orders.into_iter().map(OrderResponse::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Balance  ----------------------------------------------------
route!(my_balance => Get "/balance" impl AccountManagement);
/// Route handler for the balance endpoint
///
/// The balance is always current. It includes accruals and withdrawals that have not been settled yet.
pub async fn my_balance<B: AccountManagement>(
    claims: Claims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_balance for {}", claims.username);
    let balance = api.balance_for_user(&claims.sub).await?;
    Ok(HttpResponse::Ok().json(balance))
}

route!(withdraw => Post "/balance/withdraw" impl LoyaltyGatewayDatabase);
/// Route handler for spending points
///
/// Expects `{"order": "...", "sum": 751.5}`. Responses:
/// * `200` the withdrawal was recorded.
/// * `402` the balance does not cover the sum.
/// * `409` a withdrawal against this order number already exists.
/// * `422` the order number is invalid or the sum is not positive.
pub async fn withdraw<B>(
    claims: Claims,
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: LoyaltyGatewayDatabase,
{
    check_content_type(&req, "application/json")?;
    let request = parse_json::<WithdrawRequest>(&body)?;
    debug!("💻️ POST withdraw {} against {} for {}", request.sum, request.order, claims.username);
    match api.withdraw(&claims.sub, &request.order, request.sum).await? {
        WithdrawalResult::Recorded(w) => Ok(HttpResponse::Ok().json(WithdrawalResponse::from(w))),
        WithdrawalResult::InsufficientFunds => Err(ServerError::InsufficientFunds),
        WithdrawalResult::AlreadyExists(number) => Err(ServerError::DuplicateWithdrawal(number.0)),
    }
}

route!(my_withdrawals => Get "/withdrawals" impl AccountManagement);
/// Route handler for listing the authenticated user's withdrawals, newest first.
///
/// Returns `204 No Content` if there are none.
pub async fn my_withdrawals<B: AccountManagement>(
    claims: Claims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_withdrawals for {}", claims.username);
    withdrawals_response(&claims.sub, &api).await
}

route!(balance_withdrawals => Get "/balance/withdrawals" impl AccountManagement);
/// Alias of [`my_withdrawals`].
pub async fn balance_withdrawals<B: AccountManagement>(
    claims: Claims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET balance_withdrawals for {}", claims.username);
    withdrawals_response(&claims.sub, &api).await
}

async fn withdrawals_response<B: AccountManagement>(
    user_id: &str,
    api: &AccountApi<B>,
) -> Result<HttpResponse, ServerError> {
    let withdrawals = api.withdrawals_for_user(user_id).await?;
    if withdrawals.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let withdrawals = withdrawals.into_iter().map(WithdrawalResponse::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(withdrawals))
}

//----------------------------------------------   Helpers  ----------------------------------------------------
/// A missing `Content-Type` is accepted. Anything other than `expected` (ignoring parameters such as the charset) is a
/// bad request.
fn check_content_type(req: &HttpRequest, expected: &str) -> Result<(), ServerError> {
    let Some(value) = req.headers().get(header::CONTENT_TYPE) else {
        return Ok(());
    };
    let ct = value.to_str().unwrap_or_default();
    let mime = ct.split(';').next().unwrap_or_default().trim();
    if mime.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(ServerError::InvalidRequestBody(format!("Unexpected content type '{ct}'. Expected {expected}")))
    }
}

fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ServerError> {
    serde_json::from_slice(body).map_err(|e| {
        debug!("💻️ Could not deserialize request body. {e}");
        ServerError::InvalidRequestBody(e.to_string())
    })
}
