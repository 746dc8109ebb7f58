use std::{path::Path, time::Duration};

use actix_web::{
    dev::Server,
    http::KeepAlive,
    middleware::{Compress, Logger},
    web,
    App,
    HttpServer,
};
use log::*;
use loyalty_engine::{AccountApi, AuthApi, OrderFlowApi, SqliteDatabase};
use tokio_util::sync::CancellationToken;

use crate::{
    accrual_client::AccrualClient,
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    reconciliation_worker::start_reconciliation_worker,
    routes::{
        health,
        BalanceWithdrawalsRoute,
        LoginRoute,
        MyBalanceRoute,
        MyOrdersRoute,
        MyWithdrawalsRoute,
        RegisterRoute,
        UploadOrderRoute,
        WithdrawRoute,
    },
    settlement_worker::start_settlement_worker,
};

/// Opens (and migrates) the database, starts the HTTP server and both background workers, and runs until the server
/// is stopped. The workers are then cancelled and awaited before returning.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    ensure_database_dir(&config.database_url)?;
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Database migration failed. {e}")))?;
    info!("🗃️ Database at {} is ready", config.database_url);
    let client = AccrualClient::new(&config.accrual_url, config.accrual_http_timeout)?;
    let workers = config.workers;
    let srv = create_server_instance(config, db.clone())?;

    let shutdown = CancellationToken::new();
    let reconciler = start_reconciliation_worker(db.clone(), client, workers, shutdown.clone());
    let settler = start_settlement_worker(db, workers, shutdown.clone());

    let result = srv.await.map_err(ServerError::from);
    info!("🚀️ HTTP server has stopped. Shutting down background workers.");
    shutdown.cancel();
    for handle in [reconciler, settler] {
        if let Err(e) = handle.await {
            error!("🚀️ A background worker did not shut down cleanly. {e}");
        }
    }
    result
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let token_issuer = TokenIssuer::new(&config.auth);
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone());
        let auth_api = AuthApi::new(db.clone());
        let accounts_api = AccountApi::new(db.clone());
        let user_scope = web::scope("/api/user")
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(UploadOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(MyBalanceRoute::<SqliteDatabase>::new())
            .service(WithdrawRoute::<SqliteDatabase>::new())
            .service(MyWithdrawalsRoute::<SqliteDatabase>::new())
            .service(BalanceWithdrawalsRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Compress::default())
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("lpg::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(token_issuer.clone()))
            .service(health)
            .service(user_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind(config.run_address.as_str())?
    .run();
    info!("🚀️ Listening on {}", config.run_address);
    Ok(srv)
}

/// SQLite will create a missing database file, but not a missing directory.
fn ensure_database_dir(url: &str) -> Result<(), ServerError> {
    let path = url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
    if path.starts_with(':') {
        return Ok(());
    }
    let path = path.split('?').next().unwrap_or_default();
    match Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            info!("🗃️ Creating database directory {}", dir.display());
            std::fs::create_dir_all(dir)?;
            Ok(())
        },
        _ => Ok(()),
    }
}
