use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::*;
use lpg_common::Secret;
use rand::{distributions::Alphanumeric, thread_rng, Rng};

const DEFAULT_RUN_ADDRESS: &str = "127.0.0.1:8080";
const DEFAULT_ACCRUAL_ADDRESS: &str = "http://localhost:8085";
const DEFAULT_DATABASE_URL: &str = "sqlite://data/loyalty_store.db";
const DEFAULT_SESSION_LIFETIME: Duration = Duration::from_secs(30 * 60);
const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_RECONCILE_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_RECONCILE_CONCURRENCY: usize = 1;
const DEFAULT_SETTLEMENT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
const DEFAULT_SETTLEMENT_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const DEFAULT_ACCRUAL_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// The `host:port` the HTTP server listens on.
    pub run_address: String,
    /// Base URL of the external accrual service.
    pub accrual_url: String,
    pub database_url: String,
    pub auth: AuthConfig,
    pub workers: WorkerConfig,
    /// Timeout for a single request to the accrual service.
    pub accrual_http_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            run_address: DEFAULT_RUN_ADDRESS.to_string(),
            accrual_url: DEFAULT_ACCRUAL_ADDRESS.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            workers: WorkerConfig::default(),
            accrual_http_timeout: DEFAULT_ACCRUAL_HTTP_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let run_address = env::var("RUN_ADDRESS").ok().unwrap_or_else(|| {
            info!("🪛️ RUN_ADDRESS is not set. Listening on {DEFAULT_RUN_ADDRESS}.");
            DEFAULT_RUN_ADDRESS.into()
        });
        let accrual_url = env::var("ACCRUAL_SYSTEM_ADDRESS").ok().unwrap_or_else(|| {
            warn!("🪛️ ACCRUAL_SYSTEM_ADDRESS is not set. Using {DEFAULT_ACCRUAL_ADDRESS}.");
            DEFAULT_ACCRUAL_ADDRESS.into()
        });
        let database_url = env::var("DATABASE_URI").ok().unwrap_or_else(|| {
            warn!("🪛️ DATABASE_URI is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.into()
        });
        let auth = AuthConfig::from_env_or_default();
        let workers = WorkerConfig::from_env_or_default();
        let accrual_http_timeout = env_seconds("LPG_ACCRUAL_HTTP_TIMEOUT", DEFAULT_ACCRUAL_HTTP_TIMEOUT);
        Self { run_address, accrual_url, database_url, auth, workers, accrual_http_timeout }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HMAC secret used to sign and verify session tokens.
    pub jwt_secret: Secret<String>,
    pub session_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT signing secret has not been set. I'm using a random value for this session. All sessions \
             will be invalidated when the server restarts. Set LPG_JWT_SECRET to avoid this. 🚨️🚨️🚨️"
        );
        Self { jwt_secret: Secret::new(random_secret()), session_lifetime: DEFAULT_SESSION_LIFETIME }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S, session_lifetime: Duration) -> Self {
        Self { jwt_secret: Secret::new(secret.into()), session_lifetime }
    }

    pub fn from_env_or_default() -> Self {
        let session_lifetime = env::var("LPG_SESSION_LIFETIME")
            .ok()
            .map(|s| parse_session_lifetime(&s))
            .unwrap_or(DEFAULT_SESSION_LIFETIME);
        match env::var("LPG_JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => Self::new(secret, session_lifetime),
            _ => Self { session_lifetime, ..Self::default() },
        }
    }
}

fn random_secret() -> String {
    thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect()
}

//-------------------------------------------------  WorkerConfig  -----------------------------------------------------
/// Schedules and limits for the two background workers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerConfig {
    pub reconcile_interval: Duration,
    pub reconcile_timeout: Duration,
    pub reconcile_concurrency: usize,
    pub settlement_interval: Duration,
    pub settlement_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
            reconcile_timeout: DEFAULT_RECONCILE_TIMEOUT,
            reconcile_concurrency: DEFAULT_RECONCILE_CONCURRENCY,
            settlement_interval: DEFAULT_SETTLEMENT_INTERVAL,
            settlement_timeout: DEFAULT_SETTLEMENT_TIMEOUT,
        }
    }
}

impl WorkerConfig {
    pub fn from_env_or_default() -> Self {
        let reconcile_concurrency = env::var("LPG_RECONCILE_CONCURRENCY")
            .ok()
            .map(|s| parse_value("LPG_RECONCILE_CONCURRENCY", &s, DEFAULT_RECONCILE_CONCURRENCY))
            .unwrap_or(DEFAULT_RECONCILE_CONCURRENCY);
        Self {
            reconcile_interval: env_seconds("LPG_RECONCILE_INTERVAL", DEFAULT_RECONCILE_INTERVAL),
            reconcile_timeout: env_seconds("LPG_RECONCILE_TIMEOUT", DEFAULT_RECONCILE_TIMEOUT),
            reconcile_concurrency: reconcile_concurrency.max(1),
            settlement_interval: env_seconds("LPG_SETTLEMENT_INTERVAL", DEFAULT_SETTLEMENT_INTERVAL),
            settlement_timeout: env_seconds("LPG_SETTLEMENT_TIMEOUT", DEFAULT_SETTLEMENT_TIMEOUT),
        }
    }
}

/// Reads a positive number of seconds from the environment variable `name`.
fn env_seconds(name: &str, default: Duration) -> Duration {
    match env::var(name) {
        Ok(s) => Duration::from_secs(parse_value(name, &s, default.as_secs())),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default value of {}s.", default.as_secs());
            default
        },
    }
}

/// Parses a session lifetime given in minutes.
fn parse_session_lifetime(value: &str) -> Duration {
    let mins = parse_value::<u64>("LPG_SESSION_LIFETIME", value, DEFAULT_SESSION_LIFETIME.as_secs() / 60);
    match mins.checked_mul(60) {
        Some(secs) => Duration::from_secs(secs),
        None => {
            warn!(
                "🪛️ A session lifetime of {mins} minutes is too long. Using the default, {}m, instead.",
                DEFAULT_SESSION_LIFETIME.as_secs() / 60
            );
            DEFAULT_SESSION_LIFETIME
        },
    }
}

/// Parses a configuration value, falling back to `default` with a warning if it is invalid or zero.
fn parse_value<T>(name: &str, value: &str, default: T) -> T
where
    T: FromStr + Default + PartialEq + Display,
    T::Err: Display,
{
    match value.trim().parse::<T>() {
        Ok(v) if v == T::default() => {
            warn!("🪛️ {name} must not be zero. Using the default, {default}, instead.");
            default
        },
        Ok(v) => v,
        Err(e) => {
            warn!("🪛️ {value} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        },
    }
}
