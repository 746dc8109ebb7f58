use std::{env, env::VarError};

use clap::Parser;

use crate::config::ServerConfig;

/// Loyalty points gateway server.
///
/// Every option can also be set with an environment variable. Command-line values take precedence.
#[derive(Debug, Default, Parser)]
#[command(version, about)]
pub struct Cli {
    /// The address to listen on, as host:port [env: RUN_ADDRESS]
    #[arg(short = 'a', long = "address")]
    pub run_address: Option<String>,
    /// Base URL of the accrual service [env: ACCRUAL_SYSTEM_ADDRESS]
    #[arg(short = 'r', long = "accrual")]
    pub accrual_url: Option<String>,
    /// Database URL [env: DATABASE_URI]
    #[arg(short = 'd', long = "database")]
    pub database_url: Option<String>,
    /// Print the current configuration environment and exit
    #[arg(long)]
    pub show_env: bool,
}

impl Cli {
    /// Overrides configuration values with the ones given on the command line.
    pub fn apply(self, mut config: ServerConfig) -> ServerConfig {
        if let Some(address) = self.run_address {
            config.run_address = address;
        }
        if let Some(url) = self.accrual_url {
            config.accrual_url = url;
        }
        if let Some(url) = self.database_url {
            config.database_url = url;
        }
        config
    }
}

pub fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 12] = [
        "RUST_LOG",
        "RUN_ADDRESS",
        "ACCRUAL_SYSTEM_ADDRESS",
        "DATABASE_URI",
        "LPG_SESSION_LIFETIME",
        "LPG_RECONCILE_INTERVAL",
        "LPG_RECONCILE_TIMEOUT",
        "LPG_RECONCILE_CONCURRENCY",
        "LPG_SETTLEMENT_INTERVAL",
        "LPG_SETTLEMENT_TIMEOUT",
        "LPG_ACCRUAL_HTTP_TIMEOUT",
        "LPG_JWT_SECRET",
    ];

    println!("Current environment values (EXCLUDING the values of variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(_) if name.contains("SECRET") => "****".into(),
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
