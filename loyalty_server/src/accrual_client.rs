//! HTTP client for the external accrual service.
use std::time::Duration;

use log::*;
use loyalty_engine::{db_types::OrderNumber, AccrualError, AccrualLookup, AccrualReport, LookupOutcome};
use reqwest::{header::RETRY_AFTER, Client, StatusCode};

use crate::errors::ServerError;

#[derive(Clone, Debug)]
pub struct AccrualClient {
    client: Client,
    base_url: String,
}

impl AccrualClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServerError::InitializeError(format!("Could not build the accrual client. {e}")))?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn url(&self, number: &OrderNumber) -> String {
        format!("{}/api/orders/{}", self.base_url, number.as_str())
    }
}

impl AccrualLookup for AccrualClient {
    async fn lookup(&self, number: &OrderNumber) -> Result<LookupOutcome, AccrualError> {
        let url = self.url(number);
        trace!("🔄️ GET {url}");
        let response = self.client.get(&url).send().await.map_err(|e| AccrualError::Transport(e.to_string()))?;
        let status = response.status();
        match status {
            StatusCode::OK => {
                let report =
                    response.json::<AccrualReport>().await.map_err(|e| AccrualError::Decode(e.to_string()))?;
                Ok(LookupOutcome::Found(report))
            },
            StatusCode::NO_CONTENT => Ok(LookupOutcome::NotRegistered),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after =
                    response.headers().get(RETRY_AFTER).and_then(|v| v.to_str().ok()).and_then(parse_retry_after);
                Ok(LookupOutcome::RateLimited { retry_after })
            },
            _ => {
                let message = response.text().await.unwrap_or_default();
                Ok(LookupOutcome::Unexpected { code: status.as_u16(), message })
            },
        }
    }
}

/// `Retry-After` in its delay-seconds form. HTTP dates are not supported and yield `None`.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
