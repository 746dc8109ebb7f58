use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use loyalty_engine::{
    db_types::{OrderNumber, Points},
    AccrualError,
    AccrualLookup,
    AccrualReport,
    AccrualStatus,
    LookupOutcome,
};

/// An accrual service stand-in that answers from a script and remembers what it was asked.
///
/// Orders with no script entry fail with a transport error.
#[derive(Clone, Default)]
pub struct ScriptedAccrual {
    script: Arc<Mutex<HashMap<String, LookupOutcome>>>,
    calls: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

impl ScriptedAccrual {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set(&self, number: &str, outcome: LookupOutcome) {
        self.script.lock().unwrap().insert(number.to_string(), outcome);
    }

    pub fn set_status(&self, number: &str, status: AccrualStatus, accrual: Option<i64>) {
        let report =
            AccrualReport { order: OrderNumber::from(number), status, accrual: accrual.map(Points::from_points) };
        self.set(number, LookupOutcome::Found(report));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl AccrualLookup for ScriptedAccrual {
    async fn lookup(&self, number: &OrderNumber) -> Result<LookupOutcome, AccrualError> {
        self.calls.lock().unwrap().push(number.as_str().to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let outcome = self.script.lock().unwrap().get(number.as_str()).cloned();
        outcome.ok_or_else(|| AccrualError::Transport(format!("connection refused for {number}")))
    }
}
