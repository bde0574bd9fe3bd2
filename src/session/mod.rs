//! Session expiry tracking and proactive token refresh.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

pub mod scheduler;

pub use scheduler::{
    RefreshTicket, RefreshTimer, SchedulerState, SessionRefreshScheduler, TickOutcome,
};

/// Tokens closer than this to expiry are reported as expiring soon
const WARNING_WINDOW_SECS: i64 = 60;

/// An authenticated session as far as refresh scheduling is concerned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token_expiry: DateTime<Utc>,
}

/// Display status of the access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Valid,
    ExpiringSoon { seconds: i64 },
    Expired,
}

impl Session {
    pub fn new(access_token_expiry: DateTime<Utc>) -> Self {
        Self {
            access_token_expiry,
        }
    }

    /// Time left before the token expires; negative once expired
    pub fn remaining(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.access_token_expiry - now
    }

    pub fn token_status(&self, now: DateTime<Utc>) -> TokenStatus {
        let remaining = self.remaining(now);
        if remaining <= chrono::Duration::zero() {
            TokenStatus::Expired
        } else if remaining.num_seconds() < WARNING_WINDOW_SECS {
            TokenStatus::ExpiringSoon {
                seconds: remaining.num_seconds(),
            }
        } else {
            TokenStatus::Valid
        }
    }
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// The auth collaborator: exchanges the current credentials for a fresh session
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn refresh(&self) -> Result<Session>;
}
