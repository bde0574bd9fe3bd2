//! Periodic expiry check that triggers a token refresh.
//!
//! [`SessionRefreshScheduler`] is the synchronous state machine
//! (`Idle → Armed → RefreshInFlight → Armed`). [`RefreshTimer`] drives it
//! from a cancellable tokio interval and calls the [`AuthProvider`] when a
//! tick finds the token close to expiry.

use super::{AuthProvider, Clock, Session};
use crate::config::RefreshConfig;
use crate::error::Result;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No session
    Idle,
    /// Session present, waiting for the next tick
    Armed,
    /// A refresh request is outstanding
    RefreshInFlight,
}

/// Identifies the refresh a completion belongs to. Completions from before
/// the last disarm are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No session to check
    Idle,
    /// Token still has more than the threshold left
    Fresh { remaining: chrono::Duration },
    /// Caller must invoke the refresh and report back with the ticket
    RefreshDue(RefreshTicket),
    /// Token is due but a refresh is already outstanding
    AlreadyRefreshing,
}

#[derive(Debug)]
pub struct SessionRefreshScheduler {
    session: Option<Session>,
    state: SchedulerState,
    threshold: chrono::Duration,
    generation: u64,
}

impl SessionRefreshScheduler {
    pub fn new(threshold: chrono::Duration) -> Self {
        Self {
            session: None,
            state: SchedulerState::Idle,
            threshold,
            generation: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Installs a session. From `Idle` this moves to `Armed`; otherwise only
    /// the tracked expiry changes.
    pub fn arm(&mut self, session: Session) {
        if self.state == SchedulerState::Idle {
            self.generation += 1;
            self.state = SchedulerState::Armed;
        }
        self.session = Some(session);
    }

    /// Drops the session and returns to `Idle`
    pub fn disarm(&mut self) {
        self.session = None;
        self.state = SchedulerState::Idle;
        self.generation += 1;
    }

    /// Checks the session against `now`
    pub fn tick(&mut self, now: chrono::DateTime<chrono::Utc>) -> TickOutcome {
        let session = match (&self.session, self.state) {
            (None, _) | (_, SchedulerState::Idle) => return TickOutcome::Idle,
            (Some(_), SchedulerState::RefreshInFlight) => return TickOutcome::AlreadyRefreshing,
            (Some(session), SchedulerState::Armed) => session,
        };

        let remaining = session.remaining(now);
        if remaining > self.threshold {
            return TickOutcome::Fresh { remaining };
        }

        self.state = SchedulerState::RefreshInFlight;
        TickOutcome::RefreshDue(RefreshTicket {
            generation: self.generation,
        })
    }

    /// Records the end of a refresh and returns to `Armed`.
    ///
    /// A failed refresh keeps the old expiry; the next tick decides again.
    /// Returns `false` if the ticket is stale and nothing changed.
    pub fn finish_refresh(&mut self, ticket: RefreshTicket, result: Result<Session>) -> bool {
        if ticket.generation != self.generation || self.state != SchedulerState::RefreshInFlight {
            debug!("ignoring refresh completion for a previous session");
            return false;
        }

        self.state = SchedulerState::Armed;
        match result {
            Ok(session) => {
                debug!(expiry = %session.access_token_expiry, "session refreshed");
                self.session = Some(session);
            }
            Err(e) => warn!("session refresh failed: {}", e),
        }
        true
    }
}

fn lock(scheduler: &Mutex<SessionRefreshScheduler>) -> MutexGuard<'_, SessionRefreshScheduler> {
    scheduler
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Repeating timer that keeps a session fresh.
///
/// Must be started inside a Tokio runtime. Dropping the timer cancels it.
pub struct RefreshTimer {
    scheduler: Arc<Mutex<SessionRefreshScheduler>>,
    auth: Arc<dyn AuthProvider>,
    clock: Arc<dyn Clock>,
    period: Duration,
    running: Option<(CancellationToken, JoinHandle<()>)>,
}

impl RefreshTimer {
    pub fn new(auth: Arc<dyn AuthProvider>, clock: Arc<dyn Clock>, config: &RefreshConfig) -> Self {
        Self {
            scheduler: Arc::new(Mutex::new(SessionRefreshScheduler::new(
                config.refresh_threshold(),
            ))),
            auth,
            clock,
            // tokio intervals reject a zero period
            period: config.check_interval().max(Duration::from_millis(1)),
            running: None,
        }
    }

    /// Arms the scheduler with `session` and starts ticking. The first check
    /// runs immediately. Calling this while running swaps in the new session
    /// and checks it right away.
    pub fn start(&mut self, session: Session) {
        lock(&self.scheduler).arm(session);
        if self.running.is_some() {
            check(&self.scheduler, &self.auth, self.clock.as_ref());
            return;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&self.scheduler),
            Arc::clone(&self.auth),
            Arc::clone(&self.clock),
            self.period,
            cancel.clone(),
        ));
        self.running = Some((cancel, handle));
        info!(period_ms = self.period.as_millis() as u64, "session refresh timer started");
    }

    /// Follows login/logout: a session (re)arms the timer, `None` stops it
    pub fn set_session(&mut self, session: Option<Session>) {
        match session {
            Some(session) => self.start(session),
            None => self.stop(),
        }
    }

    /// Cancels the timer and forgets the session. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some((cancel, _handle)) = self.running.take() {
            cancel.cancel();
            info!("session refresh timer stopped");
        }
        lock(&self.scheduler).disarm();
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn state(&self) -> SchedulerState {
        lock(&self.scheduler).state()
    }

    pub fn session(&self) -> Option<Session> {
        lock(&self.scheduler).session().cloned()
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        if let Some((cancel, _)) = self.running.take() {
            cancel.cancel();
        }
    }
}

async fn run(
    scheduler: Arc<Mutex<SessionRefreshScheduler>>,
    auth: Arc<dyn AuthProvider>,
    clock: Arc<dyn Clock>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("session refresh loop exiting");
                break;
            }
            _ = ticker.tick() => check(&scheduler, &auth, clock.as_ref()),
        }
    }
}

/// Runs one expiry check and spawns the refresh call if one is due
fn check(
    scheduler: &Arc<Mutex<SessionRefreshScheduler>>,
    auth: &Arc<dyn AuthProvider>,
    clock: &dyn Clock,
) {
    let outcome = lock(scheduler).tick(clock.now());
    match outcome {
        TickOutcome::RefreshDue(ticket) => {
            info!("access token near expiry, refreshing");
            let scheduler = Arc::clone(scheduler);
            let auth = Arc::clone(auth);
            tokio::spawn(async move {
                let result = auth.refresh().await;
                lock(&scheduler).finish_refresh(ticket, result);
            });
        }
        TickOutcome::AlreadyRefreshing => debug!("refresh already in flight"),
        TickOutcome::Fresh { .. } | TickOutcome::Idle => {}
    }
}
