use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::time::{interval, timeout, MissedTickBehavior};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::QuotaAction;
use crate::services::{QuotaAlertService, QuotaEngine};

/// Observable state of a metered call session
#[derive(Debug, Clone, PartialEq)]
pub enum CallState {
    Active,
    /// Quota ran out; the caller should tear the session down. Held for at
    /// most one tick interval while waiting for the hangup acknowledgement.
    Terminating,
    Terminated {
        reason: EndReason,
        minutes_charged: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    HungUp,
    Exhausted,
    VerificationFailed,
}

struct SessionHandle {
    cancel: watch::Sender<bool>,
    state: watch::Receiver<CallState>,
}

/// Books call minutes over the lifetime of each active session.
///
/// One metering task per session, ticking once per minute of session time:
/// check, and only if allowed, book the elapsed minute through the atomic
/// increment. Whole minutes only; a partial minute at hangup is neither
/// charged nor credited. All coordination with the HTTP layer goes through
/// the state watch channel.
#[derive(Clone)]
pub struct SessionController {
    engine: QuotaEngine,
    alerts: QuotaAlertService,
    tick_interval: Duration,
    sessions: Arc<Mutex<HashMap<Uuid, SessionHandle>>>,
}

impl SessionController {
    pub fn new(engine: QuotaEngine, alerts: QuotaAlertService, tick_interval: Duration) -> Self {
        Self {
            engine,
            alerts,
            tick_interval,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Idle → Active: admits the session after an initial quota check.
    /// Fails closed when the check itself fails.
    pub async fn start(
        &self,
        call_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<watch::Receiver<CallState>> {
        let status = self
            .engine
            .check_quota(user_id, QuotaAction::Call, 1)
            .await?;
        if !status.allowed {
            self.alerts
                .notify_exhausted(user_id, QuotaAction::Call, &status);
            return Err(AppError::QuotaExceeded(status));
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(CallState::Active);

        {
            let mut sessions = self.sessions.lock().await;
            if sessions.contains_key(&call_id) {
                return Err(AppError::Conflict(format!(
                    "Call {} is already being metered",
                    call_id
                )));
            }
            sessions.insert(
                call_id,
                SessionHandle {
                    cancel: cancel_tx,
                    state: state_rx.clone(),
                },
            );
        }

        let controller = self.clone();
        tokio::spawn(async move {
            controller
                .run_meter(call_id, user_id, cancel_rx, state_tx)
                .await;
        });

        Ok(state_rx)
    }

    /// Requests hangup. No new tick starts once this returns; a tick already
    /// in flight completes its increment.
    pub async fn hang_up(&self, call_id: Uuid) -> AppResult<()> {
        let sessions = self.sessions.lock().await;
        let handle = sessions
            .get(&call_id)
            .ok_or_else(|| AppError::Conflict(format!("Call {} is not active", call_id)))?;

        // Send errors mean the loop is finishing concurrently; that's fine
        let _ = handle.cancel.send(true);
        Ok(())
    }

    /// Current state, while the session is still tracked
    pub async fn state(&self, call_id: Uuid) -> Option<CallState> {
        let sessions = self.sessions.lock().await;
        sessions.get(&call_id).map(|h| h.state.borrow().clone())
    }

    /// Cancels every active session (graceful shutdown)
    pub async fn shutdown(&self) {
        let sessions = self.sessions.lock().await;
        for handle in sessions.values() {
            let _ = handle.cancel.send(true);
        }
    }

    async fn run_meter(
        &self,
        call_id: Uuid,
        user_id: Uuid,
        mut cancel_rx: watch::Receiver<bool>,
        state_tx: watch::Sender<CallState>,
    ) {
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; consume it so the first
        // minute is booked one full interval into the session
        ticker.tick().await;

        let mut minutes_charged = 0i64;

        let reason = loop {
            tokio::select! {
                // Cancellation wins between ticks. A check/increment already
                // past the select runs to completion, so at most one extra
                // minute can land after hangup begins.
                _ = cancel_rx.changed() => break EndReason::HungUp,
                _ = ticker.tick() => {
                    match self.engine.check_quota(user_id, QuotaAction::Call, 1).await {
                        Ok(status) if status.allowed => {
                            match self.engine.record_usage(user_id, QuotaAction::Call, 1).await {
                                Ok(()) => minutes_charged += 1,
                                Err(e) => {
                                    log::error!("Failed to book call minute for {}: {}", call_id, e);
                                    break EndReason::VerificationFailed;
                                }
                            }
                        }
                        Ok(status) => {
                            self.alerts.notify_exhausted(user_id, QuotaAction::Call, &status);
                            break EndReason::Exhausted;
                        }
                        Err(e) => {
                            log::error!("Quota verification failed for call {}: {}", call_id, e);
                            break EndReason::VerificationFailed;
                        }
                    }
                }
            }
        };

        // Controller-initiated teardown: announce Terminating and give the
        // caller one interval to acknowledge with a hangup
        if reason != EndReason::HungUp {
            let _ = state_tx.send(CallState::Terminating);
            if timeout(self.tick_interval, cancel_rx.changed())
                .await
                .is_err()
            {
                log::warn!("Call {} teardown not acknowledged in time", call_id);
            }
        }

        self.sessions.lock().await.remove(&call_id);
        let _ = state_tx.send(CallState::Terminated {
            reason,
            minutes_charged,
        });

        log::info!(
            "Call {} terminated ({:?}) after {} charged minute(s)",
            call_id,
            reason,
            minutes_charged
        );
    }
}
