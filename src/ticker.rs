//! Periodic code refresh for a session.
//!
//! The loop is driven by the absolute wall clock: after every wake it reads
//! the clock again and publishes a new [`Tick`] only when the step changed.
//! A process resumed after a suspend therefore catches up on the next wake
//! instead of drifting.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::totp::{
    Code, HmacSigner, Result, Session, TimeStep, Totp, next_boundary_at,
};

/// Longest single sleep between two clock reads.
const MAX_SLEEP: Duration = Duration::from_secs(1);

/// Code published for one time step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tick {
    pub code: Code,
    pub step: i64,
    /// Unix timestamp at which `code` expires.
    pub expires_at: u64,
}

/// Handle on a running refresh task.
pub struct Ticker {
    receiver: watch::Receiver<Tick>,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Compute the current code and spawn the refresh task.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the first code cannot be generated. Nothing is
    /// spawned in that case.
    pub async fn start<S>(engine: Arc<Totp<S>>, session: Session) -> Result<Self>
    where
        S: HmacSigner + 'static,
    {
        let first = tick(&*engine, &session, engine.clock().now()).await?;
        let (sender, receiver) = watch::channel(first);
        let handle = tokio::spawn(run(engine, session, sender));

        Ok(Self { receiver, handle })
    }

    /// Latest published tick.
    pub fn current(&self) -> Tick {
        self.receiver.borrow().clone()
    }

    /// Wait for the next tick. Returns `false` once the task is gone.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    pub fn subscribe(&self) -> watch::Receiver<Tick> {
        self.receiver.clone()
    }

    /// Abort the task. The session, and its key, are dropped with it.
    pub fn stop(self) {
        self.handle.abort();
    }
}

async fn tick<S: HmacSigner>(
    engine: &Totp<S>,
    session: &Session,
    unix_seconds: u64,
) -> Result<Tick> {
    let config = session.config();
    let step = TimeStep::at(unix_seconds, config.period(), 0);
    let code = engine
        .generate_with_key(session.secret(), step, config.digits())
        .await?;

    Ok(Tick {
        code,
        step: step.value(),
        expires_at: next_boundary_at(unix_seconds, config.period()),
    })
}

async fn run<S: HmacSigner>(
    engine: Arc<Totp<S>>,
    session: Session,
    sender: watch::Sender<Tick>,
) {
    let period = session.config().period();
    let period_millis = period.get() as u128 * 1000;

    loop {
        let until_boundary =
            period_millis - engine.clock().now_millis() % period_millis;
        let delay = Duration::from_millis(until_boundary as u64).min(MAX_SLEEP);

        tokio::select! {
            _ = tokio::time::sleep(delay) => {},
            _ = sender.closed() => break,
        }

        let now = engine.clock().now();
        let last = sender.borrow().step;
        if TimeStep::at(now, period, 0).value() == last {
            continue;
        }

        match tick(&*engine, &session, now).await {
            Ok(fresh) => {
                tracing::debug!(
                    step = fresh.step,
                    expires_at = fresh.expires_at,
                    "code refreshed"
                );
                if sender.send(fresh).is_err() {
                    break;
                }
            },
            Err(err) => {
                tracing::error!(error = %err, "cannot refresh code, stopping");
                break;
            },
        }
    }

    tracing::debug!("refresh task ended");
}
