//! Polling service publishing `MarketState` to subscribers.
//!
//! Each `start` opens a new run generation. Cycles belonging to an older
//! generation may still finish, but their results are dropped at publish time:
//! the generation check and the watch send happen under the same lock that
//! `stop` takes, so nothing from a stopped run reaches subscribers once `stop`
//! has returned.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use market_core::{MarketSnapshot, QuoteSource};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::pipeline::MarketPipeline;
use crate::state::MarketState;

/// Polling interval used by the runner when none is configured
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(5000);

const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(1);

/// How a single refresh cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// New snapshot published
    Published,
    /// Fetch failed; error flagged on the existing snapshot
    Failed,
    /// Run was stopped or restarted while the cycle was in flight
    Discarded,
    /// Another cycle was already in flight
    Skipped,
}

struct Control {
    generation: u64,
    running: Option<CancellationToken>,
}

/// State cell plus run bookkeeping, shared with handles and the loop task
struct Controller {
    control: Mutex<Control>,
    state_tx: watch::Sender<MarketState>,
}

impl Controller {
    fn new() -> Self {
        let (state_tx, _) = watch::channel(MarketState::initial());
        Self {
            control: Mutex::new(Control {
                generation: 0,
                running: None,
            }),
            state_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current_generation(&self) -> u64 {
        self.lock().generation
    }

    fn is_running(&self) -> bool {
        self.lock().running.is_some()
    }

    /// Cancel any running loop and open a new generation for the next one.
    fn begin_run(&self) -> (u64, CancellationToken) {
        let mut control = self.lock();
        if let Some(previous) = control.running.take() {
            previous.cancel();
            tracing::debug!("Restarting refresh loop (generation {})", control.generation);
        }
        control.generation += 1;

        let token = CancellationToken::new();
        control.running = Some(token.clone());
        (control.generation, token)
    }

    fn stop(&self) {
        let mut control = self.lock();
        self.stop_locked(&mut control);
    }

    /// Stop only if `generation` is still the active run.
    fn stop_generation(&self, generation: u64) {
        let mut control = self.lock();
        if control.generation == generation {
            self.stop_locked(&mut control);
        }
    }

    fn stop_locked(&self, control: &mut Control) {
        let Some(token) = control.running.take() else {
            return;
        };
        token.cancel();
        control.generation += 1;
        self.state_tx.send_if_modified(MarketState::abandon_cycle);
        tracing::info!("Market refresh stopped");
    }

    /// Apply `update` and notify subscribers, unless the run has moved on.
    fn publish_if_current(&self, generation: u64, update: impl FnOnce(&mut MarketState)) -> bool {
        let control = self.lock();
        if control.generation != generation {
            return false;
        }
        self.state_tx.send_modify(update);
        true
    }
}

/// Source, pipeline and the cycle lock that keeps cycles from overlapping
struct Engine<S> {
    source: S,
    pipeline: MarketPipeline,
    cycle_lock: tokio::sync::Mutex<()>,
}

impl<S: QuoteSource> Engine<S> {
    async fn run_cycle(&self, controller: &Controller, generation: u64) -> CycleOutcome {
        let _cycle = self.cycle_lock.lock().await;
        self.execute(controller, generation).await
    }

    async fn try_run_cycle(&self, controller: &Controller, generation: u64) -> CycleOutcome {
        match self.cycle_lock.try_lock() {
            Ok(_cycle) => self.execute(controller, generation).await,
            Err(_) => {
                tracing::debug!("Refresh already in flight, skipping");
                CycleOutcome::Skipped
            }
        }
    }

    async fn execute(&self, controller: &Controller, generation: u64) -> CycleOutcome {
        if !controller.publish_if_current(generation, MarketState::begin_cycle) {
            return CycleOutcome::Discarded;
        }

        let started = Instant::now();
        let fetched = self.pipeline.fetch(&self.source).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match fetched {
            Ok(data) => {
                let previous = controller.state_tx.borrow().snapshot.ranked.clone();
                let snapshot = self.pipeline.assemble(data, &previous, Utc::now());
                let summary = format!(
                    "{} {} | {} indices, {} ranked",
                    snapshot.mode.label,
                    snapshot.mode.score,
                    snapshot.indices.len(),
                    snapshot.ranked.len()
                );

                let published = controller
                    .publish_if_current(generation, |state| state.publish(snapshot, duration_ms));
                if published {
                    tracing::info!("Market snapshot published in {}ms: {}", duration_ms, summary);
                    CycleOutcome::Published
                } else {
                    tracing::debug!(
                        "Dropping snapshot from stale refresh generation {}",
                        generation
                    );
                    CycleOutcome::Discarded
                }
            }
            Err(e) => {
                if controller.publish_if_current(generation, |state| state.fail(duration_ms)) {
                    tracing::warn!("Market refresh failed after {}ms: {}", duration_ms, e);
                    CycleOutcome::Failed
                } else {
                    CycleOutcome::Discarded
                }
            }
        }
    }
}

/// Polls a quote source on a fixed cadence and publishes `MarketState`.
///
/// `start` and `stop` need to be called from within a tokio runtime. Dropping
/// the service stops its loop.
pub struct MarketDataService<S: QuoteSource + 'static> {
    engine: Arc<Engine<S>>,
    controller: Arc<Controller>,
}

impl<S: QuoteSource + 'static> MarketDataService<S> {
    pub fn new(source: S) -> Self {
        Self::with_pipeline(source, MarketPipeline::new())
    }

    pub fn with_pipeline(source: S, pipeline: MarketPipeline) -> Self {
        Self {
            engine: Arc::new(Engine {
                source,
                pipeline,
                cycle_lock: tokio::sync::Mutex::new(()),
            }),
            controller: Arc::new(Controller::new()),
        }
    }

    /// Begin polling: one cycle right away, then one per `interval`.
    ///
    /// Starting an already running service replaces the previous loop, so
    /// there is never more than one timer.
    pub fn start(&self, interval: Duration) -> RefreshHandle {
        let period = if interval < MIN_REFRESH_INTERVAL {
            tracing::warn!(
                "Refresh interval {:?} too short, using {:?}",
                interval,
                MIN_REFRESH_INTERVAL
            );
            MIN_REFRESH_INTERVAL
        } else {
            interval
        };

        let (generation, token) = self.controller.begin_run();
        tracing::info!(
            "Starting market refresh every {}ms (generation {})",
            period.as_millis(),
            generation
        );

        tokio::spawn(refresh_loop(
            Arc::clone(&self.engine),
            Arc::clone(&self.controller),
            generation,
            token.clone(),
            period,
        ));

        RefreshHandle {
            controller: Arc::clone(&self.controller),
            generation,
            token,
        }
    }

    /// Stop polling. No-op when not running.
    pub fn stop(&self) {
        self.controller.stop();
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    /// Run one cycle now, outside the timer. Skipped if a cycle is in flight.
    pub async fn refresh_now(&self) -> CycleOutcome {
        let generation = self.controller.current_generation();
        self.engine.try_run_cycle(&self.controller, generation).await
    }

    pub fn subscribe(&self) -> watch::Receiver<MarketState> {
        self.controller.state_tx.subscribe()
    }

    pub fn state(&self) -> MarketState {
        self.controller.state_tx.borrow().clone()
    }

    pub fn snapshot(&self) -> MarketSnapshot {
        self.controller.state_tx.borrow().snapshot.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.controller.state_tx.borrow().loading
    }

    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        self.controller.state_tx.borrow().last_updated_at
    }
}

impl<S: QuoteSource + 'static> Drop for MarketDataService<S> {
    fn drop(&mut self) {
        self.controller.stop();
    }
}

/// Handle to one run of the refresh loop.
///
/// Dropping the handle leaves the loop running.
pub struct RefreshHandle {
    controller: Arc<Controller>,
    generation: u64,
    token: CancellationToken,
}

impl RefreshHandle {
    /// Stop this run. Has no effect if the service was restarted since.
    pub fn stop(&self) {
        self.controller.stop_generation(self.generation);
    }

    /// True once this run has been stopped or replaced
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

async fn refresh_loop<S: QuoteSource>(
    engine: Arc<Engine<S>>,
    controller: Arc<Controller>,
    generation: u64,
    token: CancellationToken,
    period: Duration,
) {
    if token.is_cancelled() {
        return;
    }
    engine.run_cycle(&controller, generation).await;

    // Cycles run inside the loop body, so a slow one delays the next tick
    // instead of overlapping it; missed ticks are dropped.
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                engine.run_cycle(&controller, generation).await;
            }
        }
    }

    tracing::debug!("Refresh loop generation {} exited", generation);
}
