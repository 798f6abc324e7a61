//! Synthetic traffic generator.
//!
//! Keeps dashboards populated without real traffic. Each tick walks every
//! catalog ad and writes impressions, clicks and dwell through the metrics
//! store. Scheduling is driven by a [`TickSource`], so tests can fire ticks by
//! hand or run under a paused tokio clock instead of waiting on wall time.

use crate::catalog::Catalog;
use crate::config::SimulatorConfig;
use crate::error::EngineResult;
use crate::storage::{AdMetrics, MetricsStore};
use crate::types::AdId;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Drives the simulator loop.
pub trait TickSource: Send + 'static {
    /// Wait for the next tick. Returns `false` once the source is exhausted.
    fn next_tick(&mut self) -> impl Future<Output = bool> + Send;
}

/// Fires every `period`, first tick one period after creation.
///
/// Late ticks are skipped rather than bursted.
pub struct IntervalTicks(Interval);

impl IntervalTicks {
    /// Must be called from within a tokio runtime
    pub fn new(period: Duration) -> Self {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self(ticker)
    }
}

impl TickSource for IntervalTicks {
    async fn next_tick(&mut self) -> bool {
        self.0.tick().await;
        true
    }
}

/// Ticks fired explicitly through a [`ManualTicker`].
///
/// The source is exhausted once every ticker has been dropped and the
/// queued ticks are consumed.
pub struct ManualTicks(mpsc::UnboundedReceiver<()>);

/// Sending half of [`ManualTicks`]
#[derive(Clone)]
pub struct ManualTicker(mpsc::UnboundedSender<()>);

impl ManualTicks {
    pub fn channel() -> (ManualTicker, ManualTicks) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ManualTicker(tx), ManualTicks(rx))
    }
}

impl ManualTicker {
    /// Queue one tick; `false` if the simulator loop has gone away
    pub fn tick(&self) -> bool {
        self.0.send(()).is_ok()
    }
}

impl TickSource for ManualTicks {
    async fn next_tick(&mut self) -> bool {
        self.0.recv().await.is_some()
    }
}

/// Generates random ad traffic against a metrics store.
#[derive(Debug, Clone)]
pub struct TrafficSimulator {
    ads: Arc<[AdId]>,
    store: MetricsStore,
    config: SimulatorConfig,
}

impl TrafficSimulator {
    /// Snapshot the catalog's ad ids; the catalog never changes after load.
    ///
    /// # Errors
    /// Returns a validation error for a config the sampler cannot use.
    pub fn new(catalog: &Catalog, store: MetricsStore, config: SimulatorConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            ads: catalog.ads().iter().map(|ad| ad.id.clone()).collect(),
            store,
            config,
        })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Run one tick synchronously and return the totals it wrote
    pub fn tick<R: Rng + ?Sized>(&self, rng: &mut R) -> AdMetrics {
        let mut written = AdMetrics::default();

        for ad in self.ads.iter() {
            let impressions = rng.random_range(1..=self.config.max_impressions_per_tick);
            for _ in 0..impressions {
                let viewable = rng.random_bool(self.config.viewability_rate);
                self.store.record_impression(ad, viewable);
                written.impressions += 1;

                if !viewable {
                    continue;
                }
                written.viewable_impressions += 1;

                if rng.random_bool(self.config.click_through_rate) {
                    self.store.record_click(ad);
                    written.clicks += 1;
                }

                let mean = self.config.dwell_mean_secs;
                let dwell = (mean + standard_normal(rng) * mean).max(0.0);
                match self.store.record_dwell(ad, dwell) {
                    Ok(()) => written.dwell_seconds += dwell,
                    Err(e) => warn!("[simulator] dropped dwell sample for {ad}: {e}"),
                }
            }
        }

        written
    }

    /// Start ticking on the configured interval.
    ///
    /// Uses the configured seed when present, OS entropy otherwise. Must be
    /// called from within a tokio runtime.
    pub fn start(self) -> SimulatorHandle {
        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let ticks = IntervalTicks::new(self.config.interval());
        self.start_with(ticks, rng)
    }

    /// Start ticking from an arbitrary source.
    ///
    /// With no ads in the catalog nothing is spawned, but the returned handle
    /// still behaves normally.
    pub fn start_with<T: TickSource>(self, mut ticks: T, mut rng: StdRng) -> SimulatorHandle {
        let token = CancellationToken::new();
        let gate = Arc::new(Mutex::new(()));
        let completed = Arc::new(AtomicU64::new(0));

        if self.ads.is_empty() {
            info!("[simulator] catalog has no ads; nothing to simulate");
            return SimulatorHandle::new(token, gate, completed, None);
        }

        info!(
            "[simulator] starting: {} ads every {}ms",
            self.ads.len(),
            self.config.interval_ms
        );

        let task = {
            let token = token.clone();
            let gate = Arc::clone(&gate);
            let completed = Arc::clone(&completed);
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        more = ticks.next_tick() => {
                            if !more || !self.gated_tick(&gate, &token, &mut rng, &completed) {
                                break;
                            }
                        }
                    }
                }
                debug!(
                    "[simulator] loop exited after {} ticks",
                    completed.load(Ordering::SeqCst)
                );
            })
        };

        SimulatorHandle::new(token, gate, completed, Some(task))
    }

    /// One tick under the gate, skipped if a stop already went through
    fn gated_tick(
        &self,
        gate: &Mutex<()>,
        token: &CancellationToken,
        rng: &mut StdRng,
        completed: &AtomicU64,
    ) -> bool {
        let _guard = gate.lock();
        if token.is_cancelled() {
            return false;
        }
        let written = self.tick(rng);
        let n = completed.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            "[simulator] tick {n}: {} impressions, {} viewable, {} clicks",
            written.impressions, written.viewable_impressions, written.clicks
        );
        true
    }
}

/// Box-Muller sample from N(0, 1)
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // random() is in [0, 1); flip it so ln never sees 0
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Stops a running simulator.
///
/// Dropping the handle also stops the simulator.
#[derive(Debug)]
pub struct SimulatorHandle {
    token: CancellationToken,
    gate: Arc<Mutex<()>>,
    completed: Arc<AtomicU64>,
    stopped: AtomicBool,
    task: Option<JoinHandle<()>>,
}

impl SimulatorHandle {
    fn new(
        token: CancellationToken,
        gate: Arc<Mutex<()>>,
        completed: Arc<AtomicU64>,
        task: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            token,
            gate,
            completed,
            stopped: AtomicBool::new(false),
            task,
        }
    }

    /// Halt scheduling.
    ///
    /// Once this returns, no further writes reach the metrics store: a tick
    /// already in progress is waited for, and later ticks are skipped.
    /// Returns `true` for the call that actually stopped the simulator and
    /// `false` for every later call.
    pub fn stop(&self) -> bool {
        let first = !self.stopped.swap(true, Ordering::SeqCst);
        self.token.cancel();
        drop(self.gate.lock());
        if first {
            info!(
                "[simulator] stopped after {} ticks",
                self.completed.load(Ordering::SeqCst)
            );
        }
        first
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled() && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Ticks completed so far
    pub fn ticks(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Wait for the loop to end on its own, e.g. when a manual source runs dry
    pub async fn finished(mut self) -> u64 {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("[simulator] task ended abnormally: {e}");
            }
        }
        self.ticks()
    }
}

impl Drop for SimulatorHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
