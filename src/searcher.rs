//! Concurrent search for the scale at which each dive level takes over.
//!
//! Every task owns one level of the dive path. It binary-searches the scale
//! step at which the viewport first fits inside that level's boundary circle,
//! publishes the resulting key gasket, then claims the next unsearched level
//! and posts it to the pool. Parallelism equals the worker count; the single
//! shared counter is what hands levels to whichever worker frees up first.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::complex::Complex;
use crate::error::{Error, Result};
use crate::field::{checked_div, Field};
use crate::mobius::Mobius;
use crate::scaler::Scaler;
use crate::sdf::ImplicitCircle;
use crate::shape::GasketShape;
use crate::snapshot::{merge_snapshot, KeyGasket, Logscale, SnapshotMap};

pub const DEFAULT_THREADS: usize = 4;

/// What one finished task found.
#[derive(Clone, Copy, Debug)]
pub struct TaskOutcome {
    pub level: usize,
    pub step: u32,
    pub logscale: f64,
}

type TaskReport = Result<TaskOutcome>;

/// Everything behind the search lock.
#[derive(Debug, Default)]
struct SearchState {
    snapshots: SnapshotMap,
    found_end: bool,
    last_picked_up: usize,
}

/// Read-only inputs shared by every task, plus the locked state.
struct SearchJob<T> {
    scaler: Arc<Scaler<T>>,
    center: Complex<T>,
    aspect_ratio: T,
    pts: [Complex<T>; 3],
    transforms: [Mobius<T>; 3],
    zoom_transforms: Vec<Mobius<T>>,
    state: Mutex<SearchState>,
}

pub struct Searcher<T> {
    job: Arc<SearchJob<T>>,
    shape: Arc<GasketShape<T>>,
    num_threads: usize,
    runtime: Runtime,
    reports_tx: Option<UnboundedSender<TaskReport>>,
    reports_rx: UnboundedReceiver<TaskReport>,
}

impl<T: Field> Searcher<T> {
    /// `zoom_transforms[i]` is the camera path after `i + 1` dives.
    pub fn new(
        shape: Arc<GasketShape<T>>,
        scaler: Arc<Scaler<T>>,
        center: Complex<T>,
        inverse_dive: bool,
        zoom_transforms: Vec<Mobius<T>>,
        aspect_ratio: T,
        num_threads: usize,
    ) -> Result<Self> {
        if num_threads == 0 {
            return Err(Error::InvalidConfig("thread count must be positive".into()));
        }
        let runtime = Builder::new_multi_thread()
            .worker_threads(num_threads)
            .thread_name("gasket-search")
            .build()?;
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();

        let job = SearchJob {
            scaler,
            center,
            aspect_ratio,
            pts: shape.starting_points(inverse_dive),
            transforms: shape.dive_array(inverse_dive)?,
            zoom_transforms,
            state: Mutex::new(SearchState::default()),
        };

        Ok(Searcher {
            job: Arc::new(job),
            shape,
            num_threads,
            runtime,
            reports_tx: Some(reports_tx),
            reports_rx,
        })
    }

    /// Seeds the pool with the first `num_threads` levels.
    pub fn start(&mut self) -> Result<()> {
        // Tasks keep their own clones of the sender; ours goes once seeded.
        let Some(reports) = self.reports_tx.take() else {
            return Err(Error::InvalidConfig("search already started".into()));
        };
        let job = &self.job;
        let boundary = ImplicitCircle::from_points(&job.pts[0], &job.pts[1], &job.pts[2]);
        let initial_scale = job.scaler.lookup_exp(0)?;
        let (width, height) = job.viewport(&initial_scale)?;
        if !boundary.rect_inside(&job.center, &width, &height) {
            // Shallow zoom: the undived gasket is already visible at step 0.
            let transforms = self
                .shape
                .double_sided_transforms(&initial_scale, &job.center)?;
            let key = Logscale(job.scaler.initial_logscale.to_f64());
            merge_snapshot(&mut job.lock().snapshots, key, KeyGasket::new(transforms, 0));
            debug!("inserted double sided key gasket at {}", key.0);
        }

        let initial = self.num_threads.min(job.zoom_transforms.len());
        if initial == 0 {
            warn!("empty dive path, nothing to search");
            return Ok(());
        }
        job.lock().last_picked_up = initial - 1;
        info!(
            "searching {} dive levels over {} scale steps with {} workers",
            job.zoom_transforms.len(),
            job.scaler.num_steps,
            self.num_threads
        );
        for level in 0..initial {
            let job = Arc::clone(job);
            let reports = reports.clone();
            self.runtime.spawn(async move { run_task(job, level, reports) });
        }
        Ok(())
    }

    /// Waits until every task, including the ones spawned as continuations,
    /// has finished.
    pub fn block(&mut self) -> Result<()> {
        // Tasks hold the remaining senders; the channel closes when the last
        // one finishes. Without a start() the sender is still ours.
        self.reports_tx = None;
        let reports_rx = &mut self.reports_rx;
        let failures = self.runtime.block_on(async {
            let mut failures = Vec::new();
            while let Some(report) = reports_rx.recv().await {
                match report {
                    Ok(outcome) => debug!(
                        "level {} settled at step {} (logscale {})",
                        outcome.level, outcome.step, outcome.logscale
                    ),
                    Err(e) => {
                        warn!("search task failed: {e}");
                        failures.push(e.to_string());
                    }
                }
            }
            failures
        });

        let state = self.job.lock();
        if !state.found_end {
            warn!("dive path exhausted before the scale search saturated");
        }
        info!("search finished with {} key gaskets", state.snapshots.len());
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::SearchFailed(failures.join("; ")))
        }
    }

    pub fn snapshots(&self) -> SnapshotMap {
        self.job.lock().snapshots.clone()
    }

    /// Whether some level's search reached the last scale step.
    pub fn found_end(&self) -> bool {
        self.job.lock().found_end
    }
}

impl<T: Field> SearchJob<T> {
    fn lock(&self) -> MutexGuard<'_, SearchState> {
        // Merges are idempotent, so state left by a panicking task is usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Viewport (width, height) at the given magnification.
    fn viewport(&self, scale: &T) -> Result<(T, T)> {
        let height = checked_div(T::from_ratio(2, 1), scale)?;
        let width = height.clone() * self.aspect_ratio.clone();
        Ok((width, height))
    }

    /// Smallest step in (0, num_steps] whose viewport fits in `boundary`;
    /// step 0 is assumed not to fit.
    fn search_scale(&self, boundary: &ImplicitCircle<T>) -> Result<u32> {
        let mut lb = 0;
        let mut ub = self.scaler.num_steps;
        while ub - lb > 1 {
            let m = lb + (ub - lb) / 2;
            let (width, height) = self.viewport(&self.scaler.lookup_exp(m)?)?;
            if boundary.rect_inside(&self.center, &width, &height) {
                ub = m;
            } else {
                lb = m;
            }
        }
        Ok(ub)
    }

    /// All the fallible arithmetic of one task, done before touching the lock.
    fn search_level(&self, level: usize) -> Result<(TaskOutcome, KeyGasket)> {
        let acc = &self.zoom_transforms[level];
        let q = [
            acc.apply(&self.pts[0])?,
            acc.apply(&self.pts[1])?,
            acc.apply(&self.pts[2])?,
        ];
        let boundary = ImplicitCircle::from_points(&q[0], &q[1], &q[2]);
        let step = self.search_scale(&boundary)?;

        let s = Mobius::scaling(Complex::real(self.scaler.lookup_exp(step)?))?
            .compose(&Mobius::translation(-self.center.clone()))
            .compose(acc);
        let mut transforms = Vec::with_capacity(self.transforms.len());
        for t in &self.transforms {
            transforms.push(t.conjugate(&s)?.to_f64());
        }

        let outcome = TaskOutcome {
            level,
            step,
            logscale: self.scaler.logscale(step).to_f64(),
        };
        Ok((outcome, KeyGasket::new(transforms, level)))
    }

    /// Publishes a finished level and claims the next one, if any.
    fn publish(&self, found: Option<(TaskOutcome, KeyGasket)>) -> Option<usize> {
        let mut state = self.lock();
        if let Some((outcome, gasket)) = found {
            merge_snapshot(&mut state.snapshots, Logscale(outcome.logscale), gasket);
            if outcome.step >= self.scaler.num_steps {
                state.found_end = true;
            }
        }
        if state.found_end || state.last_picked_up + 1 >= self.zoom_transforms.len() {
            return None;
        }
        state.last_picked_up += 1;
        Some(state.last_picked_up)
    }
}

/// Body of one pool task. Runs synchronously on a worker and posts its
/// successor before returning.
fn run_task<T: Field>(job: Arc<SearchJob<T>>, level: usize, reports: UnboundedSender<TaskReport>) {
    let result = job.search_level(level);
    let (found, report) = match result {
        Ok((outcome, gasket)) => (Some((outcome, gasket)), Ok(outcome)),
        Err(e) => (None, Err(e)),
    };

    if let Some(next) = job.publish(found) {
        let job = Arc::clone(&job);
        let reports = reports.clone();
        tokio::spawn(async move { run_task(job, next, reports) });
    }
    // The receiver only goes away once block() has returned.
    let _ = reports.send(report);
}
