//! Zoom path planning and the fan-out/fan-in render batch.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use smallvec::{SmallVec, smallvec};

use crate::animation::PingPong;
use crate::foundation::core::PixelRect;
use crate::foundation::error::{ZoomError, ZoomResult};
use crate::render::raster::IndexedFrame;
use crate::render::renderer::{FrameRenderer, RenderSource};

/// Interpolate `steps` windows from `full` towards `locked`.
///
/// Each edge moves linearly and independently. Element `i` (0-based) sits at fraction
/// `(i + 1) / steps`, so the path never contains `full` itself and always ends on `locked`.
pub fn plan_zoom_path(
    full: PixelRect,
    locked: PixelRect,
    steps: usize,
) -> ZoomResult<Vec<PixelRect>> {
    if steps == 0 {
        return Err(ZoomError::invalid_dimension("zoom path needs at least one step"));
    }
    if !locked.is_inside(full) {
        return Err(ZoomError::out_of_bounds(locked, full));
    }

    let n = steps as i64;
    let lerp = |from: i32, to: i32, i: i64| -> i32 {
        let delta = i64::from(to) - i64::from(from);
        (i64::from(from) + delta * i / n) as i32
    };

    let path = (1..=n)
        .map(|i| PixelRect {
            min_x: lerp(full.min_x, locked.min_x, i),
            min_y: lerp(full.min_y, locked.min_y, i),
            max_x: lerp(full.max_x, locked.max_x, i),
            max_y: lerp(full.max_y, locked.max_y, i),
        })
        .collect::<Vec<_>>();
    tracing::debug!(steps, first = %path[0], last = %path[path.len() - 1], "planned zoom path");
    Ok(path)
}

/// One unit of render work: a window and the animation slots it fills.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameTask {
    /// Position on the zoom path.
    pub index: usize,
    pub target: PixelRect,
    /// Output slots; a forward frame and its mirrored position share one render.
    pub slots: SmallVec<[usize; 2]>,
}

/// A finished render tagged with the slots it belongs to.
#[derive(Clone, Debug)]
pub struct FrameResult {
    pub index: usize,
    pub slots: SmallVec<[usize; 2]>,
    pub image: Arc<IndexedFrame>,
}

/// Tasks for a zoom path, with output slots laid out for `layout`.
pub fn tasks_for_path(path: &[PixelRect], layout: PingPong) -> Vec<FrameTask> {
    path.iter()
        .enumerate()
        .map(|(index, &target)| FrameTask {
            index,
            target,
            slots: layout.zoom_slots(index, path.len()),
        })
        .collect()
}

/// Cooperative cancellation flag, observed between tasks.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Worker pool and deadline controls for a render batch.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SchedulerOpts {
    /// Worker thread count. `None` uses rayon's default (available parallelism).
    pub threads: Option<usize>,
    /// Overall batch deadline in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl SchedulerOpts {
    pub fn validate(&self) -> ZoomResult<()> {
        if self.threads == Some(0) {
            return Err(ZoomError::config("scheduler 'threads' must be >= 1 when set"));
        }
        if self.timeout_ms == Some(0) {
            return Err(ZoomError::config("scheduler 'timeout_ms' must be >= 1 when set"));
        }
        Ok(())
    }
}

enum TaskOutcome {
    Rendered(IndexedFrame),
    Skipped,
    TimedOut,
    Failed(ZoomError),
}

/// Render every task on a bounded pool and return results ordered by task index.
///
/// Blocks until all workers have reported or the deadline passes. Results are placed by their
/// index tag, so worker completion order never affects the output. The first failure stops
/// remaining tasks from starting; the batch then fails once with the lowest failing index.
/// On timeout the caller is released at the deadline; tasks still running finish in the
/// background and their output is dropped.
pub fn dispatch(
    source: Arc<RenderSource>,
    tasks: &[FrameTask],
    renderer: Arc<dyn FrameRenderer>,
    opts: &SchedulerOpts,
    cancel: &CancelToken,
) -> ZoomResult<Vec<FrameResult>> {
    opts.validate()?;
    for (i, task) in tasks.iter().enumerate() {
        if task.index != i {
            return Err(ZoomError::invalid_dimension(format!(
                "task indices must be contiguous from 0; position {i} holds #{}",
                task.index
            )));
        }
    }
    if tasks.is_empty() {
        return Ok(Vec::new());
    }

    let pool = build_thread_pool(opts.threads)?;
    let started = Instant::now();
    let deadline = opts
        .timeout_ms
        .map(|ms| started + Duration::from_millis(ms));
    let abort = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel::<(usize, TaskOutcome)>();

    {
        let work = tasks.to_vec();
        let abort = abort.clone();
        let cancel = cancel.clone();
        pool.spawn(move || {
            work.par_iter().for_each_with(tx, |tx, task| {
                let outcome = run_task(&source, task, &*renderer, &cancel, &abort, deadline);
                if matches!(outcome, TaskOutcome::Failed(_) | TaskOutcome::TimedOut) {
                    abort.store(true, Ordering::SeqCst);
                }
                // The collector may have given up at the deadline.
                let _ = tx.send((task.index, outcome));
            });
        });
    }

    let mut frames: Vec<Option<IndexedFrame>> = tasks.iter().map(|_| None).collect();
    let mut failures = Vec::<(usize, ZoomError)>::new();
    let mut timed_out = false;
    let mut pending = tasks.len();
    while pending > 0 {
        let received = match deadline {
            Some(d) => {
                let left = d.saturating_duration_since(Instant::now());
                match rx.recv_timeout(left) {
                    Ok(msg) => Some(msg),
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        timed_out = true;
                        None
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => None,
                }
            }
            None => rx.recv().ok(),
        };
        let Some((index, outcome)) = received else {
            break;
        };
        pending -= 1;
        match outcome {
            TaskOutcome::Rendered(frame) => frames[index] = Some(frame),
            TaskOutcome::Failed(err) => failures.push((index, err)),
            TaskOutcome::TimedOut => timed_out = true,
            TaskOutcome::Skipped => {}
        }
    }
    if pending > 0 {
        // Stop queued tasks; the pool winds down once running ones return.
        abort.store(true, Ordering::SeqCst);
    }

    let elapsed_ms = started.elapsed().as_millis() as u64;
    if !failures.is_empty() {
        failures.sort_by_key(|(index, _)| *index);
        let failed = failures.len();
        let (index, source) = failures.swap_remove(0);
        tracing::warn!(index, failed, error = %source, "render batch failed");
        return Err(ZoomError::RenderFailure {
            index,
            failed,
            source: Box::new(source),
        });
    }
    if cancel.is_cancelled() {
        return Err(ZoomError::Cancelled);
    }
    if timed_out || deadline.is_some_and(|d| Instant::now() > d) {
        tracing::warn!(elapsed_ms, pending, "render batch timed out");
        return Err(ZoomError::Timeout { elapsed_ms });
    }

    let mut out = Vec::with_capacity(tasks.len());
    for (task, frame) in tasks.iter().zip(frames) {
        let image = frame.ok_or_else(|| {
            ZoomError::Other(anyhow::anyhow!(
                "internal error: frame #{} missing after barrier",
                task.index
            ))
        })?;
        out.push(FrameResult {
            index: task.index,
            slots: task.slots.clone(),
            image: Arc::new(image),
        });
    }
    tracing::debug!(frames = out.len(), elapsed_ms, "render batch complete");
    Ok(out)
}

/// Render `source` through every window of `path`, in path order.
pub fn render_all(
    source: Arc<RenderSource>,
    path: &[PixelRect],
    renderer: Arc<dyn FrameRenderer>,
    opts: &SchedulerOpts,
) -> ZoomResult<Vec<Arc<IndexedFrame>>> {
    let tasks = path
        .iter()
        .enumerate()
        .map(|(index, &target)| FrameTask {
            index,
            target,
            slots: smallvec![index],
        })
        .collect::<Vec<_>>();
    let results = dispatch(source, &tasks, renderer, opts, &CancelToken::new())?;
    Ok(results.into_iter().map(|r| r.image).collect())
}

fn run_task(
    source: &RenderSource,
    task: &FrameTask,
    renderer: &dyn FrameRenderer,
    cancel: &CancelToken,
    abort: &AtomicBool,
    deadline: Option<Instant>,
) -> TaskOutcome {
    if cancel.is_cancelled() || abort.load(Ordering::SeqCst) {
        return TaskOutcome::Skipped;
    }
    if deadline.is_some_and(|d| Instant::now() > d) {
        return TaskOutcome::TimedOut;
    }

    let t0 = Instant::now();
    let rendered = catch_unwind(AssertUnwindSafe(|| renderer.render(source, task.target)));
    match rendered {
        Ok(Ok(frame)) => {
            tracing::debug!(
                index = task.index,
                target = %task.target,
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "rendered zoom frame"
            );
            TaskOutcome::Rendered(frame)
        }
        Ok(Err(err)) => TaskOutcome::Failed(err),
        Err(_) => TaskOutcome::Failed(ZoomError::Other(anyhow::anyhow!(
            "render worker panicked on frame #{}",
            task.index
        ))),
    }
}

fn build_thread_pool(threads: Option<usize>) -> ZoomResult<rayon::ThreadPool> {
    let mut builder =
        rayon::ThreadPoolBuilder::new().thread_name(|i| format!("okzoomer-render-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ZoomError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../tests/unit/schedule.rs"]
mod tests;
