//! Image streamer: progressive thumbnail grid.
//!
//! ARCHITECTURE
//! ============
//! `stream` shows a composed grid image while its thumbnails download:
//!
//! ```text
//!   Loading ──tick──▶ Updating ──tick──▶ … ──▶ Done | TimedOut
//! ```
//!
//! - One task per URL runs `fetch_with_retry` and posts a `DownloadResult`
//!   on a shared channel.
//! - One collector task drains the channel into a pre-sized slot vector,
//!   writing by index, and fires a completion signal once every result is in.
//! - The calling task owns the session and is the only one that renders: on
//!   every tick, on completion and on the deadline.
//!
//! All spawned tasks live in one `JoinSet`, so none outlives `stream`.
//!
//! DESIGN
//! ======
//! The session's streaming flag is set on entry and cleared on every exit. A
//! second `stream` on a session whose flag is still set is refused with a
//! "still loading" re-render instead of racing the first.

pub mod fetch;
pub mod grid;

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use image::RgbaImage;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::env_parse;
use crate::context::{Context, Responded};
use crate::event::Interaction;
use crate::manager::Manager;
use crate::message::Attachment;
use crate::page::Page;
use crate::session::Session;

use self::fetch::{DownloadResult, RetryPolicy, ThumbnailFetcher, fetch_with_retry};
use self::grid::{DEFAULT_CELL_SIZE, GridLayout, compose, placeholder};

/// Attachment name of the composed grid. Pages reference it as
/// `attachment://grid.png`.
pub const GRID_FILENAME: &str = "grid.png";

pub const LOADING_STATUS: &str = "Loading images…";
pub const STILL_LOADING_STATUS: &str = "Images are still loading, please wait.";
pub const NO_IMAGES_STATUS: &str = "No images to show.";

pub const DEFAULT_TICK_MS: u64 = 1500;
pub const DEFAULT_DEADLINE_MS: u64 = 10_000;
pub const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 250;

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Interval between progress renders.
    pub tick: Duration,
    /// Bound on the whole operation, measured from entry.
    pub deadline: Duration,
    pub attempt_timeout: Duration,
    pub attempts: u32,
    pub retry_backoff: Duration,
    pub cell_size: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            deadline: Duration::from_millis(DEFAULT_DEADLINE_MS),
            attempt_timeout: Duration::from_millis(DEFAULT_ATTEMPT_TIMEOUT_MS),
            attempts: DEFAULT_ATTEMPTS,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            cell_size: DEFAULT_CELL_SIZE,
        }
    }
}

impl StreamConfig {
    /// Build streamer timings from environment variables.
    ///
    /// Optional:
    /// - `STREAM_TICK_MS`: default 1500
    /// - `STREAM_DEADLINE_MS`: default 10000
    /// - `STREAM_ATTEMPT_TIMEOUT_MS`: default 2000
    /// - `STREAM_ATTEMPTS`: default 3, at least 1
    /// - `STREAM_RETRY_BACKOFF_MS`: default 250
    #[must_use]
    pub fn from_env() -> Self {
        // A zero tick would make the ticker spin.
        let tick_ms = env_parse("STREAM_TICK_MS", DEFAULT_TICK_MS).max(1);
        Self {
            tick: Duration::from_millis(tick_ms),
            deadline: Duration::from_millis(env_parse("STREAM_DEADLINE_MS", DEFAULT_DEADLINE_MS)),
            attempt_timeout: Duration::from_millis(env_parse("STREAM_ATTEMPT_TIMEOUT_MS", DEFAULT_ATTEMPT_TIMEOUT_MS)),
            attempts: env_parse("STREAM_ATTEMPTS", DEFAULT_ATTEMPTS).max(1),
            retry_backoff: Duration::from_millis(env_parse("STREAM_RETRY_BACKOFF_MS", DEFAULT_RETRY_BACKOFF_MS)),
            cell_size: DEFAULT_CELL_SIZE,
        }
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy { attempts: self.attempts, attempt_timeout: self.attempt_timeout, backoff: self.retry_backoff }
    }
}

// =============================================================================
// REQUEST
// =============================================================================

pub type UrlSource = Box<dyn FnOnce() -> Vec<String> + Send>;
pub type SuccessHook = Box<dyn FnOnce(&mut Session, &[u8]) + Send>;

/// Everything a page supplies to stream a grid onto itself.
pub struct StreamRequest {
    page: String,
    urls: UrlSource,
    columns: u32,
    rows: u32,
    max_items: usize,
    on_success: Option<SuccessHook>,
}

impl StreamRequest {
    /// A `columns × rows` grid rendered on `page`, filled from `urls`.
    pub fn new<F>(page: impl Into<String>, columns: u32, rows: u32, urls: F) -> Self
    where
        F: FnOnce() -> Vec<String> + Send + 'static,
    {
        let cells = usize::try_from(columns.saturating_mul(rows)).unwrap_or(usize::MAX);
        Self { page: page.into(), urls: Box::new(urls), columns, rows, max_items: cells, on_success: None }
    }

    #[must_use]
    pub fn max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// Runs with the final grid once every download has finished in time.
    #[must_use]
    pub fn on_success<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&mut Session, &[u8]) + Send + 'static,
    {
        self.on_success = Some(Box::new(hook));
        self
    }
}

impl std::fmt::Debug for StreamRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamRequest")
            .field("page", &self.page)
            .field("columns", &self.columns)
            .field("rows", &self.rows)
            .field("max_items", &self.max_items)
            .field("on_success", &self.on_success.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Loading,
    Updating,
    Done,
    TimedOut,
}

// =============================================================================
// COLLECTED RESULTS
// =============================================================================

/// Slots written by the collector and read by every render pass.
#[derive(Debug)]
struct Collected {
    slots: Vec<Option<Vec<u8>>>,
    received: usize,
    failed: usize,
}

impl Collected {
    fn new(total: usize) -> Self {
        Self { slots: vec![None; total], received: 0, failed: 0 }
    }

    fn record(&mut self, result: DownloadResult) {
        let Some(slot) = self.slots.get_mut(result.index) else {
            warn!(index = result.index, "stream: result index out of range");
            return;
        };
        if result.bytes.is_none() {
            self.failed += 1;
        }
        *slot = result.bytes;
        self.received += 1;
    }

    fn total(&self) -> usize {
        self.slots.len()
    }
}

type SharedSlots = Arc<Mutex<Collected>>;

/// Snapshot of the slots plus counters, taken under the lock.
fn snapshot(collected: &SharedSlots) -> (Vec<Option<Vec<u8>>>, usize, usize, usize) {
    let guard = collected.lock().unwrap_or_else(PoisonError::into_inner);
    (guard.slots.clone(), guard.received, guard.failed, guard.total())
}

// =============================================================================
// STREAMER
// =============================================================================

/// Holds the session's streaming flag for the lifetime of one `stream`
/// call. Dropping it clears the flag, including when the future is dropped
/// mid-stream or a render pass panics.
struct StreamingGuard<'s> {
    session: &'s mut Session,
}

impl<'s> StreamingGuard<'s> {
    fn set(session: &'s mut Session) -> Self {
        session.set_streaming(true);
        Self { session }
    }
}

impl Drop for StreamingGuard<'_> {
    fn drop(&mut self) {
        self.session.set_streaming(false);
    }
}

impl Deref for StreamingGuard<'_> {
    type Target = Session;

    fn deref(&self) -> &Session {
        self.session
    }
}

impl DerefMut for StreamingGuard<'_> {
    fn deref_mut(&mut self) -> &mut Session {
        self.session
    }
}

pub struct ImageStreamer {
    fetcher: Arc<dyn ThumbnailFetcher>,
    config: StreamConfig,
    placeholder: Arc<RgbaImage>,
}

impl ImageStreamer {
    #[must_use]
    pub fn new(fetcher: Arc<dyn ThumbnailFetcher>, config: StreamConfig) -> Self {
        let placeholder = Arc::new(placeholder(config.cell_size));
        Self { fetcher, config, placeholder }
    }

    #[must_use]
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Stream a thumbnail grid onto `request.page`, answering the
    /// interaction in `ctx`.
    pub async fn stream(&self, ctx: Context<'_>, request: StreamRequest) -> Responded {
        let started = Instant::now();

        if ctx.session().is_streaming() {
            debug!(event = %ctx.event(), "stream: already streaming; refusing");
            return ctx.cancel(STILL_LOADING_STATUS).await;
        }

        let StreamRequest { page, urls, columns, rows, max_items, on_success } = request;
        let layout = GridLayout { columns, rows, max_items, cell_size: self.config.cell_size };

        let mut urls = urls();
        if urls.is_empty() {
            info!(page = %page, "stream: no URLs provided");
            return ctx.cancel(NO_IMAGES_STATUS).await;
        }
        let capacity = layout.capacity();
        if capacity == 0 {
            warn!(page = %page, columns, rows, max_items, "stream: grid has no capacity");
            return ctx.cancel("").await;
        }
        if urls.len() > capacity {
            debug!(page = %page, requested = urls.len(), capacity, "stream: truncating URLs to grid capacity");
            urls.truncate(capacity);
        }

        let Some(target) = ctx.manager().page(&page) else {
            error!(page = %page, "stream: target page is not registered");
            return ctx.cancel("").await;
        };

        let Context { manager, event, session } = ctx;
        let mut streaming = StreamingGuard::set(&mut *session);

        let total = urls.len();
        info!(page = %page, total, "stream: started");
        let collected: SharedSlots = Arc::new(Mutex::new(Collected::new(total)));
        self.render(manager, event, &mut *streaming, target, layout, &collected, LOADING_STATUS)
            .await;

        // PHASE: FAN OUT
        let (result_tx, mut result_rx) = mpsc::channel::<DownloadResult>(total);
        let (done_tx, mut done_rx) = oneshot::channel::<()>();
        let mut tasks = JoinSet::new();

        let policy = self.config.retry_policy();
        for (index, url) in urls.into_iter().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let result_tx = result_tx.clone();
            tasks.spawn(async move {
                let bytes = fetch_with_retry(fetcher.as_ref(), &url, policy).await;
                // EDGE: the receiver is gone only after the deadline aborted us.
                let _ = result_tx.send(DownloadResult { index, bytes }).await;
            });
        }
        drop(result_tx);

        // PHASE: COLLECT
        let slots = Arc::clone(&collected);
        tasks.spawn(async move {
            while let Some(result) = result_rx.recv().await {
                let finished = {
                    let mut guard = slots.lock().unwrap_or_else(PoisonError::into_inner);
                    guard.record(result);
                    guard.received >= guard.total()
                };
                if finished {
                    let _ = done_tx.send(());
                    return;
                }
            }
        });

        // PHASE: PROGRESS
        let deadline = tokio::time::sleep_until(started + self.config.deadline);
        tokio::pin!(deadline);
        let mut ticker = tokio::time::interval_at(Instant::now() + self.config.tick, self.config.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut phase = StreamPhase::Loading;
        while !matches!(phase, StreamPhase::Done | StreamPhase::TimedOut) {
            tokio::select! {
                biased;
                signal = &mut done_rx => {
                    if signal.is_err() {
                        warn!(page = %page, "stream: collector ended without signalling");
                    }
                    phase = StreamPhase::Done;
                }
                () = &mut deadline => {
                    phase = StreamPhase::TimedOut;
                }
                _ = ticker.tick() => {
                    phase = StreamPhase::Updating;
                    let (_, received, failed, _) = snapshot(&collected);
                    let status = format!("{LOADING_STATUS} {received}/{total} ({failed} failed)");
                    self.render(manager, event, &mut *streaming, target, layout, &collected, &status)
                        .await;
                }
            }
        }

        // PHASE: JOIN
        if phase == StreamPhase::TimedOut {
            tasks.shutdown().await;
        } else {
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    warn!(error = %e, "stream: task failed");
                }
            }
        }
        drop(streaming);

        // PHASE: FINAL RENDER
        let (slots, received, failed, _) = snapshot(&collected);
        let status = match phase {
            StreamPhase::TimedOut => {
                let loaded = received - failed;
                format!("Image loading timed out ({loaded}/{total} loaded, {failed} failed)")
            }
            _ => format!("Images loaded ({failed} failed)"),
        };
        let elapsed_ms = started.elapsed().as_millis();
        info!(page = %page, ?phase, received, failed, elapsed_ms, "stream: finished");

        let files = match compose(&slots, layout, &self.placeholder) {
            Ok(png) => {
                if phase == StreamPhase::Done {
                    if let Some(hook) = on_success {
                        hook(&mut *session, &png);
                    }
                }
                vec![Attachment::new(GRID_FILENAME, png)]
            }
            Err(e) => {
                error!(error = %e, page = %page, "stream: final merge failed");
                Vec::new()
            }
        };

        Context::new(manager, event, session)
            .respond_with_files(&status, files)
            .await
    }

    /// One merge-and-render pass. A merge failure skips the pass.
    #[allow(clippy::too_many_arguments)]
    async fn render(
        &self,
        manager: &Manager,
        event: &Interaction,
        session: &mut Session,
        page: &Page,
        layout: GridLayout,
        collected: &SharedSlots,
        status: &str,
    ) {
        let (slots, ..) = snapshot(collected);
        match compose(&slots, layout, &self.placeholder) {
            Ok(png) => {
                manager
                    .display(event, session, page, status, vec![Attachment::new(GRID_FILENAME, png)])
                    .await;
            }
            Err(e) => warn!(error = %e, page = page.name(), "stream: merge failed; skipping render"),
        }
    }
}

#[cfg(test)]
#[path = "stream_test.rs"]
mod tests;
