//! The annotation engine for one paragraphs component
//!
//! Owns the row list, the regions created over it, playback sync and
//! filter state. Every mutation goes through its methods; data and
//! network problems land in [`AnnotationEngine::errors`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use paralabel::{AnnotationEngine, EngineFlags, HttpRowFetcher, ParagraphsConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ParagraphsConfig::new("$dialogue");
//!     let fetcher = Arc::new(HttpRowFetcher::new()?);
//!     let mut engine = AnnotationEngine::new(&config, EngineFlags::default(), fetcher);
//!
//!     let task = serde_json::json!({"dialogue": [{"author": "A", "text": "hello"}]});
//!     engine.set_value(&task).await;
//!     println!("{} rows, version {}", engine.rows().len(), engine.version());
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use crate::config::{EngineFlags, ParagraphsConfig, ResolvedConfig};
use crate::data::{
    index_at_time, resolve_reference, CompletedLoad, LoadOutcome, RowFetcher, RowRecord, ValueLoader,
};
use crate::error::{ErrorSink, ReportedError};
use crate::filter::{distinct_authors, FilterState};
use crate::region::{LabelControl, Region, RegionFactory, ResultStore, SelectionRange};
use crate::sync::{FrameId, PlaybackClock, PlaybackWindow, SyncClock, SyncEvent};

/// Engine for one component instance
pub struct AnnotationEngine {
    config: ResolvedConfig,
    flags: EngineFlags,
    loader: Arc<ValueLoader>,
    rows: Vec<RowRecord>,
    version: u64,
    regions: Vec<Region>,
    sync: SyncClock,
    factory: RegionFactory,
    filter: FilterState,
    errors: ErrorSink,
}

impl AnnotationEngine {
    /// Create an engine with no rows loaded
    #[must_use]
    pub fn new(config: &ParagraphsConfig, flags: EngineFlags, fetcher: Arc<dyn RowFetcher>) -> Self {
        let config = config.resolved(&flags);
        Self {
            loader: Arc::new(ValueLoader::new(&config, fetcher)),
            factory: RegionFactory::new(&config.value, &config.text_key, flags.auto_annotation),
            config,
            flags,
            rows: Vec::new(),
            version: 0,
            regions: Vec::new(),
            sync: SyncClock::new(None),
            filter: FilterState::new(),
            errors: ErrorSink::new(),
        }
    }

    /// Send `play`/`pause` events to the sync peer over `tx`
    #[must_use]
    pub fn with_sync_channel(mut self, tx: UnboundedSender<SyncEvent>) -> Self {
        self.sync.set_outgoing(Some(tx));
        self
    }

    /// Attach the media clock
    #[must_use]
    pub fn with_clock(mut self, clock: Box<dyn PlaybackClock>) -> Self {
        self.sync.attach_clock(clock);
        self
    }

    // ─── Data ────────────────────────────────────────────────────────────────

    /// Load rows from task data.
    ///
    /// A successful load replaces every row and bumps [`Self::version`]
    /// once. Schema errors keep the previous rows; network errors leave an
    /// empty list. Holds the engine for the whole fetch; hosts that must
    /// keep handling playback meanwhile use [`Self::begin_load`].
    pub async fn set_value(&mut self, task: &Value) {
        let load = self.begin_load(task).await;
        self.apply_load(load);
    }

    /// Start loading `task` without borrowing the engine.
    ///
    /// The returned future can be spawned; pass its output to
    /// [`Self::apply_load`]. Loads are applied in the order the host
    /// applies them, the last one winning.
    pub fn begin_load(&self, task: &Value) -> impl Future<Output = CompletedLoad> + Send + 'static {
        let loader = Arc::clone(&self.loader);
        let task = task.clone();
        async move { loader.run(&task).await }
    }

    /// Apply a finished load: record its errors, then replace the rows if
    /// it produced any.
    pub fn apply_load(&mut self, load: CompletedLoad) {
        self.errors.append(load.errors);
        match load.outcome {
            LoadOutcome::Replace(rows) => {
                self.rows = rows;
                self.version += 1;
                info!(version = self.version, rows = self.rows.len(), "rows replaced");
            }
            LoadOutcome::Keep => {}
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[RowRecord] {
        &self.rows
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Option<&RowRecord> {
        self.rows.get(index)
    }

    /// Incremented on every row replacement
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Resolved audio source, if configured and a string
    #[must_use]
    pub fn audio_url(&self, task: &Value) -> Option<String> {
        let reference = self.config.audio_url.as_deref()?;
        match resolve_reference(reference, task) {
            Value::String(url) if !url.is_empty() => Some(url),
            _ => None,
        }
    }

    #[must_use]
    pub fn errors(&self) -> &[ReportedError] {
        self.errors.errors()
    }

    pub fn take_errors(&mut self) -> Vec<ReportedError> {
        self.errors.take()
    }

    /// Row active at `time`
    #[must_use]
    pub fn region_at(&self, time: f64) -> Option<usize> {
        index_at_time(&self.rows, time)
    }

    // ─── Playback ────────────────────────────────────────────────────────────

    pub fn play(&mut self, index: usize) {
        self.sync.play(&self.rows, index);
    }

    pub fn stop(&mut self, forced: bool) {
        self.sync.stop(forced);
    }

    /// Seek the clock; stops if the new position is past the boundary
    pub fn seek(&mut self, time: f64) {
        self.sync.handle_sync(&self.rows, SyncEvent::Seek { time });
    }

    /// Change the playback rate and recompute the playing window
    pub fn speed(&mut self, speed: f64) {
        self.sync.handle_sync(&self.rows, SyncEvent::Speed { speed });
    }

    /// Apply an event from the sync peer
    pub fn handle_sync(&mut self, event: SyncEvent) {
        self.sync.handle_sync(&self.rows, event);
    }

    /// Called by the host once per rendered frame for a pending check
    pub fn on_frame(&mut self, id: FrameId) -> bool {
        self.sync.on_frame(id)
    }

    pub fn current_window(&mut self, index: usize) -> Option<PlaybackWindow> {
        self.sync.current_window(&self.rows, index)
    }

    #[must_use]
    pub fn playing_id(&self) -> Option<usize> {
        self.sync.playing_id()
    }

    #[must_use]
    pub fn sync(&self) -> &SyncClock {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut SyncClock {
        &mut self.sync
    }

    // ─── Regions ─────────────────────────────────────────────────────────────

    /// Create regions for the given selections with the first active control
    pub fn add_regions(
        &mut self,
        ranges: &[SelectionRange],
        controls: &[&dyn LabelControl],
        store: &mut dyn ResultStore,
    ) -> Vec<Region> {
        let created = self.factory.create_regions(ranges, &self.rows, controls, store);
        self.regions.extend(created.iter().cloned());
        created
    }

    /// Single-selection form of [`Self::add_regions`]
    #[deprecated(note = "use add_regions with a one-element slice")]
    pub fn add_region(
        &mut self,
        range: &SelectionRange,
        controls: &[&dyn LabelControl],
        store: &mut dyn ResultStore,
    ) -> Option<Region> {
        self.add_regions(std::slice::from_ref(range), controls, store)
            .into_iter()
            .next()
    }

    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Persisted values of all regions
    #[must_use]
    pub fn result_values(&self) -> Vec<Value> {
        self.regions
            .iter()
            .map(|r| r.result_value(self.config.save_text_result))
            .collect()
    }

    // ─── Filters ─────────────────────────────────────────────────────────────

    pub fn set_author_filter(&mut self, names: Vec<String>) {
        self.filter.set_author_filter(names);
    }

    pub fn set_author_search(&mut self, query: impl Into<String>) {
        self.filter.set_author_search(query);
    }

    #[must_use]
    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Whether row `index` passes the author filter
    #[must_use]
    pub fn is_visible(&self, index: usize) -> bool {
        let Some(row) = self.rows.get(index) else {
            return false;
        };
        !self.flags.author_filter || self.filter.is_visible(row, &self.config.name_key)
    }

    #[must_use]
    pub fn visible_rows(&self) -> Vec<usize> {
        (0..self.rows.len()).filter(|&i| self.is_visible(i)).collect()
    }

    /// Distinct authors in first-seen order
    #[must_use]
    pub fn authors(&self) -> Vec<String> {
        distinct_authors(&self.rows, &self.config.name_key)
    }

    /// Authors matching the current search query
    #[must_use]
    pub fn searched_authors(&self) -> Vec<String> {
        let authors = self.authors();
        self.filter
            .matching(&authors)
            .into_iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Cancel any pending frame watch and disconnect the peer
    pub fn destroy(&mut self) {
        self.sync.teardown();
    }
}
