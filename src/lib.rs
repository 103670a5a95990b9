//! `paralabel` - Region and playback engine for labeling dialogue paragraphs
//!
//! # Features
//!
//! - **Row loading**: inline task JSON or remote URL, validated against configurable keys
//! - **Time lookup**: find the row active at a playback position
//! - **Playback sync**: per-row windows, toggle play/pause, frame-driven auto stop,
//!   `play`/`pause`/`seek`/`speed` events with a sync peer
//! - **Regions**: turn text selections into labeled regions
//! - **Author filter**: restrict visible rows by author
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use paralabel::{AnnotationEngine, EngineFlags, HttpRowFetcher, ParagraphsConfig, SimulatedClock};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ParagraphsConfig::new("$dialogue");
//!     let mut engine = AnnotationEngine::new(&config, EngineFlags::default(), Arc::new(HttpRowFetcher::new()?))
//!         .with_clock(Box::new(SimulatedClock::new(Some(30.0))));
//!
//!     let task = serde_json::json!({"dialogue": [{"author": "A", "text": "hi", "start": 0, "end": 2}]});
//!     engine.set_value(&task).await;
//!     engine.play(0);
//!     println!("playing: {:?}", engine.playing_id());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod filter;
pub mod region;
pub mod sync;

pub use config::{EngineFlags, Layout, ParagraphsConfig, ResolvedConfig, SaveTextResult, ValueType};
pub use data::{index_at_time, CompletedLoad, HttpRowFetcher, RowFetcher, RowRecord, ValueLoader};
pub use engine::AnnotationEngine;
pub use error::{ErrorKind, ErrorSink, LoadError, ReportedError};
pub use filter::FilterState;
pub use region::{
    LabelControl, LabelSet, MemoryResultStore, Region, RegionFactory, RegionId, ResultStore,
    SelectedLabels, SelectionRange,
};
pub use sync::{FrameId, PlaybackClock, PlaybackWindow, SimulatedClock, SyncClock, SyncEvent};

/// Version of paralabel
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
