//! Turning UI selections into regions

use tracing::{info, warn};

use super::control::{LabelControl, LabelSet};
use super::{Region, RegionId, SelectionRange};
use crate::data::RowRecord;

/// What the result system needs to materialize a region
#[derive(Debug, Clone)]
pub struct ResultRequest<'a> {
    pub range: &'a SelectionRange,
    pub labels: LabelSet,
    pub control: &'a str,
    pub owner: &'a str,
}

/// The external annotation/result system
pub trait ResultStore {
    /// Materialize a region for `request`. Not yet finalized.
    fn create_result(&mut self, request: ResultRequest<'_>) -> Region;

    /// Add the finished region to the region store
    fn finalize(&mut self, region: &Region);

    /// Notify listeners that drawing a region has finished
    fn drawing_finished(&mut self, region: &Region);
}

/// Result store that keeps regions in memory
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    regions: Vec<Region>,
    finished: usize,
}

impl MemoryResultStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finalized regions, in creation order
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Number of drawing-finished notifications seen
    #[must_use]
    pub fn finished_count(&self) -> usize {
        self.finished
    }
}

impl ResultStore for MemoryResultStore {
    fn create_result(&mut self, request: ResultRequest<'_>) -> Region {
        Region {
            id: RegionId::new(),
            row: request.range.row,
            start_offset: request.range.start_offset,
            end_offset: request.range.end_offset,
            labels: request.labels,
            control: request.control.to_string(),
            owner: request.owner.to_string(),
            text: String::new(),
            dynamic: false,
            range_handle: None,
        }
    }

    fn finalize(&mut self, region: &Region) {
        self.regions.push(region.clone());
    }

    fn drawing_finished(&mut self, _region: &Region) {
        self.finished += 1;
    }
}

/// Creates regions for one component
#[derive(Debug, Clone)]
pub struct RegionFactory {
    owner: String,
    text_key: String,
    auto_annotation: bool,
}

impl RegionFactory {
    #[must_use]
    pub fn new(owner: impl Into<String>, text_key: impl Into<String>, auto_annotation: bool) -> Self {
        Self {
            owner: owner.into(),
            text_key: text_key.into(),
            auto_annotation,
        }
    }

    /// Create one region per valid range.
    ///
    /// Returns nothing when no control is active. Ranges outside their
    /// row's text, or empty, are skipped; the others still go through.
    pub fn create_regions(
        &self,
        ranges: &[SelectionRange],
        rows: &[RowRecord],
        controls: &[&dyn LabelControl],
        store: &mut dyn ResultStore,
    ) -> Vec<Region> {
        let Some(control) = controls.iter().copied().find(|c| c.is_active()) else {
            return Vec::new();
        };

        ranges
            .iter()
            .filter(|range| self.span_fits(range, rows))
            .map(|range| self.create_one(range, control, store))
            .collect()
    }

    /// Single-range form of [`RegionFactory::create_regions`]
    #[deprecated(note = "use create_regions with a one-element slice")]
    pub fn create_region(
        &self,
        range: &SelectionRange,
        rows: &[RowRecord],
        controls: &[&dyn LabelControl],
        store: &mut dyn ResultStore,
    ) -> Option<Region> {
        self.create_regions(std::slice::from_ref(range), rows, controls, store)
            .into_iter()
            .next()
    }

    fn create_one(
        &self,
        range: &SelectionRange,
        control: &dyn LabelControl,
        store: &mut dyn ResultStore,
    ) -> Region {
        let mut region = store.create_result(ResultRequest {
            range,
            labels: LabelSet::from_control(control),
            control: control.name(),
            owner: &self.owner,
        });

        if self.auto_annotation {
            region.dynamic = true;
        }
        region.text.clone_from(&range.text);
        region.range_handle.clone_from(&range.handle);
        store.finalize(&region);
        store.drawing_finished(&region);

        info!(
            id = %region.id.0,
            row = region.row,
            labels = ?region.labels.values,
            "region created"
        );
        region
    }

    fn span_fits(&self, range: &SelectionRange, rows: &[RowRecord]) -> bool {
        let Some(row) = rows.get(range.row) else {
            warn!(row = range.row, "selection on unknown row");
            return false;
        };
        let len = row.text_len(&self.text_key);
        let fits = range.start_offset < range.end_offset && range.end_offset <= len;
        if !fits {
            warn!(
                row = range.row,
                start = range.start_offset,
                end = range.end_offset,
                len,
                "selection outside row text"
            );
        }
        fits
    }
}
