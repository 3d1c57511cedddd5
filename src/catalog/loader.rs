//! Incremental catalog loader
//!
//! Pulls tables page by page from a [`CatalogSource`] and owns the resulting
//! [`Catalog`]. Loading is split into `begin_*` (claims the single in-flight
//! slot and describes the fetch) and [`IncrementalLoader::complete`] (applies
//! the fetched page), so the fetch itself can run on a background thread while
//! the catalog is only mutated from the owning context.

use crate::catalog::source::{CatalogSource, Page};
use crate::catalog::store::{Appended, Catalog};
use crate::catalog::types::{BumpKind, Generation};
use crate::error::FetchError;
use std::fmt;
use std::sync::Arc;

/// Loader lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    /// More data may exist; nothing in flight
    Idle,
    /// A page fetch is in flight
    Loading,
    /// The backend has no more rows for the current filter
    Exhausted,
}

impl fmt::Display for LoaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoaderState::Idle => "idle",
            LoaderState::Loading => "loading",
            LoaderState::Exhausted => "exhausted",
        };
        f.write_str(s)
    }
}

/// Result of a load attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was applied and the generation bumped
    Loaded {
        appended: Appended,
        generation: Generation,
        kind: BumpKind,
        exhausted: bool,
    },
    /// Nothing left to fetch
    NoMoreData,
    /// Another fetch holds the in-flight slot
    AlreadyLoading,
    /// The fetch failed; the loader is now exhausted
    Failed(FetchError),
    /// The page belonged to a filter that has since been reset
    Discarded,
}

impl LoadOutcome {
    /// Whether new data became visible
    pub fn loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }

    pub fn tables_loaded(&self) -> usize {
        match self {
            LoadOutcome::Loaded { appended, .. } => appended.table_count(),
            _ => 0,
        }
    }
}

/// Description of a fetch to run against the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub filter: Option<String>,
    pub limit: usize,
    pub offset: usize,
    pub initial: bool,
    epoch: u64,
}

impl PageRequest {
    /// Run the fetch, plus the count estimate when a full first page comes
    /// back. Safe to call off the owning thread.
    pub fn fetch(&self, source: &dyn CatalogSource) -> Result<FetchedPage, FetchError> {
        let page = source.fetch(self.filter.as_deref(), self.limit, self.offset)?;
        let estimate = if self.initial && page.tables.len() >= self.limit {
            source.count_estimate(self.filter.as_deref())
        } else {
            None
        };
        Ok(FetchedPage { page, estimate })
    }
}

/// What a [`PageRequest`] brought back from the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub page: Page,
    /// Backend's total table estimate, only asked for on a full first page
    pub estimate: Option<usize>,
}

/// Snapshot of loader progress for status lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderStats {
    pub tables: usize,
    pub columns: usize,
    pub estimated_total: Option<usize>,
    pub generation: Generation,
    pub state: LoaderState,
}

impl LoaderStats {
    pub fn message(&self) -> String {
        match (self.state, self.estimated_total) {
            (LoaderState::Exhausted, _) => format!("{} tables loaded", self.tables),
            (_, Some(total)) if total > self.tables => {
                format!("Loaded {} of ~{} tables", self.tables, total)
            }
            _ => format!("Loaded {} tables", self.tables),
        }
    }
}

pub struct IncrementalLoader {
    source: Arc<dyn CatalogSource>,
    filter: Option<String>,
    catalog: Catalog,
    generation: Generation,
    last_bump: Option<BumpKind>,
    state: LoaderState,
    /// Epoch of the fetch holding the in-flight slot
    in_flight: Option<u64>,
    /// Bumped by `reset`; pages from older epochs are dropped
    epoch: u64,
    needs_initial: bool,
    estimated_total: Option<usize>,
    /// Table rows the source has returned for the current filter, duplicates
    /// included. This is the source's offset, not the catalog size.
    rows_fetched: usize,
}

impl IncrementalLoader {
    pub fn new(source: Arc<dyn CatalogSource>, filter: Option<String>) -> Self {
        Self {
            source,
            filter,
            catalog: Catalog::new(),
            generation: Generation::default(),
            last_bump: None,
            state: LoaderState::Idle,
            in_flight: None,
            epoch: 0,
            needs_initial: true,
            estimated_total: None,
            rows_fetched: 0,
        }
    }

    pub fn source(&self) -> Arc<dyn CatalogSource> {
        Arc::clone(&self.source)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Kind of the most recent generation bump
    pub fn last_bump(&self) -> Option<BumpKind> {
        self.last_bump
    }

    pub fn state(&self) -> LoaderState {
        self.state
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == LoaderState::Exhausted
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// True until the first page for the current filter has been applied
    pub fn needs_initial(&self) -> bool {
        self.needs_initial
    }

    pub fn stats(&self) -> LoaderStats {
        LoaderStats {
            tables: self.catalog.table_count(),
            columns: self.catalog.column_count(),
            estimated_total: self.estimated_total,
            generation: self.generation,
            state: self.state,
        }
    }

    /// Claim the in-flight slot for the first page
    pub fn begin_initial(&mut self, page_size: usize) -> Result<PageRequest, LoadOutcome> {
        if self.in_flight.is_some() {
            return Err(LoadOutcome::AlreadyLoading);
        }
        Ok(self.claim(page_size, 0, true))
    }

    /// Claim the in-flight slot for the next page
    pub fn begin_more(&mut self, page_size: usize) -> Result<PageRequest, LoadOutcome> {
        if self.in_flight.is_some() {
            return Err(LoadOutcome::AlreadyLoading);
        }
        if self.needs_initial {
            return Ok(self.claim(page_size, 0, true));
        }
        if self.state == LoaderState::Exhausted {
            return Err(LoadOutcome::NoMoreData);
        }
        Ok(self.claim(page_size, self.rows_fetched, false))
    }

    fn claim(&mut self, page_size: usize, offset: usize, initial: bool) -> PageRequest {
        self.in_flight = Some(self.epoch);
        self.state = LoaderState::Loading;
        PageRequest {
            filter: self.filter.clone(),
            limit: page_size.max(1),
            offset,
            initial,
            epoch: self.epoch,
        }
    }

    /// Apply the result of a fetch started by `begin_*`
    pub fn complete(
        &mut self,
        request: PageRequest,
        result: Result<FetchedPage, FetchError>,
    ) -> LoadOutcome {
        if self.in_flight == Some(request.epoch) {
            self.in_flight = None;
        }

        if request.epoch != self.epoch {
            tracing::debug!(
                stale_epoch = request.epoch,
                epoch = self.epoch,
                "dropping page fetched for a reset filter"
            );
            return LoadOutcome::Discarded;
        }

        let FetchedPage { page, estimate } = match result {
            Ok(fetched) => fetched,
            Err(error) => {
                tracing::warn!(%error, offset = request.offset, "catalog page fetch failed");
                self.state = LoaderState::Exhausted;
                self.needs_initial = false;
                return LoadOutcome::Failed(error);
            }
        };

        let rows = page.tables.len();
        let short_page = rows < request.limit;

        if !request.initial && page.tables.is_empty() {
            self.state = LoaderState::Exhausted;
            self.estimated_total = Some(self.catalog.table_count());
            return LoadOutcome::NoMoreData;
        }

        let kind = if request.initial {
            if !self.catalog.is_empty() {
                self.catalog.clear();
            }
            BumpKind::Reset
        } else {
            BumpKind::Additive
        };
        if request.initial {
            self.needs_initial = false;
            self.rows_fetched = rows;
        } else {
            self.rows_fetched += rows;
        }

        let appended = self.catalog.append(page.tables, page.columns);
        self.generation = self.generation.next();
        self.last_bump = Some(kind);

        if short_page {
            self.state = LoaderState::Exhausted;
            self.estimated_total = Some(self.catalog.table_count());
        } else {
            self.state = LoaderState::Idle;
            if request.initial {
                let so_far = self.catalog.table_count();
                self.estimated_total = Some(estimate.unwrap_or(so_far * 2));
            }
        }

        tracing::info!(
            generation = %self.generation,
            tables = appended.table_count(),
            columns = appended.column_count(),
            exhausted = short_page,
            "catalog page applied"
        );

        LoadOutcome::Loaded {
            appended,
            generation: self.generation,
            kind,
            exhausted: short_page,
        }
    }

    /// Fetch the first page on the calling thread
    pub fn load_initial(&mut self, page_size: usize) -> LoadOutcome {
        match self.begin_initial(page_size) {
            Ok(request) => {
                let result = request.fetch(self.source.as_ref());
                self.complete(request, result)
            }
            Err(outcome) => outcome,
        }
    }

    /// Fetch the next page on the calling thread
    pub fn load_more(&mut self, page_size: usize) -> LoadOutcome {
        match self.begin_more(page_size) {
            Ok(request) => {
                let result = request.fetch(self.source.as_ref());
                self.complete(request, result)
            }
            Err(outcome) => outcome,
        }
    }

    /// Discard everything and switch to a new schema filter
    pub fn reset(&mut self, filter: Option<String>) {
        self.filter = filter;
        self.catalog.clear();
        self.epoch += 1;
        self.generation = self.generation.next();
        self.last_bump = Some(BumpKind::Reset);
        self.needs_initial = true;
        self.estimated_total = None;
        self.rows_fetched = 0;
        // A fetch for the old filter may still be running; it keeps the slot
        // until it completes and is then discarded.
        self.state = if self.in_flight.is_some() {
            LoaderState::Loading
        } else {
            LoaderState::Idle
        };
        tracing::info!(generation = %self.generation, filter = ?self.filter, "catalog reset");
    }
}
