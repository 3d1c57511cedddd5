//! Search coordinator
//!
//! Ties the loader, index, engine and caches together behind the callbacks
//! a UI drives: query edits, mode toggles, load-more requests and scrolling.
//!
//! The coordinator is poll-driven. The owning thread calls
//! [`SearchCoordinator::tick`] from its event loop; page fetches run on
//! background threads and hand their pages back over a channel, so the
//! catalog, index and caches are only ever touched from the owning thread.
//!
//! ```text
//! on_query_changed ─▶ Debouncing ─▶ Searching ─┬─▶ Idle
//!                                              └─▶ Streaming (load more, re-run, repeat)
//! ```

pub mod cancel;
pub mod debouncer;

pub use cancel::{CancellationToken, QueryToken};
pub use debouncer::InputDebouncer;

use crate::cache::render_cache::{RenderCache, RenderedView, DEFAULT_RENDER_CAPACITY};
use crate::cache::result_cache::ResultCache;
use crate::catalog::loader::{
    FetchedPage, IncrementalLoader, LoadOutcome, LoaderState, PageRequest,
};
use crate::catalog::store::Catalog;
use crate::catalog::types::{BumpKind, SearchMode};
use crate::error::{FetchError, SearchError};
use crate::index::catalog_index::CatalogIndex;
use crate::query::executor::{SearchEngine, SearchOptions};
use crate::query::results::ResultSet;
use crate::utils::tokenizer::normalize_query;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Receives everything the coordinator publishes
pub trait SearchListener {
    /// A result set for the active query and mode
    fn results_published(&mut self, results: &ResultSet);

    /// Loader state or status message changed
    fn status_changed(&mut self, state: LoaderState, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    /// Waiting for input to settle
    Debouncing,
    Searching,
    /// Results were few; more catalog pages are being pulled for this query
    Streaming,
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub debounce: Duration,
    pub page_size: usize,
    /// Below this many results, more pages are loaded in the background
    pub small_result_threshold: usize,
    /// Rows from the end of the list at which scrolling prefetches
    pub prefetch_margin: usize,
    pub render_capacity: usize,
    pub search: SearchOptions,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(200),
            page_size: 100,
            small_result_threshold: 50,
            prefetch_margin: 20,
            render_capacity: DEFAULT_RENDER_CAPACITY,
            search: SearchOptions::default(),
        }
    }
}

/// Background "load more for this query" work.
///
/// Its cancellation token travels with every fetch started on the task's
/// behalf and is checked before the task's query is re-run.
struct StreamTask {
    token: QueryToken,
    query: String,
    mode: SearchMode,
    cancel: CancellationToken,
}

struct FetchReply {
    request: PageRequest,
    result: Result<FetchedPage, FetchError>,
    /// Token of the streaming search that asked for the page, if any
    cancel: Option<CancellationToken>,
}

pub struct SearchCoordinator<L: SearchListener> {
    loader: IncrementalLoader,
    index: CatalogIndex,
    engine: SearchEngine,
    result_cache: ResultCache,
    render_cache: RenderCache,
    debouncer: InputDebouncer,
    config: CoordinatorConfig,
    listener: L,
    query: String,
    mode: SearchMode,
    token: QueryToken,
    phase: SearchPhase,
    stream: Option<StreamTask>,
    fetch_tx: Sender<FetchReply>,
    fetch_rx: Receiver<FetchReply>,
    fetches_in_flight: usize,
    published: Option<Arc<ResultSet>>,
    status: Option<(LoaderState, String)>,
}

impl<L: SearchListener> SearchCoordinator<L> {
    pub fn new(loader: IncrementalLoader, config: CoordinatorConfig, listener: L) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::channel();

        let mut index = CatalogIndex::new();
        index.rebuild(loader.catalog(), loader.generation());
        let mut result_cache = ResultCache::new();
        result_cache.set_generation(loader.generation());

        Self {
            index,
            engine: SearchEngine::new(config.search.clone()),
            result_cache,
            render_cache: RenderCache::new(config.render_capacity),
            debouncer: InputDebouncer::new(config.debounce),
            loader,
            config,
            listener,
            query: String::new(),
            mode: SearchMode::default(),
            token: QueryToken::default(),
            phase: SearchPhase::Idle,
            stream: None,
            fetch_tx,
            fetch_rx,
            fetches_in_flight: 0,
            published: None,
            status: None,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn token(&self) -> QueryToken {
        self.token
    }

    pub fn loader(&self) -> &IncrementalLoader {
        &self.loader
    }

    pub fn catalog(&self) -> &Catalog {
        self.loader.catalog()
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    pub fn result_cache(&self) -> &ResultCache {
        &self.result_cache
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// Last result set handed to the listener
    pub fn published(&self) -> Option<&Arc<ResultSet>> {
        self.published.as_ref()
    }

    /// Display rows for the published result set, if it matches the catalog
    pub fn rendered(&mut self) -> Option<Arc<RenderedView>> {
        let set = self.published.as_ref()?;
        if set.generation != self.loader.generation() {
            return None;
        }
        Some(self.render_cache.get_or_render(self.loader.catalog(), set))
    }

    /// Kick off the first page fetch
    pub fn start(&mut self) {
        self.start_fetch();
    }

    pub fn on_query_changed(&mut self, text: &str) {
        if text == self.query {
            return;
        }
        self.query = text.to_string();
        self.supersede();

        if normalize_query(text).is_empty() {
            self.debouncer.clear();
            self.phase = SearchPhase::Idle;
            let empty = ResultSet::empty(self.mode, "", self.loader.generation());
            self.publish(self.token, Arc::new(empty));
            return;
        }

        self.debouncer.trigger();
        self.phase = SearchPhase::Debouncing;
    }

    /// Switch between table and column search and re-run the query now
    pub fn on_mode_toggled(&mut self) {
        self.mode = self.mode.toggled();
        self.supersede();
        self.debouncer.clear();
        self.run_search();
    }

    /// Explicit request for the next page. Returns true if a fetch started.
    pub fn on_load_more_requested(&mut self) -> bool {
        self.start_fetch()
    }

    /// Prefetch when the view scrolls near the end of the published rows
    pub fn on_scroll(&mut self, last_visible_row: usize) -> bool {
        let Some(set) = &self.published else {
            return false;
        };
        let remaining = set.len().saturating_sub(last_visible_row + 1);
        if remaining > self.config.prefetch_margin || self.loader.is_exhausted() {
            return false;
        }
        tracing::debug!(last_visible_row, remaining, "scroll prefetch");
        self.start_fetch()
    }

    /// Drop the catalog and reload it under a new schema filter
    pub fn set_filter(&mut self, filter: Option<String>) {
        self.supersede();
        self.loader.reset(filter);
        self.index.clear();
        self.result_cache.invalidate_all();
        self.result_cache.set_generation(self.loader.generation());
        self.render_cache.clear();
        self.published = None;
        self.report_status(None);
        self.start_fetch();

        if !normalize_query(&self.query).is_empty() {
            self.debouncer.trigger();
            self.phase = SearchPhase::Debouncing;
        }
    }

    /// Run the pending search without waiting out the debounce window
    pub fn search_now(&mut self) {
        if self.debouncer.flush() {
            self.run_search();
        }
    }

    /// Apply finished fetches and fire the debounced search if due
    pub fn tick(&mut self) {
        self.poll_fetches();
        if self.debouncer.is_ready() {
            self.debouncer.flush();
            self.run_search();
        }
    }

    /// Whether a debounced search or a fetch is outstanding
    pub fn is_busy(&self) -> bool {
        self.debouncer.has_pending() || self.fetches_in_flight > 0
    }

    /// How long the event loop may sleep before the next tick matters
    pub fn time_until_ready(&self) -> Option<Duration> {
        self.debouncer.time_until_ready()
    }

    /// Tick until nothing is outstanding. Returns false on timeout.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            self.tick();
            if !self.is_busy() {
                return true;
            }
            if start.elapsed() >= timeout {
                return false;
            }
            let nap = self
                .time_until_ready()
                .unwrap_or(Duration::from_millis(5))
                .min(Duration::from_millis(5));
            thread::sleep(nap);
        }
    }

    /// Invalidate the current query token and cancel its background search.
    /// The task stays in place until the next refresh observes the flag.
    fn supersede(&mut self) {
        self.token = self.token.next();
        if let Some(task) = &self.stream {
            if !task.cancel.is_cancelled() {
                task.cancel.cancel();
                tracing::debug!(query = %task.query, "cancelled background search");
            }
        }
    }

    fn run_search(&mut self) {
        self.phase = SearchPhase::Searching;
        let token = self.token;

        let set = match self.result_cache.get(self.mode, &self.query) {
            Some(set) => {
                tracing::debug!(query = %set.query, mode = %self.mode, "result cache hit");
                set
            }
            None => {
                let set = Arc::new(self.execute());
                tracing::debug!(
                    query = %set.query,
                    mode = %self.mode,
                    results = set.len(),
                    generation = %set.generation,
                    "searched"
                );
                self.result_cache.put(self.mode, &self.query, Arc::clone(&set));
                set
            }
        };
        self.publish(token, Arc::clone(&set));

        let wants_more = !set.query.is_empty()
            && set.len() < self.config.small_result_threshold
            && !self.loader.is_exhausted();
        if !wants_more {
            self.stream = None;
            self.phase = SearchPhase::Idle;
            return;
        }

        if self
            .stream
            .as_ref()
            .is_none_or(|task| task.token != token || task.cancel.is_cancelled())
        {
            self.stream = Some(StreamTask {
                token,
                query: self.query.clone(),
                mode: self.mode,
                cancel: CancellationToken::new(),
            });
        }
        self.phase = SearchPhase::Streaming;
        // A fetch already in flight is reused; its completion re-runs the query
        self.start_fetch();
    }

    fn execute(&mut self) -> ResultSet {
        let generation = self.loader.generation();
        let catalog = self.loader.catalog();
        match self
            .engine
            .search(catalog, &self.index, generation, self.mode, &self.query)
        {
            Ok(set) => set,
            Err(SearchError::IndexCorruption { reason }) => {
                tracing::warn!(%reason, "index out of step with catalog, rebuilding");
                self.index.rebuild(catalog, generation);
                self.engine
                    .search(catalog, &self.index, generation, self.mode, &self.query)
                    .unwrap_or_else(|error| {
                        tracing::error!(%error, "search failed after index rebuild");
                        ResultSet::empty(self.mode, normalize_query(&self.query), generation)
                    })
            }
            Err(error) => {
                tracing::error!(%error, "search failed");
                ResultSet::empty(self.mode, normalize_query(&self.query), generation)
            }
        }
    }

    fn publish(&mut self, token: QueryToken, set: Arc<ResultSet>) {
        if token != self.token {
            tracing::debug!(query = %set.query, "dropping results for superseded query");
            return;
        }
        self.listener.results_published(&set);
        self.published = Some(set);
    }

    fn start_fetch(&mut self) -> bool {
        if self.fetches_in_flight > 0 {
            return false;
        }
        match self.loader.begin_more(self.config.page_size) {
            Ok(request) => {
                self.spawn_fetch(request);
                true
            }
            Err(outcome) => {
                self.apply_outcome(outcome);
                false
            }
        }
    }

    fn spawn_fetch(&mut self, request: PageRequest) {
        let source = self.loader.source();
        let tx = self.fetch_tx.clone();
        let cancel = self
            .stream
            .as_ref()
            .filter(|task| !task.cancel.is_cancelled())
            .map(|task| task.cancel.clone());
        self.fetches_in_flight += 1;
        self.report_status(None);

        tracing::debug!(offset = request.offset, limit = request.limit, "fetching catalog page");
        thread::spawn(move || {
            let result = request.fetch(source.as_ref());
            // The page is kept either way; only the re-run is skipped
            if cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                tracing::debug!(offset = request.offset, "page arrived for a cancelled search");
            }
            let _ = tx.send(FetchReply {
                request,
                result,
                cancel,
            });
        });
    }

    fn poll_fetches(&mut self) {
        while let Ok(reply) = self.fetch_rx.try_recv() {
            self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);
            let outcome = self.loader.complete(reply.request, reply.result);
            if reply.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                tracing::debug!("applying page fetched for a cancelled search");
            }
            self.apply_outcome(outcome);
        }
    }

    fn apply_outcome(&mut self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Loaded {
                appended,
                generation,
                kind,
                ..
            } => {
                match kind {
                    BumpKind::Reset => self.index.rebuild(self.loader.catalog(), generation),
                    BumpKind::Additive => {
                        self.index
                            .index_appended(self.loader.catalog(), &appended, generation)
                    }
                }
                self.result_cache.set_generation(generation);
                self.report_status(None);
                self.refresh_active_query();
            }
            LoadOutcome::NoMoreData => {
                self.report_status(None);
                self.finish_streaming();
            }
            LoadOutcome::AlreadyLoading => {}
            LoadOutcome::Failed(error) => {
                self.report_status(Some(format!("Catalog load failed: {}", error)));
                self.finish_streaming();
            }
            LoadOutcome::Discarded => {
                if self.loader.needs_initial() {
                    self.start_fetch();
                }
            }
        }
    }

    fn finish_streaming(&mut self) {
        self.stream = None;
        if self.phase == SearchPhase::Streaming {
            self.phase = SearchPhase::Idle;
        }
    }

    /// Re-run the active query against newly loaded data, but only if its
    /// results are what the listener is currently showing
    fn refresh_active_query(&mut self) {
        if let Some(task) = &self.stream {
            let current = !task.cancel.is_cancelled()
                && task.token == self.token
                && task.query == self.query
                && task.mode == self.mode;
            if !current {
                tracing::debug!(query = %task.query, "dropping superseded background search");
                self.stream = None;
            }
        }

        if self.phase == SearchPhase::Debouncing {
            return;
        }
        let shown = self.published.as_ref().is_some_and(|set| {
            set.mode == self.mode && set.query == normalize_query(&self.query)
        });
        if shown && !normalize_query(&self.query).is_empty() {
            self.run_search();
        }
    }

    fn report_status(&mut self, message: Option<String>) {
        let state = self.loader.state();
        let message = message.unwrap_or_else(|| self.loader.stats().message());
        let changed = self
            .status
            .as_ref()
            .is_none_or(|(s, m)| *s != state || *m != message);
        if changed {
            tracing::debug!(%state, %message, "status");
            self.listener.status_changed(state, &message);
            self.status = Some((state, message));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::source::MemorySource;
    use crate::catalog::types::TableEntity;

    #[derive(Default)]
    struct Recorder {
        published: Vec<(String, usize)>,
        states: Vec<LoaderState>,
    }

    impl SearchListener for Recorder {
        fn results_published(&mut self, results: &ResultSet) {
            self.published.push((results.query.clone(), results.len()));
        }

        fn status_changed(&mut self, state: LoaderState, _message: &str) {
            self.states.push(state);
        }
    }

    fn coordinator(tables: &[&str], page_size: usize) -> SearchCoordinator<Recorder> {
        let tables = tables.iter().map(|n| TableEntity::new("TEST", *n)).collect();
        let source = Arc::new(MemorySource::new(tables, Vec::new()));
        let loader = IncrementalLoader::new(source, None);
        let config = CoordinatorConfig {
            debounce: Duration::from_millis(5),
            page_size,
            ..CoordinatorConfig::default()
        };
        SearchCoordinator::new(loader, config, Recorder::default())
    }

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_debounced_search_publishes_once() {
        let mut c = coordinator(&["USERS", "ORDERS", "PRODUCTS"], 10);
        c.start();
        assert!(c.run_until_idle(WAIT));

        c.on_query_changed("o");
        c.on_query_changed("or");
        c.on_query_changed("ord");
        assert_eq!(c.phase(), SearchPhase::Debouncing);
        assert!(c.run_until_idle(WAIT));

        assert_eq!(c.listener().published, vec![("ord".to_string(), 1)]);
        assert_eq!(c.phase(), SearchPhase::Idle);
    }

    #[test]
    fn test_mode_toggle_searches_immediately() {
        let mut c = coordinator(&["USERS"], 10);
        c.start();
        assert!(c.run_until_idle(WAIT));
        c.on_query_changed("users");
        c.search_now();
        c.on_mode_toggled();

        assert_eq!(c.mode(), SearchMode::Columns);
        assert_eq!(c.published().unwrap().mode, SearchMode::Columns);
    }

    #[test]
    fn test_small_results_stream_until_exhausted() {
        let names: Vec<String> = (0..9).map(|i| format!("T{}", i)).collect();
        let mut refs: Vec<&str> = names.iter().map(String::as_str).collect();
        refs.push("ORDERS");
        let mut c = coordinator(&refs, 3);
        c.start();
        assert!(c.run_until_idle(WAIT));
        assert_eq!(c.catalog().table_count(), 3);

        c.on_query_changed("orders");
        c.search_now();
        assert!(c.run_until_idle(WAIT));

        assert!(c.loader().is_exhausted());
        let last = c.published().unwrap();
        assert_eq!(last.keys().collect::<Vec<_>>(), vec!["TEST.ORDERS"]);
        assert_eq!(c.phase(), SearchPhase::Idle);
        // the query was re-run as pages arrived
        assert!(c.listener().published.len() > 1);
        assert_eq!(c.listener().states.last(), Some(&LoaderState::Exhausted));
    }

    #[test]
    fn test_corrupt_index_is_rebuilt_before_publishing() {
        let mut c = coordinator(&["USERS", "ORDERS", "PRODUCTS"], 10);
        c.start();
        assert!(c.run_until_idle(WAIT));

        c.index.clear();
        assert!(c.index().verify(c.catalog()).is_err());

        c.on_query_changed("ord");
        c.search_now();

        let set = c.published().unwrap();
        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["TEST.ORDERS"]);
        assert!(c.index().verify(c.catalog()).is_ok());
    }

    #[test]
    fn test_superseding_cancels_background_search() {
        let names: Vec<String> = (0..30).map(|i| format!("T{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut c = coordinator(&refs, 10);
        c.start();
        assert!(c.run_until_idle(WAIT));

        c.on_query_changed("orders");
        c.search_now();
        assert_eq!(c.phase(), SearchPhase::Streaming);
        let cancel = c.stream.as_ref().unwrap().cancel.clone();
        assert!(!cancel.is_cancelled());

        c.on_query_changed("t1");
        assert!(cancel.is_cancelled());

        assert!(c.run_until_idle(WAIT));
        assert!(c.stream.as_ref().is_none_or(|task| !task.cancel.is_cancelled()));
        assert_eq!(c.published().unwrap().query, "t1");
    }

    #[test]
    fn test_blank_query_publishes_empty() {
        let mut c = coordinator(&["USERS"], 10);
        c.on_query_changed("users");
        c.on_query_changed("  ");
        assert_eq!(c.phase(), SearchPhase::Idle);
        assert!(c.published().unwrap().is_empty());
    }

    #[test]
    fn test_rendered_matches_published() {
        let mut c = coordinator(&["USERS", "ORDERS"], 10);
        c.start();
        assert!(c.run_until_idle(WAIT));
        c.on_query_changed("users");
        c.search_now();

        let view = c.rendered().unwrap();
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].label, "TEST.USERS");
    }
}
