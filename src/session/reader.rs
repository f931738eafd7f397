//! Reader session driver
//!
//! Glues the resource cache, the analysis cache and the panel navigator to a
//! carousel. The session runs on the caller's thread of control; only page
//! analysis leaves it, on the blocking pool, and comes back through a
//! channel to be applied by [`ReaderSession::next_analysis`].

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::archive::{ArchiveResourceCache, ArchiveResult, ResourceHandle, ZipExtractor};
use crate::config::Config;
use crate::navigation::{
    focus_transform, map_key, AnalysisRequest, FocusTransform, KeyCommand, KeyEvent,
    NavigationEffect, PanelNavigator, PanelTarget, Viewport,
};
use crate::panels::{AnalysisCache, AnalysisResult, NormalizedBox, PanelDetector};

use super::carousel::{Carousel, PageSlider};
use super::settings::{ReaderSettings, SettingsResult, SettingsStore};

/// Start positions are expressed in ticks, one page per 10 000
pub const TICKS_PER_PAGE: u64 = 10_000;

const ANALYSIS_CHANNEL_CAPACITY: usize = 32;

/// Page index for a start position in ticks
pub fn start_page_from_ticks(ticks: u64) -> usize {
    (ticks / TICKS_PER_PAGE) as usize
}

/// Focus currently applied to the page image
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFocus {
    pub page: usize,
    pub panel_index: usize,
    pub panel: NormalizedBox,
    /// `None` until both the page size and the viewport are known
    pub transform: Option<FocusTransform>,
}

/// One rendered carousel slide
#[derive(Debug, Clone)]
pub struct Slide {
    pub index: usize,
    pub handle: ResourceHandle,
}

impl Slide {
    /// Slide markup referencing the page through its transient URI
    pub fn markup(&self) -> String {
        format!(
            "<div class=\"swiper-slide\"><div class=\"slider-zoom-container\">\
             <img src=\"{}\" class=\"swiper-slide-img\"></div></div>",
            html_escape::encode_double_quoted_attribute(self.handle.uri())
        )
    }
}

/// Mutable state of one reading session
#[derive(Default)]
pub struct SessionState {
    pub media_source_id: String,
    pub resources: ArchiveResourceCache,
    pub analyses: AnalysisCache,
    pub navigator: PanelNavigator,
    pub settings: ReaderSettings,
    pub viewport: Viewport,
    pub focus: Option<AppliedFocus>,
}

struct AnalysisOutcome {
    request: AnalysisRequest,
    result: AnalysisResult,
    /// False for the whole-page stand-in used after a timeout
    cacheable: bool,
}

pub struct ReaderSession<C: Carousel> {
    state: SessionState,
    carousel: C,
    detector: PanelDetector,
    config: Config,
    outcome_tx: mpsc::Sender<AnalysisOutcome>,
    outcome_rx: mpsc::Receiver<AnalysisOutcome>,
    /// Pages with an analysis task running
    in_flight: HashSet<usize>,
    /// Last stand-in result kept out of the analysis cache
    uncached: Option<(usize, Arc<AnalysisResult>)>,
    close_requested: bool,
}

impl ReaderSession<PageSlider> {
    /// Fetch and extract a CBZ, restoring the item's saved settings
    ///
    /// Fetch and extraction failures are fatal; nothing is kept alive.
    pub async fn open(
        media_source_id: &str,
        path: impl AsRef<Path>,
        store: &SettingsStore,
        config: Config,
    ) -> ArchiveResult<Self> {
        let mut resources =
            ArchiveResourceCache::with_window(config.cache.window_size(), config.cache.prune_buffer);
        resources.open_path(Arc::new(ZipExtractor), path).await?;

        let slider = PageSlider::new(resources.page_count());
        Ok(Self::new(
            media_source_id,
            resources,
            slider,
            store.get(media_source_id),
            config,
        ))
    }
}

impl<C: Carousel> ReaderSession<C> {
    pub fn new(
        media_source_id: &str,
        resources: ArchiveResourceCache,
        carousel: C,
        settings: ReaderSettings,
        config: Config,
    ) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::channel(ANALYSIS_CHANNEL_CAPACITY);

        Self {
            state: SessionState {
                media_source_id: media_source_id.to_string(),
                resources,
                navigator: PanelNavigator::new(carousel.active_index(), settings.direction),
                settings,
                ..Default::default()
            },
            carousel,
            detector: PanelDetector::new(&config.analysis),
            config,
            outcome_tx,
            outcome_rx,
            in_flight: HashSet::new(),
            uncached: None,
            close_requested: false,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn carousel(&self) -> &C {
        &self.carousel
    }

    pub fn settings(&self) -> ReaderSettings {
        self.state.settings
    }

    pub fn focus(&self) -> Option<&AppliedFocus> {
        self.state.focus.as_ref()
    }

    pub fn indicator(&self) -> String {
        self.state.navigator.indicator()
    }

    /// Whether the reader asked to close (Escape)
    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    /// Number of analyses still running
    pub fn pending_analyses(&self) -> usize {
        self.in_flight.len()
    }

    /// Show the start page and restore panel mode if it was left on
    ///
    /// Must run inside a Tokio runtime; page analysis is spawned onto it.
    pub fn start(&mut self, start_page: usize) {
        let last = self.carousel.page_count().saturating_sub(1);
        let page = start_page.min(last);

        self.carousel.set_pages_per_view(self.state.settings.pages_per_view);
        self.carousel.go_to(page);
        let page = self.carousel.active_index();

        tracing::info!(
            media_source_id = %self.state.media_source_id,
            page,
            pages = self.carousel.page_count(),
            direction = self.state.settings.direction.as_str(),
            panel_mode = self.state.settings.panel_mode,
            "Starting reader session"
        );

        let mut effects = self.page_changed(page);
        if self.state.settings.panel_mode {
            effects.extend(self.state.navigator.toggle(page));
        }
        self.apply(effects);
    }

    pub fn toggle_panel_mode(&mut self) {
        let page = self.carousel.active_index();
        let effects = self.state.navigator.toggle(page);
        self.state.settings.panel_mode = self.state.navigator.is_enabled();

        tracing::debug!(page, enabled = self.state.settings.panel_mode, "Toggled panel mode");
        self.apply(effects);
    }

    /// Next panel in panel mode, next page otherwise
    pub fn next(&mut self) {
        if self.state.navigator.is_enabled() {
            let effects = self.state.navigator.next();
            self.apply(effects);
        } else {
            self.apply(vec![NavigationEffect::AdvancePage]);
        }
    }

    /// Previous panel in panel mode, previous page otherwise
    pub fn prev(&mut self) {
        if self.state.navigator.is_enabled() {
            let effects = self.state.navigator.prev();
            self.apply(effects);
        } else {
            self.apply(vec![NavigationEffect::RetreatPage]);
        }
    }

    /// The carousel moved on its own (swipe, click)
    pub fn on_page_changed(&mut self, page: usize) {
        let effects = self.page_changed(page);
        self.apply(effects);
    }

    /// Switch between left-to-right and right-to-left reading
    pub fn toggle_direction(&mut self) {
        let direction = self.state.settings.direction.toggled();
        self.state.settings.direction = direction;

        tracing::debug!(direction = direction.as_str(), "Changed reading direction");

        let effects = self.state.navigator.set_direction(direction);
        self.apply(effects);
    }

    /// Switch between single and double page view
    pub fn toggle_view(&mut self) {
        self.state.settings.toggle_view();
        let pages_per_view = self.state.settings.pages_per_view;

        let page = self.carousel.active_index();
        self.carousel.set_pages_per_view(pages_per_view);
        self.carousel.go_to(page);

        tracing::debug!(pages_per_view, "Changed view density");
        self.refresh_focus();
    }

    /// Dispatch a key press; returns the command it mapped to
    pub fn handle_key(&mut self, event: &KeyEvent) -> Option<KeyCommand> {
        let command = map_key(
            event,
            self.state.navigator.is_enabled(),
            self.state.settings.direction,
        )?;

        match command {
            KeyCommand::PanelForward => self.next(),
            KeyCommand::PanelBack => self.prev(),
            KeyCommand::Close => self.close_requested = true,
        }

        Some(command)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.state.viewport = viewport;
        self.refresh_focus();
    }

    /// Slide for a page about to be shown; `None` renders a blank slide
    pub fn render_slide(&mut self, index: usize) -> Option<Slide> {
        self.state
            .resources
            .get_handle(index)
            .map(|handle| Slide { index, handle })
    }

    /// Jump to a panel of any page, moving the carousel when needed
    pub fn go_to_panel(&mut self, page: usize, target: PanelTarget) {
        let effects = self.state.navigator.go_to_panel(page, target);
        self.apply(effects);
    }

    /// Wait for the next running analysis and apply it
    ///
    /// Returns the analysed page, or `None` when nothing is running.
    pub async fn next_analysis(&mut self) -> Option<usize> {
        if self.in_flight.is_empty() {
            return None;
        }

        let AnalysisOutcome {
            request,
            result,
            cacheable,
        } = self.outcome_rx.recv().await?;
        let page = request.page;
        self.in_flight.remove(&page);

        // Cached even when stale: it is still the analysis of that page.
        // A stand-in is used for this visit only so the page is retried.
        let result = if cacheable {
            self.uncached = None;
            self.state.analyses.insert(page, Arc::new(result))
        } else {
            tracing::debug!(page, "Showing whole page, analysis will be retried");
            let result = Arc::new(result);
            self.uncached = Some((page, Arc::clone(&result)));
            result
        };

        // The page may have been left and re-entered while this ran, in
        // which case the newer request is the one still awaited
        let request = match self.state.navigator.awaiting() {
            Some(live) if live.page == page => live,
            _ => request,
        };

        let effects = self.state.navigator.complete_analysis(request, &result);
        self.apply(effects);
        Some(page)
    }

    /// Apply every running analysis
    pub async fn settle(&mut self) {
        while self.next_analysis().await.is_some() {}
    }

    /// Save settings and release every resource handle
    pub async fn stop(mut self, store: &mut SettingsStore) -> SettingsResult<()> {
        let saved = store
            .set(&self.state.media_source_id, self.state.settings)
            .await;
        self.state.resources.release();
        self.state.focus = None;

        tracing::info!(
            media_source_id = %self.state.media_source_id,
            analysed_pages = self.state.analyses.len(),
            "Stopped reader session"
        );

        saved
    }

    fn page_changed(&mut self, page: usize) -> Vec<NavigationEffect> {
        let cache = &self.config.cache;
        self.state
            .resources
            .prune_to_window(page, cache.prefetch_before, cache.prefetch_after);
        self.state.navigator.on_page_changed(page)
    }

    fn apply(&mut self, effects: Vec<NavigationEffect>) {
        let mut queue: VecDeque<NavigationEffect> = effects.into();

        while let Some(effect) = queue.pop_front() {
            match effect {
                NavigationEffect::Analyze(request) => queue.extend(self.dispatch_analysis(request)),
                NavigationEffect::Focus {
                    page,
                    panel_index,
                    panel,
                } => self.apply_focus(page, panel_index, panel),
                NavigationEffect::ClearFocus => self.state.focus = None,
                NavigationEffect::AdvancePage => match self.carousel.advance() {
                    Some(page) => queue.extend(self.page_changed(page)),
                    None => self.state.navigator.cancel_pending(),
                },
                NavigationEffect::RetreatPage => match self.carousel.retreat() {
                    Some(page) => queue.extend(self.page_changed(page)),
                    None => self.state.navigator.cancel_pending(),
                },
                NavigationEffect::GoToPage(page) => match self.carousel.go_to(page) {
                    Some(page) => queue.extend(self.page_changed(page)),
                    None => self.state.navigator.cancel_pending(),
                },
            }
        }
    }

    fn dispatch_analysis(&mut self, request: AnalysisRequest) -> Vec<NavigationEffect> {
        if let Some(result) = self.state.analyses.get(request.page) {
            return self.state.navigator.complete_analysis(request, &result);
        }

        if self.in_flight.contains(&request.page) {
            tracing::debug!(page = request.page, "Analysis already running");
            return Vec::new();
        }

        let Some(entry) = self.state.resources.page(request.page) else {
            let result = self
                .state
                .analyses
                .insert(request.page, Arc::new(AnalysisResult::fallback(0, 0)));
            return self.state.navigator.complete_analysis(request, &result);
        };

        let data = Arc::clone(&entry.bytes);
        let detector = self.detector.clone();
        let tx = self.outcome_tx.clone();
        self.in_flight.insert(request.page);

        tokio::spawn(async move {
            let outcome = match detector.analyze_page(request.page, Arc::clone(&data)).await {
                Ok(result) => AnalysisOutcome {
                    request,
                    result,
                    cacheable: true,
                },
                Err(_) => AnalysisOutcome {
                    request,
                    result: PanelDetector::fallback_for(&data),
                    cacheable: false,
                },
            };
            if tx.send(outcome).await.is_err() {
                tracing::debug!(page = request.page, "Session gone before analysis finished");
            }
        });

        Vec::new()
    }

    fn apply_focus(&mut self, page: usize, panel_index: usize, panel: NormalizedBox) {
        let transform = self.transform_for(page, &panel);
        self.state.focus = Some(AppliedFocus {
            page,
            panel_index,
            panel,
            transform,
        });
    }

    fn refresh_focus(&mut self) {
        if let Some(focus) = self.state.focus.take() {
            self.apply_focus(focus.page, focus.panel_index, focus.panel);
        }
    }

    fn transform_for(&self, page: usize, panel: &NormalizedBox) -> Option<FocusTransform> {
        let result = match &self.uncached {
            Some((uncached_page, result)) if *uncached_page == page => Arc::clone(result),
            _ => self.state.analyses.get(page)?,
        };
        focus_transform(
            panel,
            result.image_width,
            result.image_height,
            self.state.viewport,
            self.state.settings.pages_per_view,
            &self.config.focus,
        )
    }
}
