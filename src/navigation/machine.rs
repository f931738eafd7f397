//! Panel navigation state machine
//!
//! The navigator owns no event listeners and performs no I/O. Every
//! operation returns the effects the caller must carry out: start an
//! analysis, apply or clear a focus transform, or move the carousel.
//!
//! Analysis requests are stamped with an epoch that increases with every
//! request. A completed analysis is applied only if it answers the request
//! the navigator is still waiting on, so a slow result for a page the
//! reader already left can never overwrite the active panel list.

use crate::panels::{AnalysisResult, NormalizedBox, ReadingDirection};

use super::state::{NavigationState, PanelTarget};

/// Analysis the navigator is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub page: usize,
    pub epoch: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavigationEffect {
    /// Analyse a page, consulting the analysis cache first
    Analyze(AnalysisRequest),
    /// Frame a panel of the active page
    Focus {
        page: usize,
        panel_index: usize,
        panel: NormalizedBox,
    },
    /// Remove any applied focus transform
    ClearFocus,
    /// Ask the carousel for the next page
    AdvancePage,
    /// Ask the carousel for the previous page
    RetreatPage,
    /// Ask the carousel to show a specific page
    GoToPage(usize),
}

#[derive(Debug, Clone, Default)]
pub struct PanelNavigator {
    state: NavigationState,
    direction: ReadingDirection,
    epoch: u64,
    awaiting: Option<AnalysisRequest>,
}

impl PanelNavigator {
    pub fn new(active_page: usize, direction: ReadingDirection) -> Self {
        Self {
            state: NavigationState::new(active_page),
            direction,
            ..Default::default()
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    pub fn active_page(&self) -> usize {
        self.state.active_page
    }

    pub fn direction(&self) -> ReadingDirection {
        self.direction
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Request whose outcome will be applied, if any
    pub fn awaiting(&self) -> Option<AnalysisRequest> {
        self.awaiting
    }

    pub fn current_panel(&self) -> Option<NormalizedBox> {
        self.state.current()
    }

    /// Flip panel mode for the page currently shown
    pub fn toggle(&mut self, active_page: usize) -> Vec<NavigationEffect> {
        self.state.active_page = active_page;
        self.state.enabled = !self.state.enabled;
        self.state.pending_target = None;

        if self.state.enabled {
            self.state.current_panel = 0;
            self.state.active_panels = None;
            vec![self.request_analysis()]
        } else {
            self.state.active_panels = None;
            self.invalidate();
            vec![NavigationEffect::ClearFocus]
        }
    }

    pub fn on_page_changed(&mut self, page: usize) -> Vec<NavigationEffect> {
        self.state.active_page = page;
        self.state.active_panels = None;

        if !self.state.enabled {
            return Vec::new();
        }

        self.state.current_panel = 0;
        vec![NavigationEffect::ClearFocus, self.request_analysis()]
    }

    pub fn next(&mut self) -> Vec<NavigationEffect> {
        if !self.state.enabled {
            return Vec::new();
        }

        if self.state.panel_count() > 1 && !self.state.is_last_panel() {
            self.state.current_panel += 1;
            return self.focus_effect().into_iter().collect();
        }

        self.state.pending_target = Some(PanelTarget::First);
        vec![NavigationEffect::AdvancePage]
    }

    pub fn prev(&mut self) -> Vec<NavigationEffect> {
        if !self.state.enabled {
            return Vec::new();
        }

        if self.state.panel_count() > 1 && self.state.current_panel > 0 {
            self.state.current_panel -= 1;
            return self.focus_effect().into_iter().collect();
        }

        self.state.pending_target = Some(PanelTarget::Last);
        vec![NavigationEffect::RetreatPage]
    }

    /// Jump to a panel of a page
    ///
    /// On the active page this focuses immediately once its panels are
    /// known. Otherwise the target is kept pending and the carousel is asked
    /// for the page; the target resolves when that page's analysis lands.
    pub fn go_to_panel(&mut self, page: usize, target: PanelTarget) -> Vec<NavigationEffect> {
        if page == self.state.active_page {
            if !self.state.enabled {
                return Vec::new();
            }
            if self.state.active_panels.is_some() {
                self.state.current_panel = target.resolve(self.state.panel_count());
                return self.focus_effect().into_iter().collect();
            }
            self.state.pending_target = Some(target);
            return Vec::new();
        }

        if self.state.enabled {
            self.state.pending_target = Some(target);
        }
        vec![NavigationEffect::GoToPage(page)]
    }

    /// Drop a boundary-crossing target the carousel could not honour
    pub fn cancel_pending(&mut self) {
        self.state.pending_target = None;
    }

    /// Switch reading direction, re-applying panel mode to the active page
    pub fn set_direction(&mut self, direction: ReadingDirection) -> Vec<NavigationEffect> {
        self.direction = direction;
        self.state.current_panel = 0;
        self.state.pending_target = None;

        if !self.state.enabled {
            return Vec::new();
        }

        self.state.active_panels = None;
        vec![self.request_analysis()]
    }

    /// Apply a finished analysis
    ///
    /// Results for any request other than the one currently awaited are
    /// discarded without touching the state.
    pub fn complete_analysis(
        &mut self,
        request: AnalysisRequest,
        result: &AnalysisResult,
    ) -> Vec<NavigationEffect> {
        if !self.state.enabled || self.awaiting != Some(request) {
            tracing::debug!(
                page = request.page,
                epoch = request.epoch,
                live_epoch = self.epoch,
                "Discarding stale analysis"
            );
            return Vec::new();
        }

        self.awaiting = None;

        let panels = result.reading_panels(self.direction);
        self.state.current_panel = match self.state.pending_target.take() {
            Some(target) => target.resolve(panels.len()),
            None => self.state.current_panel.min(panels.len().saturating_sub(1)),
        };
        self.state.active_panels = Some(panels);

        tracing::debug!(
            page = request.page,
            panels = self.state.panel_count(),
            current = self.state.current_panel,
            "Panels ready"
        );

        self.focus_effect().into_iter().collect()
    }

    /// `Panel {n}/{total}`, empty when disabled or with fewer than two panels
    pub fn indicator(&self) -> String {
        let total = self.state.panel_count();
        if !self.state.enabled || total < 2 {
            return String::new();
        }
        format!("Panel {}/{}", self.state.current_panel + 1, total)
    }

    fn request_analysis(&mut self) -> NavigationEffect {
        self.epoch += 1;
        let request = AnalysisRequest {
            page: self.state.active_page,
            epoch: self.epoch,
        };
        self.awaiting = Some(request);
        NavigationEffect::Analyze(request)
    }

    fn invalidate(&mut self) {
        self.epoch += 1;
        self.awaiting = None;
    }

    fn focus_effect(&self) -> Option<NavigationEffect> {
        self.state.current().map(|panel| NavigationEffect::Focus {
            page: self.state.active_page,
            panel_index: self.state.current_panel,
            panel,
        })
    }
}
