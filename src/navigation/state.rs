//! Navigation state shared by the panel navigator and the session

use serde::Serialize;

use crate::panels::NormalizedBox;

/// Panel to land on once a newly entered page has been analysed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelTarget {
    First,
    Last,
    Index(usize),
}

impl PanelTarget {
    /// Panel index for a list of `count` panels
    pub fn resolve(self, count: usize) -> usize {
        let last = count.saturating_sub(1);
        match self {
            PanelTarget::First => 0,
            PanelTarget::Last => last,
            PanelTarget::Index(index) => index.min(last),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub enabled: bool,
    pub active_page: usize,
    /// Reading-ordered panels of the active page, `None` until analysed
    pub active_panels: Option<Vec<NormalizedBox>>,
    pub current_panel: usize,
    pub pending_target: Option<PanelTarget>,
}

impl NavigationState {
    pub fn new(active_page: usize) -> Self {
        Self {
            active_page,
            ..Default::default()
        }
    }

    pub fn panel_count(&self) -> usize {
        self.active_panels.as_ref().map_or(0, Vec::len)
    }

    pub fn current(&self) -> Option<NormalizedBox> {
        self.active_panels
            .as_ref()
            .and_then(|panels| panels.get(self.current_panel))
            .copied()
    }

    pub fn is_last_panel(&self) -> bool {
        self.current_panel + 1 >= self.panel_count()
    }
}
