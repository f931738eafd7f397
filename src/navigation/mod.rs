//! Guided panel navigation
//!
//! - [`PanelNavigator`]: panel mode state machine with epoch-stamped analysis
//! - [`focus_transform`]: affine transform framing one panel in the viewport
//! - [`map_key`]: keyboard bindings for panel mode

mod focus;
mod input;
mod machine;
mod state;

pub use focus::{focus_transform, FocusTransform, SafeArea, Viewport};
pub use input::{map_key, KeyCommand, KeyEvent};
pub use machine::{AnalysisRequest, NavigationEffect, PanelNavigator};
pub use state::{NavigationState, PanelTarget};
