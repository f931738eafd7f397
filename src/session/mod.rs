//! Reading sessions
//!
//! A session ties one opened archive to a carousel, the panel navigator and
//! the per-item reader settings.

mod carousel;
mod reader;
mod settings;

pub use carousel::{Carousel, PageSlider};
pub use reader::{
    start_page_from_ticks, AppliedFocus, ReaderSession, SessionState, Slide, TICKS_PER_PAGE,
};
pub use settings::{ReaderSettings, SettingsError, SettingsResult, SettingsStore};
