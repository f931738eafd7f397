//! Page carousel collaborator
//!
//! The reader never moves pages itself; it asks the carousel and reacts to
//! the index it reports back.

/// Page slider driven by the reader
pub trait Carousel: Send {
    fn active_index(&self) -> usize;

    fn page_count(&self) -> usize;

    /// Move forward one group; `None` when already at the end
    fn advance(&mut self) -> Option<usize>;

    /// Move back one group; `None` when already at the start
    fn retreat(&mut self) -> Option<usize>;

    /// Jump to a page; `None` when the index is out of range
    fn go_to(&mut self, index: usize) -> Option<usize>;

    /// Number of pages shown (and moved) at once
    fn set_pages_per_view(&mut self, _pages_per_view: u8) {}
}

/// In-process carousel moving `pages_per_view` pages at a time
#[derive(Debug, Clone)]
pub struct PageSlider {
    active: usize,
    page_count: usize,
    pages_per_view: u8,
}

impl PageSlider {
    pub fn new(page_count: usize) -> Self {
        Self {
            active: 0,
            page_count,
            pages_per_view: 1,
        }
    }

    fn step(&self) -> usize {
        self.pages_per_view.max(1) as usize
    }
}

impl Carousel for PageSlider {
    fn active_index(&self) -> usize {
        self.active
    }

    fn page_count(&self) -> usize {
        self.page_count
    }

    fn advance(&mut self) -> Option<usize> {
        let next = self.active + self.step();
        if next >= self.page_count {
            return None;
        }
        self.active = next;
        Some(next)
    }

    fn retreat(&mut self) -> Option<usize> {
        if self.active == 0 {
            return None;
        }
        self.active = self.active.saturating_sub(self.step());
        Some(self.active)
    }

    fn go_to(&mut self, index: usize) -> Option<usize> {
        if index >= self.page_count {
            return None;
        }
        self.active = index;
        Some(index)
    }

    fn set_pages_per_view(&mut self, pages_per_view: u8) {
        self.pages_per_view = pages_per_view.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slider_bounds() {
        let mut slider = PageSlider::new(3);
        assert_eq!(slider.retreat(), None);
        assert_eq!(slider.advance(), Some(1));
        assert_eq!(slider.advance(), Some(2));
        assert_eq!(slider.advance(), None);
        assert_eq!(slider.active_index(), 2);
        assert_eq!(slider.go_to(5), None);
        assert_eq!(slider.go_to(0), Some(0));
    }

    #[test]
    fn test_double_page_steps() {
        let mut slider = PageSlider::new(5);
        slider.set_pages_per_view(2);
        assert_eq!(slider.advance(), Some(2));
        assert_eq!(slider.advance(), Some(4));
        assert_eq!(slider.advance(), None);
        assert_eq!(slider.retreat(), Some(2));
    }
}
