//! Full-screen viewer cursor.
//!
//! The cursor indexes the resource list and wraps in both directions.
//! Every operation takes the current list length; with an empty list all of
//! them are no-ops and the lightbox stays closed.

#[derive(Debug, Default)]
pub struct Lightbox {
    cursor: Option<usize>,
}

impl Lightbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open at `index`. Out-of-range indices are ignored.
    pub fn open(&mut self, index: usize, len: usize) {
        if index < len {
            self.cursor = Some(index);
        }
    }

    pub fn close(&mut self) {
        self.cursor = None;
    }

    pub fn is_open(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn current(&self) -> Option<usize> {
        self.cursor
    }

    pub fn next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        if let Some(c) = self.cursor.as_mut() {
            *c = (*c + 1) % len;
        }
    }

    pub fn previous(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        if let Some(c) = self.cursor.as_mut() {
            *c = (*c + len - 1) % len;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previous_from_first_wraps_to_last() {
        let mut lb = Lightbox::new();
        lb.open(0, 4);
        lb.previous(4);
        assert_eq!(lb.current(), Some(3));
    }

    #[test]
    fn next_from_last_wraps_to_first() {
        let mut lb = Lightbox::new();
        lb.open(3, 4);
        lb.next(4);
        assert_eq!(lb.current(), Some(0));
    }

    #[test]
    fn single_item_stays_put() {
        let mut lb = Lightbox::new();
        lb.open(0, 1);
        lb.next(1);
        assert_eq!(lb.current(), Some(0));
        lb.previous(1);
        assert_eq!(lb.current(), Some(0));
    }

    #[test]
    fn empty_list_is_noop() {
        let mut lb = Lightbox::new();
        lb.open(0, 0);
        assert!(!lb.is_open());
        lb.next(0);
        lb.previous(0);
        assert_eq!(lb.current(), None);
    }

    #[test]
    fn navigation_while_closed_does_nothing() {
        let mut lb = Lightbox::new();
        lb.next(5);
        assert_eq!(lb.current(), None);
    }

    #[test]
    fn close_resets() {
        let mut lb = Lightbox::new();
        lb.open(2, 5);
        assert!(lb.is_open());
        lb.close();
        assert!(!lb.is_open());
    }
}
