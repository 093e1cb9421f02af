//! Lazy promotion: placeholders become real images when they come near the
//! viewport.
//!
//! Every watched item is registered once with its vertical extent. An
//! observation returns the items intersecting the viewport grown by the
//! lookahead margin and forgets them in the same step, so each item fires
//! at most once and a promoted item never goes back to a placeholder.

/// Per-item load state. The only transition is `Placeholder → Promoted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Placeholder,
    Promoted,
}

impl LoadState {
    /// Returns true if this call performed the transition.
    pub fn promote(&mut self) -> bool {
        match self {
            LoadState::Placeholder => {
                *self = LoadState::Promoted;
                true
            }
            LoadState::Promoted => false,
        }
    }
}

struct Watch {
    position: usize,
    top: u32,
    bottom: u32,
}

/// One-shot proximity callbacks keyed by gallery position.
pub struct ProximityObserver {
    margin: u32,
    pending: Vec<Watch>,
}

impl ProximityObserver {
    pub fn new(margin: u32) -> Self {
        Self {
            margin,
            pending: Vec::new(),
        }
    }

    /// Watch the vertical extent `[top, bottom)` of `position`.
    pub fn register(&mut self, position: usize, top: u32, bottom: u32) {
        self.pending.push(Watch {
            position,
            top,
            bottom,
        });
    }

    /// Fire and deregister every watch near the viewport.
    ///
    /// Returned positions are in registration order.
    pub fn observe(&mut self, scroll_top: u32, viewport_h: u32) -> Vec<usize> {
        let lo = scroll_top.saturating_sub(self.margin);
        let hi = scroll_top
            .saturating_add(viewport_h)
            .saturating_add(self.margin);
        let mut fired = Vec::new();
        self.pending.retain(|w| {
            let near = w.top <= hi && w.bottom >= lo;
            if near {
                fired.push(w.position);
            }
            !near
        });
        fired
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
