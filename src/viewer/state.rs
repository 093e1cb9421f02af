//! Screen geometry and view state: cells ↔ document pixels, card placement.

use crate::layout::Rect;

/// Fallback cell size when the terminal does not report pixel dimensions.
const FALLBACK_CELL_W: u16 = 8;
const FALLBACK_CELL_H: u16 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Screen {
    pub cols: u16,
    pub grid_rows: u16,  // rows available to the grid (= term_rows - 1)
    pub status_row: u16, // status bar row (= term_rows - 1)
    pub cell_w: u16,     // pixels per cell (width)
    pub cell_h: u16,     // pixels per cell (height)
}

impl Screen {
    /// Viewport width in pixels, used for breakpoints and hit testing.
    pub(super) fn width_px(&self) -> u32 {
        self.cols as u32 * self.cell_w as u32
    }

    pub(super) fn grid_height_px(&self) -> u32 {
        self.grid_rows as u32 * self.cell_h as u32
    }
}

pub(super) fn compute_screen(term_cols: u16, term_rows: u16, pixel_w: u16, pixel_h: u16) -> Screen {
    let cell_w = if term_cols > 0 && pixel_w > 0 {
        (pixel_w / term_cols).max(1)
    } else {
        FALLBACK_CELL_W
    };
    let cell_h = if term_rows > 0 && pixel_h > 0 {
        (pixel_h / term_rows).max(1)
    } else {
        FALLBACK_CELL_H
    };
    Screen {
        cols: term_cols,
        grid_rows: term_rows.saturating_sub(1),
        status_row: term_rows.saturating_sub(1),
        cell_w,
        cell_h,
    }
}

pub(super) struct ViewState {
    pub y_offset: u32, // scroll offset (pixels)
    pub doc_h: u32,    // document height (pixels)
    pub vp_h: u32,     // viewport height (pixels)
}

impl ViewState {
    pub(super) fn max_scroll(&self) -> u32 {
        self.doc_h.saturating_sub(self.vp_h)
    }

    /// Re-clamp after the document or viewport changed size.
    pub(super) fn update(&mut self, doc_h: u32, vp_h: u32) {
        self.doc_h = doc_h;
        self.vp_h = vp_h;
        self.y_offset = self.y_offset.min(self.max_scroll());
    }

    pub(super) fn percent(&self) -> u32 {
        let max = self.max_scroll();
        if max == 0 {
            100
        } else {
            ((self.y_offset as u64 * 100) / max as u64) as u32
        }
    }
}

/// Cell-space placement of a card, clipped to the grid area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct CardCells {
    pub col: u16,
    pub row: u16,
    pub width: u16,
    pub height: u16,
    /// Rows cut off above the top edge of the grid.
    pub clipped_top: u16,
}

/// Map a document rectangle to screen cells, or `None` if off-screen.
pub(super) fn card_cells(rect: Rect, y_offset: u32, screen: &Screen) -> Option<CardCells> {
    let cw = screen.cell_w as u32;
    let ch = screen.cell_h as u32;
    let col = rect.x / cw;
    let width = (rect.w / cw).max(1);
    if col >= screen.cols as u32 {
        return None;
    }
    let width = width.min(screen.cols as u32 - col);

    let top = rect.y as i64 - y_offset as i64;
    let bottom = top + rect.h as i64;
    let grid_h = screen.grid_height_px() as i64;
    if bottom <= 0 || top >= grid_h {
        return None;
    }
    let top_row = top.div_euclid(ch as i64);
    let bottom_row = (bottom + ch as i64 - 1).div_euclid(ch as i64);
    let visible_top = top_row.max(0);
    let visible_bottom = bottom_row.min(screen.grid_rows as i64);
    if visible_bottom <= visible_top {
        return None;
    }
    Some(CardCells {
        col: col as u16,
        row: visible_top as u16,
        width: width as u16,
        height: (visible_bottom - visible_top) as u16,
        clipped_top: (visible_top - top_row) as u16,
    })
}

/// Screen cell → document pixel (centre of the cell).
pub(super) fn cell_to_doc(column: u16, row: u16, y_offset: u32, screen: &Screen) -> (u32, u32) {
    let x = column as u32 * screen.cell_w as u32 + screen.cell_w as u32 / 2;
    let y = y_offset + row as u32 * screen.cell_h as u32 + screen.cell_h as u32 / 2;
    (x, y)
}

/// Truncate to `max` characters, marking the cut with `…`.
pub(super) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push('…');
    out
}
