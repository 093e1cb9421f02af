//! Masonry layout: N columns chosen by viewport width, items assigned
//! round-robin (`position mod N`).
//!
//! Geometry is in document pixels. Every item has the same height, so the
//! vertical extent of an item depends only on its row within its column.
//! Horizontal geometry depends on the current viewport width and is
//! computed on demand instead of stored.

use std::collections::HashMap;

use log::debug;

use crate::config::LayoutConfig;
use crate::lazy::{LoadState, ProximityObserver};
use crate::resource::ResourceId;

/// Column count for a viewport width: `≤768 → 1`, `≤1024 → 2`, else 3.
pub fn column_count(width_px: u32) -> usize {
    match width_px {
        0..=768 => 1,
        769..=1024 => 2,
        _ => 3,
    }
}

/// Appearance transition. Items enter hidden and become visible on the
/// next paint, never inside `insert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reveal {
    Entering,
    Visible,
}

#[derive(Debug, Clone)]
pub struct Item {
    pub position: usize,
    pub id: ResourceId,
    pub load: LoadState,
    pub reveal: Reveal,
}

/// Pixel rectangle in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

pub struct Layout {
    columns: Vec<Vec<Item>>,
    /// position → (column, row)
    slots: HashMap<usize, (usize, usize)>,
    observer: ProximityObserver,
    config: LayoutConfig,
}

impl Layout {
    /// Fresh layout with exactly `columns` empty columns (at least one).
    pub fn new(columns: usize, config: LayoutConfig) -> Self {
        let n = columns.max(1);
        debug!("layout: init {n} column(s)");
        Self {
            columns: (0..n).map(|_| Vec::new()).collect(),
            slots: HashMap::new(),
            observer: ProximityObserver::new(config.lookahead_px),
            config,
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Append `id` to column `position mod N`.
    ///
    /// Callers insert in resource-list order; column order is call order.
    pub fn insert(&mut self, id: ResourceId, position: usize) {
        let col = position % self.columns.len();
        let row = self.columns[col].len();
        let load = if position < self.config.eager_count {
            LoadState::Promoted
        } else {
            let top = self.row_top(row);
            self.observer
                .register(position, top, top + self.config.item_height_px);
            LoadState::Placeholder
        };
        self.columns[col].push(Item {
            position,
            id,
            load,
            reveal: Reveal::Entering,
        });
        self.slots.insert(position, (col, row));
    }

    /// Next paint: every entering item becomes visible. Returns how many.
    pub fn paint(&mut self) -> usize {
        let mut n = 0;
        for item in self.columns.iter_mut().flatten() {
            if item.reveal == Reveal::Entering {
                item.reveal = Reveal::Visible;
                n += 1;
            }
        }
        n
    }

    /// Promote placeholders near the viewport. Returns the promoted positions.
    pub fn observe_viewport(&mut self, scroll_top: u32, viewport_h: u32) -> Vec<usize> {
        let fired = self.observer.observe(scroll_top, viewport_h);
        let mut promoted = Vec::with_capacity(fired.len());
        for position in fired {
            if let Some(item) = self.item_mut(position)
                && item.load.promote()
            {
                promoted.push(position);
            }
        }
        if !promoted.is_empty() {
            debug!(
                "layout: promoted {promoted:?}, {} placeholder(s) still watched",
                self.observer.pending()
            );
        }
        promoted
    }

    pub fn column(&self, col: usize) -> &[Item] {
        self.columns.get(col).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Positions in column `col`, top to bottom.
    pub fn column_positions(&self, col: usize) -> Vec<usize> {
        self.column(col).iter().map(|i| i.position).collect()
    }

    pub fn item(&self, position: usize) -> Option<&Item> {
        let &(col, row) = self.slots.get(&position)?;
        self.columns[col].get(row)
    }

    fn item_mut(&mut self, position: usize) -> Option<&mut Item> {
        let &(col, row) = self.slots.get(&position)?;
        self.columns[col].get_mut(row)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn pitch(&self) -> u32 {
        self.config.item_height_px + self.config.gap_px
    }

    fn row_top(&self, row: usize) -> u32 {
        (row as u32).saturating_mul(self.pitch())
    }

    /// Width of one column for a given viewport width.
    pub fn column_width(&self, width_px: u32) -> u32 {
        let n = self.columns.len() as u32;
        width_px.saturating_sub(self.config.gap_px * (n - 1)) / n
    }

    /// Total document height (tallest column).
    pub fn document_height(&self) -> u32 {
        let rows = self.columns.iter().map(Vec::len).max().unwrap_or(0);
        if rows == 0 {
            return 0;
        }
        self.row_top(rows - 1) + self.config.item_height_px
    }

    pub fn item_rect(&self, position: usize, width_px: u32) -> Option<Rect> {
        let &(col, row) = self.slots.get(&position)?;
        let w = self.column_width(width_px);
        Some(Rect {
            x: col as u32 * (w + self.config.gap_px),
            y: self.row_top(row),
            w,
            h: self.config.item_height_px,
        })
    }

    /// Hit-test a document point. Gaps hit nothing.
    pub fn item_at(&self, x: u32, y: u32, width_px: u32) -> Option<usize> {
        let w = self.column_width(width_px);
        let col_pitch = w + self.config.gap_px;
        if col_pitch == 0 {
            return None;
        }
        let col = (x / col_pitch) as usize;
        if col >= self.columns.len() || x % col_pitch >= w {
            return None;
        }
        let pitch = self.pitch();
        let row = (y / pitch) as usize;
        if y % pitch >= self.config.item_height_px {
            return None;
        }
        self.columns[col].get(row).map(|i| i.position)
    }

    /// Positions whose rectangle intersects `[top, top+h)`, in position order.
    pub fn visible_positions(&self, top: u32, h: u32) -> Vec<usize> {
        let bottom = top.saturating_add(h);
        let mut out: Vec<usize> = self
            .columns
            .iter()
            .flat_map(|col| col.iter().enumerate())
            .filter(|(row, _)| {
                let y = self.row_top(*row);
                y < bottom && y + self.config.item_height_px > top
            })
            .map(|(_, item)| item.position)
            .collect();
        out.sort_unstable();
        out
    }
}
