//! Gallery controller: the single owner of the resource list, the column
//! layout and the lightbox.
//!
//! All mutation goes through `&mut Gallery` on the UI thread. The discovery
//! worker only sends identifiers; it never reaches in here.

use log::{debug, info};

use crate::config::LayoutConfig;
use crate::layout::{Layout, column_count};
use crate::lightbox::Lightbox;
use crate::resource::{Base, ResourceId, ResourceList};

pub struct Gallery {
    base: Base,
    resources: ResourceList,
    layout: Layout,
    layout_config: LayoutConfig,
    lightbox: Lightbox,
    rebuilds: usize,
}

impl Gallery {
    pub fn new(base: Base, layout_config: LayoutConfig, width_px: u32) -> Self {
        let columns = column_count(width_px);
        Self {
            base,
            resources: ResourceList::new(),
            layout: Layout::new(columns, layout_config),
            layout_config,
            lightbox: Lightbox::new(),
            rebuilds: 0,
        }
    }

    pub fn base(&self) -> &Base {
        &self.base
    }

    pub fn resources(&self) -> &ResourceList {
        &self.resources
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    /// Number of layout rebuilds caused by column-count changes.
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }

    /// Append a freshly discovered resource and lay it out immediately.
    pub fn on_discovered(&mut self, id: ResourceId) -> usize {
        let position = self.resources.push(id.clone());
        self.layout.insert(id, position);
        position
    }

    /// Start a fresh discovery pass: the list and the columns are cleared.
    pub fn reset(&mut self) {
        let columns = self.layout.column_count();
        self.resources.clear();
        self.lightbox.close();
        self.layout = Layout::new(columns, self.layout_config);
    }

    /// React to a settled viewport width.
    ///
    /// Rebuilds the columns and replays the resource list only when the
    /// column count changes. Returns whether a rebuild happened.
    pub fn apply_width(&mut self, width_px: u32) -> bool {
        let target = column_count(width_px);
        if target == self.layout.column_count() {
            debug!("gallery: width {width_px}px keeps {target} column(s)");
            return false;
        }
        info!(
            "gallery: width {width_px}px, columns {} -> {target}, replaying {} item(s)",
            self.layout.column_count(),
            self.resources.len()
        );
        let mut layout = Layout::new(target, self.layout_config);
        for (position, id) in self.resources.iter().enumerate() {
            layout.insert(id.clone(), position);
        }
        self.layout = layout;
        self.rebuilds += 1;
        true
    }

    pub fn paint(&mut self) -> usize {
        self.layout.paint()
    }

    pub fn observe_viewport(&mut self, scroll_top: u32, viewport_h: u32) -> Vec<usize> {
        self.layout.observe_viewport(scroll_top, viewport_h)
    }

    /// Click at a document point: opens the lightbox on the item hit.
    pub fn click(&mut self, x: u32, y: u32, width_px: u32) -> Option<usize> {
        let position = self.layout.item_at(x, y, width_px)?;
        self.open_lightbox(position);
        Some(position)
    }

    pub fn open_lightbox(&mut self, position: usize) {
        self.lightbox.open(position, self.resources.len());
    }

    pub fn close_lightbox(&mut self) {
        self.lightbox.close();
    }

    pub fn lightbox_next(&mut self) {
        self.lightbox.next(self.resources.len());
    }

    pub fn lightbox_previous(&mut self) {
        self.lightbox.previous(self.resources.len());
    }

    /// Resource under the lightbox cursor.
    pub fn current(&self) -> Option<&ResourceId> {
        self.lightbox.current().and_then(|i| self.resources.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lazy::LoadState;

    fn gallery(width: u32) -> Gallery {
        let cfg = LayoutConfig {
            eager_count: 2,
            ..LayoutConfig::default()
        };
        Gallery::new(Base::parse("./photos"), cfg, width)
    }

    fn names(g: &Gallery, col: usize) -> Vec<String> {
        g.layout().column(col).iter().map(|i| i.id.name()).collect()
    }

    #[test]
    fn discovered_items_land_round_robin() {
        let mut g = gallery(1400);
        for n in 1..=5 {
            g.on_discovered(ResourceId::new(n, "webp"));
        }
        assert_eq!(names(&g, 0), ["1.webp", "4.webp"]);
        assert_eq!(names(&g, 1), ["2.webp", "5.webp"]);
        assert_eq!(names(&g, 2), ["3.webp"]);
    }

    #[test]
    fn shrink_to_one_column_replays_in_order() {
        let mut g = gallery(1400);
        for n in 1..=4 {
            g.on_discovered(ResourceId::new(n, "webp"));
        }
        assert!(g.apply_width(600));
        assert_eq!(g.layout().column_count(), 1);
        assert_eq!(names(&g, 0), ["1.webp", "2.webp", "3.webp", "4.webp"]);
        assert_eq!(g.rebuild_count(), 1);
    }

    #[test]
    fn same_column_count_is_noop() {
        let mut g = gallery(1400);
        g.on_discovered(ResourceId::new(1, "webp"));
        g.paint();
        assert!(!g.apply_width(1100));
        assert!(!g.apply_width(3000));
        assert_eq!(g.rebuild_count(), 0);
        // Layout untouched: the painted item is still visible.
        assert_eq!(
            g.layout().item(0).unwrap().reveal,
            crate::layout::Reveal::Visible
        );
    }

    #[test]
    fn rebuild_restarts_lazy_state_from_eager_prefix() {
        let mut g = gallery(1400);
        for n in 1..=4 {
            g.on_discovered(ResourceId::new(n, "webp"));
        }
        g.apply_width(900);
        assert_eq!(g.layout().item(1).unwrap().load, LoadState::Promoted);
        assert_eq!(g.layout().item(3).unwrap().load, LoadState::Placeholder);
    }

    #[test]
    fn click_opens_lightbox_on_hit_item() {
        let mut g = gallery(600);
        for n in 1..=3 {
            g.on_discovered(ResourceId::new(n, "webp"));
        }
        // One column, pitch 316: y=400 is row 1.
        assert_eq!(g.click(10, 400, 600), Some(1));
        assert_eq!(g.current().map(ResourceId::name).as_deref(), Some("2.webp"));
        g.lightbox_next();
        g.lightbox_next();
        assert_eq!(g.current().map(ResourceId::name).as_deref(), Some("1.webp"));
        g.lightbox_previous();
        assert_eq!(g.current().map(ResourceId::name).as_deref(), Some("3.webp"));
        g.close_lightbox();
        assert!(g.current().is_none());
    }

    #[test]
    fn empty_gallery_click_is_noop() {
        let mut g = gallery(1400);
        assert_eq!(g.click(10, 10, 1400), None);
        g.lightbox_next();
        assert!(!g.lightbox().is_open());
    }

    #[test]
    fn reset_clears_list_and_columns() {
        let mut g = gallery(1400);
        g.on_discovered(ResourceId::new(1, "webp"));
        g.open_lightbox(0);
        g.reset();
        assert!(g.resources().is_empty());
        assert!(g.layout().is_empty());
        assert_eq!(g.layout().column_count(), 3);
        assert!(!g.lightbox().is_open());
    }
}
