//! Terminal photo wall with Kitty Graphics Protocol
//!
//! Layout:
//!   rows 0..term_rows-1 : card grid (or the lightbox while one is open)
//!   row term_rows-1     : status bar
//!
//! Geometry:
//!   The gallery lays items out in document pixels. The terminal's pixel
//!   size (or an 8x16 fallback cell) converts cells to pixels, so column
//!   breakpoints react to the real window width.
//!
//! Event loop:
//!   Discovery runs on a background thread and streams identifiers over a
//!   channel, drained with `try_recv()` each cycle. Resize events go through
//!   the debounced viewport reactor; the columns are rebuilt only once the
//!   width has settled and only if the column count changes. Redraws are
//!   coalesced to one per frame budget.
//!
//! Kitty response suppression:
//!   All Kitty Graphics Protocol commands use `q=2` so no APC response ever
//!   reaches crossterm's input parser.

mod input;
mod mode_grid;
mod mode_lightbox;
mod state;
mod terminal;

use anyhow::Context;
use crossterm::{
    event::{self, Event},
    terminal as crossterm_terminal,
};
use log::{debug, info, warn};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::discovery::{DiscoveryWorker, StopReason};
use crate::gallery::Gallery;
use crate::probe;
use crate::reactor::ViewportReactor;
use crate::resource::Base;

use input::{InputAccumulator, lightbox_click, map_click, map_grid_key, map_lightbox_key, map_wheel};
use mode_grid::GridCtx;
use state::{Screen, ViewState, cell_to_doc};
use terminal::StatusInfo;

/// How often the loop wakes to drain discovery results while a pass runs.
const DISCOVERY_POLL: Duration = Duration::from_millis(50);
const IDLE_POLL: Duration = Duration::from_secs(86400);

/// Side effect requested by a mode handler.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Effect {
    Exit,
    ScrollTo(u32),
    RedrawStatusBar,
    Flash(String),
    OpenLightbox(usize),
    CloseLightbox,
    LightboxNext,
    LightboxPrevious,
    OpenExternal,
    Rediscover,
}

fn spawn_worker(base: &Base, config: &Config) -> DiscoveryWorker {
    let prober = probe::for_base(base, config.discovery.probe_timeout);
    DiscoveryWorker::spawn(prober, config.ext.clone(), config.discovery.clone())
}

fn status_info<'a>(base: &'a str, gallery: &Gallery, discovering: bool) -> StatusInfo<'a> {
    StatusInfo {
        base,
        found: gallery.resources().len(),
        discovering,
        columns: gallery.layout().column_count(),
        lightbox: gallery.lightbox().is_open(),
    }
}

fn grid_ctx<'a>(
    view: &'a ViewState,
    gallery: &'a Gallery,
    screen: &Screen,
    scroll_cells: u32,
) -> GridCtx<'a> {
    let cell_h = screen.cell_h as u32;
    GridCtx {
        state: view,
        layout: gallery.layout(),
        width_px: screen.width_px(),
        item_count: gallery.resources().len(),
        max_scroll: view.max_scroll(),
        scroll_step: scroll_cells * cell_h,
        half_page: (screen.grid_rows as u32 / 2).max(1) * cell_h,
    }
}

struct Frame<'a> {
    screen: &'a Screen,
    view: &'a ViewState,
    info: StatusInfo<'a>,
    acc_peek: Option<u32>,
    flash: Option<&'a str>,
    kitty: bool,
}

/// Grid-area message for an empty gallery. Progress while discovering is
/// left to the status bar.
fn empty_notice(empty: bool, discovering: bool) -> Option<&'static str> {
    (empty && !discovering).then_some("No images found")
}

fn redraw(gallery: &Gallery, frame: &Frame) -> std::io::Result<()> {
    if gallery.lightbox().is_open() {
        terminal::draw_lightbox(frame.screen, gallery, frame.kitty)?;
    } else {
        terminal::draw_grid(frame.screen, gallery, frame.view)?;
        if let Some(msg) = empty_notice(gallery.resources().is_empty(), frame.info.discovering) {
            terminal::draw_notice(frame.screen, msg)?;
        }
    }
    terminal::draw_status_bar(
        frame.screen,
        &frame.info,
        frame.view,
        frame.acc_peek,
        frame.flash,
    )
}

/// Run the terminal gallery on `config.base`.
pub fn run(config: Config) -> anyhow::Result<()> {
    terminal::check_tty()?;

    let base = Base::parse(&config.base);
    let base_label = base.display_name();

    let winsize = crossterm_terminal::window_size().context("failed to get terminal size")?;
    let mut screen = state::compute_screen(winsize.columns, winsize.rows, winsize.width, winsize.height);
    info!(
        "viewer: {}x{} cells, cell {}x{}px, width {}px",
        screen.cols,
        screen.grid_rows + 1,
        screen.cell_w,
        screen.cell_h,
        screen.width_px()
    );

    let mut gallery = Gallery::new(base.clone(), config.layout, screen.width_px());
    let mut reactor = ViewportReactor::new(config.viewer.resize_debounce);
    let kitty = terminal::kitty_supported();
    debug!("viewer: kitty graphics {}", if kitty { "on" } else { "off" });

    let mut worker = Some(spawn_worker(&base, &config));
    let mut guard = terminal::RawGuard::enter()?;

    let mut view = ViewState {
        y_offset: 0,
        doc_h: 0,
        vp_h: screen.grid_height_px(),
    };
    let mut acc = InputAccumulator::new();
    // One-shot status bar message, cleared on the next key press.
    let mut flash_msg: Option<String> = None;
    let frame_budget = config.viewer.frame_budget;
    let mut dirty = true;
    let mut last_render = Instant::now();

    'main: loop {
        if let Some(w) = &worker {
            let drained = w.drain();
            if !drained.found.is_empty() {
                debug!("main: {} new resource(s)", drained.found.len());
                for id in drained.found {
                    gallery.on_discovered(id);
                }
                dirty = true;
            }
            if let Some(report) = drained.finished {
                match report.stop {
                    StopReason::FailureThreshold { last_index } => info!(
                        "discovery: {} found, {} probed, stopped after index {last_index}",
                        report.found, report.probed
                    ),
                    other => info!("discovery: {} found, {:?}", report.found, other),
                }
                worker = None;
                dirty = true;
            }
        }

        let now = Instant::now();
        if let Some(width) = reactor.poll(now) {
            if gallery.apply_width(width) {
                view.y_offset = 0;
            }
            dirty = true;
        }

        let mut timeout = if dirty {
            frame_budget.saturating_sub(last_render.elapsed())
        } else if worker.is_some() {
            DISCOVERY_POLL
        } else {
            IDLE_POLL
        };
        if let Some(deadline) = reactor.deadline() {
            timeout = timeout.min(deadline.saturating_duration_since(now));
        }

        if event::poll(timeout)? {
            let ev = event::read()?;
            debug!("event: {:?}", ev);

            let had_flash = flash_msg.take().is_some();
            view.update(gallery.layout().document_height(), screen.grid_height_px());

            let effects = match ev {
                Event::Key(key) if gallery.lightbox().is_open() => {
                    map_lightbox_key(key).map(mode_lightbox::handle).unwrap_or_default()
                }
                Event::Key(key) => match map_grid_key(key, &mut acc) {
                    Some(action) => {
                        let ctx = grid_ctx(&view, &gallery, &screen, config.viewer.scroll_step);
                        mode_grid::handle(action, &ctx)
                    }
                    None if acc.is_active() || had_flash => {
                        acc.reset();
                        vec![Effect::RedrawStatusBar]
                    }
                    None => vec![],
                },
                Event::Mouse(mouse) if gallery.lightbox().is_open() => map_click(mouse)
                    .map(|(column, _)| mode_lightbox::handle(lightbox_click(column, screen.cols)))
                    .unwrap_or_default(),
                Event::Mouse(mouse) => {
                    if let Some((column, row)) = map_click(mouse) {
                        if row < screen.grid_rows {
                            let (x, y) = cell_to_doc(column, row, view.y_offset, &screen);
                            if let Some(position) = gallery.click(x, y, screen.width_px()) {
                                debug!("click: ({x},{y}) opens position {position}");
                                dirty = true;
                            }
                        }
                        vec![]
                    } else if let Some(action) = map_wheel(mouse) {
                        let ctx = grid_ctx(&view, &gallery, &screen, config.viewer.scroll_step);
                        mode_grid::handle(action, &ctx)
                    } else {
                        vec![]
                    }
                }
                Event::Resize(new_cols, new_rows) => {
                    let ws = crossterm_terminal::window_size()?;
                    screen = state::compute_screen(new_cols, new_rows, ws.width, ws.height);
                    reactor.on_resize(screen.width_px(), Instant::now());
                    terminal::delete_all_images()?;
                    dirty = true;
                    vec![]
                }
                _ => vec![],
            };

            for effect in effects {
                match effect {
                    Effect::Exit => break 'main,
                    Effect::ScrollTo(y) => {
                        view.y_offset = y.min(view.max_scroll());
                        dirty = true;
                    }
                    Effect::RedrawStatusBar => {
                        terminal::draw_status_bar(
                            &screen,
                            &status_info(&base_label, &gallery, worker.is_some()),
                            &view,
                            acc.peek(),
                            flash_msg.as_deref(),
                        )?;
                    }
                    Effect::Flash(msg) => {
                        flash_msg = Some(msg);
                        terminal::draw_status_bar(
                            &screen,
                            &status_info(&base_label, &gallery, worker.is_some()),
                            &view,
                            None,
                            flash_msg.as_deref(),
                        )?;
                    }
                    Effect::OpenLightbox(position) => {
                        gallery.open_lightbox(position);
                        dirty = true;
                    }
                    Effect::CloseLightbox => {
                        gallery.close_lightbox();
                        terminal::delete_all_images()?;
                        dirty = true;
                    }
                    Effect::LightboxNext => {
                        gallery.lightbox_next();
                        dirty = true;
                    }
                    Effect::LightboxPrevious => {
                        gallery.lightbox_previous();
                        dirty = true;
                    }
                    Effect::OpenExternal => {
                        if let Some(id) = gallery.current() {
                            let location = gallery.base().locate(id);
                            match open::that(&location) {
                                Ok(()) => {
                                    info!("opened {location}");
                                    flash_msg = Some(format!("Opened {}", id.name()));
                                }
                                Err(e) => {
                                    warn!("failed to open {location}: {e}");
                                    flash_msg = Some(format!("Open failed: {e}"));
                                }
                            }
                            dirty = true;
                        }
                    }
                    Effect::Rediscover => {
                        info!("rediscover: restarting discovery on {base_label}");
                        // Dropping the old worker closes its channel; the thread
                        // stops at its next send.
                        drop(worker.take());
                        gallery.reset();
                        view.y_offset = 0;
                        worker = Some(spawn_worker(&base, &config));
                        dirty = true;
                    }
                }
            }
            continue;
        }

        // poll timeout → frame budget elapsed (or a wakeup), redraw if needed
        if dirty && last_render.elapsed() >= frame_budget {
            view.update(gallery.layout().document_height(), screen.grid_height_px());
            let promoted = gallery.observe_viewport(view.y_offset, view.vp_h);
            if !promoted.is_empty() {
                debug!("lazy: promoted {promoted:?}");
            }
            let frame = Frame {
                screen: &screen,
                view: &view,
                info: status_info(&base_label, &gallery, worker.is_some()),
                acc_peek: acc.peek(),
                flash: flash_msg.as_deref(),
                kitty,
            };
            redraw(&gallery, &frame)?;
            // Items drawn for the first time become visible on the next frame.
            let revealed = gallery.paint();
            dirty = revealed > 0;
            last_render = Instant::now();
        }
    }

    guard.cleanup();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_notice_only_after_discovery_ends() {
        assert_eq!(empty_notice(true, true), None);
        assert_eq!(empty_notice(true, false), Some("No images found"));
        assert_eq!(empty_notice(false, false), None);
        assert_eq!(empty_notice(false, true), None);
    }
}
