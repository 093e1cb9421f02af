//! Terminal I/O layer: raw mode, card grid, lightbox, status bar, Kitty
//! graphics for local PNG files.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use crossterm::{
    ExecutableCommand, QueueableCommand, cursor, event,
    style::{self, Stylize},
    terminal,
};
use std::io::{self, Write, stdout};
use std::path::{Path, PathBuf};

use log::debug;

use super::state::{Screen, ViewState, card_cells, truncate};
use crate::gallery::Gallery;
use crate::layout::{Item, Reveal};
use crate::lazy::LoadState;

/// Kitty image id used for the lightbox picture.
const LIGHTBOX_IMAGE_ID: u32 = 1;

// ---------------------------------------------------------------------------
// RawGuard: restores raw mode / alternate screen / mouse capture on Drop
// ---------------------------------------------------------------------------

pub(super) struct RawGuard {
    cleaned: bool,
}

impl RawGuard {
    pub(super) fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        stdout().execute(terminal::EnterAlternateScreen)?;
        stdout().execute(event::EnableMouseCapture)?;
        stdout().execute(cursor::Hide)?;
        Ok(Self { cleaned: false })
    }

    pub(super) fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;
        let mut out = stdout();
        let _ = write!(out, "\x1b_Ga=d,d=A,q=2\x1b\\");
        let _ = out.execute(cursor::Show);
        let _ = out.execute(event::DisableMouseCapture);
        let _ = out.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

impl Drop for RawGuard {
    fn drop(&mut self) {
        self.cleanup();
    }
}

pub(super) fn check_tty() -> anyhow::Result<()> {
    use std::io::IsTerminal;
    // Only stdout matters. crossterm's `use-dev-tty` reads keyboard from /dev/tty
    // (Unix) or Console API (Windows), so stdin being a pipe is always fine.
    if !io::stdout().is_terminal() {
        anyhow::bail!(
            "photowall viewer requires an interactive terminal.\n\
             \n\
             To list the discovered images instead, use: photowall discover <base>"
        );
    }
    Ok(())
}

/// Whether the terminal understands the Kitty graphics protocol.
pub(super) fn kitty_supported() -> bool {
    let term = std::env::var("TERM").unwrap_or_default();
    let program = std::env::var("TERM_PROGRAM").unwrap_or_default();
    term.contains("kitty")
        || term.contains("ghostty")
        || matches!(program.as_str(), "WezTerm" | "ghostty")
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

/// Absolute path of a local PNG the terminal can read itself (`t=f`).
///
/// The terminal resolves relative paths against its own working directory,
/// so the path is canonicalized. `None` means fall back to the text view.
pub(super) fn kitty_file_path(local: Option<&Path>) -> Option<PathBuf> {
    let path = local.filter(|p| is_png(p))?;
    match path.canonicalize() {
        Ok(abs) => Some(abs),
        Err(e) => {
            debug!("lightbox: cannot resolve {}: {e}", path.display());
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Kitty protocol helpers
// ---------------------------------------------------------------------------

/// Transmit-and-display a PNG file by path (`t=f`), scaled into a cell box.
fn place_file_image(path: &Path, col: u16, row: u16, cols: u16, rows: u16) -> io::Result<()> {
    let encoded = BASE64.encode(path.as_os_str().as_encoded_bytes());
    let mut out = stdout();
    out.queue(cursor::MoveTo(col, row))?;
    write!(
        out,
        "\x1b_Ga=T,f=100,t=f,i={LIGHTBOX_IMAGE_ID},c={cols},r={rows},C=1,q=2;{encoded}\x1b\\"
    )?;
    out.flush()
}

/// Delete every placed image and its data.
pub(super) fn delete_all_images() -> io::Result<()> {
    let mut out = stdout();
    write!(out, "\x1b_Ga=d,d=A,q=2\x1b\\")?;
    out.flush()
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Text shown inside a card.
pub(super) fn card_label(item: &Item, location: &str) -> (String, Option<String>) {
    match item.load {
        LoadState::Placeholder => (format!("· {} ·", item.id.name()), None),
        LoadState::Promoted => (
            format!("#{} {}", item.position + 1, item.id.name()),
            Some(location.to_string()),
        ),
    }
}

/// Draw every card intersecting the viewport. Entering items are skipped
/// until the next paint.
pub(super) fn draw_grid(screen: &Screen, gallery: &Gallery, state: &ViewState) -> io::Result<()> {
    let mut out = stdout();
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let layout = gallery.layout();
    let width_px = screen.width_px();

    if gallery.resources().is_empty() {
        out.flush()?;
        return Ok(());
    }

    for position in layout.visible_positions(state.y_offset, state.vp_h) {
        let Some(item) = layout.item(position) else {
            continue;
        };
        if item.reveal == Reveal::Entering {
            continue;
        }
        let Some(rect) = layout.item_rect(position, width_px) else {
            continue;
        };
        let Some(cells) = card_cells(rect, state.y_offset, screen) else {
            continue;
        };
        let location = gallery.base().locate(&item.id);
        let (title, detail) = card_label(item, &location);
        let inner = cells.width.saturating_sub(2) as usize;

        for r in 0..cells.height {
            let card_row = r + cells.clipped_top;
            let full_height = cells.height + cells.clipped_top;
            let line = if card_row == 0 {
                format!("┌{}┐", "─".repeat(inner))
            } else if card_row + 1 == full_height && cells.row + r + 1 < screen.grid_rows {
                format!("└{}┘", "─".repeat(inner))
            } else if card_row == 1 {
                format!("│{:^inner$}│", truncate(&title, inner))
            } else if card_row == 2 {
                let d = detail.as_deref().unwrap_or("");
                format!("│{:^inner$}│", truncate(d, inner))
            } else {
                format!("│{}│", " ".repeat(inner))
            };
            out.queue(cursor::MoveTo(cells.col, cells.row + r))?;
            match item.load {
                LoadState::Placeholder => write!(out, "{}", line.dark_grey())?,
                LoadState::Promoted => write!(out, "{}", line.white())?,
            }
        }
    }
    out.queue(style::ResetColor)?;
    out.flush()
}

/// Centered message in the grid area (empty gallery, discovering...).
pub(super) fn draw_notice(screen: &Screen, msg: &str) -> io::Result<()> {
    let mut out = stdout();
    let row = screen.grid_rows / 2;
    let text = truncate(msg, screen.cols as usize);
    let col = (screen.cols as usize).saturating_sub(text.chars().count()) / 2;
    out.queue(cursor::MoveTo(col as u16, row))?;
    write!(out, "{}", text.dark_grey())?;
    out.queue(style::ResetColor)?;
    out.flush()
}

// ---------------------------------------------------------------------------
// Lightbox
// ---------------------------------------------------------------------------

pub(super) fn draw_lightbox(screen: &Screen, gallery: &Gallery, kitty: bool) -> io::Result<()> {
    let mut out = stdout();
    delete_all_images()?;
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let (Some(index), Some(id)) = (gallery.lightbox().current(), gallery.current()) else {
        return out.flush();
    };
    let total = gallery.resources().len();
    let cols = screen.cols as usize;

    // Navigation affordances on the edges, close marker top-right.
    let mid = screen.grid_rows / 2;
    out.queue(cursor::MoveTo(1, mid))?;
    write!(out, "{}", "‹".white().bold())?;
    out.queue(cursor::MoveTo(screen.cols.saturating_sub(2), mid))?;
    write!(out, "{}", "›".white().bold())?;
    out.queue(cursor::MoveTo(screen.cols.saturating_sub(2), 0))?;
    write!(out, "{}", "×".white().bold())?;

    let local = gallery.base().local_path(id);
    let image = if kitty {
        kitty_file_path(local.as_deref())
    } else {
        None
    };
    let shown = match &image {
        Some(path) => {
            let cols = screen.cols.saturating_sub(8).max(1);
            let rows = screen.grid_rows.saturating_sub(4).max(1);
            place_file_image(path, 4, 2, cols, rows)?;
            true
        }
        None => false,
    };

    let name = id.name();
    let location = gallery.base().locate(id);
    let counter = format!("{} / {}", index + 1, total);
    let lines: Vec<String> = if shown {
        vec![counter]
    } else {
        vec![name, truncate(&location, cols.saturating_sub(8)), counter]
    };
    let start = if shown {
        screen.grid_rows.saturating_sub(1)
    } else {
        mid.saturating_sub(1)
    };
    for (i, line) in lines.iter().enumerate() {
        let text = truncate(line, cols);
        let col = cols.saturating_sub(text.chars().count()) / 2;
        out.queue(cursor::MoveTo(col as u16, start + i as u16))?;
        if i == 0 && !shown {
            write!(out, "{}", text.white().bold())?;
        } else {
            write!(out, "{}", text.grey())?;
        }
    }
    out.queue(style::ResetColor)?;
    out.flush()
}

// ---------------------------------------------------------------------------
// Status bar
// ---------------------------------------------------------------------------

pub(super) struct StatusInfo<'a> {
    pub base: &'a str,
    pub found: usize,
    pub discovering: bool,
    pub columns: usize,
    pub lightbox: bool,
}

/// Draw the status bar on the last terminal row.
///
/// `acc_peek`: shows `:12_` while a count prefix is being typed.
/// `flash`: one-shot message, cleared on the next key press.
pub(super) fn draw_status_bar(
    screen: &Screen,
    info: &StatusInfo,
    state: &ViewState,
    acc_peek: Option<u32>,
    flash: Option<&str>,
) -> io::Result<()> {
    let mut out = stdout();
    out.queue(cursor::MoveTo(0, screen.status_row))?;

    let progress = if info.discovering {
        format!("{} found, discovering…", info.found)
    } else {
        format!("{} image(s)", info.found)
    };
    let hints = if info.lightbox {
        "[←/→:prev/next esc:close o:open q:quit]"
    } else {
        "[j/k d/u g/G Ng:goto enter:view r:rescan q:quit]"
    };

    let middle = if let Some(msg) = flash {
        format!(" {} | {progress} | {msg}", info.base)
    } else if let Some(n) = acc_peek {
        format!(" {} | {progress} | :{n}_", info.base)
    } else {
        format!(
            " {} | {progress} | {} col | {}%  {hints}",
            info.base,
            info.columns,
            state.percent()
        )
    };

    let padded = format!(
        "{:<width$}",
        truncate(&middle, screen.cols as usize),
        width = screen.cols as usize
    );
    write!(out, "{}", padded.on_dark_grey().white())?;
    out.queue(style::ResetColor)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceId;

    fn item(load: LoadState) -> Item {
        Item {
            position: 6,
            id: ResourceId::new(7, "webp"),
            load,
            reveal: Reveal::Visible,
        }
    }

    #[test]
    fn placeholder_label_hides_location() {
        let (title, detail) = card_label(&item(LoadState::Placeholder), "./p/7.webp");
        assert_eq!(title, "· 7.webp ·");
        assert!(detail.is_none());
    }

    #[test]
    fn promoted_label_shows_location() {
        let (title, detail) = card_label(&item(LoadState::Promoted), "./p/7.webp");
        assert_eq!(title, "#7 7.webp");
        assert_eq!(detail.as_deref(), Some("./p/7.webp"));
    }

    #[test]
    fn png_detection() {
        assert!(is_png(Path::new("/x/1.PNG")));
        assert!(!is_png(Path::new("/x/1.webp")));
    }

    #[test]
    fn kitty_path_is_absolute() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("3.png"), b"").unwrap();
        // A path with a `.` component, like the default `./photos_webp` base.
        let dotted = dir.path().join(".").join("3.png");

        let resolved = kitty_file_path(Some(dotted.as_path())).unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved, dir.path().canonicalize().unwrap().join("3.png"));
    }

    #[test]
    fn kitty_path_falls_back_for_missing_or_non_png() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1.webp"), b"").unwrap();
        assert!(kitty_file_path(Some(dir.path().join("1.webp").as_path())).is_none());
        assert!(kitty_file_path(Some(dir.path().join("2.png").as_path())).is_none());
        assert!(kitty_file_path(None).is_none());
    }
}
