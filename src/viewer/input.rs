//! Input processing layer: key/mouse mapping and numeric prefix accumulator.
//!
//! Pure logic, no I/O. All functions are deterministic and testable.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

const MAX_COUNT: u32 = 999_999;

/// Accumulated numeric prefix for vim/less-style commands.
///
/// Users type digits then a command character: `12g` jumps to item 12,
/// `10j` scrolls 10 steps down.
pub(super) struct InputAccumulator {
    count: Option<u32>,
}

impl InputAccumulator {
    pub(super) fn new() -> Self {
        Self { count: None }
    }

    /// Feed a digit (0..=9). Returns false if overflow would occur.
    fn push_digit(&mut self, d: u32) -> bool {
        let current = self.count.unwrap_or(0);
        let new = current.saturating_mul(10).saturating_add(d);
        if new > MAX_COUNT {
            return false; // ignore further digits
        }
        self.count = Some(new);
        true
    }

    fn take(&mut self) -> Option<u32> {
        self.count.take()
    }

    pub(super) fn peek(&self) -> Option<u32> {
        self.count
    }

    pub(super) fn reset(&mut self) {
        self.count = None;
    }

    pub(super) fn is_active(&self) -> bool {
        self.count.is_some()
    }
}

/// Grid-mode actions.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum GridAction {
    Quit,
    ScrollDown(u32),
    ScrollUp(u32),
    HalfPageDown(u32),
    HalfPageUp(u32),
    JumpToTop,
    JumpToBottom,
    /// 1-based item number.
    JumpToItem(u32),
    /// Open the lightbox: on item N if a prefix was typed, else on the
    /// first visible item.
    Open(Option<u32>),
    Rediscover,
    CancelInput,
    /// A digit was accumulated; caller should redraw status bar.
    Digit,
}

/// Lightbox-mode actions.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum LightboxAction {
    Quit,
    Close,
    Next,
    Previous,
    OpenExternal,
}

/// Map a key event in grid mode, consuming/updating the accumulator.
///
/// Returns `None` for unknown keys (caller should reset accumulator).
pub(super) fn map_grid_key(key: KeyEvent, acc: &mut InputAccumulator) -> Option<GridAction> {
    let KeyEvent { code, modifiers, .. } = key;

    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            Some(GridAction::Quit)
        }

        (KeyCode::Esc, _) => {
            acc.reset();
            Some(GridAction::CancelInput)
        }

        (KeyCode::Char(c @ '0'..='9'), KeyModifiers::NONE) => {
            let d = c as u32 - '0' as u32;
            acc.push_digit(d);
            Some(GridAction::Digit)
        }

        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => {
            Some(GridAction::ScrollDown(acc.take().unwrap_or(1)))
        }
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => {
            Some(GridAction::ScrollUp(acc.take().unwrap_or(1)))
        }
        (KeyCode::Char('d'), _) | (KeyCode::PageDown, _) => {
            Some(GridAction::HalfPageDown(acc.take().unwrap_or(1)))
        }
        (KeyCode::Char('u'), _) | (KeyCode::PageUp, _) => {
            Some(GridAction::HalfPageUp(acc.take().unwrap_or(1)))
        }
        (KeyCode::Char('g'), _) | (KeyCode::Home, _) => match acc.take() {
            None => Some(GridAction::JumpToTop),
            Some(n) => Some(GridAction::JumpToItem(n)),
        },
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => match acc.take() {
            None => Some(GridAction::JumpToBottom),
            Some(n) => Some(GridAction::JumpToItem(n)),
        },
        (KeyCode::Enter, _) | (KeyCode::Char('o'), _) => Some(GridAction::Open(acc.take())),
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            acc.reset();
            Some(GridAction::Rediscover)
        }

        _ => None,
    }
}

/// Map a key event while the lightbox is open.
pub(super) fn map_lightbox_key(key: KeyEvent) -> Option<LightboxAction> {
    let KeyEvent { code, modifiers, .. } = key;
    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            Some(LightboxAction::Quit)
        }
        (KeyCode::Esc, _) => Some(LightboxAction::Close),
        (KeyCode::Left, _) | (KeyCode::Char('h'), _) => Some(LightboxAction::Previous),
        (KeyCode::Right, _) | (KeyCode::Char('l'), _) | (KeyCode::Char(' '), _) => {
            Some(LightboxAction::Next)
        }
        (KeyCode::Char('o'), _) => Some(LightboxAction::OpenExternal),
        _ => None,
    }
}

/// Left-button press position (column, row); other mouse events are ignored.
pub(super) fn map_click(ev: MouseEvent) -> Option<(u16, u16)> {
    match ev.kind {
        MouseEventKind::Down(MouseButton::Left) => Some((ev.column, ev.row)),
        _ => None,
    }
}

/// Mouse wheel in grid mode.
pub(super) fn map_wheel(ev: MouseEvent) -> Option<GridAction> {
    match ev.kind {
        MouseEventKind::ScrollDown => Some(GridAction::ScrollDown(1)),
        MouseEventKind::ScrollUp => Some(GridAction::ScrollUp(1)),
        _ => None,
    }
}

/// Where a click inside the lightbox lands: left third, middle, right third.
pub(super) fn lightbox_click(column: u16, total_cols: u16) -> LightboxAction {
    let third = (total_cols / 3).max(1);
    if column < third {
        LightboxAction::Previous
    } else if column >= total_cols.saturating_sub(third) {
        LightboxAction::Next
    } else {
        LightboxAction::Close
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn simple_key(code: KeyCode) -> KeyEvent {
        key(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_5j_scroll_down() {
        let mut acc = InputAccumulator::new();
        let a = map_grid_key(simple_key(KeyCode::Char('5')), &mut acc);
        assert_eq!(a, Some(GridAction::Digit));
        let a = map_grid_key(simple_key(KeyCode::Char('j')), &mut acc);
        assert_eq!(a, Some(GridAction::ScrollDown(5)));
    }

    #[test]
    fn test_12g_jumps_to_item() {
        let mut acc = InputAccumulator::new();
        map_grid_key(simple_key(KeyCode::Char('1')), &mut acc);
        map_grid_key(simple_key(KeyCode::Char('2')), &mut acc);
        let a = map_grid_key(simple_key(KeyCode::Char('g')), &mut acc);
        assert_eq!(a, Some(GridAction::JumpToItem(12)));
        assert!(!acc.is_active());
    }

    #[test]
    fn test_g_without_prefix_jumps_top() {
        let mut acc = InputAccumulator::new();
        let a = map_grid_key(simple_key(KeyCode::Char('g')), &mut acc);
        assert_eq!(a, Some(GridAction::JumpToTop));
    }

    #[test]
    fn test_enter_opens_with_prefix() {
        let mut acc = InputAccumulator::new();
        assert_eq!(
            map_grid_key(simple_key(KeyCode::Enter), &mut acc),
            Some(GridAction::Open(None))
        );
        map_grid_key(simple_key(KeyCode::Char('3')), &mut acc);
        assert_eq!(
            map_grid_key(simple_key(KeyCode::Enter), &mut acc),
            Some(GridAction::Open(Some(3)))
        );
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut acc = InputAccumulator::new();
        let a = map_grid_key(key(KeyCode::Char('c'), KeyModifiers::CONTROL), &mut acc);
        assert_eq!(a, Some(GridAction::Quit));
    }

    #[test]
    fn test_esc_cancels_input() {
        let mut acc = InputAccumulator::new();
        map_grid_key(simple_key(KeyCode::Char('5')), &mut acc);
        assert!(acc.is_active());
        let a = map_grid_key(simple_key(KeyCode::Esc), &mut acc);
        assert_eq!(a, Some(GridAction::CancelInput));
        assert!(!acc.is_active());
    }

    #[test]
    fn test_digit_overflow_is_ignored() {
        let mut acc = InputAccumulator::new();
        for _ in 0..10 {
            map_grid_key(simple_key(KeyCode::Char('9')), &mut acc);
        }
        assert_eq!(acc.peek(), Some(999_999));
    }

    #[test]
    fn test_unknown_key_returns_none() {
        let mut acc = InputAccumulator::new();
        assert!(map_grid_key(simple_key(KeyCode::Char('x')), &mut acc).is_none());
    }

    #[test]
    fn test_lightbox_keys() {
        assert_eq!(map_lightbox_key(simple_key(KeyCode::Esc)), Some(LightboxAction::Close));
        assert_eq!(map_lightbox_key(simple_key(KeyCode::Left)), Some(LightboxAction::Previous));
        assert_eq!(map_lightbox_key(simple_key(KeyCode::Right)), Some(LightboxAction::Next));
        assert_eq!(map_lightbox_key(simple_key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_lightbox_click_thirds() {
        assert_eq!(lightbox_click(0, 90), LightboxAction::Previous);
        assert_eq!(lightbox_click(45, 90), LightboxAction::Close);
        assert_eq!(lightbox_click(89, 90), LightboxAction::Next);
    }

    #[test]
    fn test_only_left_press_is_a_click() {
        let ev = |kind| MouseEvent {
            kind,
            column: 4,
            row: 7,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(map_click(ev(MouseEventKind::Down(MouseButton::Left))), Some((4, 7)));
        assert_eq!(map_click(ev(MouseEventKind::Up(MouseButton::Left))), None);
        assert_eq!(map_click(ev(MouseEventKind::ScrollDown)), None);
    }
}
