//! Grid mode handler: scrolling, jumping, opening the lightbox.

use log::debug;

use super::Effect;
use super::input::GridAction;
use super::state::ViewState;
use crate::layout::Layout;

pub(super) struct GridCtx<'a> {
    pub state: &'a ViewState,
    pub layout: &'a Layout,
    pub width_px: u32,
    pub item_count: usize,
    pub max_scroll: u32,
    pub scroll_step: u32,
    pub half_page: u32,
}

/// 1-based item number → position, if in range.
fn item_position(n: u32, count: usize) -> Option<usize> {
    let n = n as usize;
    (1..=count).contains(&n).then(|| n - 1)
}

fn out_of_range(n: u32, count: usize) -> Effect {
    Effect::Flash(format!("Item {n} out of range (max {count})"))
}

pub(super) fn handle(action: GridAction, ctx: &GridCtx) -> Vec<Effect> {
    match action {
        GridAction::Quit => vec![Effect::Exit],

        GridAction::CancelInput | GridAction::Digit => vec![Effect::RedrawStatusBar],

        GridAction::ScrollDown(count) => {
            let y = ctx
                .state
                .y_offset
                .saturating_add(count.saturating_mul(ctx.scroll_step))
                .min(ctx.max_scroll);
            debug!(
                "scroll down: y_offset {} → {} (count={count}, step={}, max={})",
                ctx.state.y_offset, y, ctx.scroll_step, ctx.max_scroll
            );
            vec![Effect::ScrollTo(y)]
        }
        GridAction::ScrollUp(count) => {
            let y = ctx
                .state
                .y_offset
                .saturating_sub(count.saturating_mul(ctx.scroll_step));
            debug!(
                "scroll up: y_offset {} → {} (count={count}, step={})",
                ctx.state.y_offset, y, ctx.scroll_step
            );
            vec![Effect::ScrollTo(y)]
        }
        GridAction::HalfPageDown(count) => {
            let y = ctx
                .state
                .y_offset
                .saturating_add(count.saturating_mul(ctx.half_page))
                .min(ctx.max_scroll);
            debug!("scroll half-down: y_offset {} → {}", ctx.state.y_offset, y);
            vec![Effect::ScrollTo(y)]
        }
        GridAction::HalfPageUp(count) => {
            let y = ctx
                .state
                .y_offset
                .saturating_sub(count.saturating_mul(ctx.half_page));
            debug!("scroll half-up: y_offset {} → {}", ctx.state.y_offset, y);
            vec![Effect::ScrollTo(y)]
        }

        GridAction::JumpToTop => vec![Effect::ScrollTo(0)],
        GridAction::JumpToBottom => vec![Effect::ScrollTo(ctx.max_scroll)],
        GridAction::JumpToItem(n) => {
            let Some(position) = item_position(n, ctx.item_count) else {
                return vec![out_of_range(n, ctx.item_count)];
            };
            match ctx.layout.item_rect(position, ctx.width_px) {
                Some(rect) => {
                    let y = rect.y.min(ctx.max_scroll);
                    debug!("jump to item {n}: y_offset {} → {y}", ctx.state.y_offset);
                    vec![Effect::ScrollTo(y)]
                }
                None => vec![out_of_range(n, ctx.item_count)],
            }
        }

        GridAction::Open(Some(n)) => match item_position(n, ctx.item_count) {
            Some(position) => vec![Effect::OpenLightbox(position)],
            None => vec![out_of_range(n, ctx.item_count)],
        },
        GridAction::Open(None) => {
            let first = ctx
                .layout
                .visible_positions(ctx.state.y_offset, ctx.state.vp_h)
                .first()
                .copied();
            match first {
                Some(position) => vec![Effect::OpenLightbox(position)],
                None => vec![Effect::Flash("No image in view".into())],
            }
        }

        GridAction::Rediscover => vec![Effect::Rediscover],
    }
}
