//! Lightbox mode handler.

use super::Effect;
use super::input::LightboxAction;

pub(super) fn handle(action: LightboxAction) -> Vec<Effect> {
    match action {
        LightboxAction::Quit => vec![Effect::Exit],
        LightboxAction::Close => vec![Effect::CloseLightbox],
        LightboxAction::Next => vec![Effect::LightboxNext],
        LightboxAction::Previous => vec![Effect::LightboxPrevious],
        LightboxAction::OpenExternal => vec![Effect::OpenExternal],
    }
}
