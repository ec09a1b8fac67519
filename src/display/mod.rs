//! Presentation surface: the flashing lamp, coloured frame, caption,
//! paused indicator and learned-symbols header.

mod terminal;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::cw::Symbol;

pub use terminal::TerminalSurface;

/// Frame colour around the lamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Border {
    #[default]
    Normal,
    Correct,
    Error,
    TooSlow,
}

/// Anything that can show a training round
pub trait Surface: Send {
    fn set_lamp(&mut self, on: bool);
    fn set_border(&mut self, border: Border);
    fn set_caption(&mut self, caption: Option<Symbol>);
    fn set_paused(&mut self, paused: bool);
    /// `fresh` highlights the count right after a new symbol was learned
    fn set_learned(&mut self, learned: &[Symbol], fresh: bool);

    /// Neutral state: lamp off, normal frame, no caption
    fn reset(&mut self) {
        self.set_lamp(false);
        self.set_border(Border::Normal);
        self.set_caption(None);
    }
}

/// Surface shared between the round loop, the playback worker and the
/// learned notifier
pub type SharedSurface = Arc<Mutex<dyn Surface>>;

/// Keys a tone on and off alongside the lamp
pub trait Sounder: Send + Sync {
    fn tone_on(&self);
    fn tone_off(&self);
}

/// Used when muted or when no audio backend is compiled in
pub struct Silent;

impl Sounder for Silent {
    fn tone_on(&self) {}
    fn tone_off(&self) {}
}
