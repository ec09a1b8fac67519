use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::{CancelToken, Feedback, PlaybackTiming};
use crate::cw::{element_gap, mark_duration, symbol_duration, Symbol};
use crate::display::{Border, SharedSurface, Sounder};

/// Longest uninterrupted sleep inside a feedback hold
const HOLD_SLICE: Duration = Duration::from_millis(20);

/// Carries out playback jobs on the worker thread
pub(super) struct Renderer {
    surface: SharedSurface,
    sounder: Arc<dyn Sounder>,
    timing: PlaybackTiming,
}

impl Renderer {
    pub(super) fn new(
        surface: SharedSurface,
        sounder: Arc<dyn Sounder>,
        timing: PlaybackTiming,
    ) -> Self {
        Self {
            surface,
            sounder,
            timing,
        }
    }

    /// Key a symbol mark by mark. Returns false if cancelled before the end.
    pub(super) fn play_pattern(
        &self,
        symbol: Symbol,
        lead_in: Duration,
        token: &CancelToken,
    ) -> bool {
        if !lead_in.is_zero() && !self.hold(lead_in, token) {
            return false;
        }

        let dit = self.timing.dit;
        tracing::trace!(
            target: "playback",
            "keying {} over {:?}",
            symbol,
            symbol_duration(symbol, dit)
        );
        for (i, mark) in symbol.pattern().into_iter().enumerate() {
            if token.is_cancelled() {
                tracing::debug!(target: "playback", "{} cancelled before mark {}", symbol, i);
                return false;
            }

            if i > 0 {
                thread::sleep(element_gap(dit));
                if token.is_cancelled() {
                    tracing::debug!(target: "playback", "{} cancelled before mark {}", symbol, i);
                    return false;
                }
            }

            self.key(mark_duration(mark, dit));
        }
        true
    }

    pub(super) fn play_feedback(
        &self,
        kind: Feedback,
        symbol: Symbol,
        token: &CancelToken,
    ) -> bool {
        if token.is_cancelled() {
            return false;
        }

        match kind {
            Feedback::Correct => {
                self.surface.lock().set_border(Border::Correct);
                if !self.hold(self.timing.correct_flash, token) {
                    return false;
                }
                self.surface.lock().set_border(Border::Normal);
                self.hold(self.timing.correct_settle, token)
            }
            Feedback::Error | Feedback::TooSlow => {
                let border = if kind == Feedback::TooSlow {
                    Border::TooSlow
                } else {
                    Border::Error
                };
                {
                    let mut surface = self.surface.lock();
                    surface.set_border(border);
                    surface.set_caption(Some(symbol));
                }
                if !self.hold(self.timing.reveal_hold, token) {
                    return false;
                }
                if !self.play_pattern(symbol, Duration::ZERO, token) {
                    return false;
                }
                if !self.hold(self.timing.replay_hold, token) {
                    return false;
                }
                {
                    let mut surface = self.surface.lock();
                    surface.set_border(Border::Normal);
                    surface.set_caption(None);
                }
                self.hold(self.timing.settle, token)
            }
        }
    }

    /// Return the surface to neutral after an aborted job
    pub(super) fn clear(&self) {
        self.sounder.tone_off();
        self.surface.lock().reset();
    }

    fn key(&self, duration: Duration) {
        self.sounder.tone_on();
        self.surface.lock().set_lamp(true);

        thread::sleep(duration);

        self.sounder.tone_off();
        self.surface.lock().set_lamp(false);
    }

    /// Sleep in short slices; false if cancelled on the way
    fn hold(&self, duration: Duration, token: &CancelToken) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if token.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(HOLD_SLICE));
        }
    }
}
