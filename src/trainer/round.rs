//! Round state machine: play a symbol, judge one keystroke, feed the result
//! to the scheduler, repeat until both queues are empty.

use std::time::{Duration, Instant};

use crossbeam_channel::{select, Receiver};
use rand::Rng;

use super::scheduler::{Promotion, Scheduler};
use crate::cw::Symbol;
use crate::error::TrainerError;
use crate::input::InputEvent;
use crate::playback::{CancelToken, Feedback, Playback, PlaybackFinished, PlaybackJob};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    Idle,
    Playing,
    AwaitingInput,
    Paused,
    Complete,
}

/// Why `run` returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Completed,
    Quit,
}

/// Round timings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundTiming {
    /// Answers slower than this count as misses
    pub time_to_guess: Duration,
    /// Wait before the very first symbol
    pub start_delay: Duration,
    /// Wait before the first symbol after a resume
    pub resume_delay: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub rounds: u32,
    pub correct: u32,
    pub too_slow: u32,
    pub wrong: u32,
    /// Rounds counted as misses because the session was paused mid-round
    pub forced_misses: u32,
}

pub struct RoundMachine<P: Playback, R: Rng> {
    scheduler: Scheduler<R>,
    playback: P,
    timing: RoundTiming,
    state: RoundState,
    expected: Option<Symbol>,
    /// When the pattern finished; the response window starts here
    awaiting_since: Option<Instant>,
    /// Token of the job currently on the playback channel
    in_flight: Option<CancelToken>,
    lead_in: Duration,
    stats: SessionStats,
}

impl<P: Playback, R: Rng> RoundMachine<P, R> {
    pub fn new(scheduler: Scheduler<R>, playback: P, timing: RoundTiming) -> Self {
        Self {
            scheduler,
            playback,
            timing,
            state: RoundState::Idle,
            expected: None,
            awaiting_since: None,
            in_flight: None,
            lead_in: timing.start_delay,
            stats: SessionStats::default(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn scheduler(&self) -> &Scheduler<R> {
        &self.scheduler
    }

    #[cfg(test)]
    pub fn expected(&self) -> Option<Symbol> {
        self.expected
    }

    #[cfg(test)]
    pub fn is_playing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Idle -> Playing when nothing is in flight, or Idle -> Complete when
    /// there is nothing left to play
    pub fn advance(&mut self) {
        if self.state != RoundState::Idle || self.in_flight.is_some() {
            return;
        }

        if self.scheduler.is_complete() {
            tracing::info!(target: "round", "all symbols learned");
            self.state = RoundState::Complete;
            return;
        }

        let symbol = match self.scheduler.peek_next() {
            Ok(symbol) => symbol,
            Err(TrainerError::TrainingComplete) => {
                tracing::info!(target: "round", "all symbols learned");
                self.state = RoundState::Complete;
                return;
            }
            Err(e) => {
                tracing::error!(target: "round", "scheduler failed: {}", e);
                self.state = RoundState::Complete;
                return;
            }
        };

        tracing::debug!(
            target: "round",
            "next {} ({} queued, {} waiting)",
            symbol,
            self.scheduler.main_len(),
            self.scheduler.back_queue().len()
        );

        let token = CancelToken::new();
        let lead_in = std::mem::take(&mut self.lead_in);
        self.playback.play_pattern(symbol, lead_in, token.clone());
        self.in_flight = Some(token);
        self.expected = Some(symbol);
        self.awaiting_since = None;
        self.state = RoundState::Playing;
    }

    /// Completion report from the playback channel
    pub fn on_playback_finished(&mut self, finished: PlaybackFinished) {
        self.in_flight = None;

        match (self.state, finished.job) {
            (RoundState::Playing, PlaybackJob::Pattern { .. }) if !finished.cancelled => {
                self.awaiting_since = Some(finished.at);
                self.state = RoundState::AwaitingInput;
            }
            (RoundState::Idle, _) => self.advance(),
            _ => {}
        }
    }

    /// Returns false once the session should stop
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::Quit => {
                self.cancel_in_flight();
                return false;
            }
            InputEvent::PauseToggle => match self.state {
                RoundState::Paused => self.resume(),
                RoundState::Complete => {}
                _ => self.pause(),
            },
            InputEvent::Key { ch, at } => {
                if self.state == RoundState::AwaitingInput && ch.is_ascii_alphanumeric() {
                    self.judge(ch, at);
                } else {
                    tracing::trace!(target: "round", "ignored {:?} in {:?}", ch, self.state);
                }
            }
        }
        self.state != RoundState::Complete
    }

    fn judge(&mut self, ch: char, at: Instant) {
        let (Some(expected), Some(since)) = (self.expected, self.awaiting_since) else {
            return;
        };

        // Pressed while the pattern was still playing
        if at < since {
            tracing::trace!(target: "round", "dropped {:?} pressed during playback", ch);
            return;
        }

        let elapsed = at.duration_since(since);
        let correct = Symbol::new(ch).is_ok_and(|symbol| symbol == expected);
        let too_slow = elapsed > self.timing.time_to_guess;

        let feedback = match (correct, too_slow) {
            (true, false) => Feedback::Correct,
            (true, true) => Feedback::TooSlow,
            (false, _) => Feedback::Error,
        };
        tracing::info!(
            target: "round",
            "expected {} got {} in {:?}: {:?}",
            expected,
            ch,
            elapsed,
            feedback
        );

        self.stats.rounds += 1;
        match feedback {
            Feedback::Correct => self.stats.correct += 1,
            Feedback::TooSlow => self.stats.too_slow += 1,
            Feedback::Error => self.stats.wrong += 1,
        }

        let token = CancelToken::new();
        self.playback.play_feedback(feedback, expected, token.clone());
        self.in_flight = Some(token);

        self.record(feedback == Feedback::Correct);
        self.awaiting_since = None;
        self.state = RoundState::Idle;
    }

    fn pause(&mut self) {
        self.cancel_in_flight();

        // Every pause scores the front of the main queue as a miss, even
        // when its round has not started yet
        if self.record(false) {
            self.stats.forced_misses += 1;
        }

        self.playback.reset_display();
        self.playback.show_paused(true);
        self.awaiting_since = None;
        self.state = RoundState::Paused;
        tracing::info!(target: "round", "paused");
    }

    fn resume(&mut self) {
        self.playback.show_paused(false);
        self.lead_in = self.timing.resume_delay;
        self.state = RoundState::Idle;
        tracing::info!(target: "round", "resumed");
        self.advance();
    }

    /// Returns false when the main queue had nothing to score
    fn record(&mut self, correct: bool) -> bool {
        match self.scheduler.record_result(correct) {
            Ok(Promotion::Learned(symbol)) => {
                self.playback.notify_learned(symbol);
                true
            }
            Ok(Promotion::Rescheduled { position, streak }) => {
                tracing::debug!(
                    target: "round",
                    "rescheduled at {} with streak {}",
                    position,
                    streak
                );
                true
            }
            Err(e) => {
                tracing::warn!(target: "round", "nothing to record: {}", e);
                false
            }
        }
    }

    fn cancel_in_flight(&self) {
        if let Some(token) = &self.in_flight {
            token.cancel();
        }
    }

    /// Drive the machine from the input and playback channels until the
    /// session completes or the learner quits
    pub fn run(
        &mut self,
        input: &Receiver<InputEvent>,
        finished: &Receiver<PlaybackFinished>,
    ) -> SessionEnd {
        self.advance();

        while self.state != RoundState::Complete {
            select! {
                recv(input) -> event => match event {
                    Ok(event) => {
                        if !self.handle_input(event) && self.state != RoundState::Complete {
                            return SessionEnd::Quit;
                        }
                    }
                    Err(_) => {
                        tracing::warn!(target: "round", "input closed");
                        self.cancel_in_flight();
                        return SessionEnd::Quit;
                    }
                },
                recv(finished) -> done => match done {
                    Ok(done) => self.on_playback_finished(done),
                    Err(_) => {
                        tracing::error!(target: "round", "playback worker gone");
                        return SessionEnd::Quit;
                    }
                },
            }
        }
        SessionEnd::Completed
    }

    /// Hand back the playback side, e.g. to shut the worker down
    pub fn into_playback(self) -> P {
        self.playback
    }
}
