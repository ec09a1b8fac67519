//! Playback channel: one worker thread that keys Morse patterns and feedback
//! animations onto the presentation surface.

mod cancel;
mod render;

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::cw::Symbol;
use crate::display::{SharedSurface, Sounder};

pub use cancel::CancelToken;
use render::Renderer;

/// Result flash shown after a judged answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Error,
    TooSlow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackJob {
    Pattern { symbol: Symbol, lead_in: Duration },
    Feedback { kind: Feedback, symbol: Symbol },
}

/// Sent by the worker when a job ends, normally or early
#[derive(Debug, Clone, Copy)]
pub struct PlaybackFinished {
    pub job: PlaybackJob,
    pub cancelled: bool,
    pub at: Instant,
}

/// Durations used by the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackTiming {
    pub dit: Duration,
    pub correct_flash: Duration,
    pub correct_settle: Duration,
    /// How long the answer is shown before it is replayed
    pub reveal_hold: Duration,
    pub replay_hold: Duration,
    pub settle: Duration,
    /// How long the learned count stays highlighted
    pub learned_flash: Duration,
}

/// What the round state machine needs from its presentation side
pub trait Playback {
    /// Start keying `symbol`; completion arrives as `PlaybackFinished`
    fn play_pattern(&mut self, symbol: Symbol, lead_in: Duration, token: CancelToken);
    fn play_feedback(&mut self, kind: Feedback, symbol: Symbol, token: CancelToken);
    fn reset_display(&mut self);
    fn show_paused(&mut self, paused: bool);
    /// Fire and forget
    fn notify_learned(&mut self, symbol: Symbol);
}

/// Handle to the playback worker thread
pub struct PlaybackChannel {
    job_tx: Option<Sender<(PlaybackJob, CancelToken)>>,
    surface: SharedSurface,
    learned: Arc<Mutex<Vec<Symbol>>>,
    learned_flash: Duration,
    worker: Option<JoinHandle<()>>,
}

impl PlaybackChannel {
    /// Spawn the worker. Completions are delivered on the returned receiver.
    pub fn spawn(
        surface: SharedSurface,
        sounder: Arc<dyn Sounder>,
        timing: PlaybackTiming,
    ) -> (Self, Receiver<PlaybackFinished>) {
        // One job at a time; the round loop never queues a second
        let (job_tx, job_rx) = bounded::<(PlaybackJob, CancelToken)>(1);
        let (done_tx, done_rx) = bounded::<PlaybackFinished>(1);

        let renderer = Renderer::new(Arc::clone(&surface), sounder, timing);
        let worker = thread::spawn(move || playback_thread(renderer, job_rx, done_tx));

        let channel = Self {
            job_tx: Some(job_tx),
            surface,
            learned: Arc::new(Mutex::new(Vec::new())),
            learned_flash: timing.learned_flash,
            worker: Some(worker),
        };
        (channel, done_rx)
    }

    fn submit(&self, job: PlaybackJob, token: CancelToken) {
        let Some(tx) = &self.job_tx else {
            return;
        };
        if tx.send((job, token)).is_err() {
            tracing::error!(target: "playback", "worker not responding, dropped {:?}", job);
        }
    }

    /// Stop the worker after its current job
    pub fn shutdown(&mut self) {
        self.job_tx = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Playback for PlaybackChannel {
    fn play_pattern(&mut self, symbol: Symbol, lead_in: Duration, token: CancelToken) {
        tracing::debug!(target: "playback", "play {} ({})", symbol, symbol.code());
        self.submit(PlaybackJob::Pattern { symbol, lead_in }, token);
    }

    fn play_feedback(&mut self, kind: Feedback, symbol: Symbol, token: CancelToken) {
        self.submit(PlaybackJob::Feedback { kind, symbol }, token);
    }

    fn reset_display(&mut self) {
        self.surface.lock().reset();
    }

    fn show_paused(&mut self, paused: bool) {
        self.surface.lock().set_paused(paused);
    }

    fn notify_learned(&mut self, symbol: Symbol) {
        self.learned.lock().push(symbol);

        let learned = Arc::clone(&self.learned);
        let surface = Arc::clone(&self.surface);
        let flash = self.learned_flash;
        thread::spawn(move || {
            let list = learned.lock().clone();
            surface.lock().set_learned(&list, true);

            thread::sleep(flash);

            let list = learned.lock().clone();
            surface.lock().set_learned(&list, false);
        });
    }
}

impl Drop for PlaybackChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn playback_thread(
    renderer: Renderer,
    job_rx: Receiver<(PlaybackJob, CancelToken)>,
    done_tx: Sender<PlaybackFinished>,
) {
    for (job, token) in job_rx {
        let completed = match job {
            PlaybackJob::Pattern { symbol, lead_in } => {
                renderer.play_pattern(symbol, lead_in, &token)
            }
            PlaybackJob::Feedback { kind, symbol } => renderer.play_feedback(kind, symbol, &token),
        };

        if !completed {
            renderer.clear();
        }

        let finished = PlaybackFinished {
            job,
            cancelled: !completed,
            at: Instant::now(),
        };
        if done_tx.send(finished).is_err() {
            break;
        }
    }
    tracing::debug!(target: "playback", "worker stopped");
}
