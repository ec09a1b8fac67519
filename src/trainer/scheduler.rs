//! Adaptive character scheduler.
//!
//! Symbols move one way: back queue -> main queue -> learned set. The main
//! queue is drilled front first; a correct answer pushes a symbol further
//! back each time, a miss restarts its ladder.

use std::collections::{BTreeMap, VecDeque};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::cw::{Symbol, ALPHABET_SIZE};
use crate::error::{Result, TrainerError};

/// Reinsert position for each streak value. A streak equal to the length
/// of this list retires the symbol.
pub const PROMOTION_OFFSETS: [usize; 4] = [3, 4, 6, 8];

/// Ideal number of symbols being drilled at once
pub const MAIN_QUEUE_TARGET: usize = 8;

/// New symbols are picked at random from this many at the front of the back queue
const INTRODUCE_WINDOW: usize = 3;

/// A symbol being drilled and its run of consecutive timely answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry {
    pub symbol: Symbol,
    pub streak: usize,
}

/// What `record_result` did with the front entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    Rescheduled { position: usize, streak: usize },
    Learned(Symbol),
}

pub struct Scheduler<R = StdRng> {
    back: Vec<Symbol>,
    main: VecDeque<QueueEntry>,
    learned: Vec<Symbol>,
    rng: R,
}

impl<R: Rng> Scheduler<R> {
    /// Build the back queue and start with empty main queue and learned set
    pub fn new(mut rng: R) -> Self {
        let back = initial_back_queue(&mut rng);
        tracing::debug!(target: "scheduler", "back queue: {}", describe(&back));

        Self {
            back,
            main: VecDeque::with_capacity(MAIN_QUEUE_TARGET + 1),
            learned: Vec::with_capacity(ALPHABET_SIZE),
            rng,
        }
    }

    /// Move one symbol, chosen among the first three, onto the end of the
    /// main queue
    pub fn introduce(&mut self) -> Result<Symbol> {
        if self.back.is_empty() {
            return Err(TrainerError::EmptyBackQueue);
        }

        let window = self.back.len().min(INTRODUCE_WINDOW);
        let idx = self.rng.random_range(0..window);
        let symbol = self.back.remove(idx);
        self.main.push_back(QueueEntry { symbol, streak: 0 });

        tracing::debug!(target: "scheduler", "introduced {}", symbol);
        Ok(symbol)
    }

    /// Top the main queue up towards its target size
    pub fn refill_main_queue(&mut self) {
        while self.main.len() < MAIN_QUEUE_TARGET && !self.back.is_empty() {
            if self.introduce().is_err() {
                break;
            }
        }
    }

    /// The symbol due next
    pub fn peek_next(&mut self) -> Result<Symbol> {
        self.refill_main_queue();

        self.main
            .front()
            .map(|entry| entry.symbol)
            .ok_or(TrainerError::TrainingComplete)
    }

    pub fn is_complete(&self) -> bool {
        self.back.is_empty() && self.main.is_empty()
    }

    /// Judge the front entry and move it along its promotion ladder
    pub fn record_result(&mut self, correct: bool) -> Result<Promotion> {
        let mut entry = self.main.pop_front().ok_or(TrainerError::TrainingComplete)?;

        entry.streak = if correct { entry.streak + 1 } else { 0 };

        match PROMOTION_OFFSETS.get(entry.streak) {
            Some(&offset) => {
                let position = offset.min(self.main.len());
                self.main.insert(position, entry);
                Ok(Promotion::Rescheduled {
                    position,
                    streak: entry.streak,
                })
            }
            None => {
                self.learned.push(entry.symbol);
                tracing::info!(
                    target: "scheduler",
                    "learned {} ({}/{})",
                    entry.symbol,
                    self.learned.len(),
                    ALPHABET_SIZE
                );
                Ok(Promotion::Learned(entry.symbol))
            }
        }
    }

    pub fn back_queue(&self) -> &[Symbol] {
        &self.back
    }

    #[cfg(test)]
    pub fn main_queue(&self) -> impl Iterator<Item = &QueueEntry> {
        self.main.iter()
    }

    /// Learned symbols in the order they were retired
    pub fn learned(&self) -> &[Symbol] {
        &self.learned
    }

    pub fn main_len(&self) -> usize {
        self.main.len()
    }
}

/// Letters then digits; within each group by ascending keying length, with
/// equal lengths shuffled
fn initial_back_queue<R: Rng>(rng: &mut R) -> Vec<Symbol> {
    let mut queue = Vec::with_capacity(ALPHABET_SIZE);

    let groups: [fn(Symbol) -> bool; 2] = [Symbol::is_letter, Symbol::is_digit];
    for group in groups {
        let mut buckets: BTreeMap<u32, Vec<Symbol>> = BTreeMap::new();
        for symbol in Symbol::all().filter(|s| group(*s)) {
            buckets.entry(symbol.length()).or_default().push(symbol);
        }

        for (_, mut bucket) in buckets {
            bucket.shuffle(rng);
            queue.extend(bucket);
        }
    }

    queue
}

fn describe(symbols: &[Symbol]) -> String {
    symbols.iter().map(|s| s.as_char()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn scheduler(seed: u64) -> Scheduler<StdRng> {
        Scheduler::new(StdRng::seed_from_u64(seed))
    }

    fn total(s: &Scheduler<StdRng>) -> usize {
        s.back_queue().len() + s.main_len() + s.learned().len()
    }

    fn front(s: &Scheduler<StdRng>) -> QueueEntry {
        *s.main_queue().next().unwrap()
    }

    #[test]
    fn test_initial_back_queue_layout() {
        let s = scheduler(7);
        let back = s.back_queue();

        assert_eq!(back.len(), 36);
        assert_eq!(s.main_len(), 0);
        assert!(s.learned().is_empty());

        let mut sorted = back.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 36);

        assert!(back[..26].iter().all(|s| s.is_letter()));
        assert!(back[26..].iter().all(|s| s.is_digit()));
        for group in [&back[..26], &back[26..]] {
            assert!(group.windows(2).all(|w| w[0].length() <= w[1].length()));
        }
        assert_eq!(back[0].as_char(), 'E');
        assert_eq!(back[26].as_char(), '5');
    }

    #[test]
    fn test_same_seed_same_order() {
        assert_eq!(scheduler(42).back_queue(), scheduler(42).back_queue());
    }

    #[test]
    fn test_introduce_picks_from_first_three() {
        for seed in 0..20 {
            let mut s = scheduler(seed);
            let window: Vec<Symbol> = s.back_queue()[..3].to_vec();
            let picked = s.introduce().unwrap();
            assert!(window.contains(&picked));
            assert!(!s.back_queue().contains(&picked));
            assert_eq!(front(&s).symbol, picked);
            assert_eq!(front(&s).streak, 0);
        }
    }

    #[test]
    fn test_introduce_on_empty_back_queue() {
        let mut s = scheduler(1);
        while s.introduce().is_ok() {}
        assert!(matches!(s.introduce(), Err(TrainerError::EmptyBackQueue)));
        assert_eq!(s.main_len(), 36);
        assert_eq!(total(&s), 36);
    }

    #[test]
    fn test_peek_next_fills_main_queue() {
        let mut s = scheduler(3);
        let next = s.peek_next().unwrap();
        assert_eq!(s.main_len(), MAIN_QUEUE_TARGET);
        assert_eq!(s.back_queue().len(), 28);
        assert_eq!(front(&s).symbol, next);
        // Peeking again does not consume anything
        assert_eq!(s.peek_next().unwrap(), next);
        assert_eq!(total(&s), 36);
    }

    #[test]
    fn test_miss_resets_streak_and_reinserts_at_first_offset() {
        let mut s = scheduler(5);
        s.peek_next().unwrap();

        // Build up a streak first
        let first = front(&s).symbol;
        s.record_result(true).unwrap();
        let entry = s.main_queue().find(|e| e.symbol == first).copied().unwrap();
        assert_eq!(entry.streak, 1);

        while front(&s).symbol != first {
            s.record_result(true).unwrap();
            s.refill_main_queue();
        }

        let promotion = s.record_result(false).unwrap();
        assert_eq!(
            promotion,
            Promotion::Rescheduled {
                position: 3,
                streak: 0
            }
        );
        let entries: Vec<QueueEntry> = s.main_queue().copied().collect();
        assert_eq!(entries[3].symbol, first);
        assert_eq!(entries[3].streak, 0);
        assert_eq!(total(&s), 36);
    }

    #[test]
    fn test_offsets_clamp_to_queue_length() {
        let mut s = scheduler(9);
        s.introduce().unwrap();
        s.introduce().unwrap();

        // One other entry left after popping, offset 3 clamps to 1
        let promotion = s.record_result(false).unwrap();
        assert_eq!(
            promotion,
            Promotion::Rescheduled {
                position: 1,
                streak: 0
            }
        );
        assert_eq!(s.main_len(), 2);
    }

    #[test]
    fn test_four_correct_answers_learn_a_symbol() {
        let mut s = scheduler(11);
        let symbol = s.introduce().unwrap();

        let mut learned = Vec::new();
        for expected_streak in 1..=4 {
            assert_eq!(front(&s).symbol, symbol);
            match s.record_result(true).unwrap() {
                Promotion::Rescheduled { position, streak } => {
                    assert_eq!(position, 0);
                    assert_eq!(streak, expected_streak);
                }
                Promotion::Learned(sym) => learned.push(sym),
            }
        }

        assert_eq!(learned, vec![symbol]);
        assert_eq!(s.learned(), &[symbol]);
        assert_eq!(s.main_len(), 0);
        assert_eq!(total(&s), 36);
    }

    #[test]
    fn test_promotion_positions_follow_offsets() {
        let mut s = scheduler(13);
        let symbols: Vec<Symbol> = Symbol::all().take(10).collect();

        for (streak, offset) in PROMOTION_OFFSETS.iter().enumerate().skip(1) {
            s.main = symbols
                .iter()
                .map(|&symbol| QueueEntry { symbol, streak: 0 })
                .collect();
            s.main[0].streak = streak - 1;

            let promotion = s.record_result(true).unwrap();
            assert_eq!(promotion, Promotion::Rescheduled { position: *offset, streak });
            let moved: Vec<QueueEntry> = s.main_queue().copied().collect();
            assert_eq!(moved[*offset].symbol, symbols[0]);
        }

        // Offset 8 is beyond a short queue: append instead
        s.main = symbols[..4]
            .iter()
            .map(|&symbol| QueueEntry { symbol, streak: 2 })
            .collect();
        let promotion = s.record_result(true).unwrap();
        assert_eq!(promotion, Promotion::Rescheduled { position: 3, streak: 3 });
        assert_eq!(s.main_queue().last().unwrap().symbol, symbols[0]);
    }

    #[test]
    fn test_drains_to_completion() {
        let mut s = scheduler(21);
        let mut notifications = 0;

        assert!(!s.is_complete());
        while s.peek_next().is_ok() {
            assert!(!s.is_complete());
            if let Promotion::Learned(_) = s.record_result(true).unwrap() {
                notifications += 1;
            }
            assert_eq!(total(&s), 36);
        }

        assert!(s.is_complete());
        assert_eq!(notifications, 36);
        assert_eq!(s.learned().len(), 36);
        assert!(matches!(s.peek_next(), Err(TrainerError::TrainingComplete)));
        assert!(matches!(
            s.record_result(true),
            Err(TrainerError::TrainingComplete)
        ));
    }
}
