//! Trainer core: the adaptive scheduler and the round state machine
//!
//! # Components
//! - `scheduler.rs`: back queue / main queue / learned set and promotion policy
//! - `round.rs`: play, judge and pause handling for each training round

pub mod round;
pub mod scheduler;

pub use round::{RoundMachine, RoundTiming, SessionEnd, SessionStats};
pub use scheduler::Scheduler;
