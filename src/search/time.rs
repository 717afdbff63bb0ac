//! Time allocation for a single search.

use std::time::{Duration, Instant};

/// Safety margin taken off the time-control end before planning.
const SAFETY_MARGIN: Duration = Duration::from_millis(800);
/// With no moves-per-control figure, budget roughly this many moves.
const MOVES_ESTIMATE: u32 = 45;
/// The strict deadline is this many soft budgets out.
const STRICT_FACTOR: u32 = 6;

/// Everything the allocator needs to know about the game clock.
#[derive(Debug, Clone, Copy)]
pub struct TimeParams {
    /// Infinite search: no deadlines at all.
    pub analyze: bool,
    /// When the current time control runs out, if a clock is running.
    pub tc_end: Option<Instant>,
    /// Moves per time control, 0 for sudden death or increment play.
    pub nmoves_per_tc: u32,
    /// Increment per move in milliseconds.
    pub increment_ms: u64,
    /// The previous engine move came from the opening book.
    pub in_book: bool,
    /// Half moves played so far.
    pub game_ply: usize,
}

/// Soft and strict deadlines for one search. `None` means unlimited.
#[derive(Debug, Clone, Copy)]
pub struct Deadlines {
    pub soft: Option<Instant>,
    pub strict: Option<Instant>,
}

impl Deadlines {
    #[must_use]
    pub fn unlimited() -> Self {
        Deadlines {
            soft: None,
            strict: None,
        }
    }
}

/// Decide how long the engine may think about its next move.
#[must_use]
pub fn allocate_time(params: &TimeParams, now: Instant) -> Deadlines {
    if params.analyze {
        return Deadlines::unlimited();
    }

    let tc_end = params
        .tc_end
        .map(|end| end.checked_sub(SAFETY_MARGIN).unwrap_or(now));

    let time_left = match tc_end {
        Some(end) => end.saturating_duration_since(now),
        None => Duration::ZERO,
    };

    let mut limit = if params.nmoves_per_tc > 0 {
        let played = (params.game_ply as u32 / 2) % params.nmoves_per_tc;
        let moves_left = params.nmoves_per_tc - played;
        time_left / moves_left
    } else {
        time_left / MOVES_ESTIMATE
    };

    // After a book move the engine may not understand the position yet,
    // so it gets twice the budget to orient itself.
    if params.in_book {
        limit *= 2;
    }

    let increment = Duration::from_millis(params.increment_ms);
    let soft = now + limit + increment;
    let mut strict = now + limit * STRICT_FACTOR + increment;

    if let Some(end) = tc_end {
        if time_left > Duration::ZERO && strict > end {
            strict = end;
        }
    }

    Deadlines {
        soft: Some(soft),
        strict: Some(strict),
    }
}
