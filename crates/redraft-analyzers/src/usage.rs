use dashmap::DashMap;
use time::Date;
use tracing::debug;

use crate::clock::SharedClock;

/// Per-user daily AI call budget.
///
/// A `false` check result means "skip AI tiers for this cycle", never an
/// error. Counters are keyed by user id; writes to different users do not
/// contend. The window rolls over at UTC midnight.
#[derive(Debug)]
pub struct UsageLimiter {
    counters: DashMap<String, DayCount>,
    daily_limit: u32,
    clock: SharedClock,
}

#[derive(Debug, Clone, Copy)]
struct DayCount {
    day: Date,
    used: u32,
}

impl UsageLimiter {
    pub fn new(daily_limit: u32, clock: SharedClock) -> Self {
        Self {
            counters: DashMap::new(),
            daily_limit,
            clock,
        }
    }

    /// Whether `user_id` still has AI budget today.
    pub fn check_ai_usage(&self, user_id: &str) -> bool {
        let today = self.clock.now().date();
        let used = self
            .counters
            .get(user_id)
            .filter(|count| count.day == today)
            .map_or(0, |count| count.used);
        let allowed = used < self.daily_limit;
        if !allowed {
            debug!(target: "redraft_analyzers", user_id, used, "AI quota exhausted");
        }
        allowed
    }

    /// Record `count` AI calls against `user_id` for today.
    pub fn track_ai_usage(&self, user_id: &str, count: u32) {
        let today = self.clock.now().date();
        self.counters
            .entry(user_id.to_string())
            .and_modify(|entry| {
                if entry.day == today {
                    entry.used = entry.used.saturating_add(count);
                } else {
                    *entry = DayCount { day: today, used: count };
                }
            })
            .or_insert(DayCount { day: today, used: count });
    }

    pub fn used_today(&self, user_id: &str) -> u32 {
        let today = self.clock.now().date();
        self.counters
            .get(user_id)
            .filter(|count| count.day == today)
            .map_or(0, |count| count.used)
    }
}
