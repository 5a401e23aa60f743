//! Daily run-time arithmetic

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};

/// Fires once a day at a fixed local time
///
/// The next run is today at `run_time` if that is still ahead, otherwise
/// tomorrow. An occurrence missed while the process was busy or asleep fires
/// once on the next check, then the schedule moves on from that moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    run_time: NaiveTime,
    next_run: NaiveDateTime,
}

impl DailySchedule {
    pub fn new(run_time: NaiveTime, now: NaiveDateTime) -> Self {
        Self {
            run_time,
            next_run: Self::next_after(run_time, now),
        }
    }

    pub fn run_time(&self) -> NaiveTime {
        self.run_time
    }

    pub fn next_run(&self) -> NaiveDateTime {
        self.next_run
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        now >= self.next_run
    }

    /// Schedules the following occurrence after a run at `now`
    pub fn advance(&mut self, now: NaiveDateTime) {
        self.next_run = Self::next_after(self.run_time, now);
    }

    fn next_after(run_time: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(run_time);
        if today > now {
            today
        } else {
            today + TimeDelta::days(1)
        }
    }
}
