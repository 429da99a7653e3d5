// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tier trigger windows and due-time evaluation.
//!
//! A tier is due when the wall clock sits inside its trigger window (a given
//! hour, optionally restricted to a weekday or a day of the month) and more
//! than its minimum interval has passed since it last ran. The minimum
//! interval is what keeps a window that spans several polls from firing
//! more than once.

use chrono::{Datelike, NaiveDateTime, TimeDelta, Timelike, Weekday};
use keeper_config::model::TiersConfig;
use keeper_core::Tier;

/// Which days a trigger window opens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayConstraint {
    Any,
    Weekday(Weekday),
    /// A day of the month. Months without that day are skipped, not rolled over.
    DayOfMonth(u32),
}

impl DayConstraint {
    fn matches(self, at: NaiveDateTime) -> bool {
        match self {
            DayConstraint::Any => true,
            DayConstraint::Weekday(day) => at.weekday() == day,
            DayConstraint::DayOfMonth(day) => at.day() == day,
        }
    }
}

/// Trigger window, debounce interval, and retention of one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierSchedule {
    pub tier: Tier,
    pub hour: u32,
    pub day: DayConstraint,
    pub min_interval: TimeDelta,
    /// Tier artifacts kept per unit and category.
    pub retention: usize,
}

impl TierSchedule {
    /// Whether `now` falls inside the trigger window.
    pub fn in_window(&self, now: NaiveDateTime) -> bool {
        now.hour() == self.hour && self.day.matches(now)
    }

    /// Whether the tier should run at `now`, given when it last ran.
    pub fn is_due(&self, now: NaiveDateTime, last_run: NaiveDateTime) -> bool {
        self.in_window(now) && now - last_run > self.min_interval
    }

    /// Equivalent crontab schedule (`minute hour day-of-month month day-of-week`).
    pub fn crontab_expression(&self) -> String {
        match self.day {
            DayConstraint::Any => format!("0 {} * * *", self.hour),
            DayConstraint::Weekday(day) => {
                format!("0 {} * * {}", self.hour, day.num_days_from_sunday())
            }
            DayConstraint::DayOfMonth(day) => format!("0 {} {day} * *", self.hour),
        }
    }
}

/// Schedules of all three tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedules {
    daily: TierSchedule,
    weekly: TierSchedule,
    monthly: TierSchedule,
}

impl Schedules {
    pub fn new(daily: TierSchedule, weekly: TierSchedule, monthly: TierSchedule) -> Self {
        Self {
            daily,
            weekly,
            monthly,
        }
    }

    pub fn from_config(config: &TiersConfig) -> Self {
        Self {
            daily: TierSchedule {
                tier: Tier::Daily,
                hour: config.daily.hour,
                day: DayConstraint::Any,
                min_interval: hours(config.daily.min_interval_hours),
                retention: config.daily.retention,
            },
            weekly: TierSchedule {
                tier: Tier::Weekly,
                hour: config.weekly.hour,
                day: DayConstraint::Weekday(config.weekly.weekday),
                min_interval: hours(config.weekly.min_interval_hours),
                retention: config.weekly.retention,
            },
            monthly: TierSchedule {
                tier: Tier::Monthly,
                hour: config.monthly.hour,
                day: DayConstraint::DayOfMonth(config.monthly.day),
                min_interval: hours(config.monthly.min_interval_hours),
                retention: config.monthly.retention,
            },
        }
    }

    pub fn get(&self, tier: Tier) -> &TierSchedule {
        match tier {
            Tier::Daily => &self.daily,
            Tier::Weekly => &self.weekly,
            Tier::Monthly => &self.monthly,
        }
    }

    /// Whether `tier` should run at `now`, given when it last ran.
    pub fn is_due(&self, tier: Tier, now: NaiveDateTime, last_run: NaiveDateTime) -> bool {
        self.get(tier).is_due(now, last_run)
    }

    /// All schedules in evaluation order: daily, weekly, monthly.
    pub fn iter(&self) -> impl Iterator<Item = &TierSchedule> {
        Tier::ALL.into_iter().map(|tier| self.get(tier))
    }
}

impl Default for Schedules {
    fn default() -> Self {
        Self::from_config(&TiersConfig::default())
    }
}

fn hours(h: u64) -> TimeDelta {
    i64::try_from(h)
        .ok()
        .and_then(TimeDelta::try_hours)
        .unwrap_or(TimeDelta::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use keeper_core::never_run;
    use proptest::prelude::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn daily_fires_after_a_day_but_not_twice_in_one_window() {
        let schedules = Schedules::default();
        // 2026-06-10 01:05, previous run the day before at 01:00.
        assert!(schedules.is_due(Tier::Daily, at(2026, 6, 10, 1, 5), at(2026, 6, 9, 1, 0)));
        // Same window, a poll after the run at 01:02.
        assert!(!schedules.is_due(Tier::Daily, at(2026, 6, 10, 1, 5), at(2026, 6, 10, 1, 2)));
    }

    #[test]
    fn elapsed_equal_to_min_interval_is_not_due() {
        let schedules = Schedules::default();
        let now = at(2026, 6, 10, 1, 30);
        // Default daily minimum interval is 23h.
        assert!(!schedules.is_due(Tier::Daily, now, at(2026, 6, 9, 2, 30)));
        assert!(schedules.is_due(Tier::Daily, now, at(2026, 6, 9, 2, 29)));
    }

    #[test]
    fn never_run_tier_fires_in_its_first_window() {
        let schedules = Schedules::default();
        assert!(schedules.is_due(Tier::Daily, at(2026, 6, 10, 1, 0), never_run()));
        assert!(!schedules.is_due(Tier::Daily, at(2026, 6, 10, 2, 0), never_run()));
    }

    #[test]
    fn weekly_requires_the_configured_weekday() {
        let schedules = Schedules::default();
        // 2026-06-14 is a Sunday.
        assert!(schedules.is_due(Tier::Weekly, at(2026, 6, 14, 2, 10), never_run()));
        assert!(!schedules.is_due(Tier::Weekly, at(2026, 6, 15, 2, 10), never_run()));
        assert!(!schedules.is_due(Tier::Weekly, at(2026, 6, 14, 3, 10), never_run()));
    }

    #[test]
    fn monthly_day_missing_from_month_does_not_fire() {
        let mut config = TiersConfig::default();
        config.monthly.day = 31;
        let schedules = Schedules::from_config(&config);

        for (month, last_day) in [(2, 28), (4, 30), (6, 30)] {
            for day in 1..=last_day {
                assert!(
                    !schedules.is_due(Tier::Monthly, at(2026, month, day, 3, 0), never_run()),
                    "fired on 2026-{month}-{day}"
                );
            }
        }
        assert!(schedules.is_due(Tier::Monthly, at(2026, 5, 31, 3, 0), never_run()));
    }

    #[test]
    fn crontab_expressions_match_windows() {
        let schedules = Schedules::default();
        assert_eq!(schedules.get(Tier::Daily).crontab_expression(), "0 1 * * *");
        assert_eq!(schedules.get(Tier::Weekly).crontab_expression(), "0 2 * * 0");
        assert_eq!(schedules.get(Tier::Monthly).crontab_expression(), "0 3 1 * *");
    }

    #[test]
    fn iter_yields_tiers_in_evaluation_order() {
        let tiers: Vec<Tier> = Schedules::default().iter().map(|s| s.tier).collect();
        assert_eq!(tiers, Tier::ALL.to_vec());
    }

    fn tier_strategy() -> impl Strategy<Value = Tier> {
        prop_oneof![Just(Tier::Daily), Just(Tier::Weekly), Just(Tier::Monthly)]
    }

    fn datetime_strategy() -> impl Strategy<Value = NaiveDateTime> {
        // 2020-01-01 .. 2030-01-01, minute resolution.
        (0i64..5_260_000).prop_map(|minutes| at(2020, 1, 1, 0, 0) + TimeDelta::minutes(minutes))
    }

    proptest! {
        #[test]
        fn due_only_inside_window_and_after_interval(
            tier in tier_strategy(),
            now in datetime_strategy(),
            since_minutes in 0i64..100_000,
        ) {
            let schedules = Schedules::default();
            let schedule = schedules.get(tier);
            let last_run = now - TimeDelta::minutes(since_minutes);
            let due = schedules.is_due(tier, now, last_run);
            if due {
                prop_assert!(schedule.in_window(now));
                prop_assert!(now - last_run > schedule.min_interval);
            } else {
                prop_assert!(!schedule.in_window(now) || now - last_run <= schedule.min_interval);
            }
        }

        #[test]
        fn a_run_suppresses_the_rest_of_its_window(
            tier in tier_strategy(),
            now in datetime_strategy(),
            later_minutes in 0i64..60,
        ) {
            let schedules = Schedules::default();
            let later = now + TimeDelta::minutes(later_minutes);
            if schedules.is_due(tier, now, never_run()) {
                // The runner records `now` as last run; nothing in the same window fires again.
                prop_assert!(!schedules.is_due(tier, later, now));
            }
        }
    }
}
