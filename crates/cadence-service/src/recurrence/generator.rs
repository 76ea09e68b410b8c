//! Rule expansion into occurrence instants.
//!
//! Generation is pure: the same anchor and rule always yield the same
//! ascending, duplicate-free sequence. It only reads the anchor, the rule and
//! the configured horizon, never the clock.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, TimeDelta, Utc, Weekday};

use cadence_core::types::{Frequency, WeekdayCode};

use super::rule::Rule;

/// Upper bound on the configurable horizon, one century.
const MAX_HORIZON_MONTHS: u32 = 1200;

/// Output of [`Generator::generate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generated {
    /// Ascending, duplicate-free occurrence instants.
    pub instants: Vec<DateTime<Utc>>,
    /// Set when a `count` rule reached the horizon before emitting `count` instants.
    pub truncated: bool,
}

/// Expands recurrence rules up to a horizon measured from the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generator {
    horizon_months: u32,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(12)
    }
}

impl Generator {
    #[must_use]
    pub fn new(horizon_months: u32) -> Self {
        Self {
            horizon_months: horizon_months.min(MAX_HORIZON_MONTHS),
        }
    }

    #[must_use]
    pub const fn horizon_months(&self) -> u32 {
        self.horizon_months
    }

    /// First instant past the default horizon of `anchor`.
    #[must_use]
    pub fn horizon_for(&self, anchor: DateTime<Utc>) -> DateTime<Utc> {
        anchor
            .checked_add_months(Months::new(self.horizon_months))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// ## Summary
    /// Expands `rule` from `anchor` up to `min(until, horizon)`.
    ///
    /// `until` is inclusive; the default horizon is exclusive. Stops early once
    /// `count` instants have been emitted.
    #[must_use]
    pub fn generate(&self, anchor: DateTime<Utc>, rule: &Rule) -> Generated {
        let instants = expand(anchor, rule, self.horizon_for(anchor));
        let truncated = rule
            .count
            .is_some_and(|count| instants.len() < usize::try_from(count).unwrap_or(usize::MAX));

        tracing::trace!(
            frequency = %rule.frequency,
            generated = instants.len(),
            truncated,
            "Expanded recurrence rule"
        );

        Generated {
            instants,
            truncated,
        }
    }

    /// ## Summary
    /// Returns the instants of [`Generator::generate`] that fall in `[start, end]`.
    ///
    /// The horizon stays a hard ceiling: a window past it is empty. Expansion
    /// stops at `end`, and `count` is still counted from the anchor.
    #[must_use]
    pub fn generate_between(
        &self,
        anchor: DateTime<Utc>,
        rule: &Rule,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<DateTime<Utc>> {
        if end < start {
            return Vec::new();
        }
        let past_end = end
            .checked_add_signed(TimeDelta::microseconds(1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let ceiling = self.horizon_for(anchor).min(past_end);

        expand(anchor, rule, ceiling)
            .into_iter()
            .filter(|instant| *instant >= start && *instant <= end)
            .collect()
    }
}

enum Flow {
    Continue,
    Stop,
}

impl Flow {
    const fn is_stop(&self) -> bool {
        matches!(self, Self::Stop)
    }
}

/// Collects accepted instants and decides when expansion ends.
struct Sink {
    out: Vec<DateTime<Utc>>,
    anchor: DateTime<Utc>,
    count: Option<usize>,
    until: Option<DateTime<Utc>>,
    ceiling: DateTime<Utc>,
}

impl Sink {
    fn beyond(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.ceiling || self.until.is_some_and(|until| instant > until)
    }

    fn full(&self) -> bool {
        self.count.is_some_and(|count| self.out.len() >= count)
    }

    /// Offers a candidate. Candidates must arrive in ascending order.
    fn offer(&mut self, instant: DateTime<Utc>) -> Flow {
        if self.full() || self.beyond(instant) {
            return Flow::Stop;
        }
        if instant >= self.anchor && self.out.last().is_none_or(|last| instant > *last) {
            self.out.push(instant);
        }
        if self.full() {
            Flow::Stop
        } else {
            Flow::Continue
        }
    }
}

fn expand(anchor: DateTime<Utc>, rule: &Rule, ceiling: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut sink = Sink {
        out: Vec::new(),
        anchor,
        count: rule
            .count
            .map(|count| usize::try_from(count).unwrap_or(usize::MAX)),
        until: rule.until,
        ceiling,
    };

    match rule.frequency {
        Frequency::Daily => stepped(anchor, TimeDelta::try_days(i64::from(rule.interval)), &mut sink),
        Frequency::Weekly if rule.by_day.is_empty() => stepped(
            anchor,
            TimeDelta::try_days(i64::from(rule.interval) * 7),
            &mut sink,
        ),
        Frequency::Weekly => weekly_by_day(anchor, rule, &mut sink),
        Frequency::Biweekly => stepped(anchor, TimeDelta::try_days(14), &mut sink),
        Frequency::Monthly => monthly(anchor, rule, &mut sink),
        Frequency::Yearly => yearly(anchor, rule, &mut sink),
    }

    sink.out
}

/// Fixed-length steps from the anchor.
fn stepped(anchor: DateTime<Utc>, step: Option<TimeDelta>, sink: &mut Sink) {
    let Some(step) = step else {
        return;
    };
    let mut next = Some(anchor);
    while let Some(at) = next {
        if sink.offer(at).is_stop() {
            break;
        }
        next = at.checked_add_signed(step);
    }
}

/// Day-by-day walk accepting the listed weekdays. After each Sunday the walk
/// jumps over `interval - 1` whole weeks.
fn weekly_by_day(anchor: DateTime<Utc>, rule: &Rule, sink: &mut Sink) {
    let one_day = TimeDelta::days(1);
    let skipped_weeks = TimeDelta::try_days(i64::from(rule.interval - 1) * 7);

    let mut day = anchor;
    while !sink.full() && !sink.beyond(day) {
        let weekday = day.weekday();
        if rule.by_day.contains(&WeekdayCode::from(weekday)) && sink.offer(day).is_stop() {
            break;
        }

        let mut next = day.checked_add_signed(one_day);
        if weekday == Weekday::Sun && rule.interval > 1 {
            next = next
                .zip(skipped_weeks)
                .and_then(|(next, skip)| next.checked_add_signed(skip));
        }
        let Some(next) = next else {
            break;
        };
        day = next;
    }
}

fn days_in_month(first_of_month: NaiveDate) -> u32 {
    first_of_month
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map_or(31, |last| last.day())
}

fn at(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    date.and_time(time).and_utc()
}

/// One step per `interval` months. Without `byMonthDay` the anchor's day is
/// used, clamped to the month's last day; with it, every listed day that
/// exists in the month is emitted.
fn monthly(anchor: DateTime<Utc>, rule: &Rule, sink: &mut Sink) {
    let anchor_date = anchor.date_naive();
    let time = anchor.time();
    let Some(first) = anchor_date.with_day(1) else {
        return;
    };

    let mut step: u32 = 0;
    loop {
        let Some(month_start) = step
            .checked_mul(rule.interval)
            .and_then(|months| first.checked_add_months(Months::new(months)))
        else {
            break;
        };
        if sink.beyond(at(month_start, time)) {
            break;
        }

        let last_day = days_in_month(month_start);
        let days: Vec<u32> = if rule.by_month_day.is_empty() {
            vec![anchor_date.day().min(last_day)]
        } else {
            rule.by_month_day
                .iter()
                .copied()
                .filter(|day| *day <= last_day)
                .collect()
        };

        for day in days {
            let Some(date) = month_start.with_day(day) else {
                continue;
            };
            if sink.offer(at(date, time)).is_stop() {
                return;
            }
        }

        let Some(next) = step.checked_add(1) else {
            break;
        };
        step = next;
    }
}

/// One step per `interval` years. Without `byMonth` the anchor's month is
/// used; with it, every listed month is emitted. The anchor's day is clamped
/// to each month's last day.
fn yearly(anchor: DateTime<Utc>, rule: &Rule, sink: &mut Sink) {
    let anchor_date = anchor.date_naive();
    let time = anchor.time();
    let months: Vec<u32> = if rule.by_month.is_empty() {
        vec![anchor_date.month()]
    } else {
        rule.by_month.iter().copied().collect()
    };

    let mut step: u32 = 0;
    loop {
        let Some(year) = step
            .checked_mul(rule.interval)
            .and_then(|years| i32::try_from(years).ok())
            .and_then(|years| anchor_date.year().checked_add(years))
        else {
            break;
        };
        let Some(new_year) = NaiveDate::from_ymd_opt(year, 1, 1) else {
            break;
        };
        if sink.beyond(at(new_year, time)) {
            break;
        }

        for &month in &months {
            let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
                continue;
            };
            let Some(date) = first.with_day(anchor_date.day().min(days_in_month(first))) else {
                continue;
            };
            if sink.offer(at(date, time)).is_stop() {
                return;
            }
        }

        let Some(next) = step.checked_add(1) else {
            break;
        };
        step = next;
    }
}
