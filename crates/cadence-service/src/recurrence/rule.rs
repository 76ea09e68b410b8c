//! Validated recurrence rules.

use std::collections::BTreeSet;

use cadence_core::error::{CoreError, CoreResult};
use cadence_core::time::normalize;
use cadence_core::types::{Frequency, WeekdayCode};
use cadence_db::model::{NewRecurrenceRule, RecurrenceRule};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Caller-supplied recurrence rule, as received at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRequest {
    /// One of `daily`, `weekly`, `biweekly`, `monthly`, `yearly` (case-insensitive).
    pub frequency: String,
    pub interval: i64,
    /// Two-letter weekday codes (`MO` .. `SU`).
    pub by_day: Vec<String>,
    pub by_month: Vec<i64>,
    pub by_month_day: Vec<i64>,
    pub count: Option<i64>,
    pub until: Option<DateTime<Utc>>,
}

impl RecurrenceRequest {
    /// A rule with the given frequency, an interval of one and no filters or terminator.
    #[must_use]
    pub fn new(frequency: impl Into<String>) -> Self {
        Self {
            frequency: frequency.into(),
            interval: 1,
            by_day: Vec::new(),
            by_month: Vec::new(),
            by_month_day: Vec::new(),
            count: None,
            until: None,
        }
    }
}

/// A recurrence rule that passed validation.
///
/// Filters are sets, so duplicates in the request collapse and iteration is ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub frequency: Frequency,
    pub interval: u32,
    pub by_day: BTreeSet<WeekdayCode>,
    pub by_month: BTreeSet<u32>,
    pub by_month_day: BTreeSet<u32>,
    pub count: Option<u32>,
    pub until: Option<DateTime<Utc>>,
}

fn ranged_set(
    values: &[i64],
    range: std::ops::RangeInclusive<u32>,
    name: &str,
) -> CoreResult<BTreeSet<u32>> {
    values
        .iter()
        .map(|&value| {
            u32::try_from(value)
                .ok()
                .filter(|value| range.contains(value))
                .ok_or_else(|| {
                    CoreError::validation(format!(
                        "{name} value {value} is outside {}..={}",
                        range.start(),
                        range.end()
                    ))
                })
        })
        .collect()
}

/// Non-negative values that fit the signed integer columns they are stored in.
fn storable(value: i64) -> Option<u32> {
    i32::try_from(value)
        .ok()
        .and_then(|value| u32::try_from(value).ok())
}

impl Rule {
    /// ## Summary
    /// Validates a caller-supplied rule.
    ///
    /// `count = 0` and an `until` before the anchor are accepted; they simply
    /// generate nothing.
    ///
    /// ## Errors
    /// Returns `CoreError::ValidationError` for an unknown frequency or weekday
    /// code, an interval or count outside the storable range (interval must be
    /// positive, count non-negative), out-of-range month or day numbers, both `count` and `until` set, or a filter the frequency
    /// does not use.
    pub fn from_request(request: &RecurrenceRequest) -> CoreResult<Self> {
        let frequency: Frequency = request.frequency.parse()?;

        let interval = storable(request.interval)
            .filter(|&interval| interval > 0)
            .ok_or_else(|| {
                CoreError::validation(format!(
                    "interval must be between 1 and {}, got {}",
                    i32::MAX,
                    request.interval
                ))
            })?;

        let by_day = request
            .by_day
            .iter()
            .map(|code| code.parse::<WeekdayCode>())
            .collect::<CoreResult<BTreeSet<_>>>()?;
        let by_month = ranged_set(&request.by_month, 1..=12, "byMonth")?;
        let by_month_day = ranged_set(&request.by_month_day, 1..=31, "byMonthDay")?;

        let count = request
            .count
            .map(|count| {
                storable(count).ok_or_else(|| {
                    CoreError::validation(format!(
                        "count must be between 0 and {}, got {count}",
                        i32::MAX
                    ))
                })
            })
            .transpose()?;

        if count.is_some() && request.until.is_some() {
            return Err(CoreError::validation(
                "count and until cannot both be set",
            ));
        }

        let rule = Self {
            frequency,
            interval,
            by_day,
            by_month,
            by_month_day,
            count,
            until: request.until.map(normalize),
        };
        rule.check_filters()?;
        Ok(rule)
    }

    /// ## Summary
    /// Rebuilds a rule from its stored row.
    ///
    /// ## Errors
    /// Returns `CoreError::ValidationError` if the row holds values that would
    /// not pass [`Rule::from_request`].
    pub fn from_row(row: &RecurrenceRule) -> CoreResult<Self> {
        Self::from_request(&RecurrenceRequest {
            frequency: row.frequency.as_str().to_owned(),
            interval: i64::from(row.step_interval),
            by_day: row.by_day.clone(),
            by_month: row.by_month.iter().copied().map(i64::from).collect(),
            by_month_day: row.by_month_day.iter().copied().map(i64::from).collect(),
            count: row.max_count.map(i64::from),
            until: row.until_time,
        })
    }

    fn check_filters(&self) -> CoreResult<()> {
        let unsupported = match self.frequency {
            Frequency::Daily | Frequency::Biweekly => [
                ("byDay", !self.by_day.is_empty()),
                ("byMonth", !self.by_month.is_empty()),
                ("byMonthDay", !self.by_month_day.is_empty()),
            ]
            .into_iter()
            .find(|(_, set)| *set),
            Frequency::Weekly => [
                ("byMonth", !self.by_month.is_empty()),
                ("byMonthDay", !self.by_month_day.is_empty()),
            ]
            .into_iter()
            .find(|(_, set)| *set),
            Frequency::Monthly => [
                ("byDay", !self.by_day.is_empty()),
                ("byMonth", !self.by_month.is_empty()),
            ]
            .into_iter()
            .find(|(_, set)| *set),
            Frequency::Yearly => [
                ("byDay", !self.by_day.is_empty()),
                ("byMonthDay", !self.by_month_day.is_empty()),
            ]
            .into_iter()
            .find(|(_, set)| *set),
        };

        match unsupported {
            Some((filter, _)) => Err(CoreError::validation(format!(
                "{filter} is not supported for {} rules",
                self.frequency
            ))),
            None => Ok(()),
        }
    }

    fn stored_fields(&self) -> (i32, Vec<String>, Vec<i32>, Vec<i32>, Option<i32>) {
        // `from_request` keeps every value within i32.
        let narrow = |value: u32| i32::try_from(value).unwrap_or(i32::MAX);
        (
            narrow(self.interval),
            self.by_day.iter().map(|day| day.as_str().to_owned()).collect(),
            self.by_month.iter().copied().map(narrow).collect(),
            self.by_month_day.iter().copied().map(narrow).collect(),
            self.count.map(narrow),
        )
    }

    /// Builds the row that stores this rule for `event_id`.
    #[must_use]
    pub fn to_new_row(&self, event_id: Uuid, now: DateTime<Utc>) -> NewRecurrenceRule {
        let (step_interval, by_day, by_month, by_month_day, max_count) = self.stored_fields();
        NewRecurrenceRule {
            id: Uuid::now_v7(),
            event_id,
            frequency: self.frequency.into(),
            step_interval,
            by_day,
            by_month,
            by_month_day,
            max_count,
            until_time: self.until,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the rule columns of an existing row, keeping its identity.
    pub fn write_to_row(&self, row: &mut RecurrenceRule, now: DateTime<Utc>) {
        let (step_interval, by_day, by_month, by_month_day, max_count) = self.stored_fields();
        row.frequency = self.frequency.into();
        row.step_interval = step_interval;
        row.by_day = by_day;
        row.by_month = by_month;
        row.by_month_day = by_month_day;
        row.max_count = max_count;
        row.until_time = self.until;
        row.updated_at = now;
    }
}
