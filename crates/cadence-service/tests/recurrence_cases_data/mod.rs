// Shared recurrence expansion cases. The including module must have
// `Generator`, `RecurrenceRequest` and `Rule` in scope.

use chrono::{DateTime, Utc};

pub struct RecurrenceCase {
    pub name: &'static str,
    pub anchor: &'static str,
    pub frequency: &'static str,
    pub interval: i64,
    pub by_day: &'static [&'static str],
    pub by_month: &'static [i64],
    pub by_month_day: &'static [i64],
    pub count: Option<i64>,
    pub until: Option<&'static str>,
    pub expected: Option<&'static [&'static str]>,
    pub expected_len: Option<usize>,
    pub truncated: bool,
}

impl RecurrenceCase {
    const fn new(name: &'static str, anchor: &'static str, frequency: &'static str) -> Self {
        Self {
            name,
            anchor,
            frequency,
            interval: 1,
            by_day: &[],
            by_month: &[],
            by_month_day: &[],
            count: None,
            until: None,
            expected: None,
            expected_len: None,
            truncated: false,
        }
    }

    pub fn request(&self) -> RecurrenceRequest {
        RecurrenceRequest {
            frequency: self.frequency.to_owned(),
            interval: self.interval,
            by_day: self.by_day.iter().map(|code| (*code).to_owned()).collect(),
            by_month: self.by_month.to_vec(),
            by_month_day: self.by_month_day.to_vec(),
            count: self.count,
            until: self.until.map(parse_rfc3339),
        }
    }

    pub fn anchor(&self) -> DateTime<Utc> {
        parse_rfc3339(self.anchor)
    }
}

#[expect(clippy::too_many_lines)]
pub fn recurrence_cases() -> Vec<RecurrenceCase> {
    vec![
        RecurrenceCase {
            count: Some(5),
            expected: Some(&[
                "2024-01-01T00:00:00Z",
                "2024-01-02T00:00:00Z",
                "2024-01-03T00:00:00Z",
                "2024-01-04T00:00:00Z",
                "2024-01-05T00:00:00Z",
            ]),
            ..RecurrenceCase::new("daily_count", "2024-01-01T00:00:00Z", "daily")
        },
        RecurrenceCase {
            interval: 2,
            until: Some("2024-01-07T09:00:00Z"),
            expected: Some(&[
                "2024-01-01T09:00:00Z",
                "2024-01-03T09:00:00Z",
                "2024-01-05T09:00:00Z",
                "2024-01-07T09:00:00Z",
            ]),
            ..RecurrenceCase::new("daily_until_inclusive", "2024-01-01T09:00:00Z", "daily")
        },
        RecurrenceCase {
            expected_len: Some(366),
            ..RecurrenceCase::new("daily_open_ended_leap_year", "2024-01-01T00:00:00Z", "daily")
        },
        RecurrenceCase {
            count: Some(400),
            expected_len: Some(366),
            truncated: true,
            ..RecurrenceCase::new("daily_count_past_horizon", "2024-01-01T00:00:00Z", "daily")
        },
        RecurrenceCase {
            by_day: &["MO", "WE"],
            count: Some(4),
            expected: Some(&[
                "2024-01-01T00:00:00Z",
                "2024-01-03T00:00:00Z",
                "2024-01-08T00:00:00Z",
                "2024-01-10T00:00:00Z",
            ]),
            ..RecurrenceCase::new("weekly_by_day", "2024-01-01T00:00:00Z", "weekly")
        },
        RecurrenceCase {
            interval: 2,
            by_day: &["MO", "WE"],
            count: Some(4),
            expected: Some(&[
                "2024-01-01T00:00:00Z",
                "2024-01-03T00:00:00Z",
                "2024-01-15T00:00:00Z",
                "2024-01-17T00:00:00Z",
            ]),
            ..RecurrenceCase::new("weekly_by_day_every_other_week", "2024-01-01T00:00:00Z", "weekly")
        },
        RecurrenceCase {
            interval: 3,
            count: Some(3),
            expected: Some(&[
                "2024-01-01T18:30:00Z",
                "2024-01-22T18:30:00Z",
                "2024-02-12T18:30:00Z",
            ]),
            ..RecurrenceCase::new("weekly_plain_interval", "2024-01-01T18:30:00Z", "weekly")
        },
        RecurrenceCase {
            count: Some(3),
            expected: Some(&[
                "2024-01-01T08:00:00Z",
                "2024-01-15T08:00:00Z",
                "2024-01-29T08:00:00Z",
            ]),
            ..RecurrenceCase::new("biweekly_fixed_step", "2024-01-01T08:00:00Z", "biweekly")
        },
        RecurrenceCase {
            by_month_day: &[15],
            count: Some(3),
            expected: Some(&[
                "2024-01-15T00:00:00Z",
                "2024-02-15T00:00:00Z",
                "2024-03-15T00:00:00Z",
            ]),
            ..RecurrenceCase::new("monthly_by_month_day", "2024-01-01T00:00:00Z", "monthly")
        },
        RecurrenceCase {
            by_month_day: &[31],
            count: Some(4),
            expected: Some(&[
                "2024-01-31T09:00:00Z",
                "2024-03-31T09:00:00Z",
                "2024-05-31T09:00:00Z",
                "2024-07-31T09:00:00Z",
            ]),
            ..RecurrenceCase::new("monthly_skips_short_months", "2024-01-01T09:00:00Z", "monthly")
        },
        RecurrenceCase {
            count: Some(3),
            expected: Some(&[
                "2024-01-31T10:00:00Z",
                "2024-02-29T10:00:00Z",
                "2024-03-31T10:00:00Z",
            ]),
            ..RecurrenceCase::new("monthly_clamps_anchor_day", "2024-01-31T10:00:00Z", "monthly")
        },
        RecurrenceCase {
            by_month: &[3, 9],
            count: Some(2),
            expected: Some(&["2024-03-10T12:00:00Z", "2024-09-10T12:00:00Z"]),
            ..RecurrenceCase::new("yearly_by_month", "2024-01-10T12:00:00Z", "yearly")
        },
        RecurrenceCase {
            until: Some("2023-12-31T00:00:00Z"),
            expected: Some(&[]),
            ..RecurrenceCase::new("until_before_anchor", "2024-01-01T00:00:00Z", "daily")
        },
        RecurrenceCase {
            count: Some(0),
            expected: Some(&[]),
            ..RecurrenceCase::new("count_zero", "2024-01-01T00:00:00Z", "weekly")
        },
    ]
}

pub fn assert_case(case: &RecurrenceCase) {
    let rule = Rule::from_request(&case.request())
        .unwrap_or_else(|err| panic!("Case {} has an invalid rule: {err}", case.name));
    let generated = Generator::default().generate(case.anchor(), &rule);

    assert!(
        generated.instants.windows(2).all(|pair| pair[0] < pair[1]),
        "Case {} is not strictly ascending",
        case.name
    );

    if let Some(expected) = case.expected {
        let expected: Vec<DateTime<Utc>> = expected.iter().map(|value| parse_rfc3339(value)).collect();
        assert_eq!(generated.instants, expected, "Case {} did not match", case.name);
    }

    if let Some(expected_len) = case.expected_len {
        assert_eq!(
            generated.instants.len(),
            expected_len,
            "Case {} expected {} occurrences",
            case.name,
            expected_len
        );
    }

    assert_eq!(
        generated.truncated, case.truncated,
        "Case {} truncation flag",
        case.name
    );
}

fn parse_rfc3339(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .unwrap_or_else(|err| panic!("Failed to parse rfc3339 value {value}: {err}"))
        .with_timezone(&Utc)
}
