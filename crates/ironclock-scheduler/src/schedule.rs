//! Job schedules.
//!
//! A [`Schedule`] is either a fixed interval (an interval of zero fires once)
//! or a cron expression with an optional time zone. Cron evaluation is
//! delegated to the `cron` crate, time zones to `chrono-tz`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{SchedulerError, SchedulerResult};

/// Interval schedule: first run time plus a repeat interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSchedule {
    /// First firing; `None` means as soon as possible.
    first_run_time: Option<DateTime<Utc>>,
    /// Repeat interval. Zero means fire once.
    interval_millis: u64,
}

impl IntervalSchedule {
    pub fn new(first_run_time: Option<DateTime<Utc>>, interval_millis: u64) -> Self {
        Self {
            first_run_time,
            interval_millis,
        }
    }

    pub fn first_run_time(&self) -> Option<DateTime<Utc>> {
        self.first_run_time
    }

    pub fn interval_millis(&self) -> u64 {
        self.interval_millis
    }
}

/// Cron schedule: expression plus optional IANA time zone name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronSchedule {
    expression: String,
    time_zone: Option<String>,
}

impl CronSchedule {
    pub fn new(expression: impl Into<String>, time_zone: Option<String>) -> Self {
        Self {
            expression: expression.into(),
            time_zone,
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn time_zone(&self) -> Option<&str> {
        self.time_zone.as_deref()
    }

    fn parse(&self) -> SchedulerResult<cron::Schedule> {
        cron::Schedule::from_str(&self.expression).map_err(|e| {
            SchedulerError::InvalidCronExpression {
                expression: self.expression.clone(),
                message: e.to_string(),
            }
        })
    }

    fn zone(&self) -> SchedulerResult<Tz> {
        match &self.time_zone {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| SchedulerError::UnknownTimeZone(name.clone())),
            None => Ok(Tz::UTC),
        }
    }
}

/// When a job fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schedule {
    Interval(IntervalSchedule),
    Cron(CronSchedule),
}

impl Schedule {
    /// Fire exactly once, at `at` or as soon as possible.
    pub fn run_once(at: Option<DateTime<Utc>>) -> Self {
        Schedule::Interval(IntervalSchedule::new(at, 0))
    }

    /// Fire every `interval_millis`, starting at `first_run_time`.
    pub fn for_interval(interval_millis: u64, first_run_time: Option<DateTime<Utc>>) -> Self {
        Schedule::Interval(IntervalSchedule::new(first_run_time, interval_millis))
    }

    /// Fire according to a cron expression.
    ///
    /// The expression is not evaluated until a next run time is requested.
    pub fn for_cron_expression(expression: impl Into<String>, time_zone: Option<String>) -> Self {
        Schedule::Cron(CronSchedule::new(expression, time_zone))
    }

    /// Build a schedule from optional parts, exactly one of which must be set.
    pub fn from_parts(
        interval: Option<IntervalSchedule>,
        cron: Option<CronSchedule>,
    ) -> SchedulerResult<Self> {
        match (interval, cron) {
            (Some(interval), None) => Ok(Schedule::Interval(interval)),
            (None, Some(cron)) => Ok(Schedule::Cron(cron)),
            (None, None) => Err(SchedulerError::InvalidSchedule(
                "neither an interval nor a cron schedule was given".to_string(),
            )),
            (Some(_), Some(_)) => Err(SchedulerError::InvalidSchedule(
                "both an interval and a cron schedule were given".to_string(),
            )),
        }
    }

    /// Whether this is an interval schedule with interval zero.
    pub fn is_run_once(&self) -> bool {
        matches!(self, Schedule::Interval(interval) if interval.interval_millis == 0)
    }

    /// Compute the next firing strictly after `previous`, skipping slots
    /// that are already behind `now`.
    ///
    /// Returns `None` when the schedule will not fire again, and
    /// `InvalidSchedule` when an interval steps past the representable
    /// date range.
    pub fn next_run_time(
        &self,
        now: DateTime<Utc>,
        previous: Option<DateTime<Utc>>,
    ) -> SchedulerResult<Option<DateTime<Utc>>> {
        match self {
            Schedule::Interval(interval) => next_interval_run(interval, now, previous),
            Schedule::Cron(cron) => {
                let schedule = cron.parse()?;
                let zone = cron.zone()?;
                let from = match previous {
                    Some(previous) if previous > now => previous,
                    _ => now,
                };
                Ok(schedule
                    .after(&from.with_timezone(&zone))
                    .next()
                    .map(|next| next.with_timezone(&Utc)))
            }
        }
    }
}

fn next_interval_run(
    interval: &IntervalSchedule,
    now: DateTime<Utc>,
    previous: Option<DateTime<Utc>>,
) -> SchedulerResult<Option<DateTime<Utc>>> {
    let Some(previous) = previous else {
        return Ok(Some(interval.first_run_time.unwrap_or(now)));
    };
    if interval.interval_millis == 0 {
        return Ok(None);
    }

    let out_of_range = || {
        SchedulerError::InvalidSchedule(format!(
            "interval of {}ms is out of range",
            interval.interval_millis
        ))
    };
    let step_millis = i64::try_from(interval.interval_millis).map_err(|_| out_of_range())?;
    let step = Duration::try_milliseconds(step_millis).ok_or_else(out_of_range)?;

    let mut next = previous.checked_add_signed(step).ok_or_else(out_of_range)?;
    if next <= now {
        let behind = (now - next).num_milliseconds() / step_millis + 1;
        next = behind
            .checked_mul(step_millis)
            .and_then(Duration::try_milliseconds)
            .and_then(|skip| next.checked_add_signed(skip))
            .ok_or_else(out_of_range)?;
    }
    Ok(Some(next))
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Interval(interval) => match interval.first_run_time {
                Some(first) => write!(
                    f,
                    "Interval[firstRunTime={},intervalMillis={}]",
                    first.to_rfc3339(),
                    interval.interval_millis
                ),
                None => write!(f, "Interval[intervalMillis={}]", interval.interval_millis),
            },
            Schedule::Cron(cron) => match &cron.time_zone {
                Some(zone) => write!(f, "Cron[expression='{}',timeZone={}]", cron.expression, zone),
                None => write!(f, "Cron[expression='{}']", cron.expression),
            },
        }
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
