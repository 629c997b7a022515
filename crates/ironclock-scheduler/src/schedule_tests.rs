use super::*;
use chrono::TimeZone;

fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, hour, minute, second).unwrap()
}

#[test]
fn test_run_once_schedule() {
    let schedule = Schedule::run_once(None);
    assert!(schedule.is_run_once());
    assert!(!Schedule::for_interval(1000, None).is_run_once());
    assert!(!Schedule::for_cron_expression("0 * * * * *", None).is_run_once());
}

#[test]
fn test_from_parts_requires_exactly_one_variant() {
    let interval = IntervalSchedule::new(None, 1000);
    let cron = CronSchedule::new("0 * * * * *", None);

    assert!(matches!(
        Schedule::from_parts(Some(interval.clone()), None),
        Ok(Schedule::Interval(_))
    ));
    assert!(matches!(
        Schedule::from_parts(None, Some(cron.clone())),
        Ok(Schedule::Cron(_))
    ));
    assert!(matches!(
        Schedule::from_parts(None, None),
        Err(SchedulerError::InvalidSchedule(_))
    ));
    assert!(matches!(
        Schedule::from_parts(Some(interval), Some(cron)),
        Err(SchedulerError::InvalidSchedule(_))
    ));
}

#[test]
fn test_interval_first_run_defaults_to_now() {
    let now = at(10, 0, 0);
    let schedule = Schedule::for_interval(60_000, None);
    assert_eq!(schedule.next_run_time(now, None).unwrap(), Some(now));

    let first = at(12, 0, 0);
    let schedule = Schedule::for_interval(60_000, Some(first));
    assert_eq!(schedule.next_run_time(now, None).unwrap(), Some(first));
}

#[test]
fn test_interval_next_run_after_previous() {
    let schedule = Schedule::for_interval(60_000, None);
    let previous = at(10, 0, 0);
    let next = schedule.next_run_time(at(10, 0, 1), Some(previous)).unwrap();
    assert_eq!(next, Some(at(10, 1, 0)));
}

#[test]
fn test_interval_skips_missed_slots() {
    let schedule = Schedule::for_interval(60_000, None);
    let previous = at(10, 0, 0);
    let next = schedule.next_run_time(at(10, 5, 30), Some(previous)).unwrap();
    assert_eq!(next, Some(at(10, 6, 0)));
}

#[test]
fn test_huge_interval_is_rejected_instead_of_overflowing() {
    let now = at(10, 0, 0);
    let schedule = Schedule::for_interval(10_000_000_000_000_000, Some(now));
    let result = schedule.next_run_time(now, Some(now));
    assert!(matches!(result, Err(SchedulerError::InvalidSchedule(_))));
}

#[test]
fn test_interval_beyond_i64_is_rejected() {
    let now = at(10, 0, 0);
    let schedule = Schedule::for_interval(u64::MAX, Some(now));
    let result = schedule.next_run_time(now, Some(now));
    assert!(matches!(result, Err(SchedulerError::InvalidSchedule(ref message)) if message.contains("out of range")));
}

#[test]
fn test_run_once_does_not_repeat() {
    let schedule = Schedule::run_once(Some(at(10, 0, 0)));
    assert_eq!(schedule.next_run_time(at(11, 0, 0), Some(at(10, 0, 0))).unwrap(), None);
}

#[test]
fn test_cron_next_run_in_utc() {
    let schedule = Schedule::for_cron_expression("0 30 * * * *", None);
    let next = schedule.next_run_time(at(10, 0, 0), None).unwrap();
    assert_eq!(next, Some(at(10, 30, 0)));
}

#[test]
fn test_cron_next_run_in_time_zone() {
    // 09:00 in Tokyo (UTC+9, no DST) is 00:00 UTC.
    let schedule = Schedule::for_cron_expression("0 0 9 * * *", Some("Asia/Tokyo".to_string()));
    let next = schedule.next_run_time(at(10, 0, 0), None).unwrap();
    assert_eq!(next, Some(Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap()));
}

#[test]
fn test_invalid_cron_expression() {
    let schedule = Schedule::for_cron_expression("not a cron", None);
    let result = schedule.next_run_time(at(10, 0, 0), None);
    assert!(matches!(result, Err(SchedulerError::InvalidCronExpression { .. })));
}

#[test]
fn test_unknown_time_zone() {
    let schedule = Schedule::for_cron_expression("0 0 9 * * *", Some("Mars/Olympus".to_string()));
    let result = schedule.next_run_time(at(10, 0, 0), None);
    assert!(matches!(result, Err(SchedulerError::UnknownTimeZone(_))));
}

#[test]
fn test_display() {
    assert_eq!(
        Schedule::for_interval(500, None).to_string(),
        "Interval[intervalMillis=500]"
    );
    assert_eq!(
        Schedule::for_cron_expression("0 0 * * * *", None).to_string(),
        "Cron[expression='0 0 * * * *']"
    );
}
