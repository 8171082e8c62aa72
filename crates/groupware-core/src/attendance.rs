//! Attendance records and the statistics derived from them.
//!
//! There is at most one record per user per work date. `work_minutes` is
//! derived when the record is closed and is never set directly.

use chrono::{DateTime, Datelike as _, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
  #[default]
  Normal,
  Late,
  EarlyLeave,
  Absent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
  pub id:           Uuid,
  pub user_id:      Uuid,
  pub work_date:    NaiveDate,
  pub clock_in:     Option<DateTime<Utc>>,
  pub clock_out:    Option<DateTime<Utc>>,
  pub work_minutes: Option<i64>,
  pub status:       AttendanceStatus,
  pub note:         Option<String>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl Attendance {
  /// Open a record for `user_id` on the UTC date of `at`.
  pub fn open(user_id: Uuid, at: DateTime<Utc>) -> Self {
    Self {
      id: Uuid::new_v4(),
      user_id,
      work_date: at.date_naive(),
      clock_in: Some(at),
      clock_out: None,
      work_minutes: None,
      status: AttendanceStatus::Normal,
      note: None,
      created_at: at,
      updated_at: at,
    }
  }

  pub fn is_open(&self) -> bool { self.clock_out.is_none() }

  /// Close the record at `at`, deriving `work_minutes`.
  ///
  /// Fails if the record is already closed, and refuses a clock-out that
  /// precedes the clock-in. The record is untouched on failure.
  pub fn close(&mut self, at: DateTime<Utc>) -> Result<()> {
    if self.clock_out.is_some() {
      return Err(Error::AlreadyClockedOut {
        user_id: self.user_id,
        date:    self.work_date,
      });
    }
    let clock_in = self.clock_in.ok_or(Error::NotClockedIn {
      user_id: self.user_id,
      date:    self.work_date,
    })?;
    let minutes = work_minutes(clock_in, at)?;

    self.clock_out = Some(at);
    self.work_minutes = Some(minutes);
    self.updated_at = at;
    Ok(())
  }
}

/// Whole minutes between clock-in and clock-out, rounded down.
pub fn work_minutes(clock_in: DateTime<Utc>, clock_out: DateTime<Utc>) -> Result<i64> {
  if clock_out < clock_in {
    return Err(Error::Validation("clock-out precedes clock-in".into()));
  }
  Ok((clock_out - clock_in).num_milliseconds().div_euclid(60_000))
}

// ─── Date ranges ─────────────────────────────────────────────────────────────

/// An inclusive range of work dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
  pub start: NaiveDate,
  pub end:   NaiveDate,
}

impl DateRange {
  pub fn contains(&self, date: NaiveDate) -> bool { self.start <= date && date <= self.end }

  /// Monday through Friday of the week containing `today`.
  pub fn work_week(today: NaiveDate) -> Self {
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    Self { start: monday, end: monday + Duration::days(4) }
  }

  /// The first through last day of `month` (1-12) in `year`.
  pub fn month(year: i32, month: u32) -> Result<Self> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
      .ok_or_else(|| Error::Validation(format!("invalid month {year}-{month}")))?;
    let next = if month == 12 {
      NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
      NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| Error::Validation(format!("invalid month {year}-{month}")))?;
    Ok(Self { start, end: next - Duration::days(1) })
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::GroupwareStore::list_attendance`].
///
/// Kept flat so it round-trips through a URL query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttendanceQuery {
  /// Restrict to one user; `None` means the whole team.
  pub user_id: Option<Uuid>,
  /// Inclusive lower bound on `work_date`.
  pub start:   Option<NaiveDate>,
  /// Inclusive upper bound on `work_date`.
  pub end:     Option<NaiveDate>,
}

impl AttendanceQuery {
  pub fn for_user(user_id: Uuid, range: DateRange) -> Self {
    Self { user_id: Some(user_id), start: Some(range.start), end: Some(range.end) }
  }

  pub fn team(range: DateRange) -> Self {
    Self { user_id: None, start: Some(range.start), end: Some(range.end) }
  }

  pub fn matches(&self, a: &Attendance) -> bool {
    if self.user_id.is_some_and(|u| u != a.user_id) {
      return false;
    }
    if self.start.is_some_and(|s| a.work_date < s) {
      return false;
    }
    if self.end.is_some_and(|e| a.work_date > e) {
      return false;
    }
    true
  }
}

/// Ascending by work date; ties keep their relative order.
pub fn sort_attendance(records: &mut [Attendance]) {
  records.sort_by_key(|a| a.work_date);
}

// ─── Statistics ──────────────────────────────────────────────────────────────

/// Aggregates over a set of attendance records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceStats {
  pub total_days:        usize,
  pub total_minutes:     i64,
  pub total_hours:       i64,
  pub remaining_minutes: i64,
  pub normal_days:       usize,
  pub late_days:         usize,
  pub early_leave_days:  usize,
}

impl AttendanceStats {
  /// Pure and order-invariant. Records without `work_minutes` count as zero.
  pub fn compute(records: &[Attendance]) -> Self {
    let total_minutes: i64 = records.iter().map(|a| a.work_minutes.unwrap_or(0)).sum();
    let count = |status: AttendanceStatus| records.iter().filter(|a| a.status == status).count();

    Self {
      total_days: records.len(),
      total_minutes,
      total_hours: total_minutes.div_euclid(60),
      remaining_minutes: total_minutes.rem_euclid(60),
      normal_days: count(AttendanceStatus::Normal),
      late_days: count(AttendanceStatus::Late),
      early_leave_days: count(AttendanceStatus::EarlyLeave),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;
  use crate::testing::attendance;

  fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 4, h, m, s).unwrap()
  }

  #[test]
  fn nine_to_six_is_540_minutes() {
    assert_eq!(work_minutes(at(9, 0, 0), at(18, 0, 0)).unwrap(), 540);
  }

  #[test]
  fn partial_minutes_round_down() {
    assert_eq!(work_minutes(at(9, 0, 0), at(9, 1, 59)).unwrap(), 1);
    assert_eq!(work_minutes(at(9, 0, 0), at(9, 0, 59)).unwrap(), 0);
  }

  #[test]
  fn clock_out_before_clock_in_is_rejected() {
    assert!(work_minutes(at(9, 0, 0), at(8, 59, 0)).is_err());

    let mut record = Attendance::open(Uuid::new_v4(), at(9, 0, 0));
    assert!(record.close(at(8, 0, 0)).is_err());
    assert!(record.is_open());
    assert_eq!(record.work_minutes, None);
  }

  #[test]
  fn closing_twice_fails() {
    let mut record = Attendance::open(Uuid::new_v4(), at(9, 0, 0));
    record.close(at(18, 0, 0)).unwrap();
    assert_eq!(record.work_minutes, Some(540));

    let err = record.close(at(19, 0, 0)).unwrap_err();
    assert!(matches!(err, Error::AlreadyClockedOut { .. }));
    assert_eq!(record.clock_out, Some(at(18, 0, 0)));
  }

  #[test]
  fn stats_of_nothing_are_zero() {
    assert_eq!(AttendanceStats::compute(&[]), AttendanceStats::default());
  }

  #[test]
  fn stats_sum_minutes_and_split_hours() {
    let records = [
      attendance("2025-03-03", Some(540), AttendanceStatus::Normal),
      attendance("2025-03-04", Some(510), AttendanceStatus::Late),
      attendance("2025-03-05", Some(480), AttendanceStatus::EarlyLeave),
    ];
    let stats = AttendanceStats::compute(&records);
    assert_eq!(stats.total_days, 3);
    assert_eq!(stats.total_minutes, 1530);
    assert_eq!(stats.total_hours, 25);
    assert_eq!(stats.remaining_minutes, 30);
    assert_eq!((stats.normal_days, stats.late_days, stats.early_leave_days), (1, 1, 1));
  }

  #[test]
  fn stats_treat_missing_minutes_as_zero_and_ignore_order() {
    let mut records = vec![
      attendance("2025-03-03", None, AttendanceStatus::Normal),
      attendance("2025-03-04", Some(61), AttendanceStatus::Absent),
      attendance("2025-03-05", Some(480), AttendanceStatus::Normal),
    ];
    let forward = AttendanceStats::compute(&records);
    records.reverse();
    assert_eq!(forward, AttendanceStats::compute(&records));
    assert_eq!(forward.total_minutes, 541);
    assert_eq!(forward.normal_days, 2);
  }

  #[test]
  fn work_week_spans_monday_to_friday() {
    let sunday = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
    let range = DateRange::work_week(sunday);
    assert_eq!(range.start, NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
    assert_eq!(range.end, NaiveDate::from_ymd_opt(2025, 3, 7).unwrap());
  }

  #[test]
  fn month_range_handles_leap_february_and_december() {
    let feb = DateRange::month(2024, 2).unwrap();
    assert_eq!(feb.end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    let dec = DateRange::month(2025, 12).unwrap();
    assert_eq!(dec.end, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    assert!(DateRange::month(2025, 13).is_err());
  }

  #[test]
  fn query_range_is_inclusive() {
    let user = Uuid::new_v4();
    let mut rec = attendance("2025-03-07", None, AttendanceStatus::Normal);
    rec.user_id = user;
    let week = DateRange::work_week(rec.work_date);

    assert!(AttendanceQuery::for_user(user, week).matches(&rec));
    assert!(!AttendanceQuery::for_user(Uuid::new_v4(), week).matches(&rec));
    assert!(AttendanceQuery::team(week).matches(&rec));
  }
}
