//! Wall-clock time handling for week bucketing
//!
//! Every date the engine compares is a naive wall-clock value in a single
//! `Zone`. Instants (RFC 3339 with an offset) are converted into that zone
//! once, at parse time, so week boundaries are always local midnights.

use chrono::{
  DateTime, Datelike, Days, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc,
};

/// ---------------------------------------------------------------------------
/// Zone
/// ---------------------------------------------------------------------------

/// The zone in which wall-clock dates are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
  /// Host local time
  #[default]
  System,
  /// A fixed UTC offset (deterministic, used by tests and `RUNBOARD_UTC_OFFSET`)
  Fixed(FixedOffset),
}

impl Zone {
  pub fn utc() -> Self {
    Zone::Fixed(Utc.fix())
  }

  /// Convert an instant to wall-clock time in this zone
  pub fn wall_clock(&self, instant: DateTime<Utc>) -> NaiveDateTime {
    match self {
      Zone::System => instant.with_timezone(&Local).naive_local(),
      Zone::Fixed(offset) => instant.with_timezone(offset).naive_local(),
    }
  }

  /// Current wall-clock time. Only the outermost caller should use this.
  pub fn now(&self) -> NaiveDateTime {
    self.wall_clock(Utc::now())
  }

  /// Parse `Z`, `UTC`, `+HH:MM`, `-HHMM` or `+HH` into a fixed zone.
  pub fn parse_offset(raw: &str) -> Option<Self> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
      return Some(Self::utc());
    }

    let (sign, rest) = match raw.chars().next()? {
      '+' => (1, &raw[1..]),
      '-' => (-1, &raw[1..]),
      _ => return None,
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
      return None;
    }
    let (hours, minutes) = match digits.len() {
      2 => (digits.parse::<i32>().ok()?, 0),
      4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
      _ => return None,
    };
    if hours > 23 || minutes > 59 {
      return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).map(Zone::Fixed)
  }
}

/// ---------------------------------------------------------------------------
/// Parsing
/// ---------------------------------------------------------------------------

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse a timestamp string into wall-clock time.
///
/// Strings carrying an offset are instants and go through `zone`; naive
/// date-times are already wall clock; a bare date is local midnight.
pub fn parse_timestamp(raw: &str, zone: Zone) -> Option<NaiveDateTime> {
  let raw = raw.trim();
  if raw.is_empty() {
    return None;
  }

  if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
    return Some(zone.wall_clock(instant.with_timezone(&Utc)));
  }

  for format in NAIVE_FORMATS {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
      return Some(naive);
    }
  }

  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .map(|date| date.and_time(NaiveTime::MIN))
}

/// Convert epoch milliseconds to wall-clock time
pub fn from_epoch_millis(millis: f64, zone: Zone) -> Option<NaiveDateTime> {
  if !millis.is_finite() {
    return None;
  }
  DateTime::from_timestamp_millis(millis.trunc() as i64).map(|instant| zone.wall_clock(instant))
}

/// ---------------------------------------------------------------------------
/// Week arithmetic
/// ---------------------------------------------------------------------------

/// Local midnight of the Monday on or before `date`.
pub fn start_of_iso_week(date: NaiveDateTime) -> NaiveDateTime {
  let day = date.date();
  let back = u64::from(day.weekday().num_days_from_monday());
  day
    .checked_sub_days(Days::new(back))
    .unwrap_or(day)
    .and_time(NaiveTime::MIN)
}

/// Calendar-day arithmetic, saturating at the representable range.
pub fn add_days(date: NaiveDateTime, days: i64) -> NaiveDateTime {
  let shifted = if days >= 0 {
    date.checked_add_days(Days::new(days.unsigned_abs()))
  } else {
    date.checked_sub_days(Days::new(days.unsigned_abs()))
  };

  shifted.unwrap_or(if days >= 0 {
    NaiveDateTime::MAX
  } else {
    NaiveDateTime::MIN
  })
}

/// Half-open membership: `start <= date < end`.
pub fn in_range(date: NaiveDateTime, start: NaiveDateTime, end: NaiveDateTime) -> bool {
  date >= start && date < end
}
