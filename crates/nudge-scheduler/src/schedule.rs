//! Daily schedule entries and next-fire computation.

use chrono::{DateTime, LocalResult, TimeZone, Utc};
use chrono_tz::Tz;

/// Zone used when the configured identifier does not parse.
pub const DEFAULT_TZ: Tz = chrono_tz::Europe::Paris;

/// A daily wall-clock time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub hour: u32,
    pub minute: u32,
}

impl ScheduleEntry {
    /// Parse `"HH:MM"`; rejects out-of-range hours/minutes.
    pub fn parse(raw: &str) -> Option<Self> {
        let (h, m) = raw.trim().split_once(':')?;
        let hour: u32 = h.trim().parse().ok()?;
        let minute: u32 = m.trim().parse().ok()?;
        (hour <= 23 && minute <= 59).then_some(Self { hour, minute })
    }

    /// Next occurrence strictly after `now`, interpreted in `tz`.
    ///
    /// Ambiguous local times (fall-back transition) resolve to the earliest
    /// mapping; nonexistent local times (spring-forward gap) roll over to
    /// the next day.
    pub fn next_occurrence(&self, now: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
        let local_now = now.with_timezone(&tz);
        let mut date = local_now.date_naive();

        // Today, tomorrow, and one spare day in case of a DST gap.
        for _ in 0..3 {
            let naive = date.and_hms_opt(self.hour, self.minute, 0)?;
            let candidate = match tz.from_local_datetime(&naive) {
                LocalResult::Single(dt) => Some(dt),
                LocalResult::Ambiguous(earliest, _) => Some(earliest),
                LocalResult::None => None,
            };
            if let Some(dt) = candidate {
                if dt > local_now {
                    return Some(dt.with_timezone(&Utc));
                }
            }
            date = date.succ_opt()?;
        }
        None
    }
}

/// Parse configured times, skipping malformed entries with a warning.
pub fn parse_times(raw: &[String]) -> Vec<ScheduleEntry> {
    raw.iter()
        .filter_map(|t| {
            let entry = ScheduleEntry::parse(t);
            if entry.is_none() {
                tracing::warn!("Skipping malformed schedule time {t:?}");
            }
            entry
        })
        .collect()
}

/// Parse a timezone identifier, falling back to [`DEFAULT_TZ`] with a warning.
pub fn parse_timezone(name: &str) -> Tz {
    name.parse().unwrap_or_else(|_| {
        tracing::warn!("Unknown timezone {name:?}, falling back to {DEFAULT_TZ}");
        DEFAULT_TZ
    })
}

/// The minimum next occurrence across all entries, strictly after `now`.
/// `None` when the entry list is empty.
pub fn next_fire(now: DateTime<Utc>, entries: &[ScheduleEntry], tz: Tz) -> Option<DateTime<Utc>> {
    entries
        .iter()
        .filter_map(|e| e.next_occurrence(now, tz))
        .min()
}
