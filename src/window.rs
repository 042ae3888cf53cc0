//! Date windows used by the resolution workflow
//!
//! Two policies exist and must not be mixed up:
//! - the *data window* is the calendar day the report covers (always yesterday);
//! - the *job-search window* scopes job creation time, which is when the export
//!   was triggered, so it slides around "now" instead.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, TimeZone, Utc};

use crate::types::DateWindow;

/// Yesterday in `now`'s time zone, from local midnight to 23:59:59.999
///
/// The window is always exactly one day minus one millisecond long, anchored
/// at the start of the previous local calendar day.
pub fn data_window<Tz: TimeZone>(now: &DateTime<Tz>) -> DateWindow {
    let today = now.date_naive();
    let yesterday = today.pred_opt().unwrap_or(today);
    let start = local_midnight(&now.timezone(), yesterday);

    DateWindow::new(start, start + Duration::days(1) - Duration::milliseconds(1))
}

/// Sliding window around `now` used to find recently created jobs
///
/// The lookahead absorbs clock skew between this host and the platform.
pub fn job_search_window(
    now: DateTime<Utc>,
    lookback: std::time::Duration,
    lookahead: std::time::Duration,
) -> DateWindow {
    DateWindow::new(now - to_chrono(lookback), now + to_chrono(lookahead))
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(chrono::NaiveTime::default());
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // Midnight skipped by a DST jump: the day starts at the first valid instant
        LocalResult::None => tz
            .from_local_datetime(&(midnight + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight)),
    }
}

fn to_chrono(duration: std::time::Duration) -> Duration {
    Duration::from_std(duration).unwrap_or_else(|_| Duration::days(365))
}
