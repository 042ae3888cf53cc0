//! Selection of the export job that belongs to the current resolution

use crate::types::{DateWindow, Job};

/// Find the most recently created job named exactly `name` inside `window`
///
/// The name comparison is case-sensitive and the window includes both bounds.
/// When several jobs qualify the one with the latest creation time wins; ties
/// between equal timestamps resolve to the first such job in `jobs`.
pub fn find_match<'a>(jobs: &'a [Job], name: &str, window: &DateWindow) -> Option<&'a Job> {
    jobs.iter()
        .filter(|job| job.name == name && window.contains(job.created_at))
        .fold(None, |best: Option<&Job>, job| match best {
            Some(current) if current.created_at >= job.created_at => Some(current),
            _ => Some(job),
        })
}
