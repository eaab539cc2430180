//! Time formatting utilities.

use chrono::{DateTime, Utc};

/// Format how long ago `target` was, relative to now.
#[must_use]
pub fn format_relative_time(target: DateTime<Utc>) -> String {
    format_relative_to(target, Utc::now())
}

fn format_relative_to(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(target);

    if duration.num_seconds() < 60 {
        return "just now".to_string();
    }

    let plural = |n: i64| if n == 1 { "" } else { "s" };
    let days = duration.num_days();
    let hours = duration.num_hours();
    let minutes = duration.num_minutes();

    if days > 0 {
        format!("{days} day{} ago", plural(days))
    } else if hours > 0 {
        format!("{hours} hour{} ago", plural(hours))
    } else {
        format!("{minutes} minute{} ago", plural(minutes))
    }
}
