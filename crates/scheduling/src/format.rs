use chrono::Duration;

use crate::availability::DayAvailability;

/// Blocks at least this long are summarized as "All day".
const ALL_DAY_THRESHOLD_HOURS: i64 = 7;

/// Render availability results as the human-readable summary handed back to
/// the conversation service.
#[must_use]
pub fn format_availability(days: &[DayAvailability], timezone: &str) -> String {
    if days.is_empty() {
        return "No available slots found in the given date range.".to_string();
    }

    let mut out = format!("Available time blocks (timezone: {timezone}):\n\n");
    for day in days {
        out.push_str(&format!("{}:\n", day.day.format("%A, %B %d, %Y")));
        for block in &day.blocks {
            let start = block.start.format("%I:%M %p");
            let end = block.end.format("%I:%M %p");
            if block.duration() >= Duration::hours(ALL_DAY_THRESHOLD_HOURS) {
                out.push_str(&format!("  All day ({start} - {end})\n"));
            } else {
                out.push_str(&format!("  {start} - {end}\n"));
            }
        }
        out.push('\n');
    }

    out.trim().to_string()
}
