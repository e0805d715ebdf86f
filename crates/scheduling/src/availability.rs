use {
    chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone},
    chrono_tz::Tz,
};

/// An opaque time range during which the calendar is occupied.
///
/// Invariant: `start < end`. Intervals may fall partly or wholly outside the
/// working-hour window; the sweep clamps them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusyInterval {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

/// An available time range, always confined to one day's working-hour window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeBlock {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl FreeBlock {
    /// Length of the block.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Free blocks found on one calendar day. Days without qualifying blocks are
/// omitted from results entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayAvailability {
    pub day: NaiveDate,
    pub blocks: Vec<FreeBlock>,
}

/// Daily working-hour window, `start` inclusive to `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingHours {
    pub start: u8,
    pub end: u8,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self { start: 9, end: 17 }
    }
}

impl WorkingHours {
    #[must_use]
    pub fn new(start: u8, end: u8) -> Self {
        Self { start, end }
    }
}

/// Find every free block of at least `slot_duration` between `range_start`
/// and `range_end`.
///
/// Per calendar day the working-hour window is clipped to the overall range
/// (the first and last day may be partial), the day's busy intervals are
/// clamped to the window and sorted, and a single left-to-right sweep emits
/// the gaps long enough to fit `slot_duration`.
///
/// All arithmetic happens in `tz`; busy intervals are converted up front.
/// A busy interval belongs to the day its (converted) start falls on.
#[must_use]
pub fn find_free_blocks(
    range_start: DateTime<Tz>,
    range_end: DateTime<Tz>,
    busy: &[BusyInterval],
    working_hours: WorkingHours,
    slot_duration: Duration,
    tz: Tz,
) -> Vec<DayAvailability> {
    let range_start = range_start.with_timezone(&tz);
    let range_end = range_end.with_timezone(&tz);

    let busy: Vec<BusyInterval> = busy
        .iter()
        .map(|interval| BusyInterval {
            start: interval.start.with_timezone(&tz),
            end: interval.end.with_timezone(&tz),
        })
        .collect();

    let mut days = Vec::new();
    let mut current = range_start.date_naive();
    let last = range_end.date_naive();

    while current <= last {
        if let Some(day) = sweep_day(
            current,
            range_start,
            range_end,
            &busy,
            working_hours,
            slot_duration,
            tz,
        ) {
            days.push(day);
        }
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }

    days
}

fn sweep_day(
    date: NaiveDate,
    range_start: DateTime<Tz>,
    range_end: DateTime<Tz>,
    busy: &[BusyInterval],
    working_hours: WorkingHours,
    slot_duration: Duration,
    tz: Tz,
) -> Option<DayAvailability> {
    let mut day_start = local_time(tz, date, working_hours.start)?;
    let mut day_end = local_time(tz, date, working_hours.end)?;

    // First/last day may be partial.
    if day_start < range_start {
        day_start = range_start;
    }
    if day_end > range_end {
        day_end = range_end;
    }
    if day_start >= day_end {
        return None;
    }

    // This day's busy intervals, clamped to the working window.
    let mut day_busy: Vec<(DateTime<Tz>, DateTime<Tz>)> = busy
        .iter()
        .filter(|interval| interval.start.date_naive() == date)
        .map(|interval| (interval.start.max(day_start), interval.end.min(day_end)))
        .filter(|(start, end)| start < end)
        .collect();
    day_busy.sort_by_key(|(start, _)| *start);

    let mut blocks = Vec::new();
    let mut cursor = day_start;

    for (busy_start, busy_end) in day_busy {
        if cursor + slot_duration <= busy_start {
            blocks.push(FreeBlock {
                start: cursor,
                end: busy_start,
            });
        }
        cursor = cursor.max(busy_end);
    }

    if cursor + slot_duration <= day_end {
        blocks.push(FreeBlock {
            start: cursor,
            end: day_end,
        });
    }

    if blocks.is_empty() {
        return None;
    }
    Some(DayAvailability { day: date, blocks })
}

/// Resolve a local wall-clock hour on a date. Ambiguous local times (DST
/// fall-back) resolve to the earlier instant; nonexistent ones (spring-forward
/// gap) resolve to `None`.
fn local_time(tz: Tz, date: NaiveDate, hour: u8) -> Option<DateTime<Tz>> {
    let time = NaiveTime::from_hms_opt(u32::from(hour), 0, 0)?;
    tz.from_local_datetime(&date.and_time(time)).earliest()
}
