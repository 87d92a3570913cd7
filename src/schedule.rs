use chrono::NaiveTime;
use itertools::Itertools;
use std::collections::{HashMap, HashSet};

use crate::data::{
    Assignment, PlacementRequest, Schedule, ScheduleEntry, SlotIndex, TimeFormat, TimeSlot,
    TimetableConfig,
};
use crate::lattice::slot_end;

pub fn format_time(t: NaiveTime, format: TimeFormat) -> String {
    match format {
        TimeFormat::TwelveHour => t.format("%I:%M %p").to_string().to_lowercase(),
        TimeFormat::TwentyFourHour => t.format("%H:%M").to_string(),
    }
}

/// Expands assignments into one entry per occupied slot.
///
/// Wall-clock times come from each slot's own start time, never from its
/// index, since the recess shifts indices. Entries are ordered by day, start
/// time, room and subject name.
pub fn render_schedule(
    config: &TimetableConfig,
    requests: &[PlacementRequest],
    lattice: &[TimeSlot],
    assignments: &[Assignment],
) -> Schedule {
    let mut schedule: Schedule = assignments
        .iter()
        .enumerate()
        .flat_map(|(session, assignment)| {
            let request = &requests[assignment.request];
            assignment.slots().map(move |slot| {
                let time_slot = &lattice[slot];
                ScheduleEntry {
                    day: config.day_label(time_slot.day),
                    start_time: format_time(time_slot.start, config.time_format),
                    end_time: format_time(
                        slot_end(time_slot, config.lecture_slot_length_minutes),
                        config.time_format,
                    ),
                    room: assignment.room.clone(),
                    subject_code: request.subject_code.clone(),
                    subject_name: request.subject_name.clone(),
                    faculty: request.faculty.clone(),
                    slot,
                    session,
                }
            })
        })
        .collect();

    schedule.sort_by(|a, b| {
        (a.slot, &a.room, &a.subject_name).cmp(&(b.slot, &b.room, &b.subject_name))
    });
    schedule
}

/// A pair of entries booked into the same slot that share a room or a faculty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub slot: SlotIndex,
    pub first: usize,
    pub second: usize,
    pub reason: &'static str,
}

/// Checks a finished schedule for double-booked rooms and faculties.
pub fn find_conflicts(schedule: &[ScheduleEntry]) -> Vec<Conflict> {
    let by_slot: HashMap<SlotIndex, Vec<usize>> = schedule
        .iter()
        .enumerate()
        .map(|(i, entry)| (entry.slot, i))
        .into_group_map();

    let mut conflicts: Vec<Conflict> = by_slot
        .into_iter()
        .flat_map(move |(slot, entries)| {
            entries
                .into_iter()
                .tuple_combinations()
                .filter_map(move |(first, second)| {
                    let (a, b) = (&schedule[first], &schedule[second]);
                    let reason = if a.room == b.room {
                        "room"
                    } else if a.faculty == b.faculty {
                        "faculty"
                    } else {
                        return None;
                    };
                    Some(Conflict {
                        slot,
                        first,
                        second,
                        reason,
                    })
                })
        })
        .collect();
    conflicts.sort_by_key(|c| (c.first, c.second));
    conflicts
}

/// Number of placed sessions per subject code, counting a multi-slot session once.
pub fn sessions_per_subject(schedule: &[ScheduleEntry]) -> HashMap<String, usize> {
    schedule
        .iter()
        .map(|entry| (entry.subject_code.clone(), entry.session))
        .collect::<HashSet<_>>()
        .into_iter()
        .map(|(code, _)| code)
        .counts()
}
