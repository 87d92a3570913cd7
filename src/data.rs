use chrono::NaiveTime;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

use crate::error::ConfigError;

/// Upper bound on `num_timetables` accepted from a configuration.
pub const MAX_TIMETABLES: usize = 1000;

// Type aliases for clarity
pub type DayIndex = usize;
/// Position of a slot in the flat, day-major lattice.
pub type SlotIndex = usize;
pub type RequestId = usize;

/// A teaching room. Only the name matters for scheduling.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Room {
    pub name: String,
}

/// A member of staff who can be assigned to subjects.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Faculty {
    pub name: String,
}

/// A subject with its weekly teaching requirement.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Subject {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    pub faculty: String,
    #[serde(default = "default_sessions_per_week")]
    pub sessions_per_week: u32,
    /// Falls back to one lecture slot when absent.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub preferred_room: Option<String>,
}

impl Subject {
    /// Subject code, falling back to the display name.
    pub fn code(&self) -> &str {
        match &self.code {
            Some(code) if !code.trim().is_empty() => code.trim(),
            _ => self.name.trim(),
        }
    }
}

/// How rendered start/end times look in a schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
pub enum TimeFormat {
    /// `09:00 am`
    #[default]
    #[serde(rename = "12h")]
    #[value(name = "12h")]
    TwelveHour,
    /// `09:00`
    #[serde(rename = "24h")]
    #[value(name = "24h")]
    TwentyFourHour,
}

/// The complete input for timetable generation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimetableConfig {
    #[serde(default = "default_num_timetables")]
    pub num_timetables: usize,
    #[serde(default)]
    pub timetable_names: Vec<String>,
    #[serde(default = "default_working_days")]
    pub working_days: usize,
    #[serde(default)]
    pub selected_days: Vec<String>,
    pub day_start: String,
    pub day_end: String,
    #[serde(default = "default_slot_length")]
    pub lecture_slot_length_minutes: u32,
    pub rooms: Vec<Room>,
    pub faculties: Vec<Faculty>,
    pub subjects: Vec<Subject>,
    #[serde(default = "default_attempts_per_timetable")]
    pub attempts_per_timetable: usize,
    #[serde(default = "default_max_overall_attempts")]
    pub max_overall_attempts: usize,
    /// Let a multi-slot session run from the end of one day into the next.
    #[serde(default)]
    pub allow_cross_day_runs: bool,
    /// Seed for the generator that draws per-timetable seeds.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Reject a timetable identical to one already produced in this run.
    #[serde(default)]
    pub distinct_timetables: bool,
    /// Cap on candidate placements explored by one solve attempt.
    #[serde(default)]
    pub search_node_limit: Option<u64>,
    #[serde(default)]
    pub time_format: TimeFormat,
}

fn default_num_timetables() -> usize {
    1
}

fn default_working_days() -> usize {
    5
}

fn default_slot_length() -> u32 {
    50
}

fn default_sessions_per_week() -> u32 {
    1
}

fn default_attempts_per_timetable() -> usize {
    200
}

fn default_max_overall_attempts() -> usize {
    1000
}

impl TimetableConfig {
    /// Structural checks that do not depend on cross references.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let counts = [
            ("num_timetables", self.num_timetables),
            ("working_days", self.working_days),
            (
                "lecture_slot_length_minutes",
                self.lecture_slot_length_minutes as usize,
            ),
            ("attempts_per_timetable", self.attempts_per_timetable),
            ("max_overall_attempts", self.max_overall_attempts),
        ];
        if let Some((field, _)) = counts.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::non_positive(*field));
        }
        if self.num_timetables > MAX_TIMETABLES {
            return Err(ConfigError::TooLarge {
                field: "num_timetables",
                max: MAX_TIMETABLES,
            });
        }

        if self.room_names().is_empty() {
            return Err(ConfigError::MissingSection("rooms"));
        }
        if self.faculty_names().is_empty() {
            return Err(ConfigError::MissingSection("faculties"));
        }
        if self.subjects.is_empty() {
            return Err(ConfigError::MissingSection("subjects"));
        }

        for subject in &self.subjects {
            if subject.sessions_per_week == 0 {
                return Err(ConfigError::non_positive(format!(
                    "{}.sessions_per_week",
                    subject.name
                )));
            }
            if subject.duration_minutes == Some(0) {
                return Err(ConfigError::non_positive(format!(
                    "{}.duration_minutes",
                    subject.name
                )));
            }
        }
        Ok(())
    }

    pub fn room_names(&self) -> Vec<String> {
        trimmed_names(self.rooms.iter().map(|r| r.name.as_str()))
    }

    pub fn faculty_names(&self) -> Vec<String> {
        trimmed_names(self.faculties.iter().map(|f| f.name.as_str()))
    }

    /// Exactly `num_timetables` names, padding with `TT_<n>` where none was given.
    pub fn timetable_names(&self) -> Vec<String> {
        (0..self.num_timetables)
            .map(|i| self.timetable_name(i))
            .collect()
    }

    pub fn timetable_name(&self, i: usize) -> String {
        match self.timetable_names.get(i).map(|n| n.trim()) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("TT_{}", i + 1),
        }
    }

    /// Label for a day, falling back to its position when no label was supplied.
    pub fn day_label(&self, day: DayIndex) -> String {
        match self.selected_days.get(day).map(|d| d.trim()) {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => format!("Day {}", day + 1),
        }
    }
}

/// Trimmed, non-empty names; a repeated name keeps its first position.
fn trimmed_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    names
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unique()
        .map(str::to_string)
        .collect()
}

/// One fixed-length window in the slot lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSlot {
    pub day: DayIndex,
    /// Index within the day, contiguous after the recess slot is removed.
    pub index: usize,
    pub start: NaiveTime,
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}_S{}", self.day, self.index)
    }
}

/// One atomic teaching session that needs a contiguous run of slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlacementRequest {
    pub timetable: String,
    pub subject_code: String,
    pub subject_name: String,
    pub faculty: String,
    pub slots_needed: usize,
    pub preferred_room: Option<String>,
}

impl fmt::Display for PlacementRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}({}, {})",
            self.timetable, self.subject_code, self.faculty, self.slots_needed
        )
    }
}

/// A placed request: a contiguous run of lattice slots in one room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Assignment {
    pub request: RequestId,
    pub room: String,
    pub start_slot: SlotIndex,
    pub slot_count: usize,
}

impl Assignment {
    pub fn slots(&self) -> Range<SlotIndex> {
        self.start_slot..self.start_slot + self.slot_count
    }
}

/// One occupied slot in a finished timetable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ScheduleEntry {
    pub day: String,
    pub start_time: String,
    pub end_time: String,
    pub room: String,
    pub subject_code: String,
    pub subject_name: String,
    pub faculty: String,
    /// Lattice position, kept for ordering and overlap checks.
    #[serde(skip)]
    pub slot: SlotIndex,
    /// Entries from the same placed session share this number.
    #[serde(skip)]
    pub session: usize,
}

pub type Schedule = Vec<ScheduleEntry>;

/// A timetable the driver managed to produce.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedTimetable {
    pub name: String,
    pub seed: u64,
    pub schedule: Schedule,
}

/// The final output of the diversity driver.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub timetables: Vec<GeneratedTimetable>,
    pub requested: usize,
    pub seed_draws: usize,
}

impl GenerationReport {
    pub fn is_complete(&self) -> bool {
        self.timetables.len() == self.requested
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use serde_json::json;

    /// Two rooms, two faculties, three subjects over a 09:00-17:00 week.
    pub fn sample_config() -> TimetableConfig {
        serde_json::from_value(json!({
            "num_timetables": 2,
            "timetable_names": ["A", "B"],
            "working_days": 5,
            "selected_days": ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"],
            "day_start": "09:00",
            "day_end": "17:00",
            "lecture_slot_length_minutes": 50,
            "rooms": [{"name": "Room 101"}, {"name": "Room 102"}],
            "faculties": [{"name": "Prof. A"}, {"name": "Prof. B"}],
            "subjects": [
                {"name": "Algebra", "code": "MA101", "faculty": "Prof. A", "sessions_per_week": 3, "duration_minutes": 50},
                {"name": "Physics Lab", "code": "PH110", "faculty": "Prof. B", "sessions_per_week": 2, "duration_minutes": 100, "preferred_room": "Room 102"},
                {"name": "Mechanics", "faculty": "Prof. B", "sessions_per_week": 2},
            ],
            "seed": 42,
        }))
        .expect("fixture config is valid JSON")
    }
}
