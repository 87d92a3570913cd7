use log::debug;

use crate::data::{PlacementRequest, Subject};
use crate::error::ConfigError;

/// Expands each subject's weekly sessions into independent placement requests.
///
/// A session needs `duration_minutes / slot_length` slots, truncated, and at
/// least one. Faculty and preferred room references must match the supplied
/// lists exactly after trimming.
pub fn expand_requirements(
    timetable: &str,
    subjects: &[Subject],
    faculties: &[String],
    rooms: &[String],
    slot_length_minutes: u32,
) -> Result<Vec<PlacementRequest>, ConfigError> {
    if slot_length_minutes == 0 {
        return Err(ConfigError::non_positive("lecture_slot_length_minutes"));
    }

    let mut requests = Vec::new();
    for subject in subjects {
        let faculty = subject.faculty.trim();
        if !faculties.iter().any(|f| f == faculty) {
            return Err(ConfigError::UnknownFaculty {
                subject: subject.name.trim().to_string(),
                faculty: faculty.to_string(),
            });
        }

        let preferred_room = subject
            .preferred_room
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());
        if let Some(room) = preferred_room {
            if !rooms.iter().any(|r| r == room) {
                return Err(ConfigError::UnknownRoom {
                    subject: subject.name.trim().to_string(),
                    room: room.to_string(),
                });
            }
        }

        let duration = subject.duration_minutes.unwrap_or(slot_length_minutes);
        let slots_needed = (duration / slot_length_minutes).max(1) as usize;

        let request = PlacementRequest {
            timetable: timetable.to_string(),
            subject_code: subject.code().to_string(),
            subject_name: subject.name.trim().to_string(),
            faculty: faculty.to_string(),
            slots_needed,
            preferred_room: preferred_room.map(str::to_string),
        };
        debug!(
            "Subject {} expands to {} x {}",
            subject.name, subject.sessions_per_week, request
        );
        requests.extend(std::iter::repeat_n(
            request,
            subject.sessions_per_week as usize,
        ));
    }
    Ok(requests)
}
