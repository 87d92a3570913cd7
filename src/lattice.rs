//! Slot lattice construction: the fixed-length time windows available each day.

use chrono::{NaiveTime, TimeDelta, Timelike};
use log::debug;

use crate::data::{TimeSlot, TimetableConfig};
use crate::error::ConfigError;

/// Days at least this long lose one slot near the midpoint as a recess.
pub const RECESS_MIN_SPAN_MINUTES: u32 = 240;

const CLOCK_FORMATS: [&str; 3] = ["%H:%M", "%I:%M %p", "%I:%M%p"];

/// Parses `HH:MM` (24-hour) or `H:MM am/pm` into a time of day.
pub fn parse_clock_time(s: &str) -> Result<NaiveTime, ConfigError> {
    let s = s.trim();
    CLOCK_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| ConfigError::MalformedTime(s.to_string()))
}

fn minutes_from_midnight(t: NaiveTime) -> u32 {
    t.num_seconds_from_midnight() / 60
}

/// Builds the ordered `(index, start_time)` windows for one working day.
///
/// Slots are laid end to end from `day_start`; one that would run past
/// `day_end` is dropped. When the day spans at least four hours the slot
/// starting closest to the midpoint is removed (the first one wins a tie)
/// and the remainder is reindexed from zero.
pub fn build_day_slots(
    day_start: &str,
    day_end: &str,
    slot_length_minutes: u32,
) -> Result<Vec<(usize, NaiveTime)>, ConfigError> {
    let start = parse_clock_time(day_start)?;
    let end = parse_clock_time(day_end)?;
    if end <= start {
        return Err(ConfigError::EmptyDay {
            start: day_start.trim().to_string(),
            end: day_end.trim().to_string(),
        });
    }
    if slot_length_minutes == 0 {
        return Err(ConfigError::non_positive("lecture_slot_length_minutes"));
    }

    let start_min = minutes_from_midnight(start);
    let end_min = minutes_from_midnight(end);
    let span = end_min - start_min;

    let mut base: Vec<NaiveTime> = Vec::new();
    let mut offset = 0;
    while offset + slot_length_minutes <= span {
        base.push(start + TimeDelta::minutes(i64::from(offset)));
        offset += slot_length_minutes;
    }

    if span >= RECESS_MIN_SPAN_MINUTES && !base.is_empty() {
        // compare doubled minutes so the midpoint stays integral
        let doubled_mid = i64::from(start_min + end_min);
        let mut recess = 0;
        let mut closest = i64::MAX;
        for (j, t) in base.iter().enumerate() {
            let delta = (2 * i64::from(minutes_from_midnight(*t)) - doubled_mid).abs();
            if delta < closest {
                closest = delta;
                recess = j;
            }
        }
        debug!("Recess at {} between {} and {}", base[recess], start, end);
        base.remove(recess);
    }

    Ok(base.into_iter().enumerate().collect())
}

/// Builds the full lattice for every working day, in day-major order.
pub fn build_lattice(config: &TimetableConfig) -> Result<Vec<TimeSlot>, ConfigError> {
    let day_slots = build_day_slots(
        &config.day_start,
        &config.day_end,
        config.lecture_slot_length_minutes,
    )?;

    Ok((0..config.working_days)
        .flat_map(|day| {
            day_slots.iter().map(move |&(index, start)| TimeSlot {
                day,
                index,
                start,
            })
        })
        .collect())
}

/// End of a slot given the configured slot length.
pub fn slot_end(slot: &TimeSlot, slot_length_minutes: u32) -> NaiveTime {
    slot.start + TimeDelta::minutes(i64::from(slot_length_minutes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::sample_config;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn starts(slots: &[(usize, NaiveTime)]) -> Vec<NaiveTime> {
        slots.iter().map(|(_, t)| *t).collect()
    }

    #[test]
    fn parses_24_hour_and_12_hour() {
        assert_eq!(parse_clock_time("09:00"), Ok(hm(9, 0)));
        assert_eq!(parse_clock_time(" 17:45 "), Ok(hm(17, 45)));
        assert_eq!(parse_clock_time("01:30 PM"), Ok(hm(13, 30)));
        assert_eq!(parse_clock_time("12:15 am"), Ok(hm(0, 15)));
    }

    #[test]
    fn rejects_malformed_time() {
        assert_eq!(
            parse_clock_time("25:00"),
            Err(ConfigError::MalformedTime("25:00".to_string()))
        );
        assert!(parse_clock_time("nine").is_err());
    }

    #[test]
    fn full_day_loses_one_slot_to_recess() {
        // 480 minutes / 50 = 9 base slots, minus the recess
        let slots = build_day_slots("09:00", "17:00", 50).unwrap();
        assert_eq!(slots.len(), 8);
        // 13:10 is closest to the 13:00 midpoint
        assert!(!starts(&slots).contains(&hm(13, 10)));
        assert_eq!(slots[4], (4, hm(12, 20)));
        assert_eq!(slots[5], (5, hm(14, 0)));
    }

    #[test]
    fn indices_are_contiguous_after_recess() {
        let slots = build_day_slots("08:00", "16:00", 60).unwrap();
        let indices: Vec<usize> = slots.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, (0..slots.len()).collect::<Vec<_>>());
    }

    #[test]
    fn short_day_keeps_every_slot() {
        let slots = build_day_slots("09:00", "12:00", 50).unwrap();
        assert_eq!(starts(&slots), vec![hm(9, 0), hm(9, 50), hm(10, 40)]);
    }

    #[test]
    fn exactly_four_hours_gets_recess() {
        let slots = build_day_slots("09:00", "13:00", 60).unwrap();
        assert_eq!(starts(&slots), vec![hm(9, 0), hm(10, 0), hm(12, 0)]);
    }

    #[test]
    fn recess_tie_removes_earlier_slot() {
        // midpoint 10:00 is 40 minutes from both 09:20 and 10:40
        let slots = build_day_slots("08:00", "12:00", 80).unwrap();
        assert_eq!(starts(&slots), vec![hm(8, 0), hm(10, 40)]);
    }

    #[test]
    fn straddling_slot_is_dropped() {
        let slots = build_day_slots("09:00", "10:30", 60).unwrap();
        assert_eq!(starts(&slots), vec![hm(9, 0)]);
    }

    #[test]
    fn slot_longer_than_day_yields_nothing() {
        assert!(build_day_slots("09:00", "09:30", 60).unwrap().is_empty());
    }

    #[test]
    fn inverted_day_is_rejected() {
        assert!(matches!(
            build_day_slots("17:00", "09:00", 50),
            Err(ConfigError::EmptyDay { .. })
        ));
        assert!(matches!(
            build_day_slots("09:00", "09:00", 50),
            Err(ConfigError::EmptyDay { .. })
        ));
    }

    #[test]
    fn lattice_is_day_major() {
        let config = sample_config();
        let lattice = build_lattice(&config).unwrap();
        assert_eq!(lattice.len(), 5 * 8);
        assert_eq!(lattice[7].day, 0);
        assert_eq!(lattice[8].day, 1);
        assert_eq!(lattice[8].index, 0);
        assert_eq!(lattice[8].start, hm(9, 0));
        assert_eq!(slot_end(&lattice[8], 50), hm(9, 50));
    }

    #[test]
    fn slot_labels_use_day_and_index() {
        let config = sample_config();
        let lattice = build_lattice(&config).unwrap();
        assert_eq!(lattice[0].to_string(), "D0_S0");
        // afternoon slots continue the count after the recess
        assert_eq!(lattice[8 + 5].to_string(), "D1_S5");
        assert_eq!(lattice.last().unwrap().to_string(), "D4_S7");
    }
}
