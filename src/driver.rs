use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Instant;

use crate::data::{
    GeneratedTimetable, GenerationReport, MAX_TIMETABLES, PlacementRequest, Schedule, TimeSlot,
    TimetableConfig,
};
use crate::error::ConfigError;
use crate::lattice::build_lattice;
use crate::requirements::expand_requirements;
use crate::schedule::render_schedule;
use crate::solver::{SolverOptions, solve};

const MAX_SEED: u64 = 1_000_000_000;

/// Everything a solve attempt needs, built and validated once per run.
#[derive(Debug, Clone)]
pub struct Problem {
    pub lattice: Vec<TimeSlot>,
    pub rooms: Vec<String>,
    pub faculties: Vec<String>,
    pub options: SolverOptions,
}

impl Problem {
    pub fn from_config(config: &TimetableConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let lattice = build_lattice(config)?;
        let rooms = config.room_names();
        let faculties = config.faculty_names();
        Ok(Self {
            lattice,
            rooms,
            faculties,
            options: SolverOptions {
                allow_cross_day_runs: config.allow_cross_day_runs,
                node_limit: config.search_node_limit,
            },
        })
    }

    pub fn requests(
        &self,
        config: &TimetableConfig,
        timetable: &str,
    ) -> Result<Vec<PlacementRequest>, ConfigError> {
        expand_requirements(
            timetable,
            &config.subjects,
            &self.faculties,
            &self.rooms,
            config.lecture_slot_length_minutes,
        )
    }
}

/// Tries up to `attempts_per_timetable` searches from one seed.
///
/// Every retry continues the same seeded stream, so the outcome is a pure
/// function of the inputs and `seed`.
pub fn generate_single(
    config: &TimetableConfig,
    problem: &Problem,
    requests: &[PlacementRequest],
    seed: u64,
) -> Option<Schedule> {
    let mut rng = StdRng::seed_from_u64(seed);
    for attempt in 0..config.attempts_per_timetable {
        if let Some(assignments) = solve(
            requests,
            &problem.lattice,
            &problem.rooms,
            &problem.faculties,
            problem.options,
            &mut rng,
        ) {
            debug!("Seed {} solved on attempt {}", seed, attempt + 1);
            return Some(render_schedule(
                config,
                requests,
                &problem.lattice,
                &assignments,
            ));
        }
    }
    debug!(
        "Seed {} exhausted {} attempts",
        seed, config.attempts_per_timetable
    );
    None
}

/// Hash of what was placed where, ignoring rendering details.
fn fingerprint(schedule: &Schedule) -> u64 {
    let mut hasher = DefaultHasher::new();
    for entry in schedule {
        (entry.slot, &entry.room, &entry.subject_code, &entry.faculty).hash(&mut hasher);
    }
    hasher.finish()
}

/// Produces up to `count` timetables, each from a freshly drawn seed.
///
/// At most `max_overall_attempts` seeds are drawn across all names. A name
/// missing from the report means its budget ran out; that is not an error.
/// Configuration problems are reported before any search starts.
pub fn generate_many(
    config: &TimetableConfig,
    count: usize,
) -> Result<GenerationReport, ConfigError> {
    let start_time = Instant::now();
    let problem = Problem::from_config(config)?;
    if count > MAX_TIMETABLES {
        return Err(ConfigError::TooLarge {
            field: "num_timetables",
            max: MAX_TIMETABLES,
        });
    }
    // Requests differ between names only by label, so expanding the first
    // one surfaces every reference error before search.
    let mut name = config.timetable_name(0);
    let mut requests = problem.requests(config, &name)?;

    info!(
        "Generating {} timetables: {} requests over {} slots, {} rooms, {} faculties",
        count,
        requests.len(),
        problem.lattice.len(),
        problem.rooms.len(),
        problem.faculties.len()
    );

    let mut master = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut seeds_tried: HashSet<u64> = HashSet::new();
    let mut fingerprints: HashSet<u64> = HashSet::new();
    let mut timetables = Vec::new();
    let mut seed_draws = 0;

    while timetables.len() < count && seed_draws < config.max_overall_attempts {
        seed_draws += 1;
        let seed = master.gen_range(1..=MAX_SEED);
        if !seeds_tried.insert(seed) {
            continue;
        }

        let Some(schedule) = generate_single(config, &problem, &requests, seed) else {
            continue;
        };
        if config.distinct_timetables && !fingerprints.insert(fingerprint(&schedule)) {
            debug!("Seed {} reproduced an earlier timetable", seed);
            continue;
        }
        info!("Timetable {} generated from seed {}", name, seed);
        timetables.push(GeneratedTimetable {
            name,
            seed,
            schedule,
        });
        name = config.timetable_name(timetables.len());
        requests = problem.requests(config, &name)?;
    }

    if timetables.len() < count {
        warn!(
            "Attempt budget exhausted: generated {} of {} timetables",
            timetables.len(),
            count
        );
    }
    info!(
        "Generation finished in {:.2?} after {} seed draws",
        start_time.elapsed(),
        seed_draws
    );

    Ok(GenerationReport {
        timetables,
        requested: count,
        seed_draws,
    })
}
