use crate::data::{Assignment, PlacementRequest, RequestId, SlotIndex, TimeSlot};
use log::trace;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut, Range};

/// Knobs for a single solve attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolverOptions {
    /// Allow a run to continue from the last slot of one day into the next day.
    pub allow_cross_day_runs: bool,
    /// Give up (as unsatisfiable) after this many tentative placements.
    pub node_limit: Option<u64>,
}

/// Room and faculty busy marks, indexed `[resource][slot]`.
#[derive(Debug)]
struct Occupancy {
    room_busy: Vec<Vec<bool>>,
    faculty_busy: Vec<Vec<bool>>,
}

impl Occupancy {
    fn new(rooms: usize, faculties: usize, slots: usize) -> Self {
        Self {
            room_busy: vec![vec![false; slots]; rooms],
            faculty_busy: vec![vec![false; slots]; faculties],
        }
    }

    fn room_free(&self, room: usize, run: Range<SlotIndex>) -> bool {
        self.room_busy[room][run].iter().all(|busy| !busy)
    }

    fn faculty_free(&self, faculty: usize, run: Range<SlotIndex>) -> bool {
        self.faculty_busy[faculty][run].iter().all(|busy| !busy)
    }

    fn mark(&mut self, room: usize, faculty: usize, run: Range<SlotIndex>, busy: bool) {
        self.room_busy[room][run.clone()].fill(busy);
        self.faculty_busy[faculty][run].fill(busy);
    }

    /// Marks the run busy until the returned guard is dropped.
    fn reserve(&mut self, room: usize, faculty: usize, run: Range<SlotIndex>) -> Reservation<'_> {
        self.mark(room, faculty, run.clone(), true);
        Reservation {
            occupancy: self,
            room,
            faculty,
            run,
        }
    }
}

/// Scoped hold on a run of slots; releases exactly its own marks on drop.
struct Reservation<'o> {
    occupancy: &'o mut Occupancy,
    room: usize,
    faculty: usize,
    run: Range<SlotIndex>,
}

impl Deref for Reservation<'_> {
    type Target = Occupancy;

    fn deref(&self) -> &Occupancy {
        self.occupancy
    }
}

impl DerefMut for Reservation<'_> {
    fn deref_mut(&mut self) -> &mut Occupancy {
        self.occupancy
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.occupancy
            .mark(self.room, self.faculty, self.run.clone(), false);
    }
}

/// Requests ordered longest first. The sort is stable, so equal lengths keep input order.
pub fn placement_order(requests: &[PlacementRequest]) -> Vec<RequestId> {
    let mut order: Vec<RequestId> = (0..requests.len()).collect();
    order.sort_by(|a, b| requests[*b].slots_needed.cmp(&requests[*a].slots_needed));
    order
}

struct Search<'a, R: Rng + ?Sized> {
    requests: &'a [PlacementRequest],
    lattice: &'a [TimeSlot],
    order: Vec<RequestId>,
    faculty_of: Vec<usize>,
    room_order: Vec<Vec<usize>>,
    options: SolverOptions,
    rng: &'a mut R,
    nodes: u64,
    aborted: bool,
    placed: Vec<Assignment>,
    rooms: &'a [String],
}

impl<R: Rng + ?Sized> Search<'_, R> {
    fn is_candidate(&self, start: SlotIndex, len: usize) -> bool {
        let end = start + len;
        if end > self.lattice.len() {
            return false;
        }
        self.options.allow_cross_day_runs || self.lattice[start].day == self.lattice[end - 1].day
    }

    fn place(&mut self, depth: usize, occupancy: &mut Occupancy) -> bool {
        let Some(&request_id) = self.order.get(depth) else {
            return true;
        };
        let len = self.requests[request_id].slots_needed;
        let faculty = self.faculty_of[request_id];

        let mut starts: Vec<SlotIndex> = (0..self.lattice.len()).collect();
        starts.shuffle(&mut *self.rng);

        for start in starts {
            if self.aborted {
                return false;
            }
            if !self.is_candidate(start, len) {
                continue;
            }
            let run = start..start + len;
            if !occupancy.faculty_free(faculty, run.clone()) {
                continue;
            }
            let Some(room) = self.room_order[request_id]
                .iter()
                .copied()
                .find(|&room| occupancy.room_free(room, run.clone()))
            else {
                continue;
            };

            self.nodes += 1;
            if self.options.node_limit.is_some_and(|limit| self.nodes > limit) {
                self.aborted = true;
                return false;
            }

            let mut reservation = occupancy.reserve(room, faculty, run);
            self.placed.push(Assignment {
                request: request_id,
                room: self.rooms[room].clone(),
                start_slot: start,
                slot_count: len,
            });
            if self.place(depth + 1, &mut reservation) {
                return true;
            }
            self.placed.pop();
        }
        false
    }
}

/// Finds a conflict-free placement for every request, or `None` when the
/// randomized depth-first search runs out of candidates.
///
/// A run is `slots_needed` consecutive lattice slots. Start positions are
/// visited in an order shuffled by `rng`; rooms are tried with the preferred
/// room first and then in list order. No two assignments sharing a room or
/// a faculty overlap.
pub fn solve<R: Rng + ?Sized>(
    requests: &[PlacementRequest],
    lattice: &[TimeSlot],
    rooms: &[String],
    faculties: &[String],
    options: SolverOptions,
    rng: &mut R,
) -> Option<Vec<Assignment>> {
    if requests.is_empty() {
        return Some(Vec::new());
    }
    if rooms.is_empty() || lattice.is_empty() {
        return None;
    }

    let mut faculty_index: HashMap<&str, usize> = HashMap::new();
    for name in faculties
        .iter()
        .map(String::as_str)
        .chain(requests.iter().map(|r| r.faculty.as_str()))
    {
        let next = faculty_index.len();
        faculty_index.entry(name).or_insert(next);
    }
    let faculty_of: Vec<usize> = requests
        .iter()
        .map(|r| faculty_index[r.faculty.as_str()])
        .collect();

    let room_order: Vec<Vec<usize>> = requests
        .iter()
        .map(|r| {
            let preferred = r
                .preferred_room
                .as_deref()
                .and_then(|p| rooms.iter().position(|room| room == p));
            preferred
                .into_iter()
                .chain((0..rooms.len()).filter(|i| Some(*i) != preferred))
                .collect()
        })
        .collect();

    let mut occupancy = Occupancy::new(rooms.len(), faculty_index.len(), lattice.len());
    let mut search = Search {
        requests,
        lattice,
        order: placement_order(requests),
        faculty_of,
        room_order,
        options,
        rng,
        nodes: 0,
        aborted: false,
        placed: Vec::with_capacity(requests.len()),
        rooms,
    };

    let solved = search.place(0, &mut occupancy);
    trace!(
        "Search {} after {} placements{}",
        if solved { "succeeded" } else { "failed" },
        search.nodes,
        if search.aborted { " (node limit)" } else { "" }
    );
    if !solved {
        return None;
    }
    let mut assignments = search.placed;
    assignments.sort();
    for assignment in &assignments {
        trace!(
            "Placed {} in {} at {}",
            requests[assignment.request],
            assignment.room,
            lattice[assignment.start_slot]
        );
    }
    Some(assignments)
}
