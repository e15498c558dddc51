//! Fixed 3×3 adjacency grid and the loss-triggered rearrangement heuristic.
//!
//! Slots are laid out as
//!
//! ```text
//! 0 -- 1 -- 2
//! |    |    |
//! 3 -- 4 -- 5
//! |    |    |
//! 6 -- 7 -- 8
//! ```
//!
//! Each filament occupies exactly one slot. Lost filaments keep their slot,
//! which then counts as vacant for neighbor queries.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::types::{FILAMENT_COUNT, FilamentId, Orientation, SlotId};

/// Slots adjacent to each slot.
pub const ADJACENCY: [&[SlotId]; FILAMENT_COUNT] = [
    &[1, 3],
    &[0, 2, 4],
    &[1, 5],
    &[0, 4, 6],
    &[1, 3, 5, 7],
    &[2, 4, 8],
    &[3, 7],
    &[4, 6, 8],
    &[5, 7],
];

/// Upper bound of [`Topology::neighbor_count`] used to size lookup tables.
pub const MAX_NEIGHBORS: usize = 5;

/// Which branch of [`Topology::rearrange`] produced a swap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RearrangeCase {
    /// A surviving filament of the lost one's orientation, with fewer
    /// neighbors, moved into the lost filament's slot.
    SameOrientation,
    /// A poorly connected neighbor of the lost slot moved into a vacant slot
    /// with more neighbors.
    FillVacancy,
}

/// Slot exchange performed by [`Topology::rearrange`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Swap {
    /// Surviving filament that changed position.
    pub moved: FilamentId,
    /// Lost filament whose slot was taken over.
    pub vacated: FilamentId,
    pub case: RearrangeCase,
}

/// Assignment of filaments to grid slots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topology {
    /// `slot_of[id]` is the slot filament `id` currently occupies.
    slot_of: [SlotId; FILAMENT_COUNT],
    /// `active[id]` is false once filament `id` is lost.
    active: [bool; FILAMENT_COUNT],
}

impl Default for Topology {
    fn default() -> Self {
        Self::new()
    }
}

impl Topology {
    /// Every filament active and sitting in the slot matching its id.
    pub fn new() -> Self {
        Self {
            slot_of: std::array::from_fn(|id| id),
            active: [true; FILAMENT_COUNT],
        }
    }

    #[inline]
    pub fn slot_of(&self, id: FilamentId) -> SlotId {
        self.slot_of[id]
    }

    #[inline]
    pub fn is_active(&self, id: FilamentId) -> bool {
        self.active[id]
    }

    /// Filament occupying `slot`, lost or not.
    pub fn filament_at(&self, slot: SlotId) -> FilamentId {
        // `slot_of` is a permutation, so every slot has exactly one occupant.
        self.slot_of
            .iter()
            .position(|&s| s == slot)
            .unwrap_or(slot)
    }

    fn slot_occupied(&self, slot: SlotId) -> bool {
        self.active[self.filament_at(slot)]
    }

    /// Number of slots next to filament `id`'s slot that hold an active filament.
    ///
    /// This is defined for lost filaments too, in which case it counts the
    /// active neighbors of the vacancy they left behind.
    pub fn neighbor_count(&self, id: FilamentId) -> usize {
        ADJACENCY[self.slot_of[id]]
            .iter()
            .filter(|&&slot| self.slot_occupied(slot))
            .count()
    }

    /// Neighbor counts of all filaments, with zero for lost ones.
    pub fn link_counts(&self) -> [usize; FILAMENT_COUNT] {
        std::array::from_fn(|id| {
            if self.active[id] {
                self.neighbor_count(id)
            } else {
                0
            }
        })
    }

    /// Number of links between active filaments.
    pub fn total_links(&self) -> usize {
        // Each link is seen from both of its ends.
        self.link_counts().iter().sum::<usize>() / 2
    }

    pub fn mark_lost(&mut self, id: FilamentId) {
        self.active[id] = false;
    }

    /// Exchanges the slots of two filaments.
    pub fn swap(&mut self, a: FilamentId, b: FilamentId) {
        self.slot_of.swap(a, b);
    }

    /// Repositions surviving filaments after filament `lost` has been lost.
    ///
    /// Case 1: if any active filament with the same orientation as `lost`
    /// has strictly fewer neighbors than `lost` had, a random one of them
    /// takes over `lost`'s slot.
    ///
    /// Case 2: otherwise, among the active filaments next to `lost`'s slot,
    /// those with the fewest neighbors (`m`) are candidates to move. The
    /// targets are lost filaments of the opposite orientation whose vacant
    /// slot has more than `m` active neighbors. If both sets are non-empty,
    /// one random candidate swaps with one random target.
    ///
    /// ### Parameters
    /// - `lost` - The filament that has just been lost. It must already be
    ///   marked with [`Topology::mark_lost`].
    /// - `rng` - Random source used for the tie-break picks.
    ///
    /// ### Returns
    /// The swap performed, or `None` if the arrangement was left unchanged.
    pub fn rearrange(&mut self, lost: FilamentId, rng: &mut impl Rng) -> Option<Swap> {
        let orientation = Orientation::for_id(lost);
        let lost_neighbors = self.neighbor_count(lost);

        let closer: Vec<FilamentId> = (0..FILAMENT_COUNT)
            .filter(|&id| {
                id != lost
                    && self.active[id]
                    && Orientation::for_id(id) == orientation
                    && self.neighbor_count(id) < lost_neighbors
            })
            .collect();

        if let Some(&moved) = closer.choose(rng) {
            self.swap(lost, moved);
            return Some(Swap {
                moved,
                vacated: lost,
                case: RearrangeCase::SameOrientation,
            });
        }

        let neighbors: Vec<(FilamentId, usize)> = ADJACENCY[self.slot_of[lost]]
            .iter()
            .map(|&slot| self.filament_at(slot))
            .filter(|&id| self.active[id])
            .map(|id| (id, self.neighbor_count(id)))
            .collect();

        let min_neighbors = neighbors.iter().map(|&(_, n)| n).min()?;
        let candidates: Vec<FilamentId> = neighbors
            .iter()
            .filter(|&&(_, n)| n == min_neighbors)
            .map(|&(id, _)| id)
            .collect();

        let vacancies: Vec<FilamentId> = (0..FILAMENT_COUNT)
            .filter(|&id| {
                !self.active[id]
                    && Orientation::for_id(id) != orientation
                    && self.neighbor_count(id) > min_neighbors
            })
            .collect();

        if vacancies.is_empty() {
            return None;
        }
        let &moved = candidates.choose(rng)?;
        let &vacated = vacancies.choose(rng)?;
        self.swap(moved, vacated);
        Some(Swap {
            moved,
            vacated,
            case: RearrangeCase::FillVacancy,
        })
    }

    /// ASCII cartoon of the grid, with each slot showing its occupant's id
    /// or `x` when the occupant is lost.
    pub fn draw_arrangement(&self) -> String {
        let label = |slot: SlotId| {
            let id = self.filament_at(slot);
            if self.active[id] {
                id.to_string()
            } else {
                "x".to_string()
            }
        };

        let mut out = String::new();
        for row in 0..3 {
            if row > 0 {
                out.push_str("|    |    |\n");
            }
            let cells: Vec<String> = (0..3).map(|col| label(row * 3 + col)).collect();
            out.push_str(&cells.join(" -- "));
            out.push('\n');
        }
        out
    }
}
