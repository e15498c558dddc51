use std::fmt;

/// Identifier of a filament.
///
/// This is an index into `Simulation::filaments` and never changes during
/// a run. It also fixes the filament's orientation and starting slot.
pub type FilamentId = usize;

/// Position in the fixed 3×3 adjacency grid.
pub type SlotId = usize;

/// Number of filaments (and slots) in every spindle.
pub const FILAMENT_COUNT: usize = 9;

/// Direction in which a filament's plus end points along the spindle axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    Plus,
    Minus,
}

impl Orientation {
    /// Orientation of the filament that starts in slot `id`.
    ///
    /// The grid alternates orientations like a checkerboard, so even ids
    /// point `Plus` and odd ids point `Minus`.
    pub fn for_id(id: FilamentId) -> Self {
        if id % 2 == 0 {
            Orientation::Plus
        } else {
            Orientation::Minus
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            Orientation::Plus => 1.0,
            Orientation::Minus => -1.0,
        }
    }

    pub fn from_sign(sign: i32) -> Option<Self> {
        match sign {
            1 => Some(Orientation::Plus),
            -1 => Some(Orientation::Minus),
            _ => None,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Plus => f.write_str("1"),
            Orientation::Minus => f.write_str("-1"),
        }
    }
}
