//! Where and how a new note lands on the wall.

use rand::Rng;
use rand::seq::SliceRandom;

use wall_core::domain::Position;

pub const NOTE_COLORS: [&str; 7] = [
    "bg-yellow-100 border-yellow-300",
    "bg-blue-100 border-blue-300",
    "bg-pink-100 border-pink-300",
    "bg-green-100 border-green-300",
    "bg-purple-100 border-purple-300",
    "bg-orange-100 border-orange-300",
    "bg-teal-100 border-teal-300",
];

pub const PIN_COLORS: [&str; 7] = [
    "bg-red-500",
    "bg-blue-500",
    "bg-green-500",
    "bg-purple-500",
    "bg-pink-500",
    "bg-amber-500",
    "bg-emerald-500",
];

/// Notes are kept inside this band of the wall, in percent.
const BAND_START: f64 = 10.0;
const BAND_WIDTH: f64 = 70.0;
const MAX_TILT_DEGREES: f64 = 4.0;

/// Visual parameters of a new note.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteStyle {
    pub position: Position,
    pub color: &'static str,
    pub pin_color: &'static str,
    pub rotation: f64,
}

/// Random whole-percent position in the band, random palette entries, and a
/// slight tilt in `[-4, 4)` degrees.
pub fn random_style<R: Rng + ?Sized>(rng: &mut R) -> NoteStyle {
    let band = BAND_START as u32..(BAND_START + BAND_WIDTH) as u32;
    NoteStyle {
        position: Position {
            top: f64::from(rng.gen_range(band.clone())),
            left: f64::from(rng.gen_range(band)),
        },
        color: NOTE_COLORS.choose(rng).copied().unwrap_or(NOTE_COLORS[0]),
        pin_color: PIN_COLORS.choose(rng).copied().unwrap_or(PIN_COLORS[0]),
        rotation: (rng.r#gen::<f64>() - 0.5) * 2.0 * MAX_TILT_DEGREES,
    }
}

/// Snap slot `index` onto a square grid of `columns` cells per side.
///
/// Slots fill row by row and wrap back to the top once the grid is full.
pub fn grid_position(index: usize, columns: usize) -> Position {
    let columns = columns.max(1);
    let cell = BAND_WIDTH / columns as f64;
    let col = index % columns;
    let row = (index / columns) % columns;
    Position {
        top: BAND_START + row as f64 * cell,
        left: BAND_START + col as f64 * cell,
    }
}
