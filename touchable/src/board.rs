//! Pin maps for the Kinetis touch sense input (TSI) on Teensy boards.
//!
//! One record is selected at startup from the board identity and its map handed
//! to [`TouchablePin`](crate::TouchablePin). Channel numbers are TSI channels, so
//! the map only suits a backend that drives the TSI.

use crate::measurement::{ChannelMap, NO_CHANNEL};

const X: u8 = NO_CHANNEL;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Board {
    /// Teensy 3.0, 3.1 and 3.2 (MK20DX128 / MK20DX256)
    Teensy3x,
    /// Teensy 3.6 (MK66FX1M0)
    Teensy36,
    /// Teensy LC (MKL26Z64)
    TeensyLc,
}

#[derive(Clone, Copy, Debug)]
pub struct BoardConfig {
    pub board: Board,
    pub pins: ChannelMap,
}

impl BoardConfig {
    pub const fn for_board(board: Board) -> Self {
        match board {
            Board::Teensy3x => TEENSY_3X,
            Board::Teensy36 => TEENSY_36,
            Board::TeensyLc => TEENSY_LC,
        }
    }
}

#[rustfmt::skip]
const TEENSY_3X_PINS: [u8; 34] = [
    // 0   1   2   3   4   5   6   7   8   9
       9, 10,  X,  X,  X,  X,  X,  X,  X,  X,
       X,  X,  X,  X,  X, 13,  0,  6,  8,  7,
       X,  X, 14, 15,  X, 12,  X,  X,  X,  X,
       X,  X, 11,  5,
];

#[rustfmt::skip]
const TEENSY_36_PINS: [u8; 40] = [
    // 0   1   2   3   4   5   6   7   8   9
       9, 10,  X,  X,  X,  X,  X,  X,  X,  X,
       X,  X,  X,  X,  X, 13,  0,  6,  8,  7,
       X,  X, 14, 15,  X,  X,  X,  X,  X, 11,
      12,  X,  X,  X,  X,  X,  X,  X,  X,  X,
];

#[rustfmt::skip]
const TEENSY_LC_PINS: [u8; 27] = [
    // 0   1   2   3   4   5   6   7   8   9
       9, 10,  X,  2,  3,  X,  X,  X,  X,  X,
       X,  X,  X,  X,  X, 13,  0,  6,  8,  7,
       X,  X, 14, 15,  X,  X,  X,
];

pub const TEENSY_3X: BoardConfig = BoardConfig {
    board: Board::Teensy3x,
    pins: ChannelMap::new(&TEENSY_3X_PINS),
};

pub const TEENSY_36: BoardConfig = BoardConfig {
    board: Board::Teensy36,
    pins: ChannelMap::new(&TEENSY_36_PINS),
};

pub const TEENSY_LC: BoardConfig = BoardConfig {
    board: Board::TeensyLc,
    pins: ChannelMap::new(&TEENSY_LC_PINS),
};
