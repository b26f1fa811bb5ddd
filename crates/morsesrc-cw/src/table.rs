//! Compact ASCII to Morse lookup table.
//!
//! Each entry packs a symbol sequence into nine bits: the high three bits
//! (`entry >> 6 & 0o7`) hold the symbol count, where a stored count of zero
//! means eight symbols, and the low six bits hold the symbols themselves,
//! least-significant bit first, `0` for a dot and `1` for a dash. An entry
//! of zero is an unmapped character.

use bitvec::prelude::*;

const TABLE_LEN: usize = 128;

static MORSE_TABLE: [u16; TABLE_LEN] = [
    /* 0x00 */ 0o000, 0o000, 0o000, 0o000, 0o000, 0o000, 0o000, 0o000,
    /* 0x08 */ 0o000, 0o000, 0o412, 0o000, 0o000, 0o412, 0o000, 0o000,
    /* 0x10 */ 0o000, 0o000, 0o000, 0o000, 0o000, 0o000, 0o000, 0o000,
    /* 0x18 */ 0o000, 0o000, 0o000, 0o000, 0o000, 0o000, 0o000, 0o000,
    /* 0x20 */ 0o000, 0o665, 0o622, 0o000, 0o000, 0o000, 0o502, 0o636,
    /* 0x28 */ 0o515, 0o000, 0o000, 0o512, 0o663, 0o000, 0o652, 0o511,
    /* 0x30 */ 0o537, 0o536, 0o534, 0o530, 0o520, 0o500, 0o501, 0o503,
    /* 0x38 */ 0o507, 0o517, 0o607, 0o625, 0o000, 0o521, 0o000, 0o614,
    /* 0x40 */ 0o000, 0o202, 0o401, 0o405, 0o301, 0o100, 0o404, 0o303,
    /* 0x48 */ 0o400, 0o200, 0o416, 0o305, 0o402, 0o203, 0o201, 0o307,
    /* 0x50 */ 0o406, 0o413, 0o302, 0o300, 0o101, 0o304, 0o410, 0o306,
    /* 0x58 */ 0o411, 0o415, 0o403, 0o000, 0o000, 0o000, 0o000, 0o000,
    /* 0x60 */ 0o000, 0o202, 0o401, 0o405, 0o301, 0o100, 0o404, 0o303,
    /* 0x68 */ 0o400, 0o200, 0o416, 0o305, 0o402, 0o203, 0o201, 0o307,
    /* 0x70 */ 0o406, 0o413, 0o302, 0o300, 0o101, 0o304, 0o410, 0o306,
    /* 0x78 */ 0o411, 0o415, 0o403, 0o000, 0o000, 0o000, 0o000, 0o000,
];

/// A single keyed element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Dot,
    Dash,
}

/// Result of looking a character up in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// A dot/dash sequence.
    Symbols(SymbolSequence),
    /// A space between words.
    WordGap,
    /// No entry; the character is skipped.
    Empty,
}

/// Packed symbol sequence of one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolSequence {
    count: u8,
    register: u8,
}

impl SymbolSequence {
    fn from_entry(entry: u16) -> Self {
        let count = match (entry >> 6) & 0o7 {
            0 => 8,
            n => n as u8,
        };
        Self {
            count,
            register: (entry & 0o77) as u8,
        }
    }

    /// Number of symbols, 1 to 8.
    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Symbols in keying order.
    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.register.view_bits::<Lsb0>()[..self.len()]
            .iter()
            .by_vals()
            .map(|dash| if dash { Symbol::Dash } else { Symbol::Dot })
    }
}

/// Look up an ASCII byte. Callers uppercase first; the table is indexed by
/// `byte & 0x7F`.
pub fn lookup(byte: u8) -> Lookup {
    if byte == b' ' {
        return Lookup::WordGap;
    }

    match MORSE_TABLE[(byte & 0x7F) as usize] {
        0 => Lookup::Empty,
        entry => Lookup::Symbols(SymbolSequence::from_entry(entry)),
    }
}
