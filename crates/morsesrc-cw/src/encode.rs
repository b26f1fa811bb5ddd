use std::sync::Arc;

use crate::table::{lookup, Lookup, Symbol};

/// Gap units appended after the last character so the final tone decays
/// before end-of-stream.
pub const TRAILING_GAPS: usize = 3;

/// One timed element of a render plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Dot,
    Dash,
    Gap,
}

impl From<Symbol> for Unit {
    fn from(symbol: Symbol) -> Self {
        match symbol {
            Symbol::Dot => Unit::Dot,
            Symbol::Dash => Unit::Dash,
        }
    }
}

/// Immutable, timing-independent sequence of units compiled from text.
///
/// Cloning is cheap; the units are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPlan {
    units: Arc<[Unit]>,
}

impl RenderPlan {
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Unit> {
        self.units.get(index).copied()
    }
}

/// Compile text into a render plan.
///
/// Each mapped character contributes a gap before every symbol and one gap
/// after its last symbol. A space contributes two gaps. Unmapped and
/// non-ASCII characters contribute nothing.
pub fn compile(text: &str) -> RenderPlan {
    let mut units = Vec::with_capacity(text.len() * 8 + TRAILING_GAPS);

    for ch in text.chars() {
        if !ch.is_ascii() {
            tracing::trace!(?ch, "skipping non-ascii character");
            continue;
        }

        match lookup(ch.to_ascii_uppercase() as u8) {
            Lookup::WordGap => push_gaps(&mut units, 2),
            Lookup::Symbols(seq) => {
                for symbol in seq.iter() {
                    units.push(Unit::Gap);
                    units.push(symbol.into());
                }
                units.push(Unit::Gap);
            }
            Lookup::Empty => tracing::trace!(?ch, "skipping unmapped character"),
        }
    }

    push_gaps(&mut units, TRAILING_GAPS);

    RenderPlan {
        units: units.into(),
    }
}

fn push_gaps(units: &mut Vec<Unit>, count: usize) {
    for _ in 0..count {
        units.push(Unit::Gap);
    }
}
