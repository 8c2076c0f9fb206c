mod point;
mod tree;
mod uniform;

pub use point::{OnePointCrossover, TwoPointCrossover};
pub use tree::TreeCrossover;
pub use uniform::UniformCrossover;

use strata_core::genome::{CrossoverKind, Mep};
use strata_core::ops::OpSet;

/// A crossover scheme over two same-shape parents, producing a single
/// offspring. The first parent donates material into a copy of the second.
pub trait Cross {
    fn kind(&self) -> CrossoverKind;

    fn cross(&self, one: &Mep, two: &Mep, ops: &OpSet) -> Mep;
}

/// Offspring bookkeeping shared by every scheme: the age of the oldest
/// parent and the lineage tag of the scheme that produced it.
fn finalize(mut off: Mep, one: &Mep, two: &Mep, kind: CrossoverKind) -> Mep {
    off.set_age(one.age().max(two.age()));
    off.set_crossover_kind(kind);
    off
}

/// Runtime dispatch over the four schemes.
pub fn crossover(kind: CrossoverKind, one: &Mep, two: &Mep, ops: &OpSet) -> Mep {
    match kind {
        CrossoverKind::Uniform => UniformCrossover.cross(one, two, ops),
        CrossoverKind::OnePoint => OnePointCrossover.cross(one, two, ops),
        CrossoverKind::TwoPoint => TwoPointCrossover.cross(one, two, ops),
        CrossoverKind::Tree => TreeCrossover.cross(one, two, ops),
    }
}
