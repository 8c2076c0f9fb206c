use strata_core::genome::{CrossoverKind, Locus, Mep};
use strata_core::ops::OpSet;
use strata_core::random_provider;

use crate::crossovers::{Cross, finalize};

/// The oldest homologous crossover: a single cut point, genes from the base
/// parent on one side and from the other parent beyond it.
#[derive(Clone, Debug, Default)]
pub struct OnePointCrossover;

impl Cross for OnePointCrossover {
    fn kind(&self) -> CrossoverKind {
        CrossoverKind::OnePoint
    }

    fn cross(&self, one: &Mep, two: &Mep, _ops: &OpSet) -> Mep {
        debug_assert!(one.size() == two.size() && one.categories() == two.categories());

        let rows = one.size();
        let cut = random_provider::range(1..rows);

        let mut off = two.clone();
        let range = if random_provider::bool(0.5) {
            cut..rows
        } else {
            0..cut
        };

        for i in range {
            for c in 0..one.categories() {
                let l = Locus::new(i, c);
                off.set(l, one.gene(l).clone());
            }
        }

        finalize(off, one, two, self.kind())
    }
}

/// The default scheme: two cut points; the offspring takes the genes
/// between them from one parent and the rest from the other.
#[derive(Clone, Debug, Default)]
pub struct TwoPointCrossover;

impl Cross for TwoPointCrossover {
    fn kind(&self) -> CrossoverKind {
        CrossoverKind::TwoPoint
    }

    fn cross(&self, one: &Mep, two: &Mep, _ops: &OpSet) -> Mep {
        debug_assert!(one.size() == two.size() && one.categories() == two.categories());

        let rows = one.size();
        let cut1 = random_provider::range(0..rows - 1);
        let cut2 = random_provider::range(cut1 + 1..rows);

        let mut off = two.clone();
        let copy = |off: &mut Mep, from: usize, to: usize| {
            for i in from..to {
                for c in 0..one.categories() {
                    let l = Locus::new(i, c);
                    off.set(l, one.gene(l).clone());
                }
            }
        };

        if random_provider::bool(0.5) {
            copy(&mut off, cut1, cut2);
        } else {
            copy(&mut off, 0, cut1);
            copy(&mut off, cut2, rows);
        }

        finalize(off, one, two, self.kind())
    }
}
