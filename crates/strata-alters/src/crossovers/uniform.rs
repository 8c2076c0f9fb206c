use strata_core::genome::{CrossoverKind, Locus, Mep};
use strata_core::ops::OpSet;
use strata_core::random_provider;

use crate::crossovers::{Cross, finalize};

/// Each locus of the offspring is taken from either parent with equal
/// probability. On average each parent donates half of its genetic
/// material; the scheme relies on both genomes sharing shape.
#[derive(Clone, Debug, Default)]
pub struct UniformCrossover;

impl Cross for UniformCrossover {
    fn kind(&self) -> CrossoverKind {
        CrossoverKind::Uniform
    }

    fn cross(&self, one: &Mep, two: &Mep, _ops: &OpSet) -> Mep {
        debug_assert!(one.size() == two.size() && one.categories() == two.categories());

        let mut off = two.clone();
        for i in 0..one.size() {
            for c in 0..one.categories() {
                if random_provider::bool(0.5) {
                    let l = Locus::new(i, c);
                    off.set(l, one.gene(l).clone());
                }
            }
        }

        finalize(off, one, two, self.kind())
    }
}
