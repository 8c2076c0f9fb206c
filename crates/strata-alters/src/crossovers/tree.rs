use strata_core::genome::{CrossoverKind, Locus, Mep};
use strata_core::ops::OpSet;
use strata_core::random_provider;

use crate::crossovers::{Cross, finalize};

/// Grafts a whole active subtree: a random active locus of the donating
/// parent is chosen, and that gene plus everything it reaches is copied
/// into a copy of the other parent at the same coordinates.
///
/// Because argument indices always point at later rows, the copied genes
/// keep encoding the same subtree inside the offspring.
#[derive(Clone, Debug, Default)]
pub struct TreeCrossover;

impl Cross for TreeCrossover {
    fn kind(&self) -> CrossoverKind {
        CrossoverKind::Tree
    }

    fn cross(&self, one: &Mep, two: &Mep, ops: &OpSet) -> Mep {
        debug_assert!(one.size() == two.size() && one.categories() == two.categories());

        let active = one.exons(ops).collect::<Vec<_>>();
        let root = *random_provider::choose(&active);

        let mut off = two.clone();
        let mut pending = vec![root];
        while let Some(l) = pending.pop() {
            let g = one.gene(l);
            let op = ops.get(g.opcode());

            for (i, &arg) in g.args().iter().enumerate() {
                pending.push(Locus::new(arg, op.arg_category(i)));
            }

            off.set(l, g.clone());
        }

        finalize(off, one, two, self.kind())
    }
}
