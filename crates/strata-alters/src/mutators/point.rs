use strata_core::environment::Environment;
use strata_core::genome::{Gene, Mep};
use strata_core::ops::OpSet;
use strata_core::random_provider;

/// Point mutation over the active subtree: each active gene is replaced
/// with a fresh random gene with probability `p_mutation`. Replacements
/// respect the position: rows in the patch section only receive terminals
/// of the same category, so the shape invariants survive any rate.
#[derive(Clone, Debug, Default)]
pub struct PointMutation;

impl PointMutation {
    /// Mutates `prg` in place, returning the number of genes rewritten.
    pub fn mutate(&self, prg: &mut Mep, env: &Environment, ops: &OpSet) -> usize {
        let p = env.p_mutation();
        debug_assert!((0.0..=1.0).contains(&p));

        let rows = prg.size();
        let boundary = rows - env.patch_length();

        let active = prg.exons(ops).collect::<Vec<_>>();

        let mut n = 0;
        for l in active {
            if !random_provider::bool(p) {
                continue;
            }

            n += 1;

            let opcode = if l.index < boundary {
                ops.roulette(l.category)
            } else {
                ops.roulette_terminal(l.category)
            };

            prg.set(l, Gene::random(ops.get(opcode), opcode, l.index + 1, rows));
        }

        n
    }
}
