use strata_alters::{PointMutation, crossover};
use strata_core::environment::Environment;
use strata_core::evaluator::{CachedEvaluator, Evaluate};
use strata_core::genome::{CrossoverKind, Mep};
use strata_core::ops::OpSet;
use strata_core::population::{Coord, Population};
use strata_core::random_provider;
use strata_core::stats::Summary;

/// How many repair mutations may be spent forcing genotypic novelty before
/// a duplicate offspring is accepted anyway.
const REPULSION_RETRIES: usize = 8;

/// The standard crossover + mutation recombination.
///
/// With probability `p_cross` the two best parents are crossed (followed by
/// hereditary-repulsion repair and, when configured, brood pre-selection);
/// otherwise a random parent is cloned and mutated. Exactly one offspring
/// is returned either way.
#[derive(Clone, Debug)]
pub struct BaseRecombination {
    pub crossover: CrossoverKind,
}

impl Default for BaseRecombination {
    fn default() -> Self {
        BaseRecombination {
            crossover: CrossoverKind::TwoPoint,
        }
    }
}

impl BaseRecombination {
    pub fn new(crossover: CrossoverKind) -> Self {
        BaseRecombination { crossover }
    }

    pub fn run<E: Evaluate>(
        &self,
        parents: &[Coord],
        pop: &Population,
        ops: &OpSet,
        eva: &CachedEvaluator<E>,
        stats: &mut Summary,
    ) -> Mep {
        debug_assert!(parents.len() >= 2);

        let env = pop.env().clone();
        let (r1, r2) = (parents[0], parents[1]);

        if !random_provider::bool(env.p_cross()) {
            // No crossover this step: clone a random parent and mutate it.
            let src = if random_provider::bool(0.5) { r1 } else { r2 };
            let mut off = pop[src].clone();
            stats.mutations += PointMutation.mutate(&mut off, &env, ops) as u64;

            return off;
        }

        let mut off = crossover(self.crossover, &pop[r1], &pop[r2], ops);
        stats.crossovers += 1;
        self.repel(&mut off, &pop[r1], &pop[r2], &env, ops, stats);

        let brood = env.brood_recombination();
        if brood > 0 {
            let mut f_off = eva.fast_fitness(&off, ops);

            for _ in 0..brood {
                let mut tmp = crossover(self.crossover, &pop[r1], &pop[r2], ops);
                self.repel(&mut tmp, &pop[r1], &pop[r2], &env, ops, stats);

                let f_tmp = eva.fast_fitness(&tmp, ops);
                if f_tmp > f_off {
                    off = tmp;
                    f_off = f_tmp;
                }
            }

            stats.crossovers += brood as u64;
        }

        off
    }

    // Hereditary repulsion: while the offspring is a genotypic clone of a
    // parent, mutate it. The retry cap keeps the loop total even with
    // p_mutation = 0; past the cap the duplicate is accepted.
    fn repel(
        &self,
        off: &mut Mep,
        one: &Mep,
        two: &Mep,
        env: &Environment,
        ops: &OpSet,
        stats: &mut Summary,
    ) {
        let mut retries = 0;
        while retries < REPULSION_RETRIES
            && (off.signature(ops) == one.signature(ops)
                || off.signature(ops) == two.signature(ops))
        {
            stats.mutations += PointMutation.mutate(off, env, ops) as u64;
            retries += 1;
        }
    }
}
