use strata_core::fitness::Fitness;
use strata_core::genome::Mep;
use strata_core::population::{Coord, Population};
use strata_core::random_provider;
use strata_core::selector::Select;

/// Uniform selection on the mate-zone ring: an anchor plus
/// `tournament_size - 1` window draws, fitness ignored. This is the parent
/// source used by strategies that do their own discrimination downstream
/// (differential-evolution style recombinators).
#[derive(Clone, Debug, Default)]
pub struct RandomSelector;

impl Select for RandomSelector {
    fn select(
        &self,
        pop: &Population,
        _fitness: &mut dyn FnMut(&Mep) -> Fitness,
    ) -> Vec<Coord> {
        let env = pop.env();
        let size = env.tournament_size();
        let mate_zone = env.mate_zone();

        let layer = random_provider::range(0..pop.layers());
        let n = pop.individuals_in(layer);
        let target = random_provider::range(0..n);

        let mut ret = Vec::with_capacity(size);
        ret.push(Coord::new(layer, target));

        for _ in 1..size {
            ret.push(Coord::new(layer, random_provider::ring(target, mate_zone, n)));
        }

        ret
    }
}
