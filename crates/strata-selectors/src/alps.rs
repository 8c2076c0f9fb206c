use strata_core::fitness::Fitness;
use strata_core::genome::Mep;
use strata_core::population::{Coord, Population};
use strata_core::random_provider;
use strata_core::selector::Select;

/// Selection for age-layered populations.
///
/// A base layer is drawn uniformly; every tournament draw then stays in
/// that layer with probability `p_same_layer` and falls to the layer below
/// otherwise (layer 0 has nowhere to fall). Candidates are ranked by the
/// pair `(still within the layer's age limit, fitness)`, so aged-out
/// individuals only win a tournament against other aged-out individuals.
/// The best and second best of the tournament become the parents.
#[derive(Clone, Debug, Default)]
pub struct AlpsSelector;

impl AlpsSelector {
    fn pickup(&self, pop: &Population, base: usize, p_same: f64) -> Coord {
        let layer = if base > 0 && !random_provider::bool(p_same) {
            base - 1
        } else {
            base
        };

        Coord::new(layer, random_provider::range(0..pop.individuals_in(layer)))
    }

    fn key(
        &self,
        pop: &Population,
        c: Coord,
        fitness: &mut dyn FnMut(&Mep) -> Fitness,
    ) -> (bool, Fitness) {
        (!pop.aged(c), fitness(&pop[c]))
    }
}

impl Select for AlpsSelector {
    fn select(
        &self,
        pop: &Population,
        fitness: &mut dyn FnMut(&Mep) -> Fitness,
    ) -> Vec<Coord> {
        let env = pop.env();
        let p_same = env.alps.p_same_layer();
        let rounds = env.tournament_size().max(2);

        let base = random_provider::range(0..pop.layers());

        let mut first = self.pickup(pop, base, p_same);
        let mut k_first = self.key(pop, first, fitness);

        let mut second = self.pickup(pop, base, p_same);
        let mut k_second = self.key(pop, second, fitness);

        if k_second > k_first {
            std::mem::swap(&mut first, &mut second);
            std::mem::swap(&mut k_first, &mut k_second);
        }

        for _ in 2..rounds {
            let c = self.pickup(pop, base, p_same);
            let k = self.key(pop, c, fitness);

            if k > k_first {
                second = first;
                k_second = k_first;
                first = c;
                k_first = k;
            } else if k > k_second {
                second = c;
                k_second = k;
            }
        }

        vec![first, second]
    }
}
