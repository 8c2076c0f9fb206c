use strata_core::fitness::Fitness;
use strata_core::genome::Mep;
use strata_core::population::{Coord, Population};
use strata_core::random_provider;
use strata_core::selector::Select;

/// Tournament selection with trivial geography: `tournament_size` draws
/// from the ring of width `mate_zone` around a random anchor (panmictic
/// once the zone covers the layer), returned in descending fitness order.
#[derive(Clone, Debug, Default)]
pub struct TournamentSelector;

impl Select for TournamentSelector {
    fn select(
        &self,
        pop: &Population,
        fitness: &mut dyn FnMut(&Mep) -> Fitness,
    ) -> Vec<Coord> {
        let env = pop.env();
        let rounds = env.tournament_size();
        let mate_zone = env.mate_zone();

        let layer = random_provider::range(0..pop.layers());
        let n = pop.individuals_in(layer);
        let target = random_provider::range(0..n);

        debug_assert!(rounds >= 1);

        // The inner loop of an insertion sort: simple and, for the small
        // tournament sizes in use (4-7), faster than a general sort.
        let mut ret: Vec<Coord> = Vec::with_capacity(rounds);
        let mut fits: Vec<Fitness> = Vec::with_capacity(rounds);

        for _ in 0..rounds {
            let c = Coord::new(layer, random_provider::ring(target, mate_zone, n));
            let f = fitness(&pop[c]);

            let mut j = 0;
            while j < ret.len() && f < fits[j] {
                j += 1;
            }

            ret.insert(j, c);
            fits.insert(j, f);
        }

        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use strata_core::environment::Environment;
    use strata_core::ops::{Op, OpSet};

    fn alphabet() -> OpSet {
        let mut ops = OpSet::new();
        for op in Op::real_set(0, 1) {
            ops.insert(op);
        }
        ops
    }

    // Each individual gets a unique age, which the test fitness function
    // echoes back: a population of pairwise-distinct fitnesses.
    fn distinct_population(ops: &OpSet, n: usize) -> Population {
        let mut env = Environment::default();
        env.code_length = Some(16);
        env.individuals = Some(n);
        env.tournament_size = Some(2);
        env.mate_zone = Some(usize::MAX);

        let mut pop = Population::new(env, ops);
        for i in 0..n {
            pop[Coord::new(0, i)].set_age(i);
        }

        pop
    }

    fn age_fitness(prg: &Mep) -> Fitness {
        Fitness::from(prg.age() as f64)
    }

    #[test]
    fn test_returns_sorted_by_fitness() {
        let ops = alphabet();
        let pop = distinct_population(&ops, 20);

        for _ in 0..200 {
            let parents = TournamentSelector.select(&pop, &mut age_fitness);

            assert_eq!(parents.len(), 2);
            assert!(age_fitness(&pop[parents[0]]) >= age_fitness(&pop[parents[1]]));
        }
    }

    // With pairwise-distinct fitnesses and independent panmictic draws, the
    // unique best individual appears in a size-t tournament with
    // probability 1 - ((N-1)/N)^t.
    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(4)]
    #[case(7)]
    fn test_selection_pressure(#[case] tournament_size: usize) {
        let ops = alphabet();
        let n = 20usize;

        let mut env = Environment::default();
        env.code_length = Some(16);
        env.individuals = Some(n);
        env.tournament_size = Some(tournament_size);
        env.mate_zone = Some(usize::MAX);

        let mut pop = Population::new(env, &ops);
        for i in 0..n {
            pop[Coord::new(0, i)].set_age(i);
        }
        let max = Coord::new(0, n - 1);

        let trials = 2000;
        let mut found = 0;
        for _ in 0..trials {
            let parents = TournamentSelector.select(&pop, &mut age_fitness);
            assert_eq!(parents.len(), tournament_size);

            if parents.contains(&max) {
                found += 1;
            }
        }

        let expected = 1.0 - ((n - 1) as f64 / n as f64).powi(tournament_size as i32);
        let frequency = found as f64 / trials as f64;

        assert!(
            (frequency - expected).abs() < 0.1,
            "frequency {} expected {}",
            frequency,
            expected
        );
    }

    #[test]
    fn test_mate_zone_restricts_draws() {
        let ops = alphabet();

        let mut env = Environment::default();
        env.code_length = Some(16);
        env.individuals = Some(100);
        env.tournament_size = Some(4);
        env.mate_zone = Some(10);

        let pop = Population::new(env, &ops);

        for _ in 0..100 {
            let parents = TournamentSelector.select(&pop, &mut |_| Fitness::from(0.0));

            // All draws stay within a window of the ring.
            let indices = parents.iter().map(|c| c.index).collect::<Vec<_>>();
            let spread = indices
                .iter()
                .flat_map(|&a| indices.iter().map(move |&b| ring_distance(a, b, 100)))
                .max()
                .unwrap_or(0);

            assert!(spread <= 10, "spread {}", spread);
        }
    }

    fn ring_distance(a: usize, b: usize, n: usize) -> usize {
        let d = a.abs_diff(b);
        d.min(n - d)
    }
}
