use strata_core::evaluator::{CachedEvaluator, Evaluate};
use strata_core::genome::Mep;
use strata_core::ops::OpSet;
use strata_core::population::{Coord, Population};
use strata_core::random_provider;
use strata_core::stats::Summary;

/// Kill-tournament replacement: the offspring competes against the worst
/// member of the selection list (the list is sorted by descending fitness,
/// so that is its last element). With elitism the offspring only enters
/// when strictly better; without it the slot is overwritten
/// unconditionally. Note that with a tournament of size 2 this degenerates
/// into family competition.
#[derive(Clone, Debug, Default)]
pub struct TournamentReplacement;

impl TournamentReplacement {
    pub fn run<E: Evaluate>(
        &self,
        parents: &[Coord],
        offspring: Mep,
        pop: &mut Population,
        ops: &OpSet,
        eva: &CachedEvaluator<E>,
        stats: &mut Summary,
    ) {
        let Some(&target) = parents.last() else {
            return;
        };

        let f_off = eva.fitness(&offspring, ops);
        let f_target = eva.fitness(&pop[target], ops);

        if !pop.env().elitism() || f_target < f_off {
            pop[target] = offspring.clone();
        }

        stats.try_improve(&offspring, &f_off);
    }
}

/// Family competition: the candidates for replacement are the two parents
/// themselves. Elitist runs replace the worse parent iff the offspring is
/// strictly better; otherwise probabilistic crowding decides, trying the
/// worse parent first and the better one with the symmetric probability.
#[derive(Clone, Debug, Default)]
pub struct FamilyCompetition;

impl FamilyCompetition {
    pub fn run<E: Evaluate>(
        &self,
        parents: &[Coord],
        offspring: Mep,
        pop: &mut Population,
        ops: &OpSet,
        eva: &CachedEvaluator<E>,
        stats: &mut Summary,
    ) {
        debug_assert!(parents.len() >= 2);

        let f_off = eva.fitness(&offspring, ops);
        let f = [
            eva.fitness(&pop[parents[0]], ops),
            eva.fitness(&pop[parents[1]], ops),
        ];
        let worse = if f[0] < f[1] { 0 } else { 1 };

        if pop.env().elitism() {
            if f_off > f[worse] {
                pop[parents[worse]] = offspring.clone();
            }
        } else {
            // Probabilistic crowding on the primary component. Appropriate
            // for scalar fitness; vector fitness falls back on the same
            // leading component.
            if random_provider::bool(crowding(f_off.primary(), f[worse].primary())) {
                pop[parents[worse]] = offspring.clone();
            } else if random_provider::bool(crowding(f_off.primary(), f[1 - worse].primary())) {
                pop[parents[1 - worse]] = offspring.clone();
            }
        }

        stats.try_improve(&offspring, &f_off);
    }
}

// Replacement probability 1 - f_old / (f_old + f_off): a fitter offspring
// displaces an incumbent more often. Degenerate ratios (zero or non-finite
// sums) fall back to a coin flip.
fn crowding(f_off: f64, f_old: f64) -> f64 {
    let p = 1.0 - f_old / (f_old + f_off);
    if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.5 }
}

/// ALPS replacement: an offspring (or a displaced migrant) enters the layer
/// of its oldest parent, possibly pushing an aged-out or weaker individual
/// one layer up.
#[derive(Clone, Debug, Default)]
pub struct AlpsReplacement;

impl AlpsReplacement {
    /// Tries to place `incoming` in `layer`:
    /// - a layer with spare room accepts unconditionally;
    /// - otherwise a kill tournament picks the victim, preferring members
    ///   beyond the layer's age limit and, among equals, lower fitness;
    /// - the victim is only displaced when `incoming` beats it under the
    ///   `(within age limit, fitness)` order, and gets a chance to migrate
    ///   into the next layer before being overwritten.
    pub fn try_add_to_layer<E: Evaluate>(
        &self,
        layer: usize,
        incoming: Mep,
        pop: &mut Population,
        ops: &OpSet,
        eva: &CachedEvaluator<E>,
    ) {
        debug_assert!(layer < pop.layers());

        if pop.individuals_in(layer) < pop.allowed(layer) {
            pop.add_to_layer(layer, incoming);
            return;
        }

        let max_age = pop.max_age(layer);
        let n = pop.individuals_in(layer);

        let mut worst = Coord::new(layer, random_provider::range(0..n));
        let mut f_worst = eva.fitness(&pop[worst], ops);

        let mut rounds = pop.env().tournament_size();
        while rounds > 0 {
            rounds -= 1;

            let c = Coord::new(layer, random_provider::range(0..n));
            let f = eva.fitness(&pop[c], ops);

            let age_c = pop[c].age();
            let age_worst = pop[worst].age();

            if (age_c > age_worst && age_c > max_age)
                || (age_worst <= max_age && age_c <= max_age && f < f_worst)
            {
                worst = c;
                f_worst = f;
            }
        }

        let incoming_fits = incoming.age() <= max_age;
        let worst_aged = pop[worst].age() > max_age;

        let accept = (incoming_fits && worst_aged)
            || ((incoming_fits || worst_aged) && eva.fitness(&incoming, ops) >= f_worst);

        if accept {
            if layer + 1 < pop.layers() {
                let displaced = pop[worst].clone();
                self.try_add_to_layer(layer + 1, displaced, pop, ops, eva);
            }

            pop[worst] = incoming;
        }
    }

    /// Offers every member of `layer` to the layer above.
    pub fn try_move_up_layer<E: Evaluate>(
        &self,
        layer: usize,
        pop: &mut Population,
        ops: &OpSet,
        eva: &CachedEvaluator<E>,
    ) {
        if layer + 1 >= pop.layers() {
            return;
        }

        for i in 0..pop.individuals_in(layer) {
            let individual = pop[Coord::new(layer, i)].clone();
            self.try_add_to_layer(layer + 1, individual, pop, ops, eva);
        }
    }

    pub fn run<E: Evaluate>(
        &self,
        parents: &[Coord],
        offspring: Mep,
        pop: &mut Population,
        ops: &OpSet,
        eva: &CachedEvaluator<E>,
        stats: &mut Summary,
    ) {
        debug_assert!(parents.len() >= 2);

        let layer = parents[0].layer.max(parents[1].layer);
        let f_off = eva.fitness(&offspring, ops);

        self.try_add_to_layer(layer, offspring.clone(), pop, ops, eva);
        stats.try_improve(&offspring, &f_off);
    }
}

/// Non-dominance replacement for vector fitness: the offspring enters
/// unless some candidate of the selection list dominates it; the slot it
/// takes is the list's last element.
#[derive(Clone, Debug, Default)]
pub struct ParetoReplacement;

impl ParetoReplacement {
    pub fn run<E: Evaluate>(
        &self,
        parents: &[Coord],
        offspring: Mep,
        pop: &mut Population,
        ops: &OpSet,
        eva: &CachedEvaluator<E>,
        stats: &mut Summary,
    ) {
        let Some(&target) = parents.last() else {
            return;
        };

        let f_off = eva.fitness(&offspring, ops);

        let dominated = parents
            .iter()
            .any(|&c| eva.fitness(&pop[c], ops).dominates(&f_off));

        if !pop.env().elitism() || !dominated {
            pop[target] = offspring.clone();
        }

        stats.try_improve(&offspring, &f_off);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::environment::Environment;
    use strata_core::fitness::Fitness;
    use strata_core::ops::Op;

    fn alphabet() -> OpSet {
        let mut ops = OpSet::new();
        for op in Op::real_set(0, 1) {
            ops.insert(op);
        }
        ops
    }

    // Fitness = the individual's age, so tests can dial fitness by hand.
    fn age_eva() -> CachedEvaluator<fn(&Mep, &OpSet) -> Fitness> {
        fn by_age(prg: &Mep, _: &OpSet) -> Fitness {
            Fitness::from(prg.age() as f64)
        }
        CachedEvaluator::new(by_age as fn(&Mep, &OpSet) -> Fitness, 10)
    }

    fn env(individuals: usize, elitism: bool) -> Environment {
        let mut env = Environment::default();
        env.code_length = Some(16);
        env.individuals = Some(individuals);
        env.elitism = Some(elitism);
        env.alps.age_gap = Some(10);
        env
    }

    #[test]
    fn test_tournament_elitist_keeps_better_target() {
        let ops = alphabet();
        let eva = age_eva();
        let mut pop = Population::new(env(6, true), &ops);
        let mut stats = Summary::default();

        pop[Coord::new(0, 3)].set_age(50);
        let target_before = pop[Coord::new(0, 3)].clone();

        let mut weak = pop[Coord::new(0, 0)].clone();
        weak.set_age(1);

        // Offspring (fitness 1) must not displace the target (fitness 50).
        let parents = vec![Coord::new(0, 1), Coord::new(0, 3)];
        TournamentReplacement.run(&parents, weak, &mut pop, &ops, &eva, &mut stats);

        assert_eq!(pop[Coord::new(0, 3)], target_before);
    }

    #[test]
    fn test_tournament_non_elitist_always_replaces() {
        let ops = alphabet();
        let eva = age_eva();
        let mut pop = Population::new(env(6, false), &ops);
        let mut stats = Summary::default();

        pop[Coord::new(0, 3)].set_age(50);

        let mut weak = pop[Coord::new(0, 0)].clone();
        weak.set_age(1);

        let parents = vec![Coord::new(0, 1), Coord::new(0, 3)];
        TournamentReplacement.run(&parents, weak.clone(), &mut pop, &ops, &eva, &mut stats);

        assert_eq!(pop[Coord::new(0, 3)], weak);
    }

    #[test]
    fn test_tournament_updates_running_best() {
        let ops = alphabet();
        let eva = age_eva();
        let mut pop = Population::new(env(6, true), &ops);
        let mut stats = Summary::default();

        let mut strong = pop[Coord::new(0, 0)].clone();
        strong.set_age(99);

        let parents = vec![Coord::new(0, 1), Coord::new(0, 2)];
        TournamentReplacement.run(&parents, strong, &mut pop, &ops, &eva, &mut stats);

        assert_eq!(stats.best_fitness(), Some(&Fitness::from(99.0)));
    }

    #[test]
    fn test_family_competition_elitist_replaces_worse_parent() {
        let ops = alphabet();
        let eva = age_eva();
        let mut pop = Population::new(env(6, true), &ops);
        let mut stats = Summary::default();

        pop[Coord::new(0, 0)].set_age(10);
        pop[Coord::new(0, 1)].set_age(30);

        let mut off = pop[Coord::new(0, 2)].clone();
        off.set_age(20);

        let parents = vec![Coord::new(0, 0), Coord::new(0, 1)];
        FamilyCompetition.run(&parents, off.clone(), &mut pop, &ops, &eva, &mut stats);

        // Fitness 20 beats the worse parent (10) but not the better (30).
        assert_eq!(pop[Coord::new(0, 0)], off);
        assert_eq!(pop[Coord::new(0, 1)].age(), 30);
    }

    #[test]
    fn test_family_competition_crowding_rates() {
        let ops = alphabet();
        let eva = age_eva();
        let mut template = Population::new(env(6, false), &ops);

        template[Coord::new(0, 0)].set_age(10);
        template[Coord::new(0, 1)].set_age(50);

        let mut off = template[Coord::new(0, 2)].clone();
        off.set_age(30);

        // p(replace worse) = 1 - 10/(10+30) = 0.75.
        let trials = 1000;
        let mut replaced_worse = 0;
        for _ in 0..trials {
            let mut pop = template.clone();
            let mut stats = Summary::default();

            let parents = vec![Coord::new(0, 0), Coord::new(0, 1)];
            FamilyCompetition.run(&parents, off.clone(), &mut pop, &ops, &eva, &mut stats);

            if pop[Coord::new(0, 0)] == off {
                replaced_worse += 1;
            }
        }

        let frequency = replaced_worse as f64 / trials as f64;
        assert!((frequency - 0.75).abs() < 0.06, "frequency {}", frequency);
    }

    #[test]
    fn test_alps_fills_layer_with_room() {
        let ops = alphabet();
        let eva = age_eva();
        let e = env(6, true);
        let mut pop = Population::new(e.clone(), &ops);
        let mut stats = Summary::default();

        pop.add_layer(&ops);

        // Truncate layer 1, then restore its allowance: two free slots.
        pop.set_allowed(1, 4);
        pop.set_allowed(1, 6);
        assert_eq!(pop.individuals_in(1), 4);

        let incoming = Mep::random(&e, &ops);
        let parents = vec![Coord::new(1, 0), Coord::new(1, 1)];
        AlpsReplacement.run(&parents, incoming.clone(), &mut pop, &ops, &eva, &mut stats);

        assert_eq!(pop.individuals_in(1), 5);
        assert!((0..5).any(|i| pop[Coord::new(1, i)] == incoming));
    }

    #[test]
    fn test_alps_displaces_aged_out_member() {
        let ops = alphabet();
        let eva = age_eva();
        let mut pop = Population::new(env(6, true), &ops);
        let mut stats = Summary::default();

        pop.add_layer(&ops);
        // Layer 0 limit is age_gap = 10; make every member of layer 0
        // ancient so any young offspring must be accepted.
        for i in 0..6 {
            pop[Coord::new(0, i)].set_age(100);
        }

        let mut young = pop[Coord::new(1, 0)].clone();
        young.set_age(0);

        let parents = vec![Coord::new(0, 0), Coord::new(0, 1)];
        AlpsReplacement.run(&parents, young.clone(), &mut pop, &ops, &eva, &mut stats);

        let placed = (0..6).any(|i| pop[Coord::new(0, i)] == young);
        assert!(placed);
    }

    #[test]
    fn test_alps_migrates_displaced_upward() {
        let ops = alphabet();
        let eva = age_eva();
        let mut pop = Population::new(env(6, true), &ops);
        let mut stats = Summary::default();

        pop.add_layer(&ops);

        // Every member of layer 0 is ancient: the kill tournament must pick
        // an aged-out victim, and the victim (whose age-fitness of 1000
        // beats any fresh layer-1 member) must migrate up before being
        // overwritten.
        for i in 0..6 {
            pop[Coord::new(0, i)].set_age(1000);
        }

        let mut young = pop[Coord::new(1, 0)].clone();
        young.set_age(0);

        let parents = vec![Coord::new(0, 0), Coord::new(0, 2)];
        AlpsReplacement.run(&parents, young.clone(), &mut pop, &ops, &eva, &mut stats);

        assert!((0..6).any(|i| pop[Coord::new(0, i)] == young));
        let migrated = (0..pop.individuals_in(1)).any(|i| pop[Coord::new(1, i)].age() == 1000);
        assert!(migrated);
    }

    #[test]
    fn test_pareto_rejects_dominated_offspring() {
        fn by_age_pair(prg: &Mep, _: &OpSet) -> Fitness {
            Fitness::from_vec(vec![prg.age() as f64, prg.age() as f64])
        }

        let ops = alphabet();
        let eva = CachedEvaluator::new(
            by_age_pair as fn(&Mep, &OpSet) -> Fitness,
            10,
        );
        let mut pop = Population::new(env(6, true), &ops);
        let mut stats = Summary::default();

        pop[Coord::new(0, 0)].set_age(9);
        pop[Coord::new(0, 1)].set_age(5);
        let kept = pop[Coord::new(0, 1)].clone();

        let mut off = pop[Coord::new(0, 2)].clone();
        off.set_age(3);

        let parents = vec![Coord::new(0, 0), Coord::new(0, 1)];
        ParetoReplacement.run(&parents, off, &mut pop, &ops, &eva, &mut stats);

        // (3,3) is dominated by (9,9): the elitist run keeps the target.
        assert_eq!(pop[Coord::new(0, 1)], kept);
    }

    #[test]
    fn test_pareto_accepts_non_dominated_offspring() {
        fn mixed(prg: &Mep, _: &OpSet) -> Fitness {
            Fitness::from_vec(vec![prg.age() as f64, -(prg.age() as f64)])
        }

        let ops = alphabet();
        let eva = CachedEvaluator::new(mixed as fn(&Mep, &OpSet) -> Fitness, 10);
        let mut pop = Population::new(env(6, true), &ops);
        let mut stats = Summary::default();

        pop[Coord::new(0, 0)].set_age(9);
        pop[Coord::new(0, 1)].set_age(5);

        let mut off = pop[Coord::new(0, 2)].clone();
        off.set_age(3);

        // (3,-3): second component beats both parents, no one dominates it.
        let parents = vec![Coord::new(0, 0), Coord::new(0, 1)];
        ParetoReplacement.run(&parents, off.clone(), &mut pop, &ops, &eva, &mut stats);

        assert_eq!(pop[Coord::new(0, 1)], off);
    }
}
