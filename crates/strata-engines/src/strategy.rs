use strata_core::evaluator::{CachedEvaluator, Evaluate};
use strata_core::ops::OpSet;
use strata_core::population::Population;
use strata_core::selector::Select;
use strata_core::stats::Summary;
use strata_selectors::{AlpsSelector, TournamentSelector};

use crate::recombine::BaseRecombination;
use crate::replace::{AlpsReplacement, TournamentReplacement};

/// A strategy bundles the three roles of one steady-state step - selection,
/// recombination, replacement - plus whatever bookkeeping it needs between
/// generations.
pub trait Strategy<E: Evaluate> {
    /// One steady-state step: select parents, produce an offspring, decide
    /// its fate.
    fn step(
        &self,
        pop: &mut Population,
        ops: &OpSet,
        eva: &CachedEvaluator<E>,
        stats: &mut Summary,
    );

    /// Work done once per generation, after the steady-state loop and the
    /// population-wide age increment.
    fn after_generation(
        &self,
        _pop: &mut Population,
        _ops: &mut OpSet,
        _eva: &CachedEvaluator<E>,
        _stats: &mut Summary,
    ) {
    }
}

/// Tournament selection, standard recombination, kill-tournament
/// replacement: the classic steady-state configuration.
#[derive(Clone, Debug, Default)]
pub struct StdStrategy {
    pub selection: TournamentSelector,
    pub recombination: BaseRecombination,
    pub replacement: TournamentReplacement,
}

impl<E: Evaluate> Strategy<E> for StdStrategy {
    fn step(
        &self,
        pop: &mut Population,
        ops: &OpSet,
        eva: &CachedEvaluator<E>,
        stats: &mut Summary,
    ) {
        let parents = self
            .selection
            .select(pop, &mut |prg| eva.fitness(prg, ops));
        let offspring = self.recombination.run(&parents, pop, ops, eva, stats);
        self.replacement
            .run(&parents, offspring, pop, ops, eva, stats);
    }
}

/// The age-layered configuration: layer-aware selection and replacement
/// around the same recombination, plus the periodic layer maintenance.
#[derive(Clone, Debug, Default)]
pub struct AlpsStrategy {
    pub selection: AlpsSelector,
    pub recombination: BaseRecombination,
    pub replacement: AlpsReplacement,
}

impl<E: Evaluate> Strategy<E> for AlpsStrategy {
    fn step(
        &self,
        pop: &mut Population,
        ops: &OpSet,
        eva: &CachedEvaluator<E>,
        stats: &mut Summary,
    ) {
        let parents = self
            .selection
            .select(pop, &mut |prg| eva.fitness(prg, ops));
        let offspring = self.recombination.run(&parents, pop, ops, eva, stats);
        self.replacement
            .run(&parents, offspring, pop, ops, eva, stats);
    }

    /// Every `age_gap` generations: grow a fresh youngest layer while the
    /// configured maximum allows it, otherwise push layer 0 up and restart
    /// it from random individuals.
    fn after_generation(
        &self,
        pop: &mut Population,
        ops: &mut OpSet,
        eva: &CachedEvaluator<E>,
        stats: &mut Summary,
    ) {
        let env = pop.env().clone();
        let age_gap = env.alps.age_gap();

        if stats.r#gen == 0 || stats.r#gen % age_gap != 0 {
            return;
        }

        if pop.layers() < env.layers() {
            pop.add_layer(ops);
        } else {
            self.replacement.try_move_up_layer(0, pop, ops, eva);
            pop.init_layer(0, ops);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::environment::Environment;
    use strata_core::eval::Interpreter;
    use strata_core::fitness::Fitness;
    use strata_core::genome::Mep;
    use strata_core::ops::{Op, Value};

    fn alphabet() -> OpSet {
        let mut ops = OpSet::new();
        for op in Op::real_set(0, 1) {
            ops.insert(op);
        }
        ops
    }

    fn run_fitness(prg: &Mep, ops: &OpSet) -> Fitness {
        let inputs = [Value::Real(1.0)];
        match Interpreter::with_inputs(prg, ops, &inputs).run() {
            Some(v) => Fitness::from(-(v.as_real().unwrap_or(f64::MAX).abs())),
            None => Fitness::lowest(),
        }
    }

    fn small_env() -> Environment {
        let mut env = Environment::default();
        env.code_length = Some(20);
        env.individuals = Some(12);
        env.layers = Some(3);
        env.tournament_size = Some(3);
        env.mate_zone = Some(12);
        env.alps.age_gap = Some(4);
        env
    }

    #[test]
    fn test_std_step_keeps_population_consistent() {
        let ops = alphabet();
        let eva = CachedEvaluator::new(run_fitness, 12);
        let mut pop = Population::new(small_env(), &ops);
        let mut stats = Summary::default();

        for _ in 0..50 {
            StdStrategy::default().step(&mut pop, &ops, &eva, &mut stats);
        }

        assert!(pop.is_valid(&ops));
        assert_eq!(pop.individuals(), 12);
        assert!(stats.best.is_some());
    }

    #[test]
    fn test_alps_after_generation_grows_then_restarts() {
        let ops = alphabet();
        let eva = CachedEvaluator::new(run_fitness, 12);
        let mut pop = Population::new(small_env(), &ops);
        let mut stats = Summary::default();
        let strategy = AlpsStrategy::default();

        let mut ops_mut = ops.clone();

        // Not a multiple of the gap: nothing changes.
        stats.r#gen = 3;
        strategy.after_generation(&mut pop, &mut ops_mut, &eva, &mut stats);
        assert_eq!(pop.layers(), 1);

        // At each multiple the population grows one layer, up to the cap.
        for (r#gen, expected_layers) in [(4, 2), (8, 3)] {
            stats.r#gen = r#gen;
            strategy.after_generation(&mut pop, &mut ops_mut, &eva, &mut stats);
            assert_eq!(pop.layers(), expected_layers);
        }

        // Cap reached: the next boundary restarts layer 0 instead.
        pop.inc_age();
        stats.r#gen = 12;
        strategy.after_generation(&mut pop, &mut ops_mut, &eva, &mut stats);

        assert_eq!(pop.layers(), 3);
        assert!((0..pop.individuals_in(0)).all(|i| {
            pop[strata_core::population::Coord::new(0, i)].age() == 0
        }));
    }
}
