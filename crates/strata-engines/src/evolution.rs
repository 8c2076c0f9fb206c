use std::time::Instant;

use tracing::{debug, info};

use strata_core::environment::Environment;
use strata_core::evaluator::{CachedEvaluator, Evaluate};
use strata_core::ops::OpSet;
use strata_core::population::{Coord, Population};
use strata_core::stats::{Analyzer, Summary};
use strata_error::{StrataResult, ensure};

use crate::arl;
use crate::limit::Limit;
use crate::strategy::{AlpsStrategy, StdStrategy, Strategy};

/// The steady-state evolution driver.
///
/// One generation = `population size` selection/recombination/replacement
/// steps (an offspring produced at step `k` can become a parent at a later
/// step of the same generation; the loop must not be reordered), followed
/// by the population-wide age increment and the strategy's between-
/// generation work.
pub struct Evolution<S, E: Evaluate> {
    env: Environment,
    pop: Population,
    ops: OpSet,
    eva: CachedEvaluator<E>,
    strategy: S,
    limits: Vec<Limit>,
    stop_condition: Option<Box<dyn Fn(&Summary) -> bool>>,
    shake_data: Option<Box<dyn FnMut(usize) -> bool>>,
    stats: Summary,
}

impl<S, E> Evolution<S, E>
where
    S: Strategy<E>,
    E: Evaluate,
{
    /// Builds a driver over a validated environment. The environment is
    /// initialised (defaults filled in) and refused when inconsistent.
    pub fn new(mut env: Environment, ops: OpSet, eva: E, strategy: S) -> StrataResult<Self> {
        env.init();

        ensure!(
            env.is_valid(true),
            InvalidConfig: "refusing to start evolution from an invalid environment"
        );
        ensure!(
            ops.enough_terminals(),
            InvalidConfig: "op set lacks terminals for some argument category"
        );

        let eva = CachedEvaluator::new(eva, env.cache_bits());
        let pop = Population::new(env.clone(), &ops);
        let limits = Limit::from_env(&env);

        Ok(Evolution {
            env,
            pop,
            ops,
            eva,
            strategy,
            limits,
            stop_condition: None,
            shake_data: None,
            stats: Summary::default(),
        })
    }

    /// Installs an additional stop predicate, checked once per generation
    /// alongside the environment-derived limits.
    pub fn with_stop_condition(mut self, f: impl Fn(&Summary) -> bool + 'static) -> Self {
        self.stop_condition = Some(Box::new(f));
        self
    }

    /// Installs the shake-data hook, invoked with the generation index
    /// before each generation; a `true` return means the training data
    /// changed, so cached fitness values are dropped and the running best
    /// is re-primed.
    pub fn with_shake_data(mut self, f: impl FnMut(usize) -> bool + 'static) -> Self {
        self.shake_data = Some(Box::new(f));
        self
    }

    fn stop(&self) -> bool {
        if let Some(stop) = &self.stop_condition {
            if stop(&self.stats) {
                return true;
            }
        }

        self.limits.iter().any(|l| l.reached(&self.stats))
    }

    fn snapshot(&self) -> Analyzer {
        let mut az = Analyzer::default();
        for (c, prg) in self.pop.iter() {
            let fitness = self.eva.fitness(prg, &self.ops);
            az.add(prg, &fitness, c.layer, &self.ops);
        }

        az
    }

    fn prime_best(&mut self) {
        let seed = self.pop[Coord::new(0, 0)].clone();
        let fitness = self.eva.fitness(&seed, &self.ops);
        self.stats.try_improve(&seed, &fitness);
    }

    /// Runs the generational loop to its stop condition and returns the
    /// final summary.
    pub fn run(&mut self) -> &Summary {
        self.stats.clear();
        self.prime_best();
        self.eva.clear();

        let start = Instant::now();

        while !self.stop() {
            let shaken = match self.shake_data.as_mut() {
                Some(shake) => shake(self.stats.r#gen),
                None => false,
            };
            if shaken {
                // The data moved under us: cached fitnesses and the running
                // best refer to the old training set.
                self.eva.clear();
                self.stats.best = None;
                self.prime_best();
            }

            let az = self.snapshot();
            self.stats.az = az;

            debug!(
                r#gen = self.stats.r#gen,
                best = ?self.stats.best_fitness(),
                layers = self.pop.layers(),
                individuals = self.pop.individuals(),
                "generation"
            );

            for _ in 0..self.pop.individuals() {
                self.strategy
                    .step(&mut self.pop, &self.ops, &self.eva, &mut self.stats);
            }

            self.pop.inc_age();
            self.strategy
                .after_generation(&mut self.pop, &mut self.ops, &self.eva, &mut self.stats);

            if self.env.arl()
                && self.stats.r#gen > 0
                && self.stats.r#gen % self.env.alps.age_gap() == 0
            {
                if let Some(best) = self.stats.best.clone() {
                    match arl::harvest(&mut self.ops, &best.prg) {
                        Ok(Some(opcode)) => {
                            debug!(opcode = opcode as u64, "harvested auto-defined op");
                        }
                        Ok(None) => {}
                        Err(e) => debug!(error = %e, "arl harvest skipped"),
                    }
                }
            }

            self.stats.elapsed = start.elapsed();
            self.stats.r#gen += 1;
        }

        info!(
            r#gen = self.stats.r#gen,
            best = ?self.stats.best_fitness(),
            speed = self.stats.speed(self.pop.individuals()),
            cache_probes = self.eva.probes(),
            cache_hits = self.eva.hits(),
            "evolution finished"
        );

        &self.stats
    }

    pub fn summary(&self) -> &Summary {
        &self.stats
    }

    pub fn population(&self) -> &Population {
        &self.pop
    }

    pub fn ops(&self) -> &OpSet {
        &self.ops
    }

    pub fn evaluator(&self) -> &CachedEvaluator<E> {
        &self.eva
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }
}

impl<E: Evaluate> Evolution<StdStrategy, E> {
    /// Tournament selection + standard recombination + kill tournament.
    pub fn standard(env: Environment, ops: OpSet, eva: E) -> StrataResult<Self> {
        Evolution::new(env, ops, eva, StdStrategy::default())
    }
}

impl<E: Evaluate> Evolution<AlpsStrategy, E> {
    /// The age-layered configuration. An unset layer count is shaped to 4;
    /// a single-layer ALPS run would degenerate into restarts.
    pub fn alps(mut env: Environment, ops: OpSet, eva: E) -> StrataResult<Self> {
        if env.layers.is_none() {
            env.layers = Some(4);
        }

        Evolution::new(env, ops, eva, AlpsStrategy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
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

    // Reward programs whose output at x = 3 is close to 10.
    fn toward_ten(prg: &Mep, ops: &OpSet) -> Fitness {
        let inputs = [Value::Real(3.0)];
        match Interpreter::with_inputs(prg, ops, &inputs).run() {
            Some(v) => {
                let out = v.as_real().unwrap_or(f64::MAX);
                Fitness::from(-(out - 10.0).abs())
            }
            None => Fitness::lowest(),
        }
    }

    fn small_env() -> Environment {
        let mut env = Environment::default();
        env.code_length = Some(24);
        env.individuals = Some(16);
        env.tournament_size = Some(3);
        env.mate_zone = Some(16);
        env.generations = Some(6);
        env.cache_bits = Some(12);
        env
    }

    #[test]
    fn test_invalid_environment_is_refused() {
        let mut env = small_env();
        env.p_mutation = Some(2.0);

        assert!(Evolution::standard(env, alphabet(), toward_ten).is_err());
    }

    #[test]
    fn test_standard_run_completes() {
        let ops = alphabet();
        let mut evo = Evolution::standard(small_env(), ops, toward_ten).unwrap();

        let stats = evo.run();

        assert_eq!(stats.r#gen, 7);
        assert!(stats.best.is_some());
        assert!(stats.crossovers + stats.mutations > 0);
        assert!(evo.population().is_valid(evo.ops()));
    }

    #[test]
    fn test_threshold_stops_immediately_when_met() {
        let ops = alphabet();
        let mut env = small_env();
        env.f_threshold = Some(Fitness::lowest());

        // Any program beats the threshold, so not a single generation runs.
        let mut evo = Evolution::standard(env, ops, toward_ten).unwrap();
        let stats = evo.run();

        assert_eq!(stats.r#gen, 0);
    }

    #[test]
    fn test_stagnation_cuts_the_run_short() {
        fn flat(_: &Mep, _: &OpSet) -> Fitness {
            Fitness::from(0.0)
        }

        let ops = alphabet();
        let mut env = small_env();
        env.generations = Some(100);
        env.max_stuck_time = Some(3);

        let mut evo =
            Evolution::standard(env, ops, flat as fn(&Mep, &OpSet) -> Fitness).unwrap();
        let stats = evo.run();

        assert_eq!(stats.r#gen, 4);
    }

    #[test]
    fn test_custom_stop_condition() {
        let ops = alphabet();
        let mut env = small_env();
        env.generations = Some(100);

        let mut evo = Evolution::standard(env, ops, toward_ten)
            .unwrap()
            .with_stop_condition(|stats| stats.r#gen >= 2);

        assert_eq!(evo.run().r#gen, 2);
    }

    #[test]
    fn test_shake_data_hook_runs_every_generation() {
        let ops = alphabet();
        let env = small_env();

        let calls = Rc::new(Cell::new(0usize));
        let seen = calls.clone();

        let mut evo = Evolution::standard(env, ops, toward_ten)
            .unwrap()
            .with_shake_data(move |_| {
                seen.set(seen.get() + 1);
                true
            });

        let stats = evo.run();

        assert_eq!(calls.get(), stats.r#gen);
        assert!(stats.best.is_some());
    }

    #[test]
    fn test_alps_run_grows_layers() {
        let ops = alphabet();
        let mut env = small_env();
        env.layers = Some(3);
        env.individuals = Some(10);
        env.mate_zone = Some(10);
        env.alps.age_gap = Some(2);
        env.generations = Some(8);

        let mut evo = Evolution::alps(env, ops, toward_ten).unwrap();
        let stats = evo.run();

        assert_eq!(stats.r#gen, 9);
        assert_eq!(evo.population().layers(), 3);
        assert!(evo.population().is_valid(evo.ops()));
    }

    #[test]
    fn test_arl_harvests_ops_during_run() {
        let ops = alphabet();
        let base_ops = ops.len();

        let mut env = small_env();
        env.arl = Some(true);
        env.alps.age_gap = Some(2);
        env.generations = Some(8);

        let mut evo = Evolution::standard(env, ops, toward_ten).unwrap();
        evo.run();

        assert!(evo.ops().len() >= base_ops);
    }
}
