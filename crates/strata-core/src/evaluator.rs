use std::sync::RwLock;

use crate::cache::Cache;
use crate::fitness::Fitness;
use crate::genome::{Mep, Signature};
use crate::ops::OpSet;

/// The contract the engine consumes: map a program to a fitness vector.
///
/// `fast` may trade accuracy for speed (it drives brood pre-selection);
/// `clear` is the data-shake hook, called when cached fitness values become
/// stale because the training data changed.
pub trait Evaluate {
    fn evaluate(&self, prg: &Mep, ops: &OpSet) -> Fitness;

    fn fast(&self, prg: &Mep, ops: &OpSet) -> Fitness {
        self.evaluate(prg, ops)
    }

    fn clear(&self) {}
}

impl<F> Evaluate for F
where
    F: Fn(&Mep, &OpSet) -> Fitness,
{
    fn evaluate(&self, prg: &Mep, ops: &OpSet) -> Fitness {
        self(prg, ops)
    }
}

/// Memoises an evaluator behind a signature-indexed [Cache].
///
/// Readers share the cache lock; `insert` and `clear` take it exclusively.
/// A writer racing a reader costs at most one redundant evaluation later.
pub struct CachedEvaluator<E> {
    eva: E,
    cache: RwLock<Cache>,
}

impl<E: Evaluate> CachedEvaluator<E> {
    pub fn new(eva: E, bits: u32) -> CachedEvaluator<E> {
        CachedEvaluator {
            eva,
            cache: RwLock::new(Cache::new(bits)),
        }
    }

    /// The fitness of `prg`, from the cache when its signature is known.
    pub fn fitness(&self, prg: &Mep, ops: &OpSet) -> Fitness {
        let signature = prg.signature(ops);

        let cached = self.cache.read().unwrap().find(signature);
        if let Some(fitness) = cached {
            // A hit may be a collision artefact; in debug builds re-evaluate
            // and compare the primary component (secondary components may
            // legitimately tie-break differently).
            #[cfg(debug_assertions)]
            {
                let fresh = self.eva.evaluate(prg, ops);
                debug_assert_eq!(
                    fitness.primary().to_bits(),
                    fresh.primary().to_bits(),
                    "cache hit disagrees with evaluator"
                );
            }

            return fitness;
        }

        let fitness = self.eva.evaluate(prg, ops);
        self.cache
            .write()
            .unwrap()
            .insert(signature, fitness.clone());

        fitness
    }

    /// The fast (approximate) fitness; cached values are reused but misses
    /// are not inserted.
    pub fn fast_fitness(&self, prg: &Mep, ops: &OpSet) -> Fitness {
        let signature = prg.signature(ops);

        if let Some(fitness) = self.cache.read().unwrap().find(signature) {
            return fitness;
        }

        self.eva.fast(prg, ops)
    }

    /// Drops every cached fitness and forwards the shake to the evaluator.
    pub fn clear(&self) {
        self.cache.write().unwrap().clear();
        self.eva.clear();
    }

    /// Drops the cached fitness of one signature.
    pub fn clear_entry(&self, signature: Signature) {
        self.cache.write().unwrap().clear_entry(signature);
    }

    pub fn probes(&self) -> u64 {
        self.cache.read().unwrap().probes()
    }

    pub fn hits(&self) -> u64 {
        self.cache.read().unwrap().hits()
    }

    pub fn with_cache<R>(&self, f: impl FnOnce(&Cache) -> R) -> R {
        f(&self.cache.read().unwrap())
    }

    pub fn inner(&self) -> &E {
        &self.eva
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use crate::eval::Interpreter;
    use crate::ops::{Op, Value};

    fn alphabet() -> OpSet {
        let mut ops = OpSet::new();
        for op in Op::real_set(0, 1) {
            ops.insert(op);
        }
        ops
    }

    fn run_fitness(prg: &Mep, ops: &OpSet) -> Fitness {
        let inputs = [Value::Real(1.5)];
        match Interpreter::with_inputs(prg, ops, &inputs).run() {
            Some(Value::Real(v)) => Fitness::from(-v.abs()),
            Some(Value::Int(v)) => Fitness::from(-(v.abs() as f64)),
            None => Fitness::lowest(),
        }
    }

    #[test]
    fn test_cached_evaluator_hits_on_reevaluation() {
        let ops = alphabet();
        let mut env = Environment::default();
        env.code_length = Some(32);

        let eva = CachedEvaluator::new(run_fitness, 14);

        let prg = Mep::random(&env, &ops);
        let first = eva.fitness(&prg, &ops);
        let second = eva.fitness(&prg, &ops);

        assert_eq!(first, second);
        assert!(eva.hits() >= 1);
    }

    #[test]
    fn test_collision_detection_by_reevaluation() {
        let ops = alphabet();
        let mut env = Environment::default();
        env.code_length = Some(32);

        // A small table forces collisions; any retained hit must agree with
        // a fresh evaluation on the primary component.
        let eva = CachedEvaluator::new(run_fitness, 6);

        let programs = (0..500).map(|_| Mep::random(&env, &ops)).collect::<Vec<_>>();
        for prg in &programs {
            eva.fitness(prg, &ops);
        }

        for prg in &programs {
            let signature = prg.signature(&ops);
            if let Some(cached) = eva.with_cache(|c| c.find(signature)) {
                let fresh = run_fitness(prg, &ops);
                assert_eq!(cached.primary().to_bits(), fresh.primary().to_bits());
            }
        }
    }

    #[test]
    fn test_clear_forces_reevaluation() {
        let ops = alphabet();
        let mut env = Environment::default();
        env.code_length = Some(32);

        let eva = CachedEvaluator::new(run_fitness, 14);
        let prg = Mep::random(&env, &ops);

        let before = eva.fitness(&prg, &ops);
        eva.clear();
        assert_eq!(eva.hits(), 0);

        let after = eva.fitness(&prg, &ops);
        assert_eq!(before, after);
    }
}
