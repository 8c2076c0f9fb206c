use crate::fitness::Fitness;
use crate::genome::Mep;
use crate::ops::OpSet;
use crate::stats::Distribution;

/// Per-layer slice of an [Analyzer] snapshot.
#[derive(Clone, Debug, Default)]
pub struct LayerStats {
    pub fitness: Distribution,
    pub length: Distribution,
    pub age: Distribution,
}

/// Statistical snapshot of a population: fitness, effective-length and age
/// distributions (overall and per layer) plus active symbol counts.
///
/// Fitness distributions track the primary component only; full vectors
/// live in the cache and the summary.
#[derive(Clone, Debug, Default)]
pub struct Analyzer {
    pub fitness: Distribution,
    pub length: Distribution,
    pub age: Distribution,
    pub functions: usize,
    pub terminals: usize,
    layers: Vec<LayerStats>,
}

impl Analyzer {
    pub fn add(&mut self, prg: &Mep, fitness: &Fitness, layer: usize, ops: &OpSet) {
        if layer >= self.layers.len() {
            self.layers.resize_with(layer + 1, LayerStats::default);
        }

        let length = prg.eff_size(ops) as f64;
        let age = prg.age() as f64;
        let primary = fitness.primary();

        self.fitness.add(primary);
        self.length.add(length);
        self.age.add(age);

        let slice = &mut self.layers[layer];
        slice.fitness.add(primary);
        slice.length.add(length);
        slice.age.add(age);

        for l in prg.exons(ops) {
            if ops.get(prg.gene(l).opcode()).is_function() {
                self.functions += 1;
            } else {
                self.terminals += 1;
            }
        }
    }

    pub fn layers(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, l: usize) -> &LayerStats {
        &self.layers[l]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use crate::ops::Op;

    #[test]
    fn test_snapshot_accumulates() {
        let mut ops = OpSet::new();
        for op in Op::real_set(0, 1) {
            ops.insert(op);
        }

        let mut env = Environment::default();
        env.code_length = Some(16);

        let mut az = Analyzer::default();
        for i in 0..10 {
            let mut prg = Mep::random(&env, &ops);
            prg.set_age(i);
            az.add(&prg, &Fitness::from(i as f64), i % 2, &ops);
        }

        assert_eq!(az.fitness.count(), 10);
        assert_eq!(az.layers(), 2);
        assert_eq!(az.layer(0).fitness.count(), 5);
        assert!(az.functions + az.terminals > 0);
        assert!(az.terminals > 0);
        assert!((az.age.max() - 9.0).abs() < 1e-12);
    }
}
