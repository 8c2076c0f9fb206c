use std::io::{BufRead, Write};
use std::time::Duration;

use strata_error::{StrataResult, strata_err};

use crate::fitness::Fitness;
use crate::genome::Mep;
use crate::ops::OpSet;
use crate::stats::Analyzer;

/// The running best of an evolution together with its fitness.
#[derive(Clone, Debug)]
pub struct Best {
    pub prg: Mep,
    pub fitness: Fitness,
}

/// Bookkeeping of one evolution run: the running best, operator counters,
/// timing and the per-generation analyzer snapshot.
#[derive(Clone, Debug, Default)]
pub struct Summary {
    pub best: Option<Best>,
    pub elapsed: Duration,
    pub mutations: u64,
    pub crossovers: u64,
    pub r#gen: usize,
    pub last_imp: usize,
    pub az: Analyzer,
}

impl Summary {
    pub fn clear(&mut self) {
        *self = Summary::default();
    }

    /// Installs `prg` as the new best iff it improves on the current one;
    /// records the generation of improvement.
    pub fn try_improve(&mut self, prg: &Mep, fitness: &Fitness) -> bool {
        let improved = match &self.best {
            Some(best) => *fitness > best.fitness,
            None => true,
        };

        if improved {
            self.last_imp = self.r#gen;
            self.best = Some(Best {
                prg: prg.clone(),
                fitness: fitness.clone(),
            });
        }

        improved
    }

    pub fn best_fitness(&self) -> Option<&Fitness> {
        self.best.as_ref().map(|b| &b.fitness)
    }

    /// Evaluation throughput in steady-state cycles per second.
    pub fn speed(&self, individuals: usize) -> f64 {
        let millis = self.elapsed.as_millis();
        if self.r#gen == 0 || millis == 0 {
            return 0.0;
        }

        1000.0 * (individuals * self.r#gen) as f64 / millis as f64
    }

    pub fn save(&self, out: &mut dyn Write) -> StrataResult<()> {
        match &self.best {
            Some(best) => {
                writeln!(out, "1")?;
                best.prg.save(out)?;
                best.fitness.save(out)?;
            }
            None => writeln!(out, "0")?,
        }

        writeln!(
            out,
            "{} {} {} {} {}",
            self.elapsed.as_millis(),
            self.mutations,
            self.crossovers,
            self.r#gen,
            self.last_imp
        )?;

        Ok(())
    }

    /// Restores a summary saved with [Summary::save]. The analyzer snapshot
    /// is not persisted; it is rebuilt at the next generation. On failure
    /// the receiver is unchanged.
    pub fn load(&mut self, input: &mut dyn BufRead, ops: &OpSet) -> StrataResult<()> {
        let mut line = String::new();

        let mut next_line = move |input: &mut dyn BufRead| -> StrataResult<String> {
            line.clear();
            if input.read_line(&mut line)? == 0 {
                return Err(strata_err!(Parse: "unexpected end of summary data"));
            }
            Ok(line.trim().to_string())
        };

        let present = match next_line(input)?.as_str() {
            "0" => false,
            "1" => true,
            other => return Err(strata_err!(Parse: "malformed presence flag '{}'", other)),
        };

        let best = if present {
            let prg = Mep::load(input, ops)?;
            let fitness = Fitness::parse(&next_line(input)?)?;
            Some(Best { prg, fitness })
        } else {
            None
        };

        let tail = next_line(input)?;
        let mut parts = tail.split_whitespace();
        let mut field = || {
            parts
                .next()
                .and_then(|p| p.parse::<u64>().ok())
                .ok_or_else(|| strata_err!(Parse: "malformed summary tail '{}'", tail))
        };

        let elapsed = field()?;
        let mutations = field()?;
        let crossovers = field()?;
        let r#gen = field()?;
        let last_imp = field()?;

        self.best = best;
        self.elapsed = Duration::from_millis(elapsed);
        self.mutations = mutations;
        self.crossovers = crossovers;
        self.r#gen = r#gen as usize;
        self.last_imp = last_imp as usize;
        self.az = Analyzer::default();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use crate::ops::Op;

    fn alphabet() -> OpSet {
        let mut ops = OpSet::new();
        for op in Op::real_set(0, 1) {
            ops.insert(op);
        }
        ops
    }

    #[test]
    fn test_try_improve_tracks_generation() {
        let ops = alphabet();
        let mut env = Environment::default();
        env.code_length = Some(16);

        let mut sum = Summary::default();
        let a = Mep::random(&env, &ops);

        assert!(sum.try_improve(&a, &Fitness::from(1.0)));

        sum.r#gen = 5;
        assert!(!sum.try_improve(&a, &Fitness::from(0.5)));
        assert_eq!(sum.last_imp, 0);

        assert!(sum.try_improve(&a, &Fitness::from(2.0)));
        assert_eq!(sum.last_imp, 5);
    }

    #[test]
    fn test_save_load_round_trip() {
        let ops = alphabet();
        let mut env = Environment::default();
        env.code_length = Some(16);

        let mut sum = Summary::default();
        sum.try_improve(&Mep::random(&env, &ops), &Fitness::from(3.0));
        sum.r#gen = 12;
        sum.last_imp = 9;
        sum.mutations = 40;
        sum.crossovers = 70;
        sum.elapsed = Duration::from_millis(1234);

        let mut buf = Vec::new();
        sum.save(&mut buf).unwrap();

        let mut other = Summary::default();
        other.load(&mut buf.as_slice(), &ops).unwrap();

        assert_eq!(other.r#gen, 12);
        assert_eq!(other.last_imp, 9);
        assert_eq!(other.mutations, 40);
        assert_eq!(other.crossovers, 70);
        assert_eq!(other.elapsed, Duration::from_millis(1234));
        assert_eq!(other.best_fitness(), Some(&Fitness::from(3.0)));
        assert_eq!(
            other.best.as_ref().map(|b| &b.prg),
            sum.best.as_ref().map(|b| &b.prg)
        );
    }

    #[test]
    fn test_empty_summary_round_trip() {
        let ops = alphabet();

        let mut sum = Summary::default();
        sum.r#gen = 3;

        let mut buf = Vec::new();
        sum.save(&mut buf).unwrap();

        let mut other = Summary::default();
        other.load(&mut buf.as_slice(), &ops).unwrap();

        assert!(other.best.is_none());
        assert_eq!(other.r#gen, 3);
    }
}
