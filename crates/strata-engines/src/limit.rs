use strata_core::environment::Environment;
use strata_core::fitness::Fitness;
use strata_core::stats::Summary;

/// A stop condition the generational loop checks once per generation.
#[derive(Clone, Debug)]
pub enum Limit {
    /// Stop once the generation counter passes the cap.
    Generations(usize),
    /// Stop once the running best reaches the threshold.
    Threshold(Fitness),
    /// Stop after this many generations without improvement.
    Stagnation(usize),
}

impl Limit {
    pub fn reached(&self, stats: &Summary) -> bool {
        match self {
            Limit::Generations(cap) => stats.r#gen > *cap,
            Limit::Threshold(threshold) => stats
                .best_fitness()
                .map(|best| best >= threshold)
                .unwrap_or(false),
            Limit::Stagnation(window) => stats.r#gen.saturating_sub(stats.last_imp) > *window,
        }
    }

    /// The limits an environment implies: the hard generation cap, plus the
    /// optional fitness threshold and stagnation window.
    pub fn from_env(env: &Environment) -> Vec<Limit> {
        let mut limits = vec![Limit::Generations(env.generations())];

        if let Some(threshold) = &env.f_threshold {
            limits.push(Limit::Threshold(threshold.clone()));
        }

        if let Some(window) = env.max_stuck_time() {
            limits.push(Limit::Stagnation(window));
        }

        limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_cap() {
        let limit = Limit::Generations(10);

        let mut stats = Summary::default();
        stats.r#gen = 10;
        assert!(!limit.reached(&stats));

        stats.r#gen = 11;
        assert!(limit.reached(&stats));
    }

    #[test]
    fn test_threshold_needs_a_best() {
        let limit = Limit::Threshold(Fitness::from(0.0));

        let stats = Summary::default();
        assert!(!limit.reached(&stats));
    }

    #[test]
    fn test_stagnation_window() {
        let limit = Limit::Stagnation(5);

        let mut stats = Summary::default();
        stats.r#gen = 5;
        stats.last_imp = 0;
        assert!(!limit.reached(&stats));

        stats.r#gen = 6;
        assert!(limit.reached(&stats));

        stats.last_imp = 4;
        assert!(!limit.reached(&stats));
    }

    #[test]
    fn test_from_env_collects_configured_limits() {
        let mut env = Environment::default();
        assert_eq!(Limit::from_env(&env).len(), 1);

        env.f_threshold = Some(Fitness::from(0.0));
        env.max_stuck_time = Some(25);
        assert_eq!(Limit::from_env(&env).len(), 3);
    }
}
