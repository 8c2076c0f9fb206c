use tracing::error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::fitness::Fitness;

/// Parameters of the Age-Layered Population Structure.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlpsParameters {
    /// Multiplier of the per-layer age limits and period of the layer-0
    /// restarts.
    pub age_gap: Option<usize>,

    /// Probability that the second parent is drawn from the same layer as
    /// the first (otherwise it comes from the layer below).
    pub p_same_layer: Option<f64>,
}

impl AlpsParameters {
    pub fn age_gap(&self) -> usize {
        self.age_gap.unwrap_or(20)
    }

    pub fn p_same_layer(&self) -> f64 {
        self.p_same_layer.unwrap_or(0.75)
    }
}

/// The container for the engine's parameters. Unset options (`None`) are
/// resolved to defaults by the accessor methods and materialised by
/// [Environment::init]; `is_valid` refuses configurations a run cannot
/// start from.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Environment {
    /// Number of genome rows. Fixed once a population exists.
    pub code_length: Option<usize>,

    /// Length of the terminals-only tail of the genome. Must stay below
    /// `code_length`.
    pub patch_length: Option<usize>,

    /// Maximum number of population layers.
    pub layers: Option<usize>,

    /// Number of individuals per layer.
    pub individuals: Option<usize>,

    /// An elitist engine never replaces the population's best with a worse
    /// individual. `None` lets the strategy decide.
    pub elitism: Option<bool>,

    /// Probability of mutating a single active gene (not the probability of
    /// choosing the mutation operator, which is `1 - p_cross`).
    pub p_mutation: Option<f64>,

    /// Probability of recombining the selected parents.
    pub p_cross: Option<f64>,

    /// Number of extra candidates produced per crossover step; the best of
    /// the brood is kept. 0 disables brood recombination.
    pub brood_recombination: Option<usize>,

    /// Size of the selection tournament.
    pub tournament_size: Option<usize>,

    /// Width of the mating neighbourhood on the population ring. A value
    /// of at least the layer size makes selection panmictic.
    pub mate_zone: Option<usize>,

    /// Hard cap on the number of generations.
    pub generations: Option<usize>,

    /// Stop after this many generations without improvement. `None`
    /// disables the stagnation check.
    pub max_stuck_time: Option<usize>,

    /// The fitness cache holds `2^cache_bits` slots.
    pub cache_bits: Option<u32>,

    /// Adaptive representation through learning: harvest ADFs from the
    /// running best at each age-gap boundary.
    pub arl: Option<bool>,

    /// Percentage of data reserved for validation by the hosting problem.
    /// Recognised and validated here; the core does not consume it.
    pub validation_percentage: Option<usize>,

    /// Dynamic subset selection period (0 disables). Recognised for hosts
    /// that install a shake-data hook.
    pub dss: Option<usize>,

    /// Stop as soon as the best fitness reaches this threshold.
    pub f_threshold: Option<Fitness>,

    pub alps: AlpsParameters,
}

impl Environment {
    pub fn code_length(&self) -> usize {
        self.code_length.unwrap_or(100)
    }

    pub fn patch_length(&self) -> usize {
        self.patch_length.unwrap_or(1 + self.code_length() / 10)
    }

    pub fn layers(&self) -> usize {
        self.layers.unwrap_or(1)
    }

    pub fn individuals(&self) -> usize {
        self.individuals.unwrap_or(100)
    }

    pub fn elitism(&self) -> bool {
        self.elitism.unwrap_or(true)
    }

    pub fn p_mutation(&self) -> f64 {
        self.p_mutation.unwrap_or(0.04)
    }

    pub fn p_cross(&self) -> f64 {
        self.p_cross.unwrap_or(0.9)
    }

    pub fn brood_recombination(&self) -> usize {
        self.brood_recombination.unwrap_or(0)
    }

    pub fn tournament_size(&self) -> usize {
        self.tournament_size.unwrap_or(5)
    }

    pub fn mate_zone(&self) -> usize {
        self.mate_zone.unwrap_or(20)
    }

    pub fn generations(&self) -> usize {
        self.generations.unwrap_or(100)
    }

    pub fn max_stuck_time(&self) -> Option<usize> {
        self.max_stuck_time
    }

    pub fn cache_bits(&self) -> u32 {
        self.cache_bits.unwrap_or(16)
    }

    pub fn arl(&self) -> bool {
        self.arl.unwrap_or(false)
    }

    pub fn validation_percentage(&self) -> usize {
        self.validation_percentage.unwrap_or(0)
    }

    pub fn dss(&self) -> usize {
        self.dss.unwrap_or(0)
    }

    /// Materialises the defaults into every unset option.
    pub fn init(&mut self) -> &mut Self {
        self.code_length = Some(self.code_length());
        self.patch_length = Some(self.patch_length());
        self.layers = Some(self.layers());
        self.individuals = Some(self.individuals());
        self.elitism = Some(self.elitism());
        self.p_mutation = Some(self.p_mutation());
        self.p_cross = Some(self.p_cross());
        self.brood_recombination = Some(self.brood_recombination());
        self.tournament_size = Some(self.tournament_size());
        self.mate_zone = Some(self.mate_zone());
        self.generations = Some(self.generations());
        self.cache_bits = Some(self.cache_bits());
        self.arl = Some(self.arl());
        self.validation_percentage = Some(self.validation_percentage());
        self.dss = Some(self.dss());
        self.alps.age_gap = Some(self.alps.age_gap());
        self.alps.p_same_layer = Some(self.alps.p_same_layer());
        self
    }

    /// Audits the configuration, logging a human-readable cause for every
    /// failure. With `force_defined` every option a run needs must be
    /// explicitly set (call [Environment::init] first to accept defaults).
    pub fn is_valid(&self, force_defined: bool) -> bool {
        if force_defined {
            let defined = [
                ("code_length", self.code_length.is_some()),
                ("patch_length", self.patch_length.is_some()),
                ("layers", self.layers.is_some()),
                ("individuals", self.individuals.is_some()),
                ("elitism", self.elitism.is_some()),
                ("p_mutation", self.p_mutation.is_some()),
                ("p_cross", self.p_cross.is_some()),
                ("brood_recombination", self.brood_recombination.is_some()),
                ("tournament_size", self.tournament_size.is_some()),
                ("mate_zone", self.mate_zone.is_some()),
                ("generations", self.generations.is_some()),
                ("cache_bits", self.cache_bits.is_some()),
                ("alps.age_gap", self.alps.age_gap.is_some()),
                ("alps.p_same_layer", self.alps.p_same_layer.is_some()),
            ];

            for (name, ok) in defined {
                if !ok {
                    error!(parameter = name, "undefined required parameter");
                    return false;
                }
            }
        }

        if self.code_length() == 0 {
            error!("code_length must be positive");
            return false;
        }

        if self.patch_length() == 0 || self.patch_length() >= self.code_length() {
            error!(
                patch_length = self.patch_length(),
                code_length = self.code_length(),
                "patch_length must be in [1, code_length)"
            );
            return false;
        }

        if self.layers() == 0 {
            error!("layers must be at least 1");
            return false;
        }

        if self.individuals() < 4 {
            error!(individuals = self.individuals(), "too few individuals per layer");
            return false;
        }

        if !(0.0..=1.0).contains(&self.p_mutation()) {
            error!(p_mutation = self.p_mutation(), "p_mutation out of range");
            return false;
        }

        if !(0.0..=1.0).contains(&self.p_cross()) {
            error!(p_cross = self.p_cross(), "p_cross out of range");
            return false;
        }

        if self.tournament_size() == 0
            || self.tournament_size() > self.individuals()
            || self.tournament_size() > self.mate_zone()
        {
            error!(
                tournament_size = self.tournament_size(),
                individuals = self.individuals(),
                mate_zone = self.mate_zone(),
                "tournament_size must be in [1, min(individuals, mate_zone)]"
            );
            return false;
        }

        if !(0.0..=1.0).contains(&self.alps.p_same_layer()) {
            error!(
                p_same_layer = self.alps.p_same_layer(),
                "alps.p_same_layer out of range"
            );
            return false;
        }

        if self.alps.age_gap() == 0 {
            error!("alps.age_gap must be positive");
            return false;
        }

        if self.validation_percentage() >= 100 {
            error!(
                validation_percentage = self.validation_percentage(),
                "validation_percentage out of range"
            );
            return false;
        }

        if self.cache_bits() == 0 || self.cache_bits() >= 48 {
            error!(cache_bits = self.cache_bits(), "cache_bits out of range");
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let env = Environment::default();
        assert!(env.is_valid(false));

        let mut env = Environment::default();
        env.init();
        assert!(env.is_valid(true));
    }

    #[test]
    fn test_force_defined_rejects_unset() {
        let env = Environment::default();
        assert!(!env.is_valid(true));
    }

    #[test]
    fn test_rejects_bad_patch_length() {
        let mut env = Environment::default();
        env.code_length = Some(10);
        env.patch_length = Some(10);
        assert!(!env.is_valid(false));

        env.patch_length = Some(0);
        assert!(!env.is_valid(false));

        env.patch_length = Some(3);
        assert!(env.is_valid(false));
    }

    #[test]
    fn test_rejects_bad_probabilities() {
        let mut env = Environment::default();
        env.p_mutation = Some(1.5);
        assert!(!env.is_valid(false));

        env.p_mutation = Some(0.5);
        env.p_cross = Some(-0.1);
        assert!(!env.is_valid(false));
    }

    #[test]
    fn test_rejects_oversized_tournament() {
        let mut env = Environment::default();
        env.individuals = Some(10);
        env.tournament_size = Some(11);
        assert!(!env.is_valid(false));

        env.tournament_size = Some(30);
        env.individuals = Some(100);
        env.mate_zone = Some(20);
        assert!(!env.is_valid(false));
    }

    #[test]
    fn test_init_fills_defaults() {
        let mut env = Environment::default();
        env.code_length = Some(64);
        env.init();

        assert_eq!(env.code_length, Some(64));
        assert_eq!(env.patch_length, Some(1 + 64 / 10));
        assert_eq!(env.layers, Some(1));
        assert!(env.alps.age_gap.is_some());
    }
}
