pub mod cache;
pub mod domain;
pub mod environment;
pub mod eval;
pub mod evaluator;
pub mod fitness;
pub mod genome;
pub mod ops;
pub mod population;
pub mod selector;
pub mod stats;

pub use cache::Cache;
pub use domain::{Matrix, random_provider};
pub use environment::{AlpsParameters, Environment};
pub use eval::Interpreter;
pub use evaluator::{CachedEvaluator, Evaluate};
pub use fitness::Fitness;
pub use genome::{Allele, CrossoverKind, Exons, Gene, Locus, Mep, Signature, murmur3};
pub use ops::{Category, DEFAULT_WEIGHT, K_ARGS, Op, OpKind, OpSet, Opcode, Value};
pub use population::{Coord, Population};
pub use selector::Select;
pub use stats::{Analyzer, Best, Distribution, LayerStats, Summary};

pub mod prelude {
    pub use super::domain::random_provider;
    pub use super::environment::{AlpsParameters, Environment};
    pub use super::eval::Interpreter;
    pub use super::evaluator::{CachedEvaluator, Evaluate};
    pub use super::fitness::Fitness;
    pub use super::genome::{CrossoverKind, Gene, Locus, Mep, Signature};
    pub use super::ops::{Category, K_ARGS, Op, OpSet, Opcode, Value};
    pub use super::population::{Coord, Population};
    pub use super::selector::Select;
    pub use super::stats::{Analyzer, Best, Summary};
}
