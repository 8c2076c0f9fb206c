//! Multi-expression programming with age-layered populations.
//!
//! A genome here is a fixed-shape matrix of instructions with a designated
//! root; only the code reachable from the root is active, the rest rides
//! along as introns. Evolution is steady state, optionally structured into
//! age layers (ALPS) to keep exploration alive on long runs, with a
//! signature-indexed transposition table short-circuiting re-evaluation of
//! logically equivalent programs.
//!
//! ```no_run
//! use strata::prelude::*;
//!
//! let mut ops = OpSet::new();
//! for op in Op::real_set(0, 1) {
//!     ops.insert(op);
//! }
//!
//! let mut env = Environment::default();
//! env.code_length = Some(64);
//! env.generations = Some(50);
//!
//! let fitness = |prg: &Mep, ops: &OpSet| {
//!     let inputs = [Value::Real(2.0)];
//!     match Interpreter::with_inputs(prg, ops, &inputs).run() {
//!         Some(v) => Fitness::from(-(v.as_real().unwrap_or(f64::MAX) - 4.0).abs()),
//!         None => Fitness::lowest(),
//!     }
//! };
//!
//! let mut evo = Evolution::standard(env, ops, fitness).unwrap();
//! let summary = evo.run();
//! println!("best: {:?}", summary.best_fitness());
//! ```

pub use strata_core::*;

pub use strata_alters::{
    Cross, OnePointCrossover, PointMutation, TreeCrossover, TwoPointCrossover, UniformCrossover,
    crossover,
};
pub use strata_engines::{
    AlpsReplacement, AlpsStrategy, BaseRecombination, Evolution, FamilyCompetition, Limit,
    ParetoReplacement, StdStrategy, Strategy, TournamentReplacement, arl,
};
pub use strata_error::{ErrorCode, StrataError, StrataResult};
pub use strata_selectors::{AlpsSelector, RandomSelector, TournamentSelector};

pub mod prelude {
    pub use strata_core::prelude::*;

    pub use strata_alters::{Cross, PointMutation, crossover};
    pub use strata_engines::{
        AlpsStrategy, BaseRecombination, Evolution, Limit, StdStrategy, Strategy,
    };
    pub use strata_error::{StrataError, StrataResult};
    pub use strata_selectors::{AlpsSelector, RandomSelector, TournamentSelector};
}
