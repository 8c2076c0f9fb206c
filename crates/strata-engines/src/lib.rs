pub mod arl;
mod evolution;
mod limit;
mod recombine;
mod replace;
mod strategy;

pub use evolution::Evolution;
pub use limit::Limit;
pub use recombine::BaseRecombination;
pub use replace::{AlpsReplacement, FamilyCompetition, ParetoReplacement, TournamentReplacement};
pub use strategy::{AlpsStrategy, StdStrategy, Strategy};
