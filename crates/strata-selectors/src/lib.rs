mod alps;
mod random_selector;
mod tournament;

pub use alps::AlpsSelector;
pub use random_selector::RandomSelector;
pub use tournament::TournamentSelector;
