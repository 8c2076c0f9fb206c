mod analyzer;
mod distribution;
mod summary;

pub use analyzer::{Analyzer, LayerStats};
pub use distribution::Distribution;
pub use summary::{Best, Summary};
