pub mod crossovers;
pub mod mutators;

pub use crossovers::{
    Cross, OnePointCrossover, TreeCrossover, TwoPointCrossover, UniformCrossover, crossover,
};
pub use mutators::PointMutation;
