use crate::fitness::Fitness;
use crate::genome::Mep;
use crate::population::{Coord, Population};

/// A selection algorithm: produces the ordered list of parent coordinates
/// one steady-state step works on. Implementations draw through the given
/// fitness function, which typically routes through the cached evaluator.
pub trait Select {
    fn select(
        &self,
        pop: &Population,
        fitness: &mut dyn FnMut(&Mep) -> Fitness,
    ) -> Vec<Coord>;
}
