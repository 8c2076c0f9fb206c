mod gene;
mod locus;
mod mep;
mod signature;

pub use gene::{Allele, Gene};
pub use locus::Locus;
pub use mep::{CrossoverKind, Exons, Mep};
pub use signature::{Signature, murmur3};
