use smallvec::SmallVec;

use crate::domain::random_provider;
use crate::ops::{K_ARGS, Op, OpKind, Opcode};

/// What a gene stores besides its opcode: the random initialization value
/// of a parametric terminal, or the argument row indices of a function.
/// Plain terminals carry an empty argument vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Allele {
    Param(i32),
    Args(SmallVec<[usize; K_ARGS]>),
}

/// One cell of the genome tape. Genes reference their op by opcode (the
/// [OpSet](crate::ops::OpSet) owns the actual primitives) and their
/// arguments by row index into the same genome; the construction invariant
/// `argument row > own row` keeps the encoded graph acyclic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gene {
    op: Opcode,
    allele: Allele,
}

impl Gene {
    /// Builds a gene for `op`, drawing any argument indices uniformly from
    /// `[from, sup)` and any parameter from the op's declared range.
    pub fn random(op: &Op, opcode: Opcode, from: usize, sup: usize) -> Gene {
        let allele = match op.kind() {
            OpKind::Parametric { min, max, .. } => {
                Allele::Param(random_provider::range(*min..*max))
            }
            _ if op.arity() > 0 => {
                debug_assert!(from < sup);
                let args = (0..op.arity())
                    .map(|_| random_provider::range(from..sup))
                    .collect();
                Allele::Args(args)
            }
            _ => Allele::Args(SmallVec::new()),
        };

        Gene { op: opcode, allele }
    }

    /// A gene with explicit parts; used by deserialization and by tests
    /// that pin down exact programs.
    pub fn with_parts(op: Opcode, allele: Allele) -> Gene {
        Gene { op, allele }
    }

    pub fn opcode(&self) -> Opcode {
        self.op
    }

    pub fn allele(&self) -> &Allele {
        &self.allele
    }

    pub fn param(&self) -> Option<i32> {
        match self.allele {
            Allele::Param(p) => Some(p),
            Allele::Args(_) => None,
        }
    }

    pub fn args(&self) -> &[usize] {
        match &self.allele {
            Allele::Args(args) => args,
            Allele::Param(_) => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::Value;

    fn stub(it: &crate::eval::Interpreter<'_>) -> Option<Value> {
        it.fetch_arg(0)
    }

    #[test]
    fn test_random_function_gene_points_forward() {
        let op = Op::function("F", 0, &[0, 0], stub);

        for _ in 0..500 {
            let gene = Gene::random(&op, 9, 5, 20);
            assert_eq!(gene.opcode(), 9);
            assert_eq!(gene.args().len(), 2);
            assert!(gene.args().iter().all(|&a| (5..20).contains(&a)));
        }
    }

    #[test]
    fn test_random_parametric_gene_in_range() {
        let op = Op::parametric("P", 0, -10, 10, |p| Value::Int(p as i64));

        for _ in 0..500 {
            let gene = Gene::random(&op, 4, 0, 1);
            let p = gene.param().unwrap();
            assert!((-10..10).contains(&p));
        }
    }

    #[test]
    fn test_plain_terminal_has_no_args() {
        let op = Op::constant("C", 0, Value::Real(1.0));
        let gene = Gene::random(&op, 7, 3, 8);

        assert!(gene.args().is_empty());
        assert!(gene.param().is_none());
    }
}
