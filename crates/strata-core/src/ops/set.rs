use smallvec::SmallVec;
use strata_error::{StrataResult, ensure};

use crate::domain::random_provider;
use crate::genome::Mep;
use crate::ops::{Category, K_ARGS, Op, OpKind, Opcode};

/// The alphabet a genome is built from.
///
/// An `OpSet` owns its ops in a flat arena, assigns opcodes monotonically on
/// insertion and keeps a per-category partition used by the weighted draws.
/// The first [K_ARGS] opcodes are reserved for the argument terminals used
/// by ADF parameter passing; they are never returned by a roulette draw.
#[derive(Clone, Debug, Default)]
pub struct OpSet {
    ops: Vec<Op>,
    by_category: Vec<CategoryIndex>,
    auto_defined: usize,
}

#[derive(Clone, Debug, Default)]
struct CategoryIndex {
    all: Vec<Opcode>,
    terminals: Vec<Opcode>,
    functions: Vec<Opcode>,
}

impl OpSet {
    pub fn new() -> Self {
        let mut set = OpSet::default();
        for i in 0..K_ARGS {
            set.ops.push(Op::argument(i));
        }

        set
    }

    /// Adds an op to the set, making it available for sampling, and returns
    /// the opcode assigned to it.
    pub fn insert(&mut self, op: Op) -> Opcode {
        let opcode = self.ops.len() as Opcode;
        self.index(opcode, &op);
        self.ops.push(op);

        opcode
    }

    /// Wraps `body` as an auto-defined function taking arguments of the
    /// given categories. The body must have an effective size of at least
    /// two genes and may not reference the op being defined.
    pub fn insert_adf(
        &mut self,
        body: Mep,
        arg_categories: &[Category],
    ) -> StrataResult<Opcode> {
        self.audit_body(&body)?;
        ensure!(
            !arg_categories.is_empty() && arg_categories.len() <= K_ARGS,
            InvalidParameter: "an ADF takes between 1 and {} arguments", K_ARGS
        );

        let id = self.auto_defined;
        self.auto_defined += 1;

        let op = Op::adf(id, body, SmallVec::from_slice(arg_categories));
        Ok(self.insert(op))
    }

    /// Wraps `body` as an auto-defined terminal.
    pub fn insert_adt(&mut self, body: Mep) -> StrataResult<Opcode> {
        self.audit_body(&body)?;

        let id = self.auto_defined;
        self.auto_defined += 1;

        let op = Op::adt(id, body);
        Ok(self.insert(op))
    }

    fn audit_body(&self, body: &Mep) -> StrataResult<()> {
        ensure!(
            body.is_valid(self),
            InvalidParameter: "auto-defined body fails the consistency audit"
        );
        ensure!(
            body.eff_size(self) >= 2,
            InvalidParameter: "auto-defined body must have an effective size of at least 2"
        );

        // The body may only use already-registered ops; in particular it
        // cannot call the op being defined (no recursion).
        let next = self.ops.len() as Opcode;
        for l in body.exons(self) {
            ensure!(
                body.gene(l).opcode() < next,
                InvalidParameter: "auto-defined body references an unregistered op"
            );
        }

        Ok(())
    }

    fn index(&mut self, opcode: Opcode, op: &Op) {
        if matches!(op.kind(), OpKind::Argument(_)) {
            return;
        }

        let category = op.category();
        if category >= self.by_category.len() {
            self.by_category.resize_with(category + 1, CategoryIndex::default);
        }

        let index = &mut self.by_category[category];
        index.all.push(opcode);
        if op.is_terminal() {
            index.terminals.push(opcode);
        } else {
            index.functions.push(opcode);
        }
    }

    fn rebuild_indices(&mut self) {
        self.by_category.clear();

        for opcode in 0..self.ops.len() {
            let op = &self.ops[opcode];
            if op.weight() == 0 {
                continue;
            }

            let op = op.clone();
            self.index(opcode as Opcode, &op);
        }
    }

    /// Number of categories in the set (>= 1 once populated).
    pub fn categories(&self) -> usize {
        self.by_category.len()
    }

    pub fn len(&self) -> usize {
        self.ops.len() - K_ARGS
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, opcode: Opcode) -> &Op {
        &self.ops[opcode as usize]
    }

    /// Opcode look-up that tolerates unknown codes (used when loading
    /// serialized genomes).
    pub fn decode(&self, opcode: Opcode) -> Option<&Op> {
        self.ops.get(opcode as usize)
    }

    /// The i-th reserved argument terminal.
    pub fn arg(&self, i: usize) -> &Op {
        assert!(i < K_ARGS);
        &self.ops[i]
    }

    pub fn arg_opcode(&self, i: usize) -> Opcode {
        assert!(i < K_ARGS);
        i as Opcode
    }

    pub fn terminals(&self, category: Category) -> usize {
        self.by_category
            .get(category)
            .map(|c| c.terminals.len())
            .unwrap_or(0)
    }

    /// A weighted draw over every op of the category.
    pub fn roulette(&self, category: Category) -> Opcode {
        self.spin(&self.by_category[category].all)
    }

    /// A weighted draw restricted to terminals of the category.
    pub fn roulette_terminal(&self, category: Category) -> Opcode {
        self.spin(&self.by_category[category].terminals)
    }

    /// A weighted draw restricted to functions of the category.
    pub fn roulette_function(&self, category: Category) -> Opcode {
        self.spin(&self.by_category[category].functions)
    }

    // The prefix-sum roulette scan. Slower methods exist on paper, faster in
    // tables, but the scan keeps dynamic weight changes trivial.
    fn spin(&self, wheel: &[Opcode]) -> Opcode {
        assert!(!wheel.is_empty(), "roulette draw from an empty category");

        let total: u64 = wheel.iter().map(|&o| self.get(o).weight() as u64).sum();
        let slot = random_provider::range(0..total);

        let mut wedge = 0u64;
        for &opcode in wheel {
            wedge += self.get(opcode).weight() as u64;
            if slot < wedge {
                return opcode;
            }
        }

        wheel[wheel.len() - 1]
    }

    /// Halves the weight of every auto-defined op (`w <- w - max(1, w/2)`).
    /// Ops whose weight reaches zero are removed from the sampling indices
    /// (they stay in the arena so old genomes keep decoding).
    pub fn reset_adf_weights(&mut self) {
        let mut dirty = false;

        for op in &mut self.ops {
            if !op.is_auto_defined() {
                continue;
            }

            let w = op.weight();
            let delta = if w > 1 { w / 2 } else { w };
            if delta > 0 {
                op.set_weight(w - delta);
                dirty = true;
            }
        }

        if dirty {
            self.rebuild_indices();
        }
    }

    /// True iff every category that appears as some function's argument
    /// category has at least one terminal to terminate chains with.
    pub fn enough_terminals(&self) -> bool {
        let mut need = std::collections::BTreeSet::new();

        for op in &self.ops {
            for i in 0..op.arity() {
                need.insert(op.arg_category(i));
            }
        }

        need.iter()
            .all(|&c| c < self.categories() && self.terminals(c) > 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Op> {
        self.ops.iter().skip(K_ARGS)
    }
}
