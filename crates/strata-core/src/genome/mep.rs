use std::cell::Cell;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};
use std::io::{BufRead, Write};

use smallvec::SmallVec;
use strata_error::{StrataResult, ensure, strata_err};

use crate::domain::Matrix;
use crate::environment::Environment;
use crate::genome::signature::{Signature, murmur3};
use crate::genome::{Allele, Gene, Locus};
use crate::ops::{K_ARGS, OpSet, Opcode};

/// Seed of the signature hash.
const SIGNATURE_SEED: u32 = 1973;

/// The crossover scheme an offspring was produced with; kept on the
/// individual for lineage statistics.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CrossoverKind {
    Uniform,
    OnePoint,
    TwoPoint,
    Tree,
}

impl Display for CrossoverKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrossoverKind::Uniform => "uniform",
            CrossoverKind::OnePoint => "one-point",
            CrossoverKind::TwoPoint => "two-point",
            CrossoverKind::Tree => "tree",
        };
        write!(f, "{}", name)
    }
}

/// A multi-expression program: a fixed-shape rows x categories matrix of
/// genes plus the locus of the root of the active code (`best`). Genes past
/// the patch boundary are terminals, which guarantees that every argument
/// chain terminates.
///
/// Only the subtree reachable from `best` is semantically active; the rest
/// of the matrix rides along as introns. The signature hashes the active
/// subtree only, so logically equivalent programs collide on purpose.
#[derive(Clone, Debug)]
pub struct Mep {
    genome: Matrix<Gene>,
    best: Locus,
    age: usize,
    crossover_kind: Option<CrossoverKind>,
    signature: Cell<Option<Signature>>,
}

impl Mep {
    /// A random program: the standard section draws from the whole alphabet
    /// (function arguments point at strictly later rows), the patch section
    /// draws terminals only.
    pub fn random(env: &Environment, ops: &OpSet) -> Mep {
        let rows = env.code_length();
        let patch = env.patch_length();
        let categories = ops.categories();

        debug_assert!(rows > patch && patch >= 1);
        debug_assert!(categories >= 1);
        debug_assert!(ops.enough_terminals());

        let boundary = rows - patch;
        let genome = Matrix::from_fn(rows, categories, |i, c| {
            let opcode = if i < boundary {
                ops.roulette(c)
            } else {
                ops.roulette_terminal(c)
            };

            Gene::random(ops.get(opcode), opcode, i + 1, rows)
        });

        Mep {
            genome,
            best: Locus::default(),
            age: 0,
            crossover_kind: None,
            signature: Cell::new(None),
        }
    }

    /// Builds a program gene by gene; used by deserialization and by tests
    /// that pin down literal programs.
    pub fn from_fn(
        rows: usize,
        categories: usize,
        f: impl FnMut(usize, usize) -> Gene,
    ) -> Mep {
        Mep {
            genome: Matrix::from_fn(rows, categories, f),
            best: Locus::default(),
            age: 0,
            crossover_kind: None,
            signature: Cell::new(None),
        }
    }

    pub fn with_best(mut self, best: Locus) -> Mep {
        self.best = best;
        self.signature.set(None);
        self
    }

    /// Total number of rows (active genes plus introns). Constant over the
    /// life of the individual.
    pub fn size(&self) -> usize {
        self.genome.rows()
    }

    pub fn rows(&self) -> usize {
        self.genome.rows()
    }

    pub fn categories(&self) -> usize {
        self.genome.cols()
    }

    pub fn best(&self) -> Locus {
        self.best
    }

    /// The category of the value the program computes.
    pub fn category(&self) -> usize {
        self.best.category
    }

    #[inline]
    pub fn gene(&self, l: Locus) -> &Gene {
        self.genome.get(l)
    }

    /// Overwrites the gene at `l`, invalidating the cached signature.
    pub fn set(&mut self, l: Locus, gene: Gene) {
        *self.genome.get_mut(l) = gene;
        self.signature.set(None);
    }

    pub fn age(&self) -> usize {
        self.age
    }

    pub fn inc_age(&mut self) {
        self.age += 1;
    }

    pub fn set_age(&mut self, age: usize) {
        self.age = age;
    }

    pub fn crossover_kind(&self) -> Option<CrossoverKind> {
        self.crossover_kind
    }

    pub fn set_crossover_kind(&mut self, kind: CrossoverKind) {
        self.crossover_kind = Some(kind);
    }

    /// Iterates the active genes in the deterministic pre-order induced by
    /// the frontier of pending loci (smallest first).
    pub fn exons<'a>(&'a self, ops: &'a OpSet) -> Exons<'a> {
        let mut frontier = BTreeSet::new();
        frontier.insert(self.best);

        Exons {
            prg: self,
            ops,
            frontier,
        }
    }

    /// Number of genes reachable from `best`. May exceed [Mep::size] when
    /// the genome has more than one category.
    pub fn eff_size(&self, ops: &OpSet) -> usize {
        self.exons(ops).count()
    }

    /// Active loci holding a function: the roots of the program's blocks.
    pub fn blocks(&self, ops: &OpSet) -> Vec<Locus> {
        self.exons(ops)
            .filter(|&l| ops.get(self.gene(l).opcode()).arity() > 0)
            .collect()
    }

    /// The same genome re-rooted at `l` (active subtree = block at `l`).
    pub fn get_block(&self, l: Locus) -> Mep {
        self.clone().with_best(l)
    }

    /// Replaces every gene of row `index` with a random terminal, cutting
    /// whatever block passed through that row.
    pub fn destroy_block(&self, index: usize, ops: &OpSet) -> Mep {
        debug_assert!(index < self.size());

        let mut ret = self.clone();
        for c in 0..self.categories() {
            let opcode = ops.roulette_terminal(c);
            ret.set(
                Locus::new(index, c),
                Gene::random(ops.get(opcode), opcode, index + 1, self.size()),
            );
        }

        ret
    }

    /// Substitutes up to `max_args` active terminals with the reserved
    /// argument ops, producing the body of a prospective ADF together with
    /// the substituted loci.
    pub fn generalize(
        &self,
        max_args: usize,
        ops: &OpSet,
    ) -> StrataResult<(Mep, Vec<Locus>)> {
        debug_assert!(max_args >= 1 && max_args <= K_ARGS);

        let mut terminals = self
            .exons(ops)
            .filter(|&l| ops.get(self.gene(l).opcode()).is_terminal())
            .collect::<Vec<_>>();

        ensure!(
            !terminals.is_empty(),
            InvalidParameter: "cannot generalize a program without active terminals"
        );

        crate::domain::random_provider::shuffle(&mut terminals);

        let n = max_args.min(terminals.len());
        let mut ret = self.clone();
        for (j, &l) in terminals.iter().take(n).enumerate() {
            ret.set(l, Gene::with_parts(ops.arg_opcode(j), Allele::Args(SmallVec::new())));
        }

        terminals.truncate(n);
        Ok((ret, terminals))
    }

    /// Number of loci at which the two programs disagree. Both must share
    /// shape.
    pub fn distance(&self, other: &Mep) -> usize {
        debug_assert!(self.size() == other.size());
        debug_assert!(self.categories() == other.categories());

        self.genome
            .iter()
            .zip(other.genome.iter())
            .filter(|(a, b)| a != b)
            .count()
    }

    fn pack(&self, l: Locus, ops: &OpSet, buf: &mut Vec<u8>) {
        let g = self.gene(l);
        let op = ops.get(g.opcode());

        buf.extend_from_slice(&g.opcode().to_le_bytes());

        if let Some(param) = g.param() {
            buf.extend_from_slice(&(param as i16).to_le_bytes());
        } else {
            for (i, &arg) in g.args().iter().enumerate() {
                self.pack(Locus::new(arg, op.arg_category(i)), ops, buf);
            }
        }
    }

    /// The 128 bit hash of the active subtree. Computed on demand and
    /// cached until a gene is written.
    pub fn signature(&self, ops: &OpSet) -> Signature {
        if let Some(sig) = self.signature.get() {
            return sig;
        }

        let mut packed = Vec::new();
        self.pack(self.best, ops, &mut packed);

        let sig = murmur3(&packed, SIGNATURE_SEED);
        self.signature.set(Some(sig));
        sig
    }

    /// Internal consistency audit. Violations are programmer errors; the
    /// engine only calls this in debug paths and on deserialized data.
    pub fn is_valid(&self, ops: &OpSet) -> bool {
        let rows = self.size();
        let categories = self.categories();

        for (l, g) in self.genome.enumerate() {
            let Some(op) = ops.decode(g.opcode()) else {
                return false;
            };

            if op.arity() > K_ARGS || g.args().len() != op.arity() {
                return false;
            }

            if op.is_parametric() != g.param().is_some() {
                return false;
            }

            // Argument addresses must stay inside the genome and point at
            // strictly later rows.
            for &arg in g.args() {
                if arg >= rows || arg <= l.index {
                    return false;
                }
            }

            if op.category() != l.category {
                return false;
            }
        }

        for c in 0..categories {
            let last = self.gene(Locus::new(rows - 1, c));
            if ops.get(last.opcode()).arity() > 0 {
                return false;
            }
        }

        if self.best.index >= rows || self.best.category >= categories {
            return false;
        }

        if let Some(cached) = self.signature.get() {
            let mut packed = Vec::new();
            self.pack(self.best, ops, &mut packed);
            if cached != murmur3(&packed, SIGNATURE_SEED) {
                return false;
            }
        }

        true
    }

    /// The active code on a single line, symbols in pre-order. Compact, not
    /// meant to be pretty.
    pub fn in_line(&self, ops: &OpSet) -> String {
        fn visit(prg: &Mep, ops: &OpSet, l: Locus, out: &mut String) {
            let g = prg.gene(l);
            let op = ops.get(g.opcode());

            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&op.display());
            if let Some(p) = g.param() {
                out.push_str(&format!("({})", p));
            }

            for (i, &arg) in g.args().iter().enumerate() {
                visit(prg, ops, Locus::new(arg, op.arg_category(i)), out);
            }
        }

        let mut out = String::new();
        visit(self, ops, self.best, &mut out);
        out
    }

    /// One line per active gene, BASIC-listing style.
    pub fn list(&self, ops: &OpSet) -> String {
        let mut out = String::new();
        for l in self.exons(ops) {
            let g = self.gene(l);
            out.push_str(&format!("[{}] {}", l, ops.get(g.opcode()).display()));

            if let Some(p) = g.param() {
                out.push_str(&format!(" {}", p));
            }
            for arg in g.args() {
                out.push_str(&format!(" {}", arg));
            }
            out.push('\n');
        }

        out
    }

    pub fn save(&self, out: &mut dyn Write) -> StrataResult<()> {
        writeln!(out, "{} {}", self.size(), self.categories())?;

        for (_, g) in self.genome.enumerate() {
            write!(out, "{}", g.opcode())?;
            if let Some(p) = g.param() {
                write!(out, " {}", p)?;
            }
            for arg in g.args() {
                write!(out, " {}", arg)?;
            }
            writeln!(out)?;
        }

        writeln!(out, "{} {}", self.best.index, self.best.category)?;
        writeln!(out, "{}", self.age)?;

        Ok(())
    }

    /// Loads a program saved with [Mep::save]. The operation is
    /// transactional: on any parse or consistency failure an error is
    /// returned and nothing is produced.
    pub fn load(input: &mut dyn BufRead, ops: &OpSet) -> StrataResult<Mep> {
        let mut line = String::new();

        let mut next_line = move |input: &mut dyn BufRead| -> StrataResult<String> {
            line.clear();
            if input.read_line(&mut line)? == 0 {
                return Err(strata_err!(Parse: "unexpected end of genome data"));
            }
            Ok(line.trim().to_string())
        };

        let header = next_line(input)?;
        let mut parts = header.split_whitespace();
        let rows = parts
            .next()
            .and_then(|p| p.parse::<usize>().ok())
            .ok_or_else(|| strata_err!(Parse: "malformed genome header '{}'", header))?;
        let categories = parts
            .next()
            .and_then(|p| p.parse::<usize>().ok())
            .ok_or_else(|| strata_err!(Parse: "malformed genome header '{}'", header))?;

        ensure!(rows > 0 && categories > 0, Parse: "degenerate genome shape");

        let mut genes = Vec::with_capacity(rows * categories);
        for _ in 0..rows * categories {
            let text = next_line(input)?;
            let mut fields = text.split_whitespace();

            let opcode = fields
                .next()
                .and_then(|p| p.parse::<Opcode>().ok())
                .ok_or_else(|| strata_err!(Parse: "malformed gene '{}'", text))?;
            let op = ops
                .decode(opcode)
                .ok_or_else(|| strata_err!(Parse: "unknown opcode {}", opcode))?;

            let allele = if op.is_parametric() {
                let p = fields
                    .next()
                    .and_then(|p| p.parse::<i32>().ok())
                    .ok_or_else(|| strata_err!(Parse: "missing parameter in '{}'", text))?;
                Allele::Param(p)
            } else {
                let args = fields
                    .map(|p| p.parse::<usize>())
                    .collect::<Result<SmallVec<[usize; K_ARGS]>, _>>()
                    .map_err(|_| strata_err!(Parse: "malformed gene '{}'", text))?;
                ensure!(
                    args.len() == op.arity(),
                    Parse: "arity mismatch for opcode {}", opcode
                );
                Allele::Args(args)
            };

            genes.push(Gene::with_parts(opcode, allele));
        }

        let best_line = next_line(input)?;
        let mut best_parts = best_line.split_whitespace();
        let best_index = best_parts
            .next()
            .and_then(|p| p.parse::<usize>().ok())
            .ok_or_else(|| strata_err!(Parse: "malformed best locus '{}'", best_line))?;
        let best_category = best_parts
            .next()
            .and_then(|p| p.parse::<usize>().ok())
            .ok_or_else(|| strata_err!(Parse: "malformed best locus '{}'", best_line))?;

        let age_line = next_line(input)?;
        let age = age_line
            .parse::<usize>()
            .map_err(|_| strata_err!(Parse: "malformed age '{}'", age_line))?;

        let mep = Mep {
            genome: Matrix::from_fn(rows, categories, |row, col| {
                genes[row * categories + col].clone()
            }),
            best: Locus::new(best_index, best_category),
            age,
            crossover_kind: None,
            signature: Cell::new(None),
        };

        ensure!(mep.is_valid(ops), Parse: "loaded genome fails the consistency audit");

        Ok(mep)
    }
}

impl PartialEq for Mep {
    /// Gene-by-gene equality, introns included; age is not compared.
    fn eq(&self, other: &Self) -> bool {
        self.best == other.best && self.genome == other.genome
    }
}

/// Iterator over the active loci of a program.
pub struct Exons<'a> {
    prg: &'a Mep,
    ops: &'a OpSet,
    frontier: BTreeSet<Locus>,
}

impl<'a> Iterator for Exons<'a> {
    type Item = Locus;

    fn next(&mut self) -> Option<Locus> {
        let l = self.frontier.pop_first()?;

        let g = self.prg.gene(l);
        let op = self.ops.get(g.opcode());
        for (i, &arg) in g.args().iter().enumerate() {
            self.frontier.insert(Locus::new(arg, op.arg_category(i)));
        }

        Some(l)
    }
}
