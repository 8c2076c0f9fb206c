use std::cell::{Cell, RefCell};

use crate::domain::Matrix;
use crate::genome::{Locus, Mep};
use crate::ops::{OpSet, Value};

/// Evaluates the active subtree of a program.
///
/// Evaluation is demand driven: a function op pulls the arguments it needs
/// through [Interpreter::fetch_arg], which memoises per-locus results for
/// the duration of one [Interpreter::run]. Memoisation is sound only
/// because ops are referentially transparent.
///
/// The empty value (`None`) signals an undefined result and propagates:
/// any op receiving an empty argument returns empty.
///
/// An ADF op evaluates by instantiating a nested interpreter over its body
/// with the calling interpreter as context, so the reserved argument
/// terminals can resolve through [Interpreter::fetch_adf_arg].
pub struct Interpreter<'a> {
    prg: &'a Mep,
    ops: &'a OpSet,
    inputs: &'a [Value],
    ip: Cell<Locus>,
    memo: RefCell<Matrix<Option<Option<Value>>>>,
    context: Option<&'a Interpreter<'a>>,
}

impl<'a> Interpreter<'a> {
    pub fn new(prg: &'a Mep, ops: &'a OpSet) -> Interpreter<'a> {
        Interpreter::with_inputs(prg, ops, &[])
    }

    pub fn with_inputs(prg: &'a Mep, ops: &'a OpSet, inputs: &'a [Value]) -> Interpreter<'a> {
        Interpreter {
            prg,
            ops,
            inputs,
            ip: Cell::new(prg.best()),
            memo: RefCell::new(Matrix::filled(prg.size(), prg.categories(), None)),
            context: None,
        }
    }

    /// A child interpreter over an ADF body; `self` becomes the context the
    /// body's argument terminals resolve through.
    pub fn nested<'b>(&'b self, body: &'b Mep) -> Interpreter<'b> {
        Interpreter {
            prg: body,
            ops: self.ops,
            inputs: self.inputs,
            ip: Cell::new(body.best()),
            memo: RefCell::new(Matrix::filled(body.size(), body.categories(), None)),
            context: Some(self),
        }
    }

    /// A child interpreter over an ADT body. ADTs take no arguments, so no
    /// context is threaded through.
    pub fn detached<'b>(&'b self, body: &'b Mep) -> Interpreter<'b> {
        Interpreter {
            prg: body,
            ops: self.ops,
            inputs: self.inputs,
            ip: Cell::new(body.best()),
            memo: RefCell::new(Matrix::filled(body.size(), body.categories(), None)),
            context: None,
        }
    }

    /// Evaluates the program from its `best` locus.
    pub fn run(&self) -> Option<Value> {
        self.run_locus(self.prg.best())
    }

    /// Evaluates the subtree rooted at `l`.
    pub fn run_locus(&self, l: Locus) -> Option<Value> {
        self.memo.borrow_mut().fill(None);

        self.ip.set(l);
        self.ops.get(self.prg.gene(l).opcode()).eval(self)
    }

    /// The evaluated value of the i-th argument of the current function
    /// gene. Memoised per locus within one run.
    pub fn fetch_arg(&self, i: usize) -> Option<Value> {
        let ip = self.ip.get();
        let g = self.prg.gene(ip);
        let op = self.ops.get(g.opcode());

        debug_assert!(i < op.arity());

        let l = Locus::new(g.args()[i], op.arg_category(i));
        debug_assert!(l.index > ip.index);

        let cached = self.memo.borrow().get(l).clone();
        if let Some(value) = cached {
            return value;
        }

        self.ip.set(l);
        let value = self.ops.get(self.prg.gene(l).opcode()).eval(self);
        self.ip.set(ip);

        *self.memo.borrow_mut().get_mut(l) = Some(value.clone());
        value
    }

    /// The stored parameter of the current parametric terminal.
    pub fn fetch_param(&self) -> i32 {
        let g = self.prg.gene(self.ip.get());

        debug_assert!(g.param().is_some());
        g.param().unwrap_or(0)
    }

    /// Resolves the i-th formal argument of the enclosing ADF call by
    /// delegating to the context interpreter.
    pub fn fetch_adf_arg(&self, i: usize) -> Option<Value> {
        debug_assert!(self.context.is_some(), "argument terminal outside an ADF body");
        self.context.and_then(|ctx| ctx.fetch_arg(i))
    }

    /// The problem input bound to `index`; empty when out of range.
    pub fn input(&self, index: usize) -> Option<Value> {
        self.inputs.get(index).cloned()
    }
}
