use std::fmt::{self, Debug, Display, Formatter};

use smallvec::SmallVec;

use crate::eval::Interpreter;
use crate::genome::Mep;
use crate::ops::Value;

/// Type tag on values and on op arguments; used to enforce well-typed
/// composition. Plain symbolic regression problems use a single category.
pub type Category = usize;

/// Numeric code identifying an [Op] inside its [OpSet](crate::ops::OpSet).
/// Opcodes are assigned monotonically at insertion and act as the primary
/// key in genomes and serialized data.
pub type Opcode = u16;

/// Maximum number of arguments for a function op. This also bounds the
/// reserved pool of argument terminals used by auto-defined functions.
pub const K_ARGS: usize = 4;

/// Default sampling weight for a newly built op.
pub const DEFAULT_WEIGHT: u32 = 100;

pub type EvalFn = fn(&Interpreter<'_>) -> Option<Value>;
pub type ParamFn = fn(i32) -> Value;

/// The different kinds of primitives a genome can be built from.
///
/// Functions pull their inputs lazily through the interpreter, so an op
/// implementation decides which arguments it actually evaluates. Terminals
/// come in several flavours: problem inputs, plain constants, parametric
/// terminals carrying a per-gene random value, and the reserved argument
/// placeholders used for ADF parameter passing. Auto-defined ops embed a
/// full genome as their body.
#[derive(Clone, Debug)]
pub enum OpKind {
    Function {
        arg_categories: SmallVec<[Category; K_ARGS]>,
        associative: bool,
        eval: EvalFn,
    },
    Input(usize),
    Constant(Value),
    Parametric {
        min: i32,
        max: i32,
        eval: ParamFn,
    },
    Argument(usize),
    Adf {
        id: usize,
        body: Box<Mep>,
        arg_categories: SmallVec<[Category; K_ARGS]>,
    },
    Adt {
        id: usize,
        body: Box<Mep>,
    },
}

#[derive(Clone, Debug)]
pub struct Op {
    name: &'static str,
    category: Category,
    weight: u32,
    kind: OpKind,
}

impl Op {
    pub fn function(
        name: &'static str,
        category: Category,
        arg_categories: &[Category],
        eval: EvalFn,
    ) -> Op {
        assert!(!arg_categories.is_empty() && arg_categories.len() <= K_ARGS);

        Op {
            name,
            category,
            weight: DEFAULT_WEIGHT,
            kind: OpKind::Function {
                arg_categories: SmallVec::from_slice(arg_categories),
                associative: false,
                eval,
            },
        }
    }

    pub fn input(name: &'static str, category: Category, index: usize) -> Op {
        Op {
            name,
            category,
            weight: DEFAULT_WEIGHT,
            kind: OpKind::Input(index),
        }
    }

    pub fn constant(name: &'static str, category: Category, value: Value) -> Op {
        Op {
            name,
            category,
            weight: DEFAULT_WEIGHT,
            kind: OpKind::Constant(value),
        }
    }

    /// A terminal whose gene carries a random initialization value drawn
    /// from `[min, max)`; `eval` maps the stored parameter to a [Value].
    pub fn parametric(
        name: &'static str,
        category: Category,
        min: i32,
        max: i32,
        eval: ParamFn,
    ) -> Op {
        assert!(min < max);

        Op {
            name,
            category,
            weight: DEFAULT_WEIGHT,
            kind: OpKind::Parametric { min, max, eval },
        }
    }

    pub(crate) fn argument(index: usize) -> Op {
        Op {
            name: "ARG",
            category: 0,
            weight: DEFAULT_WEIGHT,
            kind: OpKind::Argument(index),
        }
    }

    pub(crate) fn adf(id: usize, body: Mep, arg_categories: SmallVec<[Category; K_ARGS]>) -> Op {
        let category = body.category();
        Op {
            name: "ADF",
            category,
            weight: DEFAULT_WEIGHT,
            kind: OpKind::Adf {
                id,
                body: Box::new(body),
                arg_categories,
            },
        }
    }

    pub(crate) fn adt(id: usize, body: Mep) -> Op {
        let category = body.category();
        Op {
            name: "ADT",
            category,
            weight: DEFAULT_WEIGHT,
            kind: OpKind::Adt {
                id,
                body: Box::new(body),
            },
        }
    }

    /// Marks a function op as associative (used by pretty printers to
    /// flatten chains). No effect on other kinds.
    pub fn associative(mut self) -> Op {
        if let OpKind::Function { associative, .. } = &mut self.kind {
            *associative = true;
        }
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Op {
        assert!(weight > 0);
        self.weight = weight;
        self
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Human-readable identifier; auto-defined ops append their id.
    pub fn display(&self) -> String {
        match &self.kind {
            OpKind::Adf { id, .. } | OpKind::Adt { id, .. } => format!("{}{}", self.name, id),
            _ => self.name.to_string(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub(crate) fn set_weight(&mut self, weight: u32) {
        self.weight = weight;
    }

    pub fn kind(&self) -> &OpKind {
        &self.kind
    }

    pub fn arity(&self) -> usize {
        match &self.kind {
            OpKind::Function { arg_categories, .. } | OpKind::Adf { arg_categories, .. } => {
                arg_categories.len()
            }
            _ => 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.arity() == 0
    }

    pub fn is_function(&self) -> bool {
        self.arity() > 0
    }

    pub fn is_parametric(&self) -> bool {
        matches!(self.kind, OpKind::Parametric { .. })
    }

    pub fn is_auto_defined(&self) -> bool {
        matches!(self.kind, OpKind::Adf { .. } | OpKind::Adt { .. })
    }

    pub fn is_associative(&self) -> bool {
        matches!(
            self.kind,
            OpKind::Function {
                associative: true,
                ..
            }
        )
    }

    /// The category required of the i-th argument.
    pub fn arg_category(&self, i: usize) -> Category {
        match &self.kind {
            OpKind::Function { arg_categories, .. } | OpKind::Adf { arg_categories, .. } => {
                arg_categories[i]
            }
            _ => panic!("arg_category on a terminal op"),
        }
    }

    /// The parameter range of a parametric terminal.
    pub fn param_range(&self) -> Option<(i32, i32)> {
        match self.kind {
            OpKind::Parametric { min, max, .. } => Some((min, max)),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&Mep> {
        match &self.kind {
            OpKind::Adf { body, .. } | OpKind::Adt { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Evaluates this op in the given interpreter context. `None` is the
    /// empty value and propagates to the caller.
    pub fn eval(&self, interpreter: &Interpreter<'_>) -> Option<Value> {
        match &self.kind {
            OpKind::Function { eval, .. } => eval(interpreter),
            OpKind::Input(index) => interpreter.input(*index),
            OpKind::Constant(value) => Some(value.clone()),
            OpKind::Parametric { eval, .. } => Some(eval(interpreter.fetch_param())),
            OpKind::Argument(index) => interpreter.fetch_adf_arg(*index),
            OpKind::Adf { body, .. } => interpreter.nested(body).run(),
            OpKind::Adt { body, .. } => interpreter.detached(body).run(),
        }
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}
