use crate::eval::Interpreter;
use crate::ops::{Category, Op, Value};

// Real-valued primitives. Every op returns the empty value instead of a
// non-finite number, so NaN and infinities never leak into fitness code.

fn finite(v: f64) -> Option<Value> {
    v.is_finite().then_some(Value::Real(v))
}

fn add(it: &Interpreter<'_>) -> Option<Value> {
    let a = it.fetch_arg(0)?.as_real()?;
    let b = it.fetch_arg(1)?.as_real()?;
    finite(a + b)
}

fn sub(it: &Interpreter<'_>) -> Option<Value> {
    let a = it.fetch_arg(0)?.as_real()?;
    let b = it.fetch_arg(1)?.as_real()?;
    finite(a - b)
}

fn mul(it: &Interpreter<'_>) -> Option<Value> {
    let a = it.fetch_arg(0)?.as_real()?;
    let b = it.fetch_arg(1)?.as_real()?;
    finite(a * b)
}

fn div(it: &Interpreter<'_>) -> Option<Value> {
    let a = it.fetch_arg(0)?.as_real()?;
    let b = it.fetch_arg(1)?.as_real()?;
    finite(a / b)
}

fn abs(it: &Interpreter<'_>) -> Option<Value> {
    let a = it.fetch_arg(0)?.as_real()?;
    finite(a.abs())
}

fn ln(it: &Interpreter<'_>) -> Option<Value> {
    let a = it.fetch_arg(0)?.as_real()?;
    finite(a.ln())
}

fn sin(it: &Interpreter<'_>) -> Option<Value> {
    let a = it.fetch_arg(0)?.as_real()?;
    finite(a.sin())
}

fn max(it: &Interpreter<'_>) -> Option<Value> {
    let a = it.fetch_arg(0)?.as_real()?;
    let b = it.fetch_arg(1)?.as_real()?;
    finite(a.max(b))
}

// If arg0 == arg1 (within epsilon) evaluate arg2, else arg3. Only the taken
// branch is evaluated.
fn ife(it: &Interpreter<'_>) -> Option<Value> {
    let a = it.fetch_arg(0)?.as_real()?;
    let b = it.fetch_arg(1)?.as_real()?;

    if (a - b).abs() <= f64::EPSILON {
        it.fetch_arg(2)
    } else {
        it.fetch_arg(3)
    }
}

impl Op {
    pub fn add(category: Category) -> Op {
        Op::function("ADD", category, &[category, category], add).associative()
    }

    pub fn sub(category: Category) -> Op {
        Op::function("SUB", category, &[category, category], sub)
    }

    pub fn mul(category: Category) -> Op {
        Op::function("MUL", category, &[category, category], mul).associative()
    }

    /// Real division; returns the empty value on division by zero.
    pub fn div(category: Category) -> Op {
        Op::function("DIV", category, &[category, category], div)
    }

    pub fn abs(category: Category) -> Op {
        Op::function("ABS", category, &[category], abs)
    }

    pub fn ln(category: Category) -> Op {
        Op::function("LN", category, &[category], ln)
    }

    pub fn sin(category: Category) -> Op {
        Op::function("SIN", category, &[category], sin)
    }

    pub fn max(category: Category) -> Op {
        Op::function("MAX", category, &[category, category], max).associative()
    }

    pub fn ife(category: Category) -> Op {
        Op::function("IFE", category, &[category, category, category, category], ife)
    }

    /// A problem input variable of real type.
    pub fn var(name: &'static str, category: Category, index: usize) -> Op {
        Op::input(name, category, index)
    }

    /// A fixed real constant.
    pub fn real(value: f64, category: Category) -> Op {
        Op::constant("REAL", category, Value::Real(value))
    }

    /// An ephemeral random real constant: each gene built from this op draws
    /// its own value from `[min, max)`.
    pub fn real_ephemeral(min: i32, max: i32, category: Category) -> Op {
        Op::parametric("REAL", category, min, max, |p| Value::Real(p as f64))
    }

    /// The full real-valued alphabet over one category, handy for tests and
    /// quick starts.
    pub fn real_set(category: Category, inputs: usize) -> Vec<Op> {
        let mut ops = vec![
            Op::add(category),
            Op::sub(category),
            Op::mul(category),
            Op::div(category),
            Op::abs(category),
            Op::ln(category),
            Op::sin(category),
            Op::max(category),
            Op::ife(category),
            Op::real_ephemeral(-100, 100, category),
        ];

        for i in 0..inputs {
            ops.push(Op::input("X", category, i));
        }

        ops
    }
}
