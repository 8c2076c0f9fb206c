use crate::eval::Interpreter;
use crate::ops::{Category, Op, Value};

// Integer primitives. Arithmetic saturates instead of wrapping and the
// division ops are total, so an integer program never produces the empty
// value through its own arithmetic.

fn iadd(it: &Interpreter<'_>) -> Option<Value> {
    let a = it.fetch_arg(0)?.as_int()?;
    let b = it.fetch_arg(1)?.as_int()?;
    Some(Value::Int(a.saturating_add(b)))
}

fn isub(it: &Interpreter<'_>) -> Option<Value> {
    let a = it.fetch_arg(0)?.as_int()?;
    let b = it.fetch_arg(1)?.as_int()?;
    Some(Value::Int(a.saturating_sub(b)))
}

fn imul(it: &Interpreter<'_>) -> Option<Value> {
    let a = it.fetch_arg(0)?.as_int()?;
    let b = it.fetch_arg(1)?.as_int()?;
    Some(Value::Int(a.saturating_mul(b)))
}

// Safe division: the dividend is returned unchanged when the divisor is
// zero (or on the single overflowing case).
fn idiv(it: &Interpreter<'_>) -> Option<Value> {
    let a = it.fetch_arg(0)?.as_int()?;
    let b = it.fetch_arg(1)?.as_int()?;

    match a.checked_div(b) {
        Some(q) => Some(Value::Int(q)),
        None => Some(Value::Int(a)),
    }
}

fn imod(it: &Interpreter<'_>) -> Option<Value> {
    let a = it.fetch_arg(0)?.as_int()?;
    let b = it.fetch_arg(1)?.as_int()?;

    match a.checked_rem(b) {
        Some(r) => Some(Value::Int(r)),
        None => Some(Value::Int(a)),
    }
}

fn iife(it: &Interpreter<'_>) -> Option<Value> {
    let a = it.fetch_arg(0)?.as_int()?;
    let b = it.fetch_arg(1)?.as_int()?;

    if a == b {
        it.fetch_arg(2)
    } else {
        it.fetch_arg(3)
    }
}

impl Op {
    pub fn iadd(category: Category) -> Op {
        Op::function("ADD", category, &[category, category], iadd).associative()
    }

    pub fn isub(category: Category) -> Op {
        Op::function("SUB", category, &[category, category], isub)
    }

    pub fn imul(category: Category) -> Op {
        Op::function("MUL", category, &[category, category], imul).associative()
    }

    pub fn idiv(category: Category) -> Op {
        Op::function("DIV", category, &[category, category], idiv)
    }

    pub fn imod(category: Category) -> Op {
        Op::function("MOD", category, &[category, category], imod)
    }

    pub fn iife(category: Category) -> Op {
        Op::function("IFE", category, &[category, category, category, category], iife)
    }

    /// A fixed integer constant.
    pub fn int(value: i64, category: Category) -> Op {
        Op::constant("INT", category, Value::Int(value))
    }

    /// An ephemeral random integer constant drawn from `[min, max)`.
    pub fn int_ephemeral(min: i32, max: i32, category: Category) -> Op {
        Op::parametric("INT", category, min, max, |p| Value::Int(p as i64))
    }

    /// The full integer alphabet over one category.
    pub fn int_set(category: Category, inputs: usize) -> Vec<Op> {
        let mut ops = vec![
            Op::iadd(category),
            Op::isub(category),
            Op::imul(category),
            Op::idiv(category),
            Op::imod(category),
            Op::iife(category),
            Op::int_ephemeral(-128, 128, category),
        ];

        for i in 0..inputs {
            ops.push(Op::input("X", category, i));
        }

        ops
    }
}
