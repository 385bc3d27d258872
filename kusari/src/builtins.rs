//! Core operations, installed into every fresh interpreter.
//!
//! One shared infix entry handles every binary operator symbol, dispatching
//! on the operator text it receives as its trailing operand. `set` and
//! `bind` are the store operations `=` and `var` route through. `ref`,
//! `array` and `at` answer with redirect statuses so the store policy can
//! see the carried object. The control heads consume the region re-entry
//! flag: branches close on a re-run, loops test again.

use crate::interp::Interp;
use crate::message::{FatalKind, Message};
use crate::registry::{Arity, Entry, OpResult, Operands, INFIX_ENTRY};
use crate::value::{Payload, Value};

/// Register the core operation set.
pub fn install(interp: &mut Interp) {
    let ops = interp.ops_mut();

    ops.register(Entry::native(INFIX_ENTRY, Arity::Exact(3), op_infix).as_infix());

    ops.register(Entry::native("set", Arity::Exact(2), op_set));
    ops.register(Entry::native("bind", Arity::Exact(2), op_bind));
    ops.register(Entry::native("ref", Arity::Exact(1), op_ref));
    ops.register(Entry::native("array", Arity::Variadic, op_array));

    ops.register(Entry::native("size", Arity::Exact(1), op_string_size).with_domain("string"));
    ops.register(Entry::native("size", Arity::Exact(1), op_array_size).with_domain("array"));
    ops.register(Entry::native("at", Arity::Exact(2), op_array_at).with_domain("array"));

    ops.register(Entry::native("if", Arity::Exact(1), op_branch));
    ops.register(Entry::native("elif", Arity::Exact(1), op_branch));
    ops.register(Entry::native("else", Arity::Exact(0), op_else));
    ops.register(Entry::native("while", Arity::Exact(1), op_while));
    ops.register(Entry::native("for", Arity::Exact(3), op_for));
    ops.register(Entry::native("end", Arity::Exact(0), op_end));

    ops.register(Entry::native("print", Arity::Exact(1), op_print));
    ops.register(Entry::native("type", Arity::Exact(1), op_type));
    ops.register(Entry::native("nop", Arity::Variadic, op_nop));
    ops.register(Entry::native("version", Arity::Exact(0), op_version));
    ops.register(Entry::native("quit", Arity::Exact(0), op_quit));
}

// ── Infix dispatch ────────────────────────────────────────────────────────────

fn op_infix(interp: &mut Interp, args: Operands) -> OpResult {
    let left = args.value_arg(0, "infix")?;
    let right = args.value_arg(1, "infix")?;
    let op = args.str_arg(2, "infix")?;

    let result = match op.as_str() {
        "==" => Payload::Bool(values_equal(&left, &right)),
        "!=" => Payload::Bool(!values_equal(&left, &right)),
        "<" | "<=" | ">" | ">=" => match compare(&op, &left, &right) {
            Some(truth) => Payload::Bool(truth),
            None => return Err(type_error(&op, &left, &right)),
        },
        "+" | "-" | "*" | "/" => arith(&op, &left, &right)?,
        other => {
            return Err(Message::fatal(
                FatalKind::IllegalArguments,
                format!("unknown operator '{other}'"),
            ))
        }
    };
    Ok(Message::with_value(interp.make_value(result)))
}

/// Scalars compare structurally (numbers cross-promote); arrays and
/// foreign objects compare by cell identity.
fn values_equal(left: &Value, right: &Value) -> bool {
    if left.shares_cell(right) {
        return true;
    }
    match (&*left.payload(), &*right.payload()) {
        (Payload::Null, Payload::Null) => true,
        (Payload::Int(a), Payload::Int(b)) => a == b,
        (Payload::Float(a), Payload::Float(b)) => a == b,
        (Payload::Int(a), Payload::Float(b)) | (Payload::Float(b), Payload::Int(a)) => {
            *a as f64 == *b
        }
        (Payload::Bool(a), Payload::Bool(b)) => a == b,
        (Payload::Str(a), Payload::Str(b)) => a == b,
        _ => false,
    }
}

fn compare(op: &str, left: &Value, right: &Value) -> Option<bool> {
    let ord = match (&*left.payload(), &*right.payload()) {
        (Payload::Int(a), Payload::Int(b)) => a.partial_cmp(b),
        (Payload::Float(a), Payload::Float(b)) => a.partial_cmp(b),
        (Payload::Int(a), Payload::Float(b)) => (*a as f64).partial_cmp(b),
        (Payload::Float(a), Payload::Int(b)) => a.partial_cmp(&(*b as f64)),
        (Payload::Str(a), Payload::Str(b)) => Some(a.cmp(b)),
        _ => None,
    }?;
    match op {
        "<" => Some(ord.is_lt()),
        "<=" => Some(ord.is_le()),
        ">" => Some(ord.is_gt()),
        ">=" => Some(ord.is_ge()),
        _ => None,
    }
}

fn arith(op: &str, left: &Value, right: &Value) -> Result<Payload, Message> {
    enum Nums {
        Ints(i64, i64),
        Floats(f64, f64),
    }

    let nums = match (&*left.payload(), &*right.payload()) {
        (Payload::Int(a), Payload::Int(b)) => Nums::Ints(*a, *b),
        (Payload::Int(a), Payload::Float(b)) => Nums::Floats(*a as f64, *b),
        (Payload::Float(a), Payload::Int(b)) => Nums::Floats(*a, *b as f64),
        (Payload::Float(a), Payload::Float(b)) => Nums::Floats(*a, *b),
        (Payload::Str(a), Payload::Str(b)) if op == "+" => {
            return Ok(Payload::Str(format!("{a}{b}")))
        }
        _ => return Err(type_error(op, left, right)),
    };

    match nums {
        Nums::Ints(a, b) => {
            if op == "/" && b == 0 {
                return Err(Message::fatal(
                    FatalKind::IllegalArguments,
                    "division by zero",
                ));
            }
            let out = match op {
                "+" => a.checked_add(b),
                "-" => a.checked_sub(b),
                "*" => a.checked_mul(b),
                "/" => a.checked_div(b),
                _ => None,
            };
            match out {
                Some(n) => Ok(Payload::Int(n)),
                None => Err(Message::fatal(
                    FatalKind::IllegalArguments,
                    format!("integer overflow in '{op}'"),
                )),
            }
        }
        Nums::Floats(a, b) => {
            if op == "/" && b == 0.0 {
                return Err(Message::fatal(
                    FatalKind::IllegalArguments,
                    "division by zero",
                ));
            }
            let x = match op {
                "+" => a + b,
                "-" => a - b,
                "*" => a * b,
                "/" => a / b,
                _ => {
                    return Err(Message::fatal(
                        FatalKind::IllegalArguments,
                        format!("unknown operator '{op}'"),
                    ))
                }
            };
            Ok(Payload::Float(x))
        }
    }
}

fn type_error(op: &str, left: &Value, right: &Value) -> Message {
    Message::fatal(
        FatalKind::IllegalArguments,
        format!(
            "cannot apply '{op}' to {} and {}",
            left.type_id(),
            right.type_id()
        ),
    )
}

// ── Store operations ──────────────────────────────────────────────────────────

/// Update an existing binding. An alias binding writes through to its
/// target cell; an owning binding is replaced.
fn op_set(interp: &mut Interp, args: Operands) -> OpResult {
    let name = args.str_arg(0, "set")?;
    let source = args.value_arg(1, "set")?;
    let stored = interp.store_value(&source);
    match interp.scopes().find(&name, false) {
        Some(existing) if existing.is_alias() => {
            let payload = stored.payload().clone();
            existing.assign(payload);
            Ok(Message::with_value(existing))
        }
        Some(_) => {
            interp.scopes_mut().rebind(&name, stored.clone());
            Ok(Message::with_value(stored))
        }
        None => Err(Message::fatal(
            FatalKind::IllegalCall,
            format!("object not found: {name}"),
        )),
    }
}

/// Create a binding in the innermost frame.
fn op_bind(interp: &mut Interp, args: Operands) -> OpResult {
    let name = args.str_arg(0, "bind")?;
    let source = args.value_arg(1, "bind")?;
    let stored = interp.store_value(&source);
    interp.scopes_mut().bind(name, stored.clone());
    Ok(Message::with_value(stored))
}

fn op_ref(_: &mut Interp, args: Operands) -> OpResult {
    let target = args.value_arg(0, "ref")?;
    Ok(Message::redirect(Value::alias_of(&target)))
}

/// Build an array whose object is handed over to the next store.
fn op_array(interp: &mut Interp, args: Operands) -> OpResult {
    let mut items = Vec::with_capacity(args.len());
    for (_, value) in args.iter() {
        items.push(interp.store_value(value));
    }
    let methods = interp.types().methods_of("array");
    Ok(Message::redirect(Value::fresh(
        Payload::Array(items),
        methods,
    )))
}

// ── Domain methods ────────────────────────────────────────────────────────────

fn op_string_size(interp: &mut Interp, args: Operands) -> OpResult {
    let receiver = args.value_arg(0, "size")?;
    let size = receiver.as_str().chars().count() as i64;
    Ok(Message::with_value(interp.make_value(Payload::Int(size))))
}

fn op_array_size(interp: &mut Interp, args: Operands) -> OpResult {
    let receiver = args.value_arg(0, "size")?;
    let size = match &*receiver.payload() {
        Payload::Array(items) => items.len() as i64,
        _ => 0,
    };
    Ok(Message::with_value(interp.make_value(Payload::Int(size))))
}

/// Element access answers an alias so stores reach the element cell.
fn op_array_at(_: &mut Interp, args: Operands) -> OpResult {
    let receiver = args.value_arg(0, "at")?;
    let index = args.int_arg(1, "at")?;
    let element = if index < 0 {
        None
    } else {
        receiver.index(index as usize)
    };
    match element {
        Some(el) => Ok(Message::redirect(Value::alias_of(&el))),
        None => Err(Message::fatal(
            FatalKind::IllegalArguments,
            format!("at: index {index} out of range"),
        )),
    }
}

// ── Control heads and tails ───────────────────────────────────────────────────

/// `if` and `elif`: open on a true condition, close the region when the
/// tail sends execution back around.
fn op_branch(interp: &mut Interp, args: Operands) -> OpResult {
    let cond = args.value_arg(0, "if")?;
    if interp.take_loop_reentry() {
        return Ok(Message::head(false));
    }
    Ok(Message::head(cond.as_bool()))
}

fn op_else(interp: &mut Interp, _: Operands) -> OpResult {
    Ok(Message::head(!interp.take_loop_reentry()))
}

/// `while` tests its condition on every arrival, first or repeated.
fn op_while(interp: &mut Interp, args: Operands) -> OpResult {
    let cond = args.value_arg(0, "while")?;
    interp.take_loop_reentry();
    Ok(Message::head(cond.as_bool()))
}

/// `for(name, from, to)`: first arrival binds the counter to `from`,
/// each re-entry steps it by one; the region repeats while the counter
/// stays within `to` inclusive.
fn op_for(interp: &mut Interp, args: Operands) -> OpResult {
    let name = args.str_arg(0, "for")?;
    let reentered = interp.take_loop_reentry();

    let bounds = {
        let from = args.value_arg(1, "for")?;
        let to = args.value_arg(2, "for")?;
        let ints = match (&*from.payload(), &*to.payload()) {
            (Payload::Int(a), Payload::Int(b)) => Some((*a, *b)),
            _ => None,
        };
        ints
    };
    let (from, to) = match bounds {
        Some(pair) => pair,
        None => {
            return Err(Message::fatal(
                FatalKind::IllegalArguments,
                "for: bounds must be integers",
            ))
        }
    };

    if !reentered {
        let counter = interp.make_value(Payload::Int(from));
        interp.scopes_mut().bind(name, counter);
        return Ok(Message::head(from <= to));
    }

    let counter = match interp.scopes().find(&name, false) {
        Some(v) => v,
        None => {
            return Err(Message::fatal(
                FatalKind::IllegalCall,
                format!("object not found: {name}"),
            ))
        }
    };
    let next = counter.as_int() + 1;
    counter.assign(Payload::Int(next));
    Ok(Message::head(next <= to))
}

fn op_end(_: &mut Interp, _: Operands) -> OpResult {
    Ok(Message::tail())
}

// ── Utilities ─────────────────────────────────────────────────────────────────

fn op_print(interp: &mut Interp, args: Operands) -> OpResult {
    let value = args.value_arg(0, "print")?;
    if !value.is_printable() {
        return Ok(Message::warning("You can't print this object."));
    }
    let line = value.to_string();
    interp.push_output(line);
    Ok(Message::success())
}

fn op_type(interp: &mut Interp, args: Operands) -> OpResult {
    let value = args.value_arg(0, "type")?;
    Ok(Message::with_value(
        interp.make_value(Payload::Str(value.type_id())),
    ))
}

/// Evaluates its arguments and yields the last one.
fn op_nop(_: &mut Interp, args: Operands) -> OpResult {
    let last = match args.len() {
        0 => Value::null(),
        n => args.value_arg(n - 1, "nop")?,
    };
    Ok(Message::with_value(last))
}

fn op_version(interp: &mut Interp, _: Operands) -> OpResult {
    Ok(Message::with_value(interp.make_value(Payload::Str(
        env!("CARGO_PKG_VERSION").to_string(),
    ))))
}

fn op_quit(_: &mut Interp, _: Operands) -> OpResult {
    Ok(Message::quit())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
