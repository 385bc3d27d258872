//! The interpreter core.
//!
//! [`Interp`] owns the four runtime registries and drives execution:
//!
//!   * one statement at a time: tokenize, classify, parse, evaluate,
//!   * expression trees evaluate bottom-up; every named invocation goes
//!     through the operation registry and comes back as a [`Message`],
//!   * statement sequencing is a small state machine over structural
//!     roles: head statuses open regions, tail statuses record the end
//!     of one and jump back to its head, and a re-run head decides for
//!     itself whether the region goes around again,
//!   * `def` captures its body into a [`Block`] and registers it as a
//!     user operation; each block invocation pushes one scope frame.
//!
//! Output is queued, not printed: `print` and friends append to an
//! internal line buffer the driver drains after each run.

use std::rc::Rc;

use crate::expr::Expr;
use crate::extension::Extension;
use crate::message::{Code, FatalKind, Message};
use crate::registry::{Arity, Callable, Entry, OperationRegistry};
use crate::scope::ScopeChain;
use crate::source::{MemorySource, ScriptSource, SourceError};
use crate::stmt::{parse_signature, Block, Role, Statement};
use crate::token::Patterns;
use crate::tracker::Tracker;
use crate::types::TypeRegistry;
use crate::value::{Payload, Value};

pub struct Interp {
    ops: OperationRegistry,
    types: TypeRegistry,
    scopes: ScopeChain,
    tracker: Tracker,
    patterns: Patterns,
    out: Vec<String>,
    loop_reentry: bool,
}

impl Interp {
    /// A fresh interpreter with the core types and operations installed.
    pub fn new() -> Interp {
        let mut interp = Interp {
            ops: OperationRegistry::new(),
            types: TypeRegistry::with_core(),
            scopes: ScopeChain::new(),
            tracker: Tracker::new(),
            patterns: Patterns::new(),
            out: Vec::new(),
            loop_reentry: false,
        };
        crate::builtins::install(&mut interp);
        interp
    }

    pub fn ops(&self) -> &OperationRegistry {
        &self.ops
    }

    pub fn ops_mut(&mut self) -> &mut OperationRegistry {
        &mut self.ops
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    pub fn scopes(&self) -> &ScopeChain {
        &self.scopes
    }

    pub fn scopes_mut(&mut self) -> &mut ScopeChain {
        &mut self.scopes
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut Tracker {
        &mut self.tracker
    }

    /// Queue one output line for the driver to drain.
    pub fn push_output(&mut self, line: impl Into<String>) {
        self.out.push(line.into());
    }

    pub fn output(&self) -> &[String] {
        &self.out
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.out)
    }

    /// Consume the region re-entry flag. Control heads call this on every
    /// run: a jump back from a tail sets it, and the head that observes it
    /// decides whether its region repeats (loops) or is done (branches).
    pub fn take_loop_reentry(&mut self) -> bool {
        std::mem::replace(&mut self.loop_reentry, false)
    }

    /// Wrap a payload into a value carrying its type's method list.
    pub fn make_value(&self, payload: Payload) -> Value {
        let methods = self.types.methods_of(payload.type_id());
        Value::with_methods(payload, methods)
    }

    /// Run a value through the store policy: adopted objects are shared,
    /// aliases re-alias their target, everything else goes through the
    /// type's copy strategy. An unregistered type stores null and leaves
    /// a warning behind.
    pub fn store_value(&mut self, value: &Value) -> Value {
        let (stored, known) = self.types.copy_for_store(value);
        if !known {
            self.tracker
                .record_warning(format!("no copy strategy for type '{}'", value.type_id()));
        }
        stored
    }

    /// Tokenize and parse one line against this interpreter's patterns.
    pub fn statement(&self, line: &str) -> Result<Statement, Message> {
        Statement::new(line, &self.patterns)
    }

    pub fn install(&mut self, extension: &dyn Extension) {
        extension.install(self);
    }

    /// Strip every plugin-origin operation and type.
    pub fn revoke_plugins(&mut self) {
        self.ops.revoke_plugins();
        self.types.revoke_plugins();
    }

    /// Call a registered operation directly with already-built values.
    pub fn invoke(&mut self, name: &str, args: Vec<Value>) -> Message {
        match self.ops.lookup(name) {
            Some(entry) => {
                let entry = entry.clone();
                self.invoke_entry(entry, args)
            }
            None => Message::fatal(
                FatalKind::IllegalCall,
                format!("unknown operation '{name}'"),
            ),
        }
    }

    // ── Execution surface ─────────────────────────────────────────────────

    /// Run a piece of source text. Multi-line text runs as one block, so
    /// regions and definitions may span lines. The final message is
    /// recorded in the tracker if it carries an event.
    pub fn exec_line(&mut self, text: &str) -> Message {
        match self.exec_source(&mut MemorySource::new(text)) {
            Ok(m) => m,
            Err(err) => Message::fatal(FatalKind::Generic, err.to_string()),
        }
    }

    /// Read every statement from a source, then run them as one block.
    /// Reading and parsing complete before anything executes; a parse
    /// fatal surfaces before the first statement runs.
    pub fn exec_source(
        &mut self,
        source: &mut dyn ScriptSource,
    ) -> Result<Message, SourceError> {
        let mut statements = Vec::new();
        while let Some(line) = source.next_statement()? {
            match self.statement(&line) {
                Ok(stmt) => statements.push(stmt),
                Err(m) => {
                    self.tracker.record_message(&m);
                    return Ok(m);
                }
            }
        }
        let m = self.run_statements(&statements);
        self.tracker.record_message(&m);
        Ok(m)
    }

    /// Run parsed statements as a top-level block. A `return` here ends
    /// the run cleanly with its value.
    pub fn run_statements(&mut self, statements: &[Statement]) -> Message {
        let m = self.run_block(statements);
        match m.code {
            Code::Return => Message::with_value(m.value()),
            _ => m,
        }
    }

    // ── Statement sequencing ──────────────────────────────────────────────

    fn run_block(&mut self, body: &[Statement]) -> Message {
        enum Seek {
            Run,
            /// Head was false: looking for the next arm of this region.
            Arm,
            /// Skipping to this region's closer.
            Tail,
        }

        struct Frame {
            head: usize,
            tail: Option<usize>,
        }

        let mut frames: Vec<Frame> = Vec::new();
        let mut seek = Seek::Run;
        let mut depth = 0usize;
        let mut i = 0usize;

        while i < body.len() {
            let stmt = &body[i];
            if stmt.is_empty() {
                i += 1;
                continue;
            }

            match seek {
                Seek::Arm | Seek::Tail => match stmt.role() {
                    Role::Opener | Role::Definition => {
                        depth += 1;
                        i += 1;
                    }
                    Role::Closer if depth > 0 => {
                        depth -= 1;
                        i += 1;
                    }
                    Role::Closer => {
                        let m = self.eval_statement(stmt);
                        match m.code {
                            Code::Tail => match frames.last_mut() {
                                Some(top) => {
                                    top.tail = Some(i);
                                    i = top.head;
                                    self.loop_reentry = true;
                                    seek = Seek::Run;
                                }
                                None => {
                                    return Message::fatal(
                                        FatalKind::IllegalSymbol,
                                        "'end' without an open region",
                                    )
                                }
                            },
                            Code::Fatal(_) => return m,
                            _ => {
                                return Message::fatal(
                                    FatalKind::BrokenEntry,
                                    format!(
                                        "'{}' did not close its region",
                                        stmt.head_name().unwrap_or("")
                                    ),
                                )
                            }
                        }
                    }
                    Role::Continuation if depth == 0 && matches!(seek, Seek::Arm) => {
                        let m = self.eval_statement(stmt);
                        match m.code {
                            Code::HeadTrue => match frames.last_mut() {
                                Some(top) => {
                                    top.head = i;
                                    seek = Seek::Run;
                                    i += 1;
                                }
                                None => {
                                    return Message::fatal(
                                        FatalKind::IllegalSymbol,
                                        format!(
                                            "misplaced '{}'",
                                            stmt.head_name().unwrap_or("")
                                        ),
                                    )
                                }
                            },
                            Code::HeadFalse => i += 1,
                            Code::Fatal(_) => return m,
                            _ => {
                                return Message::fatal(
                                    FatalKind::BrokenEntry,
                                    format!(
                                        "'{}' did not produce a branch status",
                                        stmt.head_name().unwrap_or("")
                                    ),
                                )
                            }
                        }
                    }
                    _ => i += 1,
                },
                Seek::Run => {
                    // A frame pointing at this statement means a tail just
                    // jumped back here; the head runs again even when its
                    // role is Continuation.
                    let reentered = frames.last().map(|f| f.head == i).unwrap_or(false);

                    match stmt.role() {
                        Role::Definition => match self.capture_definition(body, i) {
                            Ok(next) => i = next,
                            Err(m) => return m,
                        },
                        Role::Continuation if !reentered => {
                            // Fell out of a taken arm: skip to the closer.
                            if frames.is_empty() {
                                return Message::fatal(
                                    FatalKind::IllegalSymbol,
                                    format!("misplaced '{}'", stmt.head_name().unwrap_or("")),
                                );
                            }
                            seek = Seek::Tail;
                            depth = 0;
                            i += 1;
                        }
                        _ => {
                            let m = self.eval_statement(stmt);
                            match m.code {
                                Code::Success | Code::Redirect => i += 1,
                                Code::Warning => {
                                    self.tracker.record_warning(m.detail);
                                    i += 1;
                                }
                                Code::HeadTrue => {
                                    if !reentered {
                                        frames.push(Frame { head: i, tail: None });
                                    }
                                    i += 1;
                                }
                                Code::HeadFalse => {
                                    let closed = match frames.last() {
                                        Some(top) if top.head == i => top.tail,
                                        _ => None,
                                    };
                                    match closed {
                                        Some(t) => {
                                            frames.pop();
                                            i = t + 1;
                                        }
                                        None => {
                                            if !reentered {
                                                frames.push(Frame { head: i, tail: None });
                                            }
                                            seek = if stmt.head_name() == Some("if") {
                                                Seek::Arm
                                            } else {
                                                Seek::Tail
                                            };
                                            depth = 0;
                                            i += 1;
                                        }
                                    }
                                }
                                Code::Tail => match frames.last_mut() {
                                    Some(top) => {
                                        top.tail = Some(i);
                                        i = top.head;
                                        self.loop_reentry = true;
                                    }
                                    None => {
                                        return Message::fatal(
                                            FatalKind::IllegalSymbol,
                                            "'end' without an open region",
                                        )
                                    }
                                },
                                Code::Return | Code::Quit | Code::Fatal(_) => return m,
                            }
                        }
                    }
                }
            }
        }

        if !matches!(seek, Seek::Run) || !frames.is_empty() {
            return Message::fatal(FatalKind::IllegalSymbol, "unterminated region");
        }
        Message::success()
    }

    /// Register the definition opening at `at` and return the index just
    /// past its closer.
    fn capture_definition(&mut self, body: &[Statement], at: usize) -> Result<usize, Message> {
        let (name, params) = parse_signature(body[at].tokens())?;

        let mut depth = 1usize;
        let mut j = at + 1;
        while j < body.len() {
            match body[j].role() {
                Role::Opener | Role::Definition => depth += 1,
                Role::Closer => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            j += 1;
        }
        if j >= body.len() {
            return Err(Message::fatal(
                FatalKind::IllegalSymbol,
                format!("unterminated definition '{name}'"),
            ));
        }

        let block = Block::new(params, body[at + 1..j].to_vec());
        self.ops.register(Entry::block(name, block));
        Ok(j + 1)
    }

    // ── Statement evaluation ──────────────────────────────────────────────

    fn eval_statement(&mut self, stmt: &Statement) -> Message {
        let program = match stmt.program() {
            Some(p) => p,
            None => {
                return Message::fatal(
                    FatalKind::IllegalSymbol,
                    "definition requires a body and 'end'",
                )
            }
        };
        match program {
            Expr::Return(inner) => {
                let value = match inner {
                    Some(expr) => match self.eval_expr(expr) {
                        Ok(v) => v,
                        Err(m) => return m,
                    },
                    None => Value::null(),
                };
                Message::ret(value)
            }
            Expr::Declare(names) => {
                for (name, init) in names {
                    let value = match init {
                        Some(expr) => match self.eval_expr(expr) {
                            Ok(v) => v,
                            Err(m) => return m,
                        },
                        None => Value::null(),
                    };
                    let m = self.call_store_op("bind", name, value);
                    if let Err(m) = self.absorb(m) {
                        return m;
                    }
                }
                Message::success()
            }
            Expr::Assign { target, value } => match self.eval_assign(target, value) {
                Ok(v) => Message::with_value(v),
                Err(m) => m,
            },
            Expr::Call { name, args } => self.eval_call_raw(name, args),
            Expr::Ident(name) => self.resolve_ident_raw(name),
            other => match self.eval_expr(other) {
                Ok(v) => Message::with_value(v),
                Err(m) => m,
            },
        }
    }

    /// A bare name at statement position: a scope binding's value, or a
    /// no-argument invocation whose raw status flows to the sequencer.
    fn resolve_ident_raw(&mut self, name: &str) -> Message {
        if let Some(value) = self.scopes.find(name, false) {
            return Message::with_value(value);
        }
        match self.ops.lookup(name) {
            Some(entry) => {
                let entry = entry.clone();
                self.invoke_entry(entry, Vec::new())
            }
            None => Message::fatal(
                FatalKind::IllegalCall,
                format!("object not found: {name}"),
            ),
        }
    }

    // ── Expression evaluation ─────────────────────────────────────────────

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, Message> {
        match expr {
            Expr::Literal(payload) => Ok(self.make_value(payload.clone())),
            Expr::Ident(name) => {
                if let Some(value) = self.scopes.find(name, false) {
                    return Ok(value);
                }
                match self.ops.lookup(name) {
                    Some(entry) => {
                        let entry = entry.clone();
                        let m = self.invoke_entry(entry, Vec::new());
                        self.absorb(m)
                    }
                    None => Err(Message::fatal(
                        FatalKind::IllegalCall,
                        format!("object not found: {name}"),
                    )),
                }
            }
            Expr::Infix { op, lhs, rhs } => {
                let left = self.eval_expr(lhs)?;
                let right = self.eval_expr(rhs)?;
                let entry = match self.ops.lookup_infix() {
                    Some(e) => e.clone(),
                    None => {
                        return Err(Message::fatal(
                            FatalKind::BrokenEntry,
                            "no infix operation registered",
                        ))
                    }
                };
                let operator = self.make_value(Payload::Str(op.clone()));
                let m = self.invoke_entry(entry, vec![left, right, operator]);
                self.absorb(m)
            }
            Expr::Call { name, args } => {
                let m = self.eval_call_raw(name, args);
                self.absorb(m)
            }
            Expr::Group(items) => {
                let mut last = Value::null();
                for item in items {
                    last = self.eval_expr(item)?;
                }
                Ok(last)
            }
            Expr::Assign { target, value } => self.eval_assign(target, value),
            Expr::Declare(_) => Err(Message::fatal(
                FatalKind::IllegalCall,
                "misplaced declaration",
            )),
            Expr::Return(_) => Err(Message::fatal(FatalKind::IllegalCall, "misplaced return")),
        }
    }

    /// `=` and `var` go through the registry like everything else: `set`
    /// updates an existing binding, `bind` creates one.
    fn eval_assign(&mut self, target: &str, value: &Expr) -> Result<Value, Message> {
        let value = self.eval_expr(value)?;
        let m = self.call_store_op("set", target, value);
        self.absorb(m)
    }

    fn call_store_op(&mut self, op: &str, name: &str, value: Value) -> Message {
        let entry = match self.ops.lookup(op) {
            Some(e) => e.clone(),
            None => {
                return Message::fatal(
                    FatalKind::IllegalCall,
                    format!("unknown operation '{op}'"),
                )
            }
        };
        let name = self.make_value(Payload::Str(name.to_string()));
        self.invoke_entry(entry, vec![name, value])
    }

    fn eval_call_raw(&mut self, name: &str, args: &[Expr]) -> Message {
        if let Some((receiver, method)) = name.rsplit_once('.') {
            return self.eval_method_call(receiver, method, args);
        }
        let entry = match self.ops.lookup(name) {
            Some(e) => e.clone(),
            None => {
                return Message::fatal(
                    FatalKind::IllegalCall,
                    format!("unknown operation '{name}'"),
                )
            }
        };

        let mut values = Vec::with_capacity(args.len());
        for (idx, arg) in args.iter().enumerate() {
            // Binding operations name their target; a bare name in that
            // position must not be read as a value.
            if idx == 0 && matches!(name, "for" | "set" | "bind") {
                if let Expr::Ident(target) = arg {
                    values.push(self.make_value(Payload::Str(target.clone())));
                    continue;
                }
            }
            match self.eval_expr(arg) {
                Ok(v) => values.push(v),
                Err(m) => return m,
            }
        }
        self.invoke_entry(entry, values)
    }

    /// `receiver.method(args)`: the receiver's value leads the operand
    /// list and its type id selects the registry domain.
    fn eval_method_call(&mut self, receiver: &str, method: &str, args: &[Expr]) -> Message {
        let object = match self.scopes.find(receiver, false) {
            Some(v) => v,
            None => {
                return Message::fatal(
                    FatalKind::IllegalCall,
                    format!("object not found: {receiver}"),
                )
            }
        };
        let type_id = object.type_id();
        let entry = match self.ops.lookup_method(method, &type_id) {
            Some(e) => e.clone(),
            None => {
                return Message::fatal(
                    FatalKind::IllegalCall,
                    format!("no method '{method}' for type '{type_id}'"),
                )
            }
        };
        let mut values = vec![object];
        for arg in args {
            match self.eval_expr(arg) {
                Ok(v) => values.push(v),
                Err(m) => return m,
            }
        }
        self.invoke_entry(entry, values)
    }

    /// Interpret a sub-expression's result message. Warnings are absorbed
    /// into the tracker and evaluate as null; redirects evaluate as their
    /// carried object; control statuses have no value to give.
    fn absorb(&mut self, m: Message) -> Result<Value, Message> {
        match m.code {
            Code::Success => Ok(m.value()),
            Code::Redirect => match m.object {
                Some(v) => Ok(v),
                None => Err(Message::fatal(
                    FatalKind::BrokenEntry,
                    "redirect carried no object",
                )),
            },
            Code::Warning => {
                self.tracker.record_warning(m.detail);
                Ok(Value::null())
            }
            Code::HeadTrue | Code::HeadFalse | Code::Tail => Err(Message::fatal(
                FatalKind::IllegalCall,
                "control operation in expression position",
            )),
            Code::Return => Err(Message::fatal(FatalKind::IllegalCall, "misplaced return")),
            Code::Quit | Code::Fatal(_) => Err(m),
        }
    }

    // ── Invocation ────────────────────────────────────────────────────────

    fn invoke_entry(&mut self, entry: Entry, args: Vec<Value>) -> Message {
        match entry.arity() {
            Arity::Undefined => {
                return Message::fatal(
                    FatalKind::BrokenEntry,
                    format!("operation '{}' has no defined arity", entry.name()),
                )
            }
            arity if !arity.accepts(args.len()) => {
                let expected = match arity {
                    Arity::Exact(n) => n,
                    _ => args.len(),
                };
                return match entry.callable() {
                    Callable::Block(_) => Message::fatal(
                        FatalKind::ParameterCountMismatch,
                        format!(
                            "block '{}' expects {} parameters, got {}",
                            entry.name(),
                            expected,
                            args.len()
                        ),
                    ),
                    Callable::Native(_) => Message::fatal(
                        FatalKind::IllegalArguments,
                        format!(
                            "{} expects {} arguments, got {}",
                            entry.name(),
                            expected,
                            args.len()
                        ),
                    ),
                };
            }
            _ => {}
        }

        let operands = entry.bind_args(args);
        match entry.callable() {
            Callable::Native(f) => {
                let f = *f;
                match f(self, operands) {
                    Ok(m) => m,
                    Err(m) => m,
                }
            }
            Callable::Block(block) => {
                let block = Rc::clone(block);
                self.run_user_block(&block, operands)
            }
        }
    }

    fn run_user_block(&mut self, block: &Block, operands: crate::registry::Operands) -> Message {
        self.scopes.push();
        for param in block.params() {
            let value = operands.get(param).cloned().unwrap_or_else(Value::null);
            self.scopes.bind(param.clone(), value);
        }

        // A head re-run that invokes a block must not leak its re-entry
        // into the block's own regions.
        let saved = self.loop_reentry;
        self.loop_reentry = false;
        let m = self.run_block(block.body());
        self.loop_reentry = saved;

        self.scopes.pop();
        match m.code {
            Code::Return => Message::with_value(m.value()),
            _ => m,
        }
    }
}

impl Default for Interp {
    fn default() -> Self {
        Interp::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
