//! Tree-walking interpreter.
//!
//! A compiled program executes against exactly one capability object, the
//! `roughCanvas` binding, plus a `Math` namespace and `console.log`. The
//! interpreter is deliberately strict where the drawing contract is
//! concerned (wrong arity or argument types are runtime faults) and
//! lenient where generators are sloppy (assigning to an undeclared
//! variable creates it).
//!
//! `Math.random` draws from an RNG seeded by the caller. The streaming
//! runner passes the same seed for every replay of an attempt, so a
//! "random" sky full of stars stays put while the program grows.

use crate::ast::{AssignOp, BinaryOp, Expr, PostfixOp, Stmt, UnaryOp};
use crate::error::ScriptError;
use canvas::{Canvas, Color, DrawOptions, Point};
use compact_str::CompactString;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::collections::HashMap;
use std::fmt;

/// Name under which the drawing capability is visible to programs.
pub const CANVAS_BINDING: &str = "roughCanvas";

/// Statement-execution budget per run. Generated loops are small; hitting
/// this means a runaway loop, which must fault rather than stall the
/// fragment loop.
const MAX_STEPS: usize = 100_000;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Num(f64),
    Str(String),
    Bool(bool),
    Null,
    Array(Vec<Value>),
    Object(Vec<(CompactString, Value)>),
    Builtin(Builtin),
    Method(Builtin, CompactString),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Canvas,
    Math,
    Console,
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Builtin(_) | Value::Method(..) => "builtin",
        }
    }

    fn truthy(&self) -> bool {
        match self {
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::Null => false,
            _ => true,
        }
    }

    fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Num(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "null"),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Object(_) => write!(f, "[object Object]"),
            Value::Builtin(_) | Value::Method(..) => write!(f, "[builtin]"),
        }
    }
}

/// Faults inside the interpreter are plain messages; [`Interp::run`]
/// attaches the index of the faulting top-level statement.
type Fault = String;

pub(crate) struct Interp<'a, C: Canvas> {
    canvas: &'a mut C,
    scopes: Vec<HashMap<CompactString, Value>>,
    rng: StdRng,
    steps: usize,
}

impl<'a, C: Canvas> Interp<'a, C> {
    pub(crate) fn new(canvas: &'a mut C, seed: u64) -> Self {
        let mut root = HashMap::new();
        root.insert(
            CompactString::const_new(CANVAS_BINDING),
            Value::Builtin(Builtin::Canvas),
        );
        root.insert(
            CompactString::const_new("Math"),
            Value::Builtin(Builtin::Math),
        );
        root.insert(
            CompactString::const_new("console"),
            Value::Builtin(Builtin::Console),
        );
        Self {
            canvas,
            scopes: vec![root],
            rng: StdRng::seed_from_u64(seed),
            steps: 0,
        }
    }

    pub(crate) fn run(mut self, stmts: &[Stmt]) -> Result<(), ScriptError> {
        for (i, stmt) in stmts.iter().enumerate() {
            self.exec(stmt).map_err(|m| ScriptError::runtime(i, m))?;
        }
        Ok(())
    }

    fn tick(&mut self) -> Result<(), Fault> {
        self.steps += 1;
        if self.steps > MAX_STEPS {
            Err("statement budget exceeded (runaway loop?)".into())
        } else {
            Ok(())
        }
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<(), Fault> {
        self.tick()?;
        match stmt {
            Stmt::Expr(expr) => {
                self.eval(expr)?;
                Ok(())
            }
            Stmt::Decl { name, init } => {
                let value = match init {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Null,
                };
                self.scopes
                    .last_mut()
                    .expect("scope stack is never empty")
                    .insert(name.clone(), value);
                Ok(())
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                let branch = if self.eval(cond)?.truthy() {
                    then
                } else {
                    otherwise
                };
                self.exec_block(branch)
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                self.scopes.push(HashMap::new());
                let result = self.exec_for(init.as_deref(), cond.as_ref(), update.as_ref(), body);
                self.scopes.pop();
                result
            }
            Stmt::Block(stmts) => self.exec_block(stmts),
        }
    }

    fn exec_for(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        update: Option<&Expr>,
        body: &[Stmt],
    ) -> Result<(), Fault> {
        if let Some(init) = init {
            self.exec(init)?;
        }
        loop {
            self.tick()?;
            if let Some(cond) = cond
                && !self.eval(cond)?.truthy()
            {
                return Ok(());
            }
            self.exec_block(body)?;
            if let Some(update) = update {
                self.eval(update)?;
            }
        }
    }

    fn exec_block(&mut self, stmts: &[Stmt]) -> Result<(), Fault> {
        self.scopes.push(HashMap::new());
        let result = stmts.iter().try_for_each(|s| self.exec(s));
        self.scopes.pop();
        result
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|s| s.get(name))
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.scopes.iter_mut().rev().find_map(|s| s.get_mut(name))
    }

    /// Write to the nearest scope holding `name`, or create it at the
    /// root. Generators routinely assign without declaring.
    fn assign_var(&mut self, name: &CompactString, value: Value) {
        if let Some(slot) = self.lookup_mut(name) {
            *slot = value;
        } else {
            self.scopes[0].insert(name.clone(), value);
        }
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, Fault> {
        match expr {
            Expr::Num(n) => Ok(Value::Num(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Ident(name) => self
                .lookup(name)
                .cloned()
                .ok_or_else(|| format!("{name} is not defined")),
            Expr::Array(items) => {
                let values = items
                    .iter()
                    .map(|e| self.eval(e))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(values))
            }
            Expr::Object(pairs) => {
                let mut values = Vec::with_capacity(pairs.len());
                for (key, expr) in pairs {
                    values.push((key.clone(), self.eval(expr)?));
                }
                Ok(Value::Object(values))
            }
            Expr::Unary { op, expr } => {
                let value = self.eval(expr)?;
                match op {
                    UnaryOp::Neg => value
                        .as_num()
                        .map(|n| Value::Num(-n))
                        .ok_or_else(|| format!("cannot negate a {}", value.type_name())),
                    UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
                }
            }
            Expr::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs),
            Expr::Ternary {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond)?.truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Member { object, property } => {
                let object = self.eval(object)?;
                self.member(object, property)
            }
            Expr::Index { object, index } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                self.index(object, index)
            }
            Expr::Call { callee, args } => {
                let callee = self.eval(callee)?;
                let args = args
                    .iter()
                    .map(|a| self.eval(a))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(callee, args)
            }
            Expr::Assign { target, op, value } => {
                let rhs = self.eval(value)?;
                let new = match op {
                    AssignOp::Set => rhs,
                    compound => {
                        let current = self.eval(target)?;
                        let op = match compound {
                            AssignOp::Add => BinaryOp::Add,
                            AssignOp::Sub => BinaryOp::Sub,
                            AssignOp::Mul => BinaryOp::Mul,
                            AssignOp::Div => BinaryOp::Div,
                            AssignOp::Set => unreachable!(),
                        };
                        apply_binary(op, &current, &rhs)?
                    }
                };
                self.write(target, new.clone())?;
                Ok(new)
            }
            Expr::Postfix { op, target } => {
                let old = self
                    .eval(target)?
                    .as_num()
                    .ok_or_else(|| Fault::from("increment target must be a number"))?;
                let new = match op {
                    PostfixOp::Inc => old + 1.0,
                    PostfixOp::Dec => old - 1.0,
                };
                self.write(target, Value::Num(new))?;
                Ok(Value::Num(old))
            }
        }
    }

    fn write(&mut self, target: &Expr, value: Value) -> Result<(), Fault> {
        match target {
            Expr::Ident(name) => {
                self.assign_var(name, value);
                Ok(())
            }
            Expr::Index { object, index } => {
                let Expr::Ident(name) = object.as_ref() else {
                    return Err("unsupported assignment target".into());
                };
                let idx = self
                    .eval(index)?
                    .as_num()
                    .filter(|n| *n >= 0.0 && n.fract() == 0.0)
                    .ok_or("array index must be a non-negative integer")?
                    as usize;
                let Some(Value::Array(items)) = self.lookup_mut(name) else {
                    return Err(format!("{name} is not an array"));
                };
                if idx >= items.len() {
                    items.resize(idx + 1, Value::Null);
                }
                items[idx] = value;
                Ok(())
            }
            _ => Err("unsupported assignment target".into()),
        }
    }

    fn binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<Value, Fault> {
        // && and || short-circuit and yield an operand, as in the source
        // dialect.
        match op {
            BinaryOp::And => {
                let lhs = self.eval(lhs)?;
                if lhs.truthy() { self.eval(rhs) } else { Ok(lhs) }
            }
            BinaryOp::Or => {
                let lhs = self.eval(lhs)?;
                if lhs.truthy() { Ok(lhs) } else { self.eval(rhs) }
            }
            _ => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                apply_binary(op, &lhs, &rhs)
            }
        }
    }

    fn member(&mut self, object: Value, property: &CompactString) -> Result<Value, Fault> {
        match object {
            Value::Builtin(Builtin::Math) => match property.as_str() {
                "PI" => Ok(Value::Num(std::f64::consts::PI)),
                "E" => Ok(Value::Num(std::f64::consts::E)),
                _ => Ok(Value::Method(Builtin::Math, property.clone())),
            },
            Value::Builtin(kind) => Ok(Value::Method(kind, property.clone())),
            Value::Array(items) => match property.as_str() {
                "length" => Ok(Value::Num(items.len() as f64)),
                _ => Ok(Value::Null),
            },
            Value::Str(s) => match property.as_str() {
                "length" => Ok(Value::Num(s.chars().count() as f64)),
                _ => Ok(Value::Null),
            },
            Value::Object(pairs) => Ok(pairs
                .iter()
                .find(|(k, _)| k == property)
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Null)),
            other => Err(format!(
                "cannot read property '{property}' of {}",
                other.type_name()
            )),
        }
    }

    fn index(&mut self, object: Value, index: Value) -> Result<Value, Fault> {
        match (object, index) {
            (Value::Array(items), Value::Num(n)) => {
                if n >= 0.0 && n.fract() == 0.0 {
                    Ok(items.get(n as usize).cloned().unwrap_or(Value::Null))
                } else {
                    Ok(Value::Null)
                }
            }
            (Value::Object(pairs), Value::Str(key)) => Ok(pairs
                .iter()
                .find(|(k, _)| k.as_str() == key)
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Null)),
            (Value::Str(s), Value::Num(n)) => {
                if n >= 0.0 && n.fract() == 0.0 {
                    Ok(s.chars()
                        .nth(n as usize)
                        .map(|c| Value::Str(c.to_string()))
                        .unwrap_or(Value::Null))
                } else {
                    Ok(Value::Null)
                }
            }
            (object, index) => Err(format!(
                "cannot index {} with {}",
                object.type_name(),
                index.type_name()
            )),
        }
    }

    fn call(&mut self, callee: Value, args: Vec<Value>) -> Result<Value, Fault> {
        match callee {
            Value::Method(Builtin::Canvas, name) => self.call_canvas(&name, &args),
            Value::Method(Builtin::Math, name) => self.call_math(&name, &args),
            Value::Method(Builtin::Console, name) => match name.as_str() {
                "log" | "warn" | "error" | "debug" | "info" => {
                    let line = args
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(" ");
                    tracing::debug!(target: "doodle_script::console", "{line}");
                    Ok(Value::Null)
                }
                other => Err(format!("console.{other} is not a function")),
            },
            other => Err(format!("{} is not a function", other.type_name())),
        }
    }

    fn call_math(&mut self, name: &str, args: &[Value]) -> Result<Value, Fault> {
        let unary = |args: &[Value], f: fn(f64) -> f64| -> Result<Value, Fault> {
            let n = math_num(args, 0, name)?;
            Ok(Value::Num(f(n)))
        };
        match name {
            "random" => Ok(Value::Num(self.rng.random::<f64>())),
            "abs" => unary(args, f64::abs),
            "floor" => unary(args, f64::floor),
            "ceil" => unary(args, f64::ceil),
            "round" => unary(args, f64::round),
            "sqrt" => unary(args, f64::sqrt),
            "sin" => unary(args, f64::sin),
            "cos" => unary(args, f64::cos),
            "tan" => unary(args, f64::tan),
            "pow" => {
                let base = math_num(args, 0, name)?;
                let exp = math_num(args, 1, name)?;
                Ok(Value::Num(base.powf(exp)))
            }
            "atan2" => {
                let y = math_num(args, 0, name)?;
                let x = math_num(args, 1, name)?;
                Ok(Value::Num(y.atan2(x)))
            }
            "min" | "max" => {
                if args.is_empty() {
                    return Err(format!("Math.{name} expects at least one argument"));
                }
                let mut acc = math_num(args, 0, name)?;
                for i in 1..args.len() {
                    let n = math_num(args, i, name)?;
                    acc = if name == "min" {
                        acc.min(n)
                    } else {
                        acc.max(n)
                    };
                }
                Ok(Value::Num(acc))
            }
            other => Err(format!("Math.{other} is not a function")),
        }
    }

    fn call_canvas(&mut self, name: &str, args: &[Value]) -> Result<Value, Fault> {
        match name {
            "line" => {
                let (x1, y1) = (canvas_num(args, 0, name)?, canvas_num(args, 1, name)?);
                let (x2, y2) = (canvas_num(args, 2, name)?, canvas_num(args, 3, name)?);
                let opts = draw_options(args.get(4))?;
                self.canvas
                    .line(x1, y1, x2, y2, &opts)
                    .map_err(|e| e.to_string())?;
            }
            "rectangle" => {
                let (x, y) = (canvas_num(args, 0, name)?, canvas_num(args, 1, name)?);
                let (w, h) = (canvas_num(args, 2, name)?, canvas_num(args, 3, name)?);
                let opts = draw_options(args.get(4))?;
                self.canvas
                    .rectangle(x, y, w, h, &opts)
                    .map_err(|e| e.to_string())?;
            }
            "circle" => {
                let (cx, cy) = (canvas_num(args, 0, name)?, canvas_num(args, 1, name)?);
                let d = canvas_num(args, 2, name)?;
                let opts = draw_options(args.get(3))?;
                self.canvas
                    .circle(cx, cy, d, &opts)
                    .map_err(|e| e.to_string())?;
            }
            "ellipse" => {
                let (cx, cy) = (canvas_num(args, 0, name)?, canvas_num(args, 1, name)?);
                let (w, h) = (canvas_num(args, 2, name)?, canvas_num(args, 3, name)?);
                let opts = draw_options(args.get(4))?;
                self.canvas
                    .ellipse(cx, cy, w, h, &opts)
                    .map_err(|e| e.to_string())?;
            }
            "linearPath" | "curve" | "polygon" => {
                let points = points_arg(args, name)?;
                let opts = draw_options(args.get(1))?;
                let result = match name {
                    "linearPath" => self.canvas.linear_path(&points, &opts),
                    "curve" => self.canvas.curve(&points, &opts),
                    _ => self.canvas.polygon(&points, &opts),
                };
                result.map_err(|e| e.to_string())?;
            }
            "path" => {
                let Some(Value::Str(data)) = args.first() else {
                    return Err("path expects an SVG path string".into());
                };
                let opts = draw_options(args.get(1))?;
                self.canvas.path(data, &opts).map_err(|e| e.to_string())?;
            }
            other => return Err(format!("{CANVAS_BINDING}.{other} is not a function")),
        }
        Ok(Value::Null)
    }
}

fn math_num(args: &[Value], i: usize, name: &str) -> Result<f64, Fault> {
    args.get(i)
        .and_then(Value::as_num)
        .ok_or_else(|| format!("Math.{name} expects numeric arguments"))
}

fn canvas_num(args: &[Value], i: usize, method: &str) -> Result<f64, Fault> {
    args.get(i)
        .and_then(Value::as_num)
        .ok_or_else(|| format!("{method} expects a number at argument {i}"))
}

fn points_arg(args: &[Value], method: &str) -> Result<Vec<Point>, Fault> {
    let Some(Value::Array(items)) = args.first() else {
        return Err(format!("{method} expects an array of [x, y] points"));
    };
    items
        .iter()
        .map(|item| {
            let Value::Array(pair) = item else {
                return Err(format!("{method} expects [x, y] pairs"));
            };
            let x = pair
                .first()
                .and_then(Value::as_num)
                .ok_or_else(|| format!("{method} expects numeric coordinates"))?;
            let y = pair
                .get(1)
                .and_then(Value::as_num)
                .ok_or_else(|| format!("{method} expects numeric coordinates"))?;
            Ok((x, y))
        })
        .collect()
}

/// Build [`DrawOptions`] from an options object, ignoring unrecognized
/// keys and unparsable values.
fn draw_options(value: Option<&Value>) -> Result<DrawOptions, Fault> {
    let mut opts = DrawOptions::default();
    let Some(value) = value else {
        return Ok(opts);
    };
    let Value::Object(pairs) = value else {
        return Err("options must be an object".into());
    };
    for (key, value) in pairs {
        match key.as_str() {
            "stroke" => {
                if let Value::Str(s) = value {
                    opts.stroke = Color::parse(s);
                }
            }
            "fill" => {
                if let Value::Str(s) = value {
                    opts.fill = Color::parse(s);
                }
            }
            "roughness" => opts.roughness = value.as_num(),
            "strokeWidth" => opts.stroke_width = value.as_num(),
            other => {
                tracing::trace!(key = other, "ignoring unrecognized draw option");
            }
        }
    }
    Ok(opts)
}

fn apply_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, Fault> {
    let nums = || -> Result<(f64, f64), Fault> {
        match (lhs.as_num(), rhs.as_num()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(format!(
                "cannot apply {op:?} to {} and {}",
                lhs.type_name(),
                rhs.type_name()
            )),
        }
    };
    match op {
        BinaryOp::Add => match (lhs, rhs) {
            (Value::Num(a), Value::Num(b)) => Ok(Value::Num(a + b)),
            (Value::Str(_), _) | (_, Value::Str(_)) => Ok(Value::Str(format!("{lhs}{rhs}"))),
            _ => Err(format!(
                "cannot add {} and {}",
                lhs.type_name(),
                rhs.type_name()
            )),
        },
        BinaryOp::Sub => nums().map(|(a, b)| Value::Num(a - b)),
        BinaryOp::Mul => nums().map(|(a, b)| Value::Num(a * b)),
        BinaryOp::Div => nums().map(|(a, b)| Value::Num(a / b)),
        BinaryOp::Rem => nums().map(|(a, b)| Value::Num(a % b)),
        BinaryOp::Eq => Ok(Value::Bool(lhs == rhs)),
        BinaryOp::Ne => Ok(Value::Bool(lhs != rhs)),
        BinaryOp::Lt => compare(lhs, rhs, |o| o == std::cmp::Ordering::Less),
        BinaryOp::Gt => compare(lhs, rhs, |o| o == std::cmp::Ordering::Greater),
        BinaryOp::Le => compare(lhs, rhs, |o| o != std::cmp::Ordering::Greater),
        BinaryOp::Ge => compare(lhs, rhs, |o| o != std::cmp::Ordering::Less),
        BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit ops are handled earlier"),
    }
}

fn compare(
    lhs: &Value,
    rhs: &Value,
    pick: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<Value, Fault> {
    let ordering = match (lhs, rhs) {
        (Value::Num(a), Value::Num(b)) => a.partial_cmp(b),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => None,
    };
    match ordering {
        Some(o) => Ok(Value::Bool(pick(o))),
        // NaN comparisons and mixed types are false, not faults.
        None => Ok(Value::Bool(false)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Program;
    use canvas::{Op, Recorder};

    fn run(src: &str) -> Recorder {
        let recorder = Recorder::new();
        let mut handle = recorder.clone();
        Program::compile(src)
            .unwrap()
            .run(&mut handle, 0)
            .unwrap();
        recorder
    }

    #[test]
    fn dispatches_every_canvas_method() {
        let recorder = run(
            "roughCanvas.line(0, 0, 10, 10);\n\
             roughCanvas.rectangle(1, 2, 3, 4);\n\
             roughCanvas.circle(5, 5, 6);\n\
             roughCanvas.ellipse(5, 5, 6, 7);\n\
             roughCanvas.linearPath([[0,0],[1,1]]);\n\
             roughCanvas.curve([[0,0],[1,1],[2,0]]);\n\
             roughCanvas.polygon([[0,0],[4,0],[2,3]]);\n\
             roughCanvas.path('M 0 0 L 10 10');",
        );
        let draws = recorder.draws();
        assert_eq!(draws.len(), 8);
        assert_eq!(draws[0], Op::Line(0.0, 0.0, 10.0, 10.0, Default::default()));
        assert!(matches!(&draws[7], Op::Path(d, _) if d == "M 0 0 L 10 10"));
    }

    #[test]
    fn options_are_mapped_and_unknown_keys_ignored() {
        let recorder = run(
            "roughCanvas.circle(256, 256, 200, { stroke: 'red', fill: 'rgba(255,0,0,0.2)', fillStyle: 'hachure', roughness: 2 });",
        );
        let Op::Circle(.., opts) = &recorder.draws()[0] else {
            panic!("expected circle");
        };
        assert_eq!(opts.stroke, Some(Color::rgb(255, 0, 0)));
        assert_eq!(
            opts.fill,
            Some(Color {
                r: 255,
                g: 0,
                b: 0,
                a: 51
            })
        );
        assert_eq!(opts.roughness, Some(2.0));
        assert_eq!(opts.stroke_width, None);
    }

    #[test]
    fn variables_loops_and_arithmetic() {
        let recorder = run(
            "const n = 3;\n\
             let x = 10;\n\
             for (let i = 0; i < n; i++) {\n\
                 roughCanvas.circle(x + i * 20, 50, 8);\n\
             }",
        );
        let centers: Vec<f64> = recorder
            .draws()
            .iter()
            .map(|op| match op {
                Op::Circle(cx, ..) => *cx,
                other => panic!("unexpected op {other:?}"),
            })
            .collect();
        assert_eq!(centers, vec![10.0, 30.0, 50.0]);
    }

    #[test]
    fn conditionals_and_ternary() {
        let recorder = run(
            "const big = 400 > 512;\n\
             if (big) { roughCanvas.circle(1, 1, 1); } else { roughCanvas.circle(2, 2, 2); }\n\
             roughCanvas.circle(big ? 3 : 4, 0, 1);",
        );
        let draws = recorder.draws();
        assert!(matches!(draws[0], Op::Circle(2.0, ..)));
        assert!(matches!(draws[1], Op::Circle(4.0, ..)));
    }

    #[test]
    fn math_namespace() {
        let recorder = run(
            "roughCanvas.line(Math.floor(1.7), Math.max(2, 5), Math.abs(-3), Math.round(Math.PI));",
        );
        assert_eq!(
            recorder.draws()[0],
            Op::Line(1.0, 5.0, 3.0, 3.0, Default::default())
        );
    }

    #[test]
    fn random_is_seed_stable() {
        let a = run("roughCanvas.circle(Math.random() * 512, Math.random() * 512, 10);");
        let b = run("roughCanvas.circle(Math.random() * 512, Math.random() * 512, 10);");
        assert_eq!(a.draws(), b.draws());
    }

    #[test]
    fn undefined_variable_is_a_runtime_fault() {
        let program = Program::compile("roughCan").unwrap();
        let mut recorder = Recorder::new();
        let err = program.run(&mut recorder, 0).unwrap_err();
        assert!(err.is_runtime());
        assert!(err.to_string().contains("roughCan is not defined"));
    }

    #[test]
    fn fault_stops_at_the_faulting_statement() {
        let program = Program::compile(
            "roughCanvas.circle(1, 1, 1);\n\
             roughCanvas.bogus(2);\n\
             roughCanvas.circle(3, 3, 3);",
        )
        .unwrap();
        let recorder = Recorder::new();
        let mut handle = recorder.clone();
        let err = program.run(&mut handle, 0).unwrap_err();
        assert_eq!(
            err,
            crate::ScriptError::runtime(1, "roughCanvas.bogus is not a function")
        );
        // Only the statement before the fault drew.
        assert_eq!(recorder.draws().len(), 1);
    }

    #[test]
    fn wrong_argument_types_fault() {
        let program = Program::compile("roughCanvas.line('a', 0, 1, 1);").unwrap();
        let mut recorder = Recorder::new();
        assert!(program.run(&mut recorder, 0).unwrap_err().is_runtime());
    }

    #[test]
    fn runaway_loops_hit_the_budget() {
        let program = Program::compile("for (;;) { const x = 1; }").unwrap();
        let mut recorder = Recorder::new();
        let err = program.run(&mut recorder, 0).unwrap_err();
        assert!(err.to_string().contains("budget"));
    }

    #[test]
    fn arrays_strings_and_indexing() {
        let recorder = run(
            "const pts = [[0, 0], [10, 10]];\n\
             pts[1] = [20, 20];\n\
             roughCanvas.line(pts[0][0], pts[0][1], pts[1][0], pts[1][1]);\n\
             roughCanvas.circle(pts.length, 'ab'.length, 1);",
        );
        let draws = recorder.draws();
        assert_eq!(draws[0], Op::Line(0.0, 0.0, 20.0, 20.0, Default::default()));
        assert!(matches!(draws[1], Op::Circle(2.0, 2.0, ..)));
    }

    #[test]
    fn console_log_is_not_a_fault() {
        let recorder = run("console.log('drawing', 3, 'shapes');");
        assert!(recorder.draws().is_empty());
    }

    #[test]
    fn string_concatenation() {
        let recorder = run("const c = 'sky' + 'blue'; roughCanvas.circle(1, 1, 1, { stroke: c });");
        let Op::Circle(.., opts) = &recorder.draws()[0] else {
            panic!("expected circle");
        };
        assert_eq!(opts.stroke, Color::parse("skyblue"));
    }
}
