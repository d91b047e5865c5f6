use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::io::{self, BufRead, Write};
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use thenga_core::Literal;

use crate::callable::Callable;
use crate::error::Error;
use crate::stack::ensure_sufficient_stack;

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Num(f64),
    Str(Rc<str>),

    // Sequences and records are shared between every binding that holds them,
    // `copy_adi` is the only way to get an independent graph.
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<Record>>),

    Callable(Rc<dyn Callable>),
    Pending(Rc<Pending>),
}

/// Keyed record that keeps its keys in insertion order for display.
#[derive(Debug, Clone, Default)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Record::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        match self.entries.iter_mut().find(|(name, _)| name == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((String::from(key), value)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

/// Placeholder for work the host has to carry out, produced by `scene_idd` and by
/// `chodhik` when no input provider is configured.
#[derive(Debug, Clone, PartialEq)]
pub enum Pending {
    Sleep(f64),
    Input { prompt: String },
}

impl Pending {
    /// Blocks the calling thread until the deferred work is done.
    pub fn resolve(&self) -> Result<Value, Error> {
        match self {
            Pending::Sleep(ms) => {
                // `as` saturates, so a huge or fractional duration cannot panic here
                thread::sleep(Duration::from_millis(*ms as u64));
                Ok(Value::Null)
            }
            Pending::Input { prompt } => {
                let mut stdout = io::stdout();
                write!(stdout, "{}", prompt)?;
                stdout.flush()?;

                let mut line = String::new();
                io::stdin().lock().read_line(&mut line)?;
                Ok(Value::from(line.trim_end_matches(|c: char| c == '\n' || c == '\r')))
            }
        }
    }
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(record: Record) -> Self {
        Value::Object(Rc::new(RefCell::new(record)))
    }

    pub(crate) fn pending(pending: Pending) -> Self {
        Value::Pending(Rc::new(pending))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(val) => *val,
            Value::Num(val) => *val != 0.0 && !val.is_nan(),
            Value::Str(val) => !val.is_empty(),
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Callable(_) => "function",
            Value::Null | Value::Array(_) | Value::Object(_) | Value::Pending(_) => "object",
        }
    }

    // Values compared by identity rather than by content
    fn is_reference(&self) -> bool {
        matches!(
            self,
            Value::Array(_) | Value::Object(_) | Value::Callable(_) | Value::Pending(_)
        )
    }

    // Anything that turns `+` into concatenation
    fn is_textual(&self) -> bool {
        matches!(self, Value::Str(_)) || self.is_reference()
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(val) => {
                if *val {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Num(val) => *val,
            Value::Str(val) => parse_number(val),
            _ => f64::NAN,
        }
    }

    /// Copies sequences and records all the way down. A container that contains itself is
    /// copied into a container that contains the copy, shared but acyclic parts are copied
    /// once per occurrence.
    pub fn deep_copy(&self) -> Value {
        self.copy_within(&mut Vec::new())
    }

    // `parents` pairs every container being copied with its unfinished copy
    fn copy_within(&self, parents: &mut Vec<(*const (), Value)>) -> Value {
        match self {
            Value::Array(items) => {
                let ptr = Rc::as_ptr(items) as *const ();
                if let Some((_, copy)) = parents.iter().find(|(parent, _)| *parent == ptr) {
                    return copy.clone();
                }

                let copy = Rc::new(RefCell::new(Vec::new()));
                parents.push((ptr, Value::Array(Rc::clone(&copy))));
                let copied = ensure_sufficient_stack(|| {
                    let items = items.borrow();
                    let copied: Vec<Value> =
                        items.iter().map(|item| item.copy_within(parents)).collect();
                    copied
                });
                parents.pop();

                *copy.borrow_mut() = copied;
                Value::Array(copy)
            }
            Value::Object(record) => {
                let ptr = Rc::as_ptr(record) as *const ();
                if let Some((_, copy)) = parents.iter().find(|(parent, _)| *parent == ptr) {
                    return copy.clone();
                }

                let copy = Rc::new(RefCell::new(Record::new()));
                parents.push((ptr, Value::Object(Rc::clone(&copy))));
                let copied = ensure_sufficient_stack(|| {
                    let mut copied = Record::new();
                    for (key, value) in record.borrow().iter() {
                        copied.set(key, value.copy_within(parents));
                    }
                    copied
                });
                parents.pop();

                *copy.borrow_mut() = copied;
                Value::Object(copy)
            }
            other => other.clone(),
        }
    }

    // Canonical rendering. `parents` holds the containers being rendered, a container nested
    // in itself shows up as `[...]` or `{...}`.
    fn render(&self, f: &mut Formatter<'_>, parents: &mut Vec<*const ()>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "onnum_illa"),
            Value::Bool(true) => write!(f, "sheriya"),
            Value::Bool(false) => write!(f, "sheriyalla"),
            Value::Num(val) => write!(f, "{}", format_number(*val)),
            Value::Str(val) => write!(f, "{}", val),
            Value::Array(items) => {
                let ptr = Rc::as_ptr(items) as *const ();
                if parents.contains(&ptr) {
                    return write!(f, "[...]");
                }

                parents.push(ptr);
                let res = ensure_sufficient_stack(|| {
                    write!(f, "[")?;
                    for (idx, item) in items.borrow().iter().enumerate() {
                        if idx > 0 {
                            write!(f, ", ")?;
                        }
                        item.render(f, parents)?;
                    }
                    write!(f, "]")
                });
                parents.pop();
                res
            }
            Value::Object(record) => {
                let ptr = Rc::as_ptr(record) as *const ();
                if parents.contains(&ptr) {
                    return write!(f, "{{...}}");
                }

                parents.push(ptr);
                let res = ensure_sufficient_stack(|| {
                    write!(f, "{{")?;
                    for (idx, (key, value)) in record.borrow().iter().enumerate() {
                        if idx > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}: ", key)?;
                        value.render(f, parents)?;
                    }
                    write!(f, "}}")
                });
                parents.pop();
                res
            }
            Value::Callable(_) => write!(f, "<function>"),
            Value::Pending(_) => write!(f, "<pending>"),
        }
    }

    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(lhs), Value::Bool(rhs)) => lhs == rhs,
            (Value::Num(lhs), Value::Num(rhs)) => lhs == rhs,
            (Value::Str(lhs), Value::Str(rhs)) => lhs == rhs,
            (Value::Array(lhs), Value::Array(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Value::Object(lhs), Value::Object(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Value::Callable(lhs), Value::Callable(rhs)) => {
                Rc::as_ptr(lhs) as *const () == Rc::as_ptr(rhs) as *const ()
            }
            (Value::Pending(lhs), Value::Pending(rhs)) => Rc::ptr_eq(lhs, rhs),
            _ => false,
        }
    }

    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            _ if self.is_reference() || other.is_reference() => self.strict_eq(other),
            (Value::Bool(_), _) => Value::Num(self.to_number()).loose_eq(other),
            (_, Value::Bool(_)) => self.loose_eq(&Value::Num(other.to_number())),
            (Value::Num(_), Value::Str(_)) | (Value::Str(_), Value::Num(_)) => {
                self.to_number() == other.to_number()
            }
            _ => self.strict_eq(other),
        }
    }

    pub(crate) fn add(&self, other: &Value) -> Value {
        if self.is_textual() || other.is_textual() {
            Value::from(format!("{}{}", self, other))
        } else {
            Value::Num(self.to_number() + other.to_number())
        }
    }

    pub(crate) fn subtract(&self, other: &Value) -> Value {
        Value::Num(self.to_number() - other.to_number())
    }

    pub(crate) fn multiply(&self, other: &Value) -> Value {
        Value::Num(self.to_number() * other.to_number())
    }

    pub(crate) fn divide(&self, other: &Value) -> Result<Value, Error> {
        let divisor = other.to_number();
        if divisor == 0.0 {
            return Err(Error::runtime(format_args!("Division by zero")));
        }
        Ok(Value::Num(self.to_number() / divisor))
    }

    pub(crate) fn modulo(&self, other: &Value) -> Value {
        Value::Num(self.to_number() % other.to_number())
    }

    /// Relational comparison, texts compare lexicographically and everything else numerically.
    pub(crate) fn compare(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Str(lhs), Value::Str(rhs)) => Some(lhs.cmp(rhs)),
            _ => self.to_number().partial_cmp(&other.to_number()),
        }
    }
}

// Decimal parse with surrounding whitespace ignored, an empty text counts as zero
fn parse_number(text: &str) -> f64 {
    let text = text.trim();
    match text {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // rust also accepts spellings like `inf` and `nan`
        _ if text.chars().any(|c| c.is_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
        _ => text.parse::<f64>().unwrap_or(f64::NAN),
    }
}

pub(crate) fn format_number(num: f64) -> String {
    if num.is_nan() {
        return String::from("NaN");
    }
    if num.is_infinite() {
        return String::from(if num > 0.0 { "Infinity" } else { "-Infinity" });
    }
    if num == 0.0 {
        // covers negative zero too
        return String::from("0");
    }

    let magnitude = num.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return format!("{}", num);
    }

    let exponent_form = format!("{:e}", num);
    match exponent_form.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => exponent_form,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.render(f, &mut Vec::new())
    }
}

impl From<Literal> for Value {
    fn from(value: Literal) -> Self {
        match value {
            Literal::Str(val) => Value::from(val),
            Literal::Num(val) => Value::Num(val),
            Literal::Bool(val) => Value::Bool(val),
            Literal::Nil => Value::Null,
        }
    }
}

impl From<&Literal> for Value {
    fn from(value: &Literal) -> Self {
        match value {
            Literal::Str(val) => Value::from(val.as_str()),
            Literal::Num(val) => Value::Num(*val),
            Literal::Bool(val) => Value::Bool(*val),
            Literal::Nil => Value::Null,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Rc::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(Rc::from(value))
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::array(value)
    }
}

macro_rules! impl_from_num_for_value {
    ( $( $t:ident )* ) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Value {
                    Value::Num(n as f64)
                }
            }
        )*
    }
}

impl_from_num_for_value!(u8 i8 u16 i16 u32 i32 u64 i64 usize isize f32 f64);
