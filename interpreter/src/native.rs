use std::rc::Rc;

use rand::Rng;

use crate::callable::{Arity, BoxedFunction, Native};
use crate::error::Error;
use crate::value::Value;

// Arity is checked by the caller before `execute`, missing arguments still read as null
// so a direct call can never index out of bounds.
fn arg(args: &[Value], idx: usize) -> Value {
    args.get(idx).cloned().unwrap_or(Value::Null)
}

fn requires(name: &str, what: &str) -> Error {
    Error::runtime(format_args!("{} requires {}", name, what))
}

fn native(name: &'static str, arity: Arity, func: BoxedFunction) -> Rc<Native> {
    Rc::new(Native::new(name, arity, func))
}

/// Built-in callables seeded into the global frame of every interpreter.
pub(crate) fn globals() -> Vec<Rc<Native>> {
    vec![
        native(
            "add",
            Arity::exactly(2),
            Box::new(|args: &[Value]| Ok(arg(args, 0).add(&arg(args, 1)))),
        ),
        native(
            "subtract",
            Arity::exactly(2),
            Box::new(|args: &[Value]| Ok(arg(args, 0).subtract(&arg(args, 1)))),
        ),
        native(
            "multiply",
            Arity::exactly(2),
            Box::new(|args: &[Value]| Ok(arg(args, 0).multiply(&arg(args, 1)))),
        ),
        native(
            "divide",
            Arity::exactly(2),
            Box::new(|args: &[Value]| arg(args, 0).divide(&arg(args, 1))),
        ),
        native(
            "random",
            Arity::exactly(0),
            Box::new(|_: &[Value]| Ok(Value::Num(rand::thread_rng().gen::<f64>()))),
        ),
        native("join", Arity::range(1, 2), Box::new(join)),
        native("split", Arity::range(1, 2), Box::new(split)),
        native("trim", Arity::exactly(1), Box::new(trim)),
        native(
            "concat",
            Arity::at_least(0),
            Box::new(|args: &[Value]| {
                let joined: String = args.iter().map(|value| value.to_string()).collect();
                Ok(Value::from(joined))
            }),
        ),
        native("push", Arity::at_least(1), Box::new(push)),
        native("pop", Arity::exactly(1), Box::new(pop)),
        native("length", Arity::exactly(1), Box::new(length)),
    ]
}

// Separator argument of `join` and `split`, a comma unless given
fn separator(args: &[Value]) -> String {
    match arg(args, 1) {
        Value::Null => String::from(","),
        sep => sep.to_string(),
    }
}

fn join(args: &[Value]) -> Result<Value, Error> {
    match arg(args, 0) {
        Value::Array(items) => {
            let parts: Vec<String> = items.borrow().iter().map(Value::to_string).collect();
            Ok(Value::from(parts.join(separator(args).as_str())))
        }
        _ => Err(requires("join", "an array")),
    }
}

fn split(args: &[Value]) -> Result<Value, Error> {
    let text = match arg(args, 0) {
        Value::Str(text) => text,
        _ => return Err(requires("split", "a string")),
    };

    let sep = separator(args);
    let parts: Vec<Value> = if sep.is_empty() {
        text.chars().map(|c| Value::from(c.to_string())).collect()
    } else {
        text.split(sep.as_str()).map(Value::from).collect()
    };

    Ok(Value::array(parts))
}

fn trim(args: &[Value]) -> Result<Value, Error> {
    match arg(args, 0) {
        Value::Str(text) => Ok(Value::from(text.trim())),
        _ => Err(requires("trim", "a string")),
    }
}

fn push(args: &[Value]) -> Result<Value, Error> {
    match arg(args, 0) {
        Value::Array(items) => {
            let mut items = items.borrow_mut();
            items.extend(args.iter().skip(1).cloned());
            Ok(Value::from(items.len()))
        }
        _ => Err(requires("push", "an array")),
    }
}

fn pop(args: &[Value]) -> Result<Value, Error> {
    match arg(args, 0) {
        Value::Array(items) => Ok(items.borrow_mut().pop().unwrap_or(Value::Null)),
        _ => Err(requires("pop", "an array")),
    }
}

fn length(args: &[Value]) -> Result<Value, Error> {
    match arg(args, 0) {
        Value::Array(items) => Ok(Value::from(items.borrow().len())),
        Value::Str(text) => Ok(Value::from(text.chars().count())),
        Value::Object(record) => Ok(Value::from(record.borrow().len())),
        _ => Err(requires("length", "an array, string or object")),
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::callable::Callable;
    use crate::interpreter::Interpreter;
    use crate::native::globals;
    use crate::value::Value;

    fn call(name: &str, args: &[Value]) -> Result<Value, String> {
        let native = globals()
            .into_iter()
            .find(|native| native.name() == name)
            .unwrap();
        assert!(native.arity().accepts(args.len()));

        let mut sink: Vec<u8> = Vec::new();
        let mut interpreter = Interpreter::new(&mut sink);
        Rc::clone(&native)
            .execute(&mut interpreter, args)
            .map_err(|err| err.message())
    }

    #[test]
    fn test_string_helpers() {
        let words = Value::array(vec![Value::from("a"), Value::from(1), Value::Null]);

        assert_eq!(call("join", &[words.clone()]).unwrap(), Value::from("a,1,onnum_illa"));
        assert_eq!(
            call("join", &[words, Value::from(" - ")]).unwrap(),
            Value::from("a - 1 - onnum_illa")
        );
        assert_eq!(
            call("split", &[Value::from("a,b,,c")]).unwrap().to_string(),
            "[a, b, , c]"
        );
        assert_eq!(
            call("split", &[Value::from("abc"), Value::from("")])
                .unwrap()
                .to_string(),
            "[a, b, c]"
        );
        assert_eq!(call("trim", &[Value::from("  hi \n")]).unwrap(), Value::from("hi"));
        assert_eq!(
            call("concat", &[Value::from("x"), Value::from(1), Value::from(true)]).unwrap(),
            Value::from("x1sheriya")
        );
        assert_eq!(call("concat", &[]).unwrap(), Value::from(""));
        assert_eq!(call("trim", &[Value::from(1)]), Err(String::from("trim requires a string")));
    }

    #[test]
    fn test_array_helpers() {
        let xs = Value::array(vec![]);

        assert_eq!(
            call("push", &[xs.clone(), Value::from(1), Value::from(2)]).unwrap(),
            Value::from(2)
        );
        assert_eq!(call("length", &[xs.clone()]).unwrap(), Value::from(2));
        assert_eq!(call("pop", &[xs.clone()]).unwrap(), Value::from(2));
        assert_eq!(call("pop", &[xs.clone()]).unwrap(), Value::from(1));
        assert_eq!(call("pop", &[xs.clone()]).unwrap(), Value::Null);
        assert_eq!(call("length", &[Value::from("thenga")]).unwrap(), Value::from(6));
        assert_eq!(
            call("push", &[Value::from("xs"), Value::from(1)]),
            Err(String::from("push requires an array"))
        );
    }

    #[test]
    fn test_math_helpers() {
        assert_eq!(call("add", &[Value::from(2), Value::from(3)]).unwrap(), Value::from(5));
        assert_eq!(
            call("subtract", &[Value::from(2), Value::from(3)]).unwrap(),
            Value::from(-1)
        );
        assert_eq!(
            call("multiply", &[Value::from("2"), Value::from(3)]).unwrap(),
            Value::from(6)
        );
        assert_eq!(
            call("divide", &[Value::from(1), Value::from(0)]),
            Err(String::from("Division by zero"))
        );

        for _ in 0..100 {
            let num = call("random", &[]).unwrap().to_number();
            assert!((0.0..1.0).contains(&num));
        }
    }
}
