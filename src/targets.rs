//! Built-in targets
//!
//! Small parsers registered under `verdict.builtin`, useful for trying the
//! tool out and for exercising the runner in tests.

use crate::registry::{TargetOutput, TargetRegistry};
use crate::value::{Value, ValueMap};

/// Namespace the built-ins live in
pub const BUILTIN_NAMESPACE: &str = "verdict.builtin";

/// Register every built-in target
pub fn register_builtins(registry: &mut TargetRegistry) {
    let builtins: [(&str, fn(&str) -> TargetOutput); 3] = [
        ("parse_math_expression", parse_math_expression),
        ("parse_key_values", parse_key_values),
        ("echo", echo),
    ];

    for (name, target) in builtins {
        let reference = format!("{}.{}", BUILTIN_NAMESPACE, name);
        if let Err(e) = registry.register(&reference, target) {
            tracing::error!("Failed to register built-in target {}: {}", reference, e);
        }
    }
}

/// Parse `"<int> <op> <int> = <int>"`
///
/// Malformed input is reported in the output (`valid: false`), never as an error.
pub fn parse_math_expression(input: &str) -> TargetOutput {
    let mut out = ValueMap::new();

    let invalid = |mut out: ValueMap, reason: &str| -> TargetOutput {
        out.insert("valid".to_string(), Value::Bool(false));
        out.insert("error".to_string(), Value::from(reason));
        Ok(out)
    };

    let parts: Vec<&str> = input.split_whitespace().collect();
    let [lhs, operator, rhs, equals, result] = parts.as_slice() else {
        return invalid(out, "Invalid format");
    };

    if *equals != "=" {
        return invalid(out, "Missing equals sign");
    }

    let numbers: Option<Vec<i64>> = [lhs, rhs, result]
        .iter()
        .map(|s| s.parse::<i64>().ok())
        .collect();
    let Some(numbers) = numbers else {
        return invalid(out, "Invalid number");
    };

    out.insert("valid".to_string(), Value::Bool(true));
    out.insert("operand1".to_string(), Value::Int(numbers[0]));
    out.insert("operator".to_string(), Value::from(*operator));
    out.insert("operand2".to_string(), Value::Int(numbers[1]));
    out.insert("result".to_string(), Value::Int(numbers[2]));
    Ok(out)
}

/// Parse `key: value` lines into a mapping
///
/// Integers, booleans and `null` are typed; everything else stays a string.
/// Blank lines and `#` comments are skipped. A line without a colon is an error.
pub fn parse_key_values(input: &str) -> TargetOutput {
    let mut out = ValueMap::new();

    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, raw) = line
            .split_once(':')
            .ok_or_else(|| format!("line {}: expected 'key: value', got '{}'", index + 1, line))?;

        let key = key.trim();
        if key.is_empty() {
            return Err(format!("line {}: empty key", index + 1).into());
        }

        out.insert(key.to_string(), scalar(raw.trim()));
    }

    Ok(out)
}

/// Echo the input back
pub fn echo(input: &str) -> TargetOutput {
    let mut out = ValueMap::new();
    out.insert("input".to_string(), Value::from(input));
    Ok(out)
}

fn scalar(raw: &str) -> Value {
    match raw {
        "null" | "~" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => raw
            .parse::<i64>()
            .map(Value::Int)
            .unwrap_or_else(|_| Value::from(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_math_expression_valid() {
        let out = parse_math_expression("2 + 3 = 5").unwrap();
        assert_eq!(out["valid"], Value::Bool(true));
        assert_eq!(out["operand1"], Value::Int(2));
        assert_eq!(out["operator"], Value::from("+"));
        assert_eq!(out["operand2"], Value::Int(3));
        assert_eq!(out["result"], Value::Int(5));
    }

    #[test]
    fn test_math_expression_invalid() {
        let out = parse_math_expression("2 + 3").unwrap();
        assert_eq!(out["valid"], Value::Bool(false));
        assert_eq!(out["error"], Value::from("Invalid format"));

        let out = parse_math_expression("2 + 3 - 5").unwrap();
        assert_eq!(out["error"], Value::from("Missing equals sign"));

        let out = parse_math_expression("two + 3 = 5").unwrap();
        assert_eq!(out["error"], Value::from("Invalid number"));
    }

    #[test]
    fn test_key_values() {
        let out = parse_key_values("# header\nname: black\ncount: 3\n\nok: true\nnone: null\n")
            .unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out["name"], Value::from("black"));
        assert_eq!(out["count"], Value::Int(3));
        assert_eq!(out["ok"], Value::Bool(true));
        assert_eq!(out["none"], Value::Null);
    }

    #[test]
    fn test_key_values_rejects_bad_line() {
        let err = parse_key_values("a: 1\nnot a pair\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_builtins_registered() {
        let registry = TargetRegistry::with_builtins();
        for name in ["parse_math_expression", "parse_key_values", "echo"] {
            let reference = format!("{}.{}", BUILTIN_NAMESPACE, name);
            assert!(registry.resolve(&reference).is_ok(), "{} missing", reference);
        }
    }
}
