//! Target registry
//!
//! Targets are addressed by dotted references such as
//! `verdict.builtin.parse_math_expression`. Everything before the last dot is
//! the namespace, the final segment is the attribute. Targets must be
//! registered up front; there is no runtime symbol lookup.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::value::ValueMap;

/// Error a target reports for one invocation
pub type TargetError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a single target call
pub type TargetOutput = std::result::Result<ValueMap, TargetError>;

/// A unit under test: raw text in, structured mapping out
///
/// Targets are shared across worker threads and may be invoked concurrently.
/// Implementations must be safe for that; the runner does not serialize calls.
pub trait Target: Send + Sync {
    fn invoke(&self, input: &str) -> TargetOutput;
}

impl<F> Target for F
where
    F: Fn(&str) -> TargetOutput + Send + Sync,
{
    fn invoke(&self, input: &str) -> TargetOutput {
        self(input)
    }
}

/// A resolved target, shared read-only by every case of a suite
pub type BoundTarget = Arc<dyn Target>;

/// Why a dotted reference did not resolve
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("invalid reference '{0}', expected 'namespace.attribute'")]
    InvalidReference(String),

    #[error("namespace '{module}' not found (reference '{reference}')")]
    ModuleNotFound { module: String, reference: String },

    #[error("namespace '{module}' has no attribute '{attribute}' (available: {available})")]
    AttributeNotFound {
        module: String,
        attribute: String,
        available: String,
    },
}

/// Split a dotted reference into namespace and attribute
pub fn split_reference(reference: &str) -> Result<(&str, &str), ResolveError> {
    match reference.rsplit_once('.') {
        Some((module, attribute))
            if !attribute.is_empty() && !module.split('.').any(str::is_empty) =>
        {
            Ok((module, attribute))
        }
        _ => Err(ResolveError::InvalidReference(reference.to_string())),
    }
}

/// String-keyed table of invocable targets
#[derive(Default, Clone)]
pub struct TargetRegistry {
    modules: BTreeMap<String, BTreeMap<String, BoundTarget>>,
}

impl TargetRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in targets registered
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::targets::register_builtins(&mut registry);
        registry
    }

    /// Register a target under a dotted reference, replacing any previous entry
    pub fn register<T>(&mut self, reference: &str, target: T) -> Result<(), ResolveError>
    where
        T: Target + 'static,
    {
        let (module, attribute) = split_reference(reference)?;
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(attribute.to_string(), Arc::new(target));
        Ok(())
    }

    /// Resolve a dotted reference into a bound target
    pub fn resolve(&self, reference: &str) -> Result<BoundTarget, ResolveError> {
        let (module, attribute) = split_reference(reference)?;

        let attributes =
            self.modules
                .get(module)
                .ok_or_else(|| ResolveError::ModuleNotFound {
                    module: module.to_string(),
                    reference: reference.to_string(),
                })?;

        attributes
            .get(attribute)
            .cloned()
            .ok_or_else(|| ResolveError::AttributeNotFound {
                module: module.to_string(),
                attribute: attribute.to_string(),
                available: attributes.keys().cloned().collect::<Vec<_>>().join(", "),
            })
    }

    /// All registered references, sorted
    pub fn references(&self) -> Vec<String> {
        self.modules
            .iter()
            .flat_map(|(module, attributes)| {
                attributes
                    .keys()
                    .map(move |attribute| format!("{}.{}", module, attribute))
            })
            .collect()
    }
}

impl fmt::Debug for TargetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetRegistry")
            .field("references", &self.references())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn constant(input: &str) -> TargetOutput {
        let mut out = ValueMap::new();
        out.insert("input".to_string(), Value::from(input));
        Ok(out)
    }

    #[test]
    fn test_split_reference() {
        assert_eq!(split_reference("a.b.c").unwrap(), ("a.b", "c"));
        assert_eq!(split_reference("a.b").unwrap(), ("a", "b"));
        assert!(split_reference("nodot").is_err());
        assert!(split_reference("a.").is_err());
        assert!(split_reference(".a").is_err());
        assert!(split_reference("a..b").is_err());
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = TargetRegistry::new();
        registry.register("tests.parsers.constant", constant).unwrap();

        let target = registry.resolve("tests.parsers.constant").unwrap();
        let out = target.invoke("hello").unwrap();
        assert_eq!(out["input"], Value::from("hello"));
    }

    #[test]
    fn test_resolve_distinguishes_module_and_attribute() {
        let mut registry = TargetRegistry::new();
        registry.register("tests.parsers.constant", constant).unwrap();

        match registry.resolve("tests.missing.constant") {
            Err(ResolveError::ModuleNotFound { module, .. }) => {
                assert_eq!(module, "tests.missing");
            }
            other => panic!("Expected ModuleNotFound, got {:?}", other.err()),
        }

        match registry.resolve("tests.parsers.nope") {
            Err(ResolveError::AttributeNotFound {
                attribute,
                available,
                ..
            }) => {
                assert_eq!(attribute, "nope");
                assert_eq!(available, "constant");
            }
            other => panic!("Expected AttributeNotFound, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_closures_are_targets() {
        let mut registry = TargetRegistry::new();
        let suffix = String::from("!");
        registry
            .register("tests.closure", move |input: &str| -> TargetOutput {
                let mut out = ValueMap::new();
                out.insert("v".to_string(), Value::from(format!("{}{}", input, suffix)));
                Ok(out)
            })
            .unwrap();
        // "tests.closure" has a single-segment namespace
        let target = registry.resolve("tests.closure").unwrap();
        assert_eq!(target.invoke("hi").unwrap()["v"], Value::from("hi!"));
    }

    #[test]
    fn test_references_sorted() {
        let mut registry = TargetRegistry::new();
        registry.register("b.x", constant).unwrap();
        registry.register("a.y", constant).unwrap();
        registry.register("a.x", constant).unwrap();
        assert_eq!(registry.references(), vec!["a.x", "a.y", "b.x"]);
    }
}
