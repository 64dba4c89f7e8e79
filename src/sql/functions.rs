//! SQL function registry.
//!
//! Functions are registered per engine instance rather than in process-global
//! state, so two engines can carry different function sets. The built-in
//! registry ships with `COUNT`.

use crate::error::{Result, VectorDbError};
use crate::sql::result::Value;
use std::collections::HashMap;

/// A function callable from the SQL surface.
pub trait SqlFunction: Send + Sync {
    /// Upper-cased registration name.
    fn name(&self) -> &str;

    /// Evaluates the function for one row.
    fn eval(&self, args: &[Value]) -> Result<Value>;
}

/// `COUNT(*)`: contributes 1 per row (0 for NULL arguments); the executor
/// sums the contributions.
pub struct CountFunction;

impl SqlFunction for CountFunction {
    fn name(&self) -> &str {
        "COUNT"
    }

    fn eval(&self, args: &[Value]) -> Result<Value> {
        if args.len() != 1 {
            return Err(VectorDbError::invalid_query(format!(
                "COUNT() requires 1 argument, got {}",
                args.len()
            )));
        }
        match &args[0] {
            Value::Null => Ok(Value::Int(0)),
            _ => Ok(Value::Int(1)),
        }
    }
}

/// Per-engine function table, keyed by upper-cased name.
pub struct FunctionRegistry {
    functions: HashMap<String, Box<dyn SqlFunction>>,
}

impl FunctionRegistry {
    /// Creates a registry with the built-in functions installed.
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };
        registry.register(Box::new(CountFunction));
        registry
    }

    /// Adds or replaces a function.
    pub fn register(&mut self, function: Box<dyn SqlFunction>) {
        self.functions
            .insert(function.name().to_ascii_uppercase(), function);
    }

    /// Looks up a function by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&dyn SqlFunction> {
        self.functions
            .get(&name.to_ascii_uppercase())
            .map(|f| f.as_ref())
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
