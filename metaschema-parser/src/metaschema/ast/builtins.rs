//! Built-in references
//!
//! Operators, literals and string templates are sugar: they lower to calls of schemas in
//! the `Meta` namespace and to scalars typed with `Meta` types.

/// A `namespace.name` pair naming a built-in schema or type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Builtin {
    pub namespace: &'static [&'static str],
    pub name: &'static str,
}

impl Builtin {
    const fn new(namespace: &'static [&'static str], name: &'static str) -> Self {
        Self { namespace, name }
    }

    pub fn namespace_owned(&self) -> Vec<String> {
        self.namespace.iter().map(|s| s.to_string()).collect()
    }
}

const META: &[&str] = &["Meta"];
const COMPARE: &[&str] = &["Meta", "Compare"];
const LOGIC: &[&str] = &["Meta", "Logic"];
const ARITHMETIC: &[&str] = &["Meta", "Arithmetic"];

pub mod schemas {
    use super::*;

    pub const LT: Builtin = Builtin::new(COMPARE, "lt");
    pub const LTE: Builtin = Builtin::new(COMPARE, "lte");
    pub const GT: Builtin = Builtin::new(COMPARE, "gt");
    pub const GTE: Builtin = Builtin::new(COMPARE, "gte");
    pub const EQUAL: Builtin = Builtin::new(LOGIC, "equal");
    pub const NOT_EQUAL: Builtin = Builtin::new(LOGIC, "notEqual");
    pub const AND: Builtin = Builtin::new(LOGIC, "and");
    pub const OR: Builtin = Builtin::new(LOGIC, "or");
    pub const NOT: Builtin = Builtin::new(LOGIC, "not");
    pub const MULTIPLY: Builtin = Builtin::new(ARITHMETIC, "multiply");
    pub const DIVIDE: Builtin = Builtin::new(ARITHMETIC, "divide");
    pub const SUM: Builtin = Builtin::new(ARITHMETIC, "sum");
    pub const SUB: Builtin = Builtin::new(ARITHMETIC, "sub");
    pub const MODULO: Builtin = Builtin::new(ARITHMETIC, "modulo");
    pub const CONCAT: Builtin = Builtin::new(META, "concat");
}

pub mod types {
    use super::*;

    pub const STRING: Builtin = Builtin::new(META, "String");
    pub const NUMBER: Builtin = Builtin::new(META, "Number");
    pub const BOOLEAN: Builtin = Builtin::new(META, "Boolean");
    pub const NULL: Builtin = Builtin::new(META, "Null");
}
