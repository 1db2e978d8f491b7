//! Abstract syntax tree
//!
//! The tree the parser produces. Every node carries the [`Range`] it was parsed from, and
//! composite nodes also keep the ranges of their significant parts (identifier ranges,
//! the `return` keyword, one range per segment of a dotted identifier, one per struct
//! property). Those sub-ranges are what diagnostics and editor tooling anchor to.
//!
//! ## Layout
//!
//! - [`types`]: type expressions (`NS.List<T>`, `{ a: T; }`, `A | B`, `A & B`)
//! - [`expressions`]: value expressions (literals, references, calls, conditions, lambdas)
//! - [`declarations`]: documents, namespaces and the statements they contain
//! - [`builtins`]: the `Meta.*` schemas and types that operators and literals desugar to
//!
//! All nodes are plain data: they derive `Serialize`/`Deserialize` so a tree can be dumped
//! and read back, and `PartialEq` so two parses can be compared structurally.

pub mod builtins;
pub mod declarations;
pub mod expressions;
pub mod range;
pub mod types;

pub use declarations::{
    Action, ActionStatement, Document, Generic, Import, Invoke, Namespace, Return, Schema,
    SchemaParam, SchemaStatement, Set, Translation, TranslationTerm, TypeDeclaration, Use,
    Variable,
};
pub use expressions::{
    Call, CallArgument, Condition, ConditionBranch, ConditionType, Expression, Lambda,
    RefAction, RefParam, RefProperty, RefSchema, RefTranslation, RefVariable, Scalar,
    ScalarValue, ValueList, ValueStruct,
};
pub use range::{Position, Range, SourceLocation};
pub use types::{TypeAllOf, TypeExpression, TypeOneOf, TypeRef, TypeStruct};
