pub mod chunk;
pub mod error;
pub mod limits;
pub mod object;
pub mod token;
pub mod value;

pub use chunk::{Chunk, OpCode};
pub use error::{Diagnostic, DiagnosticSite};
pub use object::{ClosureObject, FunctionObject, NativeFn, NativeObject, ObjRef, Object};
pub use token::{keyword_kind, Token, TokenKind};
pub use value::Value;

/// The current version of this compiler crate family.
pub const VERSION: &str = "0.1.0";
