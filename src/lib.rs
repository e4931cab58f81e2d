//! Single-pass bytecode compiler for a small dynamically-typed scripting
//! language: scanner, Pratt parser, local/global resolver, and bytecode
//! emitter. The virtual machine, object heap, disassembler, and CLI driver
//! that would consume this crate's output are separate collaborators, not
//! part of this crate.

pub use wisp_compiler::compile;
pub use wisp_core::{
  Chunk, Diagnostic, DiagnosticSite, FunctionObject, ObjRef, Object, OpCode, Token, TokenKind,
  Value, VERSION,
};
pub use wisp_lexer::Scanner;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn compiles_a_trivial_program() {
    assert!(compile("print 1 + 2;").is_ok());
  }

  #[test]
  fn surfaces_diagnostics_on_failure() {
    let err = compile("val x;").unwrap_err();
    assert_eq!(err.len(), 1);
    assert!(err[0].to_string().contains("Can't declare immutable variable without initializer"));
  }
}
