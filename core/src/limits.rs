//! Compile-time resource limits shared by the lexer and compiler.

/// Maximum number of entries in a chunk's constant pool.
pub const MAX_CONSTANTS: usize = 256;
/// Maximum number of local variable slots live in a single function.
pub const MAX_LOCALS: usize = 256;
/// Maximum number of parameters a function declaration may have.
pub const MAX_PARAMETERS: usize = 255;
/// Maximum number of arguments a single call expression may pass.
pub const MAX_ARGUMENTS: usize = 255;
/// Maximum byte distance a single jump instruction may span.
pub const MAX_JUMP: usize = u16::MAX as usize;
