use wisp_core::limits::MAX_LOCALS;
use wisp_core::FunctionObject;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
  Script,
  Function,
}

/// One local slot: its declared name (for shadowing/duplicate checks), its
/// scope depth, and whether `=` may target it.
///
/// `depth == -1` marks a slot whose initializer is still being compiled —
/// the initializer-use hazard that makes `{ var a = a; }` an error.
#[derive(Debug)]
pub struct Local {
  pub name: Box<str>,
  pub depth: i32,
  pub is_immutable: bool,
}

/// The mutable state for compiling one function: its chunk under
/// construction (owned by `function`), its local slot table, and its
/// current scope depth.
///
/// Function frames reserve slot 0 with an empty name — it stands in for
/// the callee value the VM keeps at the base of the frame's stack window.
/// The top-level script frame has no such receiver, so it reserves
/// nothing and leaves the full `MAX_LOCALS` budget to user declarations.
pub struct Frame {
  pub function: FunctionObject,
  pub kind: FrameKind,
  pub locals: Vec<Local>,
  pub scope_depth: i32,
}

impl Frame {
  pub fn new(function: FunctionObject, kind: FrameKind) -> Self {
    let mut locals = Vec::with_capacity(MAX_LOCALS);
    if kind == FrameKind::Function {
      locals.push(Local { name: Box::from(""), depth: 0, is_immutable: false });
    }
    Self { function, kind, locals, scope_depth: 0 }
  }
}
