use hashbrown::HashMap;
use wisp_core::{FunctionObject, ObjRef, Object};

/// Stands in for an out-of-scope object/string heap: the two boundary
/// operations the compiler calls out to are interning a string slice and
/// allocating an empty function shell. This crate owns neither memory
/// policy nor a garbage collector — a real VM would own this table
/// instead and the compiler would borrow it.
#[derive(Default)]
pub struct Heap {
  strings: HashMap<Box<str>, ObjRef>,
}

impl Heap {
  pub fn new() -> Self {
    Self::default()
  }

  /// Interns `text`, returning the shared handle. A second call with
  /// identical bytes returns the very same handle, which is what makes
  /// equal-content strings compare equal by identity.
  pub fn intern(&mut self, text: &str) -> ObjRef {
    if let Some(existing) = self.strings.get(text) {
      return existing.clone();
    }
    let obj = ObjRef::new(Object::Str(Box::from(text)));
    self.strings.insert(Box::from(text), obj.clone());
    obj
  }

  /// Allocates the empty shell for a function under construction.
  pub fn new_function(&mut self) -> FunctionObject {
    FunctionObject::new()
  }
}
