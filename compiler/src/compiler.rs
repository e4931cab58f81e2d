use std::rc::Rc;

use hashbrown::HashMap;
use wisp_core::limits::{MAX_ARGUMENTS, MAX_JUMP, MAX_LOCALS, MAX_PARAMETERS};
use wisp_core::{Chunk, Diagnostic, DiagnosticSite, FunctionObject, ObjRef, Object, OpCode, Token, TokenKind, Value};

use crate::frame::{Frame, FrameKind, Local};
use crate::heap::Heap;
use crate::parser::Parser;
use crate::precedence::{get_rule, ParseFn, Precedence};

/// Drives the scanner, parses with precedence climbing, resolves
/// identifiers, and emits bytes into the chunk of the innermost open
/// frame. Holds everything as explicit fields rather than module
/// globals: parser state, the frame stack, and the globals-immutability
/// table.
pub struct Compiler<'src> {
  parser: Parser<'src>,
  frames: Vec<Frame>,
  /// Keyed by interned-string identity rather than constant-pool index.
  /// Two `val` declarations of the same name always share one heap
  /// handle, so this table can never disagree with itself across frames
  /// the way an index-keyed table could.
  globals_immutable: HashMap<ObjRef, bool>,
  heap: Heap,
  diagnostics: Vec<Diagnostic>,
}

impl<'src> Compiler<'src> {
  fn new(source: &'src str) -> Self {
    let mut compiler = Self {
      parser: Parser::new(source),
      frames: Vec::new(),
      globals_immutable: HashMap::new(),
      heap: Heap::new(),
      diagnostics: Vec::new(),
    };
    compiler.push_frame(FrameKind::Script, None);
    compiler
  }

  fn run(mut self) -> Result<FunctionObject, Vec<Diagnostic>> {
    self.advance();
    while !self.match_kind(TokenKind::Eof) {
      self.declaration();
    }
    let function = self.end_frame();
    if self.parser.had_error {
      Err(self.diagnostics)
    } else {
      Ok(function)
    }
  }

  // ---- frame stack -------------------------------------------------

  fn push_frame(&mut self, kind: FrameKind, name: Option<Rc<str>>) {
    let mut function = self.heap.new_function();
    function.name = name;
    self.frames.push(Frame::new(function, kind));
  }

  /// Emits the implicit trailing `NIL; RETURN` and pops the frame,
  /// returning its finished function to the caller (the enclosing frame,
  /// or the top-level caller of `compile`).
  fn end_frame(&mut self) -> FunctionObject {
    self.emit_return();
    self.frames.pop().expect("frame stack is pushed and popped in strict LIFO order").function
  }

  fn frame(&self) -> &Frame {
    self.frames.last().expect("a frame is always open while parsing")
  }

  fn frame_mut(&mut self) -> &mut Frame {
    self.frames.last_mut().expect("a frame is always open while parsing")
  }

  fn current_chunk(&self) -> &Chunk {
    &self.frame().function.chunk
  }

  // ---- token stream --------------------------------------------------

  fn advance(&mut self) {
    self.parser.previous = self.parser.current;
    loop {
      self.parser.current = self.parser.scanner.scan_token();
      if !self.parser.current.is_error() {
        break;
      }
      let message = self.parser.current.lexeme.to_string();
      self.error_at_current(message);
    }
  }

  fn consume(&mut self, kind: TokenKind, message: &str) {
    if self.parser.current.kind == kind {
      self.advance();
    } else {
      self.error_at_current(message.to_string());
    }
  }

  fn check(&self, kind: TokenKind) -> bool {
    self.parser.current.kind == kind
  }

  fn match_kind(&mut self, kind: TokenKind) -> bool {
    if !self.check(kind) {
      return false;
    }
    self.advance();
    true
  }

  // ---- diagnostics -----------------------------------------------------

  fn error_at_current(&mut self, message: impl Into<String>) {
    let token = self.parser.current;
    self.error_at(token, message);
  }

  fn error(&mut self, message: impl Into<String>) {
    let token = self.parser.previous;
    self.error_at(token, message);
  }

  fn error_at(&mut self, token: Token<'src>, message: impl Into<String>) {
    if self.parser.panic_mode {
      return;
    }
    self.parser.panic_mode = true;
    self.parser.had_error = true;

    let site = if token.is_eof() {
      DiagnosticSite::AtEnd
    } else if token.is_error() {
      DiagnosticSite::ErrorToken
    } else {
      DiagnosticSite::AtLexeme(token.lexeme.to_string())
    };
    let diagnostic = Diagnostic { line: token.line, site, message: message.into() };
    eprintln!("{}", diagnostic);
    self.diagnostics.push(diagnostic);
  }

  // ---- byte/opcode emission -------------------------------------------

  fn emit_byte(&mut self, byte: u8) {
    let line = self.parser.previous.line;
    self.frame_mut().function.chunk.write_byte(byte, line);
  }

  fn emit_op(&mut self, op: OpCode) {
    #[cfg(feature = "trace_bytecode")]
    eprintln!("{:>4} {}", self.parser.previous.line, op);
    self.emit_byte(op as u8);
  }

  fn emit_return(&mut self) {
    self.emit_op(OpCode::Nil);
    self.emit_op(OpCode::Return);
  }

  fn make_constant(&mut self, value: Value) -> u8 {
    match self.frame_mut().function.chunk.add_constant(value) {
      Some(idx) => idx,
      None => {
        self.error("Too many constants in one chunk");
        0
      }
    }
  }

  fn emit_constant(&mut self, value: Value) {
    let idx = self.make_constant(value);
    self.emit_op(OpCode::Constant);
    self.emit_byte(idx);
  }

  /// Emits a forward jump with placeholder `0xff 0xff` operand bytes and
  /// returns the patch site: the index of the first placeholder byte.
  fn emit_jump(&mut self, op: OpCode) -> usize {
    self.emit_op(op);
    self.emit_byte(0xff);
    self.emit_byte(0xff);
    self.current_chunk().len() - 2
  }

  /// Back-patches the two placeholder bytes at `patch_site` with the
  /// distance from just past them to the current end of the chunk.
  fn patch_jump(&mut self, patch_site: usize) {
    let jump = self.current_chunk().len() - patch_site - 2;
    if jump > MAX_JUMP {
      self.error("Too much code to jump over");
    }
    let bytes = (jump as u16).to_be_bytes();
    self.frame_mut().function.chunk.set_byte(patch_site, bytes[0]);
    self.frame_mut().function.chunk.set_byte(patch_site + 1, bytes[1]);
  }

  fn emit_loop(&mut self, loop_start: usize) {
    self.emit_op(OpCode::Loop);
    let offset = self.current_chunk().len() - loop_start + 2;
    if offset > MAX_JUMP {
      self.error("Loop body too large");
    }
    let bytes = (offset as u16).to_be_bytes();
    self.emit_byte(bytes[0]);
    self.emit_byte(bytes[1]);
  }

  // ---- scopes ----------------------------------------------------------

  fn begin_scope(&mut self) {
    self.frame_mut().scope_depth += 1;
  }

  fn end_scope(&mut self) {
    self.frame_mut().scope_depth -= 1;
    let depth = self.frame().scope_depth;
    loop {
      let should_pop = matches!(self.frame().locals.last(), Some(local) if local.depth > depth);
      if !should_pop {
        break;
      }
      self.emit_op(OpCode::Pop);
      self.frame_mut().locals.pop();
    }
  }

  // ---- variable resolution ---------------------------------------------

  fn identifier_constant(&mut self, name: &str) -> (u8, ObjRef) {
    let obj = self.heap.intern(name);
    let idx = self.make_constant(Value::Obj(obj.clone()));
    (idx, obj)
  }

  /// Walks the current frame's locals from newest to oldest. Errors if a
  /// match's initializer is still being compiled (`depth == -1`).
  fn resolve_local(&mut self, name: &str) -> Option<usize> {
    for i in (0..self.frame().locals.len()).rev() {
      if self.frame().locals[i].name.as_ref() == name {
        if self.frame().locals[i].depth == -1 {
          self.error("Can't read local variable in its initializer");
        }
        return Some(i);
      }
    }
    None
  }

  fn add_local(&mut self, name: &str, is_immutable: bool) {
    if self.frame().locals.len() >= MAX_LOCALS {
      self.error("Too many local variables in function");
      return;
    }
    self.frame_mut().locals.push(Local { name: Box::from(name), depth: -1, is_immutable });
  }

  fn declare_variable(&mut self, lexeme: &str, is_immutable: bool) {
    if self.frame().scope_depth == 0 {
      return;
    }

    let current_depth = self.frame().scope_depth;
    let mut duplicate = false;
    for i in (0..self.frame().locals.len()).rev() {
      let local = &self.frame().locals[i];
      if local.depth != -1 && local.depth < current_depth {
        break;
      }
      if local.name.as_ref() == lexeme {
        duplicate = true;
        break;
      }
    }
    if duplicate {
      self.error("Already a variable with this name in this scope");
    }
    self.add_local(lexeme, is_immutable);
  }

  /// Consumes the identifier, declares it, and returns the constant-pool
  /// index (and interned handle) for global scope — or `(0, None)` at
  /// local scope, where no constant is needed.
  fn parse_variable(&mut self, is_immutable: bool, message: &str) -> (u8, Option<ObjRef>) {
    self.consume(TokenKind::Identifier, message);
    let lexeme = self.parser.previous.lexeme;
    self.declare_variable(lexeme, is_immutable);
    if self.frame().scope_depth > 0 {
      return (0, None);
    }
    let (idx, obj) = self.identifier_constant(lexeme);
    (idx, Some(obj))
  }

  fn mark_initialized(&mut self) {
    if self.frame().scope_depth == 0 {
      return;
    }
    let depth = self.frame().scope_depth;
    let last = self.frame().locals.len() - 1;
    self.frame_mut().locals[last].depth = depth;
  }

  fn define_variable(&mut self, global: u8, obj: Option<ObjRef>, is_immutable: bool) {
    if self.frame().scope_depth > 0 {
      self.mark_initialized();
      return;
    }
    if let Some(obj) = obj {
      self.globals_immutable.insert(obj, is_immutable);
    }
    self.emit_op(OpCode::DefineGlobal);
    self.emit_byte(global);
  }

  fn named_variable(&mut self, name: Token<'src>, can_assign: bool) {
    if let Some(slot) = self.resolve_local(name.lexeme) {
      if can_assign && self.match_kind(TokenKind::Equal) {
        if self.frame().locals[slot].is_immutable {
          self.error("Cannot reassign immutable variables");
        }
        self.expression();
        self.emit_op(OpCode::SetLocal);
        self.emit_byte(slot as u8);
      } else {
        self.emit_op(OpCode::GetLocal);
        self.emit_byte(slot as u8);
      }
      return;
    }

    let (idx, obj) = self.identifier_constant(name.lexeme);
    if can_assign && self.match_kind(TokenKind::Equal) {
      if *self.globals_immutable.get(&obj).unwrap_or(&false) {
        self.error("Cannot reassign immutable variables");
      }
      self.expression();
      self.emit_op(OpCode::SetGlobal);
      self.emit_byte(idx);
    } else {
      self.emit_op(OpCode::GetGlobal);
      self.emit_byte(idx);
    }
  }

  // ---- expressions -------------------------------------------------

  fn expression(&mut self) {
    self.parse_precedence(Precedence::Assignment);
  }

  fn parse_precedence(&mut self, precedence: Precedence) {
    self.advance();
    let prefix = get_rule(self.parser.previous.kind).prefix;
    if prefix == ParseFn::None {
      self.error("Expect expression");
      return;
    }
    let can_assign = precedence <= Precedence::Assignment;
    self.apply_parse_fn(prefix, can_assign);

    while precedence <= get_rule(self.parser.current.kind).precedence {
      self.advance();
      let infix = get_rule(self.parser.previous.kind).infix;
      self.apply_parse_fn(infix, can_assign);
    }

    if can_assign && self.match_kind(TokenKind::Equal) {
      self.error("Invalid assignment target");
    }
  }

  fn apply_parse_fn(&mut self, parse_fn: ParseFn, can_assign: bool) {
    match parse_fn {
      ParseFn::None => {}
      ParseFn::Grouping => self.grouping(),
      ParseFn::Call => self.call_expr(),
      ParseFn::Unary => self.unary(),
      ParseFn::Binary => self.binary(),
      ParseFn::Number => self.number(),
      ParseFn::StringLit => self.string_lit(),
      ParseFn::Literal => self.literal(),
      ParseFn::Variable => self.variable(can_assign),
      ParseFn::And => self.and_(),
      ParseFn::Or => self.or_(),
    }
  }

  fn grouping(&mut self) {
    self.expression();
    self.consume(TokenKind::RightParen, "Expect ')' after expression");
  }

  fn number(&mut self) {
    let lexeme = self.parser.previous.lexeme;
    let value: f64 = lexeme.parse().unwrap_or(0.0);
    self.emit_constant(Value::Number(value));
  }

  fn string_lit(&mut self) {
    let lexeme = self.parser.previous.lexeme;
    let content = &lexeme[1..lexeme.len() - 1];
    let obj = self.heap.intern(content);
    self.emit_constant(Value::Obj(obj));
  }

  fn literal(&mut self) {
    match self.parser.previous.kind {
      TokenKind::Nil => self.emit_op(OpCode::Nil),
      TokenKind::True => self.emit_op(OpCode::True),
      TokenKind::False => self.emit_op(OpCode::False),
      _ => {}
    }
  }

  fn unary(&mut self) {
    let op_kind = self.parser.previous.kind;
    self.parse_precedence(Precedence::Unary);
    match op_kind {
      TokenKind::Bang => self.emit_op(OpCode::Not),
      TokenKind::Minus => self.emit_op(OpCode::Negate),
      _ => {}
    }
  }

  fn binary(&mut self) {
    let op_kind = self.parser.previous.kind;
    let rule = get_rule(op_kind);
    self.parse_precedence(rule.precedence.next());
    match op_kind {
      TokenKind::Plus => self.emit_op(OpCode::Add),
      TokenKind::Minus => self.emit_op(OpCode::Subtract),
      TokenKind::Star => self.emit_op(OpCode::Multiply),
      TokenKind::Slash => self.emit_op(OpCode::Divide),
      TokenKind::BangEqual => {
        self.emit_op(OpCode::Equal);
        self.emit_op(OpCode::Not);
      }
      TokenKind::EqualEqual => self.emit_op(OpCode::Equal),
      TokenKind::Greater => self.emit_op(OpCode::Greater),
      TokenKind::GreaterEqual => {
        self.emit_op(OpCode::Less);
        self.emit_op(OpCode::Not);
      }
      TokenKind::Less => self.emit_op(OpCode::Less),
      TokenKind::LessEqual => {
        self.emit_op(OpCode::Greater);
        self.emit_op(OpCode::Not);
      }
      _ => {}
    }
  }

  /// `a and b`: short-circuits by leaving `a` on the stack and jumping
  /// past `b` when `a` is falsey. Relies on `JUMP_IF_FALSE` not popping
  /// its operand.
  fn and_(&mut self) {
    let end_jump = self.emit_jump(OpCode::JumpIfFalse);
    self.emit_op(OpCode::Pop);
    self.parse_precedence(Precedence::And);
    self.patch_jump(end_jump);
  }

  fn or_(&mut self) {
    let else_jump = self.emit_jump(OpCode::JumpIfFalse);
    let end_jump = self.emit_jump(OpCode::Jump);
    self.patch_jump(else_jump);
    self.emit_op(OpCode::Pop);
    self.parse_precedence(Precedence::Or);
    self.patch_jump(end_jump);
  }

  fn variable(&mut self, can_assign: bool) {
    let name = self.parser.previous;
    self.named_variable(name, can_assign);
  }

  fn call_expr(&mut self) {
    let arg_count = self.argument_list();
    self.emit_op(OpCode::Call);
    self.emit_byte(arg_count);
  }

  fn argument_list(&mut self) -> u8 {
    let mut arg_count: usize = 0;
    if !self.check(TokenKind::RightParen) {
      loop {
        self.expression();
        if arg_count == MAX_ARGUMENTS {
          self.error("Can't have more than 255 arguments");
        }
        arg_count += 1;
        if !self.match_kind(TokenKind::Comma) {
          break;
        }
      }
    }
    self.consume(TokenKind::RightParen, "Expect ')' after arguments");
    arg_count as u8
  }

  // ---- declarations and statements ----------------------------------

  fn declaration(&mut self) {
    if self.match_kind(TokenKind::Fun) {
      self.fun_declaration();
    } else if self.match_kind(TokenKind::Var) || self.match_kind(TokenKind::Val) {
      self.var_declaration();
    } else {
      self.statement();
    }
    if self.parser.panic_mode {
      self.synchronize();
    }
  }

  fn fun_declaration(&mut self) {
    let (global, obj) = self.parse_variable(false, "Expect function name");
    self.mark_initialized();
    self.function_body(FrameKind::Function);
    self.define_variable(global, obj, false);
  }

  fn function_body(&mut self, kind: FrameKind) {
    let name: Rc<str> = Rc::from(self.parser.previous.lexeme);
    self.push_frame(kind, Some(name));
    self.begin_scope();

    self.consume(TokenKind::LeftParen, "Expect '(' after function name");
    if !self.check(TokenKind::RightParen) {
      loop {
        let arity = self.frame().function.arity as usize + 1;
        if arity > MAX_PARAMETERS {
          self.error_at_current("Can't have more than 255 parameters");
        } else {
          self.frame_mut().function.arity = arity as u8;
        }
        let (param_const, _) = self.parse_variable(false, "Expect parameter name");
        self.define_variable(param_const, None, false);
        if !self.match_kind(TokenKind::Comma) {
          break;
        }
      }
    }
    self.consume(TokenKind::RightParen, "Expect ')' after function parameters");
    self.consume(TokenKind::LeftBrace, "Expect '{' before function body");
    self.block();

    let function = self.end_frame();
    let obj = ObjRef::new(Object::Function(function));
    let idx = self.make_constant(Value::Obj(obj));
    self.emit_op(OpCode::Closure);
    self.emit_byte(idx);
  }

  fn var_declaration(&mut self) {
    let is_immutable = self.parser.previous.kind == TokenKind::Val;
    let (global, obj) = self.parse_variable(is_immutable, "Expect variable name");

    if is_immutable && !self.check(TokenKind::Equal) {
      self.error("Can't declare immutable variable without initializer");
      return;
    }

    if self.match_kind(TokenKind::Equal) {
      self.expression();
    } else {
      self.emit_op(OpCode::Nil);
    }
    self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration");
    self.define_variable(global, obj, is_immutable);
  }

  fn statement(&mut self) {
    if self.match_kind(TokenKind::Print) {
      self.print_statement();
    } else if self.match_kind(TokenKind::For) {
      self.for_statement();
    } else if self.match_kind(TokenKind::If) {
      self.if_statement();
    } else if self.match_kind(TokenKind::Return) {
      self.return_statement();
    } else if self.match_kind(TokenKind::While) {
      self.while_statement();
    } else if self.match_kind(TokenKind::LeftBrace) {
      self.begin_scope();
      self.block();
      self.end_scope();
    } else {
      self.expression_statement();
    }
  }

  fn block(&mut self) {
    while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
      self.declaration();
    }
    self.consume(TokenKind::RightBrace, "Expect '}' after block");
  }

  fn print_statement(&mut self) {
    self.expression();
    self.consume(TokenKind::Semicolon, "Expect ';' at the end of print statement");
    self.emit_op(OpCode::Print);
  }

  fn return_statement(&mut self) {
    if self.frame().kind == FrameKind::Script {
      self.error("Can't return from top-level code");
    }
    if self.match_kind(TokenKind::Semicolon) {
      self.emit_return();
    } else {
      self.expression();
      self.consume(TokenKind::Semicolon, "Expect semicolon after return value");
      self.emit_op(OpCode::Return);
    }
  }

  fn expression_statement(&mut self) {
    self.expression();
    self.consume(TokenKind::Semicolon, "Expect ';' after expression");
    self.emit_op(OpCode::Pop);
  }

  fn if_statement(&mut self) {
    self.consume(TokenKind::LeftParen, "Expect '(' after if statement");
    self.expression();
    self.consume(TokenKind::RightParen, "Expect ')' after condition");

    let then_jump = self.emit_jump(OpCode::JumpIfFalse);
    self.emit_op(OpCode::Pop);
    self.statement();

    let else_jump = self.emit_jump(OpCode::Jump);
    self.patch_jump(then_jump);
    self.emit_op(OpCode::Pop);

    if self.match_kind(TokenKind::Else) {
      self.statement();
    }
    self.patch_jump(else_jump);
  }

  fn while_statement(&mut self) {
    let loop_start = self.current_chunk().len();
    self.consume(TokenKind::LeftParen, "Expect '(' after while statement");
    self.expression();
    self.consume(TokenKind::RightParen, "Expect ')' after condition");

    let exit_jump = self.emit_jump(OpCode::JumpIfFalse);
    self.emit_op(OpCode::Pop);
    self.statement();
    self.emit_loop(loop_start);

    self.patch_jump(exit_jump);
    self.emit_op(OpCode::Pop);
  }

  fn for_statement(&mut self) {
    self.begin_scope();
    self.consume(TokenKind::LeftParen, "Expect '(' after 'for'");
    if self.match_kind(TokenKind::Semicolon) {
      // No initializer clause.
    } else if self.match_kind(TokenKind::Var) {
      self.var_declaration();
    } else {
      self.expression_statement();
    }

    let mut loop_start = self.current_chunk().len();

    let mut exit_jump: Option<usize> = None;
    if !self.match_kind(TokenKind::Semicolon) {
      self.expression();
      self.consume(TokenKind::Semicolon, "Expect ';' after loop condition");
      exit_jump = Some(self.emit_jump(OpCode::JumpIfFalse));
      self.emit_op(OpCode::Pop);
    }

    if !self.match_kind(TokenKind::RightParen) {
      let jump_body = self.emit_jump(OpCode::Jump);
      let increment_start = self.current_chunk().len();
      self.expression();
      self.emit_op(OpCode::Pop);
      self.consume(TokenKind::RightParen, "Expect ')' after for clauses");

      self.emit_loop(loop_start);
      loop_start = increment_start;
      self.patch_jump(jump_body);
    }

    self.statement();
    self.emit_loop(loop_start);

    if let Some(exit_jump) = exit_jump {
      self.patch_jump(exit_jump);
      self.emit_op(OpCode::Pop);
    }
    self.end_scope();
  }

  fn synchronize(&mut self) {
    self.parser.panic_mode = false;
    while self.parser.current.kind != TokenKind::Eof {
      if self.parser.previous.kind == TokenKind::Semicolon {
        return;
      }
      match self.parser.current.kind {
        TokenKind::Class
        | TokenKind::Fun
        | TokenKind::Var
        | TokenKind::Val
        | TokenKind::For
        | TokenKind::If
        | TokenKind::While
        | TokenKind::Print
        | TokenKind::Return => return,
        _ => {}
      }
      self.advance();
    }
  }
}

/// Compiles `source` into a completed top-level function, or the list of
/// diagnostics collected along the way.
pub fn compile(source: &str) -> Result<FunctionObject, Vec<Diagnostic>> {
  Compiler::new(source).run()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ops(source: &str) -> Vec<OpCode> {
    let function = compile(source).expect("source should compile");
    let chunk = &function.chunk;
    let mut idx = 0;
    let mut out = Vec::new();
    while idx < chunk.len() {
      let op = chunk.op_at(idx).expect("every byte at an opcode position decodes");
      out.push(op);
      idx += 1 + op.operand_len();
    }
    out
  }

  #[test]
  fn simple_expression_statement() {
    assert_eq!(
      ops("3 + 2;"),
      vec![
        OpCode::Constant,
        OpCode::Constant,
        OpCode::Add,
        OpCode::Pop,
        OpCode::Nil,
        OpCode::Return,
      ]
    );
  }

  #[test]
  fn multiplication_binds_tighter_than_addition() {
    assert_eq!(
      ops("1 + 2 * 3;"),
      vec![
        OpCode::Constant,
        OpCode::Constant,
        OpCode::Constant,
        OpCode::Multiply,
        OpCode::Add,
        OpCode::Pop,
        OpCode::Nil,
        OpCode::Return,
      ]
    );
  }

  #[test]
  fn grouping_overrides_precedence() {
    assert_eq!(
      ops("(1 + 2) * 3;"),
      vec![
        OpCode::Constant,
        OpCode::Constant,
        OpCode::Add,
        OpCode::Constant,
        OpCode::Multiply,
        OpCode::Pop,
        OpCode::Nil,
        OpCode::Return,
      ]
    );
  }

  #[test]
  fn equality_after_multiplication() {
    assert_eq!(
      ops("12 == 6 * 2;"),
      vec![
        OpCode::Constant,
        OpCode::Constant,
        OpCode::Constant,
        OpCode::Multiply,
        OpCode::Equal,
        OpCode::Pop,
        OpCode::Nil,
        OpCode::Return,
      ]
    );
  }

  #[test]
  fn if_else_both_branches_reachable() {
    assert_eq!(
      ops("if (true) print 1; else print 2;"),
      vec![
        OpCode::True,
        OpCode::JumpIfFalse,
        OpCode::Pop,
        OpCode::Constant,
        OpCode::Print,
        OpCode::Jump,
        OpCode::Pop,
        OpCode::Constant,
        OpCode::Print,
        OpCode::Nil,
        OpCode::Return,
      ]
    );
  }

  #[test]
  fn while_loop_emits_exactly_one_loop_instruction() {
    let function = compile("var i = 0; while (i < 3) i = i + 1;").expect("should compile");
    let chunk = &function.chunk;
    let mut idx = 0;
    let mut loop_sites = Vec::new();
    while idx < chunk.len() {
      let op = chunk.op_at(idx).expect("valid opcode");
      if op == OpCode::Loop {
        loop_sites.push(idx);
      }
      idx += 1 + op.operand_len();
    }
    assert_eq!(loop_sites.len(), 1);
  }

  #[test]
  fn val_without_initializer_is_an_error() {
    assert!(compile("val x;").is_err());
  }

  #[test]
  fn reassigning_immutable_global_is_an_error() {
    assert!(compile("val x = 1; x = 2;").is_err());
  }

  #[test]
  fn reassigning_immutable_local_is_an_error() {
    assert!(compile("{ val x = 1; x = 2; }").is_err());
  }

  #[test]
  fn reading_local_in_its_own_initializer_is_an_error() {
    assert!(compile("{ var a = a; }").is_err());
  }

  #[test]
  fn returning_from_top_level_is_an_error() {
    assert!(compile("return 1;").is_err());
  }

  #[test]
  fn missing_expression_is_an_error() {
    assert!(compile("1 + ;").is_err());
  }

  #[test]
  fn invalid_assignment_target_is_an_error() {
    assert!(compile("a + b = c;").is_err());
  }

  #[test]
  fn recursive_function_can_call_itself() {
    let source = "fun fact(n) { if (n) return n * fact(n - 1); return 1; }";
    assert!(compile(source).is_ok());
  }

  #[test]
  fn two_hundred_fifty_six_constants_compile_and_the_next_errors() {
    let mut source = String::new();
    for i in 0..256 {
      source.push_str(&format!("print {};\n", i));
    }
    assert!(compile(&source).is_ok());

    source.push_str("print 256;\n");
    assert!(compile(&source).is_err());
  }

  #[test]
  fn two_hundred_fifty_six_locals_compile_and_the_next_errors() {
    let mut source = String::from("{\n");
    for i in 0..256 {
      source.push_str(&format!("var v{} = {};\n", i, i));
    }
    source.push_str("}\n");
    assert!(compile(&source).is_ok());

    source = String::from("{\n");
    for i in 0..257 {
      source.push_str(&format!("var v{} = {};\n", i, i));
    }
    source.push_str("}\n");
    assert!(compile(&source).is_err());
  }

  #[test]
  fn same_content_string_literals_share_one_constant_handle() {
    let function = compile("\"hi\"; \"hi\";").expect("should compile");
    let mut handles = Vec::new();
    for value in function.chunk.constants() {
      if let Value::Obj(obj) = value {
        if matches!(&**obj, Object::Str(_)) {
          handles.push(obj.clone());
        }
      }
    }
    assert_eq!(handles.len(), 2);
    assert!(handles[0].ptr_eq(&handles[1]));
  }
}
