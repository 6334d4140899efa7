//! Statement driver (C5) and the postfix-to-gate reducer (§4.6).
//!
//! `Compiler` reads a source file line by line, dispatching `input`,
//! `constant`, `include`, and `func` statements, and owns the symbol
//! table and shared gate arena for the whole compilation. `compile`/
//! `compile_file` are the two public entry points; both end by running
//! the constant relocation pass and handing back a frozen [`Program`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::debug;

use crate::circuit::Circuit;
use crate::error::{Error, Result};
use crate::gate::{GateDag, OpKind};
use crate::parser;
use crate::program::Program;
use crate::symbol::{Function, FunctionBody, Symbol, SymbolTable};
use crate::token::Token;

pub struct Compiler {
    symbols: SymbolTable,
    dag: Rc<GateDag>,
    next_var_input: usize,
    next_const_input: usize,
    circuits: HashMap<String, Circuit>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Compiler {
            symbols: SymbolTable::new(),
            dag: GateDag::new(),
            next_var_input: 0,
            next_const_input: 0,
            circuits: HashMap::new(),
        }
    }

    /// Compiles `source` against `base_dir` (used to resolve `include`
    /// paths). May be called more than once on the same `Compiler`
    /// (that's how `include` recurses) — relocation only happens once,
    /// in [`Compiler::finish`].
    pub fn compile_source(&mut self, source: &str, base_dir: &Path) -> Result<()> {
        for line in join_continuations(source) {
            self.compile_line(&line, base_dir)?;
        }
        Ok(())
    }

    pub fn compile_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Syntax(format!("cannot read '{}': {e}", path.display())))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        self.compile_source(&content, base_dir)
    }

    /// Runs the end-of-compilation constant relocation pass and freezes
    /// the result into a [`Program`].
    pub fn finish(mut self) -> Result<Program> {
        self.relocate_constants()?;
        Ok(Program::new(
            self.circuits,
            self.symbols,
            self.next_var_input,
            self.next_const_input,
        ))
    }

    fn relocate_constants(&mut self) -> Result<()> {
        let var_count = self.next_var_input;
        let names: Vec<String> = self.symbols.constant_names().to_vec();
        for name in names {
            let (gate, tentative) = match self.symbols.get(&name) {
                Some(Symbol::Constant(c)) => (c.gate, c.input_index),
                _ => return Err(Error::Internal(format!("'{name}' is not a constant"))),
            };
            let new_index = var_count + tentative;
            self.dag.relocate_input(gate, new_index)?;
            if let Some(Symbol::Constant(c)) = self.symbols.get_mut(&name) {
                c.input_index = new_index;
            }
        }
        Ok(())
    }

    fn compile_line(&mut self, line: &str, base_dir: &Path) -> Result<()> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(());
        }

        let mut parts = trimmed.splitn(2, char::is_whitespace);
        let keyword = parts.next().unwrap_or("");
        let rest = parts.next().unwrap_or("").trim();

        debug!("statement: {keyword} {rest}");

        match keyword {
            "input" => self.statement_input(rest),
            "constant" => self.statement_constant(rest),
            "include" => self.statement_include(rest, base_dir),
            "func" => self.statement_func(rest),
            other => Err(Error::Syntax(format!("unknown statement '{other}'"))),
        }
    }

    fn statement_input(&mut self, rest: &str) -> Result<()> {
        let (name, len) = match rest.split_once(':') {
            Some((name, len)) => {
                let len: usize = len
                    .trim()
                    .parse()
                    .map_err(|_| Error::Syntax(format!("invalid input length '{len}'")))?;
                (name.trim(), len)
            }
            None => (rest.trim(), 1),
        };
        if name.is_empty() {
            return Err(Error::Syntax("input statement missing a name".to_string()));
        }

        let base = self.next_var_input;
        let mut gates = Vec::with_capacity(len);
        for i in 0..len {
            gates.push(self.dag.new_input(base + i));
        }
        self.next_var_input += len;
        self.symbols.declare_variable(name, base, gates)
    }

    fn statement_constant(&mut self, rest: &str) -> Result<()> {
        let (name, value) = rest
            .split_once('=')
            .ok_or_else(|| Error::Syntax("constant statement needs '='".to_string()))?;
        let name = name.trim();
        let value: i64 = value
            .trim()
            .parse()
            .map_err(|_| Error::Syntax(format!("invalid constant value '{value}'")))?;

        let tentative = self.next_const_input;
        self.next_const_input += 1;
        let gate = self.dag.new_input(tentative);
        self.symbols.declare_constant(name, tentative, gate, value)
    }

    fn statement_include(&mut self, rest: &str, base_dir: &Path) -> Result<()> {
        let path_str = rest
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .ok_or_else(|| Error::Syntax("include path must be quoted".to_string()))?;
        let full_path: PathBuf = base_dir.join(path_str);
        self.compile_file(&full_path)
    }

    fn statement_func(&mut self, rest: &str) -> Result<()> {
        let eq_pos = rest
            .find('=')
            .ok_or_else(|| Error::Syntax("func statement needs '='".to_string()))?;
        let (head, expr) = rest.split_at(eq_pos);
        let expr = expr[1..].trim();
        let head = head.trim();

        let (name, params) = if let Some(paren_pos) = head.find('(') {
            if !head.ends_with(')') {
                return Err(Error::Syntax("unterminated parameter list".to_string()));
            }
            let name = head[..paren_pos].trim();
            let param_spec = &head[paren_pos + 1..head.len() - 1];
            (name, parse_param_list(param_spec)?)
        } else {
            (head, Vec::new())
        };

        if name.is_empty() {
            return Err(Error::Syntax("func statement missing a name".to_string()));
        }

        let tokens = parser::parse_expression(
            expr,
            &params,
            &mut self.symbols,
            &self.dag,
            &mut self.next_var_input,
        )?;

        if params.is_empty() {
            let root = reduce_postfix(&self.dag, &tokens)?;
            self.symbols.declare_function(
                name,
                Function {
                    params,
                    body: FunctionBody::Gate(root),
                },
            )?;
            self.circuits
                .insert(name.to_string(), Circuit::new(self.dag.clone(), root));
        } else {
            self.symbols.declare_function(
                name,
                Function {
                    params,
                    body: FunctionBody::Tokens(tokens),
                },
            )?;
        }

        Ok(())
    }
}

/// Expands a `func` parameter spec (`a, b:3, c`) into the flattened list
/// of formal parameter names (`a`, `b[0]`, `b[1]`, `b[2]`, `c`).
fn parse_param_list(spec: &str) -> Result<Vec<String>> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Ok(Vec::new());
    }
    let mut params = Vec::new();
    for part in spec.split(',') {
        let part = part.trim();
        match part.split_once(':') {
            Some((name, len)) => {
                let len: usize = len
                    .trim()
                    .parse()
                    .map_err(|_| Error::Syntax(format!("invalid parameter length '{len}'")))?;
                let name = name.trim();
                for i in 0..len {
                    params.push(format!("{name}[{i}]"));
                }
            }
            None => params.push(part.to_string()),
        }
    }
    Ok(params)
}

/// Joins backslash-continued lines into single logical lines.
fn join_continuations(source: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut acc = String::new();
    for line in source.lines() {
        match line.strip_suffix('\\') {
            Some(stripped) => acc.push_str(stripped),
            None => {
                acc.push_str(line);
                result.push(std::mem::take(&mut acc));
            }
        }
    }
    if !acc.is_empty() {
        result.push(acc);
    }
    result
}

/// Reduces a postfix token stream to a single root gate index, allocating
/// directly into `dag` (no intermediate pointer tree). Tokens are
/// consumed from the back, recursively: popping an operator first
/// recurses for its right operand, then its left, because that's the
/// order a reversed postfix scan yields them.
pub fn reduce_postfix(dag: &Rc<GateDag>, tokens: &[Token]) -> Result<usize> {
    let mut remaining: Vec<Token> = tokens.to_vec();
    let root = reduce_rec(dag, &mut remaining)?;
    if !remaining.is_empty() {
        return Err(Error::Syntax(
            "malformed expression: leftover operands".to_string(),
        ));
    }
    Ok(root)
}

fn reduce_rec(dag: &Rc<GateDag>, remaining: &mut Vec<Token>) -> Result<usize> {
    let token = remaining
        .pop()
        .ok_or_else(|| Error::Syntax("postfix underflow".to_string()))?;
    match token {
        Token::Operand(g) | Token::Circuit(g) => Ok(g),
        Token::Mul | Token::Add => {
            let op = if matches!(token, Token::Mul) {
                OpKind::Mul
            } else {
                OpKind::Add
            };
            let right = reduce_rec(dag, remaining)?;
            let left = reduce_rec(dag, remaining)?;
            dag.new_op(op, left, right)
        }
        Token::Argument(name) => Err(Error::Internal(format!(
            "unresolved argument '{name}' reached the gate builder"
        ))),
        Token::Function(_, _) => Err(Error::Internal(
            "function token reached the gate builder".to_string(),
        )),
        Token::LParen | Token::RParen => Err(Error::Internal(
            "parenthesis token reached the gate builder".to_string(),
        )),
    }
}

/// Compiles a complete SCDL program from an in-memory string, with
/// `include` paths resolved relative to the current directory.
pub fn compile(source: &str) -> Result<Program> {
    let mut compiler = Compiler::new();
    compiler.compile_source(source, Path::new("."))?;
    compiler.finish()
}

/// Compiles a complete SCDL program from a file on disk, with `include`
/// paths resolved relative to that file's directory.
pub fn compile_file(path: &Path) -> Result<Program> {
    let mut compiler = Compiler::new();
    compiler.compile_file(path)?;
    compiler.finish()
}
