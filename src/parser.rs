//! Expression parser (C4): shunting-yard conversion of an expression
//! string into a postfix token stream, resolving identifiers against the
//! symbol table and inlining parameterized function calls by token
//! splicing.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::gate::GateDag;
use crate::symbol::{FunctionBody, Symbol, SymbolTable};
use crate::token::Token;

const SPECIAL_CHARS: [char; 7] = ['(', ')', '*', '+', ';', '[', ']'];

fn is_special(c: char) -> bool {
    SPECIAL_CHARS.contains(&c) || c == ','
}

/// Parses `expr` in the scope of `params` (the formal parameter names
/// visible as `Token::Argument` references; empty for a top-level closed
/// function), resolving free identifiers against `symbols` and allocating
/// freshly auto-declared inputs into `dag`, bumping `next_var_input`.
///
/// Returns the expression's postfix token stream.
pub fn parse_expression(
    expr: &str,
    params: &[String],
    symbols: &mut SymbolTable,
    dag: &Rc<GateDag>,
    next_var_input: &mut usize,
) -> Result<Vec<Token>> {
    let chars: Vec<char> = expr.chars().chain(std::iter::once(';')).collect();
    let mut pos = 0usize;
    let mut output: Vec<Token> = Vec::new();
    let mut op_stack: Vec<Token> = Vec::new();
    let mut ident = String::new();

    while pos < chars.len() {
        let c = chars[pos];

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        if is_special(c) {
            if !ident.is_empty() {
                let name = std::mem::take(&mut ident);
                resolve_identifier(&name, &mut pos, &chars, params, symbols, dag, next_var_input, &mut output)?;
                continue;
            }
            match c {
                '(' => {
                    op_stack.push(Token::LParen);
                    pos += 1;
                }
                ')' => {
                    pop_to_lparen(&mut op_stack, &mut output)?;
                    pos += 1;
                }
                '*' => {
                    push_operator(Token::Mul, &mut op_stack, &mut output);
                    pos += 1;
                }
                '+' => {
                    push_operator(Token::Add, &mut op_stack, &mut output);
                    pos += 1;
                }
                ';' => {
                    pos += 1;
                }
                other => {
                    return Err(Error::Syntax(format!("unexpected '{other}'")));
                }
            }
        } else {
            ident.push(c);
            pos += 1;
        }
    }

    while let Some(tok) = op_stack.pop() {
        match tok {
            Token::LParen | Token::RParen => {
                return Err(Error::Syntax("mismatched parentheses".to_string()))
            }
            other => output.push(other),
        }
    }

    Ok(output)
}

fn push_operator(new_op: Token, op_stack: &mut Vec<Token>, output: &mut Vec<Token>) {
    while let Some(top) = op_stack.last() {
        match top {
            Token::Add | Token::Mul => output.push(op_stack.pop().unwrap()),
            _ => break,
        }
    }
    op_stack.push(new_op);
}

fn pop_to_lparen(op_stack: &mut Vec<Token>, output: &mut Vec<Token>) -> Result<()> {
    loop {
        match op_stack.pop() {
            Some(Token::LParen) => return Ok(()),
            Some(other) => output.push(other),
            None => return Err(Error::Syntax("mismatched parentheses".to_string())),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_identifier(
    name: &str,
    pos: &mut usize,
    chars: &[char],
    params: &[String],
    symbols: &mut SymbolTable,
    dag: &Rc<GateDag>,
    next_var_input: &mut usize,
    output: &mut Vec<Token>,
) -> Result<()> {
    let terminator = chars[*pos];

    if terminator == '[' {
        let (idx, new_pos) = parse_bracket_index(chars, *pos)?;
        let candidate = format!("{name}[{idx}]");
        if params.iter().any(|p| p == &candidate) {
            output.push(Token::Argument(candidate));
            *pos = new_pos;
            return Ok(());
        }

        match symbols.get(name) {
            Some(Symbol::Variable(v)) => {
                let gate = v.gate_index(idx)?;
                output.push(Token::Operand(gate));
                *pos = new_pos;
                Ok(())
            }
            _ => Err(Error::Unknown(name.to_string())),
        }
    } else if terminator == '(' {
        let (arg_strs, new_pos) = parse_arg_list(chars, *pos)?;
        *pos = new_pos;
        inline_function_call(name, &arg_strs, params, symbols, dag, next_var_input, output)
    } else {
        if params.iter().any(|p| p == name) {
            output.push(Token::Argument(name.to_string()));
            return Ok(());
        }

        match symbols.get(name) {
            Some(Symbol::Variable(v)) => {
                if v.len > 1 {
                    return Err(Error::Syntax(format!(
                        "'{name}' is an array and must be indexed"
                    )));
                }
                let gate = v.gate_index(0)?;
                output.push(Token::Operand(gate));
                Ok(())
            }
            Some(Symbol::Constant(c)) => {
                output.push(Token::Operand(c.gate));
                Ok(())
            }
            Some(Symbol::Function(f)) => {
                if f.arity() != 0 {
                    return Err(Error::Arity {
                        name: name.to_string(),
                        expected: f.arity(),
                        got: 0,
                    });
                }
                match &f.body {
                    FunctionBody::Gate(g) => {
                        output.push(Token::Circuit(*g));
                        Ok(())
                    }
                    FunctionBody::Tokens(_) => Err(Error::Internal(format!(
                        "closed function '{name}' was never lowered to a gate"
                    ))),
                }
            }
            None => {
                let input_index = *next_var_input;
                *next_var_input += 1;
                debug!("auto-declaring '{name}' as input {input_index}");
                let gate = dag.new_input(input_index);
                symbols.declare_variable(name, input_index, vec![gate])?;
                output.push(Token::Operand(gate));
                Ok(())
            }
        }
    }
}

/// Parses a `[` *digits* `]` suffix starting at `chars[pos]` (which must be
/// `[`). Returns the parsed index and the position just past `]`.
fn parse_bracket_index(chars: &[char], pos: usize) -> Result<(usize, usize)> {
    debug_assert_eq!(chars[pos], '[');
    let mut p = pos + 1;
    let mut digits = String::new();
    while p < chars.len() && chars[p].is_ascii_digit() {
        digits.push(chars[p]);
        p += 1;
    }
    if digits.is_empty() {
        return Err(Error::Syntax("expected array index".to_string()));
    }
    if p >= chars.len() || chars[p] != ']' {
        return Err(Error::Syntax("missing ']'".to_string()));
    }
    let idx: usize = digits
        .parse()
        .map_err(|_| Error::Syntax(format!("invalid array index '{digits}'")))?;
    Ok((idx, p + 1))
}

/// Parses a parenthesized, comma-separated argument list starting at
/// `chars[pos]` (which must be `(`), honoring nested parentheses. Returns
/// the (possibly empty) list of raw argument expression strings and the
/// position just past the matching `)`.
fn parse_arg_list(chars: &[char], pos: usize) -> Result<(Vec<String>, usize)> {
    debug_assert_eq!(chars[pos], '(');
    let mut depth = 0i32;
    let mut p = pos;
    let mut buf = String::new();
    let mut args = Vec::new();

    loop {
        if p >= chars.len() {
            return Err(Error::Syntax("unterminated function call".to_string()));
        }
        let c = chars[p];
        match c {
            '(' => {
                depth += 1;
                if depth > 1 {
                    buf.push(c);
                }
                p += 1;
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    if !buf.trim().is_empty() || !args.is_empty() {
                        args.push(buf.trim().to_string());
                    }
                    p += 1;
                    break;
                }
                buf.push(c);
                p += 1;
            }
            ',' if depth == 1 => {
                args.push(buf.trim().to_string());
                buf.clear();
                p += 1;
            }
            _ => {
                buf.push(c);
                p += 1;
            }
        }
    }

    Ok((args, p))
}

#[allow(clippy::too_many_arguments)]
fn inline_function_call(
    name: &str,
    arg_strs: &[String],
    caller_params: &[String],
    symbols: &mut SymbolTable,
    dag: &Rc<GateDag>,
    next_var_input: &mut usize,
    output: &mut Vec<Token>,
) -> Result<()> {
    let function = match symbols.get(name) {
        Some(Symbol::Function(f)) => f.clone(),
        Some(_) | None => return Err(Error::Unknown(name.to_string())),
    };
    trace!("inlining call to '{name}' with {} argument(s)", arg_strs.len());

    let mut expanded_args: Vec<String> = Vec::new();
    for arg in arg_strs {
        let trimmed = arg.trim();
        if let Some(Symbol::Variable(v)) = symbols.get(trimmed) {
            if v.len > 1 {
                for i in 0..v.len {
                    expanded_args.push(format!("{trimmed}[{i}]"));
                }
                continue;
            }
        }
        expanded_args.push(trimmed.to_string());
    }

    if expanded_args.len() != function.arity() {
        return Err(Error::Arity {
            name: name.to_string(),
            expected: function.arity(),
            got: expanded_args.len(),
        });
    }

    let mut bound: HashMap<String, Vec<Token>> = HashMap::new();
    for (param_name, arg_expr) in function.params.iter().zip(expanded_args.iter()) {
        let arg_tokens = parse_expression(arg_expr, caller_params, symbols, dag, next_var_input)?;
        bound.insert(param_name.clone(), arg_tokens);
    }

    let body_tokens = match &function.body {
        FunctionBody::Tokens(tokens) => tokens,
        FunctionBody::Gate(_) => {
            return Err(Error::Internal(format!(
                "function '{name}' has arguments but no stored token stream"
            )))
        }
    };

    for token in body_tokens {
        match token {
            Token::Argument(param) => {
                let bound_tokens = bound.get(param).ok_or_else(|| {
                    Error::Internal(format!("unbound parameter '{param}' in function '{name}'"))
                })?;
                output.extend(bound_tokens.iter().cloned());
            }
            other => output.push(other.clone()),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{Function, FunctionBody};

    fn fresh() -> (SymbolTable, Rc<GateDag>, usize) {
        (SymbolTable::new(), GateDag::new(), 0usize)
    }

    #[test]
    fn equal_precedence_is_left_associative() {
        let (mut symbols, dag, mut next) = fresh();
        let tokens = parse_expression("a*b+a", &[], &mut symbols, &dag, &mut next).unwrap();
        // a b * a +  (postfix)
        assert!(matches!(tokens[0], Token::Operand(_)));
        assert!(matches!(tokens[1], Token::Operand(_)));
        assert!(matches!(tokens[2], Token::Mul));
        assert!(matches!(tokens[3], Token::Operand(_)));
        assert!(matches!(tokens[4], Token::Add));
    }

    #[test]
    fn parentheses_override_left_to_right_grouping() {
        let (mut symbols, dag, mut next) = fresh();
        let tokens = parse_expression("a*(b+a)", &[], &mut symbols, &dag, &mut next).unwrap();
        assert!(matches!(tokens[0], Token::Operand(_)));
        assert!(matches!(tokens[1], Token::Operand(_)));
        assert!(matches!(tokens[2], Token::Operand(_)));
        assert!(matches!(tokens[3], Token::Add));
        assert!(matches!(tokens[4], Token::Mul));
    }

    #[test]
    fn unresolved_identifier_auto_declares_input() {
        let (mut symbols, dag, mut next) = fresh();
        parse_expression("x", &[], &mut symbols, &dag, &mut next).unwrap();
        assert!(symbols.contains("x"));
        assert_eq!(next, 1);
    }

    #[test]
    fn array_element_reads_declared_variable() {
        let (mut symbols, dag, _next) = fresh();
        let g0 = dag.new_input(0);
        let g1 = dag.new_input(1);
        symbols.declare_variable("x", 0, vec![g0, g1]).unwrap();
        let mut next = 2usize;
        let tokens = parse_expression("x[1]", &[], &mut symbols, &dag, &mut next).unwrap();
        assert!(matches!(tokens[0], Token::Operand(idx) if idx == g1));
    }

    #[test]
    fn array_index_out_of_bounds_is_rejected() {
        let (mut symbols, dag, _next) = fresh();
        let g0 = dag.new_input(0);
        symbols.declare_variable("x", 0, vec![g0]).unwrap();
        let mut next = 1usize;
        let err = parse_expression("x[5]", &[], &mut symbols, &dag, &mut next);
        assert!(matches!(err, Err(Error::Bounds(_))));
    }

    #[test]
    fn zero_param_function_call_emits_circuit_token() {
        let (mut symbols, dag, _next) = fresh();
        let g = dag.new_input(0);
        symbols
            .declare_function(
                "f",
                Function {
                    params: vec![],
                    body: FunctionBody::Gate(g),
                },
            )
            .unwrap();
        let mut next = 1usize;
        let tokens = parse_expression("f", &[], &mut symbols, &dag, &mut next).unwrap();
        assert!(matches!(tokens[0], Token::Circuit(idx) if idx == g));
    }

    #[test]
    fn parameterized_call_inlines_and_expands_array_arguments() {
        let (mut symbols, dag, _next) = fresh();
        // func and(x,y) = x*y
        let and_fn = Function {
            params: vec!["x".to_string(), "y".to_string()],
            body: FunctionBody::Tokens(vec![
                Token::Argument("x".to_string()),
                Token::Argument("y".to_string()),
                Token::Mul,
            ]),
        };
        symbols.declare_function("and", and_fn).unwrap();

        let ga = dag.new_input(0);
        let gb = dag.new_input(1);
        symbols.declare_variable("a", 0, vec![ga]).unwrap();
        symbols.declare_variable("b", 1, vec![gb]).unwrap();
        let mut next = 2usize;

        let tokens = parse_expression("and(a,b)", &[], &mut symbols, &dag, &mut next).unwrap();
        assert!(matches!(tokens[0], Token::Operand(idx) if idx == ga));
        assert!(matches!(tokens[1], Token::Operand(idx) if idx == gb));
        assert!(matches!(tokens[2], Token::Mul));
    }

    #[test]
    fn call_with_wrong_arity_is_an_error() {
        let (mut symbols, dag, _next) = fresh();
        let and_fn = Function {
            params: vec!["x".to_string(), "y".to_string()],
            body: FunctionBody::Tokens(vec![
                Token::Argument("x".to_string()),
                Token::Argument("y".to_string()),
                Token::Mul,
            ]),
        };
        symbols.declare_function("and", and_fn).unwrap();
        let ga = dag.new_input(0);
        symbols.declare_variable("a", 0, vec![ga]).unwrap();
        let mut next = 1usize;

        let err = parse_expression("and(a)", &[], &mut symbols, &dag, &mut next);
        assert!(matches!(err, Err(Error::Arity { .. })));
    }
}
