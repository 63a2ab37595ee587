use log::{debug, trace};

use crate::ast::{ASTNode, Expression, Function, Prototype};
use crate::lexer::{Lexer, Token};
use crate::precedence::BinopPrecedence;

/// how deeply parentheses and call arguments may nest before parsing gives up
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum ParserError {
    #[error("expected {expected}, got {found} instead")]
    UnexpectedToken { expected: &'static str, found: Token },
    #[error("expression nesting exceeds the limit of {limit}")]
    NestingTooDeep { limit: usize },
}

pub type ParseResult<T> = Result<T, ParserError>;

/// one parsing session: the lexer, one token of lookahead and the operator table.
///
/// nothing is shared between sessions, so independent parses never interfere.
/// a failed parse leaves the offending token as the current token; callers
/// that keep going must advance past it themselves.
pub struct Parser<I: Iterator<Item = char>> {
    lexer: Lexer<I>,
    current: Token,
    pub operator_precedence: BinopPrecedence,
    max_depth: usize,
    depth: usize,
}

impl<'a> Parser<std::str::Chars<'a>> {
    /// a session over an in-memory source, already positioned on its first token
    pub fn from_source(source: &'a str) -> Self {
        let mut parser = Parser::new(source.chars());
        parser.advance_token();
        parser
    }

    pub fn parse_str(source: &'a str) -> ParseResult<Vec<ASTNode>> {
        Parser::from_source(source).parse_program()
    }
}

impl<I: Iterator<Item = char>> Parser<I> {
    /// creates a session without reading anything yet - the current token is
    /// `Eof` until the first call to `advance_token`
    pub fn new(input: I) -> Self {
        Self {
            lexer: Lexer::new(input),
            current: Token::Eof,
            operator_precedence: BinopPrecedence::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            depth: 0,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn current_token(&self) -> &Token {
        &self.current
    }

    pub fn advance_token(&mut self) -> &Token {
        self.current = self.lexer.next_token();
        &self.current
    }

    fn unexpected(&self, expected: &'static str) -> ParserError {
        ParserError::UnexpectedToken {
            expected,
            found: self.current.clone(),
        }
    }

    fn expect_char(&mut self, c: char, expected: &'static str) -> ParseResult<()> {
        if !self.current.is_char(c) {
            return Err(self.unexpected(expected));
        }
        self.advance_token();
        Ok(())
    }

    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= self.max_depth {
            return Err(ParserError::NestingTooDeep {
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        let res = parse(self);
        self.depth -= 1;
        res
    }

    fn parse_number(&mut self, value: f64) -> ParseResult<Expression> {
        self.advance_token();
        Ok(Expression::Literal(value))
    }

    fn parse_nested(&mut self) -> ParseResult<Expression> {
        self.advance_token(); // consume '('
        let res = self.nested(Self::parse_expression)?;
        self.expect_char(')', "')'")?;
        Ok(res)
    }

    fn parse_identifier(&mut self, ident: String) -> ParseResult<Expression> {
        self.advance_token();

        if !self.current.is_char('(') {
            return Ok(Expression::Variable(ident));
        }
        self.advance_token();

        let mut args = Vec::new();
        if !self.current.is_char(')') {
            loop {
                args.push(self.nested(Self::parse_expression)?);

                if self.current.is_char(')') {
                    break;
                }
                if !self.current.is_char(',') {
                    return Err(self.unexpected("')' or ',' in argument list"));
                }
                self.advance_token();
            }
        }
        self.advance_token(); // consume ')'

        Ok(Expression::Call(ident, args))
    }

    fn parse_primary(&mut self) -> ParseResult<Expression> {
        match &self.current {
            Token::Number(value) => {
                let value = *value;
                self.parse_number(value)
            }
            Token::Ident(ident) => {
                let ident = ident.clone();
                self.parse_identifier(ident)
            }
            Token::Char('(') => self.parse_nested(),
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_rhs(&mut self, expr_precedence: i32, lhs: Expression) -> ParseResult<Expression> {
        let mut result = lhs;

        loop {
            let precedence = self.operator_precedence.of(&self.current);
            if precedence < expr_precedence {
                return Ok(result);
            }

            let operator = match self.current {
                Token::Char(op) => op,
                _ => unreachable!("only literal characters carry a precedence"),
            };
            debug_assert!(self.operator_precedence.is_operator(operator));
            self.advance_token();

            let mut rhs = self.parse_primary()?;

            // an operator after rhs that binds tighter takes rhs as its own lhs
            let next_precedence = self.operator_precedence.of(&self.current);
            if precedence < next_precedence {
                rhs = self.parse_rhs(precedence + 1, rhs)?;
            }

            result = Expression::binary(operator, result, rhs);
        }
    }

    pub fn parse_expression(&mut self) -> ParseResult<Expression> {
        let lhs = self.parse_primary()?;
        self.parse_rhs(0, lhs)
    }

    /// `name(arg arg ...)` - arguments are whitespace separated, not comma separated,
    /// and repeated names are accepted as written
    pub fn parse_prototype(&mut self) -> ParseResult<Prototype> {
        let name = match &self.current {
            Token::Ident(name) => name.clone(),
            _ => return Err(self.unexpected("function name in prototype")),
        };
        self.advance_token();
        if !self.current.is_char('(') {
            return Err(self.unexpected("'(' in prototype"));
        }

        let mut args = Vec::new();
        while let Token::Ident(arg) = self.advance_token() {
            args.push(arg.clone());
        }
        self.expect_char(')', "')' in prototype")?;

        Ok(Prototype { name, args })
    }

    pub fn parse_definition(&mut self) -> ParseResult<Function> {
        self.advance_token(); // consume 'def'
        let prototype = self.parse_prototype()?;
        let body = self.parse_expression()?;
        debug!("parsed definition of {}", prototype.name);
        Ok(Function { prototype, body })
    }

    pub fn parse_extern(&mut self) -> ParseResult<Prototype> {
        self.advance_token(); // consume 'extern'
        let prototype = self.parse_prototype()?;
        debug!("parsed extern {}", prototype.name);
        Ok(prototype)
    }

    pub fn parse_top_level_expr(&mut self) -> ParseResult<Function> {
        let body = self.parse_expression()?;
        debug!("parsed top-level expression");
        Ok(Function::anonymous(body))
    }

    /// parses every item up to end of input, skipping stray `;` and stopping at
    /// the first error
    pub fn parse_program(&mut self) -> ParseResult<Vec<ASTNode>> {
        let mut ast = Vec::new();

        loop {
            let node = match self.current {
                Token::Eof => break,
                Token::Char(';') => {
                    trace!("skipping top-level ';'");
                    self.advance_token();
                    continue;
                }
                Token::Def => ASTNode::Function(self.parse_definition()?),
                Token::Extern => ASTNode::Extern(self.parse_extern()?),
                _ => ASTNode::Function(self.parse_top_level_expr()?),
            };
            ast.push(node);
        }

        Ok(ast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn num(value: f64) -> Expression {
        Expression::Literal(value)
    }

    fn var(name: &str) -> Expression {
        Expression::Variable(name.to_string())
    }

    fn parse_expr(input: &str) -> ParseResult<Expression> {
        Parser::from_source(input).parse_expression()
    }

    #[test]
    fn parse_expr_works() {
        let res = parse_expr("x + 1 * (2 - 3)").unwrap();
        let target = Expression::binary(
            '+',
            var("x"),
            Expression::binary('*', num(1.0), Expression::binary('-', num(2.0), num(3.0))),
        );
        assert_eq!(res, target);
    }

    #[test]
    fn multiplication_binds_tighter() {
        let res = parse_expr("1+2*3").unwrap();
        let target = Expression::binary('+', num(1.0), Expression::binary('*', num(2.0), num(3.0)));
        assert_eq!(res, target);
    }

    #[test]
    fn equal_precedence_is_left_associative() {
        let res = parse_expr("1-2-3").unwrap();
        let target = Expression::binary('-', Expression::binary('-', num(1.0), num(2.0)), num(3.0));
        assert_eq!(res, target);
    }

    #[test]
    fn mixed_precedence_levels() {
        let res = parse_expr("a<b+c*d-e/f").unwrap();
        assert_eq!(res.to_string(), "(< a (- (+ b (* c d)) (/ e f)))");
        let res = parse_expr("a*b+c").unwrap();
        assert_eq!(res.to_string(), "(+ (* a b) c)");
    }

    #[test]
    fn parens_do_not_appear_in_ast() {
        assert_eq!(parse_expr("((x))").unwrap(), var("x"));
    }

    #[test]
    fn calls_and_variables() {
        assert_eq!(
            parse_expr("foo(1,2)").unwrap(),
            Expression::Call("foo".to_string(), vec![num(1.0), num(2.0)])
        );
        assert_eq!(
            parse_expr("foo()").unwrap(),
            Expression::Call("foo".to_string(), vec![])
        );
        assert_eq!(
            parse_expr("f(g(x), y+1)").unwrap().to_string(),
            "(call f (call g x) (+ y 1))"
        );
        assert_eq!(parse_expr("foo (").unwrap_err(), ParserError::UnexpectedToken {
            expected: "expression",
            found: Token::Eof,
        });
    }

    #[test]
    fn definition() {
        let res = Parser::from_source("def foo(x y) x+y").parse_definition().unwrap();
        let target = Function {
            prototype: Prototype::new("foo", vec!["x".to_string(), "y".to_string()]),
            body: Expression::binary('+', var("x"), var("y")),
        };
        assert_eq!(res, target);
    }

    #[test]
    fn duplicate_arguments_are_kept() {
        let res = Parser::from_source("def f(x x) x").parse_definition().unwrap();
        assert_eq!(res.prototype.args, ["x", "x"]);
    }

    #[test]
    fn extern_has_no_body() {
        let mut parser = Parser::from_source("extern sin(a) 1");
        let res = parser.parse_extern().unwrap();
        assert_eq!(res, Prototype::new("sin", vec!["a".to_string()]));
        assert_eq!(parser.current_token(), &Token::Number(1.0));
    }

    #[test]
    fn top_level_expression_is_anonymous() {
        let res = Parser::from_source("4 > x").parse_top_level_expr().unwrap();
        assert!(res.is_anonymous());
        assert!(res.prototype.args.is_empty());
        assert_eq!(res.body, Expression::binary('>', num(4.0), var("x")));
    }

    #[test]
    fn unclosed_paren_names_end_of_input() {
        assert_eq!(parse_expr("(1+2").unwrap_err(), ParserError::UnexpectedToken {
            expected: "')'",
            found: Token::Eof,
        });
    }

    #[test]
    fn error_messages() {
        let err = parse_expr("foo(1 2)").unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected ')' or ',' in argument list, got number 2 instead"
        );

        let err = Parser::from_source("def foo(x, y) x").parse_definition().unwrap_err();
        assert_eq!(err.to_string(), "expected ')' in prototype, got ',' instead");

        let err = Parser::from_source("def 1(x) x").parse_definition().unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected function name in prototype, got number 1 instead"
        );

        let err = Parser::from_source("extern sin x").parse_extern().unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected '(' in prototype, got identifier 'x' instead"
        );

        let err = parse_expr("1 +").unwrap_err();
        assert_eq!(err.to_string(), "expected expression, got end of input instead");
    }

    #[test]
    fn failure_leaves_offending_token_current() {
        let mut parser = Parser::from_source(") 1");
        assert!(parser.parse_top_level_expr().is_err());
        assert_eq!(parser.current_token(), &Token::Char(')'));
        parser.advance_token();
        assert_eq!(
            parser.parse_top_level_expr().unwrap(),
            Function::anonymous(num(1.0))
        );
    }

    #[test]
    fn nesting_is_bounded() {
        let parse = |input: &str| Parser::from_source(input).with_max_depth(2).parse_expression();
        assert_eq!(parse("((1))").unwrap(), num(1.0));
        assert_eq!(parse("(((1)))").unwrap_err(), ParserError::NestingTooDeep { limit: 2 });
        assert_eq!(parse("f(g(h(1)))").unwrap_err(), ParserError::NestingTooDeep { limit: 2 });

        let deep = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(
            parse_expr(&deep).unwrap_err(),
            ParserError::NestingTooDeep {
                limit: DEFAULT_MAX_DEPTH
            }
        );
    }

    #[test]
    fn parse_program_works() {
        let ast = Parser::parse_str("extern sin(x); def thing(x) sin(x) * x; ; thing(2)").unwrap();
        let rendered: Vec<String> = ast.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, [
            "(extern sin(x))",
            "(def thing(x) (* (call sin x) x))",
            "(toplevel (call thing 2))",
        ]);
        assert!(Parser::parse_str("# only a comment\n").unwrap().is_empty());
    }

    #[test]
    fn sessions_are_independent() {
        let mut first = Parser::from_source("a + b");
        let mut second = Parser::from_source("c * d");
        assert_eq!(first.parse_expression().unwrap().to_string(), "(+ a b)");
        assert_eq!(second.parse_expression().unwrap().to_string(), "(* c d)");
    }
}
