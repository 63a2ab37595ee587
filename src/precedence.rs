use std::collections::HashMap;

use crate::lexer::Token;

/// returned for anything that is not a binary operator
pub const NOT_AN_OPERATOR: i32 = -1;

/// binding strength of each binary operator - higher binds tighter
#[derive(Debug, Clone)]
pub struct BinopPrecedence {
    table: HashMap<char, i32>,
}

impl std::default::Default for BinopPrecedence {
    fn default() -> Self {
        let mut table = HashMap::new();
        table.insert('<', 10);
        table.insert('>', 10);
        table.insert('+', 20);
        table.insert('-', 20);
        table.insert('*', 40);
        table.insert('/', 40);
        Self { table }
    }
}

impl BinopPrecedence {
    pub fn of(&self, token: &Token) -> i32 {
        match token {
            Token::Char(c) if c.is_ascii() => match self.table.get(c) {
                Some(&prec) if prec > 0 => prec,
                _ => NOT_AN_OPERATOR,
            },
            _ => NOT_AN_OPERATOR,
        }
    }

    pub fn is_operator(&self, op: char) -> bool {
        self.of(&Token::Char(op)) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table() {
        let prec = BinopPrecedence::default();
        assert_eq!(prec.of(&Token::Char('<')), 10);
        assert_eq!(prec.of(&Token::Char('>')), 10);
        assert_eq!(prec.of(&Token::Char('+')), 20);
        assert_eq!(prec.of(&Token::Char('-')), 20);
        assert_eq!(prec.of(&Token::Char('*')), 40);
        assert_eq!(prec.of(&Token::Char('/')), 40);
    }

    #[test]
    fn non_operators_get_sentinel() {
        let prec = BinopPrecedence::default();
        assert_eq!(prec.of(&Token::Char('(')), NOT_AN_OPERATOR);
        assert_eq!(prec.of(&Token::Char('×')), NOT_AN_OPERATOR);
        assert_eq!(prec.of(&Token::Number(1.0)), NOT_AN_OPERATOR);
        assert_eq!(prec.of(&Token::Ident("x".to_string())), NOT_AN_OPERATOR);
        assert_eq!(prec.of(&Token::Eof), NOT_AN_OPERATOR);
        assert!(!prec.is_operator('='));
        assert!(prec.is_operator('*'));
    }
}
