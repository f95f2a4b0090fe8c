//! Hand-written lexical scanner.
//!
//! Pulls one [`Token`] at a time from a character buffer with a single
//! character of lookahead. Newlines are significant only as statement
//! terminators: after any token that can end an expression (see
//! [`TokenKind::ends_expression`]) a newline emits a virtual `;`, otherwise
//! it is skipped. This makes `;` optional at line ends while still allowing
//! expressions to span lines.

use crate::{
    errors::{RunError, RunResult},
    token::{Token, TokenKind, keyword_kind},
};

pub(crate) struct Scanner {
    src: Vec<char>,
    offset: usize,
    /// Set after a token that can end an expression; a following newline
    /// then becomes a virtual semicolon.
    insert_terminator: bool,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Self {
            src: source.chars().collect(),
            offset: 0,
            insert_terminator: false,
        }
    }

    /// Convenience wrapper: scans the whole source into a vector ending with
    /// the EOF token.
    pub fn tokenize(source: &str) -> RunResult<Vec<Token>> {
        let mut scanner = Self::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = scanner.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn cur(&self) -> Option<char> {
        self.src.get(self.offset).copied()
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.offset + 1).copied()
    }

    fn bump(&mut self) {
        self.offset += 1;
    }

    /// Produces the next token, inserting virtual terminators at newlines.
    pub fn next_token(&mut self) -> RunResult<Token> {
        loop {
            match self.cur() {
                Some(' ' | '\t' | '\r') => self.bump(),
                Some('\n') => {
                    let offset = self.offset;
                    self.bump();
                    if self.insert_terminator {
                        self.insert_terminator = false;
                        return Ok(Token::new(TokenKind::Semicolon, ";", offset));
                    }
                }
                Some('/') if self.peek() == Some('/') => self.skip_line_comment(),
                Some('/') if self.peek() == Some('*') => self.skip_block_comment()?,
                _ => break,
            }
        }

        let offset = self.offset;
        let Some(c) = self.cur() else {
            self.insert_terminator = false;
            return Ok(Token::new(TokenKind::Eof, "", offset));
        };

        let token = match c {
            '\'' | '"' => self.scan_string(c)?,
            '$' => self.single(TokenKind::Var, offset),
            ';' => self.single(TokenKind::Semicolon, offset),
            ',' => self.single(TokenKind::Comma, offset),
            '\\' => self.single(TokenKind::Backslash, offset),
            '(' => self.single(TokenKind::ParenOpen, offset),
            ')' => self.single(TokenKind::ParenClose, offset),
            '{' => self.single(TokenKind::CurlyOpen, offset),
            '}' => self.single(TokenKind::CurlyClose, offset),
            '[' => self.single(TokenKind::BracketOpen, offset),
            ']' => self.single(TokenKind::BracketClose, offset),
            ':' => {
                if self.peek() == Some(':') {
                    self.double(TokenKind::StaticFetch, "::", offset)
                } else {
                    self.single(TokenKind::Colon, offset)
                }
            }
            '=' => match self.peek() {
                Some('>') => self.double(TokenKind::DoubleArrow, "=>", offset),
                Some('=') => {
                    self.bump();
                    if self.peek() == Some('=') {
                        self.bump();
                        self.single_wide(TokenKind::IsIdentical, "===", offset)
                    } else {
                        self.single_wide(TokenKind::IsEqual, "==", offset)
                    }
                }
                _ => self.single(TokenKind::Equal, offset),
            },
            '!' => {
                if self.peek() == Some('=') {
                    self.bump();
                    if self.peek() == Some('=') {
                        self.bump();
                        self.single_wide(TokenKind::IsNotIdentical, "!==", offset)
                    } else {
                        self.single_wide(TokenKind::IsNotEqual, "!=", offset)
                    }
                } else {
                    self.single(TokenKind::Not, offset)
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.double(TokenKind::IsSmallerOrEqual, "<=", offset)
                } else {
                    self.single(TokenKind::IsSmaller, offset)
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.double(TokenKind::IsGreaterOrEqual, ">=", offset)
                } else {
                    self.single(TokenKind::IsGreater, offset)
                }
            }
            '+' => match self.peek() {
                Some('+') => self.double(TokenKind::Increment, "++", offset),
                Some('=') => self.double(TokenKind::PlusEqual, "+=", offset),
                _ => self.single(TokenKind::Plus, offset),
            },
            '-' => match self.peek() {
                Some(d) if d.is_ascii_digit() && !self.insert_terminator => self.scan_number(true),
                Some('>') => self.double(TokenKind::ObjectOperator, "->", offset),
                Some('-') => self.double(TokenKind::Decrement, "--", offset),
                Some('=') => self.double(TokenKind::MinusEqual, "-=", offset),
                _ => self.single(TokenKind::Minus, offset),
            },
            '*' => {
                if self.peek() == Some('=') {
                    self.double(TokenKind::MulEqual, "*=", offset)
                } else {
                    self.single(TokenKind::Mul, offset)
                }
            }
            '/' => {
                // line and block comments were consumed above
                if self.peek() == Some('=') {
                    self.double(TokenKind::DivEqual, "/=", offset)
                } else {
                    self.single(TokenKind::Div, offset)
                }
            }
            '%' => {
                if self.peek() == Some('=') {
                    self.double(TokenKind::ModEqual, "%=", offset)
                } else {
                    self.single(TokenKind::Mod, offset)
                }
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.double(TokenKind::BooleanAnd, "&&", offset)
                } else {
                    self.single(TokenKind::Ampersand, offset)
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.double(TokenKind::BooleanOr, "||", offset)
                } else {
                    self.single(TokenKind::Pipe, offset)
                }
            }
            '?' => {
                if self.peek() == Some('?') {
                    self.double(TokenKind::Coalesce, "??", offset)
                } else {
                    self.single(TokenKind::Illegal, offset)
                }
            }
            '.' => {
                if self.peek() == Some('.') {
                    self.bump();
                    if self.peek() == Some('.') {
                        self.bump();
                        self.single_wide(TokenKind::Ellipsis, "...", offset)
                    } else {
                        self.single_wide(TokenKind::Range, "..", offset)
                    }
                } else {
                    self.single(TokenKind::Illegal, offset)
                }
            }
            d if d.is_ascii_digit() => self.scan_number(false),
            c if is_identifier_start(c) => self.scan_identifier(),
            _ => self.single(TokenKind::Illegal, offset),
        };

        self.insert_terminator = token.kind.ends_expression();
        Ok(token)
    }

    /// Emits a one-character token and consumes it.
    fn single(&mut self, kind: TokenKind, offset: usize) -> Token {
        let literal = self.cur().map(String::from).unwrap_or_default();
        self.bump();
        Token::new(kind, literal, offset)
    }

    /// Emits a two-character token; the first character is still current.
    fn double(&mut self, kind: TokenKind, literal: &str, offset: usize) -> Token {
        self.bump();
        self.bump();
        Token::new(kind, literal, offset)
    }

    /// Emits a token whose characters are already consumed except the last.
    fn single_wide(&mut self, kind: TokenKind, literal: &str, offset: usize) -> Token {
        self.bump();
        Token::new(kind, literal, offset)
    }

    fn scan_number(&mut self, negative: bool) -> Token {
        let offset = self.offset;
        let mut literal = String::new();
        if negative {
            literal.push('-');
            self.bump();
        }
        while let Some(c) = self.cur() {
            if !c.is_ascii_digit() {
                break;
            }
            literal.push(c);
            self.bump();
        }
        Token::new(TokenKind::Number, literal, offset)
    }

    fn scan_identifier(&mut self) -> Token {
        let offset = self.offset;
        let mut literal = String::new();
        while let Some(c) = self.cur() {
            if !is_identifier_continue(c) {
                break;
            }
            literal.push(c);
            self.bump();
        }
        let kind = keyword_kind(&literal).unwrap_or(TokenKind::Ident);
        Token::new(kind, literal, offset)
    }

    /// Scans a string literal delimited by `quote`. No escape processing.
    fn scan_string(&mut self, quote: char) -> RunResult<Token> {
        let offset = self.offset;
        self.bump();
        let mut literal = String::new();
        loop {
            match self.cur() {
                Some(c) if c == quote => {
                    self.bump();
                    return Ok(Token::new(TokenKind::String, literal, offset));
                }
                Some(c) => {
                    literal.push(c);
                    self.bump();
                }
                None => return Err(RunError::lex("unterminated string literal", offset)),
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.cur() {
            if c == '\n' {
                // leave the newline for terminator insertion
                break;
            }
            self.bump();
        }
    }

    fn skip_block_comment(&mut self) -> RunResult<()> {
        let offset = self.offset;
        self.bump();
        self.bump();
        loop {
            match self.cur() {
                Some('*') if self.peek() == Some('/') => {
                    self.bump();
                    self.bump();
                    return Ok(());
                }
                Some(_) => self.bump(),
                None => return Err(RunError::lex("unterminated block comment", offset)),
            }
        }
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::token::TokenKind as K;

    fn kinds_and_literals(input: &str) -> Vec<(K, String)> {
        Scanner::tokenize(input)
            .unwrap()
            .into_iter()
            .take_while(|t| t.kind != K::Eof)
            .map(|t| (t.kind, t.literal))
            .collect()
    }

    fn kinds(input: &str) -> Vec<K> {
        kinds_and_literals(input).into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn scans_if_else_chains() {
        assert_eq!(
            kinds("if () {} else if () {} else {}"),
            vec![
                K::If,
                K::ParenOpen,
                K::ParenClose,
                K::CurlyOpen,
                K::CurlyClose,
                K::Else,
                K::If,
                K::ParenOpen,
                K::ParenClose,
                K::CurlyOpen,
                K::CurlyClose,
                K::Else,
                K::CurlyOpen,
                K::CurlyClose,
            ]
        );
    }

    #[test]
    fn scans_keywords_and_identifiers() {
        assert_eq!(
            kinds_and_literals("throw new HttpException"),
            vec![
                (K::Throw, "throw".to_owned()),
                (K::New, "new".to_owned()),
                (K::Ident, "HttpException".to_owned()),
            ]
        );
    }

    #[test]
    fn identifier_with_keyword_prefix_stays_identifier() {
        assert_eq!(
            kinds_and_literals("classes iffy"),
            vec![(K::Ident, "classes".to_owned()), (K::Ident, "iffy".to_owned())]
        );
    }

    #[test]
    fn scans_compound_assignment_operators() {
        for (input, kind) in [
            ("$i += 2", K::PlusEqual),
            ("$i -= 2", K::MinusEqual),
            ("$i *= 2", K::MulEqual),
            ("$i /= 2", K::DivEqual),
            ("$i %= 2", K::ModEqual),
        ] {
            assert_eq!(kinds(input), vec![K::Var, K::Ident, kind, K::Number], "input: {input}");
        }
    }

    #[test]
    fn scans_comparison_operators() {
        assert_eq!(
            kinds("== === != !== < <= > >="),
            vec![
                K::IsEqual,
                K::IsIdentical,
                K::IsNotEqual,
                K::IsNotIdentical,
                K::IsSmaller,
                K::IsSmallerOrEqual,
                K::IsGreater,
                K::IsGreaterOrEqual,
            ]
        );
    }

    #[test]
    fn scans_fetch_and_namespace_operators() {
        assert_eq!(
            kinds("$obj->method() A::b math\\random .. ... =>"),
            vec![
                K::Var,
                K::Ident,
                K::ObjectOperator,
                K::Ident,
                K::ParenOpen,
                K::ParenClose,
                K::Ident,
                K::StaticFetch,
                K::Ident,
                K::Ident,
                K::Backslash,
                K::Ident,
                K::Range,
                K::Ellipsis,
                K::DoubleArrow,
            ]
        );
    }

    #[test]
    fn inserts_terminator_after_expression_enders() {
        // number, ident, `)`, `]`, `}`, `++` all set the terminator bit
        assert_eq!(
            kinds("$a = 5\n$b = f()\n$c++\n"),
            vec![
                K::Var,
                K::Ident,
                K::Equal,
                K::Number,
                K::Semicolon,
                K::Var,
                K::Ident,
                K::Equal,
                K::Ident,
                K::ParenOpen,
                K::ParenClose,
                K::Semicolon,
                K::Var,
                K::Ident,
                K::Increment,
                K::Semicolon,
            ]
        );
    }

    #[test]
    fn does_not_insert_terminator_mid_expression() {
        // `=` and `+` clear the bit, so the expression continues across lines
        assert_eq!(
            kinds("$a =\n5 +\n3\n"),
            vec![K::Var, K::Ident, K::Equal, K::Number, K::Plus, K::Number, K::Semicolon]
        );
    }

    #[test]
    fn negative_number_only_at_expression_start() {
        // after `=` a `-3` is one number token
        assert_eq!(
            kinds_and_literals("$a = -3"),
            vec![
                (K::Var, "$".to_owned()),
                (K::Ident, "a".to_owned()),
                (K::Equal, "=".to_owned()),
                (K::Number, "-3".to_owned()),
            ]
        );
        // after an identifier `-` is the binary operator
        assert_eq!(
            kinds_and_literals("$n -1"),
            vec![
                (K::Var, "$".to_owned()),
                (K::Ident, "n".to_owned()),
                (K::Minus, "-".to_owned()),
                (K::Number, "1".to_owned()),
            ]
        );
    }

    #[test]
    fn scans_string_literals_without_escapes() {
        assert_eq!(
            kinds_and_literals("'abc' \"d e f\""),
            vec![(K::String, "abc".to_owned()), (K::String, "d e f".to_owned())]
        );
    }

    #[test]
    fn skips_line_and_block_comments() {
        assert_eq!(
            kinds("$a = 1 // trailing\n/* block\ncomment */ $b"),
            vec![K::Var, K::Ident, K::Equal, K::Number, K::Semicolon, K::Var, K::Ident]
        );
    }

    #[test]
    fn unterminated_string_is_a_lex_error() {
        let err = Scanner::tokenize("$a = 'oops").unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::Lex);
        assert_eq!(err.offset, Some(5));
    }

    #[test]
    fn unterminated_block_comment_is_a_lex_error() {
        let err = Scanner::tokenize("/* never closed").unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::Lex);
        assert_eq!(err.offset, Some(0));
    }

    #[test]
    fn offsets_are_monotonically_non_decreasing() {
        let tokens = Scanner::tokenize("$a = 5\nprintln($a + 3)\n").unwrap();
        let offsets: Vec<usize> = tokens.iter().map(|t| t.offset).collect();
        let mut sorted = offsets.clone();
        sorted.sort_unstable();
        assert_eq!(offsets, sorted);
    }

    #[test]
    fn token_literals_rejoin_into_an_equivalent_source() {
        // whitespace-irrelevance: re-concatenating literal text with spaces
        // between tokens re-lexes to the same kind sequence
        for input in [
            "$a = 5; $b = -3",
            "function fib($n) { if $n < 2 { $n } else { fib($n-1) + fib($n-2) } }",
            "foreach ($xs as $k => $v) { println($k) }",
            "$r = 0..3\n$x++",
        ] {
            let original = Scanner::tokenize(input).unwrap();
            let rejoined: Vec<String> = original.iter().map(|t| t.literal.clone()).collect();
            let relexed = Scanner::tokenize(&rejoined.join(" ")).unwrap();
            let original_kinds: Vec<K> = original.iter().map(|t| t.kind).collect();
            let relexed_kinds: Vec<K> = relexed.iter().map(|t| t.kind).collect();
            assert_eq!(original_kinds, relexed_kinds, "input: {input}");
        }
    }

    #[test]
    fn increment_and_decrement_forms() {
        assert_eq!(
            kinds("++$i\n$i++\n--$i\n$i--\n"),
            vec![
                K::Increment,
                K::Var,
                K::Ident,
                K::Semicolon,
                K::Var,
                K::Ident,
                K::Increment,
                K::Semicolon,
                K::Decrement,
                K::Var,
                K::Ident,
                K::Semicolon,
                K::Var,
                K::Ident,
                K::Decrement,
                K::Semicolon,
            ]
        );
    }
}
