//! Tokenizer for condition expressions

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    Undefined,
    Dot,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Bang,
    Minus,
    AndAnd,
    OrOr,
    StrictEq,
    StrictNe,
    LooseEq,
    LooseNe,
    Lt,
    Le,
    Gt,
    Ge,
    Eof,
}

/// Token plus its byte offset in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub pos: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub pos: usize,
    pub message: String,
}

pub fn tokenize(src: &str) -> Result<Vec<Spanned>, LexError> {
    let mut lexer = Lexer {
        chars: src.char_indices().collect(),
        idx: 0,
        len: src.len(),
    };
    let mut out = Vec::new();
    loop {
        let tok = lexer.next_token()?;
        let done = tok.token == Token::Eof;
        out.push(tok);
        if done {
            return Ok(out);
        }
    }
}

struct Lexer {
    chars: Vec<(usize, char)>,
    idx: usize,
    len: usize,
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).map(|(_, c)| *c)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.idx + offset).map(|(_, c)| *c)
    }

    fn pos(&self) -> usize {
        self.chars.get(self.idx).map_or(self.len, |(p, _)| *p)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        self.idx += 1;
        c
    }

    fn error(&self, pos: usize, message: impl Into<String>) -> LexError {
        LexError {
            pos,
            message: message.into(),
        }
    }

    fn next_token(&mut self) -> Result<Spanned, LexError> {
        while self.peek().is_some_and(char::is_whitespace) {
            self.idx += 1;
        }
        let pos = self.pos();
        let Some(c) = self.bump() else {
            return Ok(Spanned {
                token: Token::Eof,
                pos,
            });
        };

        let token = match c {
            '.' if self.peek().is_some_and(|d| d.is_ascii_digit()) => {
                self.idx -= 1;
                self.number(pos)?
            }
            '.' => Token::Dot,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '-' => Token::Minus,
            '!' => match (self.peek(), self.peek_at(1)) {
                (Some('='), Some('=')) => {
                    self.idx += 2;
                    Token::StrictNe
                }
                (Some('='), _) => {
                    self.idx += 1;
                    Token::LooseNe
                }
                _ => Token::Bang,
            },
            '=' => match (self.peek(), self.peek_at(1)) {
                (Some('='), Some('=')) => {
                    self.idx += 2;
                    Token::StrictEq
                }
                (Some('='), _) => {
                    self.idx += 1;
                    Token::LooseEq
                }
                _ => return Err(self.error(pos, "assignment is not supported")),
            },
            '<' if self.peek() == Some('=') => {
                self.idx += 1;
                Token::Le
            }
            '<' => Token::Lt,
            '>' if self.peek() == Some('=') => {
                self.idx += 1;
                Token::Ge
            }
            '>' => Token::Gt,
            '&' if self.peek() == Some('&') => {
                self.idx += 1;
                Token::AndAnd
            }
            '|' if self.peek() == Some('|') => {
                self.idx += 1;
                Token::OrOr
            }
            '\'' | '"' => self.string(c, pos)?,
            d if d.is_ascii_digit() => {
                self.idx -= 1;
                self.number(pos)?
            }
            a if a.is_alphabetic() || a == '_' || a == '$' => {
                self.idx -= 1;
                self.ident()
            }
            other => return Err(self.error(pos, format!("unexpected character '{other}'"))),
        };
        Ok(Spanned { token, pos })
    }

    fn number(&mut self, pos: usize) -> Result<Token, LexError> {
        let mut text = String::new();
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '.' && !seen_dot && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())
            {
                seen_dot = true;
                text.push(c);
            } else {
                break;
            }
            self.idx += 1;
        }
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| self.error(pos, format!("invalid number '{text}'")))
    }

    fn string(&mut self, quote: char, pos: usize) -> Result<Token, LexError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(pos, "unterminated string")),
                Some(c) if c == quote => return Ok(Token::Str(out)),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c @ ('\\' | '\'' | '"')) => out.push(c),
                    Some(other) => {
                        return Err(self.error(pos, format!("unknown escape '\\{other}'")))
                    }
                    None => return Err(self.error(pos, "unterminated string")),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn ident(&mut self) -> Token {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                name.push(c);
                self.idx += 1;
            } else {
                break;
            }
        }
        match name.as_str() {
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            "undefined" => Token::Undefined,
            _ => Token::Ident(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        tokenize(src)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a === b !== c == d != e"),
            vec![
                Token::Ident("a".into()),
                Token::StrictEq,
                Token::Ident("b".into()),
                Token::StrictNe,
                Token::Ident("c".into()),
                Token::LooseEq,
                Token::Ident("d".into()),
                Token::LooseNe,
                Token::Ident("e".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_member_access_tokens() {
        assert_eq!(
            kinds("steps['s1'].result"),
            vec![
                Token::Ident("steps".into()),
                Token::LBracket,
                Token::Str("s1".into()),
                Token::RBracket,
                Token::Dot,
                Token::Ident("result".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1 2.5 .5"),
            vec![
                Token::Number(1.0),
                Token::Number(2.5),
                Token::Number(0.5),
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#"'it\'s' "a\"b""#),
            vec![
                Token::Str("it's".into()),
                Token::Str("a\"b".into()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_single_equals_rejected() {
        let err = tokenize("a = 1").unwrap_err();
        assert_eq!(err.pos, 2);
    }

    #[test]
    fn test_unterminated_string() {
        assert!(tokenize("'abc").is_err());
    }
}
