//! Tokenizer for the condition grammar.

use serde_json::Number;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(Number),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    /// `&&` or `and`
    And,
    /// `||` or `or`
    Or,
    /// `!` or `not`
    Not,
    In,
    /// `==` or `===`
    Eq,
    /// `!=` or `!==`
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Dot,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Str(s) => format!("string {:?}", s),
            Token::Ident(name) => format!("identifier '{}'", name),
            Token::True => "'true'".to_string(),
            Token::False => "'false'".to_string(),
            Token::Null => "'null'".to_string(),
            Token::And => "'&&'".to_string(),
            Token::Or => "'||'".to_string(),
            Token::Not => "'!'".to_string(),
            Token::In => "'in'".to_string(),
            Token::Eq => "'=='".to_string(),
            Token::NotEq => "'!='".to_string(),
            Token::Lt => "'<'".to_string(),
            Token::Le => "'<='".to_string(),
            Token::Gt => "'>'".to_string(),
            Token::Ge => "'>='".to_string(),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Dot => "'.'".to_string(),
            Token::LBracket => "'['".to_string(),
            Token::RBracket => "']'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
        }
    }
}

/// A token with its byte offset in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

/// Split an expression into tokens.
///
/// Keywords `and`, `or` and `not` lex to the same tokens as `&&`, `||`
/// and `!`.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, String> {
    let mut lexer = Lexer {
        source,
        chars: source.char_indices().peekable(),
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    tokens: Vec<Spanned>,
}

impl<'a> Lexer<'a> {
    fn run(&mut self) -> Result<(), String> {
        while let Some(&(offset, ch)) = self.chars.peek() {
            if ch.is_whitespace() {
                self.chars.next();
                continue;
            }

            let token = match ch {
                '0'..='9' => self.number(offset)?,
                '"' | '\'' => self.string(offset, ch)?,
                c if is_ident_start(c) => self.identifier(offset),
                _ => self.operator(offset, ch)?,
            };
            self.tokens.push(Spanned { token, offset });
        }
        Ok(())
    }

    fn advance_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let mut end = self.source.len();
        while let Some(&(idx, ch)) = self.chars.peek() {
            if !pred(ch) {
                end = idx;
                break;
            }
            self.chars.next();
        }
        end
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.chars.peek().map(|&(_, c)| c) == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn number(&mut self, start: usize) -> Result<Token, String> {
        let mut end = self.advance_while(|c| c.is_ascii_digit());

        // Fraction only when a digit follows the dot, so `items.0` style
        // member access is never swallowed.
        let rest = &self.source[end..];
        if rest.starts_with('.') && rest[1..].starts_with(|c: char| c.is_ascii_digit()) {
            self.chars.next();
            end = self.advance_while(|c| c.is_ascii_digit());
        }

        if self.chars.peek().is_some_and(|&(_, c)| c == 'e' || c == 'E') {
            self.chars.next();
            if self.chars.peek().is_some_and(|&(_, c)| c == '+' || c == '-') {
                self.chars.next();
            }
            end = self.advance_while(|c| c.is_ascii_digit());
        }

        let text = &self.source[start..end];
        serde_json::from_str::<Number>(text)
            .map(Token::Number)
            .map_err(|_| format!("invalid number '{}' at position {}", text, start))
    }

    fn string(&mut self, start: usize, quote: char) -> Result<Token, String> {
        self.chars.next();
        let mut value = String::new();
        loop {
            let Some((_, ch)) = self.chars.next() else {
                return Err(format!("unterminated string starting at position {}", start));
            };
            match ch {
                c if c == quote => break,
                '\\' => {
                    let Some((idx, escaped)) = self.chars.next() else {
                        return Err(format!("unterminated string starting at position {}", start));
                    };
                    match escaped {
                        '"' | '\'' | '\\' | '/' => value.push(escaped),
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        'b' => value.push('\u{0008}'),
                        'f' => value.push('\u{000C}'),
                        'u' => value.push(self.unicode_escape(idx)?),
                        other => {
                            return Err(format!(
                                "invalid escape '\\{}' at position {}",
                                other, idx
                            ));
                        }
                    }
                }
                c => value.push(c),
            }
        }
        Ok(Token::Str(value))
    }

    fn unicode_escape(&mut self, at: usize) -> Result<char, String> {
        let code = self.hex4(at)?;
        if (0xD800..0xDC00).contains(&code) {
            // High surrogate: must be followed by `\uXXXX` low surrogate.
            if self.eat('\\') && self.eat('u') {
                let low = self.hex4(at)?;
                if (0xDC00..0xE000).contains(&low) {
                    let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                    return char::from_u32(combined)
                        .ok_or_else(|| format!("invalid unicode escape at position {}", at));
                }
            }
            return Err(format!("unpaired surrogate in unicode escape at position {}", at));
        }
        char::from_u32(code).ok_or_else(|| format!("invalid unicode escape at position {}", at))
    }

    fn hex4(&mut self, at: usize) -> Result<u32, String> {
        let mut code = 0;
        for _ in 0..4 {
            let digit = self
                .chars
                .next()
                .and_then(|(_, c)| c.to_digit(16))
                .ok_or_else(|| format!("invalid unicode escape at position {}", at))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn identifier(&mut self, start: usize) -> Token {
        let end = self.advance_while(is_ident_continue);
        match &self.source[start..end] {
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "in" => Token::In,
            name => Token::Ident(name.to_string()),
        }
    }

    fn operator(&mut self, offset: usize, ch: char) -> Result<Token, String> {
        self.chars.next();
        let token = match ch {
            '=' => {
                if !self.eat('=') {
                    return Err(format!("assignment is not supported (position {})", offset));
                }
                self.eat('=');
                Token::Eq
            }
            '!' => {
                if self.eat('=') {
                    self.eat('=');
                    Token::NotEq
                } else {
                    Token::Not
                }
            }
            '<' => {
                if self.eat('=') {
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '&' if self.eat('&') => Token::And,
            '|' if self.eat('|') => Token::Or,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '.' => Token::Dot,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            other => {
                return Err(format!(
                    "unexpected character '{}' at position {}",
                    other, offset
                ));
            }
        };
        Ok(token)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}
