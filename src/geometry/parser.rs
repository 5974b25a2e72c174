//! Recursive-descent parser for geometry strings.
//!
//! ```text
//! start      := width? height? offset_x? offset_y? flags?
//! width      := NUMBER '%'?
//! height     := 'x' (NUMBER '%'?)?
//! offset_x   := '+' NUMBER '%'?
//! offset_y   := '+' NUMBER '%'?
//! flags      := ('!' | '<' | '>' | '^')+
//! ```
//!
//! Whitespace between tokens is ignored. Any input that does not match the
//! grammar fails with a single [`GeometryError`].

use super::{Geometry, GeometryError};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    X,
    Plus,
    Percent,
    Bang,
    Lt,
    Gt,
    Hat,
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, GeometryError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        let token = match c {
            b' ' | b'\t' | b'\r' | b'\n' => {
                pos += 1;
                continue;
            }
            b'0'..=b'9' => {
                let start = pos;
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
                if pos + 1 < bytes.len() && bytes[pos] == b'.' && bytes[pos + 1].is_ascii_digit()
                {
                    pos += 1;
                    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                        pos += 1;
                    }
                }
                let text = &input[start..pos];
                let value = text
                    .parse::<f64>()
                    .map_err(|_| GeometryError::new(start, format!("invalid number '{}'", text)))?;
                tokens.push((start, Token::Number(value)));
                continue;
            }
            b'x' | b'X' => Token::X,
            b'+' => Token::Plus,
            b'%' => Token::Percent,
            b'!' => Token::Bang,
            b'<' => Token::Lt,
            b'>' => Token::Gt,
            b'^' => Token::Hat,
            _ => {
                let ch = input[pos..].chars().next().unwrap_or('?');
                return Err(GeometryError::new(
                    pos,
                    format!("token recognition error at: '{}'", ch),
                ));
            }
        };
        tokens.push((pos, token));
        pos += 1;
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|(_, t)| *t)
    }

    fn column(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(col, _)| *col)
            .unwrap_or(self.end)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn number(&mut self) -> Option<f64> {
        match self.peek() {
            Some(Token::Number(n)) => {
                self.pos += 1;
                Some(n)
            }
            _ => None,
        }
    }

    fn expect_number(&mut self) -> Result<f64, GeometryError> {
        let column = self.column();
        self.number().ok_or_else(|| match self.peek() {
            Some(token) => GeometryError::new(column, format!("mismatched input {:?}", token)),
            None => GeometryError::new(column, "missing NUMBER at '<EOF>'"),
        })
    }

    fn parse(mut self) -> Result<Geometry, GeometryError> {
        let mut geometry = Geometry::default();

        if let Some(width) = self.number() {
            geometry.width = width;
            geometry.flags.width_pct = self.eat(Token::Percent);
        }

        if self.eat(Token::X) {
            if let Some(height) = self.number() {
                geometry.height = height;
                geometry.flags.height_pct = self.eat(Token::Percent);
            }
        }

        if self.peek() == Some(Token::Plus) {
            // An offset needs a size in front of it.
            if self.pos == 0 {
                return Err(GeometryError::new(
                    self.column(),
                    "extraneous input '+' expecting size",
                ));
            }
            self.bump();
            geometry.x = self.expect_number()? as i64;
            geometry.flags.x_pct = self.eat(Token::Percent);

            if self.eat(Token::Plus) {
                geometry.y = self.expect_number()? as i64;
                geometry.flags.y_pct = self.eat(Token::Percent);
            }
        }

        while let Some(token) = self.peek() {
            match token {
                Token::Bang => geometry.flags.force = true,
                Token::Lt => geometry.flags.only_grow = true,
                Token::Gt => geometry.flags.only_shrink = true,
                Token::Hat => geometry.flags.fill = true,
                _ => break,
            }
            self.bump();
        }

        if let Some(token) = self.peek() {
            return Err(GeometryError::new(
                self.column(),
                format!("extraneous input {:?} expecting <EOF>", token),
            ));
        }

        Ok(geometry)
    }
}

/// Parse a geometry string such as `100x100+10+10!`
pub fn parse(input: &str) -> Result<Geometry, GeometryError> {
    let tokens = tokenize(input)?;
    Parser {
        tokens,
        pos: 0,
        end: input.len(),
    }
    .parse()
}
