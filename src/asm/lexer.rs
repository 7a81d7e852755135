// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use super::ParseError;

// ===================================================================
// Token
// ===================================================================

#[derive(Debug, PartialEq)]
pub enum Token<'a> {
    /// End of line (a `;` comment ends the line early).
    Eol,
    /// A mnemonic or label name.
    Identifier(&'a str),
    /// A decimal integer literal, kept as its lexeme so that range
    /// checking can report the text the user wrote.
    Number(&'a str),
    Comma,
    Colon,
}

impl<'a> Token<'a> {
    // Return the "length" of a token.  That is, the number of
    // characters it represents.
    pub fn len(&self) -> usize {
        match self {
            Token::Eol => 0,
            Token::Identifier(s) => s.len(),
            Token::Number(s) => s.len(),
            Token::Comma => 1,
            Token::Colon => 1,
        }
    }
}

// ===================================================================
// Lexer
// ===================================================================

/// A very simple lexer over one listing line.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Vec<char>,
    index: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, line: usize) -> Self {
        let chars: Vec<char> = input.chars().collect();
        //
        Self { input, chars, index: 0, line }
    }

    /// One-based column of the next token.
    pub fn column(&self) -> usize {
        skip(&self.chars, self.index, |c| c.is_ascii_whitespace()) + 1
    }

    /// Generate a parse error pinned at the next token.
    pub fn error(&self, message: impl Into<String>) -> ParseError {
        self.error_at(self.column(), message)
    }

    /// Generate a parse error pinned at an explicit column (e.g. a
    /// token consumed earlier).
    pub fn error_at(&self, column: usize, message: impl Into<String>) -> ParseError {
        ParseError::new(self.line, column, message)
    }

    pub fn lookahead(&self) -> Result<Token<'a>, ParseError> {
        // Skip any whitespace
        let start = skip(&self.chars, self.index, |c| c.is_ascii_whitespace());
        // Sanity check for end-of-line (comments end the line early)
        if start >= self.chars.len() || self.chars[start] == ';' {
            Ok(Token::Eol)
        } else {
            // Determine what kind of token we have.
            match self.chars[start] {
                ',' => Ok(Token::Comma),
                ':' => Ok(Token::Colon),
                '0'..='9' | '-' => self.scan_number(start),
                'a'..='z' | 'A'..='Z' | '_' => Ok(self.scan_identifier(start)),
                _ => Err(ParseError::new(self.line, start + 1, "unexpected character")),
            }
        }
    }

    pub fn next(&mut self) -> Result<Token<'a>, ParseError> {
        // Skip any whitespace
        self.index = skip(&self.chars, self.index, |c| c.is_ascii_whitespace());
        // Determine next token
        let tok = self.lookahead()?;
        // Account for next token
        self.index += tok.len();
        //
        Ok(tok)
    }

    fn scan_number(&self, start: usize) -> Result<Token<'a>, ParseError> {
        let mut end = start;
        if self.chars[end] == '-' {
            end += 1;
        }
        let digits = skip(&self.chars, end, |c| c.is_ascii_digit());
        if digits == end {
            // A bare minus sign is not a number.
            Err(ParseError::new(self.line, start + 1, "expected digits"))
        } else {
            Ok(Token::Number(&self.input[start..digits]))
        }
    }

    fn scan_identifier(&self, start: usize) -> Token<'a> {
        let end = skip(&self.chars, start, |c| c.is_ascii_alphanumeric() || c == '_');
        Token::Identifier(&self.input[start..end])
    }
}

/// Skip over any characters matching a given predicate.
fn skip<P>(input: &[char], index: usize, pred: P) -> usize
where
    P: Fn(char) -> bool,
{
    let mut i = index;
    // Continue matching
    while i < input.len() && pred(input[i]) {
        i += 1;
    }
    // Done
    i
}
