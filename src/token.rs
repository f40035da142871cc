//! A compact bracket syntax for sets of string paths.
//!
//! ```text
//! list := item (',' item)*
//! item := atom ('(' list ')')?
//! ```
//!
//! An atom followed by a group stands for the paths of the group, each
//! prefixed with the atom. `usr(bin, lib(x86, arm)), etc` therefore names
//! `usr/bin`, `usr/lib/x86`, `usr/lib/arm` and `etc`. Whitespace around
//! atoms is ignored. Parsing is all or nothing: a malformed input never
//! produces a partial set.
//!
//! ```
//! use persistent_collections::set::ArrayTrieSet;
//!
//! let set: ArrayTrieSet<String> = "usr(bin, lib), etc".parse().unwrap();
//! assert!(set.contains(&["usr".to_string(), "lib".to_string()]));
//! assert!(!set.contains(&["usr".to_string()]));
//! assert_eq!(set.len(), 3);
//! ```

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use tracing::debug;

use crate::set::ArrayTrieSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Open,
    Close,
    Comma,
    Atom(String),
}

impl Token {
    fn from_char(c: char) -> Token {
        match c {
            '(' => Token::Open,
            ')' => Token::Close,
            ',' => Token::Comma,
            other => Token::Atom(other.to_string()),
        }
    }

    /// Merges runs of adjacent atoms into a single atom.
    pub fn combine(tokens: impl IntoIterator<Item = Token>) -> Vec<Token> {
        tokens
            .into_iter()
            .coalesce(|left, right| match (left, right) {
                (Token::Atom(mut text), Token::Atom(more)) => {
                    text.push_str(&more);
                    Ok(Token::Atom(text))
                }
                pair => Err(pair),
            })
            .collect()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Open => f.write_str("("),
            Token::Close => f.write_str(")"),
            Token::Comma => f.write_str(","),
            Token::Atom(text) => f.write_str(text),
        }
    }
}

/// Splits `input` into tokens.
///
/// Atoms are trimmed and runs of pure whitespace between structural tokens
/// are dropped.
pub fn tokenize(input: &str) -> Vec<Token> {
    Token::combine(input.chars().map(Token::from_char))
        .into_iter()
        .filter_map(|token| match token {
            Token::Atom(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| Token::Atom(trimmed.to_string()))
            }
            structural => Some(structural),
        })
        .collect()
}

/// Errors raised by [`parse`]. Indices count tokens, not characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A token that cannot appear at this position.
    UnexpectedToken { index: usize, found: Token },
    /// The input ended in the middle of an item or group.
    UnexpectedEnd,
    /// A separator or closing parenthesis where an atom was expected.
    EmptyAtom { index: usize },
    /// A group with nothing between its parentheses.
    EmptyGroup { index: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken { index, found } => {
                write!(f, "unexpected `{found}` at token {index}")
            }
            Self::UnexpectedEnd => write!(f, "unexpected end of input"),
            Self::EmptyAtom { index } => write!(f, "missing name before token {index}"),
            Self::EmptyGroup { index } => write!(f, "empty group at token {index}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses the bracket syntax into a set of paths.
///
/// Empty (or whitespace-only) input yields the empty set.
pub fn parse(input: &str) -> Result<ArrayTrieSet<String>, ParseError> {
    let tokens = tokenize(input);
    let mut parser = Parser {
        tokens: &tokens,
        index: 0,
        path: Vec::new(),
        set: ArrayTrieSet::new(),
    };
    if tokens.is_empty() {
        return Ok(parser.set);
    }
    parser.list()?;
    if let Some(found) = parser.peek() {
        return Err(parser.unexpected(found));
    }
    Ok(parser.set)
}

struct Parser<'a> {
    tokens: &'a [Token],
    index: usize,
    path: Vec<String>,
    set: ArrayTrieSet<String>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.index)
    }

    fn unexpected(&self, found: &Token) -> ParseError {
        debug!(index = self.index, %found, "rejected path syntax");
        ParseError::UnexpectedToken {
            index: self.index,
            found: found.clone(),
        }
    }

    fn list(&mut self) -> Result<(), ParseError> {
        loop {
            self.item()?;
            match self.peek() {
                Some(Token::Comma) => self.index += 1,
                _ => return Ok(()),
            }
        }
    }

    fn item(&mut self) -> Result<(), ParseError> {
        let atom = match self.peek() {
            Some(Token::Atom(atom)) => atom,
            Some(Token::Comma | Token::Close) => {
                return Err(ParseError::EmptyAtom { index: self.index })
            }
            Some(found) => return Err(self.unexpected(found)),
            None => return Err(ParseError::UnexpectedEnd),
        };
        self.index += 1;
        self.path.push(atom.clone());

        if let Some(Token::Open) = self.peek() {
            let open = self.index;
            self.index += 1;
            if let Some(Token::Close) = self.peek() {
                return Err(ParseError::EmptyGroup { index: open });
            }
            self.list()?;
            match self.peek() {
                Some(Token::Close) => self.index += 1,
                Some(found) => return Err(self.unexpected(found)),
                None => return Err(ParseError::UnexpectedEnd),
            }
        } else {
            self.set.insert(&self.path);
        }
        self.path.pop();
        Ok(())
    }
}

impl FromStr for ArrayTrieSet<String> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(text: &str) -> Token {
        Token::Atom(text.to_string())
    }

    fn paths(input: &str) -> Vec<String> {
        parse(input)
            .unwrap()
            .iter()
            .map(|path| path.join("/"))
            .collect()
    }

    #[test]
    fn combine_merges_adjacent_atoms() {
        let tokens = Token::combine([atom("a"), atom("b"), Token::Comma, atom("c"), Token::Open]);
        assert_eq!(tokens, vec![atom("ab"), Token::Comma, atom("c"), Token::Open]);
    }

    #[test]
    fn tokenize_trims_atoms() {
        assert_eq!(
            tokenize(" a b ( c ) , d"),
            vec![
                atom("a b"),
                Token::Open,
                atom("c"),
                Token::Close,
                Token::Comma,
                atom("d"),
            ]
        );
    }

    #[test]
    fn nested_groups() {
        assert_eq!(
            paths("usr(bin, lib(x86, arm)), etc"),
            vec!["etc", "usr/bin", "usr/lib/arm", "usr/lib/x86"]
        );
        assert_eq!(paths("a"), vec!["a"]);
        assert_eq!(paths("  "), Vec::<String>::new());
        assert_eq!(paths("a(b),a(c)"), vec!["a/b", "a/c"]);
    }

    #[test]
    fn errors() {
        assert_eq!(parse("a,,b").unwrap_err(), ParseError::EmptyAtom { index: 2 });
        assert_eq!(parse("a,").unwrap_err(), ParseError::UnexpectedEnd);
        assert_eq!(parse("a()").unwrap_err(), ParseError::EmptyGroup { index: 1 });
        assert_eq!(parse("a(b").unwrap_err(), ParseError::UnexpectedEnd);
        assert_eq!(
            parse("a)").unwrap_err(),
            ParseError::UnexpectedToken {
                index: 1,
                found: Token::Close
            }
        );
        assert_eq!(
            parse("(a)").unwrap_err(),
            ParseError::UnexpectedToken {
                index: 0,
                found: Token::Open
            }
        );
        assert_eq!(
            parse("a(b)(c)").unwrap_err(),
            ParseError::UnexpectedToken {
                index: 4,
                found: Token::Open
            }
        );
    }

    #[test]
    fn from_str() {
        let set: ArrayTrieSet<String> = "x(y)".parse().unwrap();
        assert!(set.contains(&["x".to_string(), "y".to_string()]));
        assert!("x(".parse::<ArrayTrieSet<String>>().is_err());
    }
}
