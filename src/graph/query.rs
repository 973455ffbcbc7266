//! Search queries over nodes.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! or   := and ("OR" and)*
//! and  := not ("AND" not)*
//! not  := "NOT" not | term
//! term := "(" or ")" | field ":" value | value
//! value := word | /regex/
//! ```
//!
//! Operators are case-insensitive. A bare value matches the node name or id; fields
//! are `name`, `type` and `path` (alias `filepath`), unknown fields fall back to
//! `name`. Plain values are case-insensitive substrings, regex values are
//! case-insensitive patterns.

use regex::{Regex, RegexBuilder};

use super::types::Node;

#[derive(Clone, Debug, PartialEq)]
enum Token {
	LParen,
	RParen,
	Colon,
	And,
	Or,
	Not,
	Word(String),
	Pattern(String),
}

fn tokenize(query: &str) -> Vec<Token> {
	let chars: Vec<char> = query.chars().collect();
	let mut tokens = Vec::new();
	let mut i = 0;

	while i < chars.len() {
		match chars[i] {
			c if c.is_whitespace() => i += 1,
			'(' => {
				tokens.push(Token::LParen);
				i += 1;
			}
			')' => {
				tokens.push(Token::RParen);
				i += 1;
			}
			':' => {
				tokens.push(Token::Colon);
				i += 1;
			}
			'/' => {
				let start = i;
				i += 1;
				let mut pattern = String::new();
				while i < chars.len() && chars[i] != '/' {
					if chars[i] == '\\' && i + 1 < chars.len() {
						pattern.push(chars[i]);
						i += 1;
					}
					pattern.push(chars[i]);
					i += 1;
				}
				if i < chars.len() {
					tokens.push(Token::Pattern(pattern));
					i += 1;
				} else {
					// unterminated, treat as literal text
					tokens.push(Token::Word(chars[start..].iter().collect()));
				}
			}
			_ => {
				let start = i;
				while i < chars.len() && !chars[i].is_whitespace() && !"():".contains(chars[i]) {
					i += 1;
				}
				let word: String = chars[start..i].iter().collect();
				tokens.push(match word.to_ascii_uppercase().as_str() {
					"AND" => Token::And,
					"OR" => Token::Or,
					"NOT" => Token::Not,
					_ => Token::Word(word),
				});
			}
		}
	}
	tokens
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
	NameOrId,
	Name,
	Type,
	Path,
}

impl Field {
	fn parse(name: &str) -> Self {
		match name.to_ascii_lowercase().as_str() {
			"type" => Self::Type,
			"path" | "filepath" => Self::Path,
			_ => Self::Name,
		}
	}
}

#[derive(Clone, Debug)]
enum Matcher {
	Text(String),
	/// `None` when the pattern failed to compile; matches nothing.
	Pattern(Option<Regex>),
}

impl Matcher {
	fn is_match(&self, text: &str) -> bool {
		match self {
			Self::Text(needle) => text.to_lowercase().contains(needle),
			Self::Pattern(regex) => regex.as_ref().is_some_and(|regex| regex.is_match(text)),
		}
	}
}

#[derive(Clone, Debug)]
enum Expr {
	Term(Field, Matcher),
	Not(Box<Expr>),
	And(Box<Expr>, Box<Expr>),
	Or(Box<Expr>, Box<Expr>),
}

impl Expr {
	fn matches(&self, node: &Node) -> bool {
		match self {
			Self::Term(field, matcher) => match field {
				Field::NameOrId => {
					node.name.as_deref().is_some_and(|name| matcher.is_match(name))
						|| matcher.is_match(&node.id)
				}
				Field::Name => matcher.is_match(node.name.as_deref().unwrap_or_default()),
				Field::Type => matcher.is_match(node.kind.as_str()),
				Field::Path => matcher.is_match(node.file_path.as_deref().unwrap_or_default()),
			},
			Self::Not(inner) => !inner.matches(node),
			Self::And(left, right) => left.matches(node) && right.matches(node),
			Self::Or(left, right) => left.matches(node) || right.matches(node),
		}
	}
}

struct Parser {
	tokens: Vec<Token>,
	pos: usize,
}

impl Parser {
	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.pos)
	}

	fn eat(&mut self, token: &Token) -> bool {
		let hit = self.peek() == Some(token);
		if hit {
			self.pos += 1;
		}
		hit
	}

	fn or(&mut self) -> Option<Expr> {
		let mut left = self.and()?;
		while self.eat(&Token::Or) {
			left = Expr::Or(Box::new(left), Box::new(self.and()?));
		}
		Some(left)
	}

	fn and(&mut self) -> Option<Expr> {
		let mut left = self.not()?;
		while self.eat(&Token::And) {
			left = Expr::And(Box::new(left), Box::new(self.not()?));
		}
		Some(left)
	}

	fn not(&mut self) -> Option<Expr> {
		if self.eat(&Token::Not) {
			return Some(Expr::Not(Box::new(self.not()?)));
		}
		self.term()
	}

	fn term(&mut self) -> Option<Expr> {
		if self.eat(&Token::LParen) {
			let inner = self.or()?;
			return self.eat(&Token::RParen).then_some(inner);
		}

		let field = match (self.tokens.get(self.pos), self.tokens.get(self.pos + 1)) {
			(Some(Token::Word(name)), Some(Token::Colon)) => {
				let field = Field::parse(name);
				self.pos += 2;
				field
			}
			_ => Field::NameOrId,
		};

		let matcher = match self.peek()? {
			Token::Word(text) => Matcher::Text(text.to_lowercase()),
			Token::Pattern(pattern) => {
				Matcher::Pattern(RegexBuilder::new(pattern).case_insensitive(true).build().ok())
			}
			_ => return None,
		};
		self.pos += 1;
		Some(Expr::Term(field, matcher))
	}
}

/// A parsed search query.
///
/// Blank and malformed queries match every node.
#[derive(Clone, Debug, Default)]
pub struct SearchQuery {
	expr: Option<Expr>,
}

impl SearchQuery {
	/// Parses `query`.
	pub fn parse(query: &str) -> Self {
		let mut parser = Parser {
			tokens: tokenize(query.trim()),
			pos: 0,
		};
		if parser.tokens.is_empty() {
			return Self::default();
		}
		let expr = parser.or().filter(|_| parser.pos == parser.tokens.len());
		if expr.is_none() {
			log::debug!("ignoring malformed search query {query:?}");
		}
		Self { expr }
	}

	/// True when the query filters nothing.
	pub fn is_empty(&self) -> bool {
		self.expr.is_none()
	}

	/// Whether `node` passes the query.
	pub fn matches(&self, node: &Node) -> bool {
		self.expr.as_ref().is_none_or(|expr| expr.matches(node))
	}
}
