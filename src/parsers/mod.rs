// Copyright 2019 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::{grammar::Token, utils::Name};

pub mod cyk;
pub mod tree;

/// An element of a parser's input.
///
/// Static rules match an input element against a terminal by name; dynamic
/// rules see the element itself. `CfgParser::parse_with` takes the matching
/// as a function instead, for input types without this trait.
pub trait InputSymbol {
  /// Returns true if this element is an occurrence of the terminal `name`.
  fn is_terminal(&self, name: &str) -> bool;
}

impl InputSymbol for str {
  fn is_terminal(&self, name: &str) -> bool {
    self == name
  }
}

impl InputSymbol for String {
  fn is_terminal(&self, name: &str) -> bool {
    self == name
  }
}

impl InputSymbol for char {
  fn is_terminal(&self, name: &str) -> bool {
    let mut buffer = [0; 4];
    self.encode_utf8(&mut buffer) == name
  }
}

impl InputSymbol for Name {
  fn is_terminal(&self, name: &str) -> bool {
    self.str() == name
  }
}

impl InputSymbol for Token {
  fn is_terminal(&self, name: &str) -> bool {
    Token::is_terminal(self) && self.name().str() == name
  }
}

impl<T: InputSymbol + ?Sized> InputSymbol for &T {
  fn is_terminal(&self, name: &str) -> bool {
    (**self).is_terminal(name)
  }
}

/// A scanned token: the kind of terminal it is, and the text or value it was
/// scanned from.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Lexeme<T> {
  kind: Name,
  value: T,
}

impl<T> Lexeme<T> {
  pub fn new(kind: impl AsRef<str>, value: T) -> Self {
    Lexeme {
      kind: Name::new(kind.as_ref()),
      value,
    }
  }

  pub fn kind(&self) -> &Name {
    &self.kind
  }

  pub fn value(&self) -> &T {
    &self.value
  }
}

impl<T> InputSymbol for Lexeme<T> {
  fn is_terminal(&self, name: &str) -> bool {
    self.kind.str() == name
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn test_input_symbols() {
    assert!("+".is_terminal("+"));
    assert!(String::from("x").is_terminal("x"));
    assert!('é'.is_terminal("é"));
    assert!(!'e'.is_terminal("é"));
    assert!(Name::new("id").is_terminal("id"));
    assert!(InputSymbol::is_terminal(&Token::terminal("x"), "x"));
    assert!(!InputSymbol::is_terminal(&Token::variable("x"), "x"));
  }

  #[test]
  fn test_lexemes_match_by_kind() {
    let lexeme = Lexeme::new("number", 42);
    assert!(lexeme.is_terminal("number"));
    assert!(!lexeme.is_terminal("42"));
    assert_eq!(*lexeme.value(), 42);
  }
}
