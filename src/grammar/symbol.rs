// Copyright 2018 Google LLC
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

use crate::utils::{Name, ToDoc};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum TokenKind {
  Terminal,
  Variable,
}

/// A grammar symbol as written by the caller.
///
/// Two tokens are equal when they have the same name and kind. Tokens that
/// the normalizer synthesizes are never equal to a caller token, as they are
/// identified by `TokenId` inside the grammar that owns them.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token {
  kind: TokenKind,
  name: Name,
}

impl Token {
  pub fn terminal(name: impl AsRef<str>) -> Self {
    Token {
      kind: TokenKind::Terminal,
      name: Name::new(name.as_ref()),
    }
  }

  pub fn variable(name: impl AsRef<str>) -> Self {
    Token {
      kind: TokenKind::Variable,
      name: Name::new(name.as_ref()),
    }
  }

  pub fn name(&self) -> &Name {
    &self.name
  }

  pub fn kind(&self) -> TokenKind {
    self.kind
  }

  pub fn is_terminal(&self) -> bool {
    self.kind == TokenKind::Terminal
  }

  pub fn is_variable(&self) -> bool {
    self.kind == TokenKind::Variable
  }
}

impl std::fmt::Debug for Token {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self.kind {
      TokenKind::Terminal => write!(fmt, "{:?}", self.name.str()),
      TokenKind::Variable => write!(fmt, "<{}>", self.name),
    }
  }
}

impl std::fmt::Display for Token {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self.kind {
      TokenKind::Terminal => write!(fmt, "{}", self.name),
      TokenKind::Variable => write!(fmt, "<{}>", self.name),
    }
  }
}

impl ToDoc for Token {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    match self.kind {
      TokenKind::Terminal => da.text(format!("{:?}", self.name.str())),
      TokenKind::Variable => da
        .text("<")
        .append(self.name.to_doc(da))
        .append(da.text(">")),
    }
  }
}

/// The index of a token within the grammar that owns it.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TokenId(pub(crate) usize);

impl TokenId {
  pub fn index(self) -> usize {
    self.0
  }
}

/// What a token stands for. Interning on this key is what makes equal
/// abbreviations share one token.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub(crate) enum TokenKey {
  Start,
  Source(Token),
  /// The variable standing in for a terminal inside longer rules.
  Isolated(TokenId),
  /// A suffix of some longer right-hand side, collapsed into one variable.
  Abbrev(Vec<TokenId>),
}

#[derive(Clone, Debug)]
pub(crate) struct TokenData {
  key: TokenKey,
  display: Token,
  nullable: bool,
}

impl TokenData {
  pub(crate) fn new(key: TokenKey, display: Token) -> Self {
    TokenData {
      key,
      display,
      nullable: false,
    }
  }

  pub(crate) fn display(&self) -> &Token {
    &self.display
  }

  pub(crate) fn is_synthetic(&self) -> bool {
    match self.key {
      TokenKey::Source(_) => false,
      _ => true,
    }
  }

  pub(crate) fn expansion(&self) -> Option<&[TokenId]> {
    match &self.key {
      TokenKey::Abbrev(suffix) => Some(suffix),
      _ => None,
    }
  }

  pub(crate) fn is_nullable(&self) -> bool {
    self.nullable
  }

  pub(crate) fn set_nullable(&mut self) {
    assert!(!self.nullable, "a token is marked nullable at most once");
    self.nullable = true;
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn test_token_identity() {
    assert_eq!(Token::variable("a"), Token::variable("a"));
    assert_ne!(Token::variable("a"), Token::terminal("a"));
    assert_ne!(Token::terminal("a"), Token::terminal("b"));
  }

  #[test]
  fn test_token_formatting() {
    assert_eq!(format!("{}", Token::variable("exp")), "<exp>");
    assert_eq!(format!("{}", Token::terminal("+")), "+");
    assert_eq!(format!("{:?}", Token::terminal("+")), "\"+\"");
  }

  #[test]
  fn test_token_doc() {
    let render = |token: Token| {
      let arena = pretty::Arena::new();
      let text = format!("{}", token.to_doc(&arena).into_doc().pretty(80));
      text
    };
    assert_eq!(render(Token::variable("exp")), "<exp>");
    assert_eq!(render(Token::terminal("+")), "\"+\"");
  }

  #[test]
  fn test_synthetic_keys() {
    let source = TokenData::new(
      TokenKey::Source(Token::variable("a")),
      Token::variable("a"),
    );
    assert!(!source.is_synthetic());
    assert_eq!(source.expansion(), None);

    let abbrev = TokenData::new(
      TokenKey::Abbrev(vec![TokenId(1), TokenId(2)]),
      Token::variable("{a b}"),
    );
    assert!(abbrev.is_synthetic());
    assert_eq!(abbrev.expansion(), Some(&[TokenId(1), TokenId(2)][..]));
  }
}
