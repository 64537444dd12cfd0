// Copyright 2020 Google LLC
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

//! Rules written as text.
//!
//! A rule is written as a head variable, an optional `->`, and a body:
//!
//! ```text
//! <exp> -> <exp> + <term>
//! <exp> <term>
//! <empty> ->
//! ```
//!
//! Variables are names in angle brackets. Everything else in the body is
//! terminals, split on whitespace, or into grapheme clusters when the
//! conversion is created with `RuleConversion::with_graphemes`, so that
//! `<exp> -> (<exp>)` has three symbols on the right.
//!
//! A backslash makes the character after it part of a terminal, so `\<`
//! spells the terminal `<` and `\\` a backslash.

use {
  crate::grammar::{Cfg, Evaluation, Rule, StaticRule, Token},
  anyhow::Context,
  std::collections::BTreeMap,
  unicode_segmentation::UnicodeSegmentation,
};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
  #[error("rule {text:?} does not start with a variable")]
  MissingHead { text: String },
  #[error("rule {text:?} has a `<` without a closing `>`")]
  UnterminatedVariable { text: String },
  #[error("rule {text:?} has a variable with no name")]
  EmptyVariable { text: String },
  #[error("rule {text:?} needs an evaluation: only single-symbol rules can pass their value through")]
  MissingEvaluation { text: String },
}

/// Converts text into rules. Every spelling maps to the same token across
/// all the rules a conversion produces.
#[derive(Debug, Default)]
pub struct RuleConversion {
  tokens: BTreeMap<String, Token>,
  graphemes: bool,
}

impl RuleConversion {
  /// Terminals are separated by whitespace.
  pub fn new() -> Self {
    RuleConversion::default()
  }

  /// Every grapheme cluster outside a variable is a terminal.
  pub fn with_graphemes() -> Self {
    RuleConversion {
      tokens: BTreeMap::new(),
      graphemes: true,
    }
  }

  /// The token for a spelling: `<name>` is a variable, anything else a
  /// terminal named by the spelling with its escapes removed.
  pub fn token(&mut self, spelling: &str) -> Token {
    self
      .tokens
      .entry(spelling.to_string())
      .or_insert_with(|| {
        match spelling
          .strip_prefix('<')
          .and_then(|rest| rest.strip_suffix('>'))
        {
          Some(name) if !name.is_empty() => Token::variable(name),
          _ => Token::terminal(unescape(spelling)),
        }
      })
      .clone()
  }

  /// The token for a spelling, if a rule has used it.
  pub fn lookup(&self, spelling: &str) -> Option<&Token> {
    self.tokens.get(spelling)
  }

  pub fn tokens(&self) -> impl Iterator<Item = &Token> {
    self.tokens.values()
  }

  /// Converts one rule. Without an evaluation, the rule must have exactly
  /// one symbol on its right-hand side, whose value it passes through.
  ///
  /// Every unescaped `<` in the body starts a variable, which runs to the
  /// next `>`. A terminal containing `<` is written with `\<`, as in
  /// `<cmp> -> <exp> \<= <exp>`. A `>` outside a variable is an ordinary
  /// character.
  pub fn convert<V>(
    &mut self,
    text: &str,
    evaluation: Option<Evaluation<V>>,
  ) -> Result<StaticRule<V>, LoadError> {
    let trimmed = text.trim_start();
    if !trimmed.starts_with('<') {
      return Err(LoadError::MissingHead {
        text: text.to_string(),
      });
    }

    let (head, rest) = split_variable(trimmed, text)?;
    let lhs = self.token(&format!("<{}>", head));

    let mut rest = rest.trim_start();
    if let Some(body) = rest.strip_prefix("->") {
      rest = body;
    }

    let mut rhs = Vec::new();
    loop {
      rest = rest.trim_start();
      match find_variable(rest) {
        _ if rest.is_empty() => break,
        Some(0) => {
          let (name, after) = split_variable(rest, text)?;
          rhs.push(self.token(&format!("<{}>", name)));
          rest = after;
        }
        Some(index) => {
          self.push_terminals(&rest[..index], &mut rhs);
          rest = &rest[index..];
        }
        None => {
          self.push_terminals(rest, &mut rhs);
          rest = "";
        }
      }
    }

    if evaluation.is_none() && rhs.len() != 1 {
      return Err(LoadError::MissingEvaluation {
        text: text.to_string(),
      });
    }

    log::trace!("Converted {:?} into {} -> {:?}", text, lhs, rhs);
    Ok(StaticRule::from_parts(lhs, rhs, evaluation))
  }

  pub fn convert_all<V, S: AsRef<str>>(
    &mut self,
    rules: impl IntoIterator<Item = (S, Option<Evaluation<V>>)>,
  ) -> Result<Vec<StaticRule<V>>, LoadError> {
    rules
      .into_iter()
      .map(|(text, evaluation)| self.convert(text.as_ref(), evaluation))
      .collect()
  }

  fn push_terminals(&mut self, text: &str, rhs: &mut Vec<Token>) {
    let pieces: Vec<&str> = if self.graphemes {
      let mut pieces = Vec::new();
      let mut graphemes = text.grapheme_indices(true);
      while let Some((start, grapheme)) = graphemes.next() {
        if grapheme == "\\" {
          let end = graphemes
            .next()
            .map_or(text.len(), |(index, next)| index + next.len());
          pieces.push(&text[start..end]);
        } else if !grapheme.trim().is_empty() {
          pieces.push(grapheme);
        }
      }
      pieces
    } else {
      text.split_whitespace().collect()
    };

    for piece in pieces {
      rhs.push(self.token(piece));
    }
  }
}

/// The index of the first `<` that is not escaped.
fn find_variable(text: &str) -> Option<usize> {
  let mut chars = text.char_indices();
  while let Some((index, c)) = chars.next() {
    match c {
      '\\' => {
        chars.next();
      }
      '<' => return Some(index),
      _ => {}
    }
  }
  None
}

fn unescape(spelling: &str) -> String {
  let mut name = String::with_capacity(spelling.len());
  let mut chars = spelling.chars();
  while let Some(c) = chars.next() {
    match c {
      '\\' => name.push(chars.next().unwrap_or('\\')),
      c => name.push(c),
    }
  }
  name
}

/// Splits `<name> rest` into the trimmed name and the rest.
fn split_variable<'t>(
  text: &'t str,
  rule: &str,
) -> Result<(&'t str, &'t str), LoadError> {
  let end = text.find('>').ok_or_else(|| LoadError::UnterminatedVariable {
    text: rule.to_string(),
  })?;

  let name = text[1..end].trim();
  if name.is_empty() {
    return Err(LoadError::EmptyVariable {
      text: rule.to_string(),
    });
  }

  Ok((name, &text[end + 1..]))
}

/// Converts `rules`, adds the `extra` rules after them, and returns the
/// normalized grammar. The head of the first rule is the start symbol.
pub fn load_cfg<I, V, S: AsRef<str>>(
  conversion: &mut RuleConversion,
  rules: impl IntoIterator<Item = (S, Option<Evaluation<V>>)>,
  extra: impl IntoIterator<Item = Rule<I, V>>,
) -> anyhow::Result<Cfg<I, V>> {
  let mut all: Vec<Rule<I, V>> = conversion
    .convert_all(rules)
    .context("while converting rules")?
    .into_iter()
    .map(Rule::from)
    .collect();
  all.extend(extra);

  let count = all.len();
  let mut cfg = Cfg::new(all)
    .with_context(|| format!("while building a grammar of {} rules", count))?;
  cfg.normalize();
  Ok(cfg)
}
