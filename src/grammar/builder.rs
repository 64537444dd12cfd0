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

use super::{Cfg, DynamicRule, GrammarError, Rule, StaticRule, Token};

/// A helper trait to allow builder methods to either take a type `T`, or a
/// reference to `T` if it is clonable.
pub trait BuilderInto<T> {
  /// Consumes self and produces a value of type `T`.
  fn builder_into(self) -> T;
}

impl<T> BuilderInto<T> for T {
  fn builder_into(self) -> T {
    self
  }
}

impl<'a, T> BuilderInto<T> for &'a T
where
  T: Clone,
{
  fn builder_into(self) -> T {
    self.clone()
  }
}

pub struct CfgBuilder<I, V> {
  rules: Vec<Rule<I, V>>,
}

impl<I, V> CfgBuilder<I, V> {
  fn new() -> Self {
    CfgBuilder { rules: Vec::new() }
  }

  pub fn add_rule(
    &mut self,
    lhs: impl BuilderInto<Token>,
    rhs: &[&Token],
    evaluation: impl Fn(Vec<V>) -> V + 'static,
  ) -> &mut Self {
    let rhs = rhs.iter().map(|t| (*t).clone()).collect();
    self
      .rules
      .push(StaticRule::new(lhs, rhs, evaluation).into());
    self
  }

  pub fn add_passthrough(
    &mut self,
    lhs: impl BuilderInto<Token>,
    symbol: impl BuilderInto<Token>,
  ) -> &mut Self {
    self.rules.push(StaticRule::passthrough(lhs, symbol).into());
    self
  }

  pub fn add_dynamic(&mut self, rule: DynamicRule<I, V>) -> &mut Self {
    self.rules.push(rule.into());
    self
  }
}

/// Builds a grammar using a builder function. The head of the first rule
/// added is the start symbol.
///
/// Example:
///
/// ```rust
/// # use chomsky::grammar::{Cfg, Token};
/// let t_a = Token::terminal("a");
/// let nt_x = Token::variable("x");
/// let g: Cfg<&str, usize> = chomsky::grammar::build(|gb| {
///   gb.add_rule(&nt_x, &[&t_a, &nt_x, &t_a], |args: Vec<usize>| args[1] + 2)
///     .add_rule(&nt_x, &[], |_| 0);
/// })
/// .unwrap();
/// assert!(!g.is_normalized());
/// ```
pub fn build<I, V>(
  build_fn: impl FnOnce(&mut CfgBuilder<I, V>),
) -> Result<Cfg<I, V>, GrammarError> {
  let mut builder = CfgBuilder::new();
  build_fn(&mut builder);
  Cfg::new(builder.rules)
}
