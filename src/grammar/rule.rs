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

//! Rules as the caller declares them, and the provenance of the rules the
//! normalizer derives from them.

use {
  super::{builder::BuilderInto, symbol::TokenId, Token},
  crate::{parsers::cyk::ParseNode, utils::Name},
  std::rc::Rc,
};

/// A semantic action. Receives the values of a rule's children, in
/// right-hand side order, and computes the value of the rule.
pub type Evaluation<V> = Rc<dyn Fn(Vec<V>) -> V>;

/// Wraps a closure as an evaluation, for the places that take an optional
/// one.
pub fn eval<V>(f: impl Fn(Vec<V>) -> V + 'static) -> Option<Evaluation<V>> {
  Some(Rc::new(f))
}

/// The index of a rule within the grammar that owns it.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct RuleId(pub(crate) usize);

impl RuleId {
  pub fn index(self) -> usize {
    self.0
  }
}

/// A rule with an explicit right-hand side.
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub struct StaticRule<V> {
  lhs: Token,
  rhs: Vec<Token>,
  #[derivative(Debug = "ignore")]
  evaluation: Option<Evaluation<V>>,
}

impl<V> StaticRule<V> {
  pub fn new(
    lhs: impl BuilderInto<Token>,
    rhs: Vec<Token>,
    evaluation: impl Fn(Vec<V>) -> V + 'static,
  ) -> Self {
    StaticRule {
      lhs: lhs.builder_into(),
      rhs,
      evaluation: Some(Rc::new(evaluation)),
    }
  }

  /// A rule `lhs -> symbol` whose value is the value of `symbol`.
  pub fn passthrough(
    lhs: impl BuilderInto<Token>,
    symbol: impl BuilderInto<Token>,
  ) -> Self {
    StaticRule {
      lhs: lhs.builder_into(),
      rhs: vec![symbol.builder_into()],
      evaluation: None,
    }
  }

  pub(crate) fn from_parts(
    lhs: Token,
    rhs: Vec<Token>,
    evaluation: Option<Evaluation<V>>,
  ) -> Self {
    assert!(
      evaluation.is_some() || rhs.len() == 1,
      "only single-symbol rules may pass their value through"
    );
    StaticRule {
      lhs,
      rhs,
      evaluation,
    }
  }

  pub fn lhs(&self) -> &Token {
    &self.lhs
  }

  pub fn rhs(&self) -> &[Token] {
    &self.rhs
  }

  pub fn evaluation(&self) -> Option<&Evaluation<V>> {
    self.evaluation.as_ref()
  }
}

/// Decides at parse time whether a dynamic rule applies.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
pub enum Matcher<I> {
  /// Applies to a single input element.
  Unary(Rc<dyn Fn(&I) -> bool>),
  /// Applies to two adjacent derivations.
  Binary(Rc<dyn Fn(&ParseNode<I>, &ParseNode<I>) -> bool>),
}

impl<I> Matcher<I> {
  pub fn arity(&self) -> usize {
    match self {
      Matcher::Unary(_) => 1,
      Matcher::Binary(_) => 2,
    }
  }
}

impl<I> std::fmt::Debug for Matcher<I> {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      Matcher::Unary(_) => fmt.write_str("Unary(..)"),
      Matcher::Binary(_) => fmt.write_str("Binary(..)"),
    }
  }
}

/// A rule without a fixed right-hand side. Whether it applies is decided by
/// its matcher, which may consult state owned by the caller.
///
/// Binary matchers are only offered pairs of derivations of caller-declared
/// variables.
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub struct DynamicRule<I, V> {
  lhs: Token,
  label: Name,
  matcher: Matcher<I>,
  #[derivative(Debug = "ignore")]
  evaluation: Option<Evaluation<V>>,
}

impl<I, V> DynamicRule<I, V> {
  /// A rule matching one input element. Without an evaluation, its value is
  /// the value of the element itself.
  pub fn unary(
    lhs: impl BuilderInto<Token>,
    label: impl AsRef<str>,
    predicate: impl Fn(&I) -> bool + 'static,
  ) -> Self {
    DynamicRule {
      lhs: lhs.builder_into(),
      label: Name::new(label.as_ref()),
      matcher: Matcher::Unary(Rc::new(predicate)),
      evaluation: None,
    }
  }

  pub fn binary(
    lhs: impl BuilderInto<Token>,
    label: impl AsRef<str>,
    predicate: impl Fn(&ParseNode<I>, &ParseNode<I>) -> bool + 'static,
    evaluation: impl Fn(Vec<V>) -> V + 'static,
  ) -> Self {
    DynamicRule {
      lhs: lhs.builder_into(),
      label: Name::new(label.as_ref()),
      matcher: Matcher::Binary(Rc::new(predicate)),
      evaluation: Some(Rc::new(evaluation)),
    }
  }

  pub fn with_evaluation(
    mut self,
    evaluation: impl Fn(Vec<V>) -> V + 'static,
  ) -> Self {
    self.evaluation = Some(Rc::new(evaluation));
    self
  }

  pub fn lhs(&self) -> &Token {
    &self.lhs
  }

  pub fn label(&self) -> &Name {
    &self.label
  }

  pub fn matcher(&self) -> &Matcher<I> {
    &self.matcher
  }

  pub fn evaluation(&self) -> Option<&Evaluation<V>> {
    self.evaluation.as_ref()
  }
}

#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub enum Rule<I, V> {
  Static(StaticRule<V>),
  Dynamic(DynamicRule<I, V>),
}

impl<I, V> Rule<I, V> {
  pub fn lhs(&self) -> &Token {
    match self {
      Rule::Static(rule) => rule.lhs(),
      Rule::Dynamic(rule) => rule.lhs(),
    }
  }

  pub fn evaluation(&self) -> Option<&Evaluation<V>> {
    match self {
      Rule::Static(rule) => rule.evaluation(),
      Rule::Dynamic(rule) => rule.evaluation(),
    }
  }
}

impl<I, V> From<StaticRule<V>> for Rule<I, V> {
  fn from(rule: StaticRule<V>) -> Self {
    Rule::Static(rule)
  }
}

impl<I, V> From<DynamicRule<I, V>> for Rule<I, V> {
  fn from(rule: DynamicRule<I, V>) -> Self {
    Rule::Dynamic(rule)
  }
}

/// Where a rule of a grammar came from.
///
/// Every variant other than `Declared` points back at rules created
/// earlier, so following the links always terminates.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Origin {
  /// Given by the caller.
  Declared,
  /// The rule from the synthesized start token to the caller's start symbol.
  Start,
  /// `V -> t`, where `V` stands in for the terminal `t` in longer rules.
  Isolated,
  /// One link of the chain that replaced `source`, a rule with a right-hand
  /// side longer than two.
  Split { source: RuleId },
  /// `source` with the nullable symbols at the listed positions removed.
  /// Positions index into the right-hand side of `source`, ascending.
  Erased {
    source: RuleId,
    erased: Vec<(usize, TokenId)>,
  },
  /// The body of `inner`, lifted through the unit rules of `chain` (outermost
  /// first).
  Lifted { chain: Vec<RuleId>, inner: RuleId },
}

impl Origin {
  /// The rule this one was derived from, if any.
  pub fn source_rule(&self) -> Option<RuleId> {
    match self {
      Origin::Declared | Origin::Start | Origin::Isolated => None,
      Origin::Split { source } | Origin::Erased { source, .. } => Some(*source),
      Origin::Lifted { inner, .. } => Some(*inner),
    }
  }
}
