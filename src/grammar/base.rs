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

use {
  super::{
    rule::{Evaluation, Matcher, Origin, Rule, RuleId},
    symbol::{TokenData, TokenId, TokenKey},
    transform, Token,
  },
  crate::utils::{Name, ToDoc},
  std::collections::BTreeMap,
};

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
  #[error("a grammar needs at least one rule")]
  NoRules,
  #[error("rule head {name:?} is a terminal")]
  TerminalHead { name: String },
}

/// What makes two rules with the same head the same rule.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub(crate) enum RuleShape {
  Static(Vec<TokenId>),
  /// Dynamic rules are distinct per declaration.
  Dynamic(usize),
}

#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub(crate) enum RuleBody<I> {
  Static(Vec<TokenId>),
  Dynamic {
    id: usize,
    label: Name,
    matcher: Matcher<I>,
  },
}

impl<I> RuleBody<I> {
  fn shape(&self) -> RuleShape {
    match self {
      RuleBody::Static(rhs) => RuleShape::Static(rhs.clone()),
      RuleBody::Dynamic { id, .. } => RuleShape::Dynamic(*id),
    }
  }

  pub(crate) fn rhs(&self) -> Option<&[TokenId]> {
    match self {
      RuleBody::Static(rhs) => Some(rhs),
      RuleBody::Dynamic { .. } => None,
    }
  }

  pub(crate) fn arity(&self) -> usize {
    match self {
      RuleBody::Static(rhs) => rhs.len(),
      RuleBody::Dynamic { matcher, .. } => matcher.arity(),
    }
  }
}

#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub(crate) struct RuleData<I, V> {
  lhs: TokenId,
  body: RuleBody<I>,
  #[derivative(Debug = "ignore")]
  evaluation: Option<Evaluation<V>>,
  origin: Origin,
}

impl<I, V> RuleData<I, V> {
  pub(crate) fn lhs(&self) -> TokenId {
    self.lhs
  }

  pub(crate) fn body(&self) -> &RuleBody<I> {
    &self.body
  }

  /// The right-hand side of a static rule. Dynamic rules have none.
  pub(crate) fn rhs(&self) -> &[TokenId] {
    self.body.rhs().unwrap_or(&[])
  }

  pub(crate) fn evaluation(&self) -> Option<&Evaluation<V>> {
    self.evaluation.as_ref()
  }

  pub(crate) fn origin(&self) -> &Origin {
    &self.origin
  }

  fn key(&self) -> (TokenId, RuleShape) {
    (self.lhs, self.body.shape())
  }
}

/// A context-free grammar.
///
/// The grammar owns every token and rule it refers to, addressed by
/// `TokenId` and `RuleId`. Rules removed by normalization stay in the arena
/// so derivations can be traced back to the rules they came from; only the
/// active rules take part in parsing.
///
/// The head of the first rule is the start symbol. The grammar wraps it in a
/// synthesized start token, with a rule `start -> S`.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Cfg<I, V> {
  tokens: Vec<TokenData>,
  token_index: BTreeMap<TokenKey, TokenId>,
  rules: Vec<RuleData<I, V>>,
  active: BTreeMap<(TokenId, RuleShape), RuleId>,
  start: TokenId,
  start_rule: RuleId,
  null_rules: BTreeMap<TokenId, RuleId>,
  simple_rules: Vec<RuleId>,
  complex_rules: Vec<RuleId>,
  normalized: bool,
}

impl<I, V> Cfg<I, V> {
  /// Creates a grammar from a list of rules. Rules equal in head and
  /// right-hand side to an earlier rule are dropped.
  pub fn new(rules: Vec<Rule<I, V>>) -> Result<Self, GrammarError> {
    let first_head = match rules.first() {
      Some(rule) => rule.lhs().clone(),
      None => return Err(GrammarError::NoRules),
    };

    if let Some(rule) = rules.iter().find(|rule| rule.lhs().is_terminal()) {
      return Err(GrammarError::TerminalHead {
        name: rule.lhs().name().to_string(),
      });
    }

    let mut cfg = Cfg {
      tokens: Vec::new(),
      token_index: BTreeMap::new(),
      rules: Vec::new(),
      active: BTreeMap::new(),
      start: TokenId(0),
      start_rule: RuleId(0),
      null_rules: BTreeMap::new(),
      simple_rules: Vec::new(),
      complex_rules: Vec::new(),
      normalized: false,
    };

    let (start, _) = cfg.intern(TokenKey::Start, Token::variable("start"));
    let head = cfg.source_token(first_head);
    cfg.start = start;
    cfg.start_rule = cfg
      .add_rule(start, RuleBody::Static(vec![head]), None, Origin::Start)
      .expect("the start rule is the first rule of a grammar");

    for (index, rule) in rules.into_iter().enumerate() {
      let lhs = cfg.source_token(rule.lhs().clone());
      let evaluation = rule.evaluation().cloned();
      let body = match rule {
        Rule::Static(rule) => RuleBody::Static(
          rule
            .rhs()
            .iter()
            .map(|token| cfg.source_token(token.clone()))
            .collect(),
        ),
        Rule::Dynamic(rule) => RuleBody::Dynamic {
          id: index,
          label: rule.label().clone(),
          matcher: rule.matcher().clone(),
        },
      };

      if cfg.add_rule(lhs, body, evaluation, Origin::Declared).is_none() {
        log::trace!("Dropping duplicate rule #{} for {}", index, cfg.token(lhs));
      }
    }

    log::debug!(
      "Built grammar with {} tokens and {} rules",
      cfg.tokens.len(),
      cfg.active.len()
    );

    Ok(cfg)
  }

  /// Transforms the grammar into Chomsky Normal Form. Normalizing a grammar
  /// twice has no further effect.
  pub fn normalize(&mut self) {
    if self.normalized {
      log::trace!("Grammar is already normalized");
      return;
    }

    transform::isolate_terminals(self);
    transform::binarize(self);
    transform::remove_nullables(self);
    transform::remove_unit_rules(self);

    let (simple_rules, complex_rules): (Vec<_>, Vec<_>) = self
      .active_rule_ids()
      .into_iter()
      .filter(|id| self.rules[id.0].body.arity() > 0)
      .partition(|id| self.rules[id.0].body.arity() == 1);
    self.simple_rules = simple_rules;
    self.complex_rules = complex_rules;
    self.normalized = true;

    log::debug!(
      "Normalized grammar: {} simple rules, {} complex rules",
      self.simple_rules.len(),
      self.complex_rules.len()
    );
    debug_assert!(self.is_normal());
  }

  pub fn is_normalized(&self) -> bool {
    self.normalized
  }

  /// Returns true if every active rule has Chomsky Normal Form shape: an
  /// empty right-hand side only for the start token, a single symbol only
  /// if it is a terminal, and otherwise exactly two variables.
  pub fn is_normal(&self) -> bool {
    self.active.keys().all(|(lhs, shape)| match shape {
      RuleShape::Dynamic(_) => true,
      RuleShape::Static(rhs) => match rhs.as_slice() {
        [] => *lhs == self.start,
        [symbol] => self.token(*symbol).is_terminal(),
        [left, right] => {
          self.token(*left).is_variable() && self.token(*right).is_variable()
        }
        _ => false,
      },
    })
  }

  /// The synthesized start token.
  pub fn start_token(&self) -> TokenId {
    self.start
  }

  /// The rule `start -> S`, where `S` is the head of the first rule.
  pub fn start_rule(&self) -> RuleId {
    self.start_rule
  }

  /// The token as it is displayed. Synthesized tokens get descriptive names
  /// that may coincide with caller tokens.
  pub fn token(&self, id: TokenId) -> &Token {
    self.tokens[id.0].display()
  }

  /// Looks up a caller token.
  pub fn token_id(&self, token: &Token) -> Option<TokenId> {
    self
      .token_index
      .get(&TokenKey::Source(token.clone()))
      .copied()
  }

  pub fn token_ids(&self) -> impl Iterator<Item = TokenId> {
    (0..self.tokens.len()).map(TokenId)
  }

  /// For an abbreviation introduced by binarization, the suffix it stands
  /// for.
  pub fn expansion(&self, id: TokenId) -> Option<&[TokenId]> {
    self.tokens[id.0].expansion()
  }

  pub fn is_synthetic(&self, id: TokenId) -> bool {
    self.tokens[id.0].is_synthetic()
  }

  pub fn is_nullable(&self, id: TokenId) -> bool {
    self.tokens[id.0].is_nullable()
  }

  /// The rule of the canonical empty derivation of a nullable token.
  pub fn null_rule(&self, id: TokenId) -> Option<RuleId> {
    self.null_rules.get(&id).copied()
  }

  /// Returns a view of any rule, active or not.
  pub fn rule(&self, id: RuleId) -> RuleRef<'_, I, V> {
    RuleRef {
      cfg: self,
      id,
      data: &self.rules[id.0],
    }
  }

  /// The active rules, in creation order.
  pub fn rules(&self) -> impl Iterator<Item = RuleRef<'_, I, V>> + '_ {
    self.active_rule_ids().into_iter().map(move |id| self.rule(id))
  }

  /// Rules with a single symbol (or a unary matcher) on the right. Empty
  /// until the grammar is normalized.
  pub fn simple_rules(&self) -> &[RuleId] {
    &self.simple_rules
  }

  /// Rules with two symbols (or a binary matcher) on the right. Empty until
  /// the grammar is normalized.
  pub fn complex_rules(&self) -> &[RuleId] {
    &self.complex_rules
  }

  pub fn to_pretty(&self) -> String {
    let arena = pretty::Arena::new();
    format!("{}", self.to_doc(&arena).into_doc().pretty(80))
  }

  // Internals shared with the transforms and the parser.

  pub(crate) fn rule_data(&self, id: RuleId) -> &RuleData<I, V> {
    &self.rules[id.0]
  }

  pub(crate) fn active_rule_ids(&self) -> Vec<RuleId> {
    let mut ids: Vec<_> = self.active.values().copied().collect();
    ids.sort();
    ids
  }

  pub(crate) fn lookup(&self, key: &TokenKey) -> Option<TokenId> {
    self.token_index.get(key).copied()
  }

  /// Returns the token for `key`, creating it if needed. The flag is true if
  /// the token was created.
  pub(crate) fn intern(
    &mut self,
    key: TokenKey,
    display: Token,
  ) -> (TokenId, bool) {
    if let Some(id) = self.lookup(&key) {
      return (id, false);
    }

    let id = TokenId(self.tokens.len());
    self.tokens.push(TokenData::new(key.clone(), display));
    self.token_index.insert(key, id);
    (id, true)
  }

  fn source_token(&mut self, token: Token) -> TokenId {
    self.intern(TokenKey::Source(token.clone()), token).0
  }

  /// Adds a rule unless an active rule with the same head and body exists.
  pub(crate) fn add_rule(
    &mut self,
    lhs: TokenId,
    body: RuleBody<I>,
    evaluation: Option<Evaluation<V>>,
    origin: Origin,
  ) -> Option<RuleId> {
    let data = RuleData {
      lhs,
      body,
      evaluation,
      origin,
    };
    let key = data.key();
    if self.active.contains_key(&key) {
      return None;
    }

    let id = RuleId(self.rules.len());
    log::trace!("Adding rule {:?}: {:?}", id, data);
    self.rules.push(data);
    self.active.insert(key, id);
    Some(id)
  }

  /// Adds a copy of the body and evaluation of `template` under a new head.
  pub(crate) fn add_derived_rule(
    &mut self,
    lhs: TokenId,
    template: RuleId,
    origin: Origin,
  ) -> Option<RuleId> {
    let RuleData {
      body, evaluation, ..
    } = self.rules[template.0].clone();
    self.add_rule(lhs, body, evaluation, origin)
  }

  /// Takes a rule out of the active set. It stays in the arena.
  pub(crate) fn deactivate(&mut self, id: RuleId) {
    let key = self.rules[id.0].key();
    log::trace!("Removing rule {:?}", id);
    let removed = self.active.remove(&key);
    assert_eq!(removed, Some(id), "only active rules can be removed");
  }

  /// Rewrites the right-hand side of an active static rule in place.
  pub(crate) fn rewrite_rhs(&mut self, id: RuleId, rhs: Vec<TokenId>) {
    self.deactivate(id);
    let data = &mut self.rules[id.0];
    data.body = RuleBody::Static(rhs);
    let key = data.key();
    let previous = self.active.insert(key, id);
    assert!(previous.is_none(), "rewritten rules stay distinct");
  }

  pub(crate) fn mark_nullable(&mut self, id: TokenId, null_rule: RuleId) {
    self.tokens[id.0].set_nullable();
    self.null_rules.insert(id, null_rule);
  }
}

impl<I, V> ToDoc for Cfg<I, V> {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    da.intersperse(
      self
        .rules()
        .map(|rule| rule.to_doc(da).append(da.text(";"))),
      da.hardline(),
    )
  }
}

/// A read-only view of one rule of a grammar.
pub struct RuleRef<'a, I, V> {
  cfg: &'a Cfg<I, V>,
  id: RuleId,
  data: &'a RuleData<I, V>,
}

impl<I, V> Clone for RuleRef<'_, I, V> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<I, V> Copy for RuleRef<'_, I, V> {}

impl<'a, I, V> RuleRef<'a, I, V> {
  pub fn id(&self) -> RuleId {
    self.id
  }

  pub fn lhs(&self) -> TokenId {
    self.data.lhs
  }

  /// The right-hand side of a static rule, or `None` for a dynamic rule.
  pub fn rhs(&self) -> Option<&'a [TokenId]> {
    self.data.body.rhs()
  }

  pub fn is_dynamic(&self) -> bool {
    self.rhs().is_none()
  }

  pub fn is_unit(&self) -> bool {
    match self.rhs() {
      Some([symbol]) => self.cfg.token(*symbol).is_variable(),
      _ => false,
    }
  }

  pub fn origin(&self) -> &'a Origin {
    &self.data.origin
  }

  pub fn source_rule(&self) -> Option<RuleId> {
    self.data.origin.source_rule()
  }

  pub fn evaluation(&self) -> Option<&'a Evaluation<V>> {
    self.data.evaluation.as_ref()
  }
}

impl<I, V> ToDoc for RuleRef<'_, I, V> {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    let body = match &self.data.body {
      RuleBody::Static(rhs) if rhs.is_empty() => da.text("ε"),
      RuleBody::Static(rhs) => da.intersperse(
        rhs.iter().map(|id| self.cfg.token(*id).to_doc(da)),
        da.softline(),
      ),
      RuleBody::Dynamic { label, .. } => {
        da.text("[").append(label.to_doc(da)).append(da.text("]"))
      }
    };

    self
      .cfg
      .token(self.lhs())
      .to_doc(da)
      .append(da.text(" ->"))
      .append(da.softline())
      .append(body.nest(2))
      .group()
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::grammar::{examples, DynamicRule, StaticRule};

  #[test]
  fn test_empty_grammar_is_rejected() {
    let result: Result<Cfg<&str, i64>, _> = Cfg::new(vec![]);
    assert!(matches!(result, Err(GrammarError::NoRules)));
  }

  #[test]
  fn test_terminal_head_is_rejected() {
    let t = Token::terminal("t");
    let result: Result<Cfg<&str, i64>, _> =
      Cfg::new(vec![StaticRule::new(&t, vec![], |_| 0).into()]);
    match result {
      Err(GrammarError::TerminalHead { name }) => assert_eq!(name, "t"),
      other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
  }

  #[test]
  fn test_start_rule() {
    let cfg = examples::make_sum();
    let start_rule = cfg.rule(cfg.start_rule());
    assert_eq!(start_rule.lhs(), cfg.start_token());
    assert_eq!(start_rule.origin(), &Origin::Start);
    let sum = cfg.token_id(&Token::variable("sum")).unwrap();
    assert_eq!(start_rule.rhs(), Some(&[sum][..]));
    assert!(cfg.is_synthetic(cfg.start_token()));
    assert!(!cfg.is_synthetic(sum));
  }

  #[test]
  fn test_duplicate_rules_are_merged() {
    let a = Token::variable("a");
    let x = Token::terminal("x");
    let cfg: Cfg<&str, i64> = Cfg::new(vec![
      StaticRule::new(&a, vec![x.clone()], |_| 1).into(),
      StaticRule::new(&a, vec![x.clone()], |_| 2).into(),
    ])
    .unwrap();
    // The start rule, and one rule for `a`.
    assert_eq!(cfg.rules().count(), 2);
    let rule = cfg.rules().last().unwrap();
    assert_eq!((rule.evaluation().unwrap())(vec![]), 1);
  }

  #[test]
  fn test_dynamic_rules_are_distinct() {
    let a = Token::variable("a");
    let cfg: Cfg<char, i64> = Cfg::new(vec![
      DynamicRule::unary(&a, "digit", |c: &char| c.is_ascii_digit()).into(),
      DynamicRule::unary(&a, "digit", |c: &char| c.is_ascii_digit()).into(),
    ])
    .unwrap();
    assert_eq!(cfg.rules().filter(|rule| rule.is_dynamic()).count(), 2);
  }

  #[test]
  fn test_is_normal() {
    let mut cfg = examples::make_sum();
    assert!(!cfg.is_normal());
    cfg.normalize();
    assert!(cfg.is_normal());
    assert!(cfg.is_normalized());
  }

  #[test]
  fn test_partition() {
    let mut cfg = examples::make_sum();
    assert!(cfg.simple_rules().is_empty());
    cfg.normalize();
    for id in cfg.simple_rules() {
      assert_eq!(cfg.rule(*id).rhs().map(|rhs| rhs.len()), Some(1));
    }
    for id in cfg.complex_rules() {
      assert_eq!(cfg.rule(*id).rhs().map(|rhs| rhs.len()), Some(2));
    }
    assert!(!cfg.simple_rules().is_empty());
    assert!(!cfg.complex_rules().is_empty());
  }

  #[test]
  fn test_rule_refs_are_copies() {
    fn both<T: Clone>(value: &T) -> (T, T) {
      (value.clone(), value.clone())
    }

    let cfg = examples::make_sum();
    let refs: Vec<_> = cfg.rules().collect();
    let first = refs[0];
    let (left, right) = both(&first);
    assert_eq!(left.id(), first.id());
    assert_eq!(right.lhs(), refs[0].lhs());
    assert_eq!(refs.len(), cfg.rules().count());
  }

  #[test]
  fn test_pretty() {
    let cfg = examples::make_sum();
    let text = cfg.to_pretty();
    assert!(text.contains("<start> -> <sum>;"), "{}", text);
    assert!(text.contains("<sum> -> <sum> \"+\" <sum>;"), "{}", text);
  }
}
