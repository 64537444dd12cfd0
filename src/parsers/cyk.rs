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

//! A CYK parser over grammars in Chomsky Normal Form.
//!
//! The table holds, for every span of the input, every derivation of that
//! span. Static rules are matched by comparing the heads of adjacent
//! derivations to their right-hand side. Dynamic rules are matched by
//! running their matcher, which may depend on state the grammar does not
//! know about. The result is the forest of all derivations of the whole
//! input from the start token.

use {
  super::{tree::Tree, InputSymbol},
  crate::grammar::{Cfg, Matcher, RuleBody, RuleId, Token, TokenId},
  std::{
    collections::{BTreeMap, BTreeSet},
    ops::Range,
    rc::Rc,
  },
};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
  #[error("cannot parse an empty input")]
  Empty,
  #[error("the grammar must be normalized before parsing")]
  NotNormalized,
}

#[derive(Derivative)]
#[derivative(Debug(bound = "I: std::fmt::Debug"))]
pub enum NodeBody<I> {
  Leaf(I),
  Branch(Rc<ParseNode<I>>, Rc<ParseNode<I>>),
}

/// A derivation of a span of the input in the normalized grammar: the rule
/// applied, and either the input element it matched or the two derivations
/// it joined.
///
/// Two nodes are equal when they apply the same rule over the same span to
/// equal children, or to equal input elements.
#[derive(Derivative)]
#[derivative(Debug(bound = "I: std::fmt::Debug"))]
pub struct ParseNode<I> {
  lhs: TokenId,
  head: Token,
  synthetic: bool,
  rule: RuleId,
  span: Range<usize>,
  #[derivative(Debug = "ignore")]
  uid: usize,
  body: NodeBody<I>,
}

impl<I> ParseNode<I> {
  pub fn lhs(&self) -> TokenId {
    self.lhs
  }

  pub fn head(&self) -> &Token {
    &self.head
  }

  /// Returns true if the head was introduced by normalization.
  pub fn is_synthetic(&self) -> bool {
    self.synthetic
  }

  /// Returns true if this node derives the caller token `token`.
  pub fn derives(&self, token: &Token) -> bool {
    !self.synthetic && &self.head == token
  }

  pub fn rule(&self) -> RuleId {
    self.rule
  }

  pub fn span(&self) -> Range<usize> {
    self.span.clone()
  }

  pub fn body(&self) -> &NodeBody<I> {
    &self.body
  }

  pub fn input(&self) -> Option<&I> {
    match &self.body {
      NodeBody::Leaf(input) => Some(input),
      NodeBody::Branch(..) => None,
    }
  }

  pub fn children(&self) -> Option<(&ParseNode<I>, &ParseNode<I>)> {
    match &self.body {
      NodeBody::Leaf(_) => None,
      NodeBody::Branch(left, right) => Some((left, right)),
    }
  }

  /// The input elements this node spans, in order.
  pub fn leaves(&self) -> Vec<&I> {
    let mut leaves = Vec::new();
    let mut pending = vec![self];
    while let Some(node) = pending.pop() {
      match &node.body {
        NodeBody::Leaf(input) => leaves.push(input),
        NodeBody::Branch(left, right) => {
          pending.push(right);
          pending.push(left);
        }
      }
    }
    leaves
  }
}

impl<I: PartialEq> PartialEq for ParseNode<I> {
  fn eq(&self, other: &Self) -> bool {
    let mut pending = vec![(self, other)];
    while let Some((left, right)) = pending.pop() {
      if left.lhs != right.lhs
        || left.rule != right.rule
        || left.span != right.span
      {
        return false;
      }

      match (&left.body, &right.body) {
        (NodeBody::Leaf(l), NodeBody::Leaf(r)) => {
          if l != r {
            return false;
          }
        }
        (NodeBody::Branch(ll, lr), NodeBody::Branch(rl, rr)) => {
          pending.push((lr, rr));
          pending.push((ll, rl));
        }
        _ => return false,
      }
    }
    true
  }
}

impl<I: Eq> Eq for ParseNode<I> {}

/// Derivations within one cell are identified by their head and children.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
enum NodeKey {
  Leaf(TokenId),
  Branch(TokenId, usize, usize),
}

#[derive(Derivative)]
#[derivative(Default(bound = ""))]
struct Cell<I> {
  nodes: BTreeMap<TokenId, Vec<Rc<ParseNode<I>>>>,
  seen: BTreeSet<NodeKey>,
}

impl<I> Cell<I> {
  fn len(&self) -> usize {
    self.seen.len()
  }

  fn nodes(&self) -> impl Iterator<Item = &Rc<ParseNode<I>>> {
    self.nodes.values().flatten()
  }
}

/// Builds the nodes of one parse, numbering them as they are kept.
struct NodeFactory<'g, I, V> {
  cfg: &'g Cfg<I, V>,
  next_uid: usize,
}

impl<'g, I, V> NodeFactory<'g, I, V> {
  fn add(
    &mut self,
    cell: &mut Cell<I>,
    rule: RuleId,
    span: Range<usize>,
    body: NodeBody<I>,
  ) {
    let lhs = self.cfg.rule_data(rule).lhs();
    let key = match &body {
      NodeBody::Leaf(_) => NodeKey::Leaf(lhs),
      NodeBody::Branch(left, right) => NodeKey::Branch(lhs, left.uid, right.uid),
    };

    if !cell.seen.insert(key) {
      return;
    }

    let node = ParseNode {
      lhs,
      head: self.cfg.token(lhs).clone(),
      synthetic: self.cfg.is_synthetic(lhs),
      rule,
      span,
      uid: self.next_uid,
      body,
    };
    self.next_uid += 1;
    cell.nodes.entry(lhs).or_default().push(Rc::new(node));
  }
}

/// A derivation of a whole input.
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = "I: std::fmt::Debug"))]
pub struct Derivation<'g, I, V> {
  #[derivative(Debug = "ignore")]
  cfg: &'g Cfg<I, V>,
  root: Rc<ParseNode<I>>,
}

impl<'g, I, V> Derivation<'g, I, V> {
  pub fn root(&self) -> &ParseNode<I> {
    &self.root
  }

  /// Rebuilds the derivation in the shape of the rules as they were
  /// declared.
  pub fn unwind(&self) -> Tree<I, V>
  where
    I: Clone,
  {
    super::tree::unwind(self.cfg, &self.root)
  }
}

impl<I: PartialEq, V> PartialEq for Derivation<'_, I, V> {
  fn eq(&self, other: &Self) -> bool {
    self.root == other.root
  }
}

/// A parser over a normalized grammar. Parsing does not change the grammar,
/// so one parser can be used for any number of inputs.
pub struct CfgParser<'g, I, V> {
  cfg: &'g Cfg<I, V>,
  /// Static `A -> t` rules, with the name of `t`.
  terminal_rules: Vec<(RuleId, String)>,
  unary_rules: Vec<RuleId>,
  /// Static `A -> B C` rules, by `(B, C)`.
  pair_rules: BTreeMap<(TokenId, TokenId), Vec<RuleId>>,
  binary_rules: Vec<RuleId>,
}

impl<'g, I, V> CfgParser<'g, I, V> {
  pub fn new(cfg: &'g Cfg<I, V>) -> Result<Self, ParseError> {
    if !cfg.is_normalized() {
      return Err(ParseError::NotNormalized);
    }

    let mut terminal_rules = Vec::new();
    let mut unary_rules = Vec::new();
    for id in cfg.simple_rules() {
      match cfg.rule_data(*id).body() {
        RuleBody::Static(rhs) => {
          terminal_rules.push((*id, cfg.token(rhs[0]).name().to_string()))
        }
        RuleBody::Dynamic { .. } => unary_rules.push(*id),
      }
    }

    let mut pair_rules: BTreeMap<_, Vec<_>> = BTreeMap::new();
    let mut binary_rules = Vec::new();
    for id in cfg.complex_rules() {
      match cfg.rule_data(*id).body() {
        RuleBody::Static(rhs) => {
          pair_rules.entry((rhs[0], rhs[1])).or_default().push(*id)
        }
        RuleBody::Dynamic { .. } => binary_rules.push(*id),
      }
    }

    Ok(CfgParser {
      cfg,
      terminal_rules,
      unary_rules,
      pair_rules,
      binary_rules,
    })
  }

  pub fn cfg(&self) -> &'g Cfg<I, V> {
    self.cfg
  }
}

impl<'g, I, V> CfgParser<'g, I, V>
where
  I: Clone,
{
  /// Returns every derivation of `input` from the start token. An input the
  /// grammar does not derive gives an empty forest; an ambiguous one gives
  /// several derivations, in no particular order of preference.
  pub fn parse(
    &self,
    input: &[I],
  ) -> Result<Vec<Derivation<'g, I, V>>, ParseError>
  where
    I: InputSymbol,
  {
    self.parse_with(input, |symbol: &I, name: &str| symbol.is_terminal(name))
  }

  /// Like `parse`, with `is_terminal` deciding whether an input element is
  /// an occurrence of a terminal. Input types that do not implement
  /// `InputSymbol`, such as those of grammars with only dynamic rules, are
  /// parsed this way.
  pub fn parse_with(
    &self,
    input: &[I],
    is_terminal: impl Fn(&I, &str) -> bool,
  ) -> Result<Vec<Derivation<'g, I, V>>, ParseError> {
    if input.is_empty() {
      return Err(ParseError::Empty);
    }

    let n = input.len();
    let mut factory = NodeFactory {
      cfg: self.cfg,
      next_uid: 0,
    };

    // table[i][l - 1] holds the derivations of input[i..i + l].
    let mut table: Vec<Vec<Cell<I>>> = Vec::with_capacity(n);
    for (position, symbol) in input.iter().enumerate() {
      let mut cell = Cell::default();
      for rule in self.matching_simple_rules(symbol, &is_terminal) {
        factory.add(
          &mut cell,
          rule,
          position..position + 1,
          NodeBody::Leaf(symbol.clone()),
        );
      }
      table.push(vec![cell]);
    }

    for length in 2..=n {
      for start in 0..=(n - length) {
        let mut cell = Cell::default();
        for split in 1..length {
          let left = &table[start][split - 1];
          let right = &table[start + split][length - split - 1];
          self.combine(&mut factory, left, right, &mut cell);
        }
        log::trace!(
          "Cell {}..{} has {} derivations",
          start,
          start + length,
          cell.len()
        );
        table[start].push(cell);
      }
    }

    let start = self.cfg.start_token();
    let forest: Vec<_> = table[0][n - 1]
      .nodes
      .get(&start)
      .into_iter()
      .flatten()
      .map(|root| Derivation {
        cfg: self.cfg,
        root: root.clone(),
      })
      .collect();

    log::debug!(
      "Parsed {} symbols into {} derivations ({} nodes)",
      n,
      forest.len(),
      factory.next_uid
    );

    Ok(forest)
  }

  fn matching_simple_rules<'s, F>(
    &'s self,
    symbol: &'s I,
    is_terminal: &'s F,
  ) -> impl Iterator<Item = RuleId> + 's
  where
    F: Fn(&I, &str) -> bool,
  {
    let terminals = self
      .terminal_rules
      .iter()
      .filter(move |(_, name)| is_terminal(symbol, name))
      .map(|(rule, _)| *rule);

    let dynamic = self.unary_rules.iter().copied().filter(move |rule| {
      match self.cfg.rule_data(*rule).body() {
        RuleBody::Dynamic {
          matcher: Matcher::Unary(predicate),
          ..
        } => predicate(symbol),
        _ => false,
      }
    });

    terminals.chain(dynamic)
  }

  fn combine(
    &self,
    factory: &mut NodeFactory<'g, I, V>,
    left: &Cell<I>,
    right: &Cell<I>,
    cell: &mut Cell<I>,
  ) {
    for (left_lhs, left_nodes) in &left.nodes {
      for (right_lhs, right_nodes) in &right.nodes {
        let rules = match self.pair_rules.get(&(*left_lhs, *right_lhs)) {
          Some(rules) => rules,
          None => continue,
        };

        for rule in rules {
          for left_node in left_nodes {
            for right_node in right_nodes {
              factory.add(
                cell,
                *rule,
                left_node.span.start..right_node.span.end,
                NodeBody::Branch(left_node.clone(), right_node.clone()),
              );
            }
          }
        }
      }
    }

    if self.binary_rules.is_empty() {
      return;
    }

    // Binary matchers only see derivations of caller variables.
    for left_node in left.nodes().filter(|node| !node.synthetic) {
      for right_node in right.nodes().filter(|node| !node.synthetic) {
        for rule in &self.binary_rules {
          let applies = match self.cfg.rule_data(*rule).body() {
            RuleBody::Dynamic {
              matcher: Matcher::Binary(predicate),
              ..
            } => predicate(&**left_node, &**right_node),
            _ => false,
          };

          if applies {
            factory.add(
              cell,
              *rule,
              left_node.span.start..right_node.span.end,
              NodeBody::Branch(left_node.clone(), right_node.clone()),
            );
          }
        }
      }
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::grammar::{build, examples, DynamicRule};
  use std::{cell::RefCell, collections::HashSet};

  fn normalized(mut cfg: examples::ExampleCfg) -> examples::ExampleCfg {
    cfg.normalize();
    cfg
  }

  #[test]
  fn test_requires_normalized_grammar() {
    let cfg = examples::make_sum();
    assert!(matches!(
      CfgParser::new(&cfg),
      Err(ParseError::NotNormalized)
    ));
  }

  #[test]
  fn test_empty_input_is_rejected() {
    let cfg = normalized(examples::make_optional());
    let parser = CfgParser::new(&cfg).unwrap();
    assert!(matches!(parser.parse(&[]), Err(ParseError::Empty)));
  }

  #[test]
  fn test_simple_parse() {
    let cfg = normalized(examples::make_sum());
    let parser = CfgParser::new(&cfg).unwrap();
    let forest = parser.parse(&["1", "+", "2"]).unwrap();
    assert_eq!(forest.len(), 1);

    let root = forest[0].root();
    assert_eq!(root.lhs(), cfg.start_token());
    assert_eq!(root.span(), 0..3);
    assert_eq!(root.leaves(), vec![&"1", &"+", &"2"]);
  }

  #[test]
  fn test_rejection_is_an_empty_forest() {
    let cfg = normalized(examples::make_sum());
    let parser = CfgParser::new(&cfg).unwrap();
    assert!(parser.parse(&["1", "+"]).unwrap().is_empty());
    assert!(parser.parse(&["3"]).unwrap().is_empty());
  }

  #[test]
  fn test_ambiguity() {
    let cfg = normalized(examples::make_sum());
    let parser = CfgParser::new(&cfg).unwrap();
    let forest = parser.parse(&["1", "+", "1", "+", "1"]).unwrap();
    assert_eq!(forest.len(), 2);
    assert!(forest[0] != forest[1]);
  }

  #[test]
  fn test_different_inputs_are_unequal() {
    let s = Token::variable("s");
    let cfg: examples::ExampleCfg = normalized(
      build(|gb| {
        gb.add_passthrough(&s, Token::terminal("1"))
          .add_passthrough(&s, Token::terminal("2"));
      })
      .unwrap(),
    );
    let parser = CfgParser::new(&cfg).unwrap();

    let one = parser.parse(&["1"]).unwrap();
    let two = parser.parse(&["2"]).unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(two.len(), 1);
    assert!(one[0] != two[0]);
    assert!(one[0].root() != two[0].root());
    assert_ne!(one[0].root().rule(), two[0].root().rule());
  }

  #[test]
  fn test_one_rule_over_different_elements_is_unequal() {
    let digit = Token::variable("digit");
    let cfg: examples::ExampleCfg = normalized(
      build(|gb| {
        gb.add_dynamic(DynamicRule::unary(&digit, "digit", |s: &&str| {
          s.chars().all(|c| c.is_ascii_digit())
        }));
      })
      .unwrap(),
    );
    let parser = CfgParser::new(&cfg).unwrap();

    let one = parser.parse(&["1"]).unwrap();
    let two = parser.parse(&["2"]).unwrap();
    assert_eq!(one[0].root().rule(), two[0].root().rule());
    assert!(one[0] != two[0]);
    assert!(one[0] == parser.parse(&["1"]).unwrap()[0]);
  }

  #[test]
  fn test_repeated_parses_are_equal() {
    let cfg = normalized(examples::make_arith());
    let parser = CfgParser::new(&cfg).unwrap();
    let input = ["(", "1", "+", "2", ")", "*", "3"];
    let first = parser.parse(&input).unwrap();
    let second = parser.parse(&input).unwrap();
    assert_eq!(first.len(), 1);
    assert!(first == second);
  }

  #[test]
  fn test_dynamic_unary_rules_see_caller_state() {
    let declared = Rc::new(RefCell::new(HashSet::new()));
    let var = Token::variable("var");

    let lookup = declared.clone();
    let mut cfg: examples::ExampleCfg = build(|gb| {
      gb.add_dynamic(DynamicRule::unary(&var, "declared", move |s: &&str| {
        lookup.borrow().contains(*s)
      }));
    })
    .unwrap();
    cfg.normalize();
    let parser = CfgParser::new(&cfg).unwrap();

    assert!(parser.parse(&["x"]).unwrap().is_empty());
    declared.borrow_mut().insert("x");
    assert_eq!(parser.parse(&["x"]).unwrap().len(), 1);
  }

  #[test]
  fn test_dynamic_binary_rules() {
    let pair = Token::variable("pair");
    let digit = Token::variable("digit");

    // A pair of digits that are in increasing order.
    let mut cfg: examples::ExampleCfg = build(|gb| {
      gb.add_dynamic(DynamicRule::binary(
        &pair,
        "increasing",
        |left: &ParseNode<&str>, right: &ParseNode<&str>| {
          left.derives(&Token::variable("digit"))
            && right.derives(&Token::variable("digit"))
            && left.leaves() < right.leaves()
        },
        |args: Vec<i64>| args[0] * 10 + args[1],
      ))
      .add_dynamic(DynamicRule::unary(&digit, "digit", |s: &&str| {
        s.len() == 1 && s.chars().all(|c| c.is_ascii_digit())
      }));
    })
    .unwrap();
    cfg.normalize();
    let parser = CfgParser::new(&cfg).unwrap();

    assert_eq!(parser.parse(&["1", "2"]).unwrap().len(), 1);
    assert!(parser.parse(&["2", "1"]).unwrap().is_empty());
  }

  #[test]
  fn test_parse_with_a_dynamic_only_grammar() {
    let number = Token::variable("number");
    let sum = Token::variable("sum");

    let mut cfg: Cfg<i64, i64> = build(|gb| {
      gb.add_rule(&sum, &[&number, &number], |args: Vec<i64>| {
        args[0] + args[1]
      })
      .add_dynamic(DynamicRule::unary(&number, "positive", |n: &i64| *n > 0));
    })
    .unwrap();
    cfg.normalize();
    let parser = CfgParser::new(&cfg).unwrap();

    let forest = parser.parse_with(&[3, 4], |_, _| false).unwrap();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].unwind().evaluate_with(|n| *n), 7);
    assert!(parser.parse_with(&[3, -4], |_, _| false).unwrap().is_empty());
  }
}
