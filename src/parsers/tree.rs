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

//! Derivations in the shape of the grammar the caller wrote.

use {
  super::cyk::{NodeBody, ParseNode},
  crate::{
    grammar::{Cfg, Evaluation, Origin, RuleId, Token, TokenId},
    utils::ToDoc,
  },
  im::Vector,
  std::borrow::Cow,
};

/// A node of an unwound derivation. Every branch is an application of a rule
/// given to the grammar, with one child per symbol of its right-hand side.
#[derive(Derivative)]
#[derivative(
  Clone(bound = "I: Clone"),
  Debug(bound = "I: Clone + std::fmt::Debug")
)]
pub enum Tree<I, V> {
  Leaf(I),
  Branch {
    lhs: Token,
    rule: RuleId,
    #[derivative(Debug = "ignore")]
    evaluation: Option<Evaluation<V>>,
    children: Vector<Tree<I, V>>,
  },
}

impl<I: Clone, V> Tree<I, V> {
  pub fn is_leaf(&self) -> bool {
    matches!(self, Tree::Leaf(_))
  }

  pub fn input(&self) -> Option<&I> {
    match self {
      Tree::Leaf(input) => Some(input),
      Tree::Branch { .. } => None,
    }
  }

  pub fn lhs(&self) -> Option<&Token> {
    match self {
      Tree::Leaf(_) => None,
      Tree::Branch { lhs, .. } => Some(lhs),
    }
  }

  pub fn rule(&self) -> Option<RuleId> {
    match self {
      Tree::Leaf(_) => None,
      Tree::Branch { rule, .. } => Some(*rule),
    }
  }

  pub fn children(&self) -> impl Iterator<Item = &Tree<I, V>> {
    let children = match self {
      Tree::Leaf(_) => None,
      Tree::Branch { children, .. } => Some(children.iter()),
    };
    children.into_iter().flatten()
  }

  /// The input elements under this node, in order.
  pub fn leaves(&self) -> Vec<&I> {
    let mut leaves = Vec::new();
    let mut pending = vec![self];
    while let Some(tree) = pending.pop() {
      match tree {
        Tree::Leaf(input) => leaves.push(input),
        Tree::Branch { children, .. } => pending.extend(children.iter().rev()),
      }
    }
    leaves
  }

  /// Computes the value of the derivation bottom-up. Leaves get their value
  /// from `leaf`; a branch applies its rule's evaluation to the values of
  /// its children, or passes its only child's value through if the rule has
  /// none.
  pub fn evaluate_with(&self, mut leaf: impl FnMut(&I) -> V) -> V {
    enum Step<'t, I, V> {
      Visit(&'t Tree<I, V>),
      Reduce(&'t Tree<I, V>),
    }

    let mut steps = vec![Step::Visit(self)];
    let mut values = Vec::new();
    while let Some(step) = steps.pop() {
      match step {
        Step::Visit(tree) => match tree {
          Tree::Leaf(input) => values.push(leaf(input)),
          Tree::Branch { children, .. } => {
            steps.push(Step::Reduce(tree));
            steps.extend(children.iter().rev().map(Step::Visit));
          }
        },
        Step::Reduce(tree) => {
          if let Tree::Branch {
            evaluation,
            children,
            ..
          } = tree
          {
            let args = values.split_off(values.len() - children.len());
            let value = match evaluation {
              Some(evaluation) => evaluation(args),
              None => args
                .into_iter()
                .next()
                .expect("rules without an evaluation have one child"),
            };
            values.push(value);
          }
        }
      }
    }

    values.pop().expect("a tree has a value")
  }

  /// Like `evaluate_with`, with each leaf converted into its value.
  pub fn evaluate(&self) -> V
  where
    I: Into<V>,
  {
    self.evaluate_with(|input| input.clone().into())
  }

  /// Renders the tree as a Graphviz digraph.
  pub fn to_dot(&self) -> String
  where
    I: std::fmt::Debug,
  {
    let mut buffer = Vec::new();
    dot::render(&DotGraph::new(self), &mut buffer)
      .expect("writing to a buffer does not fail");
    String::from_utf8_lossy(&buffer).into_owned()
  }
}

impl<I, V> ToDoc for Tree<I, V>
where
  I: Clone + std::fmt::Debug,
{
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    match self {
      Tree::Leaf(input) => da.text(format!("{:?}", input)),
      Tree::Branch { lhs, children, .. } => da
        .text("(")
        .append(lhs.to_doc(da))
        .append(
          da.concat(
            children
              .iter()
              .map(|child| da.line().append(child.to_doc(da))),
          )
          .nest(2),
        )
        .append(da.text(")"))
        .group(),
    }
  }
}

struct DotGraph {
  labels: Vec<String>,
  edges: Vec<(usize, usize)>,
}

impl DotGraph {
  fn new<I: Clone + std::fmt::Debug, V>(tree: &Tree<I, V>) -> Self {
    let mut graph = DotGraph {
      labels: Vec::new(),
      edges: Vec::new(),
    };

    let mut pending = vec![(None, tree)];
    while let Some((parent, tree)) = pending.pop() {
      let index = graph.labels.len();
      if let Some(parent) = parent {
        graph.edges.push((parent, index));
      }

      match tree {
        Tree::Leaf(input) => graph.labels.push(format!("{:?}", input)),
        Tree::Branch { lhs, children, .. } => {
          graph.labels.push(lhs.to_string());
          pending.extend(
            children.iter().rev().map(|child| (Some(index), child)),
          );
        }
      }
    }
    graph
  }
}

impl<'a> dot::Labeller<'a, usize, (usize, usize)> for DotGraph {
  fn graph_id(&'a self) -> dot::Id<'a> {
    dot::Id::new("tree").expect("graph id is a valid identifier")
  }

  fn node_id(&'a self, n: &usize) -> dot::Id<'a> {
    dot::Id::new(format!("n{}", n)).expect("node id is a valid identifier")
  }

  fn node_label(&'a self, n: &usize) -> dot::LabelText<'a> {
    dot::LabelText::LabelStr(Cow::Borrowed(&self.labels[*n]))
  }
}

impl<'a> dot::GraphWalk<'a, usize, (usize, usize)> for DotGraph {
  fn nodes(&'a self) -> dot::Nodes<'a, usize> {
    (0..self.labels.len()).collect()
  }

  fn edges(&'a self) -> dot::Edges<'a, (usize, usize)> {
    Cow::Borrowed(&self.edges)
  }

  fn source(&'a self, edge: &(usize, usize)) -> usize {
    edge.0
  }

  fn target(&'a self, edge: &(usize, usize)) -> usize {
    edge.1
  }
}

/// A piece of a derivation still to be unwound.
enum Part<'n, I, V> {
  Node(&'n ParseNode<I>),
  /// The empty derivation of a nullable token.
  Null(TokenId),
  Input(&'n I),
  Done(Vec<Tree<I, V>>),
}

enum Task<'n, I, V> {
  Part(Part<'n, I, V>),
  /// Applies a rule to its parts, undoing whatever normalization did to the
  /// rule first.
  Expand(RuleId, Vec<Part<'n, I, V>>),
  /// Collects the outputs of the last `arity` parts under `rule`.
  Build { rule: RuleId, arity: usize },
  /// Applies a unit rule to the last output.
  Wrap(RuleId),
}

/// Rebuilds a derivation of the normalized grammar as a derivation of the
/// rules the grammar was built from.
///
/// Each task leaves a group of trees on the output stack: the subtree for a
/// caller rule, or the spliced children of a rule normalization introduced.
pub(crate) fn unwind<I: Clone, V>(
  cfg: &Cfg<I, V>,
  root: &ParseNode<I>,
) -> Tree<I, V> {
  let mut tasks = vec![Task::Part(Part::Node(root))];
  let mut groups: Vec<Vec<Tree<I, V>>> = Vec::new();

  while let Some(task) = tasks.pop() {
    match task {
      Task::Part(Part::Node(node)) => {
        let parts = match node.body() {
          NodeBody::Leaf(input) => vec![Part::Input(input)],
          NodeBody::Branch(left, right) => {
            vec![Part::Node(left), Part::Node(right)]
          }
        };
        tasks.push(Task::Expand(node.rule(), parts));
      }
      Task::Part(Part::Null(token)) => {
        let rule = cfg
          .null_rule(token)
          .expect("nullable tokens have a null rule");
        let parts = cfg
          .rule_data(rule)
          .rhs()
          .iter()
          .map(|id| Part::Null(*id))
          .collect();
        tasks.push(Task::Expand(rule, parts));
      }
      Task::Part(Part::Input(input)) => {
        groups.push(vec![Tree::Leaf(input.clone())])
      }
      Task::Part(Part::Done(group)) => groups.push(group),
      Task::Expand(rule, mut parts) => match cfg.rule_data(rule).origin() {
        Origin::Erased { source, erased } => {
          for (position, token) in erased {
            parts.insert(*position, Part::Null(*token));
          }
          tasks.push(Task::Expand(*source, parts));
        }
        Origin::Lifted { chain, inner } => {
          tasks.extend(chain.iter().map(|link| Task::Wrap(*link)));
          tasks.push(Task::Expand(*inner, parts));
        }
        _ => {
          tasks.push(Task::Build {
            rule,
            arity: parts.len(),
          });
          tasks.extend(parts.into_iter().rev().map(Task::Part));
        }
      },
      Task::Wrap(rule) => {
        let group = groups.pop().expect("a unit rule wraps a derivation");
        tasks.push(Task::Expand(rule, vec![Part::Done(group)]));
      }
      Task::Build { rule, arity } => {
        let children = groups
          .split_off(groups.len() - arity)
          .into_iter()
          .flatten();
        let data = cfg.rule_data(rule);
        let group = match data.origin() {
          Origin::Start | Origin::Isolated => children.collect(),
          _ if cfg.expansion(data.lhs()).is_some() => children.collect(),
          Origin::Split { source } => vec![branch(cfg, *source, children)],
          _ => vec![branch(cfg, rule, children)],
        };
        groups.push(group);
      }
    }
  }

  let mut root = groups.pop().expect("unwinding produces a root group");
  assert!(groups.is_empty() && root.len() == 1);
  root.remove(0)
}

fn branch<I: Clone, V>(
  cfg: &Cfg<I, V>,
  rule: RuleId,
  children: impl Iterator<Item = Tree<I, V>>,
) -> Tree<I, V> {
  let data = cfg.rule_data(rule);
  Tree::Branch {
    lhs: cfg.token(data.lhs()).clone(),
    rule,
    evaluation: data.evaluation().cloned(),
    children: children.collect(),
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    grammar::{build, examples, DynamicRule},
    parsers::cyk::CfgParser,
  };

  fn unwind_one(
    cfg: &examples::ExampleCfg,
    input: &[&'static str],
  ) -> Tree<&'static str, i64> {
    let parser = CfgParser::new(cfg).unwrap();
    let forest = parser.parse(input).unwrap();
    assert_eq!(forest.len(), 1);
    forest[0].unwind()
  }

  fn lhs_name<I: Clone, V>(tree: &Tree<I, V>) -> String {
    tree.lhs().unwrap().name().to_string()
  }

  #[test]
  fn test_sum() {
    let mut cfg = examples::make_sum();
    cfg.normalize();
    let tree = unwind_one(&cfg, &["1", "+", "2"]);

    assert_eq!(lhs_name(&tree), "sum");
    assert_eq!(tree.children().count(), 3);
    assert_eq!(tree.leaves(), vec![&"1", &"+", &"2"]);
    assert_eq!(tree.evaluate_with(|_| 0), 3);
  }

  #[test]
  fn test_unit_chain_is_restored() {
    let mut cfg = examples::make_unit_chain();
    cfg.normalize();
    let tree = unwind_one(&cfg, &["c"]);

    assert_eq!(lhs_name(&tree), "a");
    let b = tree.children().next().unwrap();
    assert_eq!(lhs_name(b), "b");
    let c = b.children().next().unwrap();
    assert_eq!(c.input(), Some(&"c"));
    assert_eq!(tree.evaluate_with(|_| 0), 101);
  }

  #[test]
  fn test_long_rule_is_rejoined() {
    let mut cfg = examples::make_long();
    cfg.normalize();
    let tree = unwind_one(&cfg, &["w", "x", "y", "z", "v"]);

    assert_eq!(lhs_name(&tree), "a");
    assert_eq!(tree.children().count(), 5);
    assert!(tree.children().all(Tree::is_leaf));
    assert_eq!(tree.evaluate_with(|_| 0), 5);
  }

  #[test]
  fn test_erased_symbols_are_reinserted() {
    let mut cfg = examples::make_optional();
    cfg.normalize();
    let tree = unwind_one(&cfg, &["x", "x"]);

    // <a> -> x (<a> -> x (<a> -> ε))
    let inner = tree.children().nth(1).unwrap();
    let innermost = inner.children().nth(1).unwrap();
    assert_eq!(lhs_name(innermost), "a");
    assert_eq!(innermost.children().count(), 0);
    assert_eq!(tree.evaluate_with(|_| 0), 2);
  }

  #[test]
  fn test_erased_symbols_follow_null_rules() {
    let mut cfg = examples::make_nullable_chain();
    cfg.normalize();
    let tree = unwind_one(&cfg, &["a"]);

    assert_eq!(lhs_name(&tree), "q");
    assert_eq!(tree.children().count(), 2);
    assert_eq!(tree.leaves(), vec![&"a"]);
    assert_eq!(tree.evaluate_with(|_| 0), 1);
  }

  fn letter_digit(letter: &&str) -> i64 {
    match *letter {
      "x" => 1,
      "y" => 2,
      "z" => 3,
      "n" => 4,
      "a" => 5,
      "b" => 6,
      "c" => 7,
      "d" => 8,
      _ => 9,
    }
  }

  #[test]
  fn test_erased_symbols_inside_long_rules() {
    let mut cfg = examples::make_nullable_long();
    cfg.normalize();

    let tree = unwind_one(&cfg, &["x", "y", "z"]);
    assert_eq!(lhs_name(&tree), "a");
    assert_eq!(tree.children().count(), 4);
    let erased = tree.children().nth(1).unwrap();
    assert_eq!(lhs_name(erased), "n");
    assert_eq!(erased.children().count(), 0);
    assert_eq!(tree.leaves(), vec![&"x", &"y", &"z"]);
    assert_eq!(tree.evaluate_with(letter_digit), 1023);

    let tree = unwind_one(&cfg, &["x", "n", "y", "z"]);
    assert_eq!(tree.children().count(), 4);
    assert_eq!(tree.evaluate_with(letter_digit), 1423);
  }

  #[test]
  fn test_erased_symbols_inside_shared_suffixes() {
    let mut cfg = examples::make_nullable_suffix();
    cfg.normalize();

    let tree = unwind_one(&cfg, &["a"]);
    assert_eq!(lhs_name(&tree), "s");
    let p = tree.children().next().unwrap();
    assert_eq!(lhs_name(p), "p");
    assert_eq!(p.children().count(), 3);
    assert!(p.children().next().unwrap().is_leaf());
    let erased: Vec<_> = p.children().skip(1).map(lhs_name).collect();
    assert_eq!(erased, vec!["b", "c"]);
    assert_eq!(tree.evaluate_with(letter_digit), 500);

    let tree = unwind_one(&cfg, &["d", "c"]);
    let q = tree.children().next().unwrap();
    assert_eq!(lhs_name(q), "q");
    assert_eq!(q.children().count(), 3);
    assert_eq!(tree.evaluate_with(letter_digit), 807);
  }

  #[test]
  fn test_evaluate_converts_leaves() {
    let word = Token::variable("word");
    let pair = Token::variable("pair");
    let mut cfg: Cfg<String, String> = build(|gb| {
      gb.add_rule(&pair, &[&word, &word], |args: Vec<String>| args.join("-"))
        .add_dynamic(DynamicRule::unary(&word, "any", |_: &String| true));
    })
    .unwrap();
    cfg.normalize();

    let parser = CfgParser::new(&cfg).unwrap();
    let forest = parser.parse(&["ab".to_string(), "cd".to_string()]).unwrap();
    assert_eq!(forest[0].unwind().evaluate(), "ab-cd");
  }

  #[test]
  fn test_dot() {
    let mut cfg = examples::make_sum();
    cfg.normalize();
    let dot = unwind_one(&cfg, &["1"]).to_dot();

    assert!(dot.starts_with("digraph tree {"));
    assert!(dot.contains("n0 -> n1"));
    assert!(dot.contains("<sum>"));
  }

  #[test]
  fn test_pretty() {
    let mut cfg = examples::make_sum();
    cfg.normalize();
    let tree = unwind_one(&cfg, &["1", "+", "2"]);

    let arena = pretty::Arena::new();
    let text = format!("{}", tree.to_doc(&arena).into_doc().pretty(80));
    assert_eq!(text, r#"(<sum> (<sum> "1") "+" (<sum> "2"))"#);
  }
}
