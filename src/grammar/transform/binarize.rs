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

//! Binarization.
//!
//! A rule `A -> B1 B2 ... Bn` with `n > 2` is replaced by the chain
//!
//! ```text
//! A -> B1 {B2 ... Bn}
//! {B2 ... Bn} -> B2 {B3 ... Bn}
//! ...
//! {Bn-1 Bn} -> Bn-1 Bn
//! ```
//!
//! where each `{...}` is an abbreviation token that stands for the suffix it
//! names. Abbreviations are interned by their suffix, so rules ending in the
//! same symbols share them. When a chain reaches a suffix that already has an
//! abbreviation, the rest of the chain already exists and is not built again.

use crate::grammar::{
  base::RuleBody, symbol::TokenKey, Cfg, Origin, RuleId, Token, TokenId,
};

pub(crate) fn binarize<I, V>(cfg: &mut Cfg<I, V>) {
  let mut split = 0;
  let before = count_abbreviations(cfg);

  for id in cfg.active_rule_ids() {
    let rhs = match cfg.rule_data(id).body().rhs() {
      Some(rhs) if rhs.len() > 2 => rhs.to_vec(),
      _ => continue,
    };

    let lhs = cfg.rule_data(id).lhs();
    cfg.deactivate(id);
    split_rule(cfg, id, lhs, &rhs);
    split += 1;
  }

  log::debug!(
    "Split {} rules, adding {} abbreviations",
    split,
    count_abbreviations(cfg) - before
  );
}

fn split_rule<I, V>(
  cfg: &mut Cfg<I, V>,
  source: RuleId,
  lhs: TokenId,
  rhs: &[TokenId],
) {
  let mut head = lhs;
  for (i, symbol) in rhs[..rhs.len() - 1].iter().enumerate() {
    let rest = &rhs[i + 1..];
    let (tail, created) = if rest.len() == 1 {
      (rest[0], false)
    } else {
      abbreviation(cfg, rest)
    };

    cfg.add_rule(
      head,
      RuleBody::Static(vec![*symbol, tail]),
      None,
      Origin::Split { source },
    );

    if !created {
      break;
    }
    head = tail;
  }
}

fn abbreviation<I, V>(
  cfg: &mut Cfg<I, V>,
  suffix: &[TokenId],
) -> (TokenId, bool) {
  let display = Token::variable(join_names(cfg, suffix));
  cfg.intern(TokenKey::Abbrev(suffix.to_vec()), display)
}

fn count_abbreviations<I, V>(cfg: &Cfg<I, V>) -> usize {
  cfg
    .token_ids()
    .filter(|id| cfg.expansion(*id).is_some())
    .count()
}

fn join_names<I, V>(cfg: &Cfg<I, V>, tokens: &[TokenId]) -> String {
  let names: Vec<&str> =
    tokens.iter().map(|id| cfg.token(*id).name().str()).collect();
  format!("{{{}}}", names.join(" "))
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::grammar::examples;

  fn abbreviations<I, V>(cfg: &Cfg<I, V>) -> Vec<TokenId> {
    cfg
      .token_ids()
      .filter(|id| cfg.expansion(*id).is_some())
      .collect()
  }

  #[test]
  fn test_long_rule_is_split() {
    let mut cfg = examples::make_long();
    binarize(&mut cfg);

    // A rule of five symbols becomes four rules, with three abbreviations.
    let pieces: Vec<_> = cfg
      .rules()
      .filter(|rule| match rule.origin() {
        Origin::Split { .. } => true,
        _ => false,
      })
      .collect();
    assert_eq!(pieces.len(), 4);
    assert_eq!(abbreviations(&cfg).len(), 3);

    let source = pieces[0].source_rule().unwrap();
    for piece in &pieces {
      assert_eq!(piece.source_rule(), Some(source));
      assert_eq!(piece.rhs().unwrap().len(), 2);
    }

    // The long rule is no longer active.
    assert!(cfg.rules().all(|rule| rule.id() != source));
    assert_eq!(cfg.rule(source).rhs().unwrap().len(), 5);
  }

  #[test]
  fn test_expansions() {
    let mut cfg = examples::make_long();
    binarize(&mut cfg);

    let names = |ids: &[TokenId]| -> Vec<String> {
      ids.iter().map(|id| cfg.token(*id).name().to_string()).collect()
    };
    let mut expansions: Vec<_> = abbreviations(&cfg)
      .into_iter()
      .map(|id| names(cfg.expansion(id).unwrap()))
      .collect();
    expansions.sort();
    assert_eq!(
      expansions,
      vec![
        vec!["x", "y", "z", "v"],
        vec!["y", "z", "v"],
        vec!["z", "v"],
      ]
    );
  }

  #[test]
  fn test_shared_suffix() {
    let mut cfg = examples::make_shared_suffix();
    binarize(&mut cfg);

    // `<p> -> a b c d` and `<q> -> e c d` share `{c d}`.
    let c = cfg.token_id(&Token::terminal("c")).unwrap();
    let d = cfg.token_id(&Token::terminal("d")).unwrap();
    let shared: Vec<_> = abbreviations(&cfg)
      .into_iter()
      .filter(|id| cfg.expansion(*id) == Some(&[c, d][..]))
      .collect();
    assert_eq!(shared.len(), 1);

    let users = cfg
      .rules()
      .filter(|rule| rule.rhs().map_or(false, |rhs| rhs.contains(&shared[0])))
      .count();
    assert_eq!(users, 2);

    // And only one rule defines it.
    let definitions = cfg
      .rules()
      .filter(|rule| rule.lhs() == shared[0])
      .count();
    assert_eq!(definitions, 1);
  }
}
