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

//! A grammar transform that removes all empty rules but the start rule's.
//!
//! Each rule is kept, and joined by one rule for every non-empty subset of
//! its nullable symbol occurrences, with those occurrences removed. Rules
//! whose right-hand side is empty are then dropped, unless their head is the
//! start token. The result derives the same language, and apart from the
//! start token no variable derives the empty sequence.
//!
//! Example: For the grammar:
//!
//! ```text
//! q -> p p
//! p -> "a"
//! p -> ε
//! ```
//!
//! This is transformed into:
//!
//! ```text
//! q -> p p
//! q -> p     /* erased: position 1 */
//! q -> p     /* erased: position 0, a duplicate, so not added */
//! p -> "a"
//! ```
//!
//! Every added rule records the positions it erased, so a derivation can be
//! given back the empty subtrees it skipped.

use crate::grammar::{
  base::RuleBody,
  passes::nullable::{calculate_nullables, Nullables},
  Cfg, Origin, TokenId,
};

pub(crate) fn remove_nullables<I, V>(cfg: &mut Cfg<I, V>) {
  let nullables = calculate_nullables(cfg);
  for (token, rule) in nullables.iter() {
    cfg.mark_nullable(token, rule);
  }

  let start = cfg.start_token();
  let mut added = 0;
  let mut dropped = 0;

  for id in cfg.active_rule_ids() {
    let rule = cfg.rule_data(id);
    let (lhs, rhs) = match rule.body().rhs() {
      Some(rhs) => (rule.lhs(), rhs.to_vec()),
      None => continue,
    };
    let evaluation = rule.evaluation().cloned();

    for state in build_erased_variants(&nullables, &rhs) {
      if state.rhs.is_empty() && lhs != start {
        continue;
      }

      let origin = Origin::Erased {
        source: id,
        erased: state.erased,
      };
      let body = RuleBody::Static(state.rhs);
      if cfg.add_rule(lhs, body, evaluation.clone(), origin).is_some() {
        added += 1;
      }
    }

    if rhs.is_empty() && lhs != start {
      cfg.deactivate(id);
      dropped += 1;
    }
  }

  log::debug!(
    "Found {} nullable tokens; added {} rules, dropped {} empty rules",
    nullables.len(),
    added,
    dropped
  );
}

#[derive(Clone, Debug, Default)]
struct ErasedBuildState {
  rhs: Vec<TokenId>,
  erased: Vec<(usize, TokenId)>,
}

/// Returns one state per non-empty subset of the nullable occurrences in
/// `rhs`.
fn build_erased_variants(
  nullables: &Nullables,
  rhs: &[TokenId],
) -> Vec<ErasedBuildState> {
  let mut curr_build_states = vec![ErasedBuildState::default()];

  for (position, token) in rhs.iter().enumerate() {
    if nullables.is_nullable(*token) {
      // We have to clone all of the current build states.
      let mut new_build_states = Vec::new();
      for curr_build_state in &mut curr_build_states {
        let mut new_build_state = curr_build_state.clone();
        // Keep the symbol in the existing state
        curr_build_state.rhs.push(*token);

        // Erase it in the cloned state
        new_build_state.erased.push((position, *token));
        new_build_states.push(new_build_state);
      }

      curr_build_states.append(&mut new_build_states);
    } else {
      for curr_build_state in &mut curr_build_states {
        curr_build_state.rhs.push(*token);
      }
    }
  }

  // The state that erased nothing is the rule itself.
  curr_build_states.retain(|state| !state.erased.is_empty());
  curr_build_states
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::grammar::{
    examples,
    transform::{binarize, isolate_terminals},
    Token,
  };

  fn prepare<I, V>(cfg: &mut Cfg<I, V>) {
    isolate_terminals(cfg);
    binarize(cfg);
    remove_nullables(cfg);
  }

  #[test]
  fn test_only_the_start_rule_may_be_empty() {
    let mut cfg = examples::make_optional();
    prepare(&mut cfg);

    let empty: Vec<_> = cfg
      .rules()
      .filter(|rule| rule.rhs().map_or(false, |rhs| rhs.is_empty()))
      .collect();
    assert_eq!(empty.len(), 1);
    assert_eq!(empty[0].lhs(), cfg.start_token());
    assert!(cfg.is_nullable(cfg.start_token()));
  }

  #[test]
  fn test_erased_positions() {
    let mut cfg = examples::make_optional();
    prepare(&mut cfg);

    // `<a> -> _x <a>` gains `<a> -> _x`, erasing `<a>` at position 1.
    let a = cfg.token_id(&Token::variable("a")).unwrap();
    let erased: Vec<_> = cfg
      .rules()
      .filter(|rule| rule.lhs() == a)
      .filter_map(|rule| match rule.origin() {
        Origin::Erased { source, erased } => Some((*source, erased.clone())),
        _ => None,
      })
      .collect();
    assert_eq!(erased.len(), 1);
    let (source, positions) = &erased[0];
    assert_eq!(positions, &vec![(1, a)]);
    assert_eq!(cfg.rule(*source).rhs().unwrap().len(), 2);
    let null_rule = cfg.null_rule(a).unwrap();
    assert_eq!(cfg.rule(null_rule).rhs(), Some(&[][..]));
  }

  #[test]
  fn test_every_subset_is_erased() {
    let mut cfg = examples::make_nullable_chain();
    prepare(&mut cfg);

    // `<q> -> <p> <p>` yields `<q> -> <p>` once, as both erasures coincide.
    let q = cfg.token_id(&Token::variable("q")).unwrap();
    let p = cfg.token_id(&Token::variable("p")).unwrap();
    let bodies: Vec<_> = cfg
      .rules()
      .filter(|rule| rule.lhs() == q)
      .map(|rule| rule.rhs().unwrap().to_vec())
      .collect();
    assert_eq!(bodies, vec![vec![p, p], vec![p]]);
  }

  #[test]
  fn test_variants() {
    let cfg = examples::make_nullable_chain();
    let p = cfg.token_id(&Token::variable("p")).unwrap();
    let nullables = calculate_nullables(&cfg);
    let x = TokenId(usize::max_value());

    let states = build_erased_variants(&nullables, &[p, x, p]);
    let erased: Vec<_> = states.iter().map(|state| state.erased.clone()).collect();
    assert_eq!(
      erased,
      vec![vec![(0, p)], vec![(2, p)], vec![(0, p), (2, p)]]
    );
    assert_eq!(states[2].rhs, vec![x]);
  }
}
