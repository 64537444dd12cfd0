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

//! Unit rule elimination.
//!
//! Every rule `A -> B` with `B` a variable is removed. In its place, `A`
//! receives a copy of each remaining rule `C -> γ` of every variable `C` it
//! reaches through unit rules. The copy records the shortest chain of unit
//! rules from `A` to `C`, so a derivation through it can be rebuilt with
//! every intermediate variable. Copies that would duplicate an existing rule
//! of `A` are skipped.

use {
  crate::{
    grammar::{Cfg, Origin, RuleId, TokenId},
    utils::breadth_first_paths,
  },
  std::collections::BTreeMap,
};

pub(crate) fn remove_unit_rules<I, V>(cfg: &mut Cfg<I, V>) {
  let mut unit_edges: BTreeMap<TokenId, Vec<(RuleId, TokenId)>> =
    BTreeMap::new();
  for rule in cfg.rules() {
    match rule.rhs() {
      Some(&[target]) if rule.is_unit() => {
        unit_edges
          .entry(rule.lhs())
          .or_default()
          .push((rule.id(), target));
      }
      _ => {}
    }
  }

  if unit_edges.is_empty() {
    log::debug!("No unit rules to remove");
    return;
  }

  for (rule, _) in unit_edges.values().flatten() {
    cfg.deactivate(*rule);
  }

  let mut bodies: BTreeMap<TokenId, Vec<RuleId>> = BTreeMap::new();
  for rule in cfg.rules() {
    bodies.entry(rule.lhs()).or_default().push(rule.id());
  }

  let mut lifted = 0;
  for head in unit_edges.keys() {
    let paths = breadth_first_paths(*head, |variable| {
      unit_edges.get(variable).cloned().unwrap_or_default()
    });

    for (target, chain) in paths {
      if target == *head {
        continue;
      }

      for inner in bodies.get(&target).into_iter().flatten() {
        let origin = Origin::Lifted {
          chain: chain.clone(),
          inner: *inner,
        };
        if cfg.add_derived_rule(*head, *inner, origin).is_some() {
          lifted += 1;
        }
      }
    }
  }

  log::debug!(
    "Removed {} unit rules, lifting {} rules",
    unit_edges.values().map(Vec::len).sum::<usize>(),
    lifted
  );
}
