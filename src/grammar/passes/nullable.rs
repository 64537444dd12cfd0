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

use {
  crate::{
    grammar::{Cfg, RuleId, TokenId},
    utils::{change_loop, WasChanged},
  },
  std::collections::BTreeMap,
};

/// The nullable tokens of a grammar. Each is paired with the rule that
/// showed it nullable, whose right-hand side consists of tokens that were
/// shown nullable before it. Following those rules gives every nullable
/// token a finite empty derivation.
#[derive(Clone, Debug, Default)]
pub struct Nullables {
  null_rules: BTreeMap<TokenId, RuleId>,
}

impl Nullables {
  pub fn is_nullable(&self, token: TokenId) -> bool {
    self.null_rules.contains_key(&token)
  }

  pub fn null_rule(&self, token: TokenId) -> Option<RuleId> {
    self.null_rules.get(&token).copied()
  }

  pub fn len(&self) -> usize {
    self.null_rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.null_rules.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (TokenId, RuleId)> + '_ {
    self.null_rules.iter().map(|(token, rule)| (*token, *rule))
  }
}

/// Computes the least fixpoint of "some static rule of the token has a
/// right-hand side of nullable tokens only". Terminals are never nullable.
pub fn calculate_nullables<I, V>(cfg: &Cfg<I, V>) -> Nullables {
  let rules = cfg.active_rule_ids();
  let mut null_rules = BTreeMap::new();

  change_loop(|| {
    let mut changed = WasChanged::Unchanged;
    for id in &rules {
      let rule = cfg.rule_data(*id);
      let rhs = match rule.body().rhs() {
        Some(rhs) => rhs,
        None => continue,
      };

      if null_rules.contains_key(&rule.lhs()) {
        continue;
      }

      if rhs.iter().all(|token| null_rules.contains_key(token)) {
        log::trace!("{} is nullable by {:?}", cfg.token(rule.lhs()), id);
        null_rules.insert(rule.lhs(), *id);
        changed = WasChanged::Changed;
      }
    }
    changed
  });

  Nullables { null_rules }
}
