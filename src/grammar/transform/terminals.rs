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

//! Terminal isolation.
//!
//! In every right-hand side longer than one symbol, each terminal `t` is
//! replaced by a variable `_t` that has the single rule `_t -> t`. One such
//! variable is made per distinct terminal, and shared by every rule it
//! occurs in. Rules of the form `A -> t` are left as they are.

use crate::grammar::{
  base::RuleBody, symbol::TokenKey, Cfg, Origin, Token, TokenId,
};

pub(crate) fn isolate_terminals<I, V>(cfg: &mut Cfg<I, V>) {
  let mut isolated = 0;

  for id in cfg.active_rule_ids() {
    let rhs = match cfg.rule_data(id).body().rhs() {
      Some(rhs) if rhs.len() > 1 => rhs.to_vec(),
      _ => continue,
    };

    if rhs.iter().all(|token| cfg.token(*token).is_variable()) {
      continue;
    }

    let mut new_rhs = Vec::with_capacity(rhs.len());
    for token in rhs {
      if cfg.token(token).is_terminal() {
        new_rhs.push(isolation_variable(cfg, token, &mut isolated));
      } else {
        new_rhs.push(token);
      }
    }
    cfg.rewrite_rhs(id, new_rhs);
  }

  log::debug!("Isolated {} terminals", isolated);
}

fn isolation_variable<I, V>(
  cfg: &mut Cfg<I, V>,
  terminal: TokenId,
  isolated: &mut usize,
) -> TokenId {
  let display = Token::variable(format!("_{}", cfg.token(terminal).name()));
  let (variable, created) = cfg.intern(TokenKey::Isolated(terminal), display);
  if created {
    cfg.add_rule(
      variable,
      RuleBody::Static(vec![terminal]),
      None,
      Origin::Isolated,
    );
    *isolated += 1;
  }
  variable
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::grammar::{build, examples};

  #[test]
  fn test_terminals_are_isolated() {
    let mut cfg = examples::make_sum();
    isolate_terminals(&mut cfg);

    let plus = cfg.token_id(&Token::terminal("+")).unwrap();
    let one = cfg.token_id(&Token::terminal("1")).unwrap();
    let sum = cfg.token_id(&Token::variable("sum")).unwrap();

    let isolated: Vec<_> = cfg
      .rules()
      .filter(|rule| rule.origin() == &Origin::Isolated)
      .collect();
    assert_eq!(isolated.len(), 1);
    let var = isolated[0].lhs();
    assert!(cfg.is_synthetic(var));
    assert_eq!(isolated[0].rhs(), Some(&[plus][..]));

    assert!(cfg
      .rules()
      .any(|rule| rule.rhs() == Some(&[sum, var, sum][..])));
    // Single terminals stay in place.
    assert!(cfg.rules().any(|rule| rule.rhs() == Some(&[one][..])));
  }

  #[test]
  fn test_isolation_variables_are_shared() {
    let a = Token::variable("a");
    let b = Token::variable("b");
    let x = Token::terminal("x");
    let mut cfg: Cfg<&str, i64> = build(|gb| {
      gb.add_rule(&a, &[&x, &b, &x], |_| 0)
        .add_rule(&b, &[&x, &x], |_| 0);
    })
    .unwrap();
    isolate_terminals(&mut cfg);

    let count = cfg
      .rules()
      .filter(|rule| rule.origin() == &Origin::Isolated)
      .count();
    assert_eq!(count, 1);
    assert!(cfg.rules().all(|rule| match rule.rhs() {
      Some(rhs) if rhs.len() > 1 => {
        rhs.iter().all(|token| cfg.token(*token).is_variable())
      }
      _ => true,
    }));
  }
}
