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

//! Context-free grammars with semantic actions.
//!
//! A grammar is built from `Rule`s, normalized into Chomsky Normal Form with
//! `Cfg::normalize`, and then parsed with a generalized CYK table. Each
//! derivation can be unwound back into the shape of the rules as they were
//! written, and evaluated bottom-up with the rules' evaluation functions.
//!
//! ```rust
//! use chomsky::grammar::{Cfg, StaticRule, Token};
//! use chomsky::parsers::cyk::CfgParser;
//!
//! let sum = Token::variable("sum");
//! let one = Token::terminal("1");
//! let plus = Token::terminal("+");
//!
//! let mut cfg = Cfg::new(vec![
//!   StaticRule::new(&sum, vec![sum.clone(), plus, sum.clone()], |args: Vec<i64>| {
//!     args[0] + args[2]
//!   })
//!   .into(),
//!   StaticRule::new(&sum, vec![one], |_| 1).into(),
//! ])
//! .unwrap();
//! cfg.normalize();
//!
//! let parser = CfgParser::new(&cfg).unwrap();
//! let forest = parser.parse(&["1", "+", "1", "+", "1"]).unwrap();
//! for derivation in &forest {
//!   assert_eq!(derivation.unwind().evaluate_with(|_| 0), 3);
//! }
//! ```

#[macro_use]
extern crate derivative;

pub mod grammar;
pub mod loader;
pub mod parsers;
pub mod utils;
