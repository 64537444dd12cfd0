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

//! The phases that bring a grammar into Chomsky Normal Form. Each phase
//! expects the output of the previous one; `Cfg::normalize` runs them in
//! order.

mod binarize;
mod nonnull;
mod terminals;
mod unit;

pub(crate) use {
  binarize::binarize, nonnull::remove_nullables,
  terminals::isolate_terminals, unit::remove_unit_rules,
};
