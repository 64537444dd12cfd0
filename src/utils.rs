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

use std::collections::{btree_map, BTreeMap};

pub trait ToDoc {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA, ()>
  where
    DA::Doc: Clone;
}

/// A refcounted name type, used to avoid duplicating symbol spellings
/// throughout a grammar and its parse trees.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(std::rc::Rc<String>);

impl Name {
  /// Creates a new Name containing the given string.
  pub fn new(s: &(impl AsRef<str> + ?Sized)) -> Self {
    Name(std::rc::Rc::new(s.as_ref().to_string()))
  }

  /// Returns a reference to the internal string.
  pub fn str(&self) -> &str {
    &**self.0
  }
}

impl AsRef<str> for Name {
  fn as_ref(&self) -> &str {
    self.str()
  }
}

impl std::fmt::Debug for Name {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    fmt.write_str(&self.0)
  }
}

impl std::fmt::Display for Name {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    fmt.write_str(&self.0)
  }
}

impl ToDoc for Name {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA>
  where
    DA::Doc: Clone,
  {
    da.text(self.str().to_string())
  }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum WasChanged {
  Changed,
  Unchanged,
}

/// Calls `func` until it reports that nothing changed.
pub fn change_loop<F>(mut func: F)
where
  F: FnMut() -> WasChanged,
{
  while let WasChanged::Changed = func() {}
}

/// Searches a graph breadth-first from `initial`, returning every reachable
/// node together with the edges of a shortest path leading to it.
///
/// `step` yields the outgoing `(edge, target)` pairs of a node. The initial
/// node maps to an empty path. Among paths of equal length, the one whose
/// edges were yielded first wins.
pub fn breadth_first_paths<N, E, StepI, F>(
  initial: N,
  mut step: F,
) -> BTreeMap<N, Vec<E>>
where
  N: Ord + Clone,
  E: Clone,
  StepI: IntoIterator<Item = (E, N)>,
  F: FnMut(&N) -> StepI,
{
  let mut paths = BTreeMap::new();
  paths.insert(initial.clone(), Vec::new());

  let mut curr_set = vec![initial];
  let mut next_set = Vec::new();

  while !curr_set.is_empty() {
    for node in &curr_set {
      let prefix = paths[node].clone();
      for (edge, target) in step(node) {
        if let btree_map::Entry::Vacant(vac) = paths.entry(target.clone()) {
          let mut path = prefix.clone();
          path.push(edge);
          vac.insert(path);
          next_set.push(target);
        }
      }
    }

    std::mem::swap(&mut curr_set, &mut next_set);
    next_set.clear();
  }

  paths
}
