// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Alias tree
//!
//! Every occurrence of a table in a query gets an alias node with a stable
//! ordinal. Nodes live in an arena indexed by [`AliasId`]; parent/child links
//! are ordinals, never references. Populate joins nest an alias under the
//! alias whose rows receive the children.
//!
//! An alias name must not repeat anywhere in its ancestor chain, nor inside
//! the subtree of any of its siblings. Top-level aliases are siblings of one
//! another.

use std::fmt;

use crate::core::{AliasId, Error, Result};

/// One alias in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasNode {
    pub id: AliasId,
    pub parent: Option<AliasId>,
    pub table: String,
    pub alias: String,
    pub columns: Vec<String>,
    children: Vec<AliasId>,
}

impl AliasNode {
    /// Position of `column` in this alias' column list (case-insensitive)
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
    }

    /// Aliases nested directly under this one
    pub fn children(&self) -> &[AliasId] {
        &self.children
    }
}

impl fmt::Display for AliasNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.table.eq_ignore_ascii_case(&self.alias) {
            write!(f, "{}", self.alias)
        } else {
            write!(f, "{} AS {}", self.table, self.alias)
        }
    }
}

/// Arena of alias nodes
#[derive(Debug, Clone, Default)]
pub struct AliasTree {
    nodes: Vec<AliasNode>,
    roots: Vec<AliasId>,
}

impl AliasTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level alias
    pub fn add_root<S: Into<String>>(
        &mut self,
        table: impl Into<String>,
        alias: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> Result<AliasId> {
        self.add_node(None, table.into(), alias.into(), columns)
    }

    /// Add an alias nested under `parent`
    pub fn add_child<S: Into<String>>(
        &mut self,
        parent: AliasId,
        table: impl Into<String>,
        alias: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> Result<AliasId> {
        self.node(parent)?;
        self.add_node(Some(parent), table.into(), alias.into(), columns)
    }

    fn add_node<S: Into<String>>(
        &mut self,
        parent: Option<AliasId>,
        table: String,
        alias: String,
        columns: impl IntoIterator<Item = S>,
    ) -> Result<AliasId> {
        self.check_unique(parent, &alias)?;

        let id = AliasId(self.nodes.len() as u32);
        self.nodes.push(AliasNode {
            id,
            parent,
            table,
            alias,
            columns: columns.into_iter().map(Into::into).collect(),
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.nodes[p.index()].children.push(id),
            None => self.roots.push(id),
        }
        Ok(id)
    }

    fn check_unique(&self, parent: Option<AliasId>, alias: &str) -> Result<()> {
        let collides = |id: AliasId| self.nodes[id.index()].alias.eq_ignore_ascii_case(alias);

        // Ancestor chain
        let mut cursor = parent;
        while let Some(id) = cursor {
            if collides(id) {
                return Err(Error::duplicate_alias(alias));
            }
            cursor = self.nodes[id.index()].parent;
        }

        // Sibling subtrees
        let siblings = match parent {
            Some(p) => &self.nodes[p.index()].children,
            None => &self.roots,
        };
        for &sibling in siblings {
            if collides(sibling) || self.descendants(sibling).into_iter().any(collides) {
                return Err(Error::duplicate_alias(alias));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: AliasId) -> Option<&AliasNode> {
        self.nodes.get(id.index())
    }

    /// Get a node, failing for ordinals that do not belong to this tree
    pub fn node(&self, id: AliasId) -> Result<&AliasNode> {
        self.get(id)
            .ok_or_else(|| Error::invalid_plan(format!("alias {} is not in the alias tree", id)))
    }

    /// Alias name of `id`, or its ordinal when unknown
    pub fn name(&self, id: AliasId) -> String {
        self.get(id)
            .map(|n| n.alias.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// First alias called `name` in ordinal order
    pub fn find(&self, name: &str) -> Option<AliasId> {
        self.nodes
            .iter()
            .find(|n| n.alias.eq_ignore_ascii_case(name))
            .map(|n| n.id)
    }

    /// Parent chain of `id`, nearest first
    pub fn ancestors(&self, id: AliasId) -> Vec<AliasId> {
        let mut out = Vec::new();
        let mut cursor = self.get(id).and_then(|n| n.parent);
        while let Some(p) = cursor {
            out.push(p);
            cursor = self.nodes[p.index()].parent;
        }
        out
    }

    /// Every alias below `id`, depth first
    pub fn descendants(&self, id: AliasId) -> Vec<AliasId> {
        let mut out = Vec::new();
        let mut stack: Vec<AliasId> = match self.get(id) {
            Some(n) => n.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next.index()].children.iter().rev().copied());
        }
        out
    }

    pub fn roots(&self) -> &[AliasId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AliasNode> {
        self.nodes.iter()
    }
}
