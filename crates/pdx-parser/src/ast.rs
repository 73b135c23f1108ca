//! AST for parsed query sentences.
//!
//! The parser produces a [`Query`]; the compiler in `pdx-query` turns it
//! into SQL. The mention clause is a flat [`ConditionChain`]: conditions
//! separated by combinators, read left to right with no precedence.

use pdx_core::EntityKind;
use serde::{Deserialize, Serialize};

/// A complete query sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub quantifier: Quantifier,
    /// `None` when the sentence has no `that mention` clause, which
    /// matches every paper.
    pub mentions: Option<ConditionChain>,
}

/// How many papers the sentence asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Quantifier {
    /// `all`, or no quantifier at all.
    #[default]
    All,
    /// `one`: compiles to `LIMIT 1`.
    One,
}

/// A single mention filter: an optional entity type plus a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub kind: Option<EntityKind>,
    pub name: String,
}

/// Boolean keyword joining two conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Combinator {
    And,
    Or,
}

/// One element of a [`ConditionChain`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainNode {
    Condition(Condition),
    Combinator(Combinator),
}

/// An ordered, non-empty sequence `cond (op cond)*`.
///
/// The alternation is maintained by construction: a chain starts with a
/// condition and grows only by (combinator, condition) pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionChain {
    nodes: Vec<ChainNode>,
}

impl Condition {
    #[must_use]
    pub fn new(kind: Option<EntityKind>, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl Combinator {
    /// The SQL keyword for this combinator.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl ConditionChain {
    #[must_use]
    pub fn new(first: Condition) -> Self {
        Self {
            nodes: vec![ChainNode::Condition(first)],
        }
    }

    /// Append `op condition` to the end of the chain.
    pub fn push(&mut self, op: Combinator, condition: Condition) {
        self.nodes.push(ChainNode::Combinator(op));
        self.nodes.push(ChainNode::Condition(condition));
    }

    /// All nodes in encounter order.
    #[must_use]
    pub fn nodes(&self) -> &[ChainNode] {
        &self.nodes
    }

    /// The conditions only, in encounter order.
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.nodes.iter().filter_map(|node| match node {
            ChainNode::Condition(c) => Some(c),
            ChainNode::Combinator(_) => None,
        })
    }
}

impl std::fmt::Display for Query {
    /// Canonical lowercase-keyword form of the sentence.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("get")?;
        if self.quantifier == Quantifier::One {
            f.write_str(" one")?;
        }
        f.write_str(" papers")?;
        if let Some(chain) = &self.mentions {
            f.write_str(" that mention")?;
            for node in chain.nodes() {
                match node {
                    ChainNode::Condition(c) => {
                        if let Some(kind) = c.kind {
                            write!(f, " {}", kind.keyword())?;
                        }
                        write!(f, " {}", c.name)?;
                    }
                    ChainNode::Combinator(op) => {
                        write!(f, " {}", op.keyword().to_lowercase())?;
                    }
                }
            }
        }
        Ok(())
    }
}
