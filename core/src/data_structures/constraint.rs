//! Binary constraint networks over finite integer domains
//!
//! A constraint `(source, target, relation, offset)` reads
//! `source relation (target + offset)`. Engines never reimplement the
//! reverse reading: every traversal from the target side goes through
//! [`invert`], which is the only place the `<`/`>` flip lives.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::HashSet;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{AlgorithmError, VariableId};

/// Comparison operator of a binary constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl Relation {
    #[inline]
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Gt => lhs > rhs,
            Self::Le => lhs <= rhs,
            Self::Ge => lhs >= rhs,
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
        }
    }

    /// Relation obtained by swapping the operands
    #[inline]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Lt => Self::Gt,
            Self::Gt => Self::Lt,
            Self::Le => Self::Ge,
            Self::Ge => Self::Le,
            Self::Eq => Self::Eq,
            Self::Ne => Self::Ne,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Eq => "=",
            Self::Ne => "!=",
        }
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Relation {
    type Err = AlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<" => Ok(Self::Lt),
            ">" => Ok(Self::Gt),
            "<=" => Ok(Self::Le),
            ">=" => Ok(Self::Ge),
            "=" | "==" => Ok(Self::Eq),
            "!=" => Ok(Self::Ne),
            other => Err(AlgorithmError::InvalidConstraint(format!(
                "unknown relation '{other}'"
            ))),
        }
    }
}

/// Reverses `a rel (b + offset)` into `b rel' (a + offset')`.
#[inline]
pub const fn invert(relation: Relation, offset: i64) -> (Relation, i64) {
    (relation.flipped(), -offset)
}

fn write_offset(f: &mut fmt::Formatter<'_>, offset: i64) -> fmt::Result {
    match offset {
        0 => Ok(()),
        o if o > 0 => write!(f, " + {o}"),
        o => write!(f, " - {}", o.unsigned_abs()),
    }
}

/// Binary constraint `source relation (target + offset)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint {
    pub source: VariableId,
    pub target: VariableId,
    pub relation: Relation,
    #[serde(default)]
    pub offset: i64,
}

impl Constraint {
    pub fn new(
        source: impl Into<VariableId>,
        target: impl Into<VariableId>,
        relation: Relation,
        offset: i64,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation,
            offset,
        }
    }

    #[inline]
    pub fn involves(&self, variable: &VariableId) -> bool {
        &self.source == variable || &self.target == variable
    }

    /// The constraint read from `variable`'s side: the other endpoint and
    /// the relation/offset such that `variable rel (other + offset)`.
    pub fn seen_from(&self, variable: &VariableId) -> Option<(&VariableId, Relation, i64)> {
        if &self.source == variable {
            Some((&self.target, self.relation, self.offset))
        } else if &self.target == variable {
            let (relation, offset) = invert(self.relation, self.offset);
            Some((&self.source, relation, offset))
        } else {
            None
        }
    }

    /// Arc checking `source` against `target`
    pub fn forward_arc(&self, index: usize) -> DirectedArc {
        DirectedArc {
            source: self.source.clone(),
            target: self.target.clone(),
            relation: self.relation,
            offset: self.offset,
            constraint: index,
        }
    }

    /// Arc checking `target` against `source`
    pub fn reverse_arc(&self, index: usize) -> DirectedArc {
        let (relation, offset) = invert(self.relation, self.offset);
        DirectedArc {
            source: self.target.clone(),
            target: self.source.clone(),
            relation,
            offset,
            constraint: index,
        }
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.source, self.relation, self.target)?;
        write_offset(f, self.offset)
    }
}

/// One reading direction of a constraint, as queued by AC-3
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectedArc {
    pub source: VariableId,
    pub target: VariableId,
    pub relation: Relation,
    pub offset: i64,
    /// Index of the originating constraint in the network
    pub constraint: usize,
}

impl DirectedArc {
    /// Whether `source = x` is supported by `target = y`
    #[inline]
    pub fn satisfied(&self, x: i64, y: i64) -> bool {
        self.relation.holds(x, y.saturating_add(self.offset))
    }
}

impl Display for DirectedArc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.source, self.relation, self.target)?;
        write_offset(f, self.offset)
    }
}

/// CSP variable with its initial ordered domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub id: VariableId,
    pub domain: Vec<i64>,
}

/// Variables, binary constraints and the arc interpretation flag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintNetwork {
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    /// When set, AC-3 only propagates along each constraint's stated
    /// source -> target direction.
    #[serde(default)]
    is_directed: bool,
}

impl ConstraintNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    #[inline]
    pub fn is_directed(&self) -> bool {
        self.is_directed
    }

    pub fn set_directed(&mut self, directed: bool) {
        self.is_directed = directed;
    }

    pub fn index_of(&self, id: &VariableId) -> Option<usize> {
        self.variables.iter().position(|v| &v.id == id)
    }

    pub fn contains(&self, id: &VariableId) -> bool {
        self.index_of(id).is_some()
    }

    /// Adds a variable; repeated domain values keep their first position
    pub fn add_variable(
        &mut self,
        id: impl Into<VariableId>,
        domain: impl IntoIterator<Item = i64>,
    ) -> Result<(), AlgorithmError> {
        let id = id.into();
        if self.contains(&id) {
            return Err(AlgorithmError::DuplicateId(id));
        }
        let mut seen = HashSet::new();
        let domain = domain.into_iter().filter(|v| seen.insert(*v)).collect();
        self.variables.push(Variable { id, domain });
        Ok(())
    }

    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), AlgorithmError> {
        for endpoint in [&constraint.source, &constraint.target] {
            if !self.contains(endpoint) {
                return Err(AlgorithmError::MissingNode {
                    role: "constraint endpoint",
                    id: endpoint.clone(),
                });
            }
        }
        if constraint.source == constraint.target {
            return Err(AlgorithmError::InvalidConstraint(format!(
                "'{constraint}' relates a variable to itself"
            )));
        }
        self.constraints.push(constraint);
        Ok(())
    }

    pub fn remove_constraint(&mut self, index: usize) -> Option<Constraint> {
        (index < self.constraints.len()).then(|| self.constraints.remove(index))
    }

    /// Removes a variable together with every constraint touching it
    pub fn remove_variable(&mut self, id: &VariableId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        self.variables.remove(index);
        self.constraints.retain(|c| !c.involves(id));
        true
    }

    /// Renames a variable in the variable list and in every constraint
    pub fn rename_variable(
        &mut self,
        old: &VariableId,
        new: impl Into<VariableId>,
    ) -> Result<(), AlgorithmError> {
        let new = new.into();
        if old == &new {
            return Err(AlgorithmError::SelfRename(new));
        }
        let index = self.index_of(old).ok_or_else(|| AlgorithmError::MissingNode {
            role: "variable",
            id: old.clone(),
        })?;
        if self.contains(&new) {
            return Err(AlgorithmError::DuplicateId(new));
        }

        self.variables[index].id = new.clone();
        for constraint in &mut self.constraints {
            if &constraint.source == old {
                constraint.source = new.clone();
            }
            if &constraint.target == old {
                constraint.target = new.clone();
            }
        }
        Ok(())
    }

    /// Rejects repeated variable identifiers and self-referencing constraints
    pub fn validate(&self) -> Result<(), AlgorithmError> {
        let mut seen = HashSet::new();
        for variable in &self.variables {
            if !seen.insert(&variable.id) {
                return Err(AlgorithmError::DuplicateId(variable.id.clone()));
            }
        }
        if let Some(c) = self.constraints.iter().find(|c| c.source == c.target) {
            return Err(AlgorithmError::InvalidConstraint(format!(
                "'{c}' relates a variable to itself"
            )));
        }
        Ok(())
    }

    /// Constraints whose endpoints both exist, with their original index
    pub fn live_constraints(&self) -> impl Iterator<Item = (usize, &Constraint)> + '_ {
        self.constraints.iter().enumerate().filter(move |(_, c)| {
            let live = self.contains(&c.source) && self.contains(&c.target);
            if !live {
                log::warn!("ignoring constraint '{c}': endpoint does not exist");
            }
            live
        })
    }

    /// Every directed arc AC-3 works with: the stated direction of each
    /// constraint, followed by its inverse unless the network is directed.
    pub fn arcs(&self) -> Vec<DirectedArc> {
        let mut arcs = Vec::new();
        for (index, constraint) in self.live_constraints() {
            arcs.push(constraint.forward_arc(index));
            if !self.is_directed {
                arcs.push(constraint.reverse_arc(index));
            }
        }
        arcs
    }
}
