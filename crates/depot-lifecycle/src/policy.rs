// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The legal status graph and the checks every transition goes through.
//!
//! Pure and synchronous. Caller-driven requests go through
//! [`TransitionGraph::validate_transition`]; the sweeps use
//! [`TransitionGraph::validate_system_transition`], which is the only way to
//! reach `expired` or `deleted`.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use depot_core::{DepotError, PackageStatus};

/// Accepted outcome of a transition check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Persist the new status.
    Apply {
        to: PackageStatus,
        /// The transition reaches the handed-over state.
        set_completed_at: bool,
    },
    /// Requested status equals the current one. Nothing to write or notify.
    NoOp,
}

/// Legal caller-driven successors of each status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionGraph {
    successors: BTreeMap<PackageStatus, BTreeSet<PackageStatus>>,
}

impl TransitionGraph {
    /// Build a graph from a status-name table such as `[lifecycle.transitions]`.
    pub fn from_table(table: &BTreeMap<String, Vec<String>>) -> Result<Self, DepotError> {
        let mut successors = BTreeMap::new();
        for (from, targets) in table {
            let from = parse_configured(from)?;
            if from.is_system_only() {
                return Err(DepotError::Config(format!(
                    "`{from}` is managed by the sweeps and cannot have successors"
                )));
            }
            let mut set = BTreeSet::new();
            for to in targets {
                let to = parse_configured(to)?;
                if to.is_system_only() || to == PackageStatus::Received {
                    return Err(DepotError::Config(format!(
                        "`{to}` cannot be a caller-reachable successor of `{from}`"
                    )));
                }
                set.insert(to);
            }
            successors.insert(from, set);
        }
        Ok(Self { successors })
    }

    /// Intermediate custody states are optional: any earlier state may go
    /// straight to `completed`.
    pub fn simplified() -> Self {
        use PackageStatus::*;
        Self::from_edges(vec![
            (Received, vec![Processing, Delivered, Completed]),
            (Processing, vec![Delivered, Completed]),
            (Delivered, vec![Completed]),
        ])
    }

    fn from_edges(edges: Vec<(PackageStatus, Vec<PackageStatus>)>) -> Self {
        let successors = edges
            .into_iter()
            .map(|(from, to)| (from, to.into_iter().collect()))
            .collect();
        Self { successors }
    }

    pub fn allows(&self, from: PackageStatus, to: PackageStatus) -> bool {
        self.successors
            .get(&from)
            .is_some_and(|set| set.contains(&to))
    }

    pub fn successors(&self, from: PackageStatus) -> impl Iterator<Item = PackageStatus> + '_ {
        self.successors.get(&from).into_iter().flatten().copied()
    }

    /// Check a caller-requested status against the graph.
    ///
    /// Rejections come in a fixed order: unknown name, system-only target,
    /// then (after the no-op case) anything that is not a listed successor.
    pub fn validate_transition(
        &self,
        current: PackageStatus,
        requested: &str,
    ) -> Result<Transition, DepotError> {
        let to = PackageStatus::from_str(requested.trim())
            .map_err(|_| DepotError::InvalidStatus(requested.to_string()))?;
        if to.is_system_only() {
            return Err(DepotError::ForbiddenManualTransition(to.to_string()));
        }
        if to == current {
            return Ok(Transition::NoOp);
        }
        if !self.allows(current, to) {
            return Err(DepotError::IllegalTransition {
                from: current.to_string(),
                to: to.to_string(),
            });
        }
        Ok(Transition::Apply {
            to,
            set_completed_at: to == PackageStatus::Completed,
        })
    }

    /// Check a time-driven transition. `expired` is reachable from any
    /// non-terminal status, `deleted` only from `expired`.
    pub fn validate_system_transition(
        &self,
        current: PackageStatus,
        target: PackageStatus,
    ) -> Result<Transition, DepotError> {
        if current == target {
            return Ok(Transition::NoOp);
        }
        let legal = match target {
            PackageStatus::Expired => !current.is_terminal(),
            PackageStatus::Deleted => current == PackageStatus::Expired,
            _ => false,
        };
        if !legal {
            return Err(DepotError::IllegalTransition {
                from: current.to_string(),
                to: target.to_string(),
            });
        }
        Ok(Transition::Apply {
            to: target,
            set_completed_at: false,
        })
    }
}

impl Default for TransitionGraph {
    /// Received -> {Processing, Delivered}, Processing -> Delivered, Delivered -> Completed.
    fn default() -> Self {
        use PackageStatus::*;
        Self::from_edges(vec![
            (Received, vec![Processing, Delivered]),
            (Processing, vec![Delivered]),
            (Delivered, vec![Completed]),
        ])
    }
}

fn parse_configured(name: &str) -> Result<PackageStatus, DepotError> {
    PackageStatus::from_str(name.trim())
        .map_err(|_| DepotError::Config(format!("unknown status `{name}` in transition table")))
}
