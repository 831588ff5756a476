//! Disjunctive (machine mutual-exclusion) decisions.
//!
//! Two operations on the same machine cannot overlap, so one of them must
//! finish before the other starts. Each such pair is an explicit tri-state
//! decision. A resolved decision is equivalent to a precedence arc.
//!
//! Pairs are enumerated machine by machine (ascending index), and within a
//! machine as `(i, j)` with `i < j` over its discovery-ordered operation
//! list. This order is the branching order of the search.

use serde::{Deserialize, Serialize};

use super::propagation::Precedence;
use crate::models::{JobShopProblem, OperationId};

/// Resolution state of one disjunctive pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DisjunctionState {
    /// Order not chosen yet.
    #[default]
    Undecided,
    /// `a` runs before `b`.
    ABeforeB,
    /// `b` runs before `a`.
    BBeforeA,
}

/// A pair of operations sharing a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disjunction {
    /// Machine both operations require.
    pub machine: usize,
    /// Pair index within the machine.
    pub pair_index: usize,
    pub a: OperationId,
    pub b: OperationId,
}

impl Disjunction {
    /// The precedence arc implied by a resolved state.
    pub fn precedence(&self, state: DisjunctionState) -> Option<Precedence> {
        match state {
            DisjunctionState::Undecided => None,
            DisjunctionState::ABeforeB => Some(Precedence::new(self.a, self.b)),
            DisjunctionState::BBeforeA => Some(Precedence::new(self.b, self.a)),
        }
    }
}

/// All disjunctive pairs of a problem with their current states.
#[derive(Debug, Clone)]
pub struct DisjunctionSet {
    pairs: Vec<Disjunction>,
    states: Vec<DisjunctionState>,
    decided: usize,
}

impl DisjunctionSet {
    /// Creates every pair, all undecided.
    pub fn new(problem: &JobShopProblem) -> Self {
        let pairs: Vec<Disjunction> = problem
            .machines()
            .iter()
            .flat_map(|m| {
                m.pairs()
                    .enumerate()
                    .map(move |(pair_index, (a, b))| Disjunction {
                        machine: m.id,
                        pair_index,
                        a,
                        b,
                    })
            })
            .collect();
        let states = vec![DisjunctionState::Undecided; pairs.len()];
        Self {
            pairs,
            states,
            decided: 0,
        }
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the problem has no shared machines.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of resolved pairs.
    pub fn decided_count(&self) -> usize {
        self.decided
    }

    /// Whether every pair is resolved.
    pub fn is_complete(&self) -> bool {
        self.decided == self.pairs.len()
    }

    /// Pair by index.
    pub fn pair(&self, index: usize) -> &Disjunction {
        &self.pairs[index]
    }

    /// Current state of a pair.
    pub fn state(&self, index: usize) -> DisjunctionState {
        self.states[index]
    }

    /// First undecided pair (lowest machine, then lowest pair index).
    pub fn next_undecided(&self) -> Option<usize> {
        self.states
            .iter()
            .position(|&s| s == DisjunctionState::Undecided)
    }

    /// Resolves a pair and returns the implied arc.
    ///
    /// Returns `None` (and changes nothing) if the pair is already resolved
    /// or `state` is `Undecided`.
    pub fn decide(&mut self, index: usize, state: DisjunctionState) -> Option<Precedence> {
        if self.states[index] != DisjunctionState::Undecided {
            return None;
        }
        let arc = self.pairs[index].precedence(state)?;
        self.states[index] = state;
        self.decided += 1;
        Some(arc)
    }

    /// Returns a resolved pair to `Undecided`.
    pub fn undo(&mut self, index: usize) {
        if self.states[index] != DisjunctionState::Undecided {
            self.states[index] = DisjunctionState::Undecided;
            self.decided -= 1;
        }
    }

    /// Arcs of all resolved pairs.
    pub fn arcs(&self) -> impl Iterator<Item = Precedence> + '_ {
        self.pairs
            .iter()
            .zip(&self.states)
            .filter_map(|(pair, &state)| pair.precedence(state))
    }
}
