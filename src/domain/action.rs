//! Portfolio mutation commands produced by strategies and applied by the engine.

use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

use super::error::ActionError;
use super::portfolio::Portfolio;
use super::position::Position;

/// One declared mutation of a [`Portfolio`].
#[derive(Debug, Clone)]
pub enum Action {
    AddPosition(Arc<dyn Position>),
    RemovePosition(String),
    ReplacePosition {
        old_id: String,
        position: Arc<dyn Position>,
    },
    AdjustCash {
        delta: Decimal,
        reason: String,
    },
    Batch(Vec<Action>),
}

impl Action {
    pub fn add(position: impl Position + 'static) -> Self {
        Action::AddPosition(Arc::new(position))
    }

    pub fn remove(id: impl Into<String>) -> Self {
        Action::RemovePosition(id.into())
    }

    pub fn replace(old_id: impl Into<String>, position: impl Position + 'static) -> Self {
        Action::ReplacePosition {
            old_id: old_id.into(),
            position: Arc::new(position),
        }
    }

    pub fn adjust_cash(delta: Decimal, reason: impl Into<String>) -> Self {
        Action::AdjustCash {
            delta,
            reason: reason.into(),
        }
    }

    /// Apply to `portfolio`.
    ///
    /// A single non-batch action either succeeds or leaves the portfolio
    /// untouched, except `ReplacePosition`, whose remove step is not undone
    /// when the add step fails. `Batch` applies its children in order and
    /// stops at the first failure, reporting its index; children applied
    /// before the failure stay applied. Use [`Action::apply_atomic`] for
    /// all-or-nothing semantics.
    pub fn apply(&self, portfolio: &mut Portfolio) -> Result<(), ActionError> {
        match self {
            Action::AddPosition(position) => portfolio.add_position(Arc::clone(position)),
            Action::RemovePosition(id) => portfolio.remove_position(id).map(|_| ()),
            Action::ReplacePosition { old_id, position } => {
                portfolio.replace_position(old_id, Arc::clone(position))
            }
            Action::AdjustCash { delta, .. } => Ok(portfolio.adjust_cash(*delta)?),
            Action::Batch(actions) => {
                for (index, action) in actions.iter().enumerate() {
                    action
                        .apply(portfolio)
                        .map_err(|source| ActionError::BatchFailed {
                            index,
                            source: Box::new(source),
                        })?;
                }
                Ok(())
            }
        }
    }

    /// All-or-nothing application: works on a copy of the portfolio and swaps
    /// it in only if every step succeeds.
    pub fn apply_atomic(&self, portfolio: &mut Portfolio) -> Result<(), ActionError> {
        let mut working = portfolio.clone();
        self.apply(&mut working)?;
        *portfolio = working;
        Ok(())
    }

    /// Number of leaf actions, counting through nested batches.
    pub fn leaf_count(&self) -> usize {
        match self {
            Action::Batch(actions) => actions.iter().map(Action::leaf_count).sum(),
            _ => 1,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::AddPosition(p) => write!(f, "add {} ({})", p.id(), p.kind()),
            Action::RemovePosition(id) => write!(f, "remove {id}"),
            Action::ReplacePosition { old_id, position } => {
                write!(f, "replace {old_id} with {}", position.id())
            }
            Action::AdjustCash { delta, reason } => write!(f, "cash {delta:+} ({reason})"),
            Action::Batch(actions) => write!(f, "batch of {}", actions.len()),
        }
    }
}
