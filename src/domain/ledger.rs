//! Ledger-effect planning.
//!
//! Every mutation of an expense, income or transfer is translated into a
//! short list of [`LedgerOp`]s before anything touches storage. The plans
//! are pure, so the reversal and delta rules can be checked without a
//! database; the storage layer only executes them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Cents, MovementKind, WalletId};

/// One primitive balance operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOp {
    Deposit {
        wallet: WalletId,
        amount: Cents,
    },
    Withdraw {
        wallet: WalletId,
        amount: Cents,
    },
    /// Withdraw from `source` and deposit into `destination` as one unit.
    Transfer {
        source: WalletId,
        destination: WalletId,
        amount: Cents,
    },
}

impl LedgerOp {
    /// Deposit for a positive delta, withdraw for a negative one, nothing for zero.
    fn from_delta(wallet: WalletId, delta: Cents) -> Option<Self> {
        match delta {
            0 => None,
            d if d > 0 => Some(LedgerOp::Deposit { wallet, amount: d }),
            d => Some(LedgerOp::Withdraw {
                wallet,
                amount: -d,
            }),
        }
    }
}

/// Where a movement record's effect currently sits: its wallet (if any) and amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub wallet: Option<WalletId>,
    pub amount: Cents,
}

impl Binding {
    pub fn new(wallet: Option<WalletId>, amount: Cents) -> Self {
        Self { wallet, amount }
    }
}

/// Apply a new record's full effect to its wallet.
pub fn plan_movement_create(kind: MovementKind, binding: Binding) -> Vec<LedgerOp> {
    binding
        .wallet
        .and_then(|wallet| LedgerOp::from_delta(wallet, kind.effect(binding.amount)))
        .into_iter()
        .collect()
}

/// Move a record's effect from `before` to `after`.
///
/// Same wallet: only the difference is applied. Different wallet: the old
/// amount is fully reversed on the old wallet and the new amount fully
/// applied on the new one. Nothing changed: no operations.
pub fn plan_movement_update(kind: MovementKind, before: Binding, after: Binding) -> Vec<LedgerOp> {
    if before.wallet == after.wallet {
        let Some(wallet) = after.wallet else {
            return Vec::new();
        };
        let delta = kind.effect(after.amount) - kind.effect(before.amount);
        return LedgerOp::from_delta(wallet, delta).into_iter().collect();
    }

    let mut ops = plan_movement_delete(kind, before);
    ops.extend(plan_movement_create(kind, after));
    ops
}

/// Undo a record's full effect on its wallet.
pub fn plan_movement_delete(kind: MovementKind, binding: Binding) -> Vec<LedgerOp> {
    binding
        .wallet
        .and_then(|wallet| LedgerOp::from_delta(wallet, -kind.effect(binding.amount)))
        .into_iter()
        .collect()
}

/// Move `amount` from `source` to `destination`.
///
/// A side that no longer exists is skipped, leaving a one-sided operation.
pub fn plan_transfer(
    source: Option<WalletId>,
    destination: Option<WalletId>,
    amount: Cents,
) -> Vec<LedgerOp> {
    match (source, destination) {
        (Some(source), Some(destination)) => vec![LedgerOp::Transfer {
            source,
            destination,
            amount,
        }],
        (Some(wallet), None) => vec![LedgerOp::Withdraw { wallet, amount }],
        (None, Some(wallet)) => vec![LedgerOp::Deposit { wallet, amount }],
        (None, None) => Vec::new(),
    }
}

/// Undo a transfer by moving its amount back from destination to source.
pub fn plan_transfer_reversal(
    source: Option<WalletId>,
    destination: Option<WalletId>,
    amount: Cents,
) -> Vec<LedgerOp> {
    plan_transfer(destination, source, amount)
}

/// Re-amount a transfer: reverse the full old amount, then apply the new one.
pub fn plan_transfer_update(
    source: Option<WalletId>,
    destination: Option<WalletId>,
    old_amount: Cents,
    new_amount: Cents,
) -> Vec<LedgerOp> {
    if old_amount == new_amount {
        return Vec::new();
    }
    let mut ops = plan_transfer_reversal(source, destination, old_amount);
    ops.extend(plan_transfer(source, destination, new_amount));
    ops
}

/// Net balance change per wallet produced by a list of operations.
pub fn net_by_wallet(ops: &[LedgerOp]) -> HashMap<WalletId, Cents> {
    let mut net: HashMap<WalletId, Cents> = HashMap::new();
    for op in ops {
        match *op {
            LedgerOp::Deposit { wallet, amount } => *net.entry(wallet).or_insert(0) += amount,
            LedgerOp::Withdraw { wallet, amount } => *net.entry(wallet).or_insert(0) -= amount,
            LedgerOp::Transfer {
                source,
                destination,
                amount,
            } => {
                *net.entry(source).or_insert(0) -= amount;
                *net.entry(destination).or_insert(0) += amount;
            }
        }
    }
    net
}

/// Whether a withdraw may leave a wallet below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverdraftPolicy {
    #[default]
    Allow,
    Deny,
}

impl OverdraftPolicy {
    pub fn permits(&self, balance_after: Cents) -> bool {
        match self {
            OverdraftPolicy::Allow => true,
            OverdraftPolicy::Deny => balance_after >= 0,
        }
    }
}
