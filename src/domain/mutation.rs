//! The balance mutator: pure logic computing the new balance(s) for one
//! transaction, including the final safety check against the balances read
//! under lock.
//!
//! Upstream validation already guaranteed business preconditions; the checks
//! here only close the race window between validation and execution.

use crate::domain::account::{Account, Balance};
use crate::domain::transaction::TransactionKind;
use crate::error::{MutationError, RejectReason};
use rust_decimal::Decimal;

/// The write set computed by [`apply`]. `destination` is set only for
/// transfers.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceUpdate {
    pub source: Balance,
    pub destination: Option<Balance>,
}

/// Computes the new balance(s) for `kind` against the given accounts.
///
/// No I/O: callers pass account snapshots read under the coordinator-held
/// lock and persist the returned balances themselves. A transfer is a
/// withdrawal leg on the source followed by a deposit leg on the
/// destination; if the withdrawal leg rejects, the deposit leg never runs.
pub fn apply(
    kind: TransactionKind,
    source: &Account,
    destination: Option<&Account>,
    amount: Decimal,
) -> Result<BalanceUpdate, MutationError> {
    if amount <= Decimal::ZERO {
        return Err(MutationError::NonPositiveAmount(amount));
    }
    ensure_active(source)?;

    match kind {
        TransactionKind::Deposit => Ok(BalanceUpdate {
            source: source.balance + Balance::new(amount),
            destination: None,
        }),
        TransactionKind::Withdrawal => Ok(BalanceUpdate {
            source: withdraw(source, amount)?,
            destination: None,
        }),
        TransactionKind::Transfer => {
            let destination = destination.ok_or(MutationError::MissingDestination)?;
            ensure_active(destination)?;
            let source_balance = withdraw(source, amount)?;
            Ok(BalanceUpdate {
                source: source_balance,
                destination: Some(destination.balance + Balance::new(amount)),
            })
        }
    }
}

fn ensure_active(account: &Account) -> Result<(), RejectReason> {
    if account.is_active() {
        Ok(())
    } else {
        Err(RejectReason::AccountNotActive {
            number: account.number.clone(),
            status: account.status,
        })
    }
}

/// The final safety net: upstream validated funds, but the balance may have
/// moved between validation and execution.
fn withdraw(account: &Account, amount: Decimal) -> Result<Balance, RejectReason> {
    if account.balance.0 < amount {
        return Err(RejectReason::InsufficientFunds {
            number: account.number.clone(),
            balance: account.balance.0,
            amount,
        });
    }
    Ok(account.balance - Balance::new(amount))
}
