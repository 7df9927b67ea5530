use crate::error::ExecutionError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// External, human-facing identifier of an account (a stable 10-digit
/// string), distinct from the internal surrogate id.
///
/// `Ord` follows the plain string ordering; the coordinator relies on it to
/// acquire transfer locks in a deterministic order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountNumber(String);

impl AccountNumber {
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountNumber {
    fn from(number: &str) -> Self {
        Self::new(number)
    }
}

impl From<String> for AccountNumber {
    fn from(number: String) -> Self {
        Self::new(number)
    }
}

/// Account balance as a fixed-point decimal.
///
/// Non-negative after any committed mutation; the withdrawal funds check in
/// the mutator is what upholds the invariant.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Balance(pub Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A strictly positive transaction amount.
///
/// The coordinator constructs one while validating the request shape, before
/// any ledger entry exists; a zero or negative value is a malformed request.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, ExecutionError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(ExecutionError::MalformedRequest(format!(
                "amount must be positive, got {value}"
            )))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = ExecutionError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Lifecycle state of an account. Only `Active` accounts accept mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Inactive,
    Blocked,
}

/// One account row as read from and written to the account store.
///
/// Created and owned by an external onboarding process; the engine reads and
/// mutates it but never creates or deletes rows. The version counter is
/// checked and incremented on every committed write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Internal surrogate id.
    pub id: u64,
    /// External account number, unique by onboarding contract.
    pub number: AccountNumber,
    pub balance: Balance,
    pub status: AccountStatus,
    pub version: u64,
}

impl Account {
    pub fn new(id: u64, number: impl Into<AccountNumber>, balance: Balance, status: AccountStatus) -> Self {
        Self {
            id,
            number: number.into(),
            balance,
            status,
            version: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}
