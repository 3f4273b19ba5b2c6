//! Domain entities. Pure data structures and business rules for clients and their loans.
//!
//! No HTTP/storage types here. Adapters persist these through serde.

use crate::domain::errors::LoanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Ceiling for the very first loan a client can take.
pub const MAXIMUM_AMOUNT_FOR_FIRST_LOAN: u64 = 50_000_000;

/// Number of days for which a loan was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Term(pub u32);

impl Term {
    pub fn days(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Personal information submitted at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientData {
    pub gender: String,
    pub ktp_number: String,
    pub birth_date: String,
    pub name: String,
}

/// A loan should be repaid within its term.
///
/// Stored loans are checked on load: `remaining` never exceeds `amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LoanRecord")]
pub struct Loan {
    amount: u64,
    term: Term,
    remaining: u64,
}

/// Loan as read from storage, before validation.
#[derive(Deserialize)]
struct LoanRecord {
    amount: u64,
    term: Term,
    remaining: u64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("stored loan has remaining {remaining} above amount {amount}")]
pub struct InvalidLoan {
    pub amount: u64,
    pub remaining: u64,
}

impl TryFrom<LoanRecord> for Loan {
    type Error = InvalidLoan;

    fn try_from(record: LoanRecord) -> Result<Self, Self::Error> {
        if record.remaining > record.amount {
            return Err(InvalidLoan {
                amount: record.amount,
                remaining: record.remaining,
            });
        }
        Ok(Self {
            amount: record.amount,
            term: record.term,
            remaining: record.remaining,
        })
    }
}

impl Loan {
    fn new(amount: u64, term: Term) -> Self {
        Self {
            amount,
            term,
            remaining: amount,
        }
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn term(&self) -> Term {
        self.term
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_repaid(&self) -> bool {
        self.remaining == 0
    }

    /// Leaves `remaining` untouched when `amount` exceeds it.
    fn repay(&mut self, amount: u64) -> Result<(), LoanError> {
        if amount > self.remaining {
            return Err(LoanError::RepaymentTooHigh {
                remaining: self.remaining,
            });
        }
        self.remaining -= amount;
        Ok(())
    }
}

/// Someone who borrows money. A client can only have one active loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ClientRecord")]
pub struct Client {
    ktp_number: String,
    gender: String,
    birth_date: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    loan: Option<Loan>,
}

#[derive(Deserialize)]
struct ClientRecord {
    ktp_number: String,
    gender: String,
    birth_date: String,
    name: String,
    #[serde(default)]
    loan: Option<Loan>,
}

impl From<ClientRecord> for Client {
    fn from(record: ClientRecord) -> Self {
        Self::from_parts(
            ClientData {
                gender: record.gender,
                ktp_number: record.ktp_number,
                birth_date: record.birth_date,
                name: record.name,
            },
            record.loan,
        )
    }
}

impl Client {
    /// New client without a loan.
    pub fn new(data: ClientData) -> Self {
        Self {
            ktp_number: data.ktp_number,
            gender: data.gender,
            birth_date: data.birth_date,
            name: data.name,
            loan: None,
        }
    }

    /// Rebuild a stored client. Used by storage adapters.
    /// A stored loan with nothing left to pay is dropped.
    pub(crate) fn from_parts(data: ClientData, loan: Option<Loan>) -> Self {
        Self {
            loan: loan.filter(|l| !l.is_repaid()),
            ..Self::new(data)
        }
    }

    pub fn ktp_number(&self) -> &str {
        &self.ktp_number
    }

    pub fn gender(&self) -> &str {
        &self.gender
    }

    pub fn birth_date(&self) -> &str {
        &self.birth_date
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_active_loan(&self) -> bool {
        self.loan.is_some()
    }

    pub fn active_loan(&self) -> Option<&Loan> {
        self.loan.as_ref()
    }

    /// Checks run in order: existing loan first, then the amount ceiling.
    pub fn apply_for_loan(&mut self, amount: u64, term: Term) -> Result<(), LoanError> {
        if self.has_active_loan() {
            return Err(LoanError::AlreadyHasLoan);
        }
        if amount > MAXIMUM_AMOUNT_FOR_FIRST_LOAN {
            return Err(LoanError::AmountTooHigh {
                max_amount: MAXIMUM_AMOUNT_FOR_FIRST_LOAN,
            });
        }
        self.loan = Some(Loan::new(amount, term));
        Ok(())
    }

    /// Repays part of the active loan. The loan is detached once nothing remains.
    pub fn repay(&mut self, amount: u64) -> Result<(), LoanError> {
        let loan = self.loan.as_mut().ok_or(LoanError::NoActiveLoan)?;
        loan.repay(amount)?;
        if loan.is_repaid() {
            self.loan = None;
        }
        Ok(())
    }
}
