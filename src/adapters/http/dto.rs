//! Wire DTOs for JSON marshaling.

use crate::domain::{Client, Loan};
use serde::{Deserialize, Serialize};

/// Body of `GET /clients/{ktpNumber}`.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    pub ktp_number: String,
    pub birth_date: String,
    pub name: String,
    pub go_loans: LoansLinks,
}

impl ClientResponse {
    pub fn new(client: &Client, public_url: &str) -> Self {
        Self {
            ktp_number: client.ktp_number().to_string(),
            birth_date: client.birth_date().to_string(),
            name: client.name().to_string(),
            go_loans: LoansLinks {
                links: vec![Link {
                    rel: "self".to_string(),
                    href: loans_url(public_url, client.ktp_number()),
                }],
            },
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct LoansLinks {
    pub links: Vec<Link>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

/// Body of `POST /clients/{ktpNumber}/goLoans`.
#[derive(Debug, Deserialize)]
pub struct ApplyForLoanRequest {
    pub amount: u64,
    pub term: u32,
}

/// Body of `POST /clients/{ktpNumber}/goLoans/repayments`.
#[derive(Debug, Deserialize)]
pub struct RepaymentRequest {
    pub amount: u64,
}

/// Active loan as returned by the loan endpoints.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct LoanResponse {
    pub amount: u64,
    pub term: u32,
    pub remaining: u64,
}

impl From<&Loan> for LoanResponse {
    fn from(loan: &Loan) -> Self {
        Self {
            amount: loan.amount(),
            term: loan.term().days(),
            remaining: loan.remaining(),
        }
    }
}

pub fn client_url(public_url: &str, ktp_number: &str) -> String {
    format!("{}/clients/{}", public_url, ktp_number)
}

pub fn loans_url(public_url: &str, ktp_number: &str) -> String {
    format!("{}/goLoans", client_url(public_url, ktp_number))
}
