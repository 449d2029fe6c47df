use thiserror::Error;

use crate::decimal::{Money, Rate};

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("invalid interest rate for {field}: {rate}")]
    InvalidInterestRate {
        field: String,
        rate: Rate,
    },

    #[error("invalid amount for {field}: {amount}")]
    InvalidAmount {
        field: String,
        amount: Money,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("serialization error: {message}")]
    Serialization {
        message: String,
    },
}

impl From<serde_json::Error> for ScheduleError {
    fn from(e: serde_json::Error) -> Self {
        ScheduleError::Serialization {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
