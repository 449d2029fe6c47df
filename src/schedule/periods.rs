use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ScheduleError};
use crate::interest::AccrualEngine;

/// one accrual period ending on a due date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// 1-based period number
    pub number: u32,
    pub start: NaiveDate,
    pub due: NaiveDate,
}

impl Period {
    pub fn days(&self) -> u32 {
        AccrualEngine::calculate_days(self.start, self.due)
    }
}

/// shift by whole calendar months, clamping to the last day of the target month
pub fn shift_months(date: NaiveDate, months: i32) -> Result<NaiveDate> {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months as u32))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };

    shifted.ok_or(ScheduleError::InvalidDate {
        message: format!("{} shifted by {} months is out of range", date, months),
    })
}

/// `count` consecutive monthly periods, the first one due on `first_due`
pub fn generate_periods(first_due: NaiveDate, count: u32) -> Result<Vec<Period>> {
    let mut periods = Vec::with_capacity(count as usize);
    if count == 0 {
        return Ok(periods);
    }

    let mut start = shift_months(first_due, -1)?;
    let mut due = first_due;
    for number in 1..=count {
        periods.push(Period { number, start, due });
        if number < count {
            start = due;
            due = shift_months(due, 1)?;
        }
    }

    Ok(periods)
}
