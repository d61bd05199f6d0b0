//! Reference-date sources for status resolution.
//!
//! Status inference compares expected end dates against "today". The date is
//! always injected so that results are reproducible and never tied to the
//! moment a build was made.

use chrono::{Local, NaiveDate};

/// Source of the reference date used when resolving statuses
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the host
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one date
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(NaiveDate);

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}
