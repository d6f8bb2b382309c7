//! Employee records domain module.
//!
//! Holds the employee record model and the store abstraction the HTTP layer
//! talks to. No IO and no HTTP in here.

pub mod employee;
pub mod store;

pub use employee::{Employee, EmployeePayload};
pub use store::{DeleteOutcome, EmployeeStore, InMemoryEmployeeStore};
