//! Employee store abstraction and the in-memory implementation.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use keyroster_core::{EmployeeId, Entity};

use crate::employee::{Employee, EmployeePayload};

/// Result of a delete call. Both variants are normal outcomes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Keyed employee collection with store-assigned ids.
///
/// # Invariants
/// - Every key equals the `id` of its value.
/// - Ids come from a counter that never decreases and is never reused, even
///   after the record holding an id is deleted.
pub trait EmployeeStore: Send + Sync {
    fn list(&self) -> Vec<Employee>;
    fn get(&self, id: EmployeeId) -> Option<Employee>;
    /// Assign the next id to `payload` and store it.
    fn create(&self, payload: EmployeePayload) -> Employee;
    /// Replace the record at `id`; `None` (and no change) when absent.
    fn update(&self, id: EmployeeId, payload: EmployeePayload) -> Option<Employee>;
    fn delete(&self, id: EmployeeId) -> DeleteOutcome;
}

impl<S> EmployeeStore for Arc<S>
where
    S: EmployeeStore + ?Sized,
{
    fn list(&self) -> Vec<Employee> {
        (**self).list()
    }

    fn get(&self, id: EmployeeId) -> Option<Employee> {
        (**self).get(id)
    }

    fn create(&self, payload: EmployeePayload) -> Employee {
        (**self).create(payload)
    }

    fn update(&self, id: EmployeeId, payload: EmployeePayload) -> Option<Employee> {
        (**self).update(id, payload)
    }

    fn delete(&self, id: EmployeeId) -> DeleteOutcome {
        (**self).delete(id)
    }
}

#[derive(Debug)]
struct Inner {
    employees: BTreeMap<EmployeeId, Employee>,
    next_id: EmployeeId,
}

/// Process-local store. State is lost on restart.
///
/// The map and the id counter share one lock, so id assignment and insertion
/// happen atomically with respect to other writers.
#[derive(Debug)]
pub struct InMemoryEmployeeStore {
    inner: RwLock<Inner>,
}

impl InMemoryEmployeeStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                employees: BTreeMap::new(),
                next_id: EmployeeId::FIRST,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.read(|inner| inner.employees.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panicking writer cannot leave `Inner` half-updated (every mutation is a
    // single map operation plus a counter bump), so poisoned locks are recovered.
    fn read<T>(&self, f: impl FnOnce(&Inner) -> T) -> T {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl Default for InMemoryEmployeeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EmployeeStore for InMemoryEmployeeStore {
    fn list(&self) -> Vec<Employee> {
        self.read(|inner| inner.employees.values().cloned().collect())
    }

    fn get(&self, id: EmployeeId) -> Option<Employee> {
        self.read(|inner| inner.employees.get(&id).cloned())
    }

    fn create(&self, payload: EmployeePayload) -> Employee {
        let employee = self.write(|inner| {
            let id = inner.next_id;
            inner.next_id = id.next();
            let employee = payload.into_employee(id);
            inner.employees.insert(*employee.id(), employee.clone());
            employee
        });
        tracing::debug!(employee_id = %employee.id, "employee created");
        employee
    }

    fn update(&self, id: EmployeeId, payload: EmployeePayload) -> Option<Employee> {
        self.write(|inner| {
            let slot = inner.employees.get_mut(&id)?;
            *slot = payload.into_employee(id);
            Some(slot.clone())
        })
    }

    fn delete(&self, id: EmployeeId) -> DeleteOutcome {
        self.write(|inner| match inner.employees.remove(&id) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }
}
