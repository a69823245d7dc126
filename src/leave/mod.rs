//! Leave accounting engine.
//!
//! Yearly provisioning seeds one ledger row per eligible user, `apply` classifies
//! a request against that row without writing to it, and `decide` settles the
//! ledger exactly once when the request is approved.

pub mod ledger;
pub mod provisioning;
pub mod workflow;

pub struct LeaveEngine<S> {
    store: S,
}

impl<S> LeaveEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
