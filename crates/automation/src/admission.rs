//! Resource admission control.
//!
//! A fixed pool of named resources. Reservation is all-or-nothing: either
//! every requirement fits the remaining headroom and all of them are
//! reserved, or nothing is. That rules out partial-reservation deadlock
//! between competing tasks.

use std::collections::BTreeMap;

use goalkit_core::{AutomationError, ResourceKind, ResourceRequirements};
use tracing::warn;

#[derive(Debug, Clone, Copy)]
struct Budget {
    capacity: f64,
    reserved: f64,
}

/// A pool of named resource capacities with reservation accounting.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    resources: BTreeMap<ResourceKind, Budget>,
    clamp_events: u64,
}

impl ResourcePool {
    /// Build a pool from (kind, capacity) pairs. Capacities must be finite
    /// and positive.
    pub fn new(
        capacities: impl IntoIterator<Item = (ResourceKind, f64)>,
    ) -> Result<Self, AutomationError> {
        let mut resources = BTreeMap::new();
        for (kind, capacity) in capacities {
            if !capacity.is_finite() || capacity <= 0.0 {
                return Err(AutomationError::Validation(format!(
                    "capacity for {kind} must be finite and positive, got {capacity}"
                )));
            }
            resources.insert(
                kind,
                Budget {
                    capacity,
                    reserved: 0.0,
                },
            );
        }
        Ok(Self {
            resources,
            clamp_events: 0,
        })
    }

    /// Whether the pool knows this resource kind at all.
    pub fn has_kind(&self, kind: &ResourceKind) -> bool {
        self.resources.contains_key(kind)
    }

    /// Total capacity for a kind, 0 when unknown.
    pub fn capacity_of(&self, kind: &ResourceKind) -> f64 {
        self.resources.get(kind).map(|b| b.capacity).unwrap_or(0.0)
    }

    /// Remaining headroom for a kind, 0 when unknown.
    pub fn available(&self, kind: &ResourceKind) -> f64 {
        self.resources
            .get(kind)
            .map(|b| b.capacity - b.reserved)
            .unwrap_or(0.0)
    }

    /// Try to reserve every requirement at once.
    ///
    /// Returns true and reserves all of them when each fits its headroom;
    /// otherwise reserves nothing and returns false. Zero-valued and absent
    /// requirements never block. A requirement for a kind the pool does not
    /// carry, or a non-finite or negative amount, fails the reservation
    /// (the scheduler rejects such tasks at submission, so hitting that
    /// here means a caller bypassed it). The pool holds its own
    /// reserved-within-capacity invariant regardless of the caller.
    pub fn try_reserve(&mut self, requirements: &ResourceRequirements) -> bool {
        for (kind, amount) in requirements.iter() {
            if amount == 0.0 {
                continue;
            }
            if !amount.is_finite() || amount < 0.0 {
                return false;
            }
            let Some(budget) = self.resources.get(kind) else {
                return false;
            };
            if budget.capacity - budget.reserved < amount {
                return false;
            }
        }
        for (kind, amount) in requirements.iter() {
            if amount == 0.0 {
                continue;
            }
            if let Some(budget) = self.resources.get_mut(kind) {
                budget.reserved += amount;
            }
        }
        true
    }

    /// Release previously reserved requirements.
    ///
    /// Reserved amounts are clamped at zero; a clamp means release without a
    /// matching reservation and is surfaced as `ResourceInconsistency` after
    /// the state has been corrected. Non-fatal by design of the caller.
    pub fn release(
        &mut self,
        requirements: &ResourceRequirements,
    ) -> Result<(), AutomationError> {
        let mut clamped: Vec<String> = Vec::new();
        for (kind, amount) in requirements.iter() {
            if amount == 0.0 {
                continue;
            }
            if !amount.is_finite() || amount < 0.0 {
                clamped.push(format!("{kind}: invalid release amount {amount}"));
                continue;
            }
            match self.resources.get_mut(kind) {
                Some(budget) => {
                    if budget.reserved < amount {
                        clamped.push(format!(
                            "{kind}: released {amount} with only {} reserved",
                            budget.reserved
                        ));
                        budget.reserved = 0.0;
                    } else {
                        budget.reserved -= amount;
                    }
                }
                None => clamped.push(format!("{kind}: released {amount} on unknown resource")),
            }
        }
        if clamped.is_empty() {
            Ok(())
        } else {
            self.clamp_events += clamped.len() as u64;
            let detail = clamped.join("; ");
            warn!(detail = %detail, "resource release clamped");
            Err(AutomationError::ResourceInconsistency(detail))
        }
    }

    /// Utilization percentage per resource: reserved / capacity * 100.
    pub fn utilization(&self) -> BTreeMap<ResourceKind, f64> {
        self.resources
            .iter()
            .map(|(kind, b)| (kind.clone(), b.reserved / b.capacity * 100.0))
            .collect()
    }

    /// Capacity per resource, in kind order.
    pub fn capacities(&self) -> BTreeMap<ResourceKind, f64> {
        self.resources
            .iter()
            .map(|(kind, b)| (kind.clone(), b.capacity))
            .collect()
    }

    /// Reserved amount per resource, in kind order.
    pub fn reserved(&self) -> BTreeMap<ResourceKind, f64> {
        self.resources
            .iter()
            .map(|(kind, b)| (kind.clone(), b.reserved))
            .collect()
    }

    /// How many times release had to clamp at zero.
    pub fn clamp_events(&self) -> u64 {
        self.clamp_events
    }
}
