//! Exclusive claims on agent resources.
//!
//! Each `OverrideKind` is held by at most one slot. Claiming records the
//! value in force beforehand so teardown can put it back exactly, whatever
//! the ability did to it in between.

use std::collections::BTreeMap;

use outrider_core::enums::OverrideKind;
use outrider_core::types::{AgentParams, ParamValue};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Claim {
    holder: usize,
    /// Value to restore. None for `Transform` and after restoration.
    original: Option<ParamValue>,
}

/// A claim attempt that collided with another slot's claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conflict {
    pub kind: OverrideKind,
    pub holder: usize,
}

#[derive(Debug, Clone, Default)]
pub struct OverrideLedger {
    claims: BTreeMap<OverrideKind, Claim>,
}

impl OverrideLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot currently holding `kind`.
    pub fn holder(&self, kind: OverrideKind) -> Option<usize> {
        self.claims.get(&kind).map(|c| c.holder)
    }

    /// Claim every kind for `owner`, or none of them.
    ///
    /// Kinds the owner already holds are left as they are.
    pub fn claim_all(
        &mut self,
        owner: usize,
        kinds: &[OverrideKind],
        current: &AgentParams,
    ) -> Result<(), Conflict> {
        for &kind in kinds {
            if let Some(holder) = self.holder(kind) {
                if holder != owner {
                    return Err(Conflict { kind, holder });
                }
            }
        }
        for &kind in kinds {
            self.claims.entry(kind).or_insert(Claim {
                holder: owner,
                original: current.get(kind),
            });
        }
        Ok(())
    }

    /// Hand back the pre-claim values of `owner`'s parameter overrides.
    ///
    /// Claims stay held (so no other slot can grab the transform while a
    /// run winds down) but will not restore again.
    pub fn restore_parameters(&mut self, owner: usize) -> Vec<ParamValue> {
        self.claims
            .values_mut()
            .filter(|c| c.holder == owner)
            .filter_map(|c| c.original.take())
            .collect()
    }

    /// Drop all of `owner`'s claims, returning any values not yet restored.
    pub fn release(&mut self, owner: usize) -> Vec<ParamValue> {
        let mut pending = Vec::new();
        self.claims.retain(|_, c| {
            if c.holder != owner {
                return true;
            }
            if let Some(value) = c.original.take() {
                pending.push(value);
            }
            false
        });
        pending
    }

    /// All claims as (kind, holder), ordered by kind.
    pub fn claims(&self) -> Vec<(OverrideKind, usize)> {
        self.claims.iter().map(|(k, c)| (*k, c.holder)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}
