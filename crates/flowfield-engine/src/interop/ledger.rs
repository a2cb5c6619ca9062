use std::collections::HashSet;
use std::sync::Arc;

use super::{InteropError, Owner, ResourceId, SharedAlias, SharedToken};

/// One entry of the per-dispatch protocol journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteropEvent {
    Acquire(Vec<ResourceId>),
    Release(Vec<ResourceId>),
}

/// Resources currently held by the compute pipeline.
///
/// Must be handed back through [`InteropLedger::release`]. Dropping an unreleased
/// batch returns ownership to graphics anyway (and logs), so an early `?` inside a
/// dispatch cannot leave a buffer stranded on the compute side.
#[must_use = "an acquired batch must be released before the resources are drawn"]
#[derive(Debug)]
pub struct AcquiredBatch {
    tokens: Vec<Arc<SharedToken>>,
    released: bool,
}

impl AcquiredBatch {
    pub fn ids(&self) -> Vec<ResourceId> {
        self.tokens.iter().map(|t| t.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn hand_back(&mut self) {
        for t in &self.tokens {
            t.set_owner(Owner::Graphics);
        }
        self.released = true;
    }
}

impl Drop for AcquiredBatch {
    fn drop(&mut self) {
        if !self.released {
            log::error!(
                "acquired batch {:?} dropped without release; returning to graphics",
                self.ids()
            );
            self.hand_back();
        }
    }
}

/// Batch acquire/release bookkeeping for one compute context.
///
/// The journal only covers the latest dispatch; [`begin_dispatch`](Self::begin_dispatch)
/// clears it.
#[derive(Debug, Default)]
pub struct InteropLedger {
    journal: Vec<InteropEvent>,
    acquired_total: u64,
    released_total: u64,
}

impl InteropLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_dispatch(&mut self) {
        self.journal.clear();
    }

    /// Moves every resource in `aliases` to the compute pipeline, all or nothing.
    ///
    /// The whole batch is validated before any ownership changes: a stale alias,
    /// a resource already held by compute, or a duplicate leaves every token untouched.
    pub fn acquire(
        &mut self,
        aliases: &[&dyn SharedAlias],
    ) -> Result<AcquiredBatch, InteropError> {
        let mut tokens = Vec::with_capacity(aliases.len());
        let mut seen = HashSet::with_capacity(aliases.len());

        for alias in aliases {
            let r = alias.token_ref();
            let token = r.upgrade()?;

            if !seen.insert(token.id()) {
                return Err(InteropError::DuplicateInBatch {
                    id: token.id(),
                    label: token.label().to_owned(),
                });
            }
            if token.owner() == Owner::Compute {
                return Err(InteropError::AlreadyAcquired {
                    id: token.id(),
                    label: token.label().to_owned(),
                });
            }
            tokens.push(token);
        }

        for t in &tokens {
            t.set_owner(Owner::Compute);
        }

        let batch = AcquiredBatch {
            tokens,
            released: false,
        };
        self.acquired_total += batch.len() as u64;
        self.journal.push(InteropEvent::Acquire(batch.ids()));
        log::trace!("acquired {:?}", batch.ids());

        Ok(batch)
    }

    /// Returns a batch to the graphics pipeline. Returns the released ids.
    pub fn release(&mut self, mut batch: AcquiredBatch) -> Vec<ResourceId> {
        let ids = batch.ids();
        batch.hand_back();

        self.released_total += ids.len() as u64;
        self.journal.push(InteropEvent::Release(ids.clone()));
        log::trace!("released {ids:?}");

        ids
    }

    /// Events recorded since the last `begin_dispatch`.
    pub fn journal(&self) -> &[InteropEvent] {
        &self.journal
    }

    /// True when every resource acquired so far has been released.
    pub fn is_balanced(&self) -> bool {
        self.acquired_total == self.released_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interop::TokenRef;

    fn alias(t: &Arc<SharedToken>) -> TokenRef {
        SharedToken::downgrade(t)
    }

    #[test]
    fn acquire_then_release_is_balanced() {
        let particles = SharedToken::new("particles");
        let field = SharedToken::new("field");
        let (a, b) = (alias(&particles), alias(&field));

        let mut ledger = InteropLedger::new();
        ledger.begin_dispatch();

        let batch = ledger.acquire(&[&a, &b]).unwrap();
        assert_eq!(particles.owner(), Owner::Compute);
        assert_eq!(field.owner(), Owner::Compute);

        let released = ledger.release(batch);
        assert_eq!(released, vec![particles.id(), field.id()]);
        assert_eq!(particles.owner(), Owner::Graphics);
        assert_eq!(field.owner(), Owner::Graphics);

        assert!(ledger.is_balanced());
        assert_eq!(
            ledger.journal(),
            &[
                InteropEvent::Acquire(vec![particles.id(), field.id()]),
                InteropEvent::Release(vec![particles.id(), field.id()]),
            ]
        );
    }

    #[test]
    fn every_acquired_id_is_released_exactly_once() {
        let tokens: Vec<_> = (0..4).map(|i| SharedToken::new(format!("r{i}"))).collect();
        let aliases: Vec<_> = tokens.iter().map(alias).collect();
        let refs: Vec<&dyn SharedAlias> = aliases.iter().map(|a| a as &dyn SharedAlias).collect();

        let mut ledger = InteropLedger::new();
        for _ in 0..3 {
            ledger.begin_dispatch();
            let batch = ledger.acquire(&refs).unwrap();
            ledger.release(batch);

            let (acq, rel) = match ledger.journal() {
                [InteropEvent::Acquire(a), InteropEvent::Release(r)] => (a.clone(), r.clone()),
                other => panic!("unexpected journal {other:?}"),
            };
            let mut acq_sorted = acq.clone();
            acq_sorted.sort();
            acq_sorted.dedup();
            assert_eq!(acq_sorted.len(), acq.len());
            assert_eq!(acq, rel);
        }
    }

    #[test]
    fn stale_alias_fails_without_touching_the_rest_of_the_batch() {
        let particles = SharedToken::new("particles");
        let old = SharedToken::new("old particles");
        let (live, stale) = (alias(&particles), alias(&old));
        drop(old);

        let mut ledger = InteropLedger::new();
        let err = ledger.acquire(&[&live, &stale]).unwrap_err();

        assert!(matches!(err, InteropError::StaleHandle { .. }));
        assert_eq!(particles.owner(), Owner::Graphics);
        assert!(ledger.journal().is_empty());
    }

    #[test]
    fn reacquire_before_release_is_rejected() {
        let particles = SharedToken::new("particles");
        let a = alias(&particles);

        let mut ledger = InteropLedger::new();
        let first = ledger.acquire(&[&a]).unwrap();
        let err = ledger.acquire(&[&a]).unwrap_err();
        assert!(matches!(err, InteropError::AlreadyAcquired { .. }));

        ledger.release(first);
        assert!(ledger.acquire(&[&a]).map(|b| ledger.release(b)).is_ok());
    }

    #[test]
    fn duplicates_in_one_batch_are_rejected() {
        let particles = SharedToken::new("particles");
        let a = alias(&particles);
        let b = alias(&particles);

        let mut ledger = InteropLedger::new();
        let err = ledger.acquire(&[&a, &b]).unwrap_err();
        assert!(matches!(err, InteropError::DuplicateInBatch { .. }));
        assert_eq!(particles.owner(), Owner::Graphics);
    }

    #[test]
    fn dropped_batch_returns_ownership() {
        let particles = SharedToken::new("particles");
        let a = alias(&particles);

        let mut ledger = InteropLedger::new();
        let batch = ledger.acquire(&[&a]).unwrap();
        drop(batch);

        assert_eq!(particles.owner(), Owner::Graphics);
        assert!(!ledger.is_balanced());
    }
}
