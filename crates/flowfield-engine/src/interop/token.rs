use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use super::InteropError;

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique id of one shared GPU allocation.
///
/// A recreated buffer always gets a fresh id, even if it reuses the same mesh slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ResourceId(u64);

impl ResourceId {
    fn next() -> Self {
        Self(NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which pipeline currently holds access rights to a shared resource.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Owner {
    Graphics,
    Compute,
}

/// Liveness + ownership marker of a graphics resource that compute may alias.
///
/// Created together with the graphics resource and dropped with it. Resources
/// start out owned by the graphics pipeline.
#[derive(Debug)]
pub struct SharedToken {
    id: ResourceId,
    label: String,
    compute_owned: AtomicBool,
}

impl SharedToken {
    pub fn new(label: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: ResourceId::next(),
            label: label.into(),
            compute_owned: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn owner(&self) -> Owner {
        if self.compute_owned.load(Ordering::Acquire) {
            Owner::Compute
        } else {
            Owner::Graphics
        }
    }

    pub(super) fn set_owner(&self, owner: Owner) {
        self.compute_owned
            .store(owner == Owner::Compute, Ordering::Release);
    }

    /// Creates the weak reference handed to a compute alias.
    pub fn downgrade(this: &Arc<Self>) -> TokenRef {
        TokenRef {
            id: this.id,
            label: this.label.clone(),
            token: Arc::downgrade(this),
        }
    }
}

/// Compute-side, non-owning view of a [`SharedToken`].
#[derive(Debug, Clone)]
pub struct TokenRef {
    id: ResourceId,
    label: String,
    token: Weak<SharedToken>,
}

impl TokenRef {
    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// True once the graphics resource this alias was imported from is gone.
    pub fn is_stale(&self) -> bool {
        self.token.strong_count() == 0
    }

    pub(super) fn upgrade(&self) -> Result<Arc<SharedToken>, InteropError> {
        self.token.upgrade().ok_or_else(|| InteropError::StaleHandle {
            id: self.id,
            label: self.label.clone(),
        })
    }
}

/// Anything on the compute side that aliases a graphics resource.
pub trait SharedAlias {
    fn token_ref(&self) -> &TokenRef;
}

impl SharedAlias for TokenRef {
    fn token_ref(&self) -> &TokenRef {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_per_token() {
        let a = SharedToken::new("a");
        let b = SharedToken::new("b");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn new_tokens_are_graphics_owned() {
        let t = SharedToken::new("particles");
        assert_eq!(t.owner(), Owner::Graphics);
    }

    #[test]
    fn token_ref_goes_stale_with_its_resource() {
        let t = SharedToken::new("particles");
        let r = SharedToken::downgrade(&t);
        assert!(!r.is_stale());
        drop(t);
        assert!(r.is_stale());
        assert!(matches!(r.upgrade(), Err(InteropError::StaleHandle { .. })));
    }
}
