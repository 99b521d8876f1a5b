//! A thread-safe pool of reusable tokenizers.
//!
//! Every tokenizer keeps its token buffer between parses, so the pool's job is
//! to route those buffers back to the next caller instead of letting them
//! drop. Checkout and checkin take a short mutex on the free list; parsing
//! itself happens outside the lock.
//!
//! Each checked-out instance is stamped with the id of its pool. Returning an
//! instance to a different pool, or one that was never checked out, panics.
//! Returning the same instance twice cannot be written: checkin takes the
//! tokenizer by value, and `Tokenizer` is not `Clone`.

use core::{
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
};
use std::sync::{Mutex, MutexGuard, PoisonError};

use alloc::vec::Vec;

use crate::{options::PoolOptions, tokenizer::Tokenizer};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Lifetime counters of a [`TokenizerPool`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Tokenizers constructed because the free list was empty.
    pub created: usize,
    /// Checkouts served from the free list.
    pub reused: usize,
    /// Checked-in tokenizers dropped because the free list was full.
    pub discarded: usize,
    /// Tokenizers currently in the free list.
    pub idle: usize,
}

/// Hands out [`Tokenizer`]s and takes them back for reuse.
///
/// # Examples
///
/// ```rust
/// use jsonspan::TokenizerPool;
///
/// let pool = TokenizerPool::default();
/// {
///     let mut tokenizer = pool.lease();
///     let stream = tokenizer.parse(b"[1,2,3]").unwrap();
///     assert_eq!(stream.len(), 7);
/// }
/// // The lease went back to the pool and is reused here.
/// let _again = pool.lease();
/// assert_eq!(pool.stats().created, 1);
/// assert_eq!(pool.stats().reused, 1);
/// ```
#[derive(Debug)]
pub struct TokenizerPool {
    id: u64,
    options: PoolOptions,
    idle: Mutex<Vec<Tokenizer>>,
    created: AtomicUsize,
    reused: AtomicUsize,
    discarded: AtomicUsize,
}

impl TokenizerPool {
    /// Creates an empty pool. Tokenizers are constructed lazily on checkout.
    #[must_use]
    pub fn new(options: PoolOptions) -> Self {
        Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            options,
            idle: Mutex::new(Vec::new()),
            created: AtomicUsize::new(0),
            reused: AtomicUsize::new(0),
            discarded: AtomicUsize::new(0),
        }
    }

    /// The options this pool was created with.
    #[must_use]
    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    fn free_list(&self) -> MutexGuard<'_, Vec<Tokenizer>> {
        // The list is only pushed to and popped from, so a panic while the
        // lock was held cannot have left it inconsistent.
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes an idle tokenizer, or creates one when none is idle.
    ///
    /// The caller owns the instance until it is passed to
    /// [`checkin`](Self::checkin). Prefer [`lease`](Self::lease), which
    /// returns it automatically.
    #[must_use]
    pub fn checkout(&self) -> Tokenizer {
        let reused = self.free_list().pop();
        let mut tokenizer = if let Some(tokenizer) = reused {
            self.reused.fetch_add(1, Ordering::Relaxed);
            tokenizer
        } else {
            self.created.fetch_add(1, Ordering::Relaxed);
            log::debug!("pool {}: creating a tokenizer", self.id);
            Tokenizer::new(self.options.tokenizer)
        };
        tokenizer.lease = Some(self.id);
        tokenizer
    }

    /// Returns a tokenizer obtained from [`checkout`](Self::checkout).
    ///
    /// The instance is reset and kept for reuse, or dropped when
    /// [`max_idle`](PoolOptions::max_idle) instances are already idle.
    ///
    /// # Panics
    ///
    /// Panics if `tokenizer` was not checked out from this pool.
    pub fn checkin(&self, mut tokenizer: Tokenizer) {
        match tokenizer.lease.take() {
            Some(id) if id == self.id => {}
            Some(id) => panic!(
                "tokenizer checked out from pool {id} was returned to pool {}",
                self.id
            ),
            None => panic!(
                "tokenizer returned to pool {} was never checked out",
                self.id
            ),
        }
        tokenizer.reset();

        let mut idle = self.free_list();
        if idle.len() < self.options.max_idle {
            idle.push(tokenizer);
            return;
        }
        drop(idle);
        self.discarded.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "pool {}: free list full, dropping a tokenizer with capacity {}",
            self.id,
            tokenizer.capacity()
        );
    }

    /// Checks out a tokenizer wrapped in a guard that checks it back in when
    /// dropped.
    #[must_use]
    pub fn lease(&self) -> PooledTokenizer<'_> {
        PooledTokenizer {
            pool: self,
            tokenizer: self.checkout(),
        }
    }

    /// A snapshot of the pool's counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.created.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            idle: self.free_list().len(),
        }
    }
}

impl Default for TokenizerPool {
    fn default() -> Self {
        Self::new(PoolOptions::default())
    }
}

/// A tokenizer on loan from a [`TokenizerPool`], returned on drop.
#[derive(Debug)]
pub struct PooledTokenizer<'p> {
    pool: &'p TokenizerPool,
    tokenizer: Tokenizer,
}

impl PooledTokenizer<'_> {
    /// Detaches the tokenizer from the guard. It is still stamped with the
    /// pool's id and must be handed to [`TokenizerPool::checkin`] by hand.
    #[must_use]
    pub fn into_inner(self) -> Tokenizer {
        let mut guard = core::mem::ManuallyDrop::new(self);
        core::mem::take(&mut guard.tokenizer)
    }
}

impl Deref for PooledTokenizer<'_> {
    type Target = Tokenizer;

    fn deref(&self) -> &Tokenizer {
        &self.tokenizer
    }
}

impl DerefMut for PooledTokenizer<'_> {
    fn deref_mut(&mut self) -> &mut Tokenizer {
        &mut self.tokenizer
    }
}

impl Drop for PooledTokenizer<'_> {
    fn drop(&mut self) {
        let tokenizer = core::mem::take(&mut self.tokenizer);
        self.pool.checkin(tokenizer);
    }
}
