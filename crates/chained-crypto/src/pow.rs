//! Proof-of-work search.
//!
//! A seal is accepted when its digest, read as a big-endian integer, is below
//! `2^(256 - difficulty)`. The search probes nonces upward from a starting
//! point until one is accepted or the budget runs out.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chained_types::Digest;
use rand::Rng;
use tracing::debug;

use crate::hasher::{PrefixedSeal, SealHasher};

/// How often (in attempts) each worker looks at the clock.
const DEADLINE_CHECK_INTERVAL: u64 = 256;

/// Returns `true` iff `int(digest) < 2^(256 - difficulty)`.
///
/// This is exactly "at least `difficulty` leading zero bits". Difficulty 0
/// accepts every digest; anything at or above 256 accepts only the zero
/// digest.
pub fn meets_target(digest: &Digest, difficulty: u32) -> bool {
    digest.leading_zero_bits() >= difficulty.min(256)
}

/// Limits on a single search. The default is unbounded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MiningBudget {
    /// Maximum number of digests computed across all workers.
    pub max_attempts: Option<u64>,
    /// Maximum wall-clock duration of the search.
    pub timeout: Option<Duration>,
}

impl MiningBudget {
    /// No limits: search until a seal is found.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Stop after `attempts` digests.
    pub fn with_max_attempts(mut self, attempts: u64) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Stop after `timeout` has elapsed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_attempts.is_none() && self.timeout.is_none()
    }
}

/// Shared flag that aborts an in-flight search.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// An accepted nonce and the digest it produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Solution {
    pub nonce: u64,
    pub digest: Digest,
    /// Digests computed across all workers before the search stopped.
    pub attempts: u64,
}

/// Errors from a bounded search.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum MiningError {
    #[error("search exhausted after {attempts} attempts")]
    Exhausted { attempts: u64 },

    #[error("search timed out after {attempts} attempts")]
    TimedOut { attempts: u64 },

    #[error("search cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },

    #[error("mining worker panicked")]
    WorkerPanicked,
}

/// Why a single worker stopped probing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WorkerExit {
    Found,
    Outpaced,
    Exhausted,
    TimedOut,
    Cancelled,
}

/// Proof-of-work searcher.
///
/// With `N` workers, worker `k` probes offsets `k, k + N, k + 2N, ...` from
/// the start nonce. Workers publish the smallest accepted offset and stop
/// once their own offset passes it, so the winner is always the lowest
/// accepted offset: the same nonce a single worker probing linearly would
/// return.
#[derive(Clone, Debug)]
pub struct Miner {
    workers: usize,
    budget: MiningBudget,
    cancel: Option<CancelToken>,
}

impl Default for Miner {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Miner {
    /// Create a miner with `workers` threads (at least one).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            budget: MiningBudget::default(),
            cancel: None,
        }
    }

    pub fn with_budget(mut self, budget: MiningBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn budget(&self) -> &MiningBudget {
        &self.budget
    }

    /// A uniformly random starting nonce in `[0, 2^32]`.
    pub fn random_start() -> u64 {
        rand::thread_rng().gen_range(0..=1u64 << 32)
    }

    /// Search for a nonce such that `SealHasher::hash(prefix ++ decimal(nonce))`
    /// meets `difficulty`, probing upward from `start`.
    pub fn search(&self, prefix: &[u8], difficulty: u32, start: u64) -> Result<Solution, MiningError> {
        let seal = SealHasher::prefixed(prefix);
        let search = Search {
            seal: &seal,
            difficulty,
            start,
            stride: self.workers as u64,
            best: AtomicU64::new(u64::MAX),
            attempts: AtomicU64::new(0),
            max_attempts: self.budget.max_attempts,
            deadline: self.budget.timeout.map(|t| Instant::now() + t),
            cancel: self.cancel.as_ref(),
        };

        debug!(
            difficulty,
            start,
            workers = self.workers,
            "searching for seal"
        );

        let exits = if self.workers == 1 {
            vec![search.probe(0)]
        } else {
            let search = &search;
            thread::scope(|scope| {
                let handles: Vec<_> = (0..self.workers as u64)
                    .map(|lane| scope.spawn(move || search.probe(lane)))
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().map_err(|_| MiningError::WorkerPanicked))
                    .collect::<Result<Vec<_>, _>>()
            })?
        };

        let attempts = search.attempts.load(Ordering::SeqCst);
        let attempts = self
            .budget
            .max_attempts
            .map_or(attempts, |max| attempts.min(max));
        let best = search.best.load(Ordering::SeqCst);
        if best != u64::MAX {
            let nonce = start.wrapping_add(best);
            debug!(nonce, attempts, "seal found");
            return Ok(Solution {
                nonce,
                digest: seal.digest(nonce),
                attempts,
            });
        }

        if exits.contains(&WorkerExit::Cancelled) {
            Err(MiningError::Cancelled { attempts })
        } else if exits.contains(&WorkerExit::TimedOut) {
            Err(MiningError::TimedOut { attempts })
        } else {
            Err(MiningError::Exhausted { attempts })
        }
    }
}

struct Search<'a> {
    seal: &'a PrefixedSeal,
    difficulty: u32,
    start: u64,
    stride: u64,
    best: AtomicU64,
    attempts: AtomicU64,
    max_attempts: Option<u64>,
    deadline: Option<Instant>,
    cancel: Option<&'a CancelToken>,
}

impl Search<'_> {
    fn probe(&self, lane: u64) -> WorkerExit {
        let mut offset = lane;
        let mut local = 0u64;
        loop {
            if offset > self.best.load(Ordering::SeqCst) {
                return WorkerExit::Outpaced;
            }
            if self.cancel.is_some_and(CancelToken::is_cancelled) {
                return WorkerExit::Cancelled;
            }
            let taken = self.attempts.fetch_add(1, Ordering::Relaxed);
            if self.max_attempts.is_some_and(|max| taken >= max) {
                return WorkerExit::Exhausted;
            }
            if local % DEADLINE_CHECK_INTERVAL == 0
                && self.deadline.is_some_and(|d| Instant::now() >= d)
            {
                return WorkerExit::TimedOut;
            }
            local += 1;

            let digest = self.seal.digest(self.start.wrapping_add(offset));
            if meets_target(&digest, self.difficulty) {
                self.best.fetch_min(offset, Ordering::SeqCst);
                return WorkerExit::Found;
            }

            offset = match offset.checked_add(self.stride) {
                Some(next) => next,
                None => return WorkerExit::Exhausted,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest_with_leading_byte(first: u8) -> Digest {
        let mut bytes = [0xff; 32];
        bytes[0] = first;
        Digest::from_bytes(bytes)
    }

    #[test]
    fn difficulty_zero_accepts_everything() {
        assert!(meets_target(&Digest::from_bytes([0xff; 32]), 0));
    }

    #[test]
    fn threshold_is_exact() {
        // 0x0fff... < 2^252 but not < 2^251.
        let digest = digest_with_leading_byte(0x0f);
        assert!(meets_target(&digest, 4));
        assert!(!meets_target(&digest, 5));
    }

    #[test]
    fn difficulty_256_needs_zero_digest() {
        assert!(!meets_target(&digest_with_leading_byte(0), 256));
        assert!(meets_target(&Digest::zero(), 256));
        assert!(meets_target(&Digest::zero(), 300));
    }

    #[test]
    fn found_seal_meets_target() {
        let miner = Miner::new(1);
        for difficulty in 0..=12 {
            let solution = miner.search(b"prefix", difficulty, 1_000).unwrap();
            assert!(meets_target(&solution.digest, difficulty));
            assert_eq!(
                solution.digest,
                SealHasher::hash_str(&format!("prefix{}", solution.nonce))
            );
            assert!(solution.nonce >= 1_000);
        }
    }

    #[test]
    fn high_difficulty_seals_meet_target() {
        let miner = Miner::new(4);
        for difficulty in [15, 17, 20] {
            let solution = miner.search(b"high difficulty", difficulty, 0).unwrap();
            assert!(solution.digest.leading_zero_bits() >= difficulty);
            assert_eq!(
                solution.digest,
                SealHasher::hash_str(&format!("high difficulty{}", solution.nonce))
            );
        }
    }

    #[test]
    fn parallel_search_matches_linear_probe() {
        let linear = Miner::new(1).search(b"same input", 10, 42).unwrap();
        for workers in [2, 3, 8] {
            let parallel = Miner::new(workers).search(b"same input", 10, 42).unwrap();
            assert_eq!(parallel.nonce, linear.nonce);
            assert_eq!(parallel.digest, linear.digest);
        }
    }

    #[test]
    fn attempt_budget_is_enforced() {
        let miner = Miner::new(1).with_budget(MiningBudget::unbounded().with_max_attempts(10));
        let err = miner.search(b"prefix", 200, 0).unwrap_err();
        assert_eq!(err, MiningError::Exhausted { attempts: 10 });
    }

    #[test]
    fn timeout_is_enforced() {
        let miner = Miner::new(2).with_budget(MiningBudget::unbounded().with_timeout(Duration::ZERO));
        let err = miner.search(b"prefix", 200, 0).unwrap_err();
        assert!(matches!(err, MiningError::TimedOut { .. }));
    }

    #[test]
    fn cancelled_token_stops_search() {
        let token = CancelToken::new();
        token.cancel();
        let miner = Miner::new(1).with_cancel_token(token);
        let err = miner.search(b"prefix", 200, 0).unwrap_err();
        assert_eq!(err, MiningError::Cancelled { attempts: 0 });
    }

    #[test]
    fn zero_workers_means_one() {
        assert_eq!(Miner::new(0).workers(), 1);
    }

    #[test]
    fn random_start_within_range() {
        for _ in 0..100 {
            assert!(Miner::random_start() <= 1u64 << 32);
        }
    }

    #[test]
    fn budget_builders() {
        let budget = MiningBudget::unbounded()
            .with_max_attempts(5)
            .with_timeout(Duration::from_secs(1));
        assert_eq!(budget.max_attempts, Some(5));
        assert_eq!(budget.timeout, Some(Duration::from_secs(1)));
        assert!(!budget.is_unbounded());
        assert!(MiningBudget::default().is_unbounded());
    }
}
