//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the lab produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Two labs opened from the same catalog, ledger and seed and fed the same
//! `dt` sequence must end in the same state. Sources of divergence include:
//!
//! - **Unseeded randomness**: worker wandering and break lengths must only
//!   draw from the lab's injected generator.
//!
//! - **Iteration order**: systems visit workers in roster order, never in
//!   hash-map order.
//!
//! - **Wall clock**: the core never reads the clock; hosts pass `now` in.
//!
//! Hashes come from [`lab_core::ledger::Ledger::state_hash`].

use lab_core::lab::ResearchLab;
use lab_core::persistence::{LedgerStore, MemoryStore};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic lab).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the lab was deterministic.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Lab is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a scenario multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the scenario
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one tick
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```ignore
/// use lab_test_utils::determinism::verify_determinism;
/// use lab_test_utils::fixtures::gravity_lab_with_circle;
///
/// let result = verify_determinism(
///     5,
///     600,
///     || gravity_lab_with_circle().0,
///     |lab| { lab.tick(1.0 / 60.0); },
///     |lab| lab.ledger().state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a lab twice over the same `dt` sequence and compare final hashes.
pub fn verify_lab_determinism<F>(setup_fn: F, dts: &[f64]) -> bool
where
    F: Fn() -> ResearchLab<MemoryStore>,
{
    let result = verify_determinism(
        2,
        dts.len() as u64,
        || (setup_fn(), 0usize),
        |(lab, cursor)| {
            lab.tick(dts[*cursor]);
            *cursor += 1;
        },
        |(lab, _)| lab.ledger().state_hash(),
    );
    result.is_deterministic
}

/// Compare two lab runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs agree throughout, `Some(tick)` if they diverge at
/// that tick (0 means the initial states already differ).
pub fn find_first_divergence<F>(setup_fn: F, dts: &[f64]) -> Option<u64>
where
    F: Fn() -> ResearchLab<MemoryStore>,
{
    let mut lab1 = setup_fn();
    let mut lab2 = setup_fn();

    if lab1.ledger().state_hash() != lab2.ledger().state_hash() {
        return Some(0);
    }

    for (tick, &dt) in (1u64..).zip(dts) {
        lab1.tick(dt);
        lab2.tick(dt);

        if lab1.ledger().state_hash() != lab2.ledger().state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Verify that a save round trip preserves the ledger exactly.
pub fn verify_save_round_trip<F>(setup_fn: F, dts: &[f64]) -> bool
where
    F: Fn() -> ResearchLab<MemoryStore>,
{
    let mut lab = setup_fn();
    for &dt in dts {
        lab.tick(dt);
    }
    if lab.flush().is_err() {
        return false;
    }

    let hash_before = lab.ledger().state_hash();
    match lab.store().load() {
        Ok(Some(restored)) => restored.state_hash() == hash_before,
        _ => false,
    }
}

/// Proptest strategies for lab testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing.
pub mod strategies {
    use lab_core::data::UpgradeData;
    use lab_core::resource::ResourceKind;
    use lab_core::worker::WorkerShape;
    use proptest::prelude::*;

    /// Generate a resource kind.
    pub fn arb_resource() -> impl Strategy<Value = ResourceKind> {
        prop::sample::select(ResourceKind::ALL.to_vec())
    }

    /// Generate a worker shape.
    pub fn arb_shape() -> impl Strategy<Value = WorkerShape> {
        prop::sample::select(WorkerShape::ALL.to_vec())
    }

    /// Generate a frame time.
    ///
    /// Range: 1 ms to 0.5 s (covers normal frames and small hitches)
    pub fn arb_dt() -> impl Strategy<Value = f64> {
        0.001f64..0.5
    }

    /// Generate a sequence of frame times.
    pub fn arb_dt_sequence(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(arb_dt(), 1..max_len)
    }

    /// Generate an upgrade curve that passes validation.
    ///
    /// `base_cost * (cost_multiplier - 1) >= 1` always holds.
    pub fn arb_valid_upgrade_curve() -> impl Strategy<Value = UpgradeData> {
        (1.01f64..3.0, 0.0f64..1.0, 1u32..40).prop_flat_map(|(multiplier, effect, max_level)| {
            let min_base = (1.0 / (multiplier - 1.0)).ceil() + 1.0;
            (min_base..min_base + 10_000.0)
                .prop_map(move |base| UpgradeData::new(base, multiplier, effect, max_level))
        })
    }

    /// Generate an offline absence in seconds, including clock skew.
    ///
    /// Range: one hour backwards to two days forwards
    pub fn arb_absence_secs() -> impl Strategy<Value = i64> {
        -3_600i64..172_800
    }
}
