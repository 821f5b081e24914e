use std::sync::Mutex;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-1K-token rates, fixed configuration constants for the process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRates {
    pub rate_in: Decimal,
    pub rate_out: Decimal,
}

impl Default for CostRates {
    fn default() -> Self {
        // gpt-4o-mini list pricing, USD per 1K tokens
        Self { rate_in: Decimal::new(15, 5), rate_out: Decimal::new(6, 4) }
    }
}

/// One record per model invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRecord {
    pub tokens_in: u32,
    pub tokens_out: u32,
    pub cost: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostSnapshot {
    pub session_total_cost: Decimal,
    pub call_count: u64,
}

#[derive(Debug, Default)]
struct Totals {
    total_cost: Decimal,
    call_count: u64,
}

/// Running accumulator for one session. The total is monotonically
/// non-decreasing for the session lifetime; a failed model call that consumed
/// tokens is still charged. `reset` exists only for explicit session and test
/// boundaries, never for individual errors.
#[derive(Debug)]
pub struct CostTracker {
    rates: CostRates,
    totals: Mutex<Totals>,
}

impl CostTracker {
    pub fn new(rates: CostRates) -> Self {
        Self { rates, totals: Mutex::new(Totals::default()) }
    }

    pub fn rates(&self) -> &CostRates {
        &self.rates
    }

    pub fn compute_cost(&self, tokens_in: u32, tokens_out: u32) -> Decimal {
        let thousand = Decimal::from(1_000);
        Decimal::from(tokens_in) * self.rates.rate_in / thousand
            + Decimal::from(tokens_out) * self.rates.rate_out / thousand
    }

    pub fn record(&self, record: CostRecord) {
        let mut totals = self.lock_totals();
        totals.total_cost += record.cost;
        totals.call_count += 1;
    }

    /// Computes the cost from raw token counts, records it, and returns the
    /// record for audit detail.
    pub fn record_usage(&self, tokens_in: u32, tokens_out: u32) -> CostRecord {
        let record =
            CostRecord { tokens_in, tokens_out, cost: self.compute_cost(tokens_in, tokens_out) };
        self.record(record.clone());
        record
    }

    pub fn snapshot(&self) -> CostSnapshot {
        let totals = self.lock_totals();
        CostSnapshot { session_total_cost: totals.total_cost, call_count: totals.call_count }
    }

    pub fn reset(&self) {
        let mut totals = self.lock_totals();
        *totals = Totals::default();
    }

    fn lock_totals(&self) -> std::sync::MutexGuard<'_, Totals> {
        match self.totals.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for CostTracker {
    fn default() -> Self {
        Self::new(CostRates::default())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{CostRates, CostTracker};

    fn tracker() -> CostTracker {
        CostTracker::new(CostRates {
            rate_in: Decimal::new(1, 3),  // 0.001 per 1K in
            rate_out: Decimal::new(2, 3), // 0.002 per 1K out
        })
    }

    #[test]
    fn cost_formula_scales_per_thousand_tokens() {
        let tracker = tracker();
        // (500 / 1000) * 0.001 + (1000 / 1000) * 0.002 = 0.0025
        assert_eq!(tracker.compute_cost(500, 1_000), Decimal::new(25, 4));
    }

    #[test]
    fn totals_are_monotonically_non_decreasing() {
        let tracker = tracker();
        let mut previous = tracker.snapshot().session_total_cost;

        for _ in 0..5 {
            tracker.record_usage(120, 80);
            let snapshot = tracker.snapshot();
            assert!(snapshot.session_total_cost >= previous);
            previous = snapshot.session_total_cost;
        }
        assert_eq!(tracker.snapshot().call_count, 5);
    }

    #[test]
    fn zero_token_call_still_counts_an_invocation() {
        let tracker = tracker();
        tracker.record_usage(0, 0);

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.call_count, 1);
        assert_eq!(snapshot.session_total_cost, Decimal::ZERO);
    }

    #[test]
    fn reset_is_an_explicit_session_boundary() {
        let tracker = tracker();
        tracker.record_usage(1_000, 1_000);
        tracker.reset();

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.session_total_cost, Decimal::ZERO);
        assert_eq!(snapshot.call_count, 0);
    }
}
