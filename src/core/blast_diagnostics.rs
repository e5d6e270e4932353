//! Linking diagnostics
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_diagnostics.c
//!
//! Opt-in counters for the linking engine. Enabled via the
//! `SUMLINK_DIAGNOSTICS` environment variable (`1` or `true`); when disabled
//! every `record_*` call is a single cached branch.

use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::OnceLock;

static DIAGNOSTICS_ENABLED: OnceLock<bool> = OnceLock::new();

/// Process-wide counters, shared by all linking calls.
pub static LINK_DIAGNOSTICS: LinkDiagnostics = LinkDiagnostics::new();

/// Check if diagnostics are enabled via environment variable
pub fn diagnostics_enabled() -> bool {
    *DIAGNOSTICS_ENABLED.get_or_init(|| {
        std::env::var("SUMLINK_DIAGNOSTICS")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false)
    })
}

/// Counters for the linking engine.
#[derive(Debug)]
pub struct LinkDiagnostics {
    pub lists_linked: AtomicUsize,
    pub hsps_seen: AtomicUsize,
    pub frame_groups: AtomicUsize,
    pub chains_formed: AtomicUsize,
    pub linked_hsps: AtomicUsize,
    // Even-gap DP
    pub full_passes: AtomicUsize,
    pub cached_selections: AtomicUsize,
    pub shortcut_links: AtomicUsize,
    // Uneven-gap greedy joins
    pub joins_right: AtomicUsize,
    pub joins_left: AtomicUsize,
    pub sum_evalue_calls: AtomicUsize,
    pub clamped_evalues: AtomicUsize,
}

impl Default for LinkDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkDiagnostics {
    pub const fn new() -> Self {
        Self {
            lists_linked: AtomicUsize::new(0),
            hsps_seen: AtomicUsize::new(0),
            frame_groups: AtomicUsize::new(0),
            chains_formed: AtomicUsize::new(0),
            linked_hsps: AtomicUsize::new(0),
            full_passes: AtomicUsize::new(0),
            cached_selections: AtomicUsize::new(0),
            shortcut_links: AtomicUsize::new(0),
            joins_right: AtomicUsize::new(0),
            joins_left: AtomicUsize::new(0),
            sum_evalue_calls: AtomicUsize::new(0),
            clamped_evalues: AtomicUsize::new(0),
        }
    }

    /// Add `n` to `counter` when diagnostics are enabled.
    #[inline]
    pub fn record(counter: &AtomicUsize, n: usize) {
        if diagnostics_enabled() {
            counter.fetch_add(n, AtomicOrdering::Relaxed);
        }
    }

    pub fn reset(&self) {
        for counter in self.counters() {
            counter.1.store(0, AtomicOrdering::Relaxed);
        }
    }

    fn counters(&self) -> [(&'static str, &AtomicUsize); 12] {
        [
            ("HSP lists linked", &self.lists_linked),
            ("HSPs seen", &self.hsps_seen),
            ("Frame groups", &self.frame_groups),
            ("Chains formed", &self.chains_formed),
            ("HSPs in linked sets", &self.linked_hsps),
            ("Even-gap DP passes", &self.full_passes),
            ("Cached best chains reused", &self.cached_selections),
            ("Unchanged links reused", &self.shortcut_links),
            ("Uneven-gap joins (right)", &self.joins_right),
            ("Uneven-gap joins (left)", &self.joins_left),
            ("Sum e-value evaluations", &self.sum_evalue_calls),
            ("E-values clamped", &self.clamped_evalues),
        ]
    }

    /// Snapshot of all counters, in report order.
    pub fn snapshot(&self) -> Vec<(&'static str, usize)> {
        self.counters()
            .iter()
            .map(|(name, c)| (*name, c.load(AtomicOrdering::Relaxed)))
            .collect()
    }

    /// Log a summary at info level. No-op when diagnostics are disabled.
    pub fn log_summary(&self) {
        if !diagnostics_enabled() {
            return;
        }
        log::info!("=== HSP Linking Diagnostics ===");
        for (name, value) in self.snapshot() {
            log::info!("  {:<28}{}", format!("{}:", name), value);
        }
    }
}
