/// Absolute Timestamp Correction (spec §4.D): presents consumers with a
/// contiguous virtual timeline even though a publisher's wire timestamps can
/// restart (re-publish) or wrap at 2^32 ms.
///
/// One instance is owned per publish session — the only writer of a
/// stream's timestamps — and applied before a frame reaches the gop cache
/// or any subscriber. The virtual timeline is carried as a full 64-bit
/// value: after enough rebases the running offset alone can exceed
/// `u32::MAX`, and clamping it back into 32 bits would stop the timeline
/// from advancing (spec.md §4.D: "a contiguous 64-bit virtual timeline").
#[derive(Debug, Clone, Copy)]
pub struct AtcCorrector {
    /// Largest corrected (virtual) timestamp handed out so far, or `None`
    /// before the first frame.
    last_max: Option<i64>,
    /// Offset currently added to every incoming raw timestamp.
    rebase: i64,
    /// A raw timestamp landing more than this far behind `last_max` is
    /// treated as a restart/wrap rather than ordinary jitter.
    threshold_ms: i64,
}

/// Default rebase threshold (spec §4.D): a 90s backward jump is assumed to
/// be a republish or wrap, not reordering.
pub const DEFAULT_REBASE_THRESHOLD_MS: i64 = 90_000;

impl Default for AtcCorrector {
    fn default() -> Self {
        Self::new(DEFAULT_REBASE_THRESHOLD_MS)
    }
}

impl AtcCorrector {
    #[must_use]
    pub const fn new(threshold_ms: i64) -> Self {
        Self {
            last_max: None,
            rebase: 0,
            threshold_ms,
        }
    }

    /// Corrects one raw wire timestamp, updating internal state. Returns
    /// the virtual timestamp to use in place of `raw` everywhere downstream
    /// (cache, fan-out, segmenters).
    pub fn correct(&mut self, raw: u32) -> i64 {
        self.correct_detecting_rebase(raw).0
    }

    /// Same correction as `correct`, additionally reporting whether this
    /// call triggered a rebase (a restart or 2^32 wrap was detected). The
    /// caller uses the flag to raise a discontinuity signal for consumers
    /// that care about timeline breaks (HLS/DASH segmenters, spec.md §4.E).
    ///
    /// Invariant #2 (spec.md §8): the virtual timeline is monotonically
    /// non-decreasing. A backward step under `threshold_ms` is ordinary
    /// jitter, not a rebase, but it must never be allowed to move the
    /// virtual timestamp backward either — it's clamped to the last value
    /// handed out instead of passed through.
    pub fn correct_detecting_rebase(&mut self, raw: u32) -> (i64, bool) {
        let candidate = i64::from(raw) + self.rebase;
        let mut rebased = false;

        if let Some(last_max) = self.last_max {
            if candidate < last_max - self.threshold_ms {
                // Restart or 2^32 wrap: continue the virtual timeline from
                // the last value we handed out.
                self.rebase = last_max + 1 - i64::from(raw);
                rebased = true;
            }
        }

        let corrected = i64::from(raw) + self.rebase;
        let corrected = self.last_max.map_or(corrected, |m| corrected.max(m));
        self.last_max = Some(corrected);
        (corrected, rebased)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_monotonic_timestamps() {
        let mut atc = AtcCorrector::default();
        assert_eq!(atc.correct(0), 0);
        assert_eq!(atc.correct(33), 33);
        assert_eq!(atc.correct(66), 66);
    }

    #[test]
    fn rebases_on_wrap() {
        let mut atc = AtcCorrector::default();
        assert_eq!(atc.correct(1_000_000), 1_000_000);
        // Wraps back near zero: must continue from prev_max + 1.
        let corrected = atc.correct(50);
        assert_eq!(corrected, 1_000_001);
    }

    #[test]
    fn does_not_rebase_on_small_backward_jitter() {
        let mut atc = AtcCorrector::default();
        atc.correct(10_000);
        // 500ms back-jitter is well under the 90s threshold, so no rebase
        // is triggered — but the virtual timeline still can't go backward,
        // so this clamps to the running max rather than passing 9_500
        // through.
        let corrected = atc.correct(9_500);
        assert_eq!(corrected, 10_000);
    }

    #[test]
    fn reports_rebase_only_on_the_triggering_call() {
        let mut atc = AtcCorrector::default();
        let (_, rebased) = atc.correct_detecting_rebase(1_000_000);
        assert!(!rebased);
        let (corrected, rebased) = atc.correct_detecting_rebase(50);
        assert!(rebased);
        assert_eq!(corrected, 1_000_001);
        let (_, rebased) = atc.correct_detecting_rebase(1_000_050);
        assert!(!rebased);
    }

    #[test]
    fn virtual_timeline_stays_monotonic_across_multiple_rebases() {
        let mut atc = AtcCorrector::default();
        let mut prev = 0i64;
        for raw in [0u32, 500, 1000, 100, 600, 50_000, 10] {
            let corrected = atc.correct(raw);
            assert!(corrected >= prev, "timeline went backward");
            prev = corrected;
        }
    }

    #[test]
    fn virtual_timeline_keeps_advancing_past_u32_max() {
        // Alternating high/low raw timestamps forces a rebase on every
        // "low" visit, each one pushing the running offset further out.
        // A handful of cycles pushes the corrected value past u32::MAX; the
        // old implementation clamped the output there and the timeline
        // stopped advancing. It must keep advancing as a 64-bit value
        // instead.
        let mut atc = AtcCorrector::new(100);
        let mut prev = 0i64;
        for _ in 0..4 {
            for raw in [4_000_000_000u32, 0u32] {
                let corrected = atc.correct(raw);
                assert!(corrected >= prev, "timeline went backward");
                prev = corrected;
            }
        }
        assert!(prev > i64::from(u32::MAX));
    }
}
