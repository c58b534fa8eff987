//! Phased damage model.
//!
//! Magnitude accrues at a piecewise-constant rate: each segment contributes
//! `(threshold - previous threshold) × rate` once fully elapsed, and the
//! segment containing the current time contributes its partial remainder.
//! The result is continuous and non-decreasing in elapsed time.

use outrider_core::descriptor::PhaseSegment;

/// Accumulated magnitude after `elapsed_secs` of lock time.
///
/// Negative or NaN elapsed time counts as zero. Past the last bounded
/// threshold the final segment's rate keeps applying.
pub fn compute_magnitude(elapsed_secs: f64, segments: &[PhaseSegment]) -> f64 {
    let elapsed = elapsed_secs.max(0.0);
    let mut total = 0.0;
    let mut start = 0.0;

    for segment in segments {
        let end = segment.threshold();
        if elapsed <= end {
            return total + (elapsed - start) * segment.rate_per_sec;
        }
        total += (end - start) * segment.rate_per_sec;
        start = end;
    }

    match segments.last() {
        Some(last) => total + (elapsed - start) * last.rate_per_sec,
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tier() -> Vec<PhaseSegment> {
        vec![PhaseSegment::bounded(2.0, 150.0), PhaseSegment::open(300.0)]
    }

    #[test]
    fn test_reference_values() {
        let segments = two_tier();
        assert_eq!(compute_magnitude(0.0, &segments), 0.0);
        assert_eq!(compute_magnitude(1.0, &segments), 150.0);
        assert_eq!(compute_magnitude(2.0, &segments), 300.0);
        assert_eq!(compute_magnitude(3.0, &segments), 600.0);
        assert_eq!(compute_magnitude(5.0, &segments), 1200.0);
    }

    #[test]
    fn test_continuous_at_boundaries() {
        let segments = vec![
            PhaseSegment::bounded(1.0, 50.0),
            PhaseSegment::bounded(2.5, 120.0),
            PhaseSegment::open(400.0),
        ];
        for boundary in [1.0, 2.5] {
            let before = compute_magnitude(boundary - 1e-9, &segments);
            let at = compute_magnitude(boundary, &segments);
            let after = compute_magnitude(boundary + 1e-9, &segments);
            assert!(
                (at - before).abs() < 1e-5 && (after - at).abs() < 1e-5,
                "Discontinuity at {boundary}: {before} / {at} / {after}"
            );
        }
    }

    #[test]
    fn test_monotonic_sweep() {
        let segments = vec![
            PhaseSegment::bounded(0.5, 10.0),
            PhaseSegment::bounded(1.5, 0.0),
            PhaseSegment::open(80.0),
        ];
        let mut previous = compute_magnitude(0.0, &segments);
        for i in 1..=400 {
            let t = i as f64 * 0.0125;
            let m = compute_magnitude(t, &segments);
            assert!(m >= previous, "Magnitude decreased at t={t}: {previous} -> {m}");
            previous = m;
        }
    }

    #[test]
    fn test_bounded_last_segment_keeps_rate() {
        let segments = vec![PhaseSegment::bounded(2.0, 100.0)];
        assert_eq!(compute_magnitude(2.0, &segments), 200.0);
        assert_eq!(compute_magnitude(3.0, &segments), 300.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(compute_magnitude(4.0, &[]), 0.0);
        assert_eq!(compute_magnitude(-1.0, &two_tier()), 0.0);
        assert_eq!(compute_magnitude(f64::NAN, &two_tier()), 0.0);
    }
}
