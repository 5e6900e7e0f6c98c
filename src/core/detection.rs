//! Candidate and result types produced by the detection pipeline.

use serde::Serialize;

/// A hypothesis about a repeating dip, as produced by the period search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateWindow {
    /// Trial period (days).
    pub period: f64,
    /// Mid-time of a reference transit (days).
    pub epoch: f64,
    /// Box width (days).
    pub duration: f64,
    /// Dip score from the search (signal-to-noise-like, higher is better).
    pub score: f64,
}

/// A refined transit candidate with fitted and derived parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitCandidate {
    /// Fitted period (days).
    pub period: f64,
    /// Fitted mid-time of the reference transit (days).
    pub epoch: f64,
    /// Fitted full transit duration (days).
    pub duration: f64,
    /// Fractional peak depth, in (0, 1).
    pub depth: f64,
    /// Signal-to-noise-like significance, >= 0.
    pub significance: f64,
    /// Single-trial Gaussian false-alarm probability of `significance`.
    pub false_alarm_probability: f64,
    /// Confidence percentage assigned by the ranker, in [0, 100).
    pub confidence: f64,
    /// Planet radius in Earth radii.
    pub planet_radius: f64,
    /// Orbital period in days; equal to the fitted period.
    pub orbital_period: f64,
    /// Complete transit events inside the series span.
    pub transit_count: usize,
    /// Usable samples that fell inside a transit window.
    pub in_transit_points: usize,
}

/// Presentation record for the top-ranked candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitSummary {
    /// Confidence percentage in [0, 100).
    pub confidence: f64,
    /// Whether significance reached the detection threshold.
    pub transit_detected: bool,
    /// Orbital period (days).
    pub orbital_period: f64,
    /// Planet radius (Earth radii).
    pub planet_radius: f64,
    /// Transit depth in percent of the stellar flux.
    pub transit_depth: f64,
    /// Complete transit events observed.
    pub transit_count: usize,
}

/// Ordered detections for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    candidates: Vec<TransitCandidate>,
    confidence: f64,
    threshold: f64,
}

impl DetectionResult {
    /// Create a result from candidates already ordered most significant first.
    pub fn new(candidates: Vec<TransitCandidate>, threshold: f64) -> Self {
        let confidence = candidates.first().map(|c| c.confidence).unwrap_or(0.0);
        Self {
            candidates,
            confidence,
            threshold,
        }
    }

    /// A result with no detections.
    pub fn empty(threshold: f64) -> Self {
        Self::new(Vec::new(), threshold)
    }

    pub fn candidates(&self) -> &[TransitCandidate] {
        &self.candidates
    }

    /// The most significant candidate, if any.
    pub fn top(&self) -> Option<&TransitCandidate> {
        self.candidates.first()
    }

    /// Confidence of the top candidate (0.0 when empty).
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Significance threshold the run was evaluated against.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Whether the top candidate reaches the detection threshold.
    pub fn transit_detected(&self) -> bool {
        self.top()
            .map(|c| c.significance >= self.threshold)
            .unwrap_or(false)
    }

    /// Summarize the top candidate; all zeros when nothing was detected.
    pub fn summary(&self) -> TransitSummary {
        match self.top() {
            Some(top) => TransitSummary {
                confidence: self.confidence,
                transit_detected: self.transit_detected(),
                orbital_period: top.orbital_period,
                planet_radius: top.planet_radius,
                transit_depth: top.depth * 100.0,
                transit_count: top.transit_count,
            },
            None => TransitSummary {
                confidence: 0.0,
                transit_detected: false,
                orbital_period: 0.0,
                planet_radius: 0.0,
                transit_depth: 0.0,
                transit_count: 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn candidate(period: f64, significance: f64, confidence: f64) -> TransitCandidate {
        TransitCandidate {
            period,
            epoch: 0.1,
            duration: 0.15,
            depth: 0.02,
            significance,
            false_alarm_probability: 0.0,
            confidence,
            planet_radius: 15.4,
            orbital_period: period,
            transit_count: 8,
            in_transit_points: 24,
        }
    }

    #[test]
    fn empty_result_reports_no_detection() {
        let result = DetectionResult::empty(7.1);
        assert!(result.is_empty());
        assert!(!result.transit_detected());
        assert_eq!(result.confidence(), 0.0);

        let summary = result.summary();
        assert!(!summary.transit_detected);
        assert_eq!(summary.transit_count, 0);
    }

    #[test]
    fn summary_uses_top_candidate() {
        let result = DetectionResult::new(
            vec![candidate(3.5, 40.0, 85.0), candidate(5.0, 9.0, 55.0)],
            7.1,
        );

        assert_eq!(result.len(), 2);
        assert!(result.transit_detected());
        assert_relative_eq!(result.confidence(), 85.0);

        let summary = result.summary();
        assert_relative_eq!(summary.orbital_period, 3.5);
        assert_relative_eq!(summary.transit_depth, 2.0, epsilon = 1e-12);
        assert_eq!(summary.transit_count, 8);
    }

    #[test]
    fn summary_serializes_in_camel_case() {
        let result = DetectionResult::new(vec![candidate(3.5, 40.0, 85.0)], 7.1);
        let json = serde_json::to_value(result.summary()).unwrap();

        for key in [
            "confidence",
            "transitDetected",
            "orbitalPeriod",
            "planetRadius",
            "transitDepth",
            "transitCount",
        ] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
    }
}
