use crate::models::{EvidenceRecord, TrustVerdict};
use crate::trust::config::TrustPolicy;

/// Sum the weight of every condition the evidence satisfies.
///
/// All default weights are multiples of 0.5, so the sum is exact in `f64`.
pub fn compute_score(evidence: &EvidenceRecord, policy: &TrustPolicy) -> f64 {
    let conditions = [
        (evidence.rear_or_portrait_camera(), policy.weight_camera),
        (evidence.orientation_ok, policy.weight_orientation),
        (evidence.touch && evidence.coarse_pointer, policy.weight_touch),
        (precise_fix(evidence, policy), policy.weight_geolocation),
        (
            evidence.cameras_count >= policy.min_cameras,
            policy.weight_multi_camera,
        ),
        (evidence.vibration, policy.weight_vibration),
        (evidence.portrait_screen(), policy.weight_portrait),
    ];

    conditions
        .iter()
        .filter(|(met, _)| *met)
        .map(|(_, weight)| weight)
        .sum()
}

pub fn compute_verdict(evidence: &EvidenceRecord, policy: &TrustPolicy) -> TrustVerdict {
    let score = compute_score(evidence, policy);
    TrustVerdict {
        score,
        pass: score >= policy.pass_threshold,
    }
}

fn precise_fix(evidence: &EvidenceRecord, policy: &TrustPolicy) -> bool {
    evidence.geo_ok
        && evidence
            .geo_accuracy_m
            .is_some_and(|accuracy| accuracy < policy.geo_accuracy_limit_m)
}
