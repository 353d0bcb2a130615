use crate::core::filters::is_historical_category;
use crate::models::{Landmark, SelectionOutcome, SignificanceScores};

pub const DEFAULT_THRESHOLD: u8 = 30;

/// Lowest threshold the relaxation retry will go down to
pub const RELAXATION_FLOOR: u8 = 20;
pub const RELAXATION_STEP: u8 = 10;

/// Pick the closest landmark whose score reaches `threshold`
///
/// Landmarks missing from `scores` never qualify. On equal distance the
/// first candidate in input order wins.
pub fn select<'a>(
    landmarks: &'a [Landmark],
    scores: &SignificanceScores,
    threshold: u8,
) -> Option<&'a Landmark> {
    let mut best: Option<&Landmark> = None;

    for landmark in landmarks {
        let qualifies = scores.get(&landmark.id).is_some_and(|s| *s >= threshold);
        if !qualifies {
            continue;
        }
        match best {
            Some(current) if landmark.distance_m >= current.distance_m => {}
            _ => best = Some(landmark),
        }
    }

    best
}

/// Threshold used by the single relaxation retry
#[inline]
pub fn relaxed_threshold(threshold: u8) -> u8 {
    threshold.saturating_sub(RELAXATION_STEP).max(RELAXATION_FLOOR)
}

/// Threshold selection with exactly one relaxation retry
pub fn select_with_relaxation(
    landmarks: &[Landmark],
    scores: &SignificanceScores,
    threshold: u8,
) -> SelectionOutcome {
    if landmarks.is_empty() {
        return SelectionOutcome::NoLandmarksInRange;
    }

    if let Some(chosen) = select(landmarks, scores, threshold) {
        return SelectionOutcome::Chosen(chosen.clone());
    }

    let relaxed = relaxed_threshold(threshold);
    tracing::debug!(
        "No landmark reached threshold {}, retrying at {}",
        threshold,
        relaxed
    );

    match select(landmarks, scores, relaxed) {
        Some(chosen) => SelectionOutcome::Chosen(chosen.clone()),
        None => SelectionOutcome::NoCandidate,
    }
}

/// Score used when no significance scores are available
///
/// rating x 10 + max(0, 100 - distance/10) + 20 for a historical category
#[inline]
pub fn heuristic_score(landmark: &Landmark) -> f64 {
    let rating = landmark.rating.map(|r| r * 10.0).unwrap_or(0.0);
    let proximity = (100.0 - landmark.distance_m / 10.0).max(0.0);
    let category = if is_historical_category(&landmark.category) { 20.0 } else { 0.0 };

    rating + proximity + category
}

/// Pick the landmark with the highest heuristic score, first one on ties
///
/// Always returns a landmark for non-empty input.
pub fn select_by_heuristic(landmarks: &[Landmark]) -> Option<&Landmark> {
    let mut best: Option<(&Landmark, f64)> = None;

    for landmark in landmarks {
        let score = heuristic_score(landmark);
        match best {
            Some((_, best_score)) if score <= best_score || score.is_nan() => {}
            _ => best = Some((landmark, score)),
        }
    }

    best.map(|(landmark, _)| landmark)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;

    fn create_landmark(id: &str, distance_m: f64, rating: Option<f64>, category: &str) -> Landmark {
        Landmark {
            id: id.to_string(),
            name: format!("Landmark {}", id),
            category: category.to_string(),
            distance_m,
            coordinates: Coordinates::new(50.087, 14.421),
            rating,
            address: None,
            description: None,
        }
    }

    fn scores(pairs: &[(&str, u8)]) -> SignificanceScores {
        pairs.iter().map(|(id, s)| (id.to_string(), *s)).collect()
    }

    #[test]
    fn test_threshold_filters_before_distance() {
        let landmarks = vec![
            create_landmark("A", 100.0, None, "Park"),
            create_landmark("B", 500.0, None, "Park"),
        ];
        let chosen = select(&landmarks, &scores(&[("A", 25), ("B", 35)]), 30).unwrap();
        assert_eq!(chosen.id, "B");
    }

    #[test]
    fn test_closest_qualifying_wins() {
        let landmarks = vec![
            create_landmark("A", 300.0, None, ""),
            create_landmark("B", 120.0, None, ""),
            create_landmark("C", 50.0, None, ""),
        ];
        let chosen = select(&landmarks, &scores(&[("A", 90), ("B", 40), ("C", 10)]), 30).unwrap();
        assert_eq!(chosen.id, "B");
    }

    #[test]
    fn test_distance_tie_keeps_first() {
        let landmarks = vec![
            create_landmark("A", 200.0, None, ""),
            create_landmark("B", 200.0, None, ""),
        ];
        let chosen = select(&landmarks, &scores(&[("A", 50), ("B", 80)]), 30).unwrap();
        assert_eq!(chosen.id, "A");
    }

    #[test]
    fn test_relaxation_retry() {
        let landmarks = vec![create_landmark("A", 100.0, None, "")];

        let outcome = select_with_relaxation(&landmarks, &scores(&[("A", 22)]), 30);
        assert_eq!(outcome, SelectionOutcome::Chosen(landmarks[0].clone()));

        let outcome = select_with_relaxation(&landmarks, &scores(&[("A", 10)]), 30);
        assert_eq!(outcome, SelectionOutcome::NoCandidate);
    }

    #[test]
    fn test_empty_input_is_no_landmarks_in_range() {
        let outcome = select_with_relaxation(&[], &scores(&[]), 30);
        assert_eq!(outcome, SelectionOutcome::NoLandmarksInRange);
    }

    #[test]
    fn test_relaxed_threshold_floor() {
        assert_eq!(relaxed_threshold(30), 20);
        assert_eq!(relaxed_threshold(50), 40);
        assert_eq!(relaxed_threshold(25), 20);
        assert_eq!(relaxed_threshold(5), 20);
    }

    #[test]
    fn test_unscored_landmark_never_qualifies() {
        let landmarks = vec![create_landmark("A", 10.0, None, "")];
        assert!(select(&landmarks, &scores(&[]), 0).is_none());
    }

    #[test]
    fn test_heuristic_single_candidate() {
        let landmarks = vec![create_landmark("A", 50.0, Some(9.0), "Monument")];
        let chosen = select_by_heuristic(&landmarks).unwrap();
        assert_eq!(chosen.id, "A");
        // 90 + 95 + 20
        assert_eq!(heuristic_score(chosen), 205.0);
    }

    #[test]
    fn test_heuristic_prefers_rated_historic() {
        let landmarks = vec![
            create_landmark("cafe", 20.0, Some(6.0), "Café"),
            create_landmark("castle", 600.0, Some(9.5), "Castle"),
        ];
        // cafe: 60 + 98 = 158, castle: 95 + 40 + 20 = 155
        assert_eq!(select_by_heuristic(&landmarks).unwrap().id, "cafe");

        let landmarks = vec![
            create_landmark("cafe", 200.0, Some(6.0), "Café"),
            create_landmark("castle", 600.0, Some(9.5), "Castle"),
        ];
        assert_eq!(select_by_heuristic(&landmarks).unwrap().id, "castle");
    }

    #[test]
    fn test_heuristic_tie_keeps_first_and_far_is_floored() {
        let landmarks = vec![
            create_landmark("A", 5000.0, None, ""),
            create_landmark("B", 9000.0, None, ""),
        ];
        assert_eq!(heuristic_score(&landmarks[1]), 0.0);
        assert_eq!(select_by_heuristic(&landmarks).unwrap().id, "A");
        assert!(select_by_heuristic(&[]).is_none());
    }
}
