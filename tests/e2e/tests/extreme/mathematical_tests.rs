//! Mathematical Property Tests
//!
//! Checks the memory model and scheduler against the properties every
//! implementation must satisfy, over a spread of models and clocks.

use chrono::Duration;
use lexis_core::{CardStatus, Flashcard, MemoryModel, Rating, ReviewScheduler};
use lexis_e2e_tests::mocks::TestDataFactory;

const ELAPSED_GRID: [f64; 9] = [1e-6, 0.01, 0.1, 0.5, 1.0, 2.0, 7.5, 30.0, 365.0];

// ============================================================================
// RECALL DECAY
// ============================================================================

#[test]
fn test_recall_is_non_increasing_in_elapsed_time() {
    for model in TestDataFactory::sample_models() {
        for exact in [true, false] {
            let recalls: Vec<f64> = ELAPSED_GRID
                .iter()
                .map(|&e| model.predict_recall(e, exact).unwrap())
                .collect();

            for pair in recalls.windows(2) {
                assert!(
                    pair[0] >= pair[1],
                    "recall increased for {:?} (exact={}): {:?}",
                    model,
                    exact,
                    recalls
                );
            }
            assert!(recalls.iter().all(|r| (0.0..=1.0).contains(r)));
        }
    }
}

#[test]
fn test_approximate_recall_never_exceeds_exact() {
    // exp(E[ln p^d]) <= E[p^d] by Jensen
    for model in TestDataFactory::sample_models() {
        for &elapsed in &ELAPSED_GRID {
            let exact = model.predict_recall(elapsed, true).unwrap();
            let approx = model.predict_recall(elapsed, false).unwrap();
            assert!(approx <= exact + 1e-12, "{:?} at {}", model, elapsed);
        }
    }
}

// ============================================================================
// HALF-LIFE
// ============================================================================

#[test]
fn test_half_life_self_consistency() {
    for model in TestDataFactory::sample_models() {
        let half_life = model.half_life(0.5).unwrap();
        let recall = model.predict_recall(half_life, true).unwrap();
        assert!(
            (recall - 0.5).abs() < 1e-3,
            "{:?}: recall {} at half-life {}",
            model,
            recall,
            half_life
        );
    }
}

#[test]
fn test_other_percentiles_are_consistent_and_ordered() {
    for model in TestDataFactory::sample_models() {
        let long = model.half_life(0.3).unwrap();
        let half = model.half_life(0.5).unwrap();
        let short = model.half_life(0.9).unwrap();
        assert!(short < half && half < long, "{:?}", model);

        let recall = model.predict_recall(short, true).unwrap();
        assert!((recall - 0.9).abs() < 1e-3);
    }
}

#[test]
fn test_balanced_model_half_life_is_reference_time() {
    for t in [0.25, 1.0, 3.0, 90.0] {
        let model = MemoryModel::initialize(t).unwrap();
        let half_life = model.half_life(0.5).unwrap();
        assert!((half_life - t).abs() / t < 1e-6);
    }
}

// ============================================================================
// UPDATE DIRECTION
// ============================================================================

#[test]
fn test_pass_never_shortens_and_fail_never_lengthens() {
    for model in TestDataFactory::sample_models() {
        let before = model.half_life(0.5).unwrap();
        for &elapsed in &[0.1, 1.0, 5.0, 40.0] {
            let passed = model.update(1, 1, elapsed).unwrap().half_life(0.5).unwrap();
            let failed = model.update(0, 1, elapsed).unwrap().half_life(0.5).unwrap();

            assert!(
                passed >= before * (1.0 - 1e-6),
                "pass shortened {:?} at {}: {} -> {}",
                model,
                elapsed,
                before,
                passed
            );
            assert!(
                failed <= before * (1.0 + 1e-6),
                "fail lengthened {:?} at {}: {} -> {}",
                model,
                elapsed,
                before,
                failed
            );
        }
    }
}

#[test]
fn test_rebalanced_update_centers_recall_at_new_reference() {
    for model in TestDataFactory::sample_models() {
        let updated = model.update(1, 1, 2.0).unwrap();
        let recall = updated.predict_recall(updated.t(), true).unwrap();
        assert!((recall - 0.5).abs() < 1e-3, "{:?} -> {:?}", model, updated);
    }
}

#[test]
fn test_later_success_is_stronger_evidence() {
    let model = MemoryModel::initialize(1.0).unwrap();
    let early = model.update(1, 1, 0.2).unwrap().half_life(0.5).unwrap();
    let late = model.update(1, 1, 5.0).unwrap().half_life(0.5).unwrap();
    assert!(late > early);
}

// ============================================================================
// SERIALIZATION
// ============================================================================

#[test]
fn test_serialized_model_predicts_identically() {
    for model in TestDataFactory::sample_models() {
        let json = serde_json::to_string(&model).unwrap();
        let restored: MemoryModel = serde_json::from_str(&json).unwrap();
        let via_array = MemoryModel::from_array(model.to_array()).unwrap();

        for other in [restored, via_array] {
            for &elapsed in &ELAPSED_GRID {
                let a = model.predict_recall(elapsed, true).unwrap();
                let b = other.predict_recall(elapsed, true).unwrap();
                assert!((a - b).abs() < 1e-12);
            }
            let a = model.half_life(0.5).unwrap();
            let b = other.half_life(0.5).unwrap();
            assert!((a - b).abs() <= a * 1e-12);
        }
    }
}

// ============================================================================
// SCHEDULER
// ============================================================================

#[test]
fn test_status_transition_table() {
    let scheduler = ReviewScheduler::default();
    let now = TestDataFactory::epoch();

    let cases = [
        (0, CardStatus::New, Rating::Easy, 1, CardStatus::Learning),
        (5, CardStatus::Learning, Rating::Easy, 6, CardStatus::Mastered),
        (6, CardStatus::Mastered, Rating::Forgot, 0, CardStatus::New),
        (3, CardStatus::Learning, Rating::Hard, 4, CardStatus::Learning),
    ];

    for (reps, status, rating, expected_reps, expected_status) in cases {
        let card = TestDataFactory::card_in_state(reps, status, 2, now);
        let result = scheduler
            .submit_review(&card, &TestDataFactory::outcome(rating, now), now)
            .unwrap();
        assert_eq!(result.repetitions, expected_reps);
        assert_eq!(result.status, expected_status);
    }
}

#[test]
fn test_next_review_always_in_future() {
    let scheduler = ReviewScheduler::default();

    for scenario in TestDataFactory::scheduling_scenarios() {
        for rating in [Rating::Forgot, Rating::Hard, Rating::Easy] {
            let result = scheduler
                .submit_review(
                    &scenario.card,
                    &TestDataFactory::outcome(rating, scenario.now),
                    scenario.now,
                )
                .unwrap_or_else(|e| panic!("{} ({}): {}", scenario.description, rating, e));

            assert!(
                result.next_review_at > scenario.now,
                "{} ({})",
                scenario.description,
                rating
            );
            assert_eq!(result.last_reviewed_at, Some(scenario.now));
            assert!(result.interval_days > 0.0 && result.interval_days.is_finite());
        }
    }
}

#[test]
fn test_zero_elapsed_review_is_well_formed() {
    let scheduler = ReviewScheduler::default();
    let now = TestDataFactory::epoch();

    let mut card = Flashcard::new("user-1", "sol", now - Duration::days(4));
    card.last_reviewed_at = Some(now);
    card.memory_model = Some(MemoryModel::initialize(2.0).unwrap());

    for rating in [Rating::Forgot, Rating::Easy] {
        let result = scheduler
            .submit_review(&card, &TestDataFactory::outcome(rating, now), now)
            .unwrap();
        let model = result.memory_model.unwrap();
        assert!(model.alpha().is_finite() && model.beta().is_finite());
        assert!(model.t() > 0.0);
        assert!(result.next_review_at > now);
    }
}

#[test]
fn test_scheduler_is_deterministic() {
    let scheduler = ReviewScheduler::default();
    let now = TestDataFactory::epoch();
    let card = TestDataFactory::card_in_state(2, CardStatus::Learning, 3, now);
    let outcome = TestDataFactory::outcome(Rating::Hard, now);

    let a = scheduler.submit_review(&card, &outcome, now).unwrap();
    let b = scheduler.submit_review(&card, &outcome, now).unwrap();
    assert_eq!(a, b);
}
