//! Learning Lifecycle Journey
//!
//! Follows a learner through the whole life of their cards:
//! 1. Add cards and see them in the due queue
//! 2. Review on schedule until a card is mastered
//! 3. Forget it and watch it reset
//! 4. Inspect history, reopen the database, delete

use chrono::Duration;
use lexis_core::{CardStatus, Rating, ReviewOutcome, SchedulerConfig, StorageError};
use lexis_e2e_tests::harness::TestDatabaseManager;
use lexis_e2e_tests::mocks::TestDataFactory;

// ============================================================================
// MASTERY
// ============================================================================

#[test]
fn test_card_reaches_mastery_and_resets_on_forget() {
    let db = TestDatabaseManager::new_temp();
    let start = TestDataFactory::epoch();
    let card = db.store.add_card("learner", "mariposa", Some("animals"), start).unwrap();

    let first = db.review(&card.id, Rating::Easy, start + Duration::days(1));
    assert_eq!(first.repetitions, 1);
    assert_eq!(first.status, CardStatus::Learning);

    let later = db.review_on_schedule(&card.id, &[Rating::Easy; 5]);
    let statuses: Vec<_> = later.iter().map(|c| c.status).collect();
    assert_eq!(
        statuses,
        vec![
            CardStatus::Learning,
            CardStatus::Learning,
            CardStatus::Learning,
            CardStatus::Learning,
            CardStatus::Mastered,
        ]
    );

    let mastered = later.last().unwrap();
    assert_eq!(mastered.repetitions, 6);

    // Intervals never shrink while every review passes
    let mut previous = first.interval_days;
    for card in &later {
        assert!(card.interval_days >= previous * (1.0 - 1e-9));
        previous = card.interval_days;
    }
    assert!(mastered.interval_days > first.interval_days);

    let forgotten = db.review_on_schedule(&card.id, &[Rating::Forgot]).remove(0);
    assert_eq!(forgotten.repetitions, 0);
    assert_eq!(forgotten.status, CardStatus::New);
    assert!(forgotten.interval_days <= mastered.interval_days);
    assert!(forgotten.next_review_at > mastered.next_review_at);
}

#[test]
fn test_hard_counts_toward_mastery() {
    let db = TestDatabaseManager::new_temp();
    let start = TestDataFactory::epoch();
    let card = db.store.add_card("learner", "ventana", None, start).unwrap();

    db.review(&card.id, Rating::Hard, start + Duration::days(1));
    let reviews = db.review_on_schedule(&card.id, &[Rating::Hard; 5]);

    assert_eq!(reviews.last().unwrap().repetitions, 6);
    assert_eq!(reviews.last().unwrap().status, CardStatus::Mastered);
}

#[test]
fn test_custom_mastery_threshold() {
    let config = SchedulerConfig {
        mastery_threshold: 2,
        ..SchedulerConfig::default()
    };
    let db = TestDatabaseManager::with_config(config);
    let start = TestDataFactory::epoch();
    let card = db.store.add_card("learner", "lluvia", None, start).unwrap();

    db.review(&card.id, Rating::Easy, start + Duration::days(1));
    let reviews = db.review_on_schedule(&card.id, &[Rating::Easy, Rating::Easy]);

    assert_eq!(reviews[0].status, CardStatus::Learning);
    assert_eq!(reviews[1].status, CardStatus::Mastered);
}

// ============================================================================
// DUE QUEUE
// ============================================================================

#[test]
fn test_due_queue_tracks_reviews() {
    let db = TestDatabaseManager::new_temp();
    let start = TestDataFactory::epoch();
    let ids = db.seed_cards("learner", 5, start);
    db.seed_cards("someone-else", 2, start);

    assert_eq!(db.store.due_cards("learner", start, 50).unwrap().len(), 5);
    assert_eq!(db.store.due_cards("learner", start, 3).unwrap().len(), 3);
    assert!(
        db.store
            .due_cards("learner", start - Duration::seconds(1), 50)
            .unwrap()
            .is_empty()
    );

    let review_time = start + Duration::days(1);
    let reviewed = db.review(&ids[0], Rating::Easy, review_time);
    assert!(reviewed.next_review_at > review_time);

    let due = db.store.due_cards("learner", review_time, 50).unwrap();
    assert_eq!(due.len(), 4);
    assert!(due.iter().all(|c| c.id != ids[0] && c.user_id == "learner"));

    let due_later = db.store.due_cards("learner", reviewed.next_review_at, 50).unwrap();
    assert_eq!(due_later.len(), 5);
    // Most overdue first
    assert_eq!(due_later.last().unwrap().id, ids[0]);
}

// ============================================================================
// HISTORY, PERSISTENCE, DELETION
// ============================================================================

#[test]
fn test_review_history_records_each_review() {
    let db = TestDatabaseManager::new_temp();
    let start = TestDataFactory::epoch();
    let card = db.store.add_card("learner", "camino", None, start).unwrap();

    let review_time = start + Duration::hours(20);
    db.store
        .review_card(
            &card.id,
            &ReviewOutcome::new(Rating::Hard, 4200, review_time - Duration::seconds(5)),
            review_time,
        )
        .unwrap();
    db.review_on_schedule(&card.id, &[Rating::Forgot, Rating::Easy]);

    let history = db.store.review_history(&card.id).unwrap();
    assert_eq!(history.len(), 3);

    let ratings: Vec<_> = history.iter().map(|r| r.rating).collect();
    assert_eq!(ratings, vec![Rating::Hard, Rating::Forgot, Rating::Easy]);

    let statuses: Vec<_> = history.iter().map(|r| r.status_after).collect();
    assert_eq!(
        statuses,
        vec![CardStatus::Learning, CardStatus::New, CardStatus::Learning]
    );

    let first = &history[0];
    assert_eq!(first.response_time_ms, 4200);
    assert_eq!(first.reviewed_at, review_time);
    assert_eq!(first.occurred_at, review_time - Duration::seconds(5));
    assert!((first.elapsed_days - 20.0 / 24.0).abs() < 1e-9);
    assert!(history.iter().all(|r| r.interval_days > 0.0));
}

#[test]
fn test_reviews_survive_reopen() {
    let db = TestDatabaseManager::new_temp();
    let start = TestDataFactory::epoch();
    let card = db.store.add_card("learner", "puente", None, start).unwrap();
    let reviewed = db.review(&card.id, Rating::Easy, start + Duration::days(2));

    let reopened = db.open_handle();
    let loaded = reopened.get_card(&card.id).unwrap().unwrap();

    assert_eq!(loaded.status, reviewed.status);
    assert_eq!(loaded.repetitions, reviewed.repetitions);
    assert_eq!(loaded.next_review_at, reviewed.next_review_at);
    assert_eq!(loaded.last_reviewed_at, reviewed.last_reviewed_at);
    assert_eq!(loaded.ease_factor, reviewed.ease_factor);

    let stored = loaded.memory_model.unwrap().to_array();
    let expected = reviewed.memory_model.unwrap().to_array();
    for (a, b) in stored.iter().zip(expected.iter()) {
        assert!((a - b).abs() <= b.abs() * 1e-12);
    }
}

#[test]
fn test_preview_leaves_store_untouched() {
    let db = TestDatabaseManager::new_temp();
    let start = TestDataFactory::epoch();
    let card = db.store.add_card("learner", "nube", None, start).unwrap();

    let now = start + Duration::days(1);
    let preview = db.store.scheduler().preview(&card, now).unwrap();
    assert!(preview.forgot.interval_days <= preview.easy.interval_days);
    assert_eq!(preview.hard.interval_days, preview.easy.interval_days);

    let stored = db.store.get_card(&card.id).unwrap().unwrap();
    assert!(stored.is_unreviewed());
    assert!(db.store.review_history(&card.id).unwrap().is_empty());

    // The real review agrees with the preview
    let reviewed = db.review(&card.id, Rating::Easy, now);
    assert_eq!(reviewed.next_review_at, preview.easy.next_review_at);
}

#[test]
fn test_delete_removes_card_and_history() {
    let db = TestDatabaseManager::new_temp();
    let start = TestDataFactory::epoch();
    let card = db.store.add_card("learner", "arena", None, start).unwrap();
    db.review(&card.id, Rating::Easy, start + Duration::days(1));

    assert!(db.store.delete_card(&card.id).unwrap());
    assert!(!db.store.delete_card(&card.id).unwrap());
    assert!(db.store.get_card(&card.id).unwrap().is_none());
    assert!(db.store.review_history(&card.id).unwrap().is_empty());

    let now = start + Duration::days(3);
    let result = db
        .store
        .review_card(&card.id, &ReviewOutcome::new(Rating::Easy, 0, now), now);
    assert!(matches!(result, Err(StorageError::NotFound(_))));
}
