use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use marquee_core::{ExpiryPolicy, ReservationError, ReservationManager, SeatStatus};
use marquee_store::MemorySeatStore;

async fn setup() -> (Arc<MemorySeatStore>, ReservationManager, Uuid, Uuid, Uuid) {
    let store = Arc::new(MemorySeatStore::new());
    let event_id = store.add_event().await;
    let seat_a = store.add_seat(event_id, 10.0, "Row A Seat 1").await;
    let seat_b = store.add_seat(event_id, 12.0, "Row A Seat 2").await;
    let manager = ReservationManager::new(store.clone(), ExpiryPolicy::from_minutes(10));
    (store, manager, event_id, seat_a, seat_b)
}

#[tokio::test]
async fn test_hold_then_confirm_round_trip() {
    let (store, manager, _event_id, seat_a, seat_b) = setup().await;

    let before = Utc::now();
    let receipt = manager
        .acquire_hold(&[seat_a, seat_b], "x@y.com")
        .await
        .unwrap();

    assert_eq!(receipt.seat_ids.len(), 2);
    assert_eq!(receipt.total_price, 22.0);
    assert_eq!(receipt.reference.len(), 8);
    // Deadline is hold time plus the configured duration.
    assert!(receipt.expires_at >= before + Duration::minutes(10));
    assert!(receipt.expires_at <= Utc::now() + Duration::minutes(10));

    let confirmation = manager.confirm(&receipt.reference).await.unwrap();
    assert_eq!(confirmation.seat_ids.len(), 2);

    for id in [seat_a, seat_b] {
        let seat = store.persisted_seat(id).await.unwrap();
        assert_eq!(seat.status, SeatStatus::Allocated);
        assert!(seat.held_at.is_none());
        assert_eq!(seat.hold_reference.as_deref(), Some(receipt.reference.as_str()));
    }
}

#[tokio::test]
async fn test_hold_then_cancel_round_trip() {
    let (store, manager, _event_id, seat_a, seat_b) = setup().await;

    let receipt = manager
        .acquire_hold(&[seat_a, seat_b], "x@y.com")
        .await
        .unwrap();
    let cancellation = manager.cancel(&receipt.reference).await.unwrap();
    assert_eq!(cancellation.cancelled_seat_ids.len(), 2);

    for id in [seat_a, seat_b] {
        let seat = store.persisted_seat(id).await.unwrap();
        assert_eq!(seat.status, SeatStatus::Open);
        assert!(seat.held_at.is_none());
        assert!(seat.hold_reference.is_none());
    }
}

#[tokio::test]
async fn test_acquire_is_all_or_nothing_on_contention() {
    let (store, manager, _event_id, seat_a, seat_b) = setup().await;

    // Seat B taken by someone else.
    let other = manager.acquire_hold(&[seat_b], "other@y.com").await.unwrap();

    let err = manager
        .acquire_hold(&[seat_a, seat_b], "x@y.com")
        .await
        .unwrap_err();
    match err {
        ReservationError::Unavailable { seat_ids } => assert_eq!(seat_ids, vec![seat_b]),
        other => panic!("unexpected error: {:?}", other),
    }

    // Seat A untouched, seat B still under the first hold.
    let seat = store.persisted_seat(seat_a).await.unwrap();
    assert_eq!(seat.status, SeatStatus::Open);
    let seat = store.persisted_seat(seat_b).await.unwrap();
    assert_eq!(seat.hold_reference.as_deref(), Some(other.reference.as_str()));
}

#[tokio::test]
async fn test_acquire_reports_missing_seats() {
    let (_store, manager, _event_id, seat_a, _seat_b) = setup().await;
    let ghost = Uuid::new_v4();

    let err = manager
        .acquire_hold(&[seat_a, ghost], "x@y.com")
        .await
        .unwrap_err();
    match err {
        ReservationError::SeatsNotFound { missing } => assert_eq!(missing, vec![ghost]),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_acquire_rejects_empty_seat_set() {
    let (_store, manager, _event_id, _seat_a, _seat_b) = setup().await;

    let err = manager.acquire_hold(&[], "x@y.com").await.unwrap_err();
    assert!(matches!(err, ReservationError::Validation(_)));
}

#[tokio::test]
async fn test_requester_identity_is_attribution_only() {
    let (_store, manager, _event_id, seat_a, _seat_b) = setup().await;

    // Any requester string is accepted; it is recorded, never validated.
    let receipt = manager
        .acquire_hold(&[seat_a], "anonymous-caller")
        .await
        .unwrap();
    assert_eq!(receipt.requester_email, "anonymous-caller");
    assert_eq!(receipt.seat_ids, vec![seat_a]);
}

#[tokio::test]
async fn test_acquire_deduplicates_seat_ids() {
    let (_store, manager, _event_id, seat_a, _seat_b) = setup().await;

    let receipt = manager
        .acquire_hold(&[seat_a, seat_a], "x@y.com")
        .await
        .unwrap();
    assert_eq!(receipt.seat_ids, vec![seat_a]);
    assert_eq!(receipt.total_price, 10.0);
}

#[tokio::test]
async fn test_confirm_expired_hold_reclaims_all_seats() {
    let (store, manager, _event_id, seat_a, seat_b) = setup().await;

    let receipt = manager
        .acquire_hold(&[seat_a, seat_b], "x@y.com")
        .await
        .unwrap();
    store
        .backdate_hold(&receipt.reference, Utc::now() - Duration::minutes(30))
        .await;

    let err = manager.confirm(&receipt.reference).await.unwrap_err();
    assert!(matches!(err, ReservationError::Expired { .. }));

    // The reclaim is persisted, not merely projected.
    for id in [seat_a, seat_b] {
        let seat = store.persisted_seat(id).await.unwrap();
        assert_eq!(seat.status, SeatStatus::Open);
        assert!(seat.hold_reference.is_none());
    }
}

#[tokio::test]
async fn test_second_confirm_fails_explicitly() {
    let (_store, manager, _event_id, seat_a, _seat_b) = setup().await;

    let receipt = manager.acquire_hold(&[seat_a], "x@y.com").await.unwrap();
    manager.confirm(&receipt.reference).await.unwrap();

    let err = manager.confirm(&receipt.reference).await.unwrap_err();
    assert!(matches!(err, ReservationError::AlreadyFinalized { .. }));
}

#[tokio::test]
async fn test_confirm_unknown_reference_not_found() {
    let (_store, manager, _event_id, _seat_a, _seat_b) = setup().await;
    let err = manager.confirm("UNKNOWN1").await.unwrap_err();
    assert!(matches!(err, ReservationError::HoldNotFound(_)));
}

#[tokio::test]
async fn test_cancel_unknown_reference_not_found() {
    let (_store, manager, _event_id, _seat_a, _seat_b) = setup().await;
    let err = manager.cancel("UNKNOWN1").await.unwrap_err();
    assert!(matches!(err, ReservationError::HoldNotFound(_)));
}

#[tokio::test]
async fn test_cancel_works_on_expired_hold() {
    let (store, manager, _event_id, seat_a, _seat_b) = setup().await;

    let receipt = manager.acquire_hold(&[seat_a], "x@y.com").await.unwrap();
    store
        .backdate_hold(&receipt.reference, Utc::now() - Duration::minutes(30))
        .await;

    let cancellation = manager.cancel(&receipt.reference).await.unwrap();
    assert_eq!(cancellation.cancelled_seat_ids, vec![seat_a]);
}

#[tokio::test]
async fn test_cancel_reopens_allocated_seats() {
    // Cancellation deliberately ignores seat status, so a confirmed
    // allocation can still be reset to open.
    let (store, manager, _event_id, seat_a, _seat_b) = setup().await;

    let receipt = manager.acquire_hold(&[seat_a], "x@y.com").await.unwrap();
    manager.confirm(&receipt.reference).await.unwrap();

    let cancellation = manager.cancel(&receipt.reference).await.unwrap();
    assert_eq!(cancellation.cancelled_seat_ids, vec![seat_a]);

    let seat = store.persisted_seat(seat_a).await.unwrap();
    assert_eq!(seat.status, SeatStatus::Open);
    assert!(seat.hold_reference.is_none());
}

#[tokio::test]
async fn test_lazy_expiry_projection_does_not_write_back() {
    let (store, manager, event_id, seat_a, _seat_b) = setup().await;

    let receipt = manager.acquire_hold(&[seat_a], "x@y.com").await.unwrap();
    store
        .backdate_hold(&receipt.reference, Utc::now() - Duration::minutes(30))
        .await;

    // Two consecutive reads both project the lapsed hold as open...
    for _ in 0..2 {
        let views = manager.list_seats(event_id).await.unwrap();
        let view = views.iter().find(|v| v.seat_id == seat_a).unwrap();
        assert_eq!(view.status, SeatStatus::Open);
    }

    // ...while the persisted record still says held.
    let seat = store.persisted_seat(seat_a).await.unwrap();
    assert_eq!(seat.status, SeatStatus::Held);

    // The next write path reclaims authoritatively.
    let second = manager.acquire_hold(&[seat_a], "z@y.com").await.unwrap();
    let seat = store.persisted_seat(seat_a).await.unwrap();
    assert_eq!(seat.status, SeatStatus::Held);
    assert_eq!(seat.hold_reference.as_deref(), Some(second.reference.as_str()));
}

#[tokio::test]
async fn test_list_seats_unknown_event() {
    let (_store, manager, _event_id, _seat_a, _seat_b) = setup().await;
    let err = manager.list_seats(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ReservationError::EventNotFound(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overlapping_claims_one_winner() {
    let store = Arc::new(MemorySeatStore::new());
    let event_id = store.add_event().await;
    let contested = store.add_seat(event_id, 10.0, "Row A Seat 1").await;
    let left = store.add_seat(event_id, 10.0, "Row A Seat 2").await;
    let right = store.add_seat(event_id, 10.0, "Row A Seat 3").await;

    let manager = Arc::new(ReservationManager::new(
        store.clone(),
        ExpiryPolicy::from_minutes(10),
    ));

    let barrier = Arc::new(tokio::sync::Barrier::new(2));
    let mut handles = Vec::new();
    for own in [left, right] {
        let manager = manager.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            manager.acquire_hold(&[own, contested], "x@y.com").await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(ReservationError::Unavailable { seat_ids }) => {
                assert!(seat_ids.contains(&contested));
            }
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert_eq!(successes, 1, "exactly one overlapping claim may win");

    // The loser's own seat must not have been left held.
    let mut held = 0;
    for id in [contested, left, right] {
        let seat = store.persisted_seat(id).await.unwrap();
        if seat.status == SeatStatus::Held {
            held += 1;
        }
    }
    assert_eq!(held, 2, "winner holds its own seat plus the contested one");
}
