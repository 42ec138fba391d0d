mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{manager, manager_with, BrokenStore, RejectingGateway, ScriptedGateway, SlowGateway, SlowStore};
use paycollect::{
    ApplyOutcome, ArtifactId, GatewayError, ManagerConfig, SessionManager, SessionStatus,
    SettlementId, StartError, StoreError,
};

#[tokio::test]
async fn started_session_polls_as_pending() {
    let manager = manager();

    for amount in [1, 500, 10_000] {
        let started = manager.start_session(amount).await.expect("start");
        assert_eq!(started.session.status, SessionStatus::Pending);
        assert_eq!(started.session.amount, amount);

        let (status, settlement) = manager
            .status(&started.session.artifact_id)
            .await
            .expect("status read")
            .expect("session exists");
        assert_eq!(status, SessionStatus::Pending);
        assert!(settlement.is_none());
    }
}

#[tokio::test]
async fn zero_amount_is_rejected_before_the_gateway() {
    let manager = manager();

    let err = manager.start_session(0).await.unwrap_err();
    assert_eq!(err, StartError::InvalidAmount { amount: 0 });
    assert!(manager.history(None).await.expect("history").is_empty());
}

#[tokio::test]
async fn apply_success_is_idempotent() {
    let manager = manager();
    let started = manager.start_session(500).await.expect("start");
    let id = started.session.artifact_id.clone();
    let settlement = SettlementId("pay_X9".to_string());

    let first = manager.apply_success(&id, &settlement).await.expect("apply");
    assert_eq!(first, ApplyOutcome::Applied);

    // Duplicate delivery, possibly with a different settlement id:
    // first writer wins, nothing is overwritten.
    let second = manager
        .apply_success(&id, &SettlementId("pay_OTHER".to_string()))
        .await
        .expect("apply");
    assert_eq!(second, ApplyOutcome::AlreadySettled);

    let (status, stored) = manager
        .status(&id)
        .await
        .expect("status read")
        .expect("session exists");
    assert_eq!(status, SessionStatus::Success);
    assert_eq!(stored, Some(settlement));
}

#[tokio::test]
async fn settlement_for_unknown_artifact_is_an_orphan() {
    let manager = manager();

    let outcome = manager
        .apply_success(
            &ArtifactId("qr_never_created".to_string()),
            &SettlementId("pay_1".to_string()),
        )
        .await
        .expect("apply");
    assert_eq!(outcome, ApplyOutcome::Orphan);

    // Orphans never create sessions retroactively.
    assert!(manager.history(None).await.expect("history").is_empty());
}

#[tokio::test]
async fn status_of_unknown_artifact_is_none() {
    let manager = manager();

    let status = manager
        .status(&ArtifactId("qr_nope".to_string()))
        .await
        .expect("status read");
    assert!(status.is_none());
}

#[tokio::test]
async fn history_is_most_recent_first_and_capped() {
    let manager = manager_with(
        Arc::new(ScriptedGateway::new("qr")),
        ManagerConfig {
            history_limit: 3,
            ..ManagerConfig::default()
        },
    );

    for amount in [10, 20, 30, 40, 50] {
        manager.start_session(amount).await.expect("start");
        // Creation timestamps are millisecond resolution; keep them distinct.
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let history = manager.history(None).await.expect("history");
    assert_eq!(history.len(), 3);
    for pair in history.windows(2) {
        assert!(pair[0].created_at_ms >= pair[1].created_at_ms);
    }
    assert_eq!(history[0].amount, 50);

    // Caller-supplied limits are capped by configuration.
    assert_eq!(manager.history(Some(50)).await.expect("history").len(), 3);
    assert_eq!(manager.history(Some(2)).await.expect("history").len(), 2);
}

#[tokio::test]
async fn processor_rejection_creates_no_session() {
    let manager = manager_with(Arc::new(RejectingGateway), ManagerConfig::default());

    let err = manager.start_session(500).await.unwrap_err();
    assert!(matches!(err, StartError::ArtifactCreation(_)));
}

#[tokio::test]
async fn store_failure_after_artifact_creation_is_a_partial_failure() {
    let manager = Arc::new(SessionManager::new(
        Arc::new(ScriptedGateway::new("qr")),
        Arc::new(BrokenStore),
        ManagerConfig::default(),
    ));

    let err = manager.start_session(500).await.unwrap_err();
    match err {
        StartError::PartialFailure { artifact_id, .. } => {
            // The artifact was created before the write failed.
            assert_eq!(artifact_id, ArtifactId("qr_A1".to_string()));
        }
        other => panic!("expected PartialFailure, got {:?}", other),
    }
}

#[tokio::test]
async fn hanging_gateway_call_times_out() {
    let manager = manager_with(
        Arc::new(SlowGateway {
            delay: Duration::from_millis(500),
        }),
        ManagerConfig {
            call_timeout: Duration::from_millis(10),
            ..ManagerConfig::default()
        },
    );

    let err = manager.start_session(500).await.unwrap_err();
    assert_eq!(err, StartError::ArtifactCreation(GatewayError::Timeout));
    assert!(manager.history(None).await.expect("history").is_empty());
}

#[tokio::test]
async fn hanging_store_call_times_out() {
    let manager = Arc::new(SessionManager::new(
        Arc::new(ScriptedGateway::new("qr")),
        Arc::new(SlowStore {
            delay: Duration::from_millis(500),
        }),
        ManagerConfig {
            call_timeout: Duration::from_millis(10),
            ..ManagerConfig::default()
        },
    ));

    let err = manager
        .status(&ArtifactId("qr_A1".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::Timeout);
}

#[tokio::test]
async fn concurrent_duplicate_settlements_settle_exactly_once() {
    let manager = manager();
    let started = manager.start_session(500).await.expect("start");
    let id = started.session.artifact_id.clone();

    let mut handles = Vec::new();
    for n in 0..8 {
        let manager = manager.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            manager
                .apply_success(&id, &SettlementId(format!("pay_{}", n)))
                .await
                .expect("apply")
        }));
    }

    let mut applied = 0;
    for handle in handles {
        if handle.await.expect("join") == ApplyOutcome::Applied {
            applied += 1;
        }
    }
    assert_eq!(applied, 1);

    let (status, settlement) = manager
        .status(&id)
        .await
        .expect("status read")
        .expect("session exists");
    assert_eq!(status, SessionStatus::Success);
    assert!(settlement.is_some());
}
