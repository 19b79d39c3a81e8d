//! Workflow tests against an in-memory SQLite store.

use std::sync::Arc;

use stocktake_core::{
    BranchId, Checker, GroupId, Item, ItemStateId, Role, ScanClassification, SessionId, UserId,
    Zone, ZoneState,
};
use stocktake_db::{Database, DbConfig};

use super::*;
use crate::error::ErrorCode;

// =============================================================================
// Fixture
// =============================================================================

struct Fixture {
    db: Arc<Database>,
    workflow: InventoryWorkflow<Database>,
    branch_id: BranchId,
    manager_id: UserId,
    checker: Checker,
    /// Checker profile in a different branch.
    foreign_checker: Checker,
    group_id: GroupId,
    ok_state: ItemStateId,
    damaged_state: ItemStateId,
    zone_a: Zone,
    zone_b: Zone,
    /// A-001, A-002 in zone A; B-001 in zone B.
    items: Vec<Item>,
}

async fn fixture_with(settings: WorkflowSettings) -> Fixture {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let staff = db.staff();

    let branch_id = staff.insert_branch("Central").await.unwrap();
    let other_branch = staff.insert_branch("Harbour").await.unwrap();

    let manager_id = staff
        .insert_user("Mia Manager", Role::AreaManager, Some(branch_id))
        .await
        .unwrap();
    let checker_user = staff
        .insert_user("Cole Checker", Role::Checker, Some(branch_id))
        .await
        .unwrap();
    let checker = staff.insert_checker(checker_user, branch_id).await.unwrap();
    let foreign_user = staff
        .insert_user("Hal Checker", Role::Checker, Some(other_branch))
        .await
        .unwrap();
    let foreign_checker = staff.insert_checker(foreign_user, other_branch).await.unwrap();
    let group_id = staff.insert_group("Day shift", branch_id).await.unwrap().id;

    let ok_state = db.items().insert_state("ok").await.unwrap().id;
    let damaged_state = db.items().insert_state("damaged").await.unwrap().id;

    let zone_a = db.zones().insert("Aisle A", branch_id, manager_id).await.unwrap();
    let zone_b = db.zones().insert("Aisle B", branch_id, manager_id).await.unwrap();

    let mut items = Vec::new();
    for (code, zone_id) in [("A-001", zone_a.id), ("A-002", zone_a.id), ("B-001", zone_b.id)] {
        items.push(
            db.items()
                .insert(code, &format!("Asset {code}"), zone_id, ok_state)
                .await
                .unwrap(),
        );
    }

    let db = Arc::new(db);
    let workflow = InventoryWorkflow::new(Arc::clone(&db), Arc::new(ScanCache::new()), settings);

    Fixture {
        db,
        workflow,
        branch_id,
        manager_id,
        checker,
        foreign_checker,
        group_id,
        ok_state,
        damaged_state,
        zone_a,
        zone_b,
        items,
    }
}

async fn fixture() -> Fixture {
    fixture_with(WorkflowSettings::default()).await
}

impl Fixture {
    async fn start(&self, zone_id: i64) -> ServiceResult<StartCountResponse> {
        self.workflow
            .start(StartCountRequest {
                zone_id,
                group_id: self.group_id,
                observations: Some("quarterly".to_string()),
                user_id: self.manager_id,
            })
            .await
    }

    async fn scan(
        &self,
        session_id: SessionId,
        code: &str,
        state_id: ItemStateId,
    ) -> ServiceResult<ScanItemResponse> {
        self.workflow
            .scan(ScanItemRequest {
                session_id,
                item_code: code.to_string(),
                state_id,
            })
            .await
    }

    async fn finish(&self, session_id: SessionId) -> ServiceResult<FinishCountResponse> {
        self.workflow
            .finish(FinishCountRequest {
                session_id,
                observations: "done".to_string(),
            })
            .await
    }

    fn decision(&self, session_id: SessionId, approved: bool) -> DecideRequest {
        DecideRequest {
            session_id,
            approved,
            observations: "reviewed".to_string(),
            role: Role::Checker,
            user_id: self.checker.user_id,
        }
    }

    async fn zone_state(&self, zone_id: i64) -> ZoneState {
        self.db.zones().get_by_id(zone_id).await.unwrap().unwrap().state
    }
}

fn code_of<T: std::fmt::Debug>(result: ServiceResult<T>) -> ErrorCode {
    result.unwrap_err().code
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_full_cycle_records_only_scanned_items() {
    let fx = fixture().await;

    let started = fx.start(fx.zone_a.id).await.unwrap();
    assert_eq!(started.zone_state, ZoneState::InInventory);
    assert_eq!(fx.zone_state(fx.zone_a.id).await, ZoneState::InInventory);
    let sid = started.session_id;

    let first = fx.scan(sid, "A-001", fx.ok_state).await.unwrap();
    assert!(first.valid);
    assert_eq!(first.classification, ScanClassification::Correct);
    assert_eq!(first.item_id, fx.items[0].id);

    assert_eq!(
        code_of(fx.scan(sid, "A-001", fx.ok_state).await),
        ErrorCode::Conflict
    );

    let finished = fx.finish(sid).await.unwrap();
    assert_eq!(finished.zone_state, ZoneState::InVerification);
    assert_eq!(finished.scanned_count, 1);

    let report = fx.workflow.compare(sid).await.unwrap();
    let missing: Vec<&str> = report.missing.iter().map(|m| m.code.as_str()).collect();
    assert_eq!(missing, vec!["A-002"]);
    assert!(report.unexpected.is_empty());
    assert!(report.state_mismatches.is_empty());

    let decided = fx.workflow.decide(fx.decision(sid, true)).await.unwrap();
    assert!(decided.approved);
    assert_eq!(decided.details_recorded, 1);
    assert_eq!(decided.zone_state, ZoneState::Available);

    let details = fx.db.verifications().details_for_session(sid).await.unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].item_id, fx.items[0].id);
    assert_eq!(fx.zone_state(fx.zone_a.id).await, ZoneState::Available);
    assert!(!fx.workflow.cache().is_open(sid));
}

#[tokio::test]
async fn test_wrong_zone_scan_is_reported_but_not_recorded() {
    let fx = fixture().await;
    let sid = fx.start(fx.zone_a.id).await.unwrap().session_id;

    fx.scan(sid, "A-001", fx.ok_state).await.unwrap();
    let stray = fx.scan(sid, "B-001", fx.ok_state).await.unwrap();
    assert!(!stray.valid);
    assert_eq!(stray.classification, ScanClassification::WrongZone);

    fx.finish(sid).await.unwrap();

    let report = fx.workflow.compare(sid).await.unwrap();
    let unexpected: Vec<&str> = report.unexpected.iter().map(|u| u.code.as_str()).collect();
    assert_eq!(unexpected, vec!["B-001"]);

    let decided = fx.workflow.decide(fx.decision(sid, true)).await.unwrap();
    assert_eq!(decided.details_recorded, 1);

    let details = fx.db.verifications().details_for_session(sid).await.unwrap();
    assert!(details.iter().all(|d| d.item_id != fx.items[2].id));
}

#[tokio::test]
async fn test_approval_updates_declared_item_state() {
    let fx = fixture().await;
    let sid = fx.start(fx.zone_a.id).await.unwrap().session_id;

    fx.scan(sid, "A-002", fx.damaged_state).await.unwrap();
    fx.finish(sid).await.unwrap();

    let report = fx.workflow.compare(sid).await.unwrap();
    assert_eq!(report.state_mismatches.len(), 1);
    assert_eq!(report.state_mismatches[0].expected_state, "ok");
    assert_eq!(report.state_mismatches[0].scanned_state, "damaged");

    fx.workflow.decide(fx.decision(sid, true)).await.unwrap();

    let item = fx.db.items().get_by_code("A-002").await.unwrap().unwrap();
    assert_eq!(item.state_id, fx.damaged_state);
}

// =============================================================================
// State Machine
// =============================================================================

#[tokio::test]
async fn test_start_requires_available_zone() {
    let fx = fixture().await;
    fx.start(fx.zone_a.id).await.unwrap();

    assert_eq!(code_of(fx.start(fx.zone_a.id).await), ErrorCode::InvalidState);
    assert_eq!(code_of(fx.start(9999).await), ErrorCode::NotFound);

    // Other zones are unaffected
    fx.start(fx.zone_b.id).await.unwrap();
}

#[tokio::test]
async fn test_start_requires_known_group() {
    let fx = fixture().await;
    let result = fx
        .workflow
        .start(StartCountRequest {
            zone_id: fx.zone_a.id,
            group_id: 4242,
            observations: None,
            user_id: fx.manager_id,
        })
        .await;

    assert_eq!(code_of(result), ErrorCode::NotFound);
    assert_eq!(fx.zone_state(fx.zone_a.id).await, ZoneState::Available);
}

#[tokio::test]
async fn test_scan_only_while_counting() {
    let fx = fixture().await;
    let sid = fx.start(fx.zone_a.id).await.unwrap().session_id;
    fx.finish(sid).await.unwrap();

    assert_eq!(
        code_of(fx.scan(sid, "A-001", fx.ok_state).await),
        ErrorCode::InvalidState
    );
    assert_eq!(code_of(fx.finish(sid).await), ErrorCode::InvalidState);

    fx.workflow.decide(fx.decision(sid, false)).await.unwrap();

    // Zone is available again; the old session can't take scans
    assert_eq!(
        code_of(fx.scan(sid, "A-001", fx.ok_state).await),
        ErrorCode::InvalidState
    );
}

#[tokio::test]
async fn test_verify_requires_finished_count() {
    let fx = fixture().await;
    let sid = fx.start(fx.zone_a.id).await.unwrap().session_id;

    assert_eq!(code_of(fx.workflow.compare(sid).await), ErrorCode::InvalidState);
    assert_eq!(
        code_of(fx.workflow.decide(fx.decision(sid, true)).await),
        ErrorCode::InvalidState
    );
}

#[tokio::test]
async fn test_scan_input_errors() {
    let fx = fixture().await;
    let sid = fx.start(fx.zone_a.id).await.unwrap().session_id;

    assert_eq!(code_of(fx.scan(sid, "   ", fx.ok_state).await), ErrorCode::ValidationError);
    assert_eq!(code_of(fx.scan(sid, "NOPE", fx.ok_state).await), ErrorCode::NotFound);
    assert_eq!(code_of(fx.scan(sid, "A-001", 999).await), ErrorCode::NotFound);
    assert_eq!(code_of(fx.scan(777, "A-001", fx.ok_state).await), ErrorCode::NotFound);

    // None of the failures touched the cache
    assert_eq!(fx.workflow.cache().len(sid).await, 0);
}

// =============================================================================
// Verification
// =============================================================================

#[tokio::test]
async fn test_second_decide_conflicts() {
    let fx = fixture().await;
    let sid = fx.start(fx.zone_a.id).await.unwrap().session_id;
    fx.scan(sid, "A-001", fx.ok_state).await.unwrap();
    fx.finish(sid).await.unwrap();

    fx.workflow.decide(fx.decision(sid, true)).await.unwrap();

    assert_eq!(
        code_of(fx.workflow.decide(fx.decision(sid, true)).await),
        ErrorCode::Conflict
    );
    assert_eq!(
        code_of(fx.workflow.decide(fx.decision(sid, false)).await),
        ErrorCode::Conflict
    );
}

#[tokio::test]
async fn test_decide_authorization() {
    let fx = fixture().await;
    let sid = fx.start(fx.zone_a.id).await.unwrap().session_id;
    fx.finish(sid).await.unwrap();

    let mut as_manager = fx.decision(sid, true);
    as_manager.role = Role::AreaManager;
    assert_eq!(code_of(fx.workflow.decide(as_manager).await), ErrorCode::Forbidden);

    let mut no_profile = fx.decision(sid, true);
    no_profile.user_id = fx.manager_id;
    assert_eq!(code_of(fx.workflow.decide(no_profile).await), ErrorCode::NotFound);

    let mut other_branch = fx.decision(sid, true);
    other_branch.user_id = fx.foreign_checker.user_id;
    assert_eq!(code_of(fx.workflow.decide(other_branch).await), ErrorCode::Forbidden);

    // Nothing was recorded by the rejected attempts
    assert_eq!(fx.zone_state(fx.zone_a.id).await, ZoneState::InVerification);
    assert!(fx.db.verifications().get_by_session(sid).await.unwrap().is_none());
}

#[tokio::test]
async fn test_rejection_releases_zone_without_details() {
    let fx = fixture().await;
    let sid = fx.start(fx.zone_a.id).await.unwrap().session_id;
    fx.scan(sid, "A-001", fx.damaged_state).await.unwrap();
    fx.finish(sid).await.unwrap();

    let decided = fx.workflow.decide(fx.decision(sid, false)).await.unwrap();
    assert!(!decided.approved);
    assert_eq!(decided.details_recorded, 0);

    assert!(fx.db.verifications().details_for_session(sid).await.unwrap().is_empty());
    assert!(!fx.workflow.cache().is_open(sid));
    assert_eq!(fx.zone_state(fx.zone_a.id).await, ZoneState::Available);

    // Item state untouched on rejection
    let item = fx.db.items().get_by_code("A-001").await.unwrap().unwrap();
    assert_eq!(item.state_id, fx.ok_state);

    // And the zone can be counted again
    fx.start(fx.zone_a.id).await.unwrap();
}

#[tokio::test]
async fn test_compare_is_idempotent() {
    let fx = fixture().await;
    let sid = fx.start(fx.zone_a.id).await.unwrap().session_id;
    fx.scan(sid, "A-002", fx.damaged_state).await.unwrap();
    fx.scan(sid, "B-001", fx.ok_state).await.unwrap();
    fx.finish(sid).await.unwrap();

    let first = fx.workflow.compare(sid).await.unwrap();
    let second = fx.workflow.compare(sid).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(fx.zone_state(fx.zone_a.id).await, ZoneState::InVerification);
    assert_eq!(fx.workflow.cache().len(sid).await, 2);
}

#[tokio::test]
async fn test_pending_shows_latest_finished_session_per_zone() {
    let fx = fixture().await;

    let a = fx.start(fx.zone_a.id).await.unwrap().session_id;
    let b = fx.start(fx.zone_b.id).await.unwrap().session_id;
    fx.finish(a).await.unwrap();

    let pending = fx.workflow.pending(fx.branch_id).await.unwrap();
    let ids: Vec<SessionId> = pending.iter().map(|s| s.session.id).collect();
    assert_eq!(ids, vec![a]);

    fx.finish(b).await.unwrap();
    let pending = fx.workflow.pending(fx.branch_id).await.unwrap();
    assert_eq!(pending.len(), 2);

    fx.workflow.decide(fx.decision(a, false)).await.unwrap();
    let pending = fx.workflow.pending(fx.branch_id).await.unwrap();
    let ids: Vec<SessionId> = pending.iter().map(|s| s.session.id).collect();
    assert_eq!(ids, vec![b]);
}

// =============================================================================
// Observation Log
// =============================================================================

#[tokio::test]
async fn test_finish_appends_closing_note() {
    let fx = fixture().await;
    let sid = fx.start(fx.zone_a.id).await.unwrap().session_id;
    fx.finish(sid).await.unwrap();

    let session = fx.db.sessions().get_with_zone(sid).await.unwrap().unwrap();
    let lines: Vec<&str> = session.session.observations.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "quarterly");
    assert!(lines[1].starts_with("[closed "));
    assert!(lines[1].ends_with("] done"));
}

#[tokio::test]
async fn test_finish_without_header() {
    let fx = fixture_with(WorkflowSettings {
        closing_note_header: false,
    })
    .await;
    let sid = fx.start(fx.zone_a.id).await.unwrap().session_id;
    fx.finish(sid).await.unwrap();

    let session = fx.db.sessions().get_with_zone(sid).await.unwrap().unwrap();
    assert_eq!(session.session.observations, "quarterly\ndone");
}

// =============================================================================
// Lost Scans
// =============================================================================

#[tokio::test]
async fn test_lost_scans_are_reported_and_recoverable() {
    let fx = fixture().await;
    let sid = fx.start(fx.zone_a.id).await.unwrap().session_id;
    fx.scan(sid, "A-001", fx.ok_state).await.unwrap();

    // Same store, fresh cache: what a restart looks like
    let restarted = InventoryWorkflow::new(
        Arc::clone(&fx.db),
        Arc::new(ScanCache::new()),
        WorkflowSettings::default(),
    );
    let scan = ScanItemRequest {
        session_id: sid,
        item_code: "A-002".to_string(),
        state_id: fx.ok_state,
    };

    assert_eq!(
        code_of(restarted.scan(scan.clone()).await),
        ErrorCode::ScanDataLost
    );
    assert_eq!(
        code_of(
            restarted
                .finish(FinishCountRequest {
                    session_id: sid,
                    observations: String::new(),
                })
                .await
        ),
        ErrorCode::ScanDataLost
    );

    let recovered = restarted.recover(sid).await.unwrap();
    assert!(recovered.reopened);
    assert!(!restarted.recover(sid).await.unwrap().reopened);

    restarted.scan(scan).await.unwrap();
    assert_eq!(restarted.cache().len(sid).await, 1);
}

#[tokio::test]
async fn test_lost_scans_block_approval_but_not_rejection() {
    let fx = fixture().await;
    let sid = fx.start(fx.zone_a.id).await.unwrap().session_id;
    fx.finish(sid).await.unwrap();

    let restarted = InventoryWorkflow::new(
        Arc::clone(&fx.db),
        Arc::new(ScanCache::new()),
        WorkflowSettings::default(),
    );

    assert_eq!(code_of(restarted.compare(sid).await), ErrorCode::ScanDataLost);
    assert_eq!(
        code_of(restarted.decide(fx.decision(sid, true)).await),
        ErrorCode::ScanDataLost
    );

    restarted.decide(fx.decision(sid, false)).await.unwrap();
    assert_eq!(fx.zone_state(fx.zone_a.id).await, ZoneState::Available);
}

#[tokio::test]
async fn test_recover_requires_counting_zone() {
    let fx = fixture().await;
    let sid = fx.start(fx.zone_a.id).await.unwrap().session_id;
    fx.finish(sid).await.unwrap();

    assert_eq!(code_of(fx.workflow.recover(sid).await), ErrorCode::InvalidState);
    assert_eq!(code_of(fx.workflow.recover(31337).await), ErrorCode::NotFound);
}

// =============================================================================
// Superseded Sessions
// =============================================================================

/// Decides `old` (rejected), then starts and scans a newer session on the
/// same zone. Returns (old, new).
async fn superseded_pair(fx: &Fixture) -> (SessionId, SessionId) {
    let old = fx.start(fx.zone_a.id).await.unwrap().session_id;
    fx.scan(old, "A-001", fx.ok_state).await.unwrap();
    fx.finish(old).await.unwrap();
    fx.workflow.decide(fx.decision(old, false)).await.unwrap();

    let new = fx.start(fx.zone_a.id).await.unwrap().session_id;
    fx.scan(new, "A-001", fx.ok_state).await.unwrap();
    (old, new)
}

#[tokio::test]
async fn test_superseded_session_cannot_be_recovered() {
    let fx = fixture().await;
    let (old, new) = superseded_pair(&fx).await;

    assert_eq!(code_of(fx.workflow.recover(old).await), ErrorCode::InvalidState);
    assert!(!fx.workflow.cache().is_open(old));

    // The live session still counts
    fx.scan(new, "A-002", fx.ok_state).await.unwrap();
    assert_eq!(fx.workflow.cache().len(new).await, 2);
}

#[tokio::test]
async fn test_superseded_session_cannot_scan() {
    let fx = fixture().await;
    let (old, new) = superseded_pair(&fx).await;

    assert_eq!(
        code_of(fx.scan(old, "A-002", fx.ok_state).await),
        ErrorCode::InvalidState
    );
    assert_eq!(fx.workflow.cache().len(new).await, 1);
}

#[tokio::test]
async fn test_superseded_session_cannot_finish() {
    let fx = fixture().await;
    let (old, new) = superseded_pair(&fx).await;
    let log_before = fx
        .db
        .sessions()
        .get_with_zone(old)
        .await
        .unwrap()
        .unwrap()
        .session
        .observations;

    assert_eq!(code_of(fx.finish(old).await), ErrorCode::InvalidState);

    // Zone stays with the live count and the closed log is untouched
    assert_eq!(fx.zone_state(fx.zone_a.id).await, ZoneState::InInventory);
    let stale = fx.db.sessions().get_with_zone(old).await.unwrap().unwrap();
    assert_eq!(stale.session.observations, log_before);
    fx.scan(new, "A-002", fx.ok_state).await.unwrap();
}

#[tokio::test]
async fn test_superseded_session_cannot_compare_or_decide() {
    let fx = fixture().await;
    let (old, new) = superseded_pair(&fx).await;
    fx.finish(new).await.unwrap();

    assert_eq!(code_of(fx.workflow.compare(old).await), ErrorCode::InvalidState);
    assert_eq!(
        code_of(fx.workflow.decide(fx.decision(old, true)).await),
        ErrorCode::Conflict
    );

    let report = fx.workflow.compare(new).await.unwrap();
    assert_eq!(report.scanned_count, 1);
    let pending = fx.workflow.pending(fx.branch_id).await.unwrap();
    let ids: Vec<SessionId> = pending.iter().map(|s| s.session.id).collect();
    assert_eq!(ids, vec![new]);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_scans_yield_one_success() {
    let fx = fixture().await;
    let sid = fx.start(fx.zone_a.id).await.unwrap().session_id;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let workflow = fx.workflow.clone();
        let state_id = fx.ok_state;
        handles.push(tokio::spawn(async move {
            workflow
                .scan(ScanItemRequest {
                    session_id: sid,
                    item_code: "A-001".to_string(),
                    state_id,
                })
                .await
        }));
    }

    let mut ok = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(e) if e.code == ErrorCode::Conflict => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(ok, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(fx.workflow.cache().len(sid).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_starts_admit_one_session() {
    let fx = fixture().await;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let workflow = fx.workflow.clone();
        let request = StartCountRequest {
            zone_id: fx.zone_a.id,
            group_id: fx.group_id,
            observations: None,
            user_id: fx.manager_id,
        };
        handles.push(tokio::spawn(async move { workflow.start(request).await }));
    }

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(e) => assert_eq!(e.code, ErrorCode::InvalidState),
        }
    }

    assert_eq!(ok, 1);
    let sessions = fx.db.sessions().list_by_branch(fx.branch_id).await.unwrap();
    assert_eq!(sessions.len(), 1);
}
