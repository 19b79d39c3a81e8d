//! # Reconciliation
//!
//! Compares a session's scans with the zone's expected items.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Reconciliation                                      │
//! │                                                                         │
//! │   E = expected items (by id)        S = scans (by id, last wins)        │
//! │                                                                         │
//! │        ┌───────────────┬───────────────┬───────────────┐               │
//! │        │   E only      │    E ∩ S      │    S only     │               │
//! │        │   MISSING     │   MATCHED     │  UNEXPECTED   │               │
//! │        └───────────────┴───────┬───────┴───────────────┘               │
//! │                                │                                        │
//! │                 scanned state ≠ expected state?                         │
//! │                                │                                        │
//! │                                ▼                                        │
//! │                         STATE MISMATCH                                  │
//! │                                                                         │
//! │   |missing|    + |matched| = |E|                                        │
//! │   |unexpected| + |matched| = |S|                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both inputs are keyed in `BTreeMap`s, so every list in the report is in
//! ascending item id order and the same inputs always produce the same report.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{
    Item, ItemId, ItemState, ItemStateId, ScannedItem, SessionId, SessionWithZone, ZoneId,
};

// =============================================================================
// State Catalog
// =============================================================================

/// Labels of the known item states.
#[derive(Debug, Clone, Default)]
pub struct StateCatalog {
    labels: HashMap<ItemStateId, String>,
}

impl StateCatalog {
    pub fn new(states: impl IntoIterator<Item = ItemState>) -> Self {
        states.into_iter().collect()
    }

    /// Returns true if the state id is in the catalogue.
    pub fn contains(&self, id: ItemStateId) -> bool {
        self.labels.contains_key(&id)
    }

    /// Returns the label of a state, or a placeholder for unknown ids.
    pub fn label(&self, id: ItemStateId) -> String {
        self.labels
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("state #{id}"))
    }
}

impl FromIterator<ItemState> for StateCatalog {
    fn from_iter<I: IntoIterator<Item = ItemState>>(iter: I) -> Self {
        StateCatalog {
            labels: iter
                .into_iter()
                .map(|state| (state.id, state.label))
                .collect(),
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// An item named in a report list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportItem {
    pub item_id: ItemId,
    pub code: String,
    pub name: String,
}

/// A matched item whose scanned state differs from the expected one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StateMismatch {
    pub item_id: ItemId,
    pub code: String,
    pub name: String,
    pub expected_state_id: ItemStateId,
    pub expected_state: String,
    pub scanned_state_id: ItemStateId,
    pub scanned_state: String,
}

/// Outcome of comparing a session's scans with its zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ComparisonReport {
    pub session_id: SessionId,
    pub zone_id: ZoneId,
    /// |E|
    pub expected_count: usize,
    /// |S| after keying by item id.
    pub scanned_count: usize,
    /// |E ∩ S|
    pub matched_count: usize,
    pub missing: Vec<ReportItem>,
    pub unexpected: Vec<ReportItem>,
    pub state_mismatches: Vec<StateMismatch>,
    /// Human-readable counts of each category.
    pub summary: String,
}

impl ComparisonReport {
    /// True when every expected item was scanned, nothing else was, and
    /// every state matched.
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty() && self.state_mismatches.is_empty()
    }
}

// =============================================================================
// Reconcile
// =============================================================================

/// Reconciles a session's scans with the expected items of its zone.
///
/// `expected` is the zone's item set as the store knows it now; `scans` is
/// the cache snapshot. Runs in O((|E| + |S|) log n) with no I/O.
pub fn reconcile(
    session: &SessionWithZone,
    expected: &[Item],
    scans: &[ScannedItem],
    states: &StateCatalog,
) -> ComparisonReport {
    let expected: BTreeMap<ItemId, &Item> = expected.iter().map(|item| (item.id, item)).collect();
    let scanned: BTreeMap<ItemId, &ScannedItem> =
        scans.iter().map(|scan| (scan.item_id, scan)).collect();

    let mut missing = Vec::new();
    let mut state_mismatches = Vec::new();
    let mut matched_count = 0;

    for (id, item) in &expected {
        match scanned.get(id) {
            None => missing.push(ReportItem {
                item_id: item.id,
                code: item.code.clone(),
                name: item.name.clone(),
            }),
            Some(scan) => {
                matched_count += 1;
                if scan.state_id != item.state_id {
                    state_mismatches.push(StateMismatch {
                        item_id: item.id,
                        code: item.code.clone(),
                        name: item.name.clone(),
                        expected_state_id: item.state_id,
                        expected_state: states.label(item.state_id),
                        scanned_state_id: scan.state_id,
                        scanned_state: states.label(scan.state_id),
                    });
                }
            }
        }
    }

    let unexpected: Vec<ReportItem> = scanned
        .iter()
        .filter(|(id, _)| !expected.contains_key(id))
        .map(|(_, scan)| ReportItem {
            item_id: scan.item_id,
            code: scan.item_code.clone(),
            name: scan.item_name.clone(),
        })
        .collect();

    let summary = format!(
        "{} expected, {} scanned: {} missing, {} unexpected, {} state mismatches",
        expected.len(),
        scanned.len(),
        missing.len(),
        unexpected.len(),
        state_mismatches.len()
    );

    ComparisonReport {
        session_id: session.session.id,
        zone_id: session.zone.id,
        expected_count: expected.len(),
        scanned_count: scanned.len(),
        matched_count,
        missing,
        unexpected,
        state_mismatches,
        summary,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ScanClassification, Session, Zone, ZoneState};
    use chrono::Utc;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    const OK: ItemStateId = 1;
    const DAMAGED: ItemStateId = 2;

    fn catalog() -> StateCatalog {
        StateCatalog::new(vec![
            ItemState {
                id: OK,
                label: "ok".to_string(),
            },
            ItemState {
                id: DAMAGED,
                label: "damaged".to_string(),
            },
        ])
    }

    fn session() -> SessionWithZone {
        SessionWithZone {
            session: Session {
                id: 11,
                zone_id: 1,
                group_id: 1,
                started_by: 1,
                started_at: Utc::now(),
                observations: String::new(),
            },
            zone: Zone {
                id: 1,
                name: "Warehouse A".to_string(),
                branch_id: 1,
                area_manager_id: 1,
                state: ZoneState::InVerification,
            },
            verification_id: None,
            current_session_id: 11,
        }
    }

    fn item(id: ItemId, state_id: ItemStateId) -> Item {
        Item {
            id,
            code: format!("IT-{id}"),
            name: format!("Item {id}"),
            zone_id: 1,
            state_id,
        }
    }

    fn scan(item_id: ItemId, state_id: ItemStateId) -> ScannedItem {
        ScannedItem {
            item_id,
            item_code: format!("IT-{item_id}"),
            item_name: format!("Item {item_id}"),
            state_id,
            classification: ScanClassification::Correct,
            scanned_at: Utc::now(),
        }
    }

    #[test]
    fn test_missing_item_reported() {
        let expected = vec![item(1, OK), item(2, OK)];
        let scans = vec![scan(1, OK)];

        let report = reconcile(&session(), &expected, &scans, &catalog());

        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.missing[0].item_id, 2);
        assert_eq!(report.missing[0].code, "IT-2");
        assert!(report.unexpected.is_empty());
        assert!(report.state_mismatches.is_empty());
        assert_eq!(report.matched_count, 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_unexpected_item_uses_scan_snapshot() {
        let expected = vec![item(1, OK)];
        let mut foreign = scan(40, OK);
        foreign.item_code = "DESK-40".to_string();
        foreign.item_name = "Desk from zone B".to_string();
        foreign.classification = ScanClassification::WrongZone;
        let scans = vec![scan(1, OK), foreign];

        let report = reconcile(&session(), &expected, &scans, &catalog());

        assert_eq!(
            report.unexpected,
            vec![ReportItem {
                item_id: 40,
                code: "DESK-40".to_string(),
                name: "Desk from zone B".to_string(),
            }]
        );
    }

    #[test]
    fn test_state_mismatch_carries_labels() {
        let expected = vec![item(1, OK)];
        let scans = vec![scan(1, DAMAGED)];

        let report = reconcile(&session(), &expected, &scans, &catalog());

        assert_eq!(report.state_mismatches.len(), 1);
        let mismatch = &report.state_mismatches[0];
        assert_eq!(mismatch.expected_state, "ok");
        assert_eq!(mismatch.scanned_state, "damaged");
        assert_eq!(
            report.summary,
            "1 expected, 1 scanned: 0 missing, 0 unexpected, 1 state mismatches"
        );
    }

    #[test]
    fn test_unknown_state_label_placeholder() {
        assert_eq!(catalog().label(99), "state #99");
        assert!(catalog().contains(OK));
        assert!(!catalog().contains(99));
    }

    #[test]
    fn test_last_scan_wins_when_keyed() {
        let expected = vec![item(1, OK)];
        let scans = vec![scan(1, DAMAGED), scan(1, OK)];

        let report = reconcile(&session(), &expected, &scans, &catalog());

        assert_eq!(report.scanned_count, 1);
        assert!(report.is_clean());
    }

    #[test]
    fn test_lists_sorted_by_item_id() {
        let expected = vec![item(9, OK), item(3, OK), item(5, OK)];
        let scans = vec![scan(30, OK), scan(10, OK)];

        let report = reconcile(&session(), &expected, &scans, &catalog());

        let missing: Vec<ItemId> = report.missing.iter().map(|i| i.item_id).collect();
        let unexpected: Vec<ItemId> = report.unexpected.iter().map(|i| i.item_id).collect();
        assert_eq!(missing, vec![3, 5, 9]);
        assert_eq!(unexpected, vec![10, 30]);
    }

    #[test]
    fn test_report_serializes() {
        let report = reconcile(&session(), &[item(1, OK)], &[], &catalog());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["missing"][0]["code"], "IT-1");
        assert_eq!(json["expected_count"], 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: every expected id is missing or matched, every scanned id
        /// is unexpected or matched, and mismatches are a subset of matches.
        #[test]
        fn reconciliation_is_complete(
            expected in prop::collection::btree_map(1i64..200, OK..=DAMAGED, 0..40),
            scanned in prop::collection::vec((1i64..200, OK..=DAMAGED), 0..60),
        ) {
            let expected_items: Vec<Item> =
                expected.iter().map(|(id, state)| item(*id, *state)).collect();
            let scans: Vec<ScannedItem> =
                scanned.iter().map(|(id, state)| scan(*id, *state)).collect();
            let scanned_ids: BTreeSet<ItemId> = scanned.iter().map(|(id, _)| *id).collect();

            let report = reconcile(&session(), &expected_items, &scans, &catalog());

            prop_assert_eq!(report.expected_count, expected.len());
            prop_assert_eq!(report.scanned_count, scanned_ids.len());
            prop_assert_eq!(report.missing.len() + report.matched_count, expected.len());
            prop_assert_eq!(report.unexpected.len() + report.matched_count, scanned_ids.len());
            prop_assert!(report.state_mismatches.len() <= report.matched_count);

            for mismatch in &report.state_mismatches {
                prop_assert!(expected.contains_key(&mismatch.item_id));
                prop_assert!(scanned_ids.contains(&mismatch.item_id));
            }

            let again = reconcile(&session(), &expected_items, &scans, &catalog());
            prop_assert_eq!(report, again);
        }
    }
}
