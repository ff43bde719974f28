//! Audit store tests — run, event log and flag persistence.

use anomaly_core::{
    config::NetworkConfig,
    detector::SampleStats,
    event::{EventLogEntry, FlaggedPurchase, PurchaseAmount},
    store::AuditStore,
};

fn store_with_run(run_id: &str) -> AuditStore {
    let store = AuditStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
        .insert_run(run_id, &NetworkConfig { degrees: 3, window: 50 }, "2026-01-01T00:00:00Z")
        .expect("insert run");
    store
}

#[test]
fn run_config_is_recorded() {
    let store = store_with_run("cfg-run");
    let cfg = store.run_config("cfg-run").unwrap().expect("run exists");
    assert_eq!(cfg, NetworkConfig { degrees: 3, window: 50 });
    assert!(store.run_config("missing").unwrap().is_none());
}

#[test]
fn duplicate_run_id_is_rejected() {
    let store = store_with_run("dup-run");
    let again = store.insert_run("dup-run", &NetworkConfig::default_test(), "later");
    assert!(again.is_err());
}

#[test]
fn events_are_kept_in_append_order_per_phase() {
    let store = store_with_run("log-run");
    for (phase, line, kind) in [("batch", 2, "befriend"), ("batch", 3, "purchase"), ("stream", 1, "purchase")] {
        store
            .append_event(&EventLogEntry {
                id:         None,
                run_id:     "log-run".into(),
                phase:      phase.into(),
                line,
                event_type: kind.into(),
                payload:    format!("{{\"event_type\":\"{kind}\"}}"),
            })
            .unwrap();
    }

    let batch = store.events_for_run("log-run", "batch").unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].event_type, "befriend");
    assert_eq!(batch[1].line, 3);
    assert!(batch.iter().all(|e| e.id.is_some()));
    assert_eq!(store.event_count("log-run", "stream").unwrap(), 1);
    assert_eq!(store.event_count("other-run", "stream").unwrap(), 0);
}

#[test]
fn flags_round_trip_in_detection_order() {
    let store = store_with_run("flag-run");
    let stats = SampleStats { mean: 25.0, sd: 5.0 };
    let first = FlaggedPurchase::new("2017-06-13 11:40:01", "A", &PurchaseAmount::new(100.0), &stats);
    let second = FlaggedPurchase::new("2017-06-13 11:40:09", "C", &PurchaseAmount::new(77.5), &stats);

    store.insert_flag("flag-run", 2, &first).unwrap();
    store.insert_flag("flag-run", 9, &second).unwrap();

    assert_eq!(store.flags_for_run("flag-run").unwrap(), vec![first, second]);
    assert!(store.flags_for_run("other-run").unwrap().is_empty());
}

#[test]
fn event_for_unknown_run_violates_foreign_key() {
    let store = store_with_run("fk-run");
    let result = store.append_event(&EventLogEntry {
        id:         None,
        run_id:     "no-such-run".into(),
        phase:      "batch".into(),
        line:       1,
        event_type: "purchase".into(),
        payload:    "{}".into(),
    });
    assert!(result.is_err());
}
