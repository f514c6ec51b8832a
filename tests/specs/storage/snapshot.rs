//! Store snapshots.
//!
//! The engine keeps nothing between calls, so a join half settled before a
//! dump finishes normally after the store is reloaded from it.

use crate::prelude::*;

#[tokio::test]
async fn join_survives_a_store_reload() {
    let world = Fixture::new()
        .pipeline("1", &["~commit -> A", "~commit -> B"], &["A -> C", "B -> C"])
        .event("e1", "1")
        .build("a1", "e1", "A", "RUNNING")
        .build("b1", "e1", "B", "RUNNING")
        .load();
    world.finish("a1", BuildStatus::Success).await;

    let dumped = world.store.snapshot();
    let reloaded = Snapshot::from_json(&dumped.to_json().unwrap()).unwrap();
    similar_asserts::assert_eq!(reloaded, dumped);

    let world = World::from_snapshot(reloaded);
    let results = world.finish("b1", BuildStatus::Success).await;

    assert!(matches!(outcome(&results, "C"), TriggerOutcome::Started(_)));
}

#[test]
fn fixture_with_dangling_build_is_rejected() {
    let json = serde_json::json!({
        "builds": {
            "b1": {
                "id": "b1",
                "job_id": "1/A",
                "event_id": "e1",
                "sha": "sha-1",
                "status": "SUCCESS",
                "username": "admin",
                "scm_context": "github:github.com",
            }
        }
    });

    let err = Snapshot::from_json(&json.to_string()).unwrap_err();

    assert!(err.to_string().contains("b1"), "unexpected error: {err}");
}
