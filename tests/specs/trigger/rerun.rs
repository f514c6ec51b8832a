//! Partial re-runs.
//!
//! A re-run restarting at some job counts the parent event's builds that are
//! not downstream of that job as already finished.

use crate::prelude::*;
use std::collections::BTreeSet;

fn ids(builds: &[Build]) -> BTreeSet<String> {
    builds.iter().map(|b| b.id.to_string()).collect()
}

#[tokio::test]
async fn rerun_keeps_upstream_and_sibling_builds() {
    let world = Fixture::new()
        .pipeline("1", &["~commit -> A", "A -> X", "A -> S", "X -> C", "X -> D"], &[])
        .event("e1", "1")
        .build("a1", "e1", "A", "SUCCESS")
        .build("x1", "e1", "X", "SUCCESS")
        .build("s1", "e1", "S", "SUCCESS")
        .build("c1", "e1", "C", "SUCCESS")
        .build("d1", "e1", "D", "FAILURE")
        .rerun("e2", "1", "e1", "X")
        .build("x2", "e2", "X", "RUNNING")
        .load();
    let rerun = world.events_of("1").into_iter().find(|e| e.id == "e2").unwrap();

    let visible = world.engine.visible_builds(&rerun).await.unwrap();
    let expected: BTreeSet<String> = ["x2", "a1", "s1"].map(String::from).into();
    assert_eq!(ids(&visible), expected);

    let results = world.finish("x2", BuildStatus::Success).await;
    for name in ["C", "D"] {
        let TriggerOutcome::Started(build) = outcome(&results, name) else {
            panic!("{name} was not re-run");
        };
        assert_eq!(build.event_id, EventId::new("e2"));
    }
    assert_eq!(world.build_of("e1", "D").map(|b| b.status), Some(BuildStatus::Failure));
}

#[tokio::test]
async fn rerun_join_counts_parent_sibling() {
    let world = Fixture::new()
        .pipeline("1", &["~commit -> A", "A -> X", "A -> S"], &["X -> J", "S -> J"])
        .event("e1", "1")
        .build("a1", "e1", "A", "SUCCESS")
        .build("x1", "e1", "X", "FAILURE")
        .build("s1", "e1", "S", "SUCCESS")
        .rerun("e2", "1", "e1", "X")
        .build("x2", "e2", "X", "RUNNING")
        .load();

    let results = world.finish("x2", BuildStatus::Success).await;

    let TriggerOutcome::Started(j) = outcome(&results, "J") else {
        panic!("J was not started");
    };
    assert_eq!(j.event_id, EventId::new("e2"));
    assert_eq!(j.parent_builds.member_build(&job("1", "S")), Some(&BuildId::new("s1")));
    assert_eq!(j.parent_builds.member_build(&job("1", "X")), Some(&BuildId::new("x2")));
}

#[tokio::test]
async fn rerun_resolves_jobs_of_nodes_without_ids() {
    let world = Fixture::new()
        .pipeline("1", &["~commit -> A", "A -> X", "X -> C"], &[])
        .without_node_ids("1")
        .event("e1", "1")
        .build("a1", "e1", "A", "SUCCESS")
        .build("x1", "e1", "X", "SUCCESS")
        .build("c1", "e1", "C", "SUCCESS")
        .rerun("e2", "1", "e1", "X")
        .load();
    let rerun = world.events_of("1").into_iter().find(|e| e.id == "e2").unwrap();

    let visible = world.engine.visible_builds(&rerun).await.unwrap();
    assert_eq!(ids(&visible), BTreeSet::from(["a1".to_string()]));
}

#[tokio::test]
async fn pr_rerun_drops_pr_builds_downstream_of_start() {
    let world = Fixture::new()
        .pipeline("1", &["~pr -> A", "A -> X", "X -> C"], &[])
        .chain_pr("1")
        .job("1", "PR-7:A")
        .job("1", "PR-7:X")
        .job("1", "PR-7:C")
        .event("e1", "1")
        .build("a1", "e1", "PR-7:A", "SUCCESS")
        .build("x1", "e1", "PR-7:X", "SUCCESS")
        .build("c1", "e1", "PR-7:C", "SUCCESS")
        .rerun("e2", "1", "e1", "PR-7:X")
        .load();
    let rerun = world.events_of("1").into_iter().find(|e| e.id == "e2").unwrap();

    let visible = world.engine.visible_builds(&rerun).await.unwrap();
    assert_eq!(ids(&visible), BTreeSet::from(["a1".to_string()]));
}
