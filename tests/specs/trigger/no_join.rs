//! Successors with no join.
//!
//! A finished build creates and starts every plain successor at once.

use crate::prelude::*;

#[tokio::test]
async fn finished_job_starts_its_successor() {
    let world = Fixture::new()
        .pipeline("1", &["~commit -> D", "D -> A"], &[])
        .event("e1", "1")
        .build("d1", "e1", "D", "RUNNING")
        .load();

    let results = world.finish("d1", BuildStatus::Success).await;

    let TriggerOutcome::Started(a) = outcome(&results, "A") else {
        panic!("A was not started");
    };
    assert_eq!(a.status, BuildStatus::Queued);
    assert_eq!(a.event_id, EventId::new("e1"));
    assert_eq!(a.sha, "sha-1");
    assert_eq!(a.parent_build_id, vec![BuildId::new("d1")]);
    assert_eq!(world.started(), vec![a.id.clone()]);
}

#[tokio::test]
async fn failed_job_leaves_successors_alone() {
    let world = Fixture::new()
        .pipeline("1", &["~commit -> D", "D -> A"], &[])
        .event("e1", "1")
        .build("d1", "e1", "D", "RUNNING")
        .load();

    let results = world.finish("d1", BuildStatus::Failure).await;

    assert_eq!(outcome(&results, "A"), &TriggerOutcome::Skipped);
    assert_eq!(world.build_of("e1", "A"), None);
}

#[tokio::test]
async fn disabled_successor_gets_no_build() {
    let world = Fixture::new()
        .pipeline("1", &["~commit -> D", "D -> A", "D -> B"], &[])
        .disable("1", "A")
        .event("e1", "1")
        .build("d1", "e1", "D", "RUNNING")
        .load();

    let results = world.finish("d1", BuildStatus::Success).await;

    assert_eq!(outcome(&results, "A"), &TriggerOutcome::Skipped);
    assert_eq!(world.build_of("e1", "A"), None);
    assert!(matches!(outcome(&results, "B"), TriggerOutcome::Started(_)));
}

#[tokio::test]
async fn pr_chain_follows_pr_copies() {
    let world = Fixture::new()
        .pipeline("1", &["~pr -> A", "A -> B", "B -> C"], &[])
        .chain_pr("1")
        .job("1", "PR-2:A")
        .job("1", "PR-2:B")
        .job("1", "PR-2:C")
        .event("e1", "1")
        .build("p1", "e1", "PR-2:A", "RUNNING")
        .load();

    let first = world.finish("p1", BuildStatus::Success).await;
    let b = outcome(&first, "PR-2:B").build().cloned().unwrap();
    let second = world.finish(&b.id, BuildStatus::Success).await;

    assert!(matches!(outcome(&second, "PR-2:C"), TriggerOutcome::Started(_)));
    assert_eq!(world.build_of("e1", "B"), None);
}
