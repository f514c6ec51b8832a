//! Successors owned by other pipelines.
//!
//! A plain cross-pipeline successor opens a fresh event in its pipeline. A
//! cross-pipeline join is settled inside a single event of the target
//! pipeline, however many upstream members feed it.

use crate::prelude::*;

#[tokio::test]
async fn external_successor_opens_an_event() {
    let world = Fixture::new()
        .pipeline("1", &["~commit -> D", "D -> sd@123:A"], &[])
        .pipeline("123", &["~sd@1:D -> A"], &[])
        .event("e1", "1")
        .build("d1", "e1", "D", "RUNNING")
        .load();

    let results = world.finish("d1", BuildStatus::Success).await;

    let TriggerOutcome::EventCreated { event, build: Some(a) } = outcome(&results, "sd@123:A")
    else {
        panic!("no event opened for A");
    };
    assert_eq!(world.events_of("123"), vec![event.clone()]);
    assert_eq!(event.start_from, "A");
    assert_eq!(event.parent_build_id, Some(BuildId::new("d1")));
    assert_eq!(event.cause_message, "Triggered by sd@1:D");
    assert_eq!(event.sha, "sha-123");
    assert_eq!(a.event_id, event.id);
    assert_eq!(a.status, BuildStatus::Queued);
}

fn fan_in() -> Fixture {
    Fixture::new()
        .pipeline("1", &["~commit -> A", "~commit -> B"], &["A -> sd@2:C", "B -> sd@2:C"])
        .pipeline("2", &[], &["sd@1:A -> C", "sd@1:B -> C"])
        .event("e1", "1")
        .build("a1", "e1", "A", "RUNNING")
        .build("b1", "e1", "B", "RUNNING")
}

#[tokio::test]
async fn upstream_members_share_one_downstream_event() {
    let world = fan_in().load();

    let first = world.finish("a1", BuildStatus::Success).await;
    assert!(matches!(outcome(&first, "sd@2:C"), TriggerOutcome::Waiting(_)));
    let second = world.finish("b1", BuildStatus::Success).await;

    let TriggerOutcome::Started(c) = outcome(&second, "sd@2:C") else {
        panic!("C was not started");
    };
    let events = world.events_of("2");
    assert_eq!(events.len(), 1);
    assert_eq!(c.event_id, events[0].id);
    assert_eq!(c.parent_builds.member_build(&job("1", "A")), Some(&BuildId::new("a1")));
    assert_eq!(c.parent_builds.member_build(&job("1", "B")), Some(&BuildId::new("b1")));
}

#[tokio::test]
async fn upstream_failure_discards_downstream_join() {
    let world = fan_in().load();

    world.finish("a1", BuildStatus::Success).await;
    let results = world.finish("b1", BuildStatus::Failure).await;

    assert!(matches!(outcome(&results, "sd@2:C"), TriggerOutcome::Removed(_)));
    let events = world.events_of("2");
    assert_eq!(events.len(), 1);
    assert_eq!(world.build_of(&events[0].id, "C"), None);
}

#[tokio::test]
async fn without_external_join_each_member_opens_its_own_event() {
    let world = fan_in().load();

    world.finish_with("a1", BuildStatus::Success, false).await;
    world.finish_with("b1", BuildStatus::Success, false).await;

    let events = world.events_of("2");
    assert_eq!(events.len(), 2);
    for event in &events {
        let c = world.build_of(&event.id, "C").unwrap();
        assert_eq!(c.status, BuildStatus::Queued);
    }
}

#[tokio::test]
async fn downstream_result_flows_back_into_the_upstream_event() {
    let world = Fixture::new()
        .pipeline("1", &["~commit -> A", "~sd@2:C -> Z"], &["A -> sd@2:C"])
        .pipeline("2", &["C -> sd@1:Z"], &["sd@1:A -> C"])
        .event("e1", "1")
        .build("a1", "e1", "A", "RUNNING")
        .load();

    let first = world.finish("a1", BuildStatus::Success).await;
    let c = outcome(&first, "sd@2:C").build().cloned().unwrap();
    let second = world.finish(&c.id, BuildStatus::Success).await;

    let TriggerOutcome::Started(z) = outcome(&second, "sd@1:Z") else {
        panic!("Z was not started");
    };
    assert_eq!(z.event_id, EventId::new("e1"));
    assert_eq!(world.events_of("1").len(), 1);
    assert_eq!(world.build_of("e1", "Z").map(|b| b.id), Some(z.id.clone()));
}

#[tokio::test]
async fn plain_edge_into_a_join_waits_in_the_provenance_event() {
    let world = Fixture::new()
        .pipeline("1", &["~sd@2:X -> A", "A -> sd@2:C"], &[])
        .pipeline("2", &["~commit -> X", "~commit -> Y", "X -> sd@1:A"], &["X -> C", "Y -> C"])
        .event("e2", "2")
        .build("x1", "e2", "X", "SUCCESS")
        .event("e1", "1")
        .build("a1", "e1", "A", "RUNNING")
        .fed_by("a1", "e2", "X", "x1")
        .load();

    let results = world.finish("a1", BuildStatus::Success).await;

    let TriggerOutcome::Waiting(c) = outcome(&results, "sd@2:C") else {
        panic!("C did not wait for Y");
    };
    assert_eq!(c.event_id, EventId::new("e2"));
    assert!(world.started().is_empty());
    assert_eq!(world.events_of("2").len(), 1);
}
