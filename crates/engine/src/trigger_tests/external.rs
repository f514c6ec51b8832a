// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn job(pipeline_id: &str, name: &str) -> JobRef {
    JobRef::internal(&PipelineId::new(pipeline_id), name)
}

#[tokio::test]
async fn external_successor_gets_a_new_event() {
    let ctx = setup();
    let upstream = ctx.pipeline("123", &[("~commit", "A"), ("A", "sd@456:B")], &[]);
    let downstream = ctx.pipeline("456", &[("~sd@123:A", "B")], &[]);
    let event = ctx.event(&upstream, "e1");
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);

    let results = next(&ctx, &upstream, "A", &a1).await;

    let TriggerOutcome::EventCreated { event: opened, build } = outcome(&results, "sd@456:B")
    else {
        panic!("no event opened");
    };
    assert_eq!(opened.pipeline_id, downstream.id);
    assert_eq!(opened.start_from, "B");
    assert_eq!(opened.cause_message, "Triggered by sd@123:A");
    assert_eq!(opened.sha, "sha-456");
    assert_eq!(opened.username, "admin");
    assert_eq!(opened.parent_build_id, Some(a1.id.clone()));
    assert_eq!(opened.parent_builds, recorded("123", "e1", "A", "a1"));
    assert_eq!(opened.workflow_graph, downstream.workflow_graph);

    let build = build.as_ref().unwrap();
    assert_eq!(build.event_id, opened.id);
    assert_eq!(build.job_id, job_id("456", "B"));
    assert_eq!(build.status, BuildStatus::Queued);
    assert_eq!(build.parent_builds, recorded("123", "e1", "A", "a1"));
    assert_eq!(ctx.store.started(), vec![build.id.clone()]);
}

#[tokio::test]
async fn failed_build_opens_no_event() {
    let ctx = setup();
    let upstream = ctx.pipeline("123", &[("~commit", "A"), ("A", "sd@456:B")], &[]);
    ctx.pipeline("456", &[("~sd@123:A", "B")], &[]);
    let event = ctx.event(&upstream, "e1");
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Aborted);

    let results = next(&ctx, &upstream, "A", &a1).await;

    assert_eq!(outcome(&results, "sd@456:B"), &TriggerOutcome::Skipped);
    assert!(ctx.events("456").is_empty());
}

/// Pipeline 2's C joins pipeline 1's A with its own D.
fn remote_join(ctx: &TestContext) -> (Pipeline, Pipeline, Event) {
    let upstream = ctx.pipeline("1", &[("~commit", "A")], &[("A", "sd@2:C")]);
    let downstream = ctx.pipeline("2", &[("~commit", "D")], &[("sd@1:A", "C"), ("D", "C")]);
    let event = ctx.event(&upstream, "e1");
    (upstream, downstream, event)
}

#[tokio::test]
async fn remote_join_waits_in_a_new_event() {
    let ctx = setup();
    let (upstream, _, event) = remote_join(&ctx);
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);

    let results = next(&ctx, &upstream, "A", &a1).await;

    let TriggerOutcome::Waiting(build) = outcome(&results, "sd@2:C") else {
        panic!("C not waiting");
    };
    let opened = ctx.events("2");
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].start_from, "C");
    assert_eq!(opened[0].parent_builds, recorded("1", "e1", "A", "a1"));
    assert_eq!(build.event_id, opened[0].id);
    assert_eq!(build.status, BuildStatus::Created);
    assert_eq!(build.parent_builds.member_build(&job("1", "A")), Some(&a1.id));
    assert_eq!(build.parent_builds.member_build(&job("2", "D")), None);
}

#[tokio::test]
async fn local_member_completes_remote_join() {
    let ctx = setup();
    let (upstream, downstream, event) = remote_join(&ctx);
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);
    let waiting = next(&ctx, &upstream, "A", &a1).await;
    let target = outcome(&waiting, "sd@2:C").build().cloned().unwrap();
    let remote = ctx.events("2").remove(0);
    let d1 = ctx.build(&remote, "D", "d1", BuildStatus::Success);

    let results = next(&ctx, &downstream, "D", &d1).await;

    let TriggerOutcome::Started(build) = outcome(&results, "C") else {
        panic!("C not started");
    };
    assert_eq!(build.id, target.id);
    assert_eq!(build.parent_build_id, vec![a1.id.clone(), d1.id.clone()]);
    assert_eq!(build.parent_builds.member_build(&job("1", "A")), Some(&a1.id));
    assert_eq!(build.parent_builds.member_build(&job("2", "D")), Some(&d1.id));
}

#[tokio::test]
async fn failed_build_without_remote_event_is_skipped() {
    let ctx = setup();
    let (upstream, _, event) = remote_join(&ctx);
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Failure);

    let results = next(&ctx, &upstream, "A", &a1).await;

    assert_eq!(outcome(&results, "sd@2:C"), &TriggerOutcome::Skipped);
    assert!(ctx.events("2").is_empty());
}

#[tokio::test]
async fn without_external_join_target_starts_in_fresh_event() {
    let ctx = setup();
    let (upstream, _, event) = remote_join(&ctx);
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);

    let request = ctx.request(&upstream, "A", &a1).external_join(false);
    let results = ctx.engine.trigger_next_jobs(&request).await.unwrap();

    let TriggerOutcome::EventCreated { build: Some(build), .. } = outcome(&results, "sd@2:C")
    else {
        panic!("no build in a fresh event");
    };
    assert_eq!(build.status, BuildStatus::Queued);
    assert_eq!(ctx.events("2").len(), 1);
}

#[tokio::test]
async fn second_upstream_member_reuses_triggered_event() {
    let ctx = setup();
    let upstream = ctx.pipeline(
        "1",
        &[("~commit", "A"), ("~commit", "B")],
        &[("A", "sd@2:C"), ("B", "sd@2:C")],
    );
    ctx.pipeline("2", &[], &[("sd@1:A", "C"), ("sd@1:B", "C")]);
    let event = ctx.event(&upstream, "e1");
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);
    let b1 = ctx.build(&event, "B", "b1", BuildStatus::Running);

    let first = next(&ctx, &upstream, "A", &a1).await;
    let TriggerOutcome::Waiting(target) = outcome(&first, "sd@2:C") else {
        panic!("C not waiting");
    };
    // B's build was found through the upstream event
    assert_eq!(target.parent_builds.member_build(&job("1", "B")), Some(&b1.id));

    let b1 = ctx.store.set_build_status(&b1.id, BuildStatus::Success).unwrap();
    let second = next(&ctx, &upstream, "B", &b1).await;

    let TriggerOutcome::Started(build) = outcome(&second, "sd@2:C") else {
        panic!("C not started");
    };
    assert_eq!(build.id, target.id);
    assert_eq!(ctx.events("2").len(), 1);
}

#[tokio::test]
async fn join_runs_in_event_named_by_provenance() {
    let ctx = setup();
    let upstream = ctx.pipeline("1", &[("~sd@2:D", "A")], &[("A", "sd@2:C")]);
    let downstream = ctx.pipeline(
        "2",
        &[("~commit", "D"), ("D", "sd@1:A")],
        &[("sd@1:A", "C"), ("D", "C")],
    );
    let e2 = ctx.event(&downstream, "e2");
    ctx.build(&e2, "D", "d1", BuildStatus::Success);
    let e1 = ctx.event(&upstream, "e1");
    let mut a1 = ctx.build(&e1, "A", "a1", BuildStatus::Success);
    a1.parent_builds = recorded("2", "e2", "D", "d1");
    ctx.store.insert_build(a1.clone());

    let results = next(&ctx, &upstream, "A", &a1).await;

    let TriggerOutcome::Started(build) = outcome(&results, "sd@2:C") else {
        panic!("C not started");
    };
    assert_eq!(build.event_id, e2.id);
    assert_eq!(ctx.events("2"), vec![e2]);
}

#[tokio::test]
async fn plain_edge_into_remote_join_waits_for_its_members() {
    let ctx = setup();
    let upstream = ctx.pipeline("1", &[("~sd@2:X", "A"), ("A", "sd@2:C")], &[]);
    let downstream = ctx.pipeline(
        "2",
        &[("~commit", "X"), ("~commit", "Y"), ("X", "sd@1:A")],
        &[("X", "C"), ("Y", "C")],
    );
    let e2 = ctx.event(&downstream, "e2");
    ctx.build(&e2, "X", "x1", BuildStatus::Running);
    let e1 = ctx.event(&upstream, "e1");
    let mut a1 = ctx.build(&e1, "A", "a1", BuildStatus::Success);
    a1.parent_builds = recorded("2", "e2", "X", "x1");
    ctx.store.insert_build(a1.clone());

    let results = next(&ctx, &upstream, "A", &a1).await;

    let TriggerOutcome::Waiting(c1) = outcome(&results, "sd@2:C") else {
        panic!("C did not wait for its join");
    };
    assert_eq!(c1.event_id, e2.id);
    assert_eq!(c1.status, BuildStatus::Created);
    assert_eq!(c1.parent_build_id, vec![a1.id.clone()]);
    assert_eq!(c1.parent_builds.member_build(&job("2", "X")), Some(&BuildId::new("x1")));
    assert_eq!(c1.parent_builds.member_build(&job("2", "Y")), None);
    assert!(ctx.store.started().is_empty());
    assert_eq!(ctx.events("2"), vec![e2.clone()]);

    ctx.store.set_build_status(&BuildId::new("x1"), BuildStatus::Success).unwrap();
    let y1 = ctx.build(&e2, "Y", "y1", BuildStatus::Success);
    let results = next(&ctx, &downstream, "Y", &y1).await;

    let TriggerOutcome::Started(started) = outcome(&results, "C") else {
        panic!("C not started once its join finished");
    };
    assert_eq!(started.id, c1.id);
    assert_eq!(ctx.store.started(), vec![c1.id.clone()]);
}

#[tokio::test]
async fn downstream_result_returns_to_originating_event() {
    let ctx = setup();
    let upstream = ctx.pipeline("1", &[("~commit", "A"), ("~sd@2:C", "Z")], &[("A", "sd@2:C")]);
    let downstream = ctx.pipeline("2", &[("C", "sd@1:Z")], &[("sd@1:A", "C")]);
    let e1 = ctx.event(&upstream, "e1");
    let a1 = ctx.build(&e1, "A", "a1", BuildStatus::Success);

    let first = next(&ctx, &upstream, "A", &a1).await;
    let TriggerOutcome::Started(c1) = outcome(&first, "sd@2:C") else {
        panic!("C not started");
    };
    let c1 = ctx.store.set_build_status(&c1.id, BuildStatus::Success).unwrap();

    let results = next(&ctx, &downstream, "C", &c1).await;

    let TriggerOutcome::Started(z) = outcome(&results, "sd@1:Z") else {
        panic!("Z not started");
    };
    assert_eq!(z.event_id, e1.id);
    assert_eq!(z.job_id, job_id("1", "Z"));
    assert_eq!(z.parent_build_id, vec![c1.id.clone()]);
    assert_eq!(z.parent_builds.member_build(&job("2", "C")), Some(&c1.id));
    assert_eq!(z.parent_builds.event_id(&PipelineId::new("2")), Some(&c1.event_id));
    assert_eq!(ctx.events("1"), vec![e1]);
}
