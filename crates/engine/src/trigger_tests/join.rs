// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

/// A and B both feed join target C.
fn diamond(ctx: &TestContext) -> (Pipeline, Event) {
    let pipeline =
        ctx.pipeline("1", &[("~commit", "A"), ("~commit", "B")], &[("A", "C"), ("B", "C")]);
    let event = ctx.event(&pipeline, "e1");
    (pipeline, event)
}

fn member(name: &str) -> JobRef {
    JobRef::internal(&PipelineId::new("1"), name)
}

#[tokio::test]
async fn first_member_creates_waiting_target() {
    let ctx = setup();
    let (pipeline, event) = diamond(&ctx);
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);

    let results = next(&ctx, &pipeline, "A", &a1).await;

    let TriggerOutcome::Waiting(build) = outcome(&results, "C") else {
        panic!("C not waiting");
    };
    assert_eq!(build.status, BuildStatus::Created);
    assert_eq!(build.parent_build_id, vec![a1.id.clone()]);
    assert_eq!(build.parent_builds.member_build(&member("A")), Some(&a1.id));
    assert_eq!(build.parent_builds.member_build(&member("B")), None);
    assert!(build.parent_builds.pipeline(&pipeline.id).unwrap().jobs.contains_key("B"));
    assert_eq!(ctx.find(&event, "C").as_ref(), Some(build));
    assert!(ctx.store.started().is_empty());
}

#[tokio::test]
async fn last_member_starts_target() {
    let ctx = setup();
    let (pipeline, event) = diamond(&ctx);
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);
    let b1 = ctx.build(&event, "B", "b1", BuildStatus::Running);
    let waiting = next(&ctx, &pipeline, "A", &a1).await;
    let target = outcome(&waiting, "C").build().cloned().unwrap();

    let b1 = ctx.store.set_build_status(&b1.id, BuildStatus::Success).unwrap();
    let results = next(&ctx, &pipeline, "B", &b1).await;

    let TriggerOutcome::Started(build) = outcome(&results, "C") else {
        panic!("C not started");
    };
    assert_eq!(build.id, target.id);
    assert_eq!(build.status, BuildStatus::Queued);
    assert_eq!(build.parent_build_id, vec![a1.id.clone(), b1.id.clone()]);
    assert_eq!(
        build.parent_builds,
        recorded("1", "e1", "A", "a1").merge(&recorded("1", "e1", "B", "b1"))
    );
    assert_eq!(ctx.store.started(), vec![target.id.clone()]);
}

#[tokio::test]
async fn unstable_member_does_not_block_join() {
    let ctx = setup();
    let (pipeline, event) = diamond(&ctx);
    ctx.build(&event, "A", "a1", BuildStatus::Unstable);
    let b1 = ctx.build(&event, "B", "b1", BuildStatus::Success);

    let results = next(&ctx, &pipeline, "B", &b1).await;

    assert!(matches!(outcome(&results, "C"), TriggerOutcome::Started(_)));
}

#[tokio::test]
async fn failed_member_removes_target_once_all_finish() {
    let ctx = setup();
    let (pipeline, event) = diamond(&ctx);
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);
    let b1 = ctx.build(&event, "B", "b1", BuildStatus::Running);
    let waiting = next(&ctx, &pipeline, "A", &a1).await;
    let target = outcome(&waiting, "C").build().cloned().unwrap();

    let b1 = ctx.store.set_build_status(&b1.id, BuildStatus::Failure).unwrap();
    let results = next(&ctx, &pipeline, "B", &b1).await;

    assert_eq!(outcome(&results, "C"), &TriggerOutcome::Removed(target.id));
    assert!(ctx.find(&event, "C").is_none());
    assert!(ctx.store.started().is_empty());
}

#[tokio::test]
async fn failed_first_member_creates_nothing() {
    let ctx = setup();
    let (pipeline, event) = diamond(&ctx);
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Failure);

    let results = next(&ctx, &pipeline, "A", &a1).await;

    assert_eq!(outcome(&results, "C"), &TriggerOutcome::Skipped);
    assert!(ctx.find(&event, "C").is_none());
}

#[tokio::test]
async fn earlier_failure_is_found_by_the_last_member() {
    let ctx = setup();
    let (pipeline, event) = diamond(&ctx);
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Failure);
    let b1 = ctx.build(&event, "B", "b1", BuildStatus::Success);
    assert_eq!(outcome(&next(&ctx, &pipeline, "A", &a1).await, "C"), &TriggerOutcome::Skipped);

    let results = next(&ctx, &pipeline, "B", &b1).await;

    assert!(matches!(outcome(&results, "C"), TriggerOutcome::Removed(_)));
    assert!(ctx.find(&event, "C").is_none());
}

#[tokio::test]
async fn member_that_never_reported_is_filled_in() {
    let ctx = setup();
    let (pipeline, event) = diamond(&ctx);
    let b1 = ctx.build(&event, "B", "b1", BuildStatus::Success);
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);

    let results = next(&ctx, &pipeline, "A", &a1).await;

    let TriggerOutcome::Started(build) = outcome(&results, "C") else {
        panic!("C not started");
    };
    assert_eq!(build.parent_builds.member_build(&member("B")), Some(&b1.id));
    // Filled members are recorded in provenance only
    assert_eq!(build.parent_build_id, vec![a1.id.clone()]);
}

/// A, B, and D all feed join target C.
fn fan_in(ctx: &TestContext) -> (Pipeline, Event) {
    let triggers = [("~commit", "A"), ("~commit", "B"), ("~commit", "D")];
    let pipeline = ctx.pipeline("1", &triggers, &[("A", "C"), ("B", "C"), ("D", "C")]);
    let event = ctx.event(&pipeline, "e1");
    (pipeline, event)
}

#[tokio::test]
async fn failure_waits_for_outstanding_members() {
    let ctx = setup();
    let (pipeline, event) = fan_in(&ctx);
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);
    ctx.build(&event, "B", "b1", BuildStatus::Running);
    let d1 = ctx.build(&event, "D", "d1", BuildStatus::Failure);
    next(&ctx, &pipeline, "A", &a1).await;

    let results = next(&ctx, &pipeline, "D", &d1).await;

    assert!(matches!(outcome(&results, "C"), TriggerOutcome::Waiting(_)));
    assert!(ctx.find(&event, "C").is_some());
}

#[tokio::test]
async fn fail_fast_removes_target_on_first_failure() {
    let ctx = setup();
    let (pipeline, event) = fan_in(&ctx);
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);
    ctx.build(&event, "B", "b1", BuildStatus::Running);
    let d1 = ctx.build(&event, "D", "d1", BuildStatus::Failure);
    next(&ctx, &pipeline, "A", &a1).await;

    let request = ctx.request(&pipeline, "D", &d1).external_join(false);
    let results = ctx.engine.trigger_next_jobs(&request).await.unwrap();

    assert!(matches!(outcome(&results, "C"), TriggerOutcome::Removed(_)));
    assert!(ctx.find(&event, "C").is_none());
}

#[tokio::test]
async fn started_target_is_only_merged() {
    let ctx = setup();
    let (pipeline, event) = diamond(&ctx);
    ctx.build(&event, "C", "c1", BuildStatus::Running);
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);
    let b1 = ctx.build(&event, "B", "b1", BuildStatus::Failure);

    let results = next(&ctx, &pipeline, "B", &b1).await;

    let TriggerOutcome::Merged(build) = outcome(&results, "C") else {
        panic!("C not merged");
    };
    assert_eq!(build.id, "c1");
    assert_eq!(build.status, BuildStatus::Running);
    assert_eq!(build.parent_builds.member_build(&member("A")), Some(&a1.id));
    assert_eq!(build.parent_builds.member_build(&member("B")), Some(&b1.id));
    assert!(ctx.store.started().is_empty());
}

#[tokio::test]
async fn disabled_target_is_skipped() {
    let ctx = setup();
    let (pipeline, event) = diamond(&ctx);
    ctx.disable("1", "C");
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);

    let results = next(&ctx, &pipeline, "A", &a1).await;

    assert_eq!(outcome(&results, "C"), &TriggerOutcome::Skipped);
    assert!(ctx.find(&event, "C").is_none());
}

#[tokio::test]
async fn plain_edge_into_join_target_starts_it() {
    let ctx = setup();
    let edges = [("~commit", "A"), ("~commit", "B"), ("~commit", "D"), ("A", "C")];
    let pipeline = ctx.pipeline("1", &edges, &[("B", "C"), ("D", "C")]);
    let event = ctx.event(&pipeline, "e1");
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);

    let results = next(&ctx, &pipeline, "A", &a1).await;

    assert!(matches!(outcome(&results, "C"), TriggerOutcome::Started(_)));
}

#[tokio::test]
async fn recorded_member_build_must_exist() {
    let ctx = setup();
    let (pipeline, event) = diamond(&ctx);
    let mut c1 = ctx.build(&event, "C", "c1", BuildStatus::Created);
    c1.parent_builds = recorded("1", "e1", "B", "ghost");
    ctx.store.insert_build(c1);
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);

    let results = next(&ctx, &pipeline, "A", &a1).await;

    let err = failure(&results, "C");
    assert!(matches!(err, TriggerError::BuildNotFound(id) if *id == "ghost"));
}

#[tokio::test]
async fn pr_join_uses_pr_copies_of_members() {
    let ctx = setup();
    let pipeline = ctx.pr_pipeline("1", &[("~pr", "A"), ("~pr", "B")], &[("A", "C"), ("B", "C")]);
    for name in ["PR-3:A", "PR-3:B", "PR-3:C"] {
        ctx.add_job("1", name);
    }
    let event = ctx.event(&pipeline, "e1");
    let a = ctx.build(&event, "PR-3:A", "pa", BuildStatus::Success);
    let b = ctx.build(&event, "PR-3:B", "pb", BuildStatus::Success);

    let results = next(&ctx, &pipeline, "PR-3:A", &a).await;

    assert!(matches!(outcome(&results, "PR-3:C"), TriggerOutcome::Started(_)));
    let build = ctx.find(&event, "PR-3:C").unwrap();
    assert_eq!(build.parent_builds.member_build(&member("PR-3:B")), Some(&b.id));
    assert_eq!(ctx.find(&event, "C"), None);
}
