// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

/// `A -> {B, C}`, `B + C -> D` (join), `D -> E`, with every job built once
/// in the parent event.
fn finished_parent(ctx: &TestContext, b_status: BuildStatus) -> (Pipeline, Event) {
    let pipeline = ctx.pipeline(
        "1",
        &[("~commit", "A"), ("A", "B"), ("A", "C"), ("D", "E")],
        &[("B", "D"), ("C", "D")],
    );
    let parent = ctx.event(&pipeline, "e1");
    ctx.build(&parent, "A", "a1", BuildStatus::Success);
    ctx.build(&parent, "B", "b1", b_status);
    ctx.build(&parent, "C", "c1", BuildStatus::Failure);
    ctx.build(&parent, "D", "d1", BuildStatus::Success);
    ctx.build(&parent, "E", "x1", BuildStatus::Success);
    (pipeline, parent)
}

#[tokio::test]
async fn rerun_join_counts_parent_upstream_builds() {
    let ctx = setup();
    let (pipeline, parent) = finished_parent(&ctx, BuildStatus::Success);
    let rerun = ctx.rerun_event(&pipeline, "e2", &parent, "C");
    let c2 = ctx.build(&rerun, "C", "c2", BuildStatus::Success);

    let results = next(&ctx, &pipeline, "C", &c2).await;

    let TriggerOutcome::Started(d2) = outcome(&results, "D") else {
        panic!("D not started");
    };
    assert_eq!(d2.event_id, rerun.id);
    let b = JobRef::internal(&pipeline.id, "B");
    let c = JobRef::internal(&pipeline.id, "C");
    assert_eq!(d2.parent_builds.member_build(&b), Some(&BuildId::new("b1")));
    assert_eq!(d2.parent_builds.member_build(&c), Some(&c2.id));
    // The parent's D is downstream of the restart point and stays untouched
    assert_eq!(ctx.find(&parent, "D").map(|d| d.id), Some(BuildId::new("d1")));

    let d2 = ctx.store.set_build_status(&d2.id, BuildStatus::Success).unwrap();
    let results = next(&ctx, &pipeline, "D", &d2).await;
    let TriggerOutcome::Started(e2) = outcome(&results, "E") else {
        panic!("E not started");
    };
    assert_eq!(e2.event_id, rerun.id);
}

#[tokio::test]
async fn rerun_join_sees_failed_parent_member() {
    let ctx = setup();
    let (pipeline, parent) = finished_parent(&ctx, BuildStatus::Failure);
    let rerun = ctx.rerun_event(&pipeline, "e2", &parent, "C");
    let c2 = ctx.build(&rerun, "C", "c2", BuildStatus::Success);

    let results = next(&ctx, &pipeline, "C", &c2).await;

    assert!(matches!(outcome(&results, "D"), TriggerOutcome::Removed(_)));
    assert!(ctx.find(&rerun, "D").is_none());
}

#[tokio::test]
async fn rerun_never_counts_parent_builds_it_restarts() {
    let ctx = setup();
    let (pipeline, parent) = finished_parent(&ctx, BuildStatus::Success);
    // Restarting at A re-runs B and C too; only the fresh C has finished
    let rerun = ctx.rerun_event(&pipeline, "e2", &parent, "A");
    let c2 = ctx.build(&rerun, "C", "c2", BuildStatus::Success);

    let results = next(&ctx, &pipeline, "C", &c2).await;

    let TriggerOutcome::Waiting(d2) = outcome(&results, "D") else {
        panic!("D not waiting");
    };
    assert_eq!(d2.parent_builds.member_build(&JobRef::internal(&pipeline.id, "B")), None);
}
