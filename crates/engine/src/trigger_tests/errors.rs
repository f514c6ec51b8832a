// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use junction_adapters::ScmError;
use junction_core::{Edge, Node};

#[tokio::test]
async fn missing_event_fails_the_whole_call() {
    let ctx = setup();
    let pipeline = ctx.pipeline("1", &[("~commit", "A"), ("A", "B")], &[]);
    let orphan = Build::builder().id("a1").job_id(job_id("1", "A")).event_id("gone").build();

    let err =
        ctx.engine.trigger_next_jobs(&ctx.request(&pipeline, "A", &orphan)).await.unwrap_err();

    assert!(matches!(err, TriggerError::EventNotFound(id) if id == "gone"));
}

#[tokio::test]
async fn malformed_name_fails_only_its_branch() {
    let ctx = setup();
    let pipeline = ctx.pipeline("1", &[("~commit", "A"), ("A", "sd@:x"), ("A", "B")], &[]);
    let event = ctx.event(&pipeline, "e1");
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);

    let results = next(&ctx, &pipeline, "A", &a1).await;

    assert!(matches!(failure(&results, "sd@:x"), TriggerError::MalformedGraph(_)));
    assert!(matches!(outcome(&results, "B"), TriggerOutcome::Started(_)));
}

#[tokio::test]
async fn successor_without_job_is_not_found() {
    let ctx = setup();
    let mut pipeline = ctx.pipeline("1", &[("~commit", "A")], &[]);
    pipeline.workflow_graph.nodes.push(Node::with_id("Q", job_id("1", "Q")));
    pipeline.workflow_graph.edges.push(Edge::new("A", "Q"));
    let event = ctx.event(&pipeline, "e1");
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);

    let results = next(&ctx, &pipeline, "A", &a1).await;

    let err = failure(&results, "Q");
    assert!(matches!(err, TriggerError::JobNotFound { name, .. } if name == "Q"));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn join_member_outside_the_graph_is_malformed() {
    let ctx = setup();
    let mut pipeline = ctx.pipeline("1", &[("~commit", "A")], &[("A", "C")]);
    pipeline.workflow_graph.edges.push(Edge::join("ghost", "C"));
    let event = ctx.event(&pipeline, "e1");
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);

    let results = next(&ctx, &pipeline, "A", &a1).await;

    assert!(matches!(failure(&results, "C"), TriggerError::MalformedGraph(_)));
    assert!(ctx.find(&event, "C").is_none());
}

#[tokio::test]
async fn scm_outage_fails_only_external_branches() {
    let ctx = setup();
    let pipeline = ctx.pipeline("1", &[("~commit", "A"), ("A", "sd@2:X"), ("A", "B")], &[]);
    ctx.pipeline("2", &[("~sd@1:A", "X")], &[]);
    ctx.scm.set_commit_error(ScmError::Request("503".into()));
    let event = ctx.event(&pipeline, "e1");
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);

    let results = next(&ctx, &pipeline, "A", &a1).await;

    assert!(matches!(failure(&results, "sd@2:X"), TriggerError::Scm(_)));
    assert!(matches!(outcome(&results, "B"), TriggerOutcome::Started(_)));
    assert!(ctx.events("2").is_empty());
}

#[tokio::test]
async fn unknown_downstream_pipeline_fails_its_branch() {
    let ctx = setup();
    let pipeline = ctx.pipeline("1", &[("~commit", "A"), ("A", "sd@404:X")], &[]);
    let event = ctx.event(&pipeline, "e1");
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);

    let results = next(&ctx, &pipeline, "A", &a1).await;

    assert!(matches!(failure(&results, "sd@404:X"), TriggerError::PipelineNotFound(_)));
}
