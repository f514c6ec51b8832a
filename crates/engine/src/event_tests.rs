// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{scm_uri, setup};
use junction_adapters::ScmCall;

fn request(pipeline_id: &str) -> TriggerEvent {
    TriggerEvent {
        pipeline_id: PipelineId::new(pipeline_id),
        start_from: "B".to_string(),
        cause_message: "Triggered by sd@9:A".to_string(),
        parent_build_id: Some(BuildId::new("a1")),
        parent_builds: None,
        parent_event_id: None,
    }
}

#[tokio::test]
async fn opens_event_at_head_commit_as_admin() {
    let ctx = setup();
    let pipeline = ctx.pipeline("1", &[("~commit", "A"), ("A", "B")], &[]);

    let event = ctx.engine.trigger_event(request("1")).await.unwrap();

    assert_eq!(event.pipeline_id, "1");
    assert_eq!(event.sha, "sha-1");
    assert_eq!(event.username, "admin");
    assert_eq!(event.start_from, "B");
    assert_eq!(event.cause_message, "Triggered by sd@9:A");
    assert_eq!(event.parent_build_id, Some(BuildId::new("a1")));
    assert_eq!(event.workflow_graph, pipeline.workflow_graph);
    assert_eq!(ctx.events("1"), vec![event]);
    assert!(ctx.scm.calls().contains(&ScmCall::CommitSha {
        scm_uri: scm_uri("1"),
        token: "t0k3n".to_string(),
    }));
}

#[tokio::test]
async fn skips_admins_without_credentials() {
    let ctx = setup();
    let mut pipeline = ctx.pipeline("1", &[("~commit", "A")], &[]);
    pipeline.admins = vec!["ghost".to_string(), "mallory".to_string(), "admin".to_string()];
    ctx.store.insert_pipeline(pipeline);
    ctx.scm.set_token("mallory", "m4ll");

    let event = ctx.engine.trigger_event(request("1")).await.unwrap();

    assert_eq!(event.username, "mallory");
    let asked: Vec<_> = ctx
        .scm
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            ScmCall::AdminToken { username, .. } => Some(username),
            ScmCall::CommitSha { .. } => None,
        })
        .collect();
    assert_eq!(asked, vec!["ghost", "mallory"]);
}

#[tokio::test]
async fn no_usable_admin_is_an_error() {
    let ctx = setup();
    let mut pipeline = ctx.pipeline("1", &[("~commit", "A")], &[]);
    pipeline.admins = vec!["ghost".to_string()];
    ctx.store.insert_pipeline(pipeline);

    let err = ctx.engine.trigger_event(request("1")).await.unwrap_err();

    assert!(matches!(err, TriggerError::NoPipelineAdmin(id) if id == "1"));
    assert!(ctx.events("1").is_empty());
}

#[tokio::test]
async fn commit_lookup_failure_propagates() {
    let ctx = setup();
    ctx.pipeline("1", &[("~commit", "A")], &[]);
    ctx.scm.set_commit_error(ScmError::Request("503".into()));

    let err = ctx.engine.trigger_event(request("1")).await.unwrap_err();

    assert!(matches!(err, TriggerError::Scm(ScmError::Request(_))));
    assert!(ctx.events("1").is_empty());
}

#[tokio::test]
async fn unknown_pipeline_is_not_found() {
    let ctx = setup();

    let err = ctx.engine.trigger_event(request("404")).await.unwrap_err();

    assert!(matches!(err, TriggerError::PipelineNotFound(ref id) if id == "404"));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn records_provenance_and_rerun_parent() {
    let ctx = setup();
    ctx.pipeline("1", &[("~commit", "A")], &[]);
    let provenance = ParentBuilds::single(
        &PipelineId::new("9"),
        &EventId::new("e9"),
        "A",
        &BuildId::new("a1"),
    );
    let mut req = request("1");
    req.parent_builds = Some(provenance.clone());
    req.parent_event_id = Some(EventId::new("e0"));

    let event = ctx.engine.trigger_event(req).await.unwrap();

    assert_eq!(event.parent_builds, provenance);
    assert_eq!(event.parent_event_id, Some(EventId::new("e0")));
    assert!(event.is_rerun());
}
