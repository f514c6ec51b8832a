// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::env::EngineConfig;

#[tokio::test]
async fn starts_every_plain_successor() {
    let ctx = setup();
    let pipeline = ctx.pipeline("1", &[("~commit", "A"), ("A", "B"), ("A", "C")], &[]);
    let event = ctx.event(&pipeline, "e1");
    let mut a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);
    a1.base_branch = Some("main".to_string());
    ctx.store.insert_build(a1.clone());

    let results = next(&ctx, &pipeline, "A", &a1).await;

    let names: Vec<_> = results.iter().map(|r| r.job_name.as_str()).collect();
    assert_eq!(names, vec!["B", "C"]);
    for name in ["B", "C"] {
        let TriggerOutcome::Started(build) = outcome(&results, name) else {
            panic!("{name} not started");
        };
        assert_eq!(build.status, BuildStatus::Queued);
        assert_eq!(build.event_id, event.id);
        assert_eq!(build.job_id, job_id("1", name));
        assert_eq!(build.parent_build_id, vec![a1.id.clone()]);
        assert_eq!(build.parent_builds, recorded("1", "e1", "A", "a1"));
        assert_eq!(build.username, "admin");
        assert_eq!(build.base_branch.as_deref(), Some("main"));
    }
    assert_eq!(ctx.store.started().len(), 2);
}

#[tokio::test]
async fn no_successors_is_an_empty_result() {
    let ctx = setup();
    let pipeline = ctx.pipeline("1", &[("~commit", "A")], &[]);
    let event = ctx.event(&pipeline, "e1");
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);

    assert!(next(&ctx, &pipeline, "A", &a1).await.is_empty());
}

#[tokio::test]
async fn disabled_successor_is_skipped() {
    let ctx = setup();
    let pipeline = ctx.pipeline("1", &[("~commit", "A"), ("A", "B"), ("A", "C")], &[]);
    ctx.disable("1", "B");
    let event = ctx.event(&pipeline, "e1");
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);

    let results = next(&ctx, &pipeline, "A", &a1).await;

    assert_eq!(outcome(&results, "B"), &TriggerOutcome::Skipped);
    assert!(matches!(outcome(&results, "C"), TriggerOutcome::Started(_)));
    assert!(ctx.find(&event, "B").is_none());
}

#[tokio::test]
async fn failed_build_starts_nothing() {
    let ctx = setup();
    let pipeline = ctx.pipeline("1", &[("~commit", "A"), ("A", "B")], &[]);
    let event = ctx.event(&pipeline, "e1");
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Failure);

    let results = next(&ctx, &pipeline, "A", &a1).await;

    assert_eq!(outcome(&results, "B"), &TriggerOutcome::Skipped);
    assert!(ctx.find(&event, "B").is_none());
    assert!(ctx.store.started().is_empty());
}

#[tokio::test]
async fn unstarted_successor_build_is_started() {
    let ctx = setup();
    let pipeline = ctx.pipeline("1", &[("~commit", "A"), ("A", "B")], &[]);
    let event = ctx.event(&pipeline, "e1");
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);
    ctx.build(&event, "B", "b1", BuildStatus::Created);

    let results = next(&ctx, &pipeline, "A", &a1).await;

    let TriggerOutcome::Started(build) = outcome(&results, "B") else {
        panic!("B not started");
    };
    assert_eq!(build.id, "b1");
    assert_eq!(build.status, BuildStatus::Queued);
    assert_eq!(build.parent_build_id, vec![a1.id.clone()]);
    assert_eq!(ctx.store.started(), vec![BuildId::new("b1")]);
}

#[tokio::test]
async fn second_parent_merges_into_running_successor() {
    let ctx = setup();
    let pipeline =
        ctx.pipeline("1", &[("~commit", "A"), ("~commit", "D"), ("A", "B"), ("D", "B")], &[]);
    let event = ctx.event(&pipeline, "e1");
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);
    let d1 = ctx.build(&event, "D", "d1", BuildStatus::Success);

    let first = next(&ctx, &pipeline, "A", &a1).await;
    let started = outcome(&first, "B").build().cloned().unwrap();
    ctx.store.set_build_status(&started.id, BuildStatus::Running).unwrap();

    let second = next(&ctx, &pipeline, "D", &d1).await;

    let TriggerOutcome::Merged(build) = outcome(&second, "B") else {
        panic!("B not merged");
    };
    assert_eq!(build.id, started.id);
    assert_eq!(build.status, BuildStatus::Running);
    assert_eq!(build.parent_build_id, vec![a1.id.clone(), d1.id.clone()]);
    assert_eq!(
        build.parent_builds,
        recorded("1", "e1", "A", "a1").merge(&recorded("1", "e1", "D", "d1"))
    );
    assert_eq!(ctx.store.started(), vec![started.id.clone()]);
}

#[tokio::test]
async fn upstream_provenance_is_carried_forward() {
    let ctx = setup();
    let pipeline = ctx.pipeline("1", &[("~sd@9:X", "A"), ("A", "B")], &[]);
    let event = ctx.event(&pipeline, "e1");
    let mut a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);
    a1.parent_builds = recorded("9", "e9", "X", "x9");
    ctx.store.insert_build(a1.clone());

    let results = next(&ctx, &pipeline, "A", &a1).await;

    let build = outcome(&results, "B").build().unwrap();
    assert_eq!(
        build.parent_builds,
        recorded("9", "e9", "X", "x9").merge(&recorded("1", "e1", "A", "a1"))
    );
}

#[tokio::test]
async fn pr_jobs_chain_when_enabled() {
    let ctx = setup();
    let pipeline = ctx.pr_pipeline("1", &[("~pr", "A"), ("A", "B")], &[]);
    ctx.add_job("1", "PR-7:A");
    ctx.add_job("1", "PR-7:B");
    let event = ctx.event(&pipeline, "e1");
    let pr = ctx.build(&event, "PR-7:A", "p1", BuildStatus::Success);

    let results = next(&ctx, &pipeline, "PR-7:A", &pr).await;

    let TriggerOutcome::Started(build) = outcome(&results, "PR-7:B") else {
        panic!("PR-7:B not started");
    };
    assert_eq!(build.job_id, job_id("1", "PR-7:B"));
}

#[tokio::test]
async fn pr_jobs_stop_when_chaining_is_off() {
    let ctx = setup();
    let pipeline = ctx.pipeline("1", &[("~pr", "A"), ("A", "B")], &[]);
    ctx.add_job("1", "PR-7:A");
    ctx.add_job("1", "PR-7:B");
    let event = ctx.event(&pipeline, "e1");
    let pr = ctx.build(&event, "PR-7:A", "p1", BuildStatus::Success);

    assert!(next(&ctx, &pipeline, "PR-7:A", &pr).await.is_empty());
}

#[tokio::test]
async fn outcomes_keep_graph_order_under_any_fanout() {
    let ctx = setup();
    let edges = [("~commit", "A"), ("A", "E"), ("A", "D"), ("A", "C"), ("A", "B")];
    let pipeline = ctx.pipeline("1", &edges, &[]);
    let event = ctx.event(&pipeline, "e1");
    let a1 = ctx.build(&event, "A", "a1", BuildStatus::Success);
    let engine = TriggerEngine::new(
        EngineDeps { store: ctx.store.clone(), scm: ctx.scm.clone() },
        EngineConfig { fanout_limit: 1 },
    );

    let results = engine.trigger_next_jobs(&ctx.request(&pipeline, "A", &a1)).await.unwrap();

    let names: Vec<_> = results.iter().map(|r| r.job_name.as_str()).collect();
    assert_eq!(names, vec!["E", "D", "C", "B"]);
    assert!(results.iter().all(|r| matches!(r.outcome, Ok(TriggerOutcome::Started(_)))));
}
