// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger orchestration tests

mod errors;
mod external;
mod join;
mod no_join;
mod rerun;

use super::*;
use crate::test_helpers::{job_id, setup, TestContext};
use junction_core::{BuildStatus, EventId, PipelineId};

/// Trigger the successors of `build`, a build of job `name`.
async fn next(
    ctx: &TestContext,
    pipeline: &Pipeline,
    name: &str,
    build: &Build,
) -> Vec<NextJobOutcome> {
    ctx.engine.trigger_next_jobs(&ctx.request(pipeline, name, build)).await.unwrap()
}

/// Successful outcome for successor `name`.
fn outcome<'a>(results: &'a [NextJobOutcome], name: &str) -> &'a TriggerOutcome {
    let Some(result) = results.iter().find(|r| r.job_name == name) else {
        panic!("no outcome for {name}");
    };
    match &result.outcome {
        Ok(outcome) => outcome,
        Err(e) => panic!("{name} failed: {e}"),
    }
}

/// Error for successor `name`.
fn failure<'a>(results: &'a [NextJobOutcome], name: &str) -> &'a TriggerError {
    let Some(result) = results.iter().find(|r| r.job_name == name) else {
        panic!("no outcome for {name}");
    };
    match &result.outcome {
        Err(e) => e,
        Ok(outcome) => panic!("{name} succeeded: {outcome:?}"),
    }
}

/// Provenance entry for one build of pipeline `pipeline_id`.
fn recorded(pipeline_id: &str, event: &str, job: &str, build: &str) -> ParentBuilds {
    ParentBuilds::single(
        &PipelineId::new(pipeline_id),
        &EventId::new(event),
        job,
        &BuildId::new(build),
    )
}

#[test]
fn outcome_exposes_its_build() {
    let build = Build::builder().build();
    assert_eq!(TriggerOutcome::Started(build.clone()).build(), Some(&build));
    assert_eq!(TriggerOutcome::Waiting(build.clone()).kind(), "waiting");
    assert_eq!(TriggerOutcome::Removed(build.id.clone()).build(), None);
    assert_eq!(TriggerOutcome::Skipped.kind(), "skipped");

    let event = Event::builder().build();
    let created = TriggerOutcome::EventCreated { event, build: None };
    assert_eq!(created.build(), None);
    assert_eq!(created.kind(), "event_created");
}

#[test]
fn request_defaults_to_external_join() {
    let request = NextJobsRequest::new(
        Pipeline::builder().build(),
        Job::builder().build(),
        Build::builder().build(),
        "admin",
        "github:github.com",
    );
    assert!(request.external_join);
    assert!(!request.external_join(false).external_join);
}
