//! Joins within one pipeline.
//!
//! The join target is created when its first member finishes, and started or
//! discarded only once every member has finished.

use crate::prelude::*;
use proptest::prelude::*;

fn diamond() -> Fixture {
    Fixture::new()
        .pipeline("1", &["~commit -> A", "~commit -> B"], &["A -> C", "B -> C"])
        .event("e1", "1")
        .build("a1", "e1", "A", "RUNNING")
        .build("b1", "e1", "B", "RUNNING")
}

#[tokio::test]
async fn join_starts_after_every_member_succeeds() {
    let world = diamond().load();

    let first = world.finish("a1", BuildStatus::Success).await;
    let TriggerOutcome::Waiting(c) = outcome(&first, "C") else {
        panic!("C should wait for B");
    };
    assert_eq!(c.status, BuildStatus::Created);
    assert!(world.started().is_empty());

    let second = world.finish("b1", BuildStatus::Success).await;
    let TriggerOutcome::Started(started) = outcome(&second, "C") else {
        panic!("C should start");
    };
    assert_eq!(started.id, c.id);
    assert_eq!(started.parent_build_id, vec![BuildId::new("a1"), BuildId::new("b1")]);
    assert_eq!(world.started(), vec![c.id.clone()]);
}

#[tokio::test]
async fn failed_member_discards_the_join_target() {
    let world = diamond().load();

    world.finish("a1", BuildStatus::Success).await;
    assert!(world.build_of("e1", "C").is_some());

    let results = world.finish("b1", BuildStatus::Failure).await;

    assert!(matches!(outcome(&results, "C"), TriggerOutcome::Removed(_)));
    assert_eq!(world.build_of("e1", "C"), None);
    assert!(world.started().is_empty());
}

#[tokio::test]
async fn legacy_policy_discards_on_first_failure() {
    let world = Fixture::new()
        .pipeline("1", &["~commit -> A", "~commit -> B", "~commit -> D"], &[
            "A -> C", "B -> C", "D -> C",
        ])
        .event("e1", "1")
        .build("a1", "e1", "A", "RUNNING")
        .build("b1", "e1", "B", "RUNNING")
        .build("d1", "e1", "D", "RUNNING")
        .load();

    world.finish_with("a1", BuildStatus::Success, false).await;
    let results = world.finish_with("d1", BuildStatus::Aborted, false).await;

    assert!(matches!(outcome(&results, "C"), TriggerOutcome::Removed(_)));
    assert_eq!(world.build_of("e1", "C"), None);
}

const MEMBERS: [&str; 3] = ["a1", "b1", "d1"];

fn arb_status() -> impl Strategy<Value = BuildStatus> {
    prop::sample::select(vec![
        BuildStatus::Success,
        BuildStatus::Unstable,
        BuildStatus::Failure,
        BuildStatus::Aborted,
    ])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whatever order members finish in, the target starts exactly when the
    /// last one finishes and none failed, and is gone otherwise.
    #[test]
    fn join_settles_only_when_every_member_finished(
        order in Just(vec![0usize, 1, 2]).prop_shuffle(),
        statuses in prop::collection::vec(arb_status(), 3),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        runtime.block_on(async {
            let world = Fixture::new()
                .pipeline("1", &["~commit -> A", "~commit -> B", "~commit -> D"], &[
                    "A -> C", "B -> C", "D -> C",
                ])
                .event("e1", "1")
                .build("a1", "e1", "A", "RUNNING")
                .build("b1", "e1", "B", "RUNNING")
                .build("d1", "e1", "D", "RUNNING")
                .load();

            for (step, &member) in order.iter().enumerate() {
                world.finish(MEMBERS[member], statuses[member]).await;
                if step < 2 {
                    prop_assert!(world.started().is_empty());
                }
            }

            let failed = statuses.iter().any(BuildStatus::is_failure);
            let target = world.build_of("e1", "C");
            if failed {
                prop_assert_eq!(target, None);
                prop_assert!(world.started().is_empty());
            } else {
                let target = target.unwrap();
                prop_assert_eq!(target.status, BuildStatus::Queued);
                prop_assert_eq!(world.started(), vec![target.id]);
            }
            Ok(())
        })?;
    }
}
