//! Property tests for the context store's ordering guarantees

use std::sync::Arc;

use proptest::prelude::*;

use taskflow::{ContextStore, NullSink, TaskContext};

/// One step of a simulated turn's mutation.
#[derive(Debug, Clone)]
enum Mutation {
    SetTaskId(String),
    SetStatus(String),
    SetAssignee(String),
    SetPriority(i64),
    Clear,
}

impl Mutation {
    fn apply(&self, mut ctx: TaskContext) -> TaskContext {
        match self {
            Mutation::SetTaskId(id) => ctx.task_id = Some(id.clone()),
            Mutation::SetStatus(status) => ctx.status = Some(status.clone()),
            Mutation::SetAssignee(user) => ctx.assigned_to = Some(user.clone()),
            Mutation::SetPriority(priority) => ctx.priority = Some(*priority),
            Mutation::Clear => ctx = TaskContext::default(),
        }
        ctx
    }
}

fn mutation_strategy() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        "[A-Z]{4}-[0-9]{1,4}".prop_map(Mutation::SetTaskId),
        prop_oneof![
            Just("created".to_string()),
            Just("assigned".to_string()),
            Just("completed".to_string())
        ]
        .prop_map(Mutation::SetStatus),
        "user-[0-9]{1,3}".prop_map(Mutation::SetAssignee),
        (0i64..10).prop_map(Mutation::SetPriority),
        Just(Mutation::Clear),
    ]
}

proptest! {
    /// Applying N mutations through the store in turn order always yields the
    /// plain left fold of the same mutations over the initial context.
    #[test]
    fn store_state_equals_fold_of_mutations(
        mutations in prop::collection::vec(mutation_strategy(), 0..24)
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let store = ContextStore::new("prop-session", Arc::new(NullSink));

            for mutation in &mutations {
                let step = mutation.clone();
                store.apply(move |ctx| Ok(step.apply(ctx))).await.unwrap();
            }

            let expected = mutations
                .iter()
                .fold(TaskContext::default(), |ctx, m| m.apply(ctx));
            prop_assert_eq!(store.get().await, expected);
            Ok(())
        })?;
    }
}
