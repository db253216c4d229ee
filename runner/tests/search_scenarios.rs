//! End-to-end search runs against scripted collaborators and a real SQLite
//! program store.

use std::sync::Arc;

use mcts::MctsConfig;
use mcts_runner::storage::{create_program_store, InMemoryProgramStore, StorageConfig};
use mcts_runner::test_support::{EvalStep, FakeEnvironment, ScriptedAgent, ScriptedEvaluator};
use mcts_runner::{
    BestValueSampler, Controller, GameState, ProgramStore, Role, RunnerConfig, Task, Worker,
};
use tempfile::tempdir;

fn config(mcts: MctsConfig) -> RunnerConfig {
    RunnerConfig {
        version: 2,
        version_description: "integration".into(),
        mcts,
        log_level: "debug".into(),
        storage: StorageConfig::Memory,
    }
}

fn pool(
    size: usize,
    agent: &Arc<ScriptedAgent>,
    evaluator: &Arc<ScriptedEvaluator>,
) -> Vec<Worker> {
    let task = Arc::new(Task::new(
        "iron_gear_wheel_throughput",
        "Build a factory producing 16 iron gear wheels per minute",
        GameState::new("lab-start"),
    ));
    (0..size)
        .map(|id| {
            Worker::new(
                id,
                agent.clone(),
                evaluator.clone(),
                Box::new(FakeEnvironment::new("Inventory: {'iron-plate': 50}")),
                task.clone(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_run_persists_every_integrated_program() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("programs.db");
    let store: Arc<dyn ProgramStore> = Arc::from(
        create_program_store(&StorageConfig::sqlite(db_path.to_str().unwrap())).unwrap(),
    );
    let sampler = Arc::new(BestValueSampler::new(store.clone()));
    let agent = Arc::new(ScriptedAgent::new("You control a Factorio character."));
    let evaluator = Arc::new(ScriptedEvaluator::new(vec![
        EvalStep::Reward(0.5),
        EvalStep::Reward(1.5),
        EvalStep::Reward(1.0),
        EvalStep::Reward(2.0),
    ]));

    let mcts = MctsConfig::default()
        .with_iterations(2)
        .with_batch_size(2)
        .with_workers(2);
    let mut controller = Controller::new(
        &config(mcts),
        pool(2, &agent, &evaluator),
        store.clone(),
        sampler,
    )
    .await
    .unwrap();

    let summary = controller.run().await;

    assert_eq!(summary.iterations, 2);
    assert_eq!(summary.successful_simulations, 4);
    assert_eq!(summary.failed_simulations, 0);
    assert_eq!(summary.tree.total_nodes, 5);
    assert_eq!(summary.tree.root_visits, 4);
    assert_eq!(summary.tree.root_value, 5.0);
    assert_eq!(summary.tree.pending_visits, 0);
    assert_eq!(store.count().await.unwrap(), 4);

    let best = store.best_program(2).await.unwrap().unwrap();
    assert_eq!(best.value, 2.0);
    assert_eq!(best.version_description, "integration");
    assert!(best.depth >= 1);

    let roles: Vec<Role> = best.conversation.messages.iter().map(|m| m.role).collect();
    assert_eq!(roles.first(), Some(&Role::System));
    assert_eq!(roles.last(), Some(&Role::User));
}

#[tokio::test]
async fn test_resumed_run_continues_from_best_program() {
    let store = Arc::new(InMemoryProgramStore::new());
    let agent = Arc::new(ScriptedAgent::new("prompt"));

    // First run seeds the store
    {
        let evaluator = Arc::new(ScriptedEvaluator::new(vec![EvalStep::Reward(3.0)]));
        let sampler = Arc::new(BestValueSampler::new(store.clone()));
        let mut controller = Controller::new(
            &config(MctsConfig::for_testing()),
            pool(1, &agent, &evaluator),
            store.clone(),
            sampler,
        )
        .await
        .unwrap();
        controller.run().await;
    }

    let evaluator = Arc::new(ScriptedEvaluator::new(vec![EvalStep::Reward(4.0)]));
    let sampler = Arc::new(BestValueSampler::new(store.clone()));
    let mut controller = Controller::new(
        &config(MctsConfig::for_testing()),
        pool(1, &agent, &evaluator),
        store.clone(),
        sampler.clone(),
    )
    .await
    .unwrap();
    controller.run().await;

    let programs = store.programs().unwrap();
    assert_eq!(programs.len(), 2);
    assert_eq!(programs[1].parent_id, Some(1));
    assert_eq!(programs[1].depth, 2);
    assert_eq!(sampler.visit_count(1), 1);

    // The resumed simulation continued the seeded conversation
    let resumed = &agent.conversations()[1];
    assert_eq!(resumed, &programs[0].conversation);
}

#[tokio::test]
async fn test_failing_iterations_do_not_block_later_ones() {
    let store = Arc::new(InMemoryProgramStore::new());
    let sampler = Arc::new(BestValueSampler::new(store.clone()));
    let agent = Arc::new(ScriptedAgent::new("prompt"));
    let evaluator = Arc::new(ScriptedEvaluator::new(vec![
        EvalStep::Reward(1.0),
        EvalStep::Panic,
        EvalStep::Fail("factorio server restarted".into()),
        EvalStep::Reward(1.0),
    ]));

    let mut controller = Controller::new(
        &config(MctsConfig::for_testing().with_iterations(4)),
        pool(1, &agent, &evaluator),
        store.clone(),
        sampler,
    )
    .await
    .unwrap();

    let summary = controller.run().await;

    assert_eq!(summary.iterations, 4);
    assert_eq!(summary.successful_simulations, 2);
    assert_eq!(summary.failed_simulations, 2);
    assert_eq!(summary.tree.total_nodes, 3);
    assert_eq!(summary.tree.root_visits, 2);
    assert_eq!(summary.tree.root_value, 2.0);
    assert_eq!(summary.tree.pending_visits, 0);
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_completed_task_notifies_agent() {
    let store = Arc::new(InMemoryProgramStore::new());
    let sampler = Arc::new(BestValueSampler::new(store.clone()));
    let agent = Arc::new(ScriptedAgent::new("prompt"));
    let evaluator = Arc::new(ScriptedEvaluator::new(vec![
        EvalStep::Reward(1.0),
        EvalStep::Complete(10.0),
    ]));

    let mut controller = Controller::new(
        &config(MctsConfig::for_testing().with_iterations(2)),
        pool(1, &agent, &evaluator),
        store,
        sampler,
    )
    .await
    .unwrap();
    let summary = controller.run().await;

    assert_eq!(summary.best_value, Some(11.0 / 2.0));
    let completions = agent.completions();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].step, 2);
}
