// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The workflow scheduler: owns a workflow's mutable state and drives its
//! task graph to completion under dependency, retry, and branch rules
//! (spec §4.6).
//!
//! Concurrency wraps locked shared state in a central struct, but ready
//! tasks are dispatched onto a `tokio::sync::Semaphore`-bounded pool via a
//! `JoinSet` rather than a single-threaded event-pump loop, since
//! independent tasks here genuinely run concurrently. Every state
//! transition applies the event to in-memory state immediately and
//! publishes it on the bus for durability/observability, in that order.

use crate::error::RuntimeError;
use crate::runtime_state::WorkflowRuntime;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tf_adapters::{AdapterError, DispatchRequest, RoleRegistry};
use tf_artifact::{ArtifactFile, ArtifactStore, CommitRequest};
use tf_bus::EventBus;
use tf_core::config::SchedulerConfig;
use tf_core::event::{ArtifactRef, Envelope, Event, EventId};
use tf_core::failure::FailureClass;
use tf_core::graph::{BranchReason, Task, TaskGraph, TaskId, WorkerRole};
use tf_core::id::IdGen;
use tf_core::workflow::{CorrelationId, TaskStatus, Workflow, WorkflowId};
use tf_core::Clock;
use tf_storage::{MaterializedState, WorkflowStateStore};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Own a set of workflows' mutable state and drive their task graphs to
/// completion (spec §4.6 "Responsibility").
pub struct Scheduler<A, C, I>
where
    A: ArtifactStore + 'static,
    C: Clock,
    I: IdGen,
{
    registry: Arc<RoleRegistry>,
    artifact_store: Arc<A>,
    state_store: Arc<dyn WorkflowStateStore>,
    state: Arc<Mutex<MaterializedState>>,
    bus: Arc<dyn EventBus>,
    clock: C,
    id_gen: I,
    config: SchedulerConfig,
    /// Per-workflow mutable task set (original graph + synthesized
    /// branches), kept apart from `MaterializedState` since a `TaskGraph`
    /// is immutable once created (spec §3) but branch tasks are not part
    /// of it.
    runtimes: Mutex<HashMap<String, WorkflowRuntime>>,
    cancelled: Mutex<std::collections::HashSet<String>>,
    source: String,
}

/// The outcome of one dispatched attempt, resolved after its adapter call
/// either returns or its task-level timeout elapses.
struct DispatchOutcome {
    task_id: TaskId,
    attempt: u32,
    result: Result<Result<Event, AdapterError>, tokio::time::error::Elapsed>,
}

impl<A, C, I> Scheduler<A, C, I>
where
    A: ArtifactStore + 'static,
    C: Clock,
    I: IdGen,
{
    pub fn new(
        registry: Arc<RoleRegistry>,
        artifact_store: Arc<A>,
        state_store: Arc<dyn WorkflowStateStore>,
        state: Arc<Mutex<MaterializedState>>,
        bus: Arc<dyn EventBus>,
        clock: C,
        id_gen: I,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            registry,
            artifact_store,
            state_store,
            state,
            bus,
            clock,
            id_gen,
            config,
            runtimes: Mutex::new(HashMap::new()),
            cancelled: Mutex::new(std::collections::HashSet::new()),
            source: "tf-engine".to_string(),
        }
    }

    // -- admission ---------------------------------------------------

    /// `create_workflow(graph)` (spec §4.6 "Admission"): validates the
    /// graph and returns a new workflow id in status `created`.
    pub async fn create_workflow(
        &self,
        graph: TaskGraph,
        correlation_id: CorrelationId,
    ) -> Result<WorkflowId, RuntimeError> {
        graph.validate()?;

        let workflow_id = WorkflowId::new(self.id_gen.next());
        let task_ids: Vec<TaskId> = graph.tasks.iter().map(|t| t.id.clone()).collect();
        let workflow = Workflow::new(
            workflow_id.clone(),
            graph.graph_id.clone(),
            correlation_id.clone(),
            self.clock.epoch_ms(),
            task_ids,
        );

        self.state
            .lock()
            .workflows
            .insert(workflow_id.as_str().to_string(), workflow.clone());
        self.runtimes.lock().insert(
            workflow_id.as_str().to_string(),
            WorkflowRuntime::new(graph.tasks),
        );

        self.emit(
            &correlation_id,
            Event::WorkflowCreated {
                workflow_id: workflow_id.clone(),
                graph_id: workflow.graph_id.clone(),
            },
        )
        .await?;

        self.persist(&workflow_id)?;
        Ok(workflow_id)
    }

    // -- execution loop ------------------------------------------------

    /// `execute(workflow_id)` (spec §4.6 "Execution loop").
    pub async fn execute(&self, workflow_id: &WorkflowId) -> Result<(), RuntimeError> {
        let correlation_id = self.correlation_id_of(workflow_id)?;
        self.emit(
            &correlation_id,
            Event::WorkflowRunning {
                workflow_id: workflow_id.clone(),
            },
        )
        .await?;

        // Retries and post-branch revalidation dispatches bypass the
        // ordinary readiness scan (their deps are already satisfied) and
        // are carried here to the next round instead.
        let mut forced: Vec<(TaskId, u32, Vec<String>)> = Vec::new();

        loop {
            if self.is_cancelled(workflow_id) {
                break;
            }

            let mut batch = Vec::new();
            for (task_id, attempt, extra) in forced.drain(..) {
                if let Some(task) = self.runtime_task(workflow_id, task_id.as_str())? {
                    batch.push((task, attempt, extra));
                }
            }
            for task_id in self.ready_task_ids(workflow_id)? {
                let task = self
                    .runtime_task(workflow_id, task_id.as_str())?
                    .ok_or_else(|| RuntimeError::TaskNotFound(task_id.as_str().to_string()))?;
                let attempt = self.next_attempt(workflow_id, task_id.as_str())?;
                batch.push((task, attempt, Vec::new()));
            }

            if batch.is_empty() {
                break;
            }

            let outcomes = self.dispatch_round(workflow_id, &correlation_id, batch).await?;

            // Cancellation: in-flight tasks are allowed to finish but
            // their results are discarded (spec §4.6 "Cancellation").
            if self.is_cancelled(workflow_id) {
                break;
            }

            for outcome in outcomes {
                let next = self.resolve_outcome(workflow_id, &correlation_id, outcome).await?;
                forced.extend(next);
            }

            self.persist(workflow_id)?;
        }

        self.finalize(workflow_id, &correlation_id).await?;
        self.persist(workflow_id)?;
        Ok(())
    }

    /// `cancel(workflow_id)` (spec §4.6 "Cancellation").
    pub async fn cancel(&self, workflow_id: &WorkflowId) -> Result<(), RuntimeError> {
        let correlation_id = self.correlation_id_of(workflow_id)?;
        self.cancelled.lock().insert(workflow_id.as_str().to_string());
        self.emit(
            &correlation_id,
            Event::WorkflowCancelled {
                workflow_id: workflow_id.clone(),
            },
        )
        .await?;
        self.persist(workflow_id)
    }

    fn is_cancelled(&self, workflow_id: &WorkflowId) -> bool {
        self.cancelled.lock().contains(workflow_id.as_str())
    }

    // -- dispatch --------------------------------------------------------

    async fn dispatch_round(
        &self,
        workflow_id: &WorkflowId,
        correlation_id: &CorrelationId,
        batch: Vec<(Task, u32, Vec<String>)>,
    ) -> Result<Vec<DispatchOutcome>, RuntimeError> {
        let mut prepared = Vec::with_capacity(batch.len());
        for (task, attempt, extra_inputs) in batch {
            self.emit(
                correlation_id,
                Event::TaskDispatch {
                    workflow_id: workflow_id.clone(),
                    task_id: task.id.clone(),
                    role: task.role,
                    attempt,
                    parent_task_id: task.parent_id.clone(),
                    failure_class: None,
                    fix_hint: None,
                },
            )
            .await?;
            let request = self.build_dispatch_request(workflow_id, correlation_id, &task, attempt, extra_inputs);
            prepared.push((task.id.clone(), attempt, task.timeout, request));
        }

        let semaphore = Arc::new(Semaphore::new(self.config.worker_pool_size.max(1)));
        let mut set = JoinSet::new();
        for (task_id, attempt, task_timeout, request) in prepared {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| RuntimeError::Join(e.to_string()))?;
            let registry = self.registry.clone();
            set.spawn(async move {
                let _permit = permit;
                let result = tokio::time::timeout(task_timeout, registry.dispatch(request)).await;
                DispatchOutcome {
                    task_id,
                    attempt,
                    result,
                }
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = set.join_next().await {
            outcomes.push(joined.map_err(|e| RuntimeError::Join(e.to_string()))?);
        }
        Ok(outcomes)
    }

    fn build_dispatch_request(
        &self,
        workflow_id: &WorkflowId,
        correlation_id: &CorrelationId,
        task: &Task,
        attempt: u32,
        mut extra_inputs: Vec<String>,
    ) -> DispatchRequest {
        let mut input_artifacts: Vec<String> = {
            let state = self.state.lock();
            let workflow = state.get_workflow(workflow_id.as_str());
            task.deps
                .iter()
                .filter_map(|dep| workflow.and_then(|w| w.task_state(dep.as_str())))
                .flat_map(|s| s.produced_artifacts.clone())
                .collect()
        };
        input_artifacts.append(&mut extra_inputs);
        input_artifacts.sort();

        let parent_description = task.parent_id.as_ref().and_then(|parent_id| {
            self.runtimes
                .lock()
                .get(workflow_id.as_str())
                .and_then(|rt| rt.task(parent_id.as_str()))
                .map(|t| t.description.clone())
        });

        let fixtures = task
            .metadata
            .get("fixtures")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        DispatchRequest {
            correlation_id: correlation_id.clone(),
            workflow_id: workflow_id.clone(),
            task: task.clone(),
            attempt,
            parent_description,
            failure_class: task.branch_reason.map(branch_reason_to_failure_class),
            fix_hint: None,
            input_artifacts,
            fixtures,
        }
    }

    // -- result handling ---------------------------------------------

    /// Resolve one dispatch outcome into zero or more follow-up
    /// (task, attempt, extra inputs) items for the next round — a retry,
    /// a newly synthesized branch, or a post-branch revalidation of the
    /// root task.
    async fn resolve_outcome(
        &self,
        workflow_id: &WorkflowId,
        correlation_id: &CorrelationId,
        outcome: DispatchOutcome,
    ) -> Result<Vec<(TaskId, u32, Vec<String>)>, RuntimeError> {
        let DispatchOutcome {
            task_id,
            attempt,
            result,
        } = outcome;

        match result {
            Err(_elapsed) => {
                self.fail(
                    workflow_id,
                    correlation_id,
                    &task_id,
                    attempt,
                    vec!["timeout".to_string()],
                    Some(FailureClass::Timeout),
                    true,
                )
                .await
            }
            Ok(Err(adapter_err)) => {
                self.fail(
                    workflow_id,
                    correlation_id,
                    &task_id,
                    attempt,
                    vec![adapter_err.to_string()],
                    None,
                    true,
                )
                .await
            }
            Ok(Ok(event)) => match event {
                Event::TaskCompleted { ref artifacts, .. } => {
                    self.emit(correlation_id, event.clone()).await?;
                    self.settle_success(workflow_id, correlation_id, &task_id, attempt, artifacts)
                        .await
                }
                Event::TestPassed { .. } => {
                    self.emit(correlation_id, event.clone()).await?;
                    // Acceptance passing is reported alongside task:completed
                    // so persisted task state transitions to completed too
                    // (`MaterializedState::apply_event` treats test:passed
                    // itself as a no-op).
                    self.emit(
                        correlation_id,
                        Event::TaskCompleted {
                            workflow_id: workflow_id.clone(),
                            task_id: task_id.clone(),
                            attempt,
                            artifacts: Vec::new(),
                            metrics: None,
                        },
                    )
                    .await?;
                    self.settle_success(workflow_id, correlation_id, &task_id, attempt, &[])
                        .await
                }
                Event::TaskFailed { ref failures, .. } => {
                    self.emit(correlation_id, event.clone()).await?;
                    self.fail(workflow_id, correlation_id, &task_id, attempt, failures.clone(), None, false)
                        .await
                }
                Event::TestFailed { ref failures, .. } => {
                    self.emit(correlation_id, event.clone()).await?;
                    self.fail(workflow_id, correlation_id, &task_id, attempt, failures.clone(), None, true)
                        .await
                }
                other => Err(RuntimeError::Adapter(AdapterError::Upstream(format!(
                    "unexpected result event from worker adapter: {}",
                    other.name()
                )))),
            },
        }
    }

    async fn settle_success(
        &self,
        workflow_id: &WorkflowId,
        correlation_id: &CorrelationId,
        task_id: &TaskId,
        attempt: u32,
        artifacts: &[ArtifactRef],
    ) -> Result<Vec<(TaskId, u32, Vec<String>)>, RuntimeError> {
        let committed = self
            .commit_artifacts(workflow_id, correlation_id, task_id, attempt, artifacts)
            .await?;
        if !committed {
            // spec §4.4 step 1 / §8 scenario 6: a secret-scan rejection (or
            // any other commit failure) does not synthesize a branch — the
            // content itself was produced, the commit is what failed.
            let root_id = self.root_of(workflow_id, task_id.as_str())?;
            self.escalate_terminal(workflow_id, correlation_id, &root_id, attempt)
                .await?;
            return Ok(Vec::new());
        }

        let is_branch = self
            .runtime_task(workflow_id, task_id.as_str())?
            .map(|t| t.parent_id.is_some())
            .unwrap_or(false);
        if !is_branch {
            return Ok(Vec::new());
        }

        // spec §4.6 step 5: "On branch completion, re-run the parent's
        // acceptance tests once." `Task::acceptance` descriptors aren't
        // independently executable by any adapter here — the validate
        // role's sandbox run already encodes acceptance via its test
        // files — so revalidation is implemented as a fresh dispatch of
        // the root task itself, fed the branch's produced artifacts.
        let root_id = self.root_of(workflow_id, task_id.as_str())?;
        let branch_artifacts = {
            let state = self.state.lock();
            state
                .get_workflow(workflow_id.as_str())
                .and_then(|w| w.task_state(task_id.as_str()))
                .map(|s| s.produced_artifacts.clone())
                .unwrap_or_default()
        };
        let root_attempt = self.next_attempt(workflow_id, &root_id)?;
        Ok(vec![(TaskId::new(root_id), root_attempt, branch_artifacts)])
    }

    #[allow(clippy::too_many_arguments)]
    async fn fail(
        &self,
        workflow_id: &WorkflowId,
        correlation_id: &CorrelationId,
        task_id: &TaskId,
        attempt: u32,
        failures: Vec<String>,
        forced_class: Option<FailureClass>,
        emit_task_failed: bool,
    ) -> Result<Vec<(TaskId, u32, Vec<String>)>, RuntimeError> {
        if emit_task_failed {
            self.emit(
                correlation_id,
                Event::TaskFailed {
                    workflow_id: workflow_id.clone(),
                    task_id: task_id.clone(),
                    attempt,
                    failures: failures.clone(),
                    logs_path: None,
                },
            )
            .await?;
        }

        let task = self
            .runtime_task(workflow_id, task_id.as_str())?
            .ok_or_else(|| RuntimeError::TaskNotFound(task_id.as_str().to_string()))?;

        // spec §4.6 step 1: retry before considering a branch.
        if attempt < task.max_retries {
            return Ok(vec![(task_id.clone(), attempt + 1, Vec::new())]);
        }

        let class = forced_class.unwrap_or_else(|| classify_failure(&failures));
        // spec §7: `sandbox-error` (infrastructure fault) retries, then
        // escalates directly — it never earns a branch, since the failure
        // isn't in the produced content.
        let is_infra_fault = failures.first().map(String::as_str) == Some("sandbox-error");

        let (root_id, tip_id, tip_depth) = {
            let runtimes = self.runtimes.lock();
            let rt = runtimes
                .get(workflow_id.as_str())
                .ok_or_else(|| RuntimeError::WorkflowNotFound(workflow_id.as_str().to_string()))?;
            let root = rt.root_of(task_id.as_str());
            let tip = rt.tip_of(&root);
            let depth = rt.task(&tip).map(|t| t.debug_depth).unwrap_or(0);
            (root, tip, depth)
        };

        if !is_infra_fault && tip_depth < self.config.max_branch_depth {
            let branch_task = self
                .synthesize_branch(workflow_id, correlation_id, &tip_id, tip_depth, class, &failures, &task)
                .await?;
            Ok(vec![(branch_task.id, 1, Vec::new())])
        } else {
            self.escalate_terminal(workflow_id, correlation_id, &root_id, attempt)
                .await?;
            Ok(Vec::new())
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn synthesize_branch(
        &self,
        workflow_id: &WorkflowId,
        correlation_id: &CorrelationId,
        tip_id: &str,
        tip_depth: u32,
        class: FailureClass,
        failures: &[String],
        failing_task: &Task,
    ) -> Result<Task, RuntimeError> {
        let branch_reason: BranchReason = class.into();
        let routed_role = routed_role_for(failing_task, branch_reason);
        let fix_hint = fix_hint_for(failures);

        let branch_id = {
            let mut state = self.state.lock();
            let workflow = state
                .workflows
                .get_mut(workflow_id.as_str())
                .ok_or_else(|| RuntimeError::WorkflowNotFound(workflow_id.as_str().to_string()))?;
            workflow.next_branch_id(tip_id)
        };

        let description = format!(
            "{}\n\nFailure class: {class}\n\nFix hint: {fix_hint}",
            structured_failure_summary(failures)
        );

        let branch_task = Task {
            id: TaskId::new(branch_id),
            title: format!("fix: {}", failing_task.title),
            description,
            role: routed_role,
            priority: failing_task.priority,
            deps: Vec::new(),
            acceptance: failing_task.acceptance.clone(),
            max_retries: failing_task.max_retries,
            timeout: failing_task.timeout,
            parent_id: Some(TaskId::new(tip_id.to_string())),
            branch_reason: Some(branch_reason),
            debug_depth: tip_depth + 1,
            failure_routing: failing_task.failure_routing.clone(),
            metadata: failing_task.metadata.clone(),
        };

        self.runtimes
            .lock()
            .get_mut(workflow_id.as_str())
            .ok_or_else(|| RuntimeError::WorkflowNotFound(workflow_id.as_str().to_string()))?
            .insert_branch(branch_task.clone());

        self.emit(
            correlation_id,
            Event::TaskBranched {
                workflow_id: workflow_id.clone(),
                parent_task_id: TaskId::new(tip_id.to_string()),
                branch_task_id: branch_task.id.clone(),
                reason: class,
                debug_depth: branch_task.debug_depth,
            },
        )
        .await?;

        Ok(branch_task)
    }

    /// Mark `root_id` terminally failed and block its transitive
    /// dependents (spec §4.6 step 5 "mark parent failed terminally and
    /// escalate"). `TaskEscalated` is emitted before `TaskFailed` for the
    /// root itself: `MaterializedState::apply_event` sets status=blocked
    /// for an escalation, so the order matters to leave the root `failed`
    /// rather than `blocked`.
    async fn escalate_terminal(
        &self,
        workflow_id: &WorkflowId,
        correlation_id: &CorrelationId,
        root_id: &str,
        attempt: u32,
    ) -> Result<(), RuntimeError> {
        let dependents = {
            let runtimes = self.runtimes.lock();
            runtimes
                .get(workflow_id.as_str())
                .ok_or_else(|| RuntimeError::WorkflowNotFound(workflow_id.as_str().to_string()))?
                .transitive_dependents_of(root_id)
        };

        for dependent in &dependents {
            self.emit(
                correlation_id,
                Event::TaskEscalated {
                    workflow_id: workflow_id.clone(),
                    task_id: dependent.clone(),
                    reason: format!("blocked: dependency {root_id} failed terminally"),
                },
            )
            .await?;
        }

        self.emit(
            correlation_id,
            Event::TaskEscalated {
                workflow_id: workflow_id.clone(),
                task_id: TaskId::new(root_id.to_string()),
                reason: "branch depth exhausted; escalating for human attention".to_string(),
            },
        )
        .await?;
        self.emit(
            correlation_id,
            Event::TaskFailed {
                workflow_id: workflow_id.clone(),
                task_id: TaskId::new(root_id.to_string()),
                attempt,
                failures: vec!["branch depth exhausted".to_string()],
                logs_path: None,
            },
        )
        .await?;

        Ok(())
    }

    async fn commit_artifacts(
        &self,
        workflow_id: &WorkflowId,
        correlation_id: &CorrelationId,
        task_id: &TaskId,
        attempt: u32,
        artifacts: &[ArtifactRef],
    ) -> Result<bool, RuntimeError> {
        if artifacts.is_empty() {
            return Ok(true);
        }

        let mut files = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            let path = PathBuf::from(&artifact.path);
            match tokio::fs::read(&path).await {
                Ok(contents) => {
                    let relative_path = path
                        .file_name()
                        .map(|f| f.to_string_lossy().into_owned())
                        .unwrap_or_else(|| artifact.path.clone());
                    files.push(ArtifactFile {
                        relative_path,
                        contents,
                    });
                }
                Err(io_err) => {
                    self.emit(
                        correlation_id,
                        Event::ArtifactCommitRejected {
                            workflow_id: workflow_id.clone(),
                            task_id: task_id.clone(),
                            reason: format!("could not read staged artifact {}: {io_err}", artifact.path),
                        },
                    )
                    .await?;
                    return Ok(false);
                }
            }
        }

        let request = CommitRequest {
            workflow_id: workflow_id.as_str().to_string(),
            task_id: task_id.as_str().to_string(),
            files,
            metadata: serde_json::json!({ "attempt": attempt }),
            correlation_id: correlation_id.as_str().to_string(),
            prompt_hash: None,
        };

        let store = self.artifact_store.clone();
        let outcome = tokio::task::spawn_blocking(move || store.commit(request))
            .await
            .map_err(|e| RuntimeError::Join(e.to_string()))?;

        match outcome {
            Ok(result) => {
                self.emit(
                    correlation_id,
                    Event::ArtifactCommitted {
                        workflow_id: workflow_id.clone(),
                        task_id: task_id.clone(),
                        correlation_id: correlation_id.clone(),
                        branch: result.branch,
                        revision_id: result.revision_id,
                        pushed: result.pushed,
                    },
                )
                .await?;
                Ok(true)
            }
            Err(err) => {
                self.emit(
                    correlation_id,
                    Event::ArtifactCommitRejected {
                        workflow_id: workflow_id.clone(),
                        task_id: task_id.clone(),
                        reason: err.to_string(),
                    },
                )
                .await?;
                Ok(false)
            }
        }
    }

    // -- finalize ----------------------------------------------------

    async fn finalize(&self, workflow_id: &WorkflowId, correlation_id: &CorrelationId) -> Result<(), RuntimeError> {
        if self.is_cancelled(workflow_id) {
            return Ok(());
        }

        let any_failed = {
            let state = self.state.lock();
            let workflow = state
                .get_workflow(workflow_id.as_str())
                .ok_or_else(|| RuntimeError::WorkflowNotFound(workflow_id.as_str().to_string()))?;
            workflow
                .task_states
                .values()
                .any(|s| s.status == TaskStatus::Failed)
        };

        if any_failed {
            self.emit(
                correlation_id,
                Event::WorkflowFailed {
                    workflow_id: workflow_id.clone(),
                },
            )
            .await?;
        } else {
            self.emit(
                correlation_id,
                Event::WorkflowCompleted {
                    workflow_id: workflow_id.clone(),
                },
            )
            .await?;
        }
        Ok(())
    }

    // -- small helpers -------------------------------------------------

    async fn emit(&self, correlation_id: &CorrelationId, event: Event) -> Result<(), RuntimeError> {
        self.state.lock().apply_event(&event);
        let envelope = Envelope::new(
            EventId::new(self.id_gen.next()),
            correlation_id.clone(),
            self.source.clone(),
            self.clock.epoch_ms(),
            event.clone(),
        );
        let channel = envelope.channel();
        self.bus.publish(channel, envelope).await?;
        Ok(())
    }

    fn persist(&self, workflow_id: &WorkflowId) -> Result<(), RuntimeError> {
        let workflow = {
            let state = self.state.lock();
            state
                .get_workflow(workflow_id.as_str())
                .cloned()
                .ok_or_else(|| RuntimeError::WorkflowNotFound(workflow_id.as_str().to_string()))?
        };
        self.state_store.save_workflow(&workflow)?;
        Ok(())
    }

    fn correlation_id_of(&self, workflow_id: &WorkflowId) -> Result<CorrelationId, RuntimeError> {
        let state = self.state.lock();
        state
            .get_workflow(workflow_id.as_str())
            .map(|w| w.correlation_id.clone())
            .ok_or_else(|| RuntimeError::WorkflowNotFound(workflow_id.as_str().to_string()))
    }

    fn runtime_task(&self, workflow_id: &WorkflowId, task_id: &str) -> Result<Option<Task>, RuntimeError> {
        let runtimes = self.runtimes.lock();
        let rt = runtimes
            .get(workflow_id.as_str())
            .ok_or_else(|| RuntimeError::WorkflowNotFound(workflow_id.as_str().to_string()))?;
        Ok(rt.task(task_id).cloned())
    }

    fn root_of(&self, workflow_id: &WorkflowId, task_id: &str) -> Result<String, RuntimeError> {
        let runtimes = self.runtimes.lock();
        let rt = runtimes
            .get(workflow_id.as_str())
            .ok_or_else(|| RuntimeError::WorkflowNotFound(workflow_id.as_str().to_string()))?;
        Ok(rt.root_of(task_id))
    }

    fn next_attempt(&self, workflow_id: &WorkflowId, task_id: &str) -> Result<u32, RuntimeError> {
        let state = self.state.lock();
        let current = state
            .get_workflow(workflow_id.as_str())
            .and_then(|w| w.task_state(task_id))
            .map(|s| s.attempts)
            .unwrap_or(0);
        Ok(current + 1)
    }

    /// Tasks whose deps are all `completed` and which haven't been
    /// dispatched yet, in topological-tie-break order (spec §4.6 step 2:
    /// "within a rank, order by priority ascending, ties broken by task
    /// ID").
    fn ready_task_ids(&self, workflow_id: &WorkflowId) -> Result<Vec<TaskId>, RuntimeError> {
        let runtimes = self.runtimes.lock();
        let rt = runtimes
            .get(workflow_id.as_str())
            .ok_or_else(|| RuntimeError::WorkflowNotFound(workflow_id.as_str().to_string()))?;
        let state = self.state.lock();
        let workflow = state
            .get_workflow(workflow_id.as_str())
            .ok_or_else(|| RuntimeError::WorkflowNotFound(workflow_id.as_str().to_string()))?;

        let mut ready: Vec<&Task> = rt
            .tasks
            .values()
            .filter(|t| {
                // Branch tasks are only ever driven through the scheduler's
                // `forced` queue (spec §4.6 step 4) — left `Pending` here
                // with empty `deps`, so without this guard the readiness
                // scan would pick one up a second time the round it is
                // synthesized and dispatch it concurrently with `forced`.
                if t.parent_id.is_some() {
                    return false;
                }
                let status = workflow
                    .task_state(t.id.as_str())
                    .map(|s| s.status)
                    .unwrap_or(TaskStatus::Pending);
                if status != TaskStatus::Pending {
                    return false;
                }
                t.deps.iter().all(|dep| {
                    workflow
                        .task_state(dep.as_str())
                        .map(|s| s.status == TaskStatus::Completed)
                        .unwrap_or(false)
                })
            })
            .collect();

        ready.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.as_str().cmp(b.id.as_str())));
        Ok(ready.into_iter().map(|t| t.id.clone()).collect())
    }
}

fn branch_reason_to_failure_class(reason: BranchReason) -> FailureClass {
    match reason {
        BranchReason::ImplementationBug => FailureClass::ImplementationBug,
        BranchReason::SpecMismatch => FailureClass::SpecMismatch,
        BranchReason::Timeout => FailureClass::Timeout,
        BranchReason::MissingDependency => FailureClass::MissingDependency,
        BranchReason::FlakyTest => FailureClass::FlakyTest,
        BranchReason::Unknown => FailureClass::Unknown,
    }
}

/// Default class -> role routing, honoring a task's own override first
/// (spec §4.6 step 3).
fn routed_role_for(task: &Task, reason: BranchReason) -> WorkerRole {
    if let Some(role) = task.failure_routing.get(&reason) {
        return *role;
    }
    match reason {
        BranchReason::ImplementationBug | BranchReason::Timeout => WorkerRole::Implement,
        BranchReason::SpecMismatch => WorkerRole::Design,
        BranchReason::MissingDependency | BranchReason::FlakyTest | BranchReason::Unknown => WorkerRole::Repair,
    }
}

/// Classify a failure (spec §4.6 step 2): prefer the sandbox's structured
/// `ResultClass` tag (carried as `failures[0]` by
/// `tf_adapters::SandboxWorkerAdapter`) over the stderr heuristic.
fn classify_failure(failures: &[String]) -> FailureClass {
    match failures.first().map(String::as_str) {
        Some("timeout") => FailureClass::Timeout,
        Some("static-failed") => FailureClass::ImplementationBug,
        Some("schema-invalid") | Some("sandbox-error") => FailureClass::Unknown,
        _ => FailureClass::from_stderr_heuristic(&failures.join("\n")),
    }
}

/// Fix-strategy hints for known slow-code anti-patterns (spec §4.7).
const FIX_HINTS: &[(&str, &str)] = &[
    ("while True", "Bound loops with MAX_ITERATIONS; add break on condition."),
    ("while(true)", "Bound loops with MAX_ITERATIONS; add break on condition."),
    ("iterrows", "Vectorize; cap dataset size; avoid nested row loops."),
    ("socket.connect", "Sandbox has no network; use injected data source."),
    ("requests.get", "Sandbox has no network; use injected data source."),
    ("urlopen", "Sandbox has no network; use injected data source."),
];

fn fix_hint_for(failures: &[String]) -> String {
    let joined = failures.join("\n");
    for (pattern, hint) in FIX_HINTS {
        if joined.contains(pattern) {
            return (*hint).to_string();
        }
    }
    "Inspect the failure detail above and address the root cause directly.".to_string()
}

fn structured_failure_summary(failures: &[String]) -> String {
    if failures.is_empty() {
        "No structured failure detail available.".to_string()
    } else {
        format!("Failure detail:\n{}", failures.join("\n"))
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
