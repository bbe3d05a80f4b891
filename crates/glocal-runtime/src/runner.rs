//! [`ExplorationRunner`] – the exploration mission loop.
//!
//! Each [`step`](ExplorationRunner::step) runs the local planner first and
//! hands its result to the visualizer.  When no local viewpoint is worth
//! visiting the global planner searches for a distant frontier.  When that
//! also comes back empty the mission is [`Finished`](ExplorationPhase::Finished).
//! [`run`](ExplorationRunner::run) repeats this, driving the robot through a
//! [`GoalExecutor`] and publishing the reached pose to the
//! [`StateMachine`](glocal_state::StateMachine).
//!
//! # Phases
//!
//! ```text
//! Initializing ─► Ready ─► LocalPlanning ◄─► GlobalPlanning ─► Finished
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use glocal_mapping::{BackendHub, Communicator, Map};
use glocal_planning::{GlobalPlanner, LocalPlanner, LocalPlannerVisualizer, PlannerError};
use glocal_state::{ExplorationPhase, StateMachine};
use glocal_types::{GlocalError, Point, Pose};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{ConfigError, ExplorationConfig, RuntimeConfig};
use crate::factory::{ComponentFactory, FactoryError};

/// Why a [`GoalExecutor`] did not reach its goal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Goal ({x:.2}, {y:.2}, {z:.2}) lies inside an obstacle")]
    GoalInObstacle { x: f64, y: f64, z: f64 },

    #[error("Executor fault: {0}")]
    Fault(String),
}

impl ExecutionError {
    pub fn goal_in_obstacle(goal: &Point) -> Self {
        ExecutionError::GoalInObstacle {
            x: goal.x,
            y: goal.y,
            z: goal.z,
        }
    }
}

/// Moves the robot towards a goal.
pub trait GoalExecutor {
    /// Drive to `goal` and return the pose actually reached.
    fn execute(&mut self, goal: &Point) -> Result<Pose, ExecutionError>;
}

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Factory(#[from] FactoryError),

    #[error("Planning failed: {0}")]
    Planner(#[from] PlannerError),

    #[error("Goal execution failed: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Rejected robot pose: {0}")]
    Pose(#[from] GlocalError),
}

/// Why the mission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Neither planner found anything left to explore.
    Explored,
    /// `max_iterations` planning cycles ran.
    IterationBudget,
    /// The caller raised the stop flag.
    Stopped,
}

/// Outcome of one planning cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    Local(Point),
    Global(Point),
    Finished(FinishReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub iterations: usize,
    pub local_goals: usize,
    pub global_goals: usize,
    pub reason: FinishReason,
}

pub struct ExplorationRunner {
    communicator: Communicator,
    map: Arc<dyn Map>,
    local_planner: Box<dyn LocalPlanner>,
    visualizer: Arc<dyn LocalPlannerVisualizer>,
    global_planner: Box<dyn GlobalPlanner>,
    config: ExplorationConfig,
    iterations: usize,
    finished: Option<FinishReason>,
}

impl ExplorationRunner {
    /// Build every component from `config` and wire them to `backends`.
    ///
    /// The region of interest comes first because the [`StateMachine`] is
    /// created around it; the map follows, then the planners and the
    /// visualizer that share it.
    ///
    /// # Errors
    ///
    /// The first [`FactoryError`] or [`ConfigError`] aborts startup.
    pub fn from_config(
        config: &RuntimeConfig,
        backends: Arc<BackendHub>,
    ) -> Result<Self, RunnerError> {
        let factory = ComponentFactory;
        let roi = factory.create_region_of_interest(&config.source("region_of_interest"))?;
        let state_machine = Arc::new(StateMachine::new(roi));
        let communicator = Communicator::new(state_machine, backends);

        let map = factory.create_map(&config.source("map"), &communicator)?;
        let local_source = config.source("local_planner");
        let local_planner =
            factory.create_local_planner(&local_source, &communicator, map.clone())?;
        let visualizer = factory.create_local_planner_visualizer(&local_source, &communicator);
        let global_planner = factory.create_global_planner(
            &config.source("global_planner"),
            &communicator,
            map.clone(),
        )?;
        let exploration = config.exploration()?;

        Ok(Self::new(
            communicator,
            map,
            local_planner,
            visualizer,
            global_planner,
            exploration,
        ))
    }

    /// Assemble a runner from already built components and mark the mission
    /// [`Ready`](ExplorationPhase::Ready).
    pub fn new(
        communicator: Communicator,
        map: Arc<dyn Map>,
        local_planner: Box<dyn LocalPlanner>,
        visualizer: Arc<dyn LocalPlannerVisualizer>,
        global_planner: Box<dyn GlobalPlanner>,
        config: ExplorationConfig,
    ) -> Self {
        communicator
            .state_machine()
            .transition_to(ExplorationPhase::Ready);
        Self {
            communicator,
            map,
            local_planner,
            visualizer,
            global_planner,
            config,
            iterations: 0,
            finished: None,
        }
    }

    pub fn communicator(&self) -> &Communicator {
        &self.communicator
    }

    pub fn map(&self) -> &Arc<dyn Map> {
        &self.map
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.config.max_iterations = max_iterations;
    }

    fn finish(&mut self, reason: FinishReason) -> StepOutcome {
        if self.finished.is_none() {
            info!(?reason, iterations = self.iterations, "exploration finished");
            self.finished = Some(reason);
        }
        self.communicator
            .state_machine()
            .transition_to(ExplorationPhase::Finished);
        StepOutcome::Finished(self.finished.unwrap_or(reason))
    }

    /// Run one planning cycle.
    ///
    /// # Errors
    ///
    /// [`RunnerError::Planner`] when a planner fails; the mission phase is
    /// left where the failure happened.
    pub fn step(&mut self) -> Result<StepOutcome, RunnerError> {
        if let Some(reason) = self.finished {
            return Ok(StepOutcome::Finished(reason));
        }
        if self.iterations >= self.config.max_iterations {
            warn!(max_iterations = self.config.max_iterations, "iteration budget spent");
            return Ok(self.finish(FinishReason::IterationBudget));
        }
        self.iterations += 1;
        let state_machine = self.communicator.state_machine();

        state_machine.transition_to(ExplorationPhase::LocalPlanning);
        let result = self.local_planner.plan()?;
        self.visualizer.visualize(&result);
        if let Some(goal) = result.goal {
            return Ok(StepOutcome::Local(goal.position));
        }

        state_machine.transition_to(ExplorationPhase::GlobalPlanning);
        if let Some(goal) = self.global_planner.plan()? {
            return Ok(StepOutcome::Global(goal));
        }
        Ok(self.finish(FinishReason::Explored))
    }

    /// Step until finished, sending every goal to `executor`.  `stop` is
    /// checked before each cycle.
    ///
    /// # Errors
    ///
    /// Planner and execution failures end the run early.
    pub fn run(
        &mut self,
        executor: &mut dyn GoalExecutor,
        stop: &AtomicBool,
    ) -> Result<RunSummary, RunnerError> {
        let mut local_goals = 0;
        let mut global_goals = 0;
        loop {
            let outcome = if stop.load(Ordering::SeqCst) {
                self.finish(FinishReason::Stopped)
            } else {
                self.step()?
            };
            let goal = match outcome {
                StepOutcome::Local(goal) => {
                    local_goals += 1;
                    goal
                }
                StepOutcome::Global(goal) => {
                    global_goals += 1;
                    goal
                }
                StepOutcome::Finished(reason) => {
                    return Ok(RunSummary {
                        iterations: self.iterations,
                        local_goals,
                        global_goals,
                        reason,
                    });
                }
            };
            let pose = executor
                .execute(&goal)
                .inspect_err(|e| error!(error = %e, "goal execution failed"))?;
            self.communicator.state_machine().set_current_pose(pose)?;
        }
    }
}
