//! [`Communicator`] – the context handle threaded through every component.
//!
//! The factory hands a clone to the map, the planners and the visualizer at
//! construction.  Clones share the same [`StateMachine`] and [`BackendHub`],
//! which therefore live as long as the longest-lived holder.

use std::sync::Arc;

use glocal_state::StateMachine;

use crate::hub::BackendHub;

#[derive(Clone)]
pub struct Communicator {
    state_machine: Arc<StateMachine>,
    backends: Arc<BackendHub>,
}

impl Communicator {
    pub fn new(state_machine: Arc<StateMachine>, backends: Arc<BackendHub>) -> Self {
        Self {
            state_machine,
            backends,
        }
    }

    pub fn state_machine(&self) -> &Arc<StateMachine> {
        &self.state_machine
    }

    pub fn backends(&self) -> &Arc<BackendHub> {
        &self.backends
    }
}

impl std::fmt::Debug for Communicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Communicator")
            .field("state_machine", &self.state_machine)
            .finish_non_exhaustive()
    }
}
