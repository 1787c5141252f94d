//! Campaign lifecycle state.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignState {
    Idle,
    Running,
    Paused,
    StopRequested,
    Finished,
    Failed,
}

impl CampaignState {
    pub fn as_str(self) -> &'static str {
        match self {
            CampaignState::Idle => "idle",
            CampaignState::Running => "running",
            CampaignState::Paused => "paused",
            CampaignState::StopRequested => "stop_requested",
            CampaignState::Finished => "finished",
            CampaignState::Failed => "failed",
        }
    }

    /// A worker exists for this state.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            CampaignState::Running | CampaignState::Paused | CampaignState::StopRequested
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CampaignState::Finished | CampaignState::Failed)
    }
}

impl fmt::Display for CampaignState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State cell shared by the controller and its worker.
#[derive(Debug)]
pub(crate) struct StateCell {
    state: RwLock<CampaignState>,
}

impl StateCell {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CampaignState::Idle),
        }
    }

    pub fn get(&self) -> CampaignState {
        *self.state.read()
    }

    /// Move to `to` if the current state is one of `from`. Returns the previous state on
    /// success.
    pub fn transition(&self, from: &[CampaignState], to: CampaignState) -> Option<CampaignState> {
        let mut state = self.state.write();
        if from.contains(&*state) {
            let previous = *state;
            *state = to;
            Some(previous)
        } else {
            None
        }
    }

    /// Unconditional move, used by the worker for terminal states.
    pub fn set(&self, to: CampaignState) -> CampaignState {
        std::mem::replace(&mut *self.state.write(), to)
    }
}
