use crate::state::StateTree;
use crate::task::TaskId;
use crate::task::flow::FlowPosition;

/// A back-navigation point, captured just before a screen is left.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// The flow instance that owned the screen.
    pub flow: TaskId,
    /// The flow's position, with its cursor on the screen.
    pub position: FlowPosition,
    pub state: StateTree,
    pub result: StateTree,
    /// State and result of the loop pass the screen ran in, if any.
    pub iteration: Option<(StateTree, StateTree)>,
    /// Name of the screen being left.
    pub screen: String,
}
