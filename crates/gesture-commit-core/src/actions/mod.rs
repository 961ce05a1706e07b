mod action_error;
mod collaborators;
mod gesture_action;
mod result;
mod runner;

pub use {
    action_error::ActionError,
    collaborators::{CommandExecutor, CommitClient, InputInjector},
    gesture_action::{ActionType, GestureAction, KeyChord, MAX_ACTIONS_PER_GESTURE, Modifier},
    result::{
        ActionOutcome, ActionResult, CommandOutput, CommitRequest, CommitSuccess, ExecutionSummary,
    },
    runner::ActionRunner,
};
