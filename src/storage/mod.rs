//! Durable JSON state under `<workspace>/state`.
//!
//! Every file is rewritten whole through [`atomic::write_atomic`]; loads are
//! soft and reset to defaults on corruption.

pub mod atomic;
pub mod history;
pub mod journal;
pub mod state;

pub use history::{ActionHistoryRecord, HistoryKind, HistoryStore};
pub use journal::{
    ActionLogEntry, ActivitySnapshot, Goal, GoalPriority, Journal, JournalStore, LearningEntry,
    LearningSource,
};
pub use state::{AgentState, ErrorEntry, StateStore};
