//! # Execution State Machine
//!
//! Lifecycle states for ledger executions with monotonic, one-directional
//! transition rules. The ledger stores enforce these rules on every write so
//! no state can regress and terminal states are never re-entered.

pub mod states;

pub use states::ExecutionState;
