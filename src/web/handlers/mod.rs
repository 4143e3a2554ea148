pub mod discovery;
pub mod executions;
pub mod health;
