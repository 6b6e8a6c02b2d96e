//! Quotation workflow state machine.
//!
//! Milestones (approval, purchase order, invoice, payment) are layered on top
//! of the quotation status. [`engine`] decides which actions are allowed and
//! what they produce; [`progress`] derives the display statuses and removal
//! warnings shown to users.

pub mod action;
pub mod engine;
pub mod progress;

pub use action::{ActionKind, Document, WorkflowAction, WorkflowError};
pub use engine::{apply, check, check_replacement, permitted_actions};
pub use progress::{removal_impact, MilestoneStatus, RemovalImpact, WorkflowProgress};
