pub mod calendar;
pub mod error;
pub mod events;
pub mod guard;
pub mod policy;
pub mod workflow;
