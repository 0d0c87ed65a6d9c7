//! Practice Intake - Conversational client-intake assistant core.
//!
//! This crate implements the intake state machine behind a multi-tenant
//! voice/SMS assistant: stage-driven dialogue, structured field extraction
//! from free-form utterances, crisis and exit-intent detection, and
//! idempotent persistence of the finished intake record.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
