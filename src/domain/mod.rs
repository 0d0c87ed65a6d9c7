//! Domain layer - the intake conversation model.

pub mod foundation;
pub mod intake;
