pub mod check;
pub mod classify;
pub mod edge;
pub mod token;
