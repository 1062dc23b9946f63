// handlers/mod.rs - Page, session and service handlers
//
// Page handlers stand in for the application's screens. They render a small
// JSON description of the page so both gates can be exercised end to end;
// the gates decide whether they run at all.

pub mod pages;
pub mod service;
pub mod session;
