pub mod diff;
pub mod naming;
