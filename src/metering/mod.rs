mod controller;

pub use controller::{CallState, EndReason, SessionController};
