//! photo-intake — photo submissions triaged through image labels and a task board.

pub mod board;
pub mod calls;
pub mod config;
pub mod error;
pub mod labeler;
pub mod requests;
pub mod server;
pub mod store;
pub mod triage;
