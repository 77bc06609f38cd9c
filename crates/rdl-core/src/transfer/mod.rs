//! Transfer Engine
//!
//! One resumable HTTP download per [`Transfer`]:
//! - Resume offset taken from the existing local file
//! - `Range: bytes=<offset>-` on every request
//! - Fixed-size streaming writes with a progress hook
//! - Cooperative pause from the progress hook
//! - Exactly one [`TransferOutcome`] per transfer

mod config;
mod range;
mod task;

pub use config::*;
pub use task::*;
