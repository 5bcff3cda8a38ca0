//! # Hostkit
//!
//! Real-host backends for the convergence engine: Debian packages via
//! `dpkg-query`/`apt-get`, services via `systemctl`, file content
//! comparison via BLAKE3, all behind timeout-bounded subprocess
//! execution.

pub mod backend;
pub mod checksum;
pub mod command;
pub mod live;

pub use command::{classify, run, run_checked, CmdOutput};
pub use live::LiveHost;
