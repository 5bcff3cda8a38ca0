//! `groundwork plan` - compute and print the plan without executing it.

use anyhow::Result;
use convergence::{facts, planner, Manifest};
use hostkit::LiveHost;
use std::path::Path;

use crate::ui;

pub fn run(manifest_path: &Path) -> Result<u8> {
    let manifest = Manifest::load(manifest_path)?;
    let host = LiveHost::new();

    let facts = facts::collect(&host, &manifest);
    let plan = planner::build(&manifest, &facts)?;

    ui::print_plan(&plan);
    Ok(convergence::EXIT_OK)
}
