//! `groundwork facts` - print the observed state of every declared
//! resource, one line each.

use anyhow::Result;
use convergence::{facts, Manifest};
use hostkit::LiveHost;
use std::path::Path;

use crate::ui;

pub fn run(manifest_path: &Path) -> Result<u8> {
    let manifest = Manifest::load(manifest_path)?;
    let host = LiveHost::new();

    let facts = facts::collect(&host, &manifest);
    ui::header(&format!("Facts ({})", facts.len()));
    for (id, fact) in &facts {
        ui::kv(&id.to_string(), &fact.to_string());
    }
    Ok(convergence::EXIT_OK)
}
