//! Stages command implementation

use anyhow::Result;
use serde::Serialize;

use super::json_emit::emit_json;
use crate::{ExitCode, Stage};

#[derive(Serialize)]
struct StageRow {
    index: usize,
    stage: Stage,
    label: &'static str,
    description: &'static str,
}

/// Print the stage table in execution order.
pub fn execute_stages_command(json: bool) -> Result<ExitCode> {
    let rows: Vec<StageRow> = Stage::ALL
        .into_iter()
        .map(|stage| StageRow {
            index: stage.index(),
            stage,
            label: stage.label(),
            description: stage.description(),
        })
        .collect();

    if json {
        println!("{}", emit_json(&rows)?);
    } else {
        for row in &rows {
            println!("{} {:<9} {}", row.index, row.label, row.description);
        }
    }
    Ok(ExitCode::SUCCESS)
}
