//! Human-readable rendering of runs and statistics.

use std::fmt::Write as _;

use crate::{LoopRun, Stage, StageStatus, Stats};

fn status_marker(status: StageStatus) -> &'static str {
    match status {
        StageStatus::Completed => "✓",
        StageStatus::Error => "✗",
        StageStatus::Running => "…",
        StageStatus::Skipped => "-",
        StageStatus::Idle => " ",
    }
}

/// Multi-line stage table for one run.
pub fn render_run(run: &LoopRun) -> String {
    let mut out = String::new();
    let duration = run
        .duration_ms()
        .map_or_else(|| "-".to_string(), |ms| format!("{ms} ms"));
    let _ = writeln!(
        out,
        "Run {} ({}) {} in {duration}",
        run.id,
        run.trigger,
        run.overall_status.as_str()
    );

    for (index, result) in run.stages.iter().enumerate() {
        let stage_duration = result
            .duration_ms
            .map_or_else(|| "-".to_string(), |ms| format!("{ms} ms"));
        let _ = writeln!(
            out,
            "  {} {index} {:<9} {:<9} {:>8}  {}",
            status_marker(result.status),
            result.stage.label(),
            result.status.as_str(),
            stage_duration,
            result.summary
        );
        for line in &result.details {
            let _ = writeln!(out, "        · {line}");
        }
    }
    out
}

/// One-line summary used while watching auto-triggered runs.
pub fn render_run_line(run: &LoopRun) -> String {
    let settled = run
        .stages
        .iter()
        .filter(|r| r.status == StageStatus::Completed)
        .count();
    format!(
        "{} {} ({}) {}/{} stages completed",
        run.id,
        run.overall_status.as_str(),
        run.trigger,
        settled,
        Stage::ALL.len()
    )
}

pub fn render_stats(stats: &Stats) -> String {
    format!(
        "Runs: {} total, {} completed, {} failed, {} aborted\nSuccess rate: {:.0}%\nAverage duration: {} ms",
        stats.total_runs,
        stats.success_runs,
        stats.error_runs,
        stats.aborted_runs,
        stats.success_rate() * 100.0,
        stats.avg_duration_ms
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StageOutput, Trigger};
    use chrono::{Duration, Utc};

    #[test]
    fn test_render_run_lists_every_stage() {
        let start = Utc::now();
        let mut run = LoopRun::new("loop-1-0", Trigger::Alert, start);
        run.begin_stage(Stage::Monitor, start);
        run.complete_stage(
            Stage::Monitor,
            start + Duration::milliseconds(12),
            StageOutput::new("telemetry ok").with_detail("48 nodes"),
        );
        run.begin_stage(Stage::Analyze, start + Duration::milliseconds(12));
        run.fail_stage(Stage::Analyze, start + Duration::milliseconds(20), "boom");
        run.finish(start + Duration::milliseconds(20));

        let text = render_run(&run);
        assert!(text.starts_with("Run loop-1-0 (alert) error in 20 ms"));
        assert!(text.contains("✓ 0 Monitor"));
        assert!(text.contains("✗ 1 Analyze"));
        assert!(text.contains("· 48 nodes"));
        assert_eq!(text.lines().count(), 1 + 6 + 1);

        let line = render_run_line(&run);
        assert!(line.ends_with("1/6 stages completed"));
    }

    #[test]
    fn test_render_stats() {
        let stats = Stats {
            total_runs: 4,
            success_runs: 3,
            error_runs: 1,
            aborted_runs: 0,
            avg_duration_ms: 250,
        };
        let text = render_stats(&stats);
        assert!(text.contains("4 total, 3 completed, 1 failed, 0 aborted"));
        assert!(text.contains("Success rate: 75%"));
        assert!(text.contains("250 ms"));
    }
}
