//! Integration tests for structured logging
//!
//! **WHITE-BOX TEST**: This test uses the hidden `logging` module and may
//! break with internal refactors.
//!
//! Verifies that runs and stages are logged with the `run_id`, `stage` and
//! `duration_ms` fields inside the `loop_run` / `stage_execution` spans.

use std::io::Write;
use std::sync::{Arc, Mutex};

use serviceloop::logging::{
    LogFormat, init_tracing, log_run_finished, log_run_started, log_stage_complete,
    log_stage_error, log_stage_start, run_span, stage_span,
};
use serviceloop::{RunStatus, ServiceLoop, SimulatedExecutor, Stage, Trigger};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn test_tracing_initialization() {
    // May fail if another test in this binary installed a subscriber first
    let result = init_tracing(LogFormat::Compact);
    assert!(result.is_ok() || result.is_err());
}

#[test]
fn test_log_format_from_flags() {
    assert_eq!(LogFormat::from_flags(false, false), LogFormat::Compact);
    assert_eq!(LogFormat::from_flags(true, false), LogFormat::Verbose);
    assert_eq!(LogFormat::from_flags(true, true), LogFormat::Json);
}

#[test]
fn test_span_helpers_and_log_functions() {
    let span = run_span("loop-1-0", Trigger::Alert);
    let _run = span.enter();
    log_run_started("loop-1-0", Trigger::Alert);

    let stage = stage_span("loop-1-0", Stage::Verify);
    let _stage = stage.enter();
    log_stage_start("loop-1-0", Stage::Verify);
    log_stage_complete("loop-1-0", Stage::Verify, 1500);
    log_stage_error("loop-1-0", Stage::Optimize, "timed out", 5000);
    log_run_finished("loop-1-0", RunStatus::Error, 6500);
}

#[tokio::test]
async fn test_run_emits_structured_fields() {
    let buffer = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let service = ServiceLoop::new(Arc::new(SimulatedExecutor::new()));
    let run = service.run(Trigger::Manual).await.unwrap();

    let output = buffer.contents();
    assert!(output.contains("Loop run started"));
    assert!(output.contains("Stage completed"));
    assert!(output.contains("Loop run finished"));
    assert!(output.contains(&run.id));
    assert!(output.contains("loop_run"));
    assert!(output.contains("stage_execution"));
    assert!(output.contains("duration_ms"));
}

#[tokio::test]
async fn test_json_lines_carry_stage_fields() {
    let buffer = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_current_span(true)
        .with_writer(buffer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let service = ServiceLoop::new(Arc::new(
        SimulatedExecutor::new().failing_at(Some(Stage::Analyze)),
    ));
    let run = service.run(Trigger::Alert).await.unwrap();
    assert_eq!(run.overall_status, RunStatus::Error);

    let lines: Vec<serde_json::Value> = buffer
        .contents()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    let failure = lines
        .iter()
        .find(|v| v["fields"]["message"] == "Stage failed")
        .expect("stage failure logged");
    assert_eq!(failure["level"], "ERROR");
    assert_eq!(failure["fields"]["stage"], "analyze");
    assert_eq!(failure["fields"]["run_id"], run.id.as_str());
    assert!(failure["fields"]["error"].as_str().unwrap().contains("analyze"));
}
