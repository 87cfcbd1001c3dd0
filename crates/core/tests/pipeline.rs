mod common;

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use symfetch_core::config::PipelineConfig;
use symfetch_core::pipeline::run_pipeline_with;
use symfetch_core::process::CommandRunner;
use symfetch_core::{SymbolError, SymbolResult};
use tempfile::tempdir;

struct RecordingRunner {
    lines: Vec<String>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl RecordingRunner {
    fn new(lines: &[&str]) -> Self {
        Self { lines: lines.iter().map(|l| l.to_string()).collect(), calls: Mutex::new(vec![]) }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, _program: &str, args: &[String]) -> SymbolResult<Vec<String>> {
        self.calls.lock().unwrap().push(args.to_vec());
        Ok(self.lines.clone())
    }
}

fn config(root: PathBuf, cache_directory: Option<PathBuf>) -> PipelineConfig {
    PipelineConfig {
        root,
        cache_directory,
        timeout: Duration::from_secs(5),
        dotnet: "dotnet".into(),
        cancellation: None,
    }
}

#[test]
fn empty_directory_never_invokes_the_tool() {
    let temp = tempdir().unwrap();
    let runner = RecordingRunner::new(&[]);
    let result = run_pipeline_with(&config(temp.path().to_path_buf(), None), &runner).unwrap();
    assert!(result.local_symbols.is_empty());
    assert!(result.embedded_symbols.is_empty());
    assert!(result.to_download.is_empty());
    assert!(result.missing_symbols.is_empty());
    assert!(result.found_symbols.is_empty());
    assert_eq!(runner.call_count(), 0);
}

#[test]
fn only_modules_needing_symbols_are_fetched() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("publish");
    common::write_plain(&root.join("Local.dll"));
    fs::write(root.join("Local.pdb"), b"pdb").unwrap();
    common::write_embedded(&root.join("Embedded.dll"));
    common::write_plain(&root.join("runtimes").join("Found.dll"));
    common::write_plain(&root.join("Missing.dll"));

    let found = root.join("runtimes").join("Found.pdb").display().to_string();
    let written = format!("Writing: {found}");
    let runner = RecordingRunner::new(&[
        "ERROR: Not Found: Found.pdb - Could not find symbols on nuget",
        "ERROR: Not Found: Missing.pdb - Could not find symbols",
        "ERROR: Not Found: Missing.pdb - Could not find symbols",
        written.as_str(),
    ]);

    let result = run_pipeline_with(&config(root.clone(), None), &runner).unwrap();

    assert_eq!(result.local_symbols, vec![root.join("Local.dll")]);
    assert_eq!(result.embedded_symbols, vec![root.join("Embedded.dll")]);
    assert_eq!(result.to_download.len(), 2);
    assert_eq!(result.missing_symbols, vec!["Missing.pdb"]);
    assert_eq!(result.found_symbols, vec![found]);

    let calls = runner.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let args = &calls[0];
    assert!(!args.contains(&"--cache-directory".to_string()));
    assert!(args.contains(&root.join("Missing.dll").display().to_string()));
    assert!(args.contains(&root.join("runtimes").join("Found.dll").display().to_string()));
    assert!(!args.contains(&root.join("Local.dll").display().to_string()));
    assert!(!args.contains(&root.join("Embedded.dll").display().to_string()));
}

#[test]
fn cache_directory_is_created_and_passed_through() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("publish");
    common::write_plain(&root.join("Lib.dll"));
    let cache = temp.path().join("cache").join("symbols");

    let runner = RecordingRunner::new(&[]);
    let result = run_pipeline_with(&config(root, Some(cache.clone())), &runner).unwrap();

    assert!(cache.is_dir());
    assert_eq!(result.cache_directory.as_ref(), Some(&cache));
    let calls = runner.calls.lock().unwrap();
    let idx = calls[0].iter().position(|a| a == "--cache-directory").expect("cache flag");
    assert_eq!(calls[0][idx + 1], cache.display().to_string());
}

#[test]
fn unreadable_module_fails_before_fetching() {
    let temp = tempdir().unwrap();
    common::write_plain(&temp.path().join("Good.dll"));
    fs::write(temp.path().join("Broken.dll"), b"garbage").unwrap();

    let runner = RecordingRunner::new(&[]);
    let err = run_pipeline_with(&config(temp.path().to_path_buf(), None), &runner).unwrap_err();
    assert!(matches!(err, SymbolError::BinaryRead { .. }), "unexpected error: {err:?}");
    assert_eq!(runner.call_count(), 0);
}

#[test]
fn result_serializes_for_hosts() {
    let temp = tempdir().unwrap();
    let runner = RecordingRunner::new(&[]);
    let result = run_pipeline_with(&config(temp.path().to_path_buf(), None), &runner).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("missing_symbols").is_some());
    assert!(json.get("found_symbols").is_some());
    assert!(json.get("elapsed_ms").is_some());
}
