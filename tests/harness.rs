use anyhow::{Context, Result, ensure};
use std::path::Path;
use std::process::Command;

use kotoba::{Config, Interpreter};
use test_support::{Case, CaseClass, load_cases, normalize_output};

const PROGRAMS_DIR: &str = "tests/programs";

fn config_for(case: &Case) -> Config {
    let config = Config::default().with_module_root(&case.dir);
    match case.spec.max_depth {
        Some(max_depth) => config.with_max_depth(max_depth),
        None => config,
    }
}

/// Runs a case in-process and returns `(stdout, stderr)` the way the binary
/// would print them.
fn run_in_process(case: &Case) -> Result<(String, String)> {
    let source = case.source()?;
    let mut interpreter = Interpreter::with_config(config_for(case));
    interpreter.run_source(&source);
    let stdout = interpreter.take_output().join("\n");
    let stderr = interpreter.error_message().unwrap_or_default();
    Ok((stdout, stderr))
}

fn check_case(case: &Case, stdout: &str, stderr: &str, exit_code: Option<i32>) -> Result<()> {
    if let Some(exit_code) = exit_code {
        ensure!(
            exit_code == case.spec.expected.exit_code,
            "Case {} exited with {exit_code}, expected {}; stderr: {stderr}",
            case.name,
            case.spec.expected.exit_code
        );
    }

    match case.spec.class.phase_label() {
        None => ensure!(
            stderr.trim().is_empty(),
            "Case {} reported an error: {stderr}",
            case.name
        ),
        Some(phase) => ensure!(
            stderr.contains(&format!("{phase}: ")),
            "Case {} expected a {phase} diagnostic, got '{stderr}'",
            case.name
        ),
    }

    if let Some(expected) = case.expected_stdout()? {
        assert_eq!(
            normalize_output(stdout),
            normalize_output(&expected),
            "Output mismatch for {}",
            case.name
        );
    }
    if let Some(fragment) = case.expected_stderr_fragment()? {
        ensure!(
            stderr.contains(&fragment),
            "Expected error containing '{fragment}' in {}, got '{stderr}'",
            case.name
        );
    }
    Ok(())
}

#[test]
fn runs_programs_in_process() -> Result<()> {
    for case in load_cases(Path::new(PROGRAMS_DIR))? {
        case.validate()?;
        let (stdout, stderr) = run_in_process(&case)?;
        check_case(&case, &stdout, &stderr, None)?;
    }
    Ok(())
}

#[test]
fn runs_programs_through_binary() -> Result<()> {
    for case in load_cases(Path::new(PROGRAMS_DIR))? {
        let mut command = Command::new(env!("CARGO_BIN_EXE_kotoba"));
        command.arg(&case.program_path);
        if let Some(max_depth) = case.spec.max_depth {
            command.arg("--max-depth").arg(max_depth.to_string());
        }
        let output = command
            .output()
            .with_context(|| format!("Running binary for {}", case.name))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        check_case(&case, &stdout, &stderr, output.status.code())?;
    }
    Ok(())
}

#[test]
fn failing_classes_are_all_covered() -> Result<()> {
    let cases = load_cases(Path::new(PROGRAMS_DIR))?;
    for class in [
        CaseClass::RuntimeSuccess,
        CaseClass::SyntaxError,
        CaseClass::RuntimeError,
        CaseClass::UncaughtException,
    ] {
        ensure!(
            cases.iter().any(|case| case.spec.class == class),
            "No case exercises {class:?}"
        );
    }
    Ok(())
}
