use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

pub const PROGRAM_FILE: &str = "program.ktb";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaseClass {
    RuntimeSuccess,
    SyntaxError,
    RuntimeError,
    UncaughtException,
}

impl CaseClass {
    /// Diagnostic phase label the failing classes must report.
    pub fn phase_label(self) -> Option<&'static str> {
        match self {
            CaseClass::RuntimeSuccess => None,
            CaseClass::SyntaxError => Some("構文エラー"),
            CaseClass::RuntimeError => Some("実行時エラー"),
            CaseClass::UncaughtException => Some("例外"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BenchConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExpectedOutcome {
    pub exit_code: i32,
    pub stdout_file: Option<String>,
    pub stderr_contains_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CaseSpec {
    pub class: CaseClass,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default)]
    pub bench: BenchConfig,
    pub expected: ExpectedOutcome,
}

#[derive(Debug, Clone)]
pub struct Case {
    pub name: String,
    pub dir: PathBuf,
    pub program_path: PathBuf,
    pub spec: CaseSpec,
}

impl Case {
    pub fn read_text(&self, relative_path: &str) -> Result<String> {
        fs::read_to_string(self.dir.join(relative_path))
            .with_context(|| format!("Reading {} fixture file {}", self.name, relative_path))
    }

    /// Program text with malformed UTF-8 replaced, as the interpreter loads it.
    pub fn source(&self) -> Result<String> {
        let bytes = fs::read(&self.program_path)
            .with_context(|| format!("Reading {} program", self.name))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn expected_stdout(&self) -> Result<Option<String>> {
        self.spec
            .expected
            .stdout_file
            .as_deref()
            .map(|file| self.read_text(file))
            .transpose()
    }

    pub fn expected_stderr_fragment(&self) -> Result<Option<String>> {
        self.spec
            .expected
            .stderr_contains_file
            .as_deref()
            .map(|file| self.read_text(file).map(|text| text.trim().to_string()))
            .transpose()
    }

    /// Checks that the case file is internally consistent before running it.
    pub fn validate(&self) -> Result<()> {
        let expected = &self.spec.expected;
        match self.spec.class {
            CaseClass::RuntimeSuccess => {
                ensure!(
                    expected.exit_code == 0,
                    "Case {} expected exit code must be 0 for runtime_success",
                    self.name
                );
                ensure!(
                    expected.stdout_file.is_some(),
                    "Missing stdout_file in {}",
                    self.name
                );
            }
            _ => {
                ensure!(
                    expected.exit_code == 1,
                    "Case {} expected exit code must be 1 for failing classes",
                    self.name
                );
                ensure!(
                    expected.stderr_contains_file.is_some(),
                    "Missing stderr_contains_file in {}",
                    self.name
                );
            }
        }
        if self.spec.bench.enabled {
            ensure!(
                !self.spec.bench.tags.is_empty(),
                "Case {} has bench enabled but no tags",
                self.name
            );
        }
        Ok(())
    }
}

pub fn load_cases(programs_dir: &Path) -> Result<Vec<Case>> {
    let mut cases = Vec::new();

    for entry in
        fs::read_dir(programs_dir).with_context(|| format!("Reading {}", programs_dir.display()))?
    {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }

        let case_path = path.join("case.yaml");
        if !case_path.exists() {
            continue;
        }

        let program_path = path.join(PROGRAM_FILE);
        ensure!(
            program_path.exists(),
            "Missing {PROGRAM_FILE} for case {}",
            path.display()
        );

        let case_name = path
            .file_name()
            .and_then(|value| value.to_str())
            .map(str::to_string)
            .with_context(|| format!("Invalid case directory name {}", path.display()))?;
        let case_raw = fs::read_to_string(&case_path)
            .with_context(|| format!("Reading {}", case_path.display()))?;
        let spec: CaseSpec = serde_yaml::from_str(&case_raw)
            .with_context(|| format!("Parsing {}", case_path.display()))?;

        cases.push(Case {
            name: case_name,
            dir: path,
            program_path,
            spec,
        });
    }

    ensure!(
        !cases.is_empty(),
        "No test cases found in {}",
        programs_dir.display()
    );
    cases.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(cases)
}

/// Cases opted into benchmarking that carry `tag`.
pub fn bench_cases(programs_dir: &Path, tag: &str) -> Result<Vec<Case>> {
    Ok(load_cases(programs_dir)?
        .into_iter()
        .filter(|case| case.spec.bench.enabled && case.spec.bench.tags.iter().any(|t| t == tag))
        .collect())
}

pub fn normalize_output(output: &str) -> String {
    output.replace("\r\n", "\n").trim_end().to_string()
}
