#![allow(dead_code)]
use std::fs;
use std::path::{Path, PathBuf};

use kotoba::ast::Program;
use kotoba::parser;
use test_support::bench_cases;

const PROGRAMS_DIR: &str = "tests/programs";

/// `(label, program path)` for every case tagged with `tag`.
pub fn workloads(tag: &str) -> Vec<(String, PathBuf)> {
    bench_cases(Path::new(PROGRAMS_DIR), tag)
        .unwrap_or_else(|err| panic!("load bench cases: {err:#}"))
        .into_iter()
        .map(|case| (case.name, case.program_path))
        .collect()
}

pub fn load_source(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| panic!("read {}: {err}", path.display()))
}

pub fn load_program(path: &Path) -> Program {
    let source = load_source(path);
    parser::parse(&source).unwrap_or_else(|err| panic!("parse {}: {err}", path.display()))
}
