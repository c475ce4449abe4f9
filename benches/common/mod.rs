#![allow(dead_code)]
use std::path::Path;

use loxwalk::ast::Program;
use loxwalk::resolver::{self, Resolutions};
use loxwalk::{lexer, parser};
use test_support::{bench_cases, cases_dir};

/// `(label, source)` for every case marked `bench.enabled`.
pub fn workloads() -> Vec<(String, String)> {
    let dir = cases_dir(Path::new(env!("CARGO_MANIFEST_DIR")));
    bench_cases(&dir)
        .unwrap_or_else(|err| panic!("load bench cases: {err:#}"))
        .into_iter()
        .map(|case| {
            let source = case
                .source()
                .unwrap_or_else(|err| panic!("read {}: {err:#}", case.name));
            (case.name, source)
        })
        .collect()
}

pub fn load_program(label: &str, source: &str) -> (Program, Resolutions) {
    let tokens = lexer::tokenize(source).unwrap_or_else(|err| panic!("tokenize {label}: {err}"));
    let program =
        parser::parse_tokens(tokens).unwrap_or_else(|err| panic!("parse {label}: {err}"));
    let resolutions =
        resolver::resolve(&program).unwrap_or_else(|err| panic!("resolve {label}: {err}"));
    (program, resolutions)
}
