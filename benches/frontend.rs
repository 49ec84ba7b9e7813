mod common;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use kotoba::{lexer, parser};

fn bench_frontend(c: &mut Criterion) {
    for (label, path) in common::workloads("frontend") {
        let source = common::load_source(&path);

        c.bench_function(&format!("frontend_tokenize_{label}"), |b| {
            b.iter(|| {
                let out = lexer::tokenize(black_box(&source)).expect("tokenize");
                black_box(out);
            })
        });

        c.bench_function(&format!("frontend_tokenize_parse_{label}"), |b| {
            b.iter(|| {
                let out = parser::parse(black_box(&source)).expect("parse");
                black_box(out);
            })
        });
    }
}

criterion_group!(benches, bench_frontend);
criterion_main!(benches);
