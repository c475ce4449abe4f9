mod common;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use loxwalk::interpreter::Interpreter;

fn bench_interpreter(c: &mut Criterion) {
    for (label, source) in common::workloads() {
        let (program, resolutions) = common::load_program(&label, &source);

        c.bench_function(&format!("interpreter_total_{label}"), |b| {
            b.iter(|| {
                let mut interpreter = Interpreter::capturing();
                interpreter
                    .interpret(black_box(&program), resolutions.clone())
                    .expect("run");
                black_box(interpreter.take_output());
            })
        });
    }
}

criterion_group!(benches, bench_interpreter);
criterion_main!(benches);
