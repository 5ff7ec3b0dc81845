use criterion::{criterion_group, criterion_main, Criterion};
use ember::{context::Context, parser::parse_program, unit::CompilationUnit};
use std::hint::black_box;

static INPUT: &str = include_str!("../../demos/big.em");

fn parser(input: &str) {
    let mut cx = Context::new();
    let program = parse_program(input, &mut cx).unwrap();
    _ = black_box(program);
}

fn compile(input: &str) {
    let mut unit = CompilationUnit::new("big", input);
    unit.compile().unwrap();
    _ = black_box(unit.into_module());
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("parser", |b| b.iter(|| parser(black_box(INPUT))));
    c.bench_function("compile", |b| b.iter(|| compile(black_box(INPUT))));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
