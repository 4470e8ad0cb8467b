use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use minilisp::{Environment, evaluate, parse_str, tokenize};

// Deeply nested arithmetic with both branches of `if` exercised
const BENCH_INPUT: &str = "
(if (> (+ (* 3 4) (- 10 (/ 9 3))) (* (+ 1 2) (+ 3 4)))
    (+ (* (+ 1 2) (- 8 3)) (/ (* 6 7) (+ 2 (* 2 2))))
    (- (* (+ 10 20) (- 30 40)) (/ (+ 50 60) (* 70 (+ 1 1)))))
";

fn nested_sum(depth: usize) -> String {
    let mut expr = "1".to_string();
    for i in 0..depth {
        expr = format!("(+ {} {})", expr, i);
    }
    expr
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pipeline");

    group.bench_with_input(
        BenchmarkId::new("tokenize", "arithmetic"),
        &BENCH_INPUT,
        |b, input| b.iter(|| tokenize(black_box(input))),
    );

    group.bench_with_input(
        BenchmarkId::new("parse", "arithmetic"),
        &BENCH_INPUT,
        |b, input| b.iter(|| parse_str(black_box(input))),
    );

    let node = parse_str(BENCH_INPUT).expect("bench input parses");
    group.bench_with_input(BenchmarkId::new("evaluate", "arithmetic"), &node, |b, node| {
        let mut env = Environment::standard();
        b.iter(|| evaluate(black_box(node), &mut env))
    });

    for depth in [10, 100, 500] {
        let input = nested_sum(depth);
        group.bench_with_input(BenchmarkId::new("parse_and_evaluate", depth), &input, |b, input| {
            let mut env = Environment::standard();
            b.iter(|| {
                let node = parse_str(black_box(input)).expect("nested sum parses");
                evaluate(&node, &mut env)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
