use criterion::{black_box, criterion_group, criterion_main, Criterion};

use kusari::stmt::Statement;
use kusari::token::{tokenize, Patterns};
use kusari::Interp;

fn bench_parse(c: &mut Criterion) {
    let patterns = Patterns::new();
    let line = r#"total = total + price * (count - 1) / 2"#;

    let mut g = c.benchmark_group("parse");
    g.bench_function("tokenize", |b| {
        b.iter(|| tokenize(black_box(line), &patterns))
    });
    g.bench_function("statement", |b| {
        b.iter(|| Statement::new(black_box(line), &patterns))
    });
    g.finish();
}

fn bench_eval(c: &mut Criterion) {
    let mut interp = Interp::new();
    interp.exec_line("var total = 0\nvar price = 7\nvar count = 3");
    interp.exec_line("def add(a, b)\nreturn a + b\nend");

    let mut g = c.benchmark_group("eval");
    g.bench_function("arithmetic", |b| {
        b.iter(|| interp.exec_line(black_box("nop(2 + 3 * 4 - price)")))
    });
    g.bench_function("assignment", |b| {
        b.iter(|| interp.exec_line(black_box("total = total + 1")))
    });
    g.bench_function("block_call", |b| {
        b.iter(|| interp.exec_line(black_box("nop(add(price, count))")))
    });
    g.bench_function("while_100", |b| {
        b.iter(|| {
            interp.exec_line(black_box(
                "var n = 0\nwhile (n < 100)\nn = n + 1\nend",
            ))
        })
    });
    g.finish();
}

criterion_group!(benches, bench_parse, bench_eval);
criterion_main!(benches);
