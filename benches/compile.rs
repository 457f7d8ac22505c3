//! Compile-pass benchmarks.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use inkpane::compile::Compiler;

fn sample_document() -> String {
    let mut text = String::new();
    for section in 0..40 {
        text.push_str(&format!("## Section {section}\n\n"));
        text.push_str("A paragraph with *emphasis*, `code`, and a [link](https://example.com).\n\n");
        if section % 4 == 0 {
            text.push_str("```flowchart\nA[Edit]-->B[Compile]\nB-->C[Render]\n```\n\n");
        }
        if section % 5 == 0 {
            text.push_str("```chart\n{ type: 'bar', series: [{ name: 's', data: [1, 2, 3] }] }\n```\n\n");
        }
        text.push_str("| col | val |\n|---|---|\n| a | 1 |\n| b | 2 |\n\n");
    }
    text
}

fn bench_compile(c: &mut Criterion) {
    let text = sample_document();
    let compiler = Compiler::new(None);

    c.bench_function("compile_mixed_document", |b| {
        b.iter(|| compiler.compile(black_box(&text)));
    });

    let plain = "Just a paragraph of ordinary prose with no deferred content at all.\n".repeat(200);
    c.bench_function("compile_plain_prose", |b| {
        b.iter(|| compiler.compile(black_box(&plain)));
    });
}

criterion_group!(benches, bench_compile);
criterion_main!(benches);
