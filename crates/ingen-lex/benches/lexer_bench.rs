//! Lexer throughput benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ingen_lex::{InspectLexer, TemplateKind, TemplateLexer};

fn template_source() -> String {
    let mut source = String::new();
    for _ in 0..200 {
        source.push_str("struct $S.Name$ {\n");
        source.push_str("$foreach F in S.Fields$    $F.Type.Name$ $F.Name$;\n$end$");
        source.push_str("};\n");
    }
    source
}

fn inspect_source() -> String {
    let mut source = String::new();
    source.push_str("declare_attribute Serialized(version);\n");
    for i in 0..200 {
        source.push_str(&format!(
            "struct Entity{i} {{\n    Int id;\n    String name = \"none\";\n    List<Int> scores;\n}};\n"
        ));
    }
    source
}

fn bench_template_lexer(c: &mut Criterion) {
    let source = template_source();
    c.bench_function("template_lex", |b| {
        b.iter(|| {
            let mut lexer = TemplateLexer::new(black_box(&source));
            let mut count = 0usize;
            loop {
                let token = lexer.next_token();
                if token.kind == TemplateKind::Eof {
                    break;
                }
                count += 1;
            }
            black_box(count)
        })
    });
}

fn bench_inspect_lexer(c: &mut Criterion) {
    let source = inspect_source();
    c.bench_function("inspect_lex", |b| {
        b.iter(|| {
            let mut lexer = InspectLexer::from_source("bench.ins", black_box(source.as_str()), 0);
            let mut count = 0usize;
            loop {
                let token = lexer.next_token();
                if token.is_eof() {
                    break;
                }
                count += 1;
            }
            black_box(count)
        })
    });
}

criterion_group!(benches, bench_template_lexer, bench_inspect_lexer);
criterion_main!(benches);
