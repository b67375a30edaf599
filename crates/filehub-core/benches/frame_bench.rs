//! Criterion benchmarks for the FileHub frame codec and command splitting.
//!
//! Run with:
//! ```bash
//! cargo bench --package filehub-core --bench frame_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use filehub_core::protocol::command::{split_command, Command};
use filehub_core::protocol::frame::{decode_size, decode_string, encode_size, encode_string};

const COMMAND_LINES: &[&str] = &[
    "bye",
    "catalogs",
    "use Shared Documents",
    "files music",
    "search quarterly-report-2024.pdf",
    "send /home/user/Downloads/some/deeply/nested/path/archive.tar.gz",
];

fn bench_encode_string(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_string");
    for len in [8usize, 256, 4096, 65_535] {
        let value = "a".repeat(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &value, |b, v| {
            b.iter(|| encode_string(black_box(v)).unwrap())
        });
    }
    group.finish();
}

fn bench_decode_string(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_string");
    for len in [8usize, 256, 4096, 65_535] {
        let bytes = encode_string(&"a".repeat(len)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(len), &bytes, |b, bytes| {
            b.iter(|| decode_string(black_box(bytes)).unwrap())
        });
    }
    group.finish();
}

fn bench_size_field(c: &mut Criterion) {
    c.bench_function("size_field", |b| {
        b.iter(|| {
            let bytes = encode_size(black_box(1_234_567_890));
            decode_size(black_box(&bytes)).unwrap()
        })
    });
}

fn bench_split_and_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_and_parse");
    for line in COMMAND_LINES {
        group.bench_with_input(BenchmarkId::from_parameter(line), line, |b, line| {
            b.iter(|| Command::parse(&split_command(black_box(line))))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_encode_string,
    bench_decode_string,
    bench_size_field,
    bench_split_and_parse
);
criterion_main!(benches);
