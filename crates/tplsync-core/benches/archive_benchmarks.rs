use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tplsync_core::archive::{self, Encoding};
use tplsync_core::merge::{Baseline, MergeMode, decide};
use tplsync_test_utils::archive::{TarEntry, tar_gz, tar_xz, zstd_frame};

fn fixture_entries() -> Vec<TarEntry> {
    (0..64)
        .map(|i| TarEntry::file(&format!("cfg/file-{i:02}.yml"), vec![b'x'; 4096]))
        .collect()
}

fn decode_benchmark(c: &mut Criterion) {
    let entries = fixture_entries();
    let gz = tar_gz(&entries);
    let xz = tar_xz(&entries);
    let zst = zstd_frame(&vec![b'y'; 256 * 1024]);

    c.bench_function("archive::decode tar+gzip (64 x 4 KiB)", |b| {
        b.iter(|| archive::decode(black_box(&gz), Encoding::TarGzip, "", true).unwrap())
    });
    c.bench_function("archive::decode tar+xz (64 x 4 KiB)", |b| {
        b.iter(|| archive::decode(black_box(&xz), Encoding::TarXz, "", true).unwrap())
    });
    c.bench_function("archive::decode tar+gzip extract dir", |b| {
        b.iter(|| archive::decode(black_box(&gz), Encoding::TarGzip, "cfg", false).unwrap())
    });
    c.bench_function("archive::decode zstd (256 KiB)", |b| {
        b.iter(|| archive::decode(black_box(&zst), Encoding::Zstd, "", false).unwrap())
    });
}

fn decide_benchmark(c: &mut Criterion) {
    let current = vec![b'a'; 64 * 1024];
    let incoming = vec![b'b'; 64 * 1024];
    let baseline = tplsync_fs::digest::sha256_hex(&current);

    c.bench_function("merge::decide three_way fast-forward", |b| {
        b.iter(|| {
            decide(
                black_box(Some(current.as_slice())),
                black_box(&incoming),
                Baseline::Applied(&baseline),
                MergeMode::ThreeWay,
            )
        })
    });
}

criterion_group!(benches, decode_benchmark, decide_benchmark);
criterion_main!(benches);
