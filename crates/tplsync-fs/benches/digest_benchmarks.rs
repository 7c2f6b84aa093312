use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tplsync_fs::NormalizedPath;
use tplsync_fs::digest::{DigestAlgorithm, verify_checksum};
use tplsync_fs::io;
use tempfile::tempdir;

fn digest_benchmark(c: &mut Criterion) {
    let content = vec![0x5a_u8; 256 * 1024];

    for algo in [DigestAlgorithm::Blake3, DigestAlgorithm::Sha256, DigestAlgorithm::Md5] {
        c.bench_function(&format!("digest::{} (256 KiB)", algo), |b| {
            b.iter(|| algo.hex_digest(black_box(&content)))
        });
    }

    let spec = format!("sha256:{}", DigestAlgorithm::Sha256.hex_digest(&content));
    c.bench_function("digest::verify_checksum", |b| {
        b.iter(|| verify_checksum(black_box(&content), black_box(&spec)).unwrap())
    });
}

fn write_atomic_benchmark(c: &mut Criterion) {
    c.bench_function("io::write_atomic", |b| {
        let dir = tempdir().unwrap();
        let path = NormalizedPath::new(dir.path().join("tplsync.lock"));
        let content = "version = \"1\"".as_bytes();

        b.iter(|| {
            io::write_atomic(black_box(&path), black_box(content)).unwrap();
        })
    });
}

criterion_group!(benches, digest_benchmark, write_atomic_benchmark);
criterion_main!(benches);
