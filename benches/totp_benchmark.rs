use criterion::{Criterion, black_box, criterion_group, criterion_main};
use otpgen::totp::{HmacSha1, TimeStep, base32, truncate};

const SECRET: &str = "GEZD GNBV GY3T QOJQ GEZD GNBV GY3T QOJQ";

fn decode_benchmark(c: &mut Criterion) {
    c.bench_function("base32 decode", |b| {
        b.iter(|| base32::decode(black_box(SECRET)))
    });
}

fn code_benchmark(c: &mut Criterion) {
    let key = base32::decode(SECRET);
    let counter = TimeStep::new(37037036).to_be_bytes();
    let signer = HmacSha1::new();

    c.bench_function("hmac-sha1 and truncate", |b| {
        b.iter(|| {
            let digest = signer.digest(&key, black_box(&counter)).unwrap();
            truncate(&digest, 6).unwrap()
        })
    });
}

criterion_group!(benches, decode_benchmark, code_benchmark);
criterion_main!(benches);
