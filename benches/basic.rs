use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use serial_stream::{MockDevice, OpenMode, SerialStreamBuf};
use std::hint::black_box;
use std::time::Duration;

fn loopback_stream() -> (SerialStreamBuf<MockDevice>, MockDevice) {
    let device = MockDevice::loopback("BENCH");
    let mut stream = SerialStreamBuf::new();
    stream
        .attach(device.clone(), OpenMode::READ_WRITE)
        .unwrap();
    (stream, device)
}

pub fn bench_block_transfer(c: &mut Criterion) {
    let payload = vec![0x5au8; 4096];
    let mut group = c.benchmark_group("loopback");
    group.throughput(Throughput::Bytes(payload.len() as u64));

    group.bench_function("put_get_4k", |b| {
        let (mut stream, device) = loopback_stream();
        let mut buf = vec![0u8; payload.len()];
        b.iter(|| {
            stream.put_bytes(black_box(&payload)).unwrap();
            let n = stream.get_bytes(&mut buf).unwrap();
            black_box(n);
            device.take_written();
        })
    });
    group.finish();
}

pub fn bench_single_byte(c: &mut Criterion) {
    c.bench_function("put_take_byte", |b| {
        let (mut stream, device) = loopback_stream();
        b.iter(|| {
            stream.put_byte(black_box(b'A')).unwrap();
            black_box(stream.take_byte().unwrap());
            device.take_written();
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(300))
        .measurement_time(Duration::from_secs(2));
    targets = bench_block_transfer, bench_single_byte
}
criterion_main!(benches);
