//! Benchmarks for the frame and command codecs.
//!
//! Run with: cargo bench

use ab_eip::{
    execute_pccc, unconnected_send, CipType, CipValue, CommonPacket, EPath, EncapsulationCommand,
    EncapsulationPacket, OriginatorIdentity, PcccAddress, PcccReply, ReadTagCommand, RoutePath,
    TagReadReply, TypedReadCommand, WriteTagCommand,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const ORIGINATOR: OriginatorIdentity = OriginatorIdentity {
    vendor_id: 0x1009,
    serial_number: 0x1234_5678,
};

fn bench_tag_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("tag_path");
    for name in ["Speed", "Program:Main.Motor.Speed", "Recipes[12].Steps[3,4]"] {
        group.bench_with_input(BenchmarkId::from_parameter(name), name, |b, name| {
            b.iter(|| EPath::tag(black_box(name)))
        });
    }
    group.finish();
}

fn bench_logix_requests(c: &mut Criterion) {
    let mut group = c.benchmark_group("logix_request");

    group.bench_function("read_tag_routed", |b| {
        b.iter(|| {
            let command = ReadTagCommand::new(black_box("Program:Main.Speed"), 1).unwrap();
            let cip = command.to_request().to_bytes().unwrap();
            let routed = unconnected_send(&cip, RoutePath::backplane(1)).unwrap();
            EncapsulationPacket::new(
                EncapsulationCommand::SendRRData,
                0x0100_0042,
                [0; 8],
                CommonPacket::unconnected(&routed).to_bytes(),
            )
            .unwrap()
            .to_bytes()
        })
    });

    let values: Vec<_> = (0..100).map(|i| CipValue::Real(i as f32 * 0.5)).collect();
    group.bench_function("write_tag_100_reals", |b| {
        b.iter(|| {
            WriteTagCommand::new("Recipe[0]", black_box(values.clone()))
                .unwrap()
                .to_request()
                .to_bytes()
                .unwrap()
        })
    });

    let mut reply = CipType::Dint.code().to_le_bytes().to_vec();
    for i in 0..100i32 {
        reply.extend_from_slice(&i.to_le_bytes());
    }
    group.bench_function("parse_read_tag_100_dints", |b| {
        b.iter(|| TagReadReply::from_bytes(black_box(&reply), 100))
    });

    group.finish();
}

fn bench_pccc(c: &mut Criterion) {
    let mut group = c.benchmark_group("pccc");

    group.bench_function("parse_address", |b| {
        b.iter(|| black_box("B3:120/15").parse::<PcccAddress>())
    });

    let address: PcccAddress = "N7:0".parse().unwrap();
    group.bench_function("typed_read_request", |b| {
        b.iter(|| {
            let command = TypedReadCommand::new(black_box(7), &address).unwrap();
            execute_pccc(&ORIGINATOR, &command.to_bytes())
                .to_bytes()
                .unwrap()
        })
    });

    let reply = [
        0x07, 0x09, 0x10, 0x78, 0x56, 0x34, 0x12, 0x4F, 0x00, 0x07, 0x00, 0xCE, 0xFF,
    ];
    group.bench_function("parse_reply", |b| {
        b.iter(|| PcccReply::from_bytes(black_box(&reply)).and_then(|r| r.into_data(7)))
    });

    group.finish();
}

criterion_group!(benches, bench_tag_paths, bench_logix_requests, bench_pccc);
criterion_main!(benches);
