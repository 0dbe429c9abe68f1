// benches/pack_unpack.rs

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use struct_pointer::prelude::*;

fn point() -> Struct {
    Struct::new(|p| {
        p.f64("x")?;
        p.f64("y")?;
        p.f64("z")?;
        Ok(())
    })
}

fn cloud(size: usize) -> Record {
    let points: Vec<Record> = (0..size)
        .map(|i| {
            Record::new()
                .with("x", i as f64)
                .with("y", (i * 2) as f64)
                .with("z", (i * 3) as f64)
        })
        .collect();
    Record::new().with("n", size as u32).with("points", points)
}

fn cloud_schema() -> Struct {
    let point = point();
    Struct::new(move |p| {
        let n = p.u32("n")?;
        p.records(&point, "points", n as usize)?;
        Ok(())
    })
}

fn samples(size: usize) -> Record {
    let values: Vec<f32> = (0..size).map(|i| i as f32 * 0.5).collect();
    Record::new().with("n", size as u32).with("values", values)
}

fn bench_nested_records(c: &mut Criterion) {
    let sizes = vec![10, 100, 1_000];
    let schema = cloud_schema();

    let mut group = c.benchmark_group("nested_records");
    for size in sizes {
        let record = cloud(size);
        let bytes = schema.pack_to_vec(&record).unwrap();
        let mut target = vec![0u8; bytes.len()];

        group.bench_with_input(BenchmarkId::new("pack", size), &size, |b, _| {
            b.iter(|| schema.pack(black_box(&record), &mut target).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("unpack", size), &size, |b, _| {
            b.iter(|| black_box(schema.unpack_record(black_box(&bytes)).unwrap()));
        });
    }
    group.finish();
}

fn bench_array_field(c: &mut Criterion) {
    let sizes = vec![100, 1_000, 10_000];

    let mut group = c.benchmark_group("array_field");
    for order in [ByteOrder::Big, ByteOrder::Little] {
        let schema = Layout::new()
            .order(order)
            .scalar(Kind::U32, "n")
            .counted(Kind::F32, "values", "n")
            .into_struct();

        for &size in &sizes {
            let record = samples(size);
            let len = schema.length(&record).unwrap();
            let mut target = vec![0u8; len];

            let id = BenchmarkId::new(format!("{order:?}"), size);
            group.bench_with_input(id, &size, |b, _| {
                b.iter(|| schema.pack(black_box(&record), &mut target).unwrap());
            });
        }
    }
    group.finish();
}

fn bench_length(c: &mut Criterion) {
    let schema = cloud_schema();
    let record = cloud(1_000);

    c.bench_function("length_1000_points", |b| {
        b.iter(|| schema.length(black_box(&record)).unwrap());
    });
}

criterion_group!(benches, bench_nested_records, bench_array_field, bench_length);
criterion_main!(benches);
