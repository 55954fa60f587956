use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use retro_egtb::{EncoderDecoder, ReportU8, Reports};
use retroboard::shakmaty::ByColor;

fn gen_reports(nb: usize) -> Reports {
    let mut reports = Reports::with_capacity(nb);
    let mut j: u8 = 0;
    for _ in 0..nb {
        j = j.checked_add(1).unwrap_or(0);
        let report_u8 = ReportU8::from_raw_u8(j);
        reports.push(ByColor {
            black: report_u8,
            white: report_u8,
        });
    }
    reports
}

pub fn bench_compression(c: &mut Criterion) {
    let mut group = c.benchmark_group("Compression");
    for nb_elements in [1_000usize, 10_000, 50_000] {
        let reports = gen_reports(nb_elements);
        group.bench_with_input(
            BenchmarkId::new("compress", nb_elements),
            &reports,
            |b, reports| {
                b.iter(|| {
                    let mut encoder = EncoderDecoder::new(Vec::<u8>::new());
                    encoder.compress(reports).expect("compression failed");
                })
            },
        );

        let mut encoder = EncoderDecoder::new(Vec::<u8>::new());
        encoder.compress(&reports).expect("compression failed");
        group.bench_with_input(
            BenchmarkId::new("decompress_file", nb_elements),
            &encoder,
            |b, encoder| b.iter(|| encoder.decompress_file().expect("decompression failed")),
        );
    }
}

criterion_group!(benches, bench_compression);
criterion_main!(benches);
