use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dvi_index::{
    DviReader, DviReaderConfiguration, DviVersion, DviWriter, FontDefinition, ScaleFactors,
};

fn sample(pages: i32) -> Vec<u8> {
    let mut writer =
        DviWriter::new(DviVersion::Standard, ScaleFactors::TEX_DEFAULT, "bench").unwrap();
    for id in 0..16 {
        writer
            .define_font(FontDefinition::new(id, 0, 655_360, 655_360, format!("cmr{}", id)))
            .unwrap();
    }
    for page in 1..=pages {
        writer.begin_page([page, 0, 0, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        writer.special("papersize=210mm,297mm").unwrap();
        writer.select_font((page % 16) as u32).unwrap();
        for _ in 0..40 {
            writer.push().unwrap();
            for c in b"The quick brown fox jumps over the lazy dog." {
                writer.set_char(*c).unwrap();
            }
            writer.pop().unwrap();
        }
        writer.end_page().unwrap();
    }
    writer.finish().unwrap()
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for pages in [10, 100, 1000] {
        let data = sample(pages);
        group.bench_with_input(BenchmarkId::new("index_only", pages), &data, |b, data| {
            let configuration = DviReaderConfiguration {
                prescan_specials: false,
                ..Default::default()
            };
            b.iter(|| DviReader::read_from_bytes(black_box(data.clone()), configuration.clone()))
        });
        group.bench_with_input(BenchmarkId::new("with_prescan", pages), &data, |b, data| {
            let configuration = DviReaderConfiguration::default();
            b.iter(|| DviReader::read_from_bytes(black_box(data.clone()), configuration.clone()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
