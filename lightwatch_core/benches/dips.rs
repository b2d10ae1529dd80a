use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lightwatch_core::dips::{DipConfig, count_dips};

// Synthetic window: steady baseline with periodic dips plus white noise.
fn synth_window(n: usize, dip_every: usize, dip_len: usize, seed: u32) -> Vec<f64> {
    let mut state = seed.max(1);
    let mut next_f64 = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        f64::from(x) / (f64::from(u32::MAX) + 1.0)
    };
    let mut v = Vec::with_capacity(n);
    for i in 0..n {
        let base = if i % dip_every < dip_len { 0.70 } else { 1.00 };
        let noise = (next_f64() * 2.0 - 1.0) * 0.01;
        v.push(base + noise);
    }
    v
}

pub fn bench_count_dips(c: &mut Criterion) {
    let mut g = c.benchmark_group("count_dips");
    let cfg = DipConfig::default();

    for &n in &[200usize, 1000, 2000] {
        let window = synth_window(n, 50, 5, 0xC0FFEE);
        g.bench_function(format!("window_{n}"), |b| {
            b.iter(|| {
                let dips = count_dips(black_box(&window), black_box(1.0), black_box(&cfg));
                black_box(dips);
            })
        });
    }
    g.finish();
}

criterion_group!(dips, bench_count_dips);
criterion_main!(dips);
