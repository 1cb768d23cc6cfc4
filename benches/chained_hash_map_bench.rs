use chain_hashmap::ChainedHashMap;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn filled(seed: u64, n: usize) -> (ChainedHashMap<String, u64>, Vec<String>) {
    let mut m = ChainedHashMap::new();
    let keys: Vec<_> = lcg(seed).take(n).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        m.insert(k.clone(), i as u64);
    }
    (m, keys)
}

fn bench_insert_fresh_100k(c: &mut Criterion) {
    c.bench_function("chained::insert_fresh_100k", |b| {
        b.iter_batched(
            ChainedHashMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_reserved_100k(c: &mut Criterion) {
    c.bench_function("chained::insert_reserved_100k", |b| {
        b.iter_batched(
            || {
                let mut m = ChainedHashMap::<String, u64>::new();
                m.reserve(100_000);
                m
            },
            |mut m| {
                for (i, x) in lcg(3).take(100_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_erase_random_10k(c: &mut Criterion) {
    c.bench_function("chained::erase_random_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let (m, keys) = filled(5, 110_000);
                // Precompute 10k unique victims via LCG
                let n = keys.len();
                let mut sel = std::collections::HashSet::with_capacity(10_000);
                let mut s = 0x9e3779b97f4a7c15u64;
                while sel.len() < 10_000 {
                    s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                    sel.insert((s as usize) % n);
                }
                let victims: Vec<String> = sel.into_iter().map(|i| keys[i].clone()).collect();
                (m, victims)
            },
            |(mut m, victims)| {
                for k in &victims {
                    m.erase(k);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_find_hit_10k(c: &mut Criterion) {
    c.bench_function("chained::find_hit_10k_on_100k", |b| {
        let (m, keys) = filled(7, 100_000);
        let n = keys.len();
        let mut s = 0x9e3779b97f4a7c15u64;
        let queries: Vec<String> = (0..10_000)
            .map(|_| {
                s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                keys[(s as usize) % n].clone()
            })
            .collect();
        b.iter(|| {
            for k in &queries {
                black_box(m.find(k));
            }
        })
    });
}

fn bench_find_miss_10k(c: &mut Criterion) {
    c.bench_function("chained::find_miss_10k_on_100k", |b| {
        let (m, _) = filled(11, 100_000);
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            for x in miss.by_ref().take(10_000) {
                black_box(m.contains(&key(x)));
            }
        })
    });
}

fn bench_rehash_100k(c: &mut Criterion) {
    c.bench_function("chained::rehash_100k_double", |b| {
        b.iter_batched(
            || filled(13, 100_000).0,
            |mut m| {
                let n = m.bucket_count() * 2;
                m.rehash(n);
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_iteration(c: &mut Criterion) {
    let (m, _) = filled(999, 100_000);
    c.bench_function("chained::iter_all_100k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for (_k, v) in m.iter() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });

    c.bench_function("chained::cursor_walk_100k", |b| {
        b.iter(|| {
            let mut steps = 0usize;
            let mut cur = m.begin();
            while let Ok(next) = m.next_cursor(cur) {
                cur = next;
                steps += 1;
            }
            black_box(steps)
        })
    });

    c.bench_function("chained::iter_mut_increment_all_100k", |b| {
        b.iter_batched(
            || m.clone(),
            |mut m| {
                for v in m.values_mut() {
                    *v = v.wrapping_add(1);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_insert_fresh_100k, bench_insert_reserved_100k, bench_rehash_100k
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_erase_random_10k,
              bench_find_hit_10k,
              bench_find_miss_10k,
              bench_iteration
}
criterion_main!(benches_insert, benches_ops);
