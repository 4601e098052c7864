/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chesskit::*;

fn perft_benchmark(c: &mut Criterion) {
    init();

    let kiwipete = Position::from_fen(FEN_KIWIPETE).unwrap();
    c.bench_function("Kiwipete Perft 4", |b| {
        b.iter(|| {
            let mut kiwipete = black_box(&kiwipete).clone();
            let depth = black_box(4);
            black_box(perft(&mut kiwipete, depth))
        });
    });
}

fn see_benchmark(c: &mut Criterion) {
    let kiwipete = Position::from_fen(FEN_KIWIPETE).unwrap();
    let captures = kiwipete.generate_moves(GenType::Captures);
    c.bench_function("Kiwipete SEE of every capture", |b| {
        b.iter(|| {
            captures
                .iter()
                .filter(|&&mv| black_box(&kiwipete).see_ge(mv, black_box(0)))
                .count()
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(100).measurement_time(Duration::from_secs(60));
    targets = perft_benchmark, see_benchmark
}
criterion_main!(benches);
