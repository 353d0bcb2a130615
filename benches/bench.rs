// Criterion benchmarks for the landmark narrator

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use landmark_narrator::core::{
    aggregator::deduplicate,
    distance::{describe_distance, haversine_distance},
    narrative::template_narrative,
    scoring::{encyclopedic_term, geodata_term},
    selector::{select, select_by_heuristic},
};
use landmark_narrator::models::{Coordinates, Landmark, SignificanceScores, SourceDocument, Subject};
use landmark_narrator::services::SearchHit;
use std::collections::BTreeMap;

const CATEGORIES: [&str; 5] = ["Monument", "Cafe", "Museum", "Park", "Historic Site"];

fn create_landmark(id: usize) -> Landmark {
    Landmark {
        id: id.to_string(),
        name: format!("Landmark {}", id),
        category: CATEGORIES[id % CATEGORIES.len()].to_string(),
        distance_m: ((id * 37) % 1000) as f64,
        coordinates: Coordinates::new(41.89 + id as f64 * 0.0001, 12.49),
        rating: if id % 3 == 0 { None } else { Some(5.0 + (id % 5) as f64) },
        address: Some("Rome".to_string()),
        description: None,
    }
}

fn create_scores(landmarks: &[Landmark]) -> SignificanceScores {
    landmarks
        .iter()
        .enumerate()
        .map(|(i, l)| (l.id.clone(), ((i * 13) % 100) as u8))
        .collect()
}

fn bench_haversine_distance(c: &mut Criterion) {
    c.bench_function("haversine_distance", |b| {
        b.iter(|| {
            haversine_distance(
                black_box(41.8902),
                black_box(12.4922),
                black_box(41.8986),
                black_box(12.4769),
            )
        });
    });
}

fn bench_describe_distance(c: &mut Criterion) {
    c.bench_function("describe_distance", |b| {
        b.iter(|| describe_distance(black_box(1234.5)));
    });
}

fn bench_score_terms(c: &mut Criterion) {
    let hits = vec![SearchHit {
        title: "Pantheon, Rome".to_string(),
        snippet: Some(
            "former Roman temple and famous landmark, a masterpiece of 2nd century architecture"
                .to_string(),
        ),
    }];
    let tags: BTreeMap<String, String> = [
        ("tourism", "attraction"),
        ("historic", "building"),
        ("heritage", "2"),
        ("wikipedia", "en:Pantheon, Rome"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    c.bench_function("encyclopedic_term", |b| {
        b.iter(|| encyclopedic_term(black_box(&hits)));
    });
    c.bench_function("geodata_term", |b| {
        b.iter(|| geodata_term(black_box(&tags)));
    });
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");

    for landmark_count in [10, 50, 100, 500].iter() {
        let landmarks: Vec<Landmark> = (0..*landmark_count).map(create_landmark).collect();
        let scores = create_scores(&landmarks);

        group.bench_with_input(
            BenchmarkId::new("select", landmark_count),
            landmark_count,
            |b, _| {
                b.iter(|| select(black_box(&landmarks), black_box(&scores), black_box(30)));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("select_by_heuristic", landmark_count),
            landmark_count,
            |b, _| {
                b.iter(|| select_by_heuristic(black_box(&landmarks)));
            },
        );
    }

    group.finish();
}

fn bench_template_narrative(c: &mut Criterion) {
    let subject = Subject::Landmark(Landmark {
        description: Some("Rebuilt by Hadrian around 126 AD".to_string()),
        ..create_landmark(4)
    });

    c.bench_function("template_narrative", |b| {
        b.iter(|| template_narrative(black_box(&subject)));
    });
}

fn bench_deduplicate(c: &mut Criterion) {
    let documents: Vec<SourceDocument> = (0..60)
        .map(|i| {
            SourceDocument::new(
                format!("Source {}", i % 20),
                format!("https://example.org/{}", i % 20),
                None,
            )
        })
        .collect();

    c.bench_function("deduplicate_60_sources", |b| {
        b.iter(|| deduplicate(black_box(documents.clone())));
    });
}

criterion_group!(
    benches,
    bench_haversine_distance,
    bench_describe_distance,
    bench_score_terms,
    bench_selection,
    bench_template_narrative,
    bench_deduplicate
);
criterion_main!(benches);
