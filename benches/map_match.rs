use chrono::{Duration, NaiveDate};
use criterion::{criterion_group, criterion_main, Criterion};
use geo::{LineString, Point};

use roadsnap::geo::offset;
use roadsnap::route::transition::{GpsPoint, Matcher};
use roadsnap::Graph;

const ORIGIN: Point<f64> = Point(geo::Coord {
    x: 151.20,
    y: -33.90,
});

/// A rectangular street grid: `size` x `size` intersections 200m apart,
/// two-way streets between neighbours.
fn grid(size: usize) -> Graph {
    let mut graph = Graph::new();

    let position = |column: usize, row: usize| {
        offset(ORIGIN, column as f64 * 200.0, row as f64 * 200.0)
    };

    for row in 0..size {
        for column in 0..size {
            graph
                .add_node(&format!("n{column}_{row}"), position(column, row))
                .unwrap();
        }
    }

    let mut connect = |id: String, from: (usize, usize), to: (usize, usize)| {
        let geometry = LineString::new(vec![
            position(from.0, from.1).0,
            position(to.0, to.1).0,
        ]);
        graph
            .add_edge(
                &id,
                &format!("n{}_{}", from.0, from.1),
                &format!("n{}_{}", to.0, to.1),
                50.0,
                geometry.clone(),
            )
            .unwrap();
        graph
            .add_edge(
                &format!("{id}_reverse"),
                &format!("n{}_{}", to.0, to.1),
                &format!("n{}_{}", from.0, from.1),
                50.0,
                LineString::new(geometry.0.into_iter().rev().collect()),
            )
            .unwrap();
    };

    for row in 0..size {
        for column in 0..size {
            if column + 1 < size {
                connect(format!("h{column}_{row}"), (column, row), (column + 1, row));
            }
            if row + 1 < size {
                connect(format!("v{column}_{row}"), (column, row), (column, row + 1));
            }
        }
    }

    graph.preprocess();
    graph
}

/// An L-shaped trip along the grid's southern then eastern streets, with
/// a few meters of synthetic GPS noise.
fn trip(size: usize) -> Vec<GpsPoint> {
    let base = NaiveDate::from_ymd_opt(2013, 5, 10)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();

    let east = (size - 1) as f64 * 200.0;
    let mut points = Vec::new();

    for step in 0..size * 2 {
        let along = step as f64 * 100.0;
        let (x, y) = if along <= east {
            (along, 4.0 * if step % 2 == 0 { 1.0 } else { -1.0 })
        } else {
            (east - 3.0, along - east)
        };
        points.push(GpsPoint::new(
            offset(ORIGIN, x, y),
            base + Duration::seconds(step as i64 * 10),
        ));
    }

    points
}

fn map_match_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("match");
    group.sample_size(30);

    let graph = grid(8);
    let trace = trip(8);

    group.bench_function("match: 8x8 grid L-trip", |b| {
        let matcher = Matcher::new(&graph);
        b.iter(|| {
            let matched = matcher
                .map_match(&trace)
                .expect("trip must match the grid");
            assert!(!matched.is_empty());
        })
    });

    group.finish();
}

criterion_group!(benches, map_match_benchmark);
criterion_main!(benches);
