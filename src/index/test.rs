use geo::{coord, Point, Rect};

use super::RangeTree;

/// Deterministic pseudo-random stream so failures reproduce exactly.
fn next_unit(seed: &mut u64) -> f64 {
    *seed = seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    ((*seed >> 11) as f64) / ((1u64 << 53) as f64)
}

fn scattered_samples(count: usize, items: u32, seed: u64) -> Vec<(Point<f64>, u32)> {
    let mut state = seed;
    (0..count)
        .map(|_| {
            let position = Point::new(
                150.0 + next_unit(&mut state) * 2.0,
                -34.0 + next_unit(&mut state) * 2.0,
            );
            let item = (next_unit(&mut state) * items as f64) as u32;
            (position, item)
        })
        .collect()
}

fn brute_force(samples: &[(Point<f64>, u32)], bounds: &Rect<f64>) -> Vec<u32> {
    let mut hits: Vec<u32> = samples
        .iter()
        .filter(|(position, _)| {
            position.x() >= bounds.min().x
                && position.x() <= bounds.max().x
                && position.y() >= bounds.min().y
                && position.y() <= bounds.max().y
        })
        .map(|(_, item)| *item)
        .collect();
    hits.sort_unstable();
    hits.dedup();
    hits
}

#[test]
fn query_matches_brute_force_filter() {
    let samples = scattered_samples(400, 120, 0x5eed);
    let tree = RangeTree::build(samples.clone());

    let mut state = 0xfeed_u64;
    for _ in 0..50 {
        let x = 150.0 + next_unit(&mut state) * 2.0;
        let y = -34.0 + next_unit(&mut state) * 2.0;
        let width = next_unit(&mut state) * 0.8;
        let height = next_unit(&mut state) * 0.8;
        let bounds = Rect::new(
            coord! { x: x, y: y },
            coord! { x: x + width, y: y + height },
        );

        assert_eq!(tree.query(&bounds), brute_force(&samples, &bounds));
    }
}

#[test]
fn duplicate_samples_report_an_item_once() {
    // One item tagged at many positions, all inside the query box.
    let samples = vec![
        (Point::new(1.0, 1.0), 7u32),
        (Point::new(1.5, 1.2), 7u32),
        (Point::new(2.0, 1.4), 7u32),
        (Point::new(1.2, 1.9), 3u32),
    ];
    let tree = RangeTree::build(samples);

    let bounds = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 3.0, y: 3.0 });
    assert_eq!(tree.query(&bounds), vec![3, 7]);
}

#[test]
fn boundaries_are_inclusive() {
    let tree = RangeTree::build(vec![(Point::new(1.0, 2.0), 1u32)]);

    let exact = Rect::new(coord! { x: 1.0, y: 2.0 }, coord! { x: 1.0, y: 2.0 });
    assert_eq!(tree.query(&exact), vec![1]);

    let outside = Rect::new(coord! { x: 1.1, y: 2.0 }, coord! { x: 1.2, y: 2.0 });
    assert!(tree.query(&outside).is_empty());
}

#[test]
fn empty_index_answers_empty() {
    let tree: RangeTree<u32> = RangeTree::build(Vec::new());
    assert!(tree.is_empty());

    let bounds = Rect::new(coord! { x: -180.0, y: -90.0 }, coord! { x: 180.0, y: 90.0 });
    assert!(tree.query(&bounds).is_empty());
}

#[test]
fn results_are_sorted_by_identifier() {
    let samples = scattered_samples(200, 60, 0xabcdef);
    let tree = RangeTree::build(samples);

    let bounds = Rect::new(coord! { x: 150.0, y: -34.0 }, coord! { x: 152.0, y: -32.0 });
    let results = tree.query(&bounds);
    assert!(results.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(!results.is_empty());
}
