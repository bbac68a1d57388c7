use geo::{Point, Rect};

/// An immutable 2D range index over geo-tagged items.
///
/// Items are arbitrary `Copy + Ord` identifiers; one item may be tagged at
/// many positions (an edge sampled along its polyline) and is still
/// reported exactly once per query. Results are always sorted ascending by
/// item identifier, independent of tree shape.
#[derive(Debug)]
pub struct RangeTree<I> {
    root: Option<LongitudeNode<I>>,
}

/// Outer-tree node covering a contiguous run of distinct longitudes.
#[derive(Debug)]
struct LongitudeNode<I> {
    start: f64,
    end: f64,
    inner: LatitudeNode<I>,
    children: Option<Box<(LongitudeNode<I>, LongitudeNode<I>)>>,
}

/// Inner-tree node covering a contiguous run of distinct latitudes.
#[derive(Debug)]
struct LatitudeNode<I> {
    start: f64,
    end: f64,
    /// Sorted, de-duplicated identifiers of every item under this node.
    items: Vec<I>,
    children: Option<Box<(LatitudeNode<I>, LatitudeNode<I>)>>,
}

impl<I: Copy + Ord> RangeTree<I> {
    /// Builds the index from `(position, item)` samples. An empty sample
    /// set yields an index that answers every query with no items.
    pub fn build(mut samples: Vec<(Point<f64>, I)>) -> Self {
        if samples.is_empty() {
            return RangeTree { root: None };
        }

        samples.sort_by(|a, b| a.0.x().total_cmp(&b.0.x()).then_with(|| a.1.cmp(&b.1)));
        let values = distinct(samples.iter().map(|(position, _)| position.x()));

        RangeTree {
            root: Some(build_longitude(&samples, &values)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Every item with at least one sample inside `bounds` (inclusive),
    /// each exactly once, sorted ascending by identifier.
    pub fn query(&self, bounds: &Rect<f64>) -> Vec<I> {
        match &self.root {
            Some(root) => root.interval(
                bounds.min().x,
                bounds.max().x,
                bounds.min().y,
                bounds.max().y,
            ),
            None => Vec::new(),
        }
    }
}

impl<I: Copy + Ord> LongitudeNode<I> {
    fn interval(&self, left: f64, right: f64, bottom: f64, top: f64) -> Vec<I> {
        if right < self.start || left > self.end {
            return Vec::new();
        }
        if left <= self.start && right >= self.end {
            return self.inner.interval(bottom, top);
        }

        match &self.children {
            Some(children) => merge(
                children.0.interval(left, right, bottom, top),
                children.1.interval(left, right, bottom, top),
            ),
            // A leaf holds a single longitude: it is either disjoint from
            // the query or fully contained, both handled above.
            None => Vec::new(),
        }
    }
}

impl<I: Copy + Ord> LatitudeNode<I> {
    fn interval(&self, bottom: f64, top: f64) -> Vec<I> {
        if top < self.start || bottom > self.end {
            return Vec::new();
        }
        if bottom <= self.start && top >= self.end {
            return self.items.clone();
        }

        match &self.children {
            Some(children) => merge(
                children.0.interval(bottom, top),
                children.1.interval(bottom, top),
            ),
            None => Vec::new(),
        }
    }
}

fn build_longitude<I: Copy + Ord>(
    samples: &[(Point<f64>, I)],
    values: &[f64],
) -> LongitudeNode<I> {
    let children = (values.len() > 1).then(|| {
        let middle = values.len() >> 1;
        let split = samples.partition_point(|(position, _)| position.x() < values[middle]);

        Box::new((
            build_longitude(&samples[..split], &values[..middle]),
            build_longitude(&samples[split..], &values[middle..]),
        ))
    });

    LongitudeNode {
        start: values[0],
        end: values[values.len() - 1],
        inner: build_latitude(samples),
        children,
    }
}

fn build_latitude<I: Copy + Ord>(samples: &[(Point<f64>, I)]) -> LatitudeNode<I> {
    let mut sorted: Vec<(f64, I)> = samples
        .iter()
        .map(|(position, item)| (position.y(), *item))
        .collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let values = distinct(sorted.iter().map(|(latitude, _)| *latitude));
    build_latitude_node(&sorted, &values)
}

fn build_latitude_node<I: Copy + Ord>(samples: &[(f64, I)], values: &[f64]) -> LatitudeNode<I> {
    let children = (values.len() > 1).then(|| {
        let middle = values.len() >> 1;
        let split = samples.partition_point(|(latitude, _)| *latitude < values[middle]);

        Box::new((
            build_latitude_node(&samples[..split], &values[..middle]),
            build_latitude_node(&samples[split..], &values[middle..]),
        ))
    });

    let mut items: Vec<I> = samples.iter().map(|(_, item)| *item).collect();
    items.sort_unstable();
    items.dedup();

    LatitudeNode {
        start: values[0],
        end: values[values.len() - 1],
        items,
        children,
    }
}

/// Unique values of an already-sorted sequence.
fn distinct(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut distinct: Vec<f64> = Vec::new();
    for value in values {
        if distinct.last() != Some(&value) {
            distinct.push(value);
        }
    }
    distinct
}

/// Merges two sorted, de-duplicated runs into one, dropping duplicates.
fn merge<I: Copy + Ord>(a: Vec<I>, b: Vec<I>) -> Vec<I> {
    if a.is_empty() {
        return b;
    }
    if b.is_empty() {
        return a;
    }

    let mut merged = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() || j < b.len() {
        let next = if j == b.len() || (i < a.len() && a[i] < b[j]) {
            i += 1;
            a[i - 1]
        } else {
            j += 1;
            b[j - 1]
        };

        if merged.last() != Some(&next) {
            merged.push(next);
        }
    }

    merged
}
