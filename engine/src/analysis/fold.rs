// Grouped aggregation as an explicit fold: key extraction + accumulator + finisher.
use shared::models::Metric;
use std::collections::btree_map::{BTreeMap, Entry};

// An accumulator is only ever created from the first value of its group, so a
// finished accumulator has seen at least one value.
pub trait Accumulator<V> {
    fn start(value: V) -> Self;
    fn add(&mut self, value: V);
}

/// Groups `items` by `key`, folds `value` of each item into the group's
/// accumulator and maps every finished group through `finish`.
///
/// Rows come out in ascending key order, which gives every table built on top
/// of this a deterministic order without a separate sort.
pub fn group_fold<'a, T, K, V, A, R>(
    items: &'a [T],
    key: impl Fn(&'a T) -> K,
    value: impl Fn(&'a T) -> V,
    finish: impl Fn(K, A) -> R,
) -> Vec<R>
where
    K: Ord,
    A: Accumulator<V>,
{
    let mut groups: BTreeMap<K, A> = BTreeMap::new();
    for item in items {
        let v = value(item);
        match groups.entry(key(item)) {
            Entry::Vacant(slot) => {
                slot.insert(A::start(v));
            }
            Entry::Occupied(mut slot) => slot.get_mut().add(v),
        }
    }
    groups.into_iter().map(|(k, acc)| finish(k, acc)).collect()
}

// Exact integer sum. Totals are widened to u128 so no number of u64 rows a
// batch can hold overflows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SumAcc {
    pub total: u128,
}

impl Accumulator<u64> for SumAcc {
    fn start(value: u64) -> Self {
        SumAcc {
            total: u128::from(value),
        }
    }

    fn add(&mut self, value: u64) {
        self.total += u128::from(value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanAcc {
    sum: f64,
    count: usize,
}

impl MeanAcc {
    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

impl Accumulator<f64> for MeanAcc {
    fn start(value: f64) -> Self {
        MeanAcc { sum: value, count: 1 }
    }

    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }
}

/// Mean of a possibly-undefined metric.
///
/// One undefined input makes the whole mean undefined; the defined inputs are
/// still counted so callers can report how much of the group was affected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricMeanAcc {
    defined_sum: f64,
    defined: usize,
    undefined: usize,
}

impl MetricMeanAcc {
    pub fn undefined_count(&self) -> usize {
        self.undefined
    }

    pub fn count(&self) -> usize {
        self.defined + self.undefined
    }

    pub fn mean(&self) -> Metric {
        if self.undefined > 0 {
            return Metric::Undefined;
        }
        Metric::ratio(self.defined_sum, self.defined as f64)
    }
}

impl Accumulator<Metric> for MetricMeanAcc {
    fn start(value: Metric) -> Self {
        let mut acc = MetricMeanAcc {
            defined_sum: 0.0,
            defined: 0,
            undefined: 0,
        };
        acc.add(value);
        acc
    }

    fn add(&mut self, value: Metric) {
        match value {
            Metric::Defined(v) => {
                self.defined_sum += v;
                self.defined += 1;
            }
            Metric::Undefined => self.undefined += 1,
        }
    }
}

// Two accumulators fed side by side from one pass.
impl<V, W, A, B> Accumulator<(V, W)> for (A, B)
where
    A: Accumulator<V>,
    B: Accumulator<W>,
{
    fn start((v, w): (V, W)) -> Self {
        (A::start(v), B::start(w))
    }

    fn add(&mut self, (v, w): (V, W)) {
        self.0.add(v);
        self.1.add(w);
    }
}
