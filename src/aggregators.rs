//! Per-superstep aggregators.
//!
//! An aggregator is a named reduction registered on the iteration. During a
//! superstep every partition feeds values into its own copy; at the barrier
//! the copies are merged and the combined result becomes available to UDFs in
//! the **next** superstep via `previous_aggregate`.
//!
//! Aggregators are type-erased at the registry boundary (values travel as
//! `&dyn Any`) so that differently-typed aggregators can share one registry;
//! every concrete implementation is typed and reports a mismatch as an error
//! rather than panicking. Built-ins cover the common reductions:
//! [`LongSumAggregator`], [`DoubleSumAggregator`], [`LongMinAggregator`],
//! [`LongMaxAggregator`].

use anyhow::{Result, anyhow};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// A named per-superstep reduction.
///
/// Implementations must be associative and commutative: partition-local
/// copies are merged in no particular order at the superstep barrier.
pub trait Aggregator: Send + Sync {
    /// A fresh, zeroed copy for one partition's superstep work.
    fn fresh(&self) -> Box<dyn Aggregator>;

    /// Fold one value into this copy. The value arrives type-erased; report
    /// a mismatch with an error naming the expected type.
    fn aggregate_dyn(&mut self, value: &dyn Any) -> Result<()>;

    /// Merge another copy's snapshot into this one.
    fn merge_dyn(&mut self, other: &dyn Any) -> Result<()>;

    /// The current value, boxed for the previous-aggregate table.
    fn snapshot(&self) -> Arc<dyn Any + Send + Sync>;

    /// Reset to the zero value for the next superstep.
    fn reset(&mut self);
}

/* ===================== built-ins ===================== */

macro_rules! sum_aggregator {
    ($(#[$doc:meta])* $name:ident, $ty:ty) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $name {
            sum: $ty,
        }

        impl $name {
            /// Convenience constructor (same as `Default`).
            pub fn new() -> Self {
                Self::default()
            }

            /// The current sum.
            pub fn sum(&self) -> $ty {
                self.sum
            }
        }

        impl Aggregator for $name {
            fn fresh(&self) -> Box<dyn Aggregator> {
                Box::new(Self::default())
            }

            fn aggregate_dyn(&mut self, value: &dyn Any) -> Result<()> {
                let v = value.downcast_ref::<$ty>().ok_or_else(|| {
                    anyhow!(concat!(
                        stringify!($name),
                        " accepts values of type ",
                        stringify!($ty)
                    ))
                })?;
                self.sum += *v;
                Ok(())
            }

            fn merge_dyn(&mut self, other: &dyn Any) -> Result<()> {
                let v = other.downcast_ref::<$ty>().ok_or_else(|| {
                    anyhow!(concat!(
                        stringify!($name),
                        " cannot merge a snapshot of a different type"
                    ))
                })?;
                self.sum += *v;
                Ok(())
            }

            fn snapshot(&self) -> Arc<dyn Any + Send + Sync> {
                Arc::new(self.sum)
            }

            fn reset(&mut self) {
                self.sum = Default::default();
            }
        }
    };
}

sum_aggregator!(
    /// Sums `i64` values; the aggregate is an `i64`.
    LongSumAggregator,
    i64
);
sum_aggregator!(
    /// Sums `f64` values; the aggregate is an `f64`.
    DoubleSumAggregator,
    f64
);

macro_rules! extremum_aggregator {
    ($(#[$doc:meta])* $name:ident, $pick:ident, $zero:expr) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name {
            value: i64,
        }

        impl $name {
            /// Convenience constructor (same as `Default`).
            pub fn new() -> Self {
                Self::default()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self { value: $zero }
            }
        }

        impl Aggregator for $name {
            fn fresh(&self) -> Box<dyn Aggregator> {
                Box::new(Self::default())
            }

            fn aggregate_dyn(&mut self, value: &dyn Any) -> Result<()> {
                let v = value.downcast_ref::<i64>().ok_or_else(|| {
                    anyhow!(concat!(stringify!($name), " accepts values of type i64"))
                })?;
                self.value = self.value.$pick(*v);
                Ok(())
            }

            fn merge_dyn(&mut self, other: &dyn Any) -> Result<()> {
                let v = other.downcast_ref::<i64>().ok_or_else(|| {
                    anyhow!(concat!(
                        stringify!($name),
                        " cannot merge a snapshot of a different type"
                    ))
                })?;
                self.value = self.value.$pick(*v);
                Ok(())
            }

            fn snapshot(&self) -> Arc<dyn Any + Send + Sync> {
                Arc::new(self.value)
            }

            fn reset(&mut self) {
                self.value = $zero;
            }
        }
    };
}

extremum_aggregator!(
    /// Tracks the minimum of `i64` values; the zero value is `i64::MAX`.
    LongMinAggregator,
    min,
    i64::MAX
);
extremum_aggregator!(
    /// Tracks the maximum of `i64` values; the zero value is `i64::MIN`.
    LongMaxAggregator,
    max,
    i64::MIN
);

/* ===================== registry plumbing ===================== */

/// The master copies of every registered aggregator, owned by the driver.
pub(crate) struct AggregatorRegistry {
    masters: HashMap<String, Box<dyn Aggregator>>,
}

impl AggregatorRegistry {
    pub fn new() -> Self {
        Self {
            masters: HashMap::new(),
        }
    }

    /// Register a master copy. Duplicate names are a configuration error.
    pub fn register(&mut self, name: String, aggregator: Box<dyn Aggregator>) -> Result<()> {
        if self.masters.contains_key(&name) {
            return Err(anyhow!("duplicate aggregator name '{name}'"));
        }
        self.masters.insert(name, aggregator);
        Ok(())
    }

    /// A bag of fresh copies for one partition's superstep work.
    pub fn fresh_bag(&self) -> AggregatorBag {
        AggregatorBag {
            copies: self
                .masters
                .iter()
                .map(|(name, agg)| (name.clone(), agg.fresh()))
                .collect(),
        }
    }

    /// Merge the partition bags produced during a superstep into the masters.
    pub fn combine(&mut self, bags: Vec<AggregatorBag>) -> Result<()> {
        for bag in bags {
            for (name, copy) in bag.copies {
                let master = self
                    .masters
                    .get_mut(&name)
                    .expect("bags only hold registered names");
                master.merge_dyn(copy.snapshot().as_ref())?;
            }
        }
        Ok(())
    }

    /// Snapshot every aggregate for the next superstep's reads, then reset
    /// the masters.
    pub fn snapshot_and_reset(&mut self) -> AggregateSnapshot {
        let values = self
            .masters
            .iter_mut()
            .map(|(name, agg)| {
                let snap = agg.snapshot();
                agg.reset();
                (name.clone(), snap)
            })
            .collect();
        AggregateSnapshot { values }
    }
}

/// Partition-local aggregator copies for one superstep.
pub(crate) struct AggregatorBag {
    copies: HashMap<String, Box<dyn Aggregator>>,
}

impl AggregatorBag {
    /// Fold `value` into the named aggregator.
    pub fn aggregate<T: Any + Send + Sync>(&mut self, name: &str, value: T) -> Result<()> {
        let copy = self
            .copies
            .get_mut(name)
            .ok_or_else(|| anyhow!("no aggregator registered under name '{name}'"))?;
        copy.aggregate_dyn(&value)
    }
}

/// The combined aggregates of the previous superstep, readable by UDFs.
#[derive(Clone, Default)]
pub(crate) struct AggregateSnapshot {
    values: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl AggregateSnapshot {
    pub fn get<T: Any + Clone>(&self, name: &str) -> Option<T> {
        self.values
            .get(name)
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_aggregator_folds_and_merges() {
        let mut registry = AggregatorRegistry::new();
        registry
            .register("sum".into(), Box::new(LongSumAggregator::new()))
            .unwrap();

        let mut a = registry.fresh_bag();
        let mut b = registry.fresh_bag();
        a.aggregate("sum", 3i64).unwrap();
        a.aggregate("sum", 4i64).unwrap();
        b.aggregate("sum", 10i64).unwrap();

        registry.combine(vec![a, b]).unwrap();
        let snap = registry.snapshot_and_reset();
        assert_eq!(snap.get::<i64>("sum"), Some(17));

        // The reset master starts the next superstep from zero.
        let snap = registry.snapshot_and_reset();
        assert_eq!(snap.get::<i64>("sum"), Some(0));
    }

    #[test]
    fn min_and_max_track_extremes() {
        let mut min = LongMinAggregator::new();
        let mut max = LongMaxAggregator::new();
        for v in [5i64, -2, 9] {
            min.aggregate_dyn(&v).unwrap();
            max.aggregate_dyn(&v).unwrap();
        }
        assert_eq!(min.snapshot().downcast_ref::<i64>(), Some(&-2));
        assert_eq!(max.snapshot().downcast_ref::<i64>(), Some(&9));
    }

    #[test]
    fn type_mismatch_is_an_error_not_a_panic() {
        let mut bag = {
            let mut registry = AggregatorRegistry::new();
            registry
                .register("sum".into(), Box::new(LongSumAggregator::new()))
                .unwrap();
            registry.fresh_bag()
        };
        assert!(bag.aggregate("sum", 1.5f64).is_err());
        assert!(bag.aggregate("missing", 1i64).is_err());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = AggregatorRegistry::new();
        registry
            .register("agg".into(), Box::new(LongSumAggregator::new()))
            .unwrap();
        assert!(
            registry
                .register("agg".into(), Box::new(LongMaxAggregator::new()))
                .is_err()
        );
    }
}
