//! The delta-iteration driver: builder API and the BSP superstep loop.
//!
//! A [`VertexCentricIteration`] is assembled once (setup phase) and then
//! executed as a fixed-point delta iteration (run phase):
//!
//! - the **solution set** holds the authoritative state of every vertex,
//!   partitioned by channel;
//! - the **work set** holds the vertices whose state changed in the previous
//!   superstep (initially, all vertices);
//! - each superstep runs the messaging pipeline over the work set, routes and
//!   unpacks the envelopes, and co-groups the delivered messages with the
//!   solution set for the update pipeline; the states emitted by the update
//!   function form the next work set.
//!
//! Partitions are processed in parallel within each phase; the join of the
//! parallel scope is the global barrier, after which aggregators are combined
//! and published for the next superstep. The iteration terminates when the
//! work set is empty or the configured superstep bound is reached.
//!
//! All configuration errors are reported from [`create_result`] before the
//! first superstep runs; no partially-executed job is observable.
//!
//! [`create_result`]: VertexCentricIteration::create_result
//!
//! # Example
//!
//! ```no_run
//! use anyhow::Result;
//! use vertexflow::{
//!     Messages, MessagingContext, MessagingFunction, UpdateContext, VertexCentricIteration,
//!     VertexUpdateFunction,
//! };
//!
//! // Connected components: propagate the minimum label.
//! struct MinLabelUpdate;
//! impl VertexUpdateFunction<i64, i64, i64> for MinLabelUpdate {
//!     fn update_vertex(
//!         &self,
//!         _ctx: &mut UpdateContext<'_>,
//!         _key: &i64,
//!         state: &i64,
//!         messages: Messages<'_, i64>,
//!     ) -> Result<Option<i64>> {
//!         let smallest = messages.min().copied().unwrap_or(*state);
//!         Ok((smallest < *state).then_some(smallest))
//!     }
//! }
//!
//! struct LabelMessenger;
//! impl MessagingFunction<i64, i64, i64, ()> for LabelMessenger {
//!     fn send_messages(
//!         &self,
//!         ctx: &mut MessagingContext<'_, i64, i64, ()>,
//!         _key: &i64,
//!         state: &i64,
//!     ) -> Result<()> {
//!         ctx.send_message_to_all_neighbours(*state)
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let edges = vec![(1i64, 2i64), (2, 1), (2, 3), (3, 2)];
//! let vertices = vec![(1i64, 1i64), (2, 2), (3, 3)];
//!
//! let components = VertexCentricIteration::with_plain_edges(
//!     edges,
//!     MinLabelUpdate,
//!     LabelMessenger,
//!     20,
//! )
//! .set_name("connected components")
//! .set_input(vertices)
//! .create_result()?;
//! # Ok(())
//! # }
//! ```

use crate::aggregators::{AggregateSnapshot, Aggregator, AggregatorBag, AggregatorRegistry};
use crate::broadcast::BroadcastSets;
use crate::edge_index::EdgeIndex;
use crate::envelope::Envelope;
use crate::graph::{Data, VertexKey};
use crate::messaging::{MessagingContext, MessagingFunction};
use crate::partitioner::HashPartitioner;
use crate::solution::SolutionStore;
use crate::superstep::SuperstepContext;
use crate::unpack;
use crate::update::{Messages, UpdateContext, VertexUpdateFunction};
use anyhow::{Result, bail};
use rayon::prelude::*;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Builder and driver for one vertex-centric iteration job.
///
/// Construct with [`with_plain_edges`](Self::with_plain_edges) or
/// [`with_valued_edges`](Self::with_valued_edges), configure, then call
/// [`set_input`](Self::set_input) and [`create_result`](Self::create_result)
/// (or [`run`](Self::run) to do both at once).
pub struct VertexCentricIteration<K: VertexKey, V: Data, M: Data, E: Data> {
    edges: Vec<(K, K, E)>,
    update_fn: Arc<dyn VertexUpdateFunction<K, V, M>>,
    messaging_fn: Arc<dyn MessagingFunction<K, V, M, E>>,
    max_supersteps: usize,
    name: Option<String>,
    parallelism: i32,
    unmanaged_solution_set: bool,
    opt_degrees: bool,
    aggregators: Vec<(String, Box<dyn Aggregator>)>,
    messaging_broadcasts: Vec<(String, Arc<dyn Any + Send + Sync>)>,
    update_broadcasts: Vec<(String, Arc<dyn Any + Send + Sync>)>,
    initial: Option<Vec<(K, V)>>,
    #[cfg(feature = "metrics")]
    metrics: Option<crate::metrics::MetricsCollector>,
}

impl<K: VertexKey, V: Data, M: Data> VertexCentricIteration<K, V, M, ()> {
    /// Set up an iteration over value-less `(source, target)` edges.
    pub fn with_plain_edges(
        edges: Vec<(K, K)>,
        update_fn: impl VertexUpdateFunction<K, V, M> + 'static,
        messaging_fn: impl MessagingFunction<K, V, M, ()> + 'static,
        max_supersteps: usize,
    ) -> Self {
        Self::with_valued_edges(
            edges.into_iter().map(|(s, t)| (s, t, ())).collect(),
            update_fn,
            messaging_fn,
            max_supersteps,
        )
    }
}

impl<K: VertexKey, V: Data, M: Data, E: Data> VertexCentricIteration<K, V, M, E> {
    /// Set up an iteration over `(source, target, value)` edges.
    pub fn with_valued_edges(
        edges: Vec<(K, K, E)>,
        update_fn: impl VertexUpdateFunction<K, V, M> + 'static,
        messaging_fn: impl MessagingFunction<K, V, M, E> + 'static,
        max_supersteps: usize,
    ) -> Self {
        Self {
            edges,
            update_fn: Arc::new(update_fn),
            messaging_fn: Arc::new(messaging_fn),
            max_supersteps,
            name: None,
            parallelism: -1,
            unmanaged_solution_set: false,
            opt_degrees: false,
            aggregators: Vec::new(),
            messaging_broadcasts: Vec::new(),
            update_broadcasts: Vec::new(),
            initial: None,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Register a named aggregator. Duplicate names are rejected at
    /// submission time.
    pub fn register_aggregator(mut self, name: &str, aggregator: impl Aggregator + 'static) -> Self {
        self.aggregators
            .push((name.to_string(), Box::new(aggregator)));
        self
    }

    /// Make `data` available to the messaging function under `name`.
    ///
    /// The name [`HASH_KEYS_BROADCAST_SET`](crate::HASH_KEYS_BROADCAST_SET)
    /// is reserved by the engine and rejected at submission time.
    pub fn add_broadcast_set_for_messaging_function<T: Data>(
        mut self,
        name: &str,
        data: Vec<T>,
    ) -> Self {
        self.messaging_broadcasts
            .push((name.to_string(), Arc::new(data)));
        self
    }

    /// Make `data` available to the update function under `name`.
    pub fn add_broadcast_set_for_update_function<T: Data>(
        mut self,
        name: &str,
        data: Vec<T>,
    ) -> Self {
        self.update_broadcasts
            .push((name.to_string(), Arc::new(data)));
        self
    }

    /// Name the iteration, for error context and metrics.
    pub fn set_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Set the parallelism (the number of channels keys are partitioned
    /// over). Pass `-1` for the runtime default; any other non-positive value
    /// is rejected at submission time.
    pub fn set_parallelism(mut self, parallelism: i32) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Keep the solution set in a hash map instead of the default sorted
    /// layout.
    pub fn set_solution_set_unmanaged_memory(mut self, unmanaged: bool) -> Self {
        self.unmanaged_solution_set = unmanaged;
        self
    }

    /// Compute per-vertex out-degrees and expose them through
    /// [`MessagingContext::out_degree`](crate::MessagingContext::out_degree).
    pub fn set_opt_degrees(mut self, degrees: bool) -> Self {
        self.opt_degrees = degrees;
        self
    }

    /// Attach a metrics collector; keep a clone to read the counters after
    /// the run.
    #[cfg(feature = "metrics")]
    pub fn set_metrics(mut self, collector: crate::metrics::MetricsCollector) -> Self {
        self.metrics = Some(collector);
        self
    }

    /// Provide the initial vertex set: exactly one `(id, state)` pair per
    /// vertex.
    pub fn set_input(mut self, vertices: Vec<(K, V)>) -> Self {
        self.initial = Some(vertices);
        self
    }

    /// Convenience for `set_input(vertices).create_result()`.
    pub fn run(self, vertices: Vec<(K, V)>) -> Result<Vec<(K, V)>> {
        self.set_input(vertices).create_result()
    }

    /// Validate the configuration, execute the iteration, and return the
    /// final vertex states.
    ///
    /// # Errors
    ///
    /// Configuration errors (missing input, zero superstep bound, invalid
    /// parallelism, duplicate aggregator or broadcast-set names, duplicate
    /// vertex ids) are reported before any superstep runs. Runtime errors -- a
    /// message to a vertex missing from the solution set, illegal use of the
    /// exclusive edge APIs, or an error returned by a UDF -- abort the job.
    pub fn create_result(mut self) -> Result<Vec<(K, V)>> {
        let Some(initial) = self.initial.take() else {
            bail!("no initial vertex set: call set_input before create_result");
        };
        if self.max_supersteps == 0 {
            bail!("the maximum number of supersteps must be at least 1");
        }
        if self.parallelism <= 0 && self.parallelism != -1 {
            bail!("parallelism must be positive, or -1 for the runtime default");
        }
        let channels = if self.parallelism == -1 {
            num_cpus::get().max(1)
        } else {
            self.parallelism as usize
        };
        let iteration_name = self.name.take().unwrap_or_default();

        let mut registry = AggregatorRegistry::new();
        for (name, aggregator) in self.aggregators.drain(..) {
            registry.register(name, aggregator)?;
        }

        let mut msg_broadcasts = BroadcastSets::new();
        for (name, set) in self.messaging_broadcasts.drain(..) {
            msg_broadcasts.insert_user(&name, set)?;
        }
        let mut upd_broadcasts = BroadcastSets::new();
        for (name, set) in self.update_broadcasts.drain(..) {
            upd_broadcasts.insert_user(&name, set)?;
        }

        let partitioner = HashPartitioner::new(channels);
        let index = EdgeIndex::build(std::mem::take(&mut self.edges), &partitioner);
        msg_broadcasts.insert_reserved(Arc::new(index.representatives_table()));

        #[cfg(feature = "metrics")]
        let metrics = self.metrics.take();
        #[cfg(feature = "metrics")]
        if let Some(m) = &metrics {
            m.record_start();
            m.set_gauge(
                crate::metrics::ITERATION_NAME,
                serde_json::json!(iteration_name.clone()),
            );
        }

        let mut solution: Vec<SolutionStore<K, V>> = (0..channels)
            .map(|_| SolutionStore::new(self.unmanaged_solution_set))
            .collect();
        for (key, value) in &initial {
            solution[partitioner.channel_for(key)].insert_initial(key.clone(), value.clone())?;
        }
        let mut work: Vec<(K, V)> = initial;

        let update_fn = Arc::clone(&self.update_fn);
        let messaging_fn = Arc::clone(&self.messaging_fn);
        let opt_degrees = self.opt_degrees;
        let max_supersteps = self.max_supersteps;

        let mut previous = AggregateSnapshot::default();

        update_fn.init(&SuperstepContext {
            superstep: 1,
            iteration_name: &iteration_name,
            previous: &previous,
            broadcasts: &upd_broadcasts,
        })?;

        let mut superstep = 1usize;
        while superstep <= max_supersteps && !work.is_empty() {
            let msg_sctx = SuperstepContext {
                superstep,
                iteration_name: &iteration_name,
                previous: &previous,
                broadcasts: &msg_broadcasts,
            };
            let upd_sctx = SuperstepContext {
                superstep,
                iteration_name: &iteration_name,
                previous: &previous,
                broadcasts: &upd_broadcasts,
            };
            messaging_fn.pre_superstep(&msg_sctx)?;
            update_fn.pre_superstep(&upd_sctx)?;

            // Messaging phase: every partition packs envelopes for its share
            // of the work set.
            let mut work_parts: Vec<Vec<(K, V)>> = Vec::with_capacity(channels);
            work_parts.resize_with(channels, Vec::new);
            for (key, value) in work {
                work_parts[partitioner.channel_for(&key)].push((key, value));
            }

            let packed: Result<Vec<(Vec<Envelope<K, M>>, AggregatorBag)>> = work_parts
                .into_par_iter()
                .map(|part| {
                    let mut bag = registry.fresh_bag();
                    let mut ctx = MessagingContext::new(
                        superstep,
                        &partitioner,
                        index.representatives(),
                        &msg_broadcasts,
                        &previous,
                        &mut bag,
                    );
                    for (key, value) in part {
                        let edges = index.outgoing(&key);
                        let degree = opt_degrees.then(|| edges.as_ref().map_or(0, |e| e.len()));
                        ctx.set_vertex(key.clone(), edges, degree);
                        messaging_fn.send_messages(&mut ctx, &key, &value)?;
                    }
                    Ok((ctx.into_envelopes(), bag))
                })
                .collect();

            let mut envelopes: Vec<Envelope<K, M>> = Vec::new();
            let mut bags: Vec<AggregatorBag> = Vec::new();
            for (mut part_envelopes, bag) in packed? {
                envelopes.append(&mut part_envelopes);
                bags.push(bag);
            }

            #[cfg(feature = "metrics")]
            if let Some(m) = &metrics {
                let broadcast = envelopes.iter().filter(|e| e.is_broadcast()).count() as u64;
                m.add_to_counter(crate::metrics::BROADCAST_ENVELOPES, broadcast);
                m.add_to_counter(
                    crate::metrics::EXPLICIT_ENVELOPES,
                    envelopes.len() as u64 - broadcast,
                );
            }

            // Shuffle: every envelope lands on the partition it addresses.
            let routed = unpack::route_by_channel(envelopes, channels);

            // Update phase: co-group the unpacked messages with the solution
            // set, one partition at a time.
            let results: Result<Vec<(Vec<(K, V)>, AggregatorBag, u64)>> = solution
                .par_iter_mut()
                .zip(routed.into_par_iter())
                .enumerate()
                .map(|(channel, (store, channel_envelopes))| {
                    let pairs = unpack::unpack_channel(channel, channel_envelopes, &index);
                    let delivered = pairs.len() as u64;
                    let mut grouped: HashMap<K, Vec<M>> = HashMap::new();
                    for (recipient, payload) in pairs {
                        grouped.entry(recipient).or_default().push(payload);
                    }

                    let mut bag = registry.fresh_bag();
                    let mut delta: Vec<(K, V)> = Vec::new();
                    for (key, messages) in grouped {
                        let Some(state) = store.get(&key) else {
                            bail!(
                                "cannot deliver a message to vertex {key:?}: \
                                 it has no entry in the solution set"
                            );
                        };
                        let mut ctx =
                            UpdateContext::new(superstep, &upd_broadcasts, &previous, &mut bag);
                        let produced =
                            update_fn.update_vertex(&mut ctx, &key, state, Messages::new(&messages))?;
                        if let Some(new_state) = produced {
                            store.update(&key, new_state.clone());
                            delta.push((key, new_state));
                        }
                    }
                    Ok((delta, bag, delivered))
                })
                .collect();

            let mut new_work: Vec<(K, V)> = Vec::new();
            let mut delivered_total = 0u64;
            for (mut delta, bag, delivered) in results? {
                new_work.append(&mut delta);
                bags.push(bag);
                delivered_total += delivered;
            }

            messaging_fn.post_superstep(&msg_sctx)?;
            update_fn.post_superstep(&upd_sctx)?;

            // Barrier: combine the partition-local aggregator copies and
            // publish them for the next superstep.
            registry.combine(bags)?;
            previous = registry.snapshot_and_reset();

            #[cfg(feature = "metrics")]
            if let Some(m) = &metrics {
                m.add_to_counter(crate::metrics::SUPERSTEPS, 1);
                m.add_to_counter(crate::metrics::MESSAGES_DELIVERED, delivered_total);
                m.add_to_counter(crate::metrics::VERTICES_UPDATED, new_work.len() as u64);
            }
            #[cfg(not(feature = "metrics"))]
            let _ = delivered_total;

            work = new_work;
            superstep += 1;
        }

        #[cfg(feature = "metrics")]
        if let Some(m) = &metrics {
            m.record_end();
        }

        Ok(solution
            .into_iter()
            .flat_map(SolutionStore::into_pairs)
            .collect())
    }
}
