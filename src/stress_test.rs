use async_stream::stream;
use futures::future::try_join_all;
use futures::stream::Stream;
use futures::stream::StreamExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};
use vdag_sdk::prelude::*;

type Store = MemoryNodeStore<String, u64>;
type Replica = VersionDag<String, u64>;

/// Why a simulation run failed.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("replica task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("replica {replica} ended on different heads than replica 0")]
    HeadsDiverged { replica: usize },

    #[error("replica {replica} linearized the history differently than replica 0")]
    HistoryDiverged { replica: usize },

    #[error("expected {expected} versions in the history, resolved {found}")]
    MissingVersions { expected: usize, found: usize },

    #[error("paging in steps of {page_size} did not reproduce the full history")]
    PagesDiverged { page_size: usize },
}

/// Statistics collected during a replica simulation
#[derive(Clone, Debug)]
pub struct StressTestStats {
    pub num_replicas: usize,
    pub operations_per_replica: usize,
    pub total_merges: usize,
    pub merge_nodes_written: usize,
    pub nodes_stored: usize,
    pub history_len: usize,
    pub pages: usize,
    pub total_time: Duration,
    pub avg_merge_time: Duration,
    pub avg_resolve_time: Duration,
    pub ops_per_second: f64,
}

impl StressTestStats {
    pub fn print(&self) {
        println!("\n╔════════════════════════════════════════════════════════════╗");
        println!("║              Replica Simulation Statistics                 ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║  Number of Replicas:        {:>30} ║", self.num_replicas);
        println!("║  Versions per Replica:      {:>30} ║", self.operations_per_replica);
        println!("║  Merge Operations:          {:>30} ║", self.total_merges);
        println!("║  Merge Nodes Written:       {:>30} ║", self.merge_nodes_written);
        println!("║  Nodes Stored:              {:>30} ║", self.nodes_stored);
        println!("║  Linearized Versions:       {:>30} ║", self.history_len);
        println!("║  Pages Walked:              {:>30} ║", self.pages);
        println!("║  Total Time:                {:>29}s ║", format!("{:.3}", self.total_time.as_secs_f64()));
        println!("║  Average Merge Time:        {:>28}µs ║", self.avg_merge_time.as_micros());
        println!("║  Average Resolve Time:      {:>28}µs ║", self.avg_resolve_time.as_micros());
        println!("║  Operations/Second:         {:>30.0} ║", self.ops_per_second);
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

/// Generator that yields replica index pairs to merge
fn replica_merge_generator(num_replicas: usize, num_merges: usize) -> impl Stream<Item = (usize, usize)> {
    stream! {
        let mut rng = StdRng::from_entropy();
        for _ in 0..num_merges {
            let replica_a = rng.gen_range(0..num_replicas);
            let replica_b = rng.gen_range(0..num_replicas);
            yield (replica_a, replica_b);
        }
    }
}

fn average(times: &[Duration]) -> Duration {
    if times.is_empty() {
        return Duration::ZERO;
    }
    times.iter().sum::<Duration>() / times.len() as u32
}

fn version_names(resolution: &Resolution<String, u64>) -> Vec<&str> {
    resolution.versions.iter().map(|v| v.version.as_str()).collect()
}

/// Replica `replica_a` merges the heads of `replica_b` into its own view.
///
/// Returns whether a merge node was written.
async fn perform_merge(
    replicas: &mut [Replica],
    replica_a: usize,
    replica_b: usize,
    merge_times: &mut Vec<Duration>,
) -> Result<bool, SimulationError> {
    if replica_a == replica_b {
        return Ok(false); // Skip self-merge
    }

    let merge_start = Instant::now();

    let other = replicas[replica_b].heads().to_vec();
    let merged = replicas[replica_a].merge(&other, None).await?;
    let written = merged != replicas[replica_a];
    replicas[replica_a] = merged;

    merge_times.push(merge_start.elapsed());
    debug!(replica_a, replica_b, written, "merged replica heads");

    Ok(written)
}

/// Simulate `num_replicas` writers diverging from a shared root and
/// converging again through random pairwise merges.
///
/// Every replica must end up on the same heads and linearize the same
/// history, and paging through that history must reproduce it.
pub async fn stress_test_replicas(
    num_replicas: usize,
    ops_per_replica: usize,
    num_merges: usize,
) -> Result<StressTestStats, SimulationError> {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║        Replica Simulation (Async)                          ║");
    println!("║  Replicas: {} | Versions/Replica: {} | Merges: {} ║",
             num_replicas, ops_per_replica, num_merges);
    println!("╚════════════════════════════════════════════════════════════╝");

    let start = Instant::now();

    let store = Arc::new(Store::new());
    let config = Config::builder(Arc::clone(&store))
        .read_concurrency(Concurrency::bounded(16))
        .tie_breaker(|a, b| a.meta.cmp(&b.meta))
        .build();

    // Logical clock shared by all writers; children always stamp after parents
    let clock = Arc::new(AtomicU64::new(1));
    let root = Replica::create("root".to_string(), Some(0), config).await?;

    println!("\n[Phase 1/4] Appending versions on every replica...");

    let mut handles = vec![];
    for idx in 0..num_replicas {
        let root = root.clone();
        let clock = Arc::clone(&clock);
        let handle = tokio::spawn(async move {
            let mut dag = root;
            for i in 0..ops_per_replica {
                let stamp = clock.fetch_add(1, Ordering::SeqCst);
                dag = dag.add(format!("r{}-{}", idx, i), Some(stamp)).await?;

                if i % 100 == 0 {
                    tokio::task::yield_now().await;
                }
            }
            Ok::<_, ResolveError>(dag)
        });
        handles.push(handle);
    }

    let mut replicas = Vec::with_capacity(num_replicas);
    for handle in handles {
        replicas.push(handle.await??);
    }

    println!("[Phase 1/4] ✓ Completed");
    println!("[Phase 2/4] Merging random replica pairs...");

    let mut merge_times = vec![];
    let mut merge_gen = Box::pin(replica_merge_generator(num_replicas, num_merges));

    let mut total_merges = 0;
    let mut merge_nodes_written = 0;
    while let Some((replica_a, replica_b)) = merge_gen.next().await {
        if perform_merge(&mut replicas, replica_a, replica_b, &mut merge_times).await? {
            merge_nodes_written += 1;
        }
        total_merges += 1;

        if total_merges % 100 == 0 {
            println!("  Merges completed: {}/{}", total_merges, num_merges);
        }
    }

    println!("[Phase 2/4] ✓ Completed");
    println!("[Phase 3/4] Converging and resolving from every replica...");

    // Every replica learns every other replica's heads
    let all_heads: Vec<Cid> = replicas.iter().flat_map(|dag| dag.heads().iter().copied()).collect();
    let mut finals = Vec::with_capacity(num_replicas);
    for replica in &replicas {
        let merge_start = Instant::now();
        finals.push(replica.union(&all_heads).merge(&[], None).await?);
        merge_times.push(merge_start.elapsed());
    }

    if let Some(replica) = finals.iter().position(|dag| dag != &finals[0]) {
        return Err(SimulationError::HeadsDiverged { replica });
    }

    let resolutions = try_join_all(finals.iter().map(|dag| async move {
        let resolve_start = Instant::now();
        let resolution = dag.resolve(ResolveOptions::new()).await?;
        Ok::<_, ResolveError>((resolution, resolve_start.elapsed()))
    }))
    .await?;

    let resolve_times: Vec<Duration> = resolutions.iter().map(|(_, time)| *time).collect();
    let (history, _) = &resolutions[0];

    if let Some(replica) = resolutions.iter().position(|(resolution, _)| resolution != history) {
        return Err(SimulationError::HistoryDiverged { replica });
    }

    let expected = num_replicas * ops_per_replica + 1;
    if history.versions.len() != expected {
        return Err(SimulationError::MissingVersions {
            expected,
            found: history.versions.len(),
        });
    }

    println!("[Phase 3/4] ✓ Completed");
    println!("[Phase 4/4] Paging through the converged history...");

    let page_size = (expected / 8).max(1);
    let full = version_names(history);
    let mut paged: Vec<String> = Vec::with_capacity(full.len());
    let mut next = finals[0].heads().to_vec();
    let mut pages = 0;

    while !next.is_empty() {
        let page = finals[0]
            .resolve(ResolveOptions::new().from_cids(next).limit(page_size))
            .await?;
        paged.extend(page.versions.into_iter().map(|v| v.version));
        next = page.next_cids;
        pages += 1;

        if pages > expected {
            warn!(pages, "paging did not terminate");
            break;
        }
    }

    if paged != full {
        return Err(SimulationError::PagesDiverged { page_size });
    }

    println!("[Phase 4/4] ✓ Completed");

    let total_time = start.elapsed();
    let total_operations = num_replicas * ops_per_replica + total_merges + resolutions.len() + pages;
    let ops_per_second = total_operations as f64 / total_time.as_secs_f64();

    info!(
        replicas = num_replicas,
        versions = history.versions.len(),
        nodes = store.len(),
        "replicas converged"
    );

    Ok(StressTestStats {
        num_replicas,
        operations_per_replica: ops_per_replica,
        total_merges,
        merge_nodes_written,
        nodes_stored: store.len(),
        history_len: history.versions.len(),
        pages,
        total_time,
        avg_merge_time: average(&merge_times),
        avg_resolve_time: average(&resolve_times),
        ops_per_second,
    })
}

/// Repeat the simulation with a growing number of replicas
pub async fn stress_test_scaling(max_replicas: usize, step_size: usize) -> Result<(), SimulationError> {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║    Scaling Analysis - Resolution Cost vs Replicas          ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    let mut current_replicas = step_size;
    while current_replicas <= max_replicas {
        let stats = stress_test_replicas(current_replicas, 25, current_replicas * 4).await?;
        stats.print();
        current_replicas += step_size;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generator_yields_requested_pairs() {
        let pairs: Vec<_> = replica_merge_generator(3, 50).collect().await;

        assert_eq!(pairs.len(), 50);
        assert!(pairs.iter().all(|(a, b)| *a < 3 && *b < 3));
    }

    #[test]
    fn test_average() {
        assert_eq!(average(&[]), Duration::ZERO);
        assert_eq!(
            average(&[Duration::from_micros(10), Duration::from_micros(30)]),
            Duration::from_micros(20)
        );
    }

    #[tokio::test]
    async fn test_replicas_converge() {
        let stats = stress_test_replicas(3, 10, 12).await.unwrap();

        assert_eq!(stats.history_len, 31);
        assert_eq!(stats.total_merges, 12);
        assert!(stats.pages >= 8);
    }

    #[tokio::test]
    async fn test_single_replica_needs_no_merges() {
        let stats = stress_test_replicas(1, 5, 4).await.unwrap();

        assert_eq!(stats.history_len, 6);
        assert_eq!(stats.merge_nodes_written, 0);
        assert_eq!(stats.nodes_stored, 6);
    }
}
