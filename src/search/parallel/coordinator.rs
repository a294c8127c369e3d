//! Parallel search coordinator that manages worker threads.

use crate::digest::TargetSet;
use crate::error::{FinderError, Result};
use crate::search::parallel::channel::{
    CoordinatorChannels, SearchEvent, SharedProgress, WorkerChannels, WorkerMessage,
    create_channels,
};
use crate::search::parallel::config::ParallelConfig;
use crate::search::range::{SearchRange, partition, search_range};
use crate::search::result::{ResultMap, SearchResult, SearchStatistics, WorkerStatistics};
use crossbeam_channel::RecvTimeoutError;
use std::any::Any;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Reverse `hashes` by hashing every identifier in `[1, max_id]`.
///
/// `workers` defaults to the number of CPUs. Hashes without a match are
/// absent from the returned map.
pub fn run_search<S: AsRef<str>>(
    hashes: &[S],
    max_id: i64,
    workers: Option<usize>,
) -> Result<ResultMap> {
    let config = ParallelConfig::default().with_workers_option(workers);
    run_parallel_search(hashes, max_id, &config).map(|result| result.found)
}

/// Run parallel search with the given configuration.
///
/// An empty target set or `max_id < 1` returns an empty result without
/// spawning any worker. A panicking worker aborts the whole search.
pub fn run_parallel_search<S: AsRef<str>>(
    hashes: &[S],
    max_id: i64,
    config: &ParallelConfig,
) -> Result<SearchResult> {
    let targets = TargetSet::from_hashes(hashes);
    if targets.rejected() > 0 {
        warn!(
            "{} of {} input hashes are not SHA-256 hex digests and can never match",
            targets.rejected(),
            hashes.len()
        );
    }

    let stats = SearchStatistics {
        max_id: max_id.max(0) as u64,
        targets: targets.len(),
        ..Default::default()
    };

    if max_id < 1 {
        warn!("max_id is {}, no candidates to search", max_id);
        return Ok(SearchResult::empty(stats));
    }
    if targets.is_empty() {
        info!("No target digests, nothing to search");
        return Ok(SearchResult::empty(stats));
    }

    let target_count = targets.len();
    let targets = Arc::new(targets);
    let interval = config.progress_interval;

    dispatch(max_id as u64, target_count, config, move |range, progress| {
        let mut found = ResultMap::new();
        for block in range.blocks(interval) {
            found.extend(search_range(block, &targets));
            progress.add(block.len());
        }
        found
    })
}

type WorkerBody = Box<dyn FnOnce() + Send + 'static>;

fn spawn_named(worker_id: usize, body: WorkerBody) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("search-worker-{}", worker_id))
        .spawn(body)
}

/// Partition `[1, max_id]`, run `job` on every range in its own thread, then
/// merge the local maps once every worker has joined.
fn dispatch<F>(
    max_id: u64,
    target_count: usize,
    config: &ParallelConfig,
    job: F,
) -> Result<SearchResult>
where
    F: Fn(SearchRange, &SharedProgress) -> ResultMap + Send + Sync + 'static,
{
    dispatch_with(max_id, target_count, config, job, spawn_named)
}

/// `dispatch` with a custom thread spawner.
///
/// If a worker cannot be spawned, the workers already running are joined
/// before the spawn error is returned.
fn dispatch_with<F, S>(
    max_id: u64,
    target_count: usize,
    config: &ParallelConfig,
    job: F,
    mut spawn: S,
) -> Result<SearchResult>
where
    F: Fn(SearchRange, &SharedProgress) -> ResultMap + Send + Sync + 'static,
    S: FnMut(usize, WorkerBody) -> io::Result<JoinHandle<()>>,
{
    let start_time = Instant::now();
    let ranges = partition(max_id, config.num_workers);
    let num_workers = ranges.len();

    let (coordinator_channels, worker_channels) = create_channels(num_workers);
    let job = Arc::new(job);

    info!(
        "Searching [1, {}] for {} digests with {} workers",
        max_id, target_count, num_workers
    );
    config.emit(SearchEvent::Started {
        max_id,
        workers: num_workers,
        targets: target_count,
    });

    let mut worker_handles = Vec::with_capacity(num_workers);
    let mut spawn_error = None;
    for (worker_id, (range, channels)) in ranges.into_iter().zip(worker_channels).enumerate() {
        let job = Arc::clone(&job);
        let body: WorkerBody =
            Box::new(move || run_worker(worker_id, range, channels, job.as_ref()));
        match spawn(worker_id, body) {
            Ok(handle) => worker_handles.push(handle),
            Err(source) => {
                spawn_error = Some(FinderError::WorkerSpawn { worker_id, source });
                break;
            }
        }
    }

    if let Some(err) = spawn_error {
        error!("{}, waiting for {} started workers", err, worker_handles.len());
        join_workers(worker_handles);
        return Err(err);
    }

    let (found, worker_statistics) =
        run_coordinator(coordinator_channels, config, num_workers, max_id);

    if let Some(err) = join_workers(worker_handles) {
        return Err(err);
    }

    let elapsed = start_time.elapsed();
    let statistics = SearchStatistics {
        max_id,
        workers: num_workers,
        targets: target_count,
        candidates_hashed: worker_statistics.iter().map(|w| w.candidates_hashed).sum(),
        elapsed_time: elapsed,
        worker_statistics,
    };

    info!(
        "Matched {} of {} digests in {:.2?}",
        found.len(),
        target_count,
        elapsed
    );
    config.emit(SearchEvent::Completed {
        matched: found.len(),
        elapsed,
    });

    Ok(SearchResult { found, statistics })
}

/// Coordinator loop that receives finished maps and merges them.
///
/// Returns once every worker reported or every worker sender is gone.
fn run_coordinator(
    channels: CoordinatorChannels,
    config: &ParallelConfig,
    total_workers: usize,
    total_candidates: u64,
) -> (ResultMap, Vec<WorkerStatistics>) {
    let mut found = ResultMap::new();
    let mut worker_stats: Vec<WorkerStatistics> = Vec::with_capacity(total_workers);

    while worker_stats.len() < total_workers {
        match channels.from_workers.recv_timeout(config.progress_tick) {
            Ok(WorkerMessage::Finished {
                worker_id,
                candidates_hashed,
                found: local,
            }) => {
                debug!(
                    "Worker {} finished: {} hashed, {} matches",
                    worker_id,
                    candidates_hashed,
                    local.len()
                );
                config.emit(SearchEvent::WorkerFinished {
                    worker_id,
                    candidates_hashed,
                    matches: local.len(),
                });
                worker_stats.push(WorkerStatistics {
                    worker_id,
                    candidates_hashed,
                    matches: local.len(),
                });
                // Digests are unique keys, merge order does not matter
                found.extend(local);
            }
            Err(RecvTimeoutError::Timeout) => {
                config.emit(SearchEvent::Progress {
                    hashed: channels.progress.hashed(),
                    total: total_candidates,
                });
            }
            Err(RecvTimeoutError::Disconnected) => {
                // All senders dropped, any missing worker panicked
                break;
            }
        }
    }

    config.emit(SearchEvent::Progress {
        hashed: channels.progress.hashed(),
        total: total_candidates,
    });
    worker_stats.sort_by_key(|w| w.worker_id);

    (found, worker_stats)
}

/// Worker body: run the job over its range and hand the local map back.
fn run_worker<F>(worker_id: usize, range: SearchRange, channels: WorkerChannels, job: &F)
where
    F: Fn(SearchRange, &SharedProgress) -> ResultMap,
{
    if range.is_empty() {
        debug!("Worker {} has an empty range", worker_id);
    } else {
        debug!("Worker {} hashing {}", worker_id, range);
    }

    let found = job(range, &channels.progress);

    let _ = channels.to_coordinator.send(WorkerMessage::Finished {
        worker_id,
        candidates_hashed: range.len(),
        found,
    });
}

/// Join every handle. Returns the first panic, in worker order, as `WorkerFailure`.
fn join_workers(handles: Vec<JoinHandle<()>>) -> Option<FinderError> {
    let mut failure = None;
    for (worker_id, handle) in handles.into_iter().enumerate() {
        if let Err(payload) = handle.join() {
            let message = panic_message(payload.as_ref());
            error!("Worker {} panicked: {}", worker_id, message);
            if failure.is_none() {
                failure = Some(FinderError::WorkerFailure { worker_id, message });
            }
        }
    }
    failure
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
