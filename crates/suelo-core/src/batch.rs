use crossbeam_channel::{unbounded, RecvTimeoutError};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::extraction::PageContent;
use crate::model::Record;
use crate::page::extract_page_record;

/// Tuning knobs for batched page processing.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Pages handled per batch before the memory check runs.
    pub batch_size: usize,
    /// Upper bound on worker threads; a batch never spawns more workers
    /// than it has pages.
    pub max_workers: usize,
    /// How long to wait for any one page result before giving up on it.
    pub page_timeout: Duration,
    /// Resident-memory percentage above which batches back off.
    pub memory_threshold_percent: f32,
    /// Pause inserted between batches while memory stays high.
    pub backoff: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            batch_size: 5,
            max_workers: 4,
            page_timeout: Duration::from_secs(30),
            memory_threshold_percent: 80.0,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Resident-memory measurement, as a percentage of total system memory.
pub trait MemoryProbe: Send + Sync {
    fn usage_percent(&self) -> Option<f32>;
}

/// Probe that never reports pressure.
pub struct NoMemoryProbe;

impl MemoryProbe for NoMemoryProbe {
    fn usage_percent(&self) -> Option<f32> {
        None
    }
}

/// Linux probe reading VmRSS from /proc/self/status against MemTotal
/// from /proc/meminfo. Reports nothing on other platforms.
pub struct ProcMemoryProbe;

impl MemoryProbe for ProcMemoryProbe {
    fn usage_percent(&self) -> Option<f32> {
        let rss_kb = read_kb_line("/proc/self/status", "VmRSS:")?;
        let total_kb = read_kb_line("/proc/meminfo", "MemTotal:")?;
        if total_kb == 0 {
            return None;
        }
        Some(rss_kb as f32 / total_kb as f32 * 100.0)
    }
}

fn read_kb_line(path: &str, prefix: &str) -> Option<u64> {
    let content = std::fs::read_to_string(path).ok()?;
    content
        .lines()
        .find(|l| l.starts_with(prefix))?
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()
}

/// Process pages in fixed-size batches over a small worker pool.
///
/// Records come back in completion order within each batch; batches
/// themselves run sequentially. A page that panics is dropped with a
/// warning. A page that exceeds its timeout is abandoned: the batch
/// stops waiting for it, and a result it delivers late is discarded
/// rather than emitted.
pub fn process_pages(
    pages: Vec<PageContent>,
    config: &BatchConfig,
    probe: &dyn MemoryProbe,
) -> Vec<Record> {
    process_pages_with(pages, config, probe, extract_page_record)
}

/// Same as [`process_pages`] with the per-page function supplied by the
/// caller, so the orchestration can be tested in isolation.
fn process_pages_with<F>(
    pages: Vec<PageContent>,
    config: &BatchConfig,
    probe: &dyn MemoryProbe,
    task: F,
) -> Vec<Record>
where
    F: Fn(&PageContent) -> Option<Record> + Send + Sync + 'static,
{
    let pages: Vec<Arc<PageContent>> = pages.into_iter().map(Arc::new).collect();
    let task = Arc::new(task);
    let batch_size = config.batch_size.max(1);
    let mut records = Vec::new();

    for (batch_index, batch) in pages.chunks(batch_size).enumerate() {
        if batch_index > 0 {
            if let Some(usage) = probe.usage_percent() {
                if usage > config.memory_threshold_percent {
                    tracing::warn!(
                        usage_percent = usage,
                        threshold = config.memory_threshold_percent,
                        "memory pressure, backing off between batches"
                    );
                    thread::sleep(config.backoff);
                }
            }
        }

        let workers = config.max_workers.max(1).min(batch.len());
        tracing::debug!(
            batch = batch_index,
            pages = batch.len(),
            workers,
            "processing batch"
        );

        let (job_tx, job_rx) = unbounded::<(usize, Arc<PageContent>)>();
        let (result_tx, result_rx) = unbounded::<(usize, Option<Record>)>();

        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let task = Arc::clone(&task);
            thread::spawn(move || {
                for (index, page) in job_rx {
                    let record = match catch_unwind(AssertUnwindSafe(|| task(&page))) {
                        Ok(record) => record,
                        Err(_) => {
                            tracing::warn!(page = page.page_number, "page task panicked");
                            None
                        }
                    };
                    // the batch may have stopped waiting already
                    if result_tx.send((index, record)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(job_rx);
        drop(result_tx);

        for (index, page) in batch.iter().enumerate() {
            if job_tx.send((index, Arc::clone(page))).is_err() {
                break;
            }
        }
        drop(job_tx);

        // Wait on each page in submission order with its own deadline.
        // Results are index-tagged so an abandoned page's late result is
        // never mistaken for a live one.
        let mut done = vec![false; batch.len()];
        let mut timed_out = vec![false; batch.len()];
        'pages: for waiting_on in 0..batch.len() {
            if done[waiting_on] {
                continue;
            }
            let deadline = Instant::now() + config.page_timeout;
            loop {
                let remaining = deadline.saturating_duration_since(Instant::now());
                match result_rx.recv_timeout(remaining) {
                    Ok((index, record)) => {
                        if timed_out[index] {
                            tracing::debug!(
                                batch = batch_index,
                                "discarding late result of abandoned page"
                            );
                            continue;
                        }
                        done[index] = true;
                        if let Some(record) = record {
                            records.push(record);
                        }
                        if index == waiting_on {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        tracing::warn!(batch = batch_index, "page result timed out");
                        timed_out[waiting_on] = true;
                        break;
                    }
                    Err(RecvTimeoutError::Disconnected) => break 'pages,
                }
            }
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_page(n: usize, producer: &str) -> PageContent {
        PageContent {
            page_number: n,
            text: format!("Nombre del productor {producer} Coordenadas 19.0"),
            tokens: Vec::new(),
        }
    }

    fn producer_names(records: &[Record]) -> Vec<&str> {
        let mut names: Vec<&str> = records
            .iter()
            .map(|r| r.get("nombre_productor").unwrap())
            .collect();
        names.sort_unstable();
        names
    }

    #[test]
    fn test_batches_produce_all_useful_records() {
        let pages = vec![
            field_page(1, "ANA LOPEZ"),
            field_page(2, "LUIS MARTINEZ"),
            field_page(3, "EVA TORRES"),
        ];
        let config = BatchConfig {
            batch_size: 2,
            max_workers: 2,
            ..BatchConfig::default()
        };
        let records = process_pages(pages, &config, &NoMemoryProbe);
        assert_eq!(records.len(), 3);
        assert_eq!(
            producer_names(&records),
            vec!["ANA LOPEZ", "EVA TORRES", "LUIS MARTINEZ"]
        );
    }

    #[test]
    fn test_useless_pages_yield_no_records() {
        let pages = vec![PageContent {
            page_number: 1,
            text: "sin contenido".to_string(),
            tokens: Vec::new(),
        }];
        let records = process_pages(pages, &BatchConfig::default(), &NoMemoryProbe);
        assert!(records.is_empty());
    }

    #[test]
    fn test_single_worker_matches_parallel_result_set() {
        let names = ["ANA", "BETO", "CARLA", "DARIO", "ELENA", "FELIX"];
        let pages: Vec<PageContent> = names
            .iter()
            .enumerate()
            .map(|(i, name)| field_page(i + 1, name))
            .collect();

        let serial = BatchConfig {
            batch_size: 1,
            max_workers: 1,
            ..BatchConfig::default()
        };
        let parallel = BatchConfig {
            batch_size: 3,
            max_workers: 4,
            ..BatchConfig::default()
        };

        let a = process_pages(pages.clone(), &serial, &NoMemoryProbe);
        let b = process_pages(pages, &parallel, &NoMemoryProbe);
        assert_eq!(a.len(), 6);
        assert_eq!(producer_names(&a), producer_names(&b));
    }

    #[test]
    fn test_panicking_page_task_is_absorbed() {
        let pages = vec![
            field_page(1, "ANA"),
            field_page(2, "BETO"),
            field_page(3, "CARLA"),
        ];
        let config = BatchConfig {
            batch_size: 3,
            max_workers: 2,
            ..BatchConfig::default()
        };
        let records = process_pages_with(pages, &config, &NoMemoryProbe, |page| {
            if page.page_number == 2 {
                panic!("malformed page");
            }
            extract_page_record(page)
        });
        assert_eq!(producer_names(&records), vec!["ANA", "CARLA"]);
    }

    #[test]
    fn test_timed_out_page_yields_no_record() {
        let pages = vec![
            field_page(1, "ANA"),
            field_page(2, "BETO"),
            field_page(3, "CARLA"),
        ];
        let config = BatchConfig {
            batch_size: 3,
            max_workers: 3,
            page_timeout: Duration::from_millis(200),
            ..BatchConfig::default()
        };
        let records = process_pages_with(pages, &config, &NoMemoryProbe, |page| {
            if page.page_number == 2 {
                thread::sleep(Duration::from_secs(2));
            }
            extract_page_record(page)
        });
        // the slow page is abandoned; its late result is discarded, and
        // the rest of the batch still completes
        assert_eq!(producer_names(&records), vec!["ANA", "CARLA"]);
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        let config = BatchConfig {
            batch_size: 0,
            max_workers: 0,
            ..BatchConfig::default()
        };
        let records = process_pages(vec![field_page(1, "ANA")], &config, &NoMemoryProbe);
        assert_eq!(records.len(), 1);
    }
}
