//! Fixed-size worker pool dispatch.
//!
//! Every source id is handed to a pool of exactly `workers` threads; each
//! runs [`Executor::run`] for one source at a time. The call returns only
//! when every dispatched source has finished or faulted.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use jsonl_pipes::{Executor, PipelineError, Sink, Source};
use rayon::prelude::*;

use crate::report::{ParallelReport, SourceOutcome};

/// Run every source on a pool of `workers` threads and collect one outcome
/// per source.
///
/// A fault in one source is logged and recorded in the report; it does not
/// stop or affect the others. A panic while running a source is caught and
/// recorded as [`PipelineError::Panicked`] for that source. Only failing to
/// build the pool is an error.
pub fn run_parallel<S, K, T>(
    executor: &Executor<S, K>,
    source_ids: &[T],
    workers: usize,
) -> Result<ParallelReport, PipelineError>
where
    S: Source,
    K: Sink,
    T: AsRef<str> + Sync,
{
    if workers == 0 {
        return Err(PipelineError::Pool(
            "at least one worker is required".to_string(),
        ));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("pipe-worker-{i}"))
        .build()
        .map_err(|e| PipelineError::Pool(e.to_string()))?;

    log::info!(
        "dispatching {} sources to {workers} workers",
        source_ids.len()
    );

    let outcomes: Vec<SourceOutcome> = pool.install(|| {
        source_ids
            .par_iter()
            .map(|source_id| {
                let source_id = source_id.as_ref();
                let result = panic::catch_unwind(AssertUnwindSafe(|| executor.run(source_id)))
                    .unwrap_or_else(|payload| {
                        Err(PipelineError::Panicked(panic_message(payload)))
                    });
                if let Err(e) = &result {
                    log::error!("{source_id}: {e}");
                }
                SourceOutcome {
                    source_id: source_id.to_string(),
                    result,
                }
            })
            .collect()
    });

    Ok(ParallelReport::new(outcomes))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonl_pipes::{CountingSink, MemorySource, PipelineConfig, RecordStream, TransformedRecord};
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    fn kept_lines(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!(r#"{{"kind":"string-tag","string":"apple{i}"}}"#))
            .collect()
    }

    fn config(batch_size: usize) -> PipelineConfig {
        PipelineConfig {
            batch_size,
            ..Default::default()
        }
    }

    /// Wraps a source and counts how often each id is opened.
    struct OpenCounter {
        inner: MemorySource,
        opens: Mutex<HashMap<String, usize>>,
    }

    impl Source for OpenCounter {
        fn open(&self, source_id: &str) -> Result<RecordStream<'_>, PipelineError> {
            *self
                .opens
                .lock()
                .unwrap()
                .entry(source_id.to_string())
                .or_default() += 1;
            self.inner.open(source_id)
        }
    }

    /// Records which thread persisted each batch.
    #[derive(Default)]
    struct ThreadSink {
        threads: Mutex<HashSet<String>>,
    }

    impl Sink for ThreadSink {
        fn persist(
            &self,
            batch: &mut dyn Iterator<Item = TransformedRecord>,
        ) -> Result<usize, PipelineError> {
            let name = std::thread::current()
                .name()
                .unwrap_or_default()
                .to_string();
            self.threads.lock().unwrap().insert(name);
            CountingSink.persist(batch)
        }
    }

    #[test]
    fn test_every_source_runs_exactly_once() {
        let ids: Vec<String> = (0..12).map(|i| format!("src-{i}")).collect();
        let mut inner = MemorySource::new();
        for (i, id) in ids.iter().enumerate() {
            inner = inner.with_lines(id.clone(), kept_lines(i + 1));
        }

        for workers in [1, 2, 5, 32] {
            let source = OpenCounter {
                inner: inner.clone(),
                opens: Mutex::new(HashMap::new()),
            };
            let exec = Executor::new(&config(4), source, CountingSink).unwrap();
            let report = run_parallel(&exec, &ids, workers).unwrap();

            assert_eq!(report.len(), ids.len());
            assert!(report.is_success());
            assert_eq!(report.total(), (1..=12).sum::<usize>());
            for (i, outcome) in report.outcomes().iter().enumerate() {
                assert_eq!(outcome.source_id, ids[i]);
                assert_eq!(outcome.result.as_ref().unwrap(), &(i + 1));
            }

            let opens = exec.source().opens.lock().unwrap();
            assert_eq!(opens.len(), ids.len());
            assert!(opens.values().all(|&n| n == 1));
        }
    }

    #[test]
    fn test_fault_is_isolated_to_its_source() {
        let source = MemorySource::new()
            .with_lines("good", kept_lines(5))
            .with_lines("bad", ["{not json"])
            .with_lines("also-good", kept_lines(2));
        let exec = Executor::new(&config(2), source, CountingSink).unwrap();

        let report = run_parallel(&exec, &["good", "bad", "missing", "also-good"], 3).unwrap();

        assert_eq!(report.total(), 7);
        let failed: Vec<&str> = report.failures().map(|o| o.source_id.as_str()).collect();
        assert_eq!(failed, vec!["bad", "missing"]);
        assert!(matches!(
            report.outcomes()[1].result,
            Err(PipelineError::Decode { line: 1, .. })
        ));
        assert!(matches!(
            report.outcomes()[2].result,
            Err(PipelineError::Open { .. })
        ));
    }

    #[test]
    fn test_runs_on_pool_threads() {
        let ids: Vec<String> = (0..8).map(|i| format!("s{i}")).collect();
        let mut source = MemorySource::new();
        for id in &ids {
            source = source.with_lines(id.clone(), kept_lines(10));
        }
        let exec = Executor::new(&config(3), source, ThreadSink::default()).unwrap();

        let report = run_parallel(&exec, &ids, 2).unwrap();
        assert_eq!(report.total(), 80);

        let threads = exec.sink().threads.lock().unwrap();
        assert!(!threads.is_empty());
        assert!(threads.len() <= 2);
        assert!(threads.iter().all(|t| t.starts_with("pipe-worker-")));
    }

    /// Panics when asked for the id "boom", otherwise defers to `inner`.
    struct PanickingSource {
        inner: MemorySource,
    }

    impl Source for PanickingSource {
        fn open(&self, source_id: &str) -> Result<RecordStream<'_>, PipelineError> {
            if source_id == "boom" {
                panic!("source {source_id} exploded");
            }
            self.inner.open(source_id)
        }
    }

    #[test]
    fn test_panic_is_isolated_to_its_source() {
        let source = PanickingSource {
            inner: MemorySource::new()
                .with_lines("a", kept_lines(3))
                .with_lines("b", kept_lines(4)),
        };
        let exec = Executor::new(&config(2), source, CountingSink).unwrap();

        let report = run_parallel(&exec, &["a", "boom", "b"], 2).unwrap();

        assert_eq!(report.len(), 3);
        assert_eq!(report.total(), 7);
        let failed: Vec<&str> = report.failures().map(|o| o.source_id.as_str()).collect();
        assert_eq!(failed, vec!["boom"]);
        match &report.outcomes()[1].result {
            Err(PipelineError::Panicked(msg)) => assert_eq!(msg, "source boom exploded"),
            other => panic!("expected panic outcome, got {other:?}"),
        }
    }

    #[test]
    fn test_no_sources() {
        let exec = Executor::new(&config(10), MemorySource::new(), CountingSink).unwrap();
        let report = run_parallel::<_, _, String>(&exec, &[], 4).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let exec = Executor::new(&config(10), MemorySource::new(), CountingSink).unwrap();
        assert!(matches!(
            run_parallel(&exec, &["a"], 0),
            Err(PipelineError::Pool(_))
        ));
    }
}
