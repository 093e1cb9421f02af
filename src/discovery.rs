//! Sequential discovery of `1.ext, 2.ext, ...` by batched existence probes.
//!
//! Each batch fans out one scoped thread per candidate index and fans the
//! answers back in over `mpsc::channel`. Answers arrive in any order; a
//! reorder buffer releases them in index order as soon as the contiguous
//! prefix is known, so early hits are emitted before the batch settles.
//!
//! Stop rule: failures are counted per index, in index order, across batch
//! boundaries. The loop ends at the index that completes a run of
//! `max_consecutive_failures` misses; answers after that index (even hits
//! in the same batch) are discarded. A batch is fully processed before the
//! next one is probed.

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use log::{debug, info};

use crate::config::DiscoveryConfig;
use crate::probe::Prober;
use crate::resource::ResourceId;

/// Why discovery ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `max_consecutive_failures` misses in a row, ending at `last_index`.
    FailureThreshold { last_index: u32 },
    /// The consumer went away.
    Cancelled,
    /// Index space exhausted.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub found: usize,
    pub probed: u32,
    pub stop: StopReason,
}

/// Run discovery to completion on the calling thread.
///
/// `on_found` sees every hit in index order; returning `Break` cancels.
pub fn run<F>(
    prober: &dyn Prober,
    ext: &str,
    params: &DiscoveryConfig,
    mut on_found: F,
) -> DiscoveryReport
where
    F: FnMut(ResourceId) -> ControlFlow<()>,
{
    let batch = params.batch_size.max(1);
    let threshold = params.max_consecutive_failures.max(1);

    let mut next: u32 = 1;
    let mut failures: u32 = 0;
    let mut found = 0usize;
    let mut probed = 0u32;
    let mut stop = StopReason::Exhausted;

    loop {
        let count = batch.min(u32::MAX - next + 1);
        debug!("discovery: probing batch [{next}, {})", next as u64 + count as u64);

        let flow = probe_batch(prober, ext, next, count, |index, exists| {
            probed += 1;
            if exists {
                failures = 0;
                found += 1;
                if on_found(ResourceId::new(index, ext)).is_break() {
                    stop = StopReason::Cancelled;
                    return ControlFlow::Break(());
                }
            } else {
                failures += 1;
                if failures >= threshold {
                    stop = StopReason::FailureThreshold { last_index: index };
                    return ControlFlow::Break(());
                }
            }
            ControlFlow::Continue(())
        });

        if flow.is_break() {
            break;
        }
        match next.checked_add(count) {
            Some(n) if count == batch => next = n,
            _ => break,
        }
        if !params.batch_delay.is_zero() {
            thread::sleep(params.batch_delay);
        }
    }

    let report = DiscoveryReport { found, probed, stop };
    info!("discovery: finished {report:?}");
    report
}

/// Probe `[start, start+count)` concurrently and feed answers to `visit`
/// in index order.
fn probe_batch<V>(
    prober: &dyn Prober,
    ext: &str,
    start: u32,
    count: u32,
    mut visit: V,
) -> ControlFlow<()>
where
    V: FnMut(u32, bool) -> ControlFlow<()>,
{
    thread::scope(|s| -> ControlFlow<()> {
        let (tx, rx) = mpsc::channel::<(u32, bool)>();
        for offset in 0..count {
            let tx = tx.clone();
            let index = start + offset;
            let id = ResourceId::new(index, ext);
            s.spawn(move || {
                let exists = prober.probe(&id);
                let _ = tx.send((index, exists));
            });
        }
        drop(tx);

        let mut pending: BTreeMap<u32, bool> = BTreeMap::new();
        let mut expected = start;
        for (index, exists) in rx {
            pending.insert(index, exists);
            while let Some(exists) = pending.remove(&expected) {
                if visit(expected, exists).is_break() {
                    return ControlFlow::Break(());
                }
                expected += 1;
            }
        }
        ControlFlow::Continue(())
    })
}

/// Message from the discovery worker to the UI thread.
#[derive(Debug)]
pub enum DiscoveryEvent {
    Found(ResourceId),
    Finished(DiscoveryReport),
}

/// Result of draining the worker channel.
#[derive(Debug, Default)]
pub struct Drained {
    pub found: Vec<ResourceId>,
    pub finished: Option<DiscoveryReport>,
}

/// Runs discovery on a background thread, streaming hits over a channel.
///
/// The UI thread drains with `try_recv()` at each poll cycle. Dropping the
/// worker drops the receiver; the thread notices at its next send and exits.
pub struct DiscoveryWorker {
    rx: mpsc::Receiver<DiscoveryEvent>,
    _handle: JoinHandle<()>,
}

impl DiscoveryWorker {
    pub fn spawn(prober: Box<dyn Prober + Send>, ext: String, params: DiscoveryConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            debug!("discovery worker: started");
            let report = run(prober.as_ref(), &ext, &params, |id| {
                match tx.send(DiscoveryEvent::Found(id)) {
                    Ok(()) => ControlFlow::Continue(()),
                    Err(_) => ControlFlow::Break(()),
                }
            });
            let _ = tx.send(DiscoveryEvent::Finished(report));
            debug!("discovery worker: exiting");
        });
        Self {
            rx,
            _handle: handle,
        }
    }

    /// Collect everything currently buffered without blocking.
    pub fn drain(&self) -> Drained {
        let mut drained = Drained::default();
        while let Ok(event) = self.rx.try_recv() {
            match event {
                DiscoveryEvent::Found(id) => drained.found.push(id),
                DiscoveryEvent::Finished(report) => drained.finished = Some(report),
            }
        }
        drained
    }
}
