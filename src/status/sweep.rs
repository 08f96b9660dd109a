//! 并行状态检查
//!
//! 每个条目一个检查任务，先获取信号量许可（上限 5）再判定。
//! 完成顺序不保证，只保证同时进行的判定不超过上限。

use super::classifier::StatusClassifier;
use crate::catalog::PackageRecord;
use crate::package_manager::ProgressSample;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, Semaphore};

/// 同时进行的状态判定上限
pub const STATUS_CONCURRENCY: usize = 5;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    pub total: usize,
    pub completed: usize,
    /// 观测到的最大并发判定数
    pub peak_in_flight: usize,
}

/// 对整个目录做一次状态检查，全部任务结束后才返回
///
/// 每个任务完成时发送一次进度，`completed` 来自原子计数器，
/// 每个任务恰好加一，因此单调递增且不会超前于真实完成数。
pub async fn sweep(
    classifier: &StatusClassifier,
    records: &mut [PackageRecord],
    progress: Option<&mpsc::UnboundedSender<ProgressSample>>,
) -> SweepSummary {
    let total = records.len();
    if total == 0 {
        return SweepSummary::default();
    }

    let semaphore = &Semaphore::new(STATUS_CONCURRENCY);
    let completed = &AtomicUsize::new(0);
    let in_flight = &AtomicUsize::new(0);
    let peak = &AtomicUsize::new(0);

    let mut tasks: FuturesUnordered<_> = records
        .iter_mut()
        .map(move |record| async move {
            // 许可随作用域释放，无论判定如何结束
            let Ok(_permit) = semaphore.acquire().await else {
                return;
            };
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);

            classifier.classify(record).await;

            in_flight.fetch_sub(1, Ordering::SeqCst);
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(tx) = progress {
                let _ = tx.send(ProgressSample::new(total, done, record.label()));
            }
        })
        .collect();

    while tasks.next().await.is_some() {}
    drop(tasks);

    let summary = SweepSummary {
        total,
        completed: completed.load(Ordering::SeqCst),
        peak_in_flight: peak.load(Ordering::SeqCst),
    };
    log::info!("状态检查完成: {} 个条目", summary.completed);
    summary
}
