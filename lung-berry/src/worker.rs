//! 后台任务交接.
//!
//! 算法本身是同步的纯函数. 需要保持界面响应的调用方可以把一次任务交给
//! [`SegmentationWorker`]: 任务在后台线程运行, 进度和结果都通过 mpsc 通道送回,
//! 调用方在自己的线程上接收并修改标注状态. 同一时刻只允许一个任务.

use crate::geometry::Region;
use crate::normalize::{preprocess_batch, NormalizeError};
use crate::progress::{ChannelProgress, ProgressReport};
use crate::segment::{generate_with, GenerateParams, SegmentationConfig};
use crate::{CorrectedBatch, ImageBatch, MicroImage};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;

/// 后台任务发回的消息. 一次任务以若干 `Progress` 开始, 以恰好一个 `Finished` 结束.
#[derive(Debug)]
pub enum JobMessage<T> {
    /// 已完成的比例.
    Progress(f64),

    /// 任务结果.
    Finished(T),
}

/// 提交任务失败.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobError {
    /// 已有任务在运行.
    Busy,
}

impl Display for JobError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            JobError::Busy => write!(f, "another job is still running"),
        }
    }
}

impl std::error::Error for JobError {}

/// 任务结束 (包括 panic) 时清除忙标志.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 单任务后台执行器.
#[derive(Debug, Default)]
pub struct SegmentationWorker {
    busy: Arc<AtomicBool>,
}

impl SegmentationWorker {
    /// 创建执行器.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否有任务正在运行.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// 在后台线程运行 `job`. 已有任务在运行时返回 [`JobError::Busy`].
    ///
    /// 忙标志在发送 `Finished` 之前清除, 因此收到结果后即可提交下一个任务.
    pub fn spawn<T, F>(&self, job: F) -> Result<Receiver<JobMessage<T>>, JobError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn ProgressReport) -> T + Send + 'static,
    {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(JobError::Busy);
        }

        let (tx, rx) = channel();
        let guard = BusyGuard(Arc::clone(&self.busy));
        thread::spawn(move || {
            let mut progress = ChannelProgress::new(tx.clone(), JobMessage::Progress);
            let ans = job(&mut progress);
            drop(guard);
            if tx.send(JobMessage::Finished(ans)).is_err() {
                log::debug!("job finished after its receiver was dropped");
            }
        });
        Ok(rx)
    }

    /// 在后台生成一幅图像的候选区域.
    pub fn spawn_segmentation(
        &self,
        image: Arc<MicroImage>,
        config: SegmentationConfig,
        params: GenerateParams,
    ) -> Result<Receiver<JobMessage<Vec<Region>>>, JobError> {
        self.spawn(move |progress| generate_with(&image, &config, &params, progress))
    }

    /// 在后台预处理一批图像.
    pub fn spawn_preprocess(
        &self,
        batch: ImageBatch,
    ) -> Result<Receiver<JobMessage<Result<CorrectedBatch, NormalizeError>>>, JobError> {
        self.spawn(move |progress| preprocess_batch(batch, progress))
    }
}

/// 阻塞地接收消息直到任务结束, 返回收到的进度值和结果.
/// 任务线程异常退出 (未发送结果) 时返回 `None`.
pub fn wait<T>(rx: &Receiver<JobMessage<T>>) -> Option<(Vec<f64>, T)> {
    let mut values = Vec::new();
    for msg in rx.iter() {
        match msg {
            JobMessage::Progress(f) => values.push(f),
            JobMessage::Finished(ans) => return Some((values, ans)),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{ColorArgs, SegmentationStage};
    use std::sync::mpsc::sync_channel;

    fn red_square() -> MicroImage {
        MicroImage::from_rgb_fn((40, 40), |(h, w)| {
            if (10..30).contains(&h) && (10..30).contains(&w) {
                [220, 30, 30]
            } else {
                [0, 0, 0]
            }
        })
    }

    fn red_config() -> SegmentationConfig {
        SegmentationConfig::from(vec![SegmentationStage::Color(ColorArgs {
            blur_kernel: (1, 1),
            min_size: 10,
            max_size: None,
            colors: vec!["red".to_string()],
        })])
    }

    #[test]
    fn test_segmentation_job() {
        let worker = SegmentationWorker::new();
        let rx = worker
            .spawn_segmentation(Arc::new(red_square()), red_config(), GenerateParams::default())
            .unwrap();
        let (progress, regions) = wait(&rx).unwrap();
        assert_eq!(progress, vec![1.0]);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area(), 400);
        assert!(!worker.is_busy());
    }

    #[test]
    fn test_second_job_is_rejected() {
        let worker = SegmentationWorker::new();
        let (gate_tx, gate_rx) = sync_channel::<()>(0);
        let rx = worker
            .spawn(move |progress| {
                gate_rx.recv().ok();
                crate::progress::notify(progress, 1.0);
                7
            })
            .unwrap();
        assert!(worker.is_busy());
        assert_eq!(worker.spawn(|_| 0).unwrap_err(), JobError::Busy);

        gate_tx.send(()).unwrap();
        assert_eq!(wait(&rx), Some((vec![1.0], 7)));
        assert!(!worker.is_busy());
        let again = worker.spawn(|_| 1).unwrap();
        assert_eq!(wait(&again).map(|r| r.1), Some(1));
    }

    #[test]
    fn test_preprocess_job_reports_errors() {
        let worker = SegmentationWorker::new();
        let batch = ImageBatch::new(vec![("only.png".to_string(), red_square())]);
        let rx = worker.spawn_preprocess(batch).unwrap();
        let (_, ans) = wait(&rx).unwrap();
        assert_eq!(ans.unwrap_err(), NormalizeError::TooFewImages(1));
    }
}
