//! 进度汇报.
//!
//! 算法只依赖 [`ProgressReport`] 接口. 汇报失败 (返回 `Err` 或 panic)
//! 只会被记录为警告, 不会中断算法.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::Sender;

/// 一次进度汇报的结果.
pub type ReportResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// 进度接收方. `fraction` 位于 `[0, 1]`, 在同一次任务中单调不减.
pub trait ProgressReport {
    /// 汇报已完成的比例.
    fn report(&mut self, fraction: f64) -> ReportResult;
}

/// 隔离地调用 `reporter.report(fraction)`. 错误和 panic 都只被记录.
pub fn notify(reporter: &mut dyn ProgressReport, fraction: f64) {
    let fraction = fraction.clamp(0.0, 1.0);
    match catch_unwind(AssertUnwindSafe(|| reporter.report(fraction))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::warn!("progress report at {fraction:.3} failed: {e}"),
        Err(_) => log::warn!("progress reporter panicked at {fraction:.3}"),
    }
}

/// 把固定个数的步骤换算成进度比例.
#[derive(Debug, Clone)]
pub(crate) struct Steps {
    done: usize,
    total: usize,
}

impl Steps {
    #[inline]
    pub(crate) fn new(total: usize) -> Self {
        Self { done: 0, total }
    }

    /// 完成一步, 并汇报 `done / total`.
    pub(crate) fn advance(&mut self, reporter: &mut dyn ProgressReport) {
        self.done = (self.done + 1).min(self.total);
        notify(reporter, self.done as f64 / self.total as f64);
    }

    /// 一步都没有时, 直接汇报完成.
    pub(crate) fn finish_if_empty(&self, reporter: &mut dyn ProgressReport) {
        if self.total == 0 {
            notify(reporter, 1.0);
        }
    }
}

/// 丢弃所有汇报.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReport for NoProgress {
    #[inline]
    fn report(&mut self, _fraction: f64) -> ReportResult {
        Ok(())
    }
}

/// 记录所有汇报, 主要用于测试.
#[derive(Debug, Clone, Default)]
pub struct RecordingProgress {
    /// 按顺序收到的所有进度值.
    pub values: Vec<f64>,
}

impl ProgressReport for RecordingProgress {
    fn report(&mut self, fraction: f64) -> ReportResult {
        self.values.push(fraction);
        Ok(())
    }
}

/// 通过 mpsc 通道转发汇报. 接收端关闭后的汇报会失败 (并被记录).
#[derive(Debug, Clone)]
pub struct ChannelProgress<T> {
    tx: Sender<T>,
    wrap: fn(f64) -> T,
}

impl ChannelProgress<f64> {
    /// 直接发送进度值.
    pub fn plain(tx: Sender<f64>) -> Self {
        Self { tx, wrap: |f| f }
    }
}

impl<T> ChannelProgress<T> {
    /// 以 `wrap` 把进度值包装为消息后发送.
    pub fn new(tx: Sender<T>, wrap: fn(f64) -> T) -> Self {
        Self { tx, wrap }
    }
}

impl<T: Send + 'static> ProgressReport for ChannelProgress<T> {
    fn report(&mut self, fraction: f64) -> ReportResult {
        self.tx
            .send((self.wrap)(fraction))
            .map_err(|_| "progress receiver disconnected".into())
    }
}

/// 把闭包当作进度接收方.
pub struct FnProgress<F: FnMut(f64)>(pub F);

impl<F: FnMut(f64)> ProgressReport for FnProgress<F> {
    fn report(&mut self, fraction: f64) -> ReportResult {
        (self.0)(fraction);
        Ok(())
    }
}
