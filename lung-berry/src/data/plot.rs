//! 图片展示模块, 主要用于调试.
//!
//! # 注意
//!
//! 需要 `plot` feature.

use super::{BinaryMask, MicroImage};
use crate::Idx2d;
use opencv::core::{Scalar, Vec3b, CV_8UC1, CV_8UC3};
use opencv::highgui::{imshow, wait_key};
use opencv::prelude::{Mat, MatTrait, MatTraitConst};
use std::time::Duration;

/// 表明一个可以在窗口中可视化的对象.
pub trait ImgDisplay {
    /// 展示对象.
    fn show(&self) -> opencv::Result<()>;

    /// 同 `show()`, 但在之后自动等待一次用户按键输入.
    fn show_and_wait(&self) -> opencv::Result<i32> {
        self.show()?;
        wait_key(0)
    }

    /// 同 `show()`, 但在之后自动等待给定时间.
    fn show_and_wait_for(&self, d: Duration) -> opencv::Result<i32> {
        self.show()?;
        let ms = d.as_millis().min(i32::MAX as u128);
        wait_key(ms as i32)
    }
}

fn blank_mat((h, w): Idx2d, typ: i32) -> opencv::Result<Mat> {
    Mat::new_rows_cols_with_default(h as i32, w as i32, typ, Scalar::all(0.0))
}

/// 以 BGR 顺序展示 RGB 平面.
impl ImgDisplay for MicroImage {
    fn show(&self) -> opencv::Result<()> {
        let mut mat = blank_mat(self.shape(), CV_8UC3)?;
        for (h, w) in super::PosIter::new(self.shape()) {
            let [r, g, b] = self.rgb_at((h, w));
            *mat.at_2d_mut::<Vec3b>(h as i32, w as i32)? = Vec3b::from([b, g, r]);
        }
        imshow("Image", &mat)
    }
}

/// 前景为白色, 背景为黑色.
impl ImgDisplay for BinaryMask {
    fn show(&self) -> opencv::Result<()> {
        let mut mat = blank_mat(self.shape(), CV_8UC1)?;
        for pos in self.pos_iter() {
            *mat.at_2d_mut::<u8>(pos.0 as i32, pos.1 as i32)? = self[pos];
        }
        imshow("Mask", &mat)
    }
}
