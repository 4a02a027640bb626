use super::residual::residual_mask;
use super::stage::{SegmentationConfig, SegmentationStage};
use super::threshold::{color_mask, hsv_planes, resolve_cutoff, saturation_mask};
use super::GenerateParams;
use crate::blur::{blur_rgb, gaussian_blur_sigma, sharpen, sigma_for_kernel};
use crate::color::resolve_colors;
use crate::data::channel;
use crate::eight::external_contours;
use crate::geometry::Region;
use crate::progress::{ProgressReport, Steps};
use crate::{BinaryMask, MicroImage};
use ndarray::Array2;

pub(super) struct GeneratorImp<'a> {
    image: &'a MicroImage,
    config: &'a SegmentationConfig,
    params: &'a GenerateParams,
}

impl<'a> GeneratorImp<'a> {
    pub(super) fn new(
        image: &'a MicroImage,
        config: &'a SegmentationConfig,
        params: &'a GenerateParams,
    ) -> Self {
        Self {
            image,
            config,
            params,
        }
    }

    pub(super) fn generate(&self, progress: &mut dyn ProgressReport) -> Vec<Region> {
        let mut steps = Steps::new(self.config.len() + usize::from(self.params.process_residual));
        steps.finish_if_empty(progress);

        let mut ans = Vec::new();
        for (i, stage) in self.config.stages.iter().enumerate() {
            let mask = self.stage_mask(stage);
            let before = ans.len();
            let min = self.params.filter_min_size;
            Self::collect(&mask, |area| stage.accepts(area, min), &mut ans);
            log::debug!(
                "stage #{i} ({}, kernel {:?}) kept {} candidates",
                stage.kind(),
                stage.blur_kernel(),
                ans.len() - before
            );
            steps.advance(progress);
        }

        if self.params.process_residual {
            let mut claimed = BinaryMask::new(self.image.shape());
            for r in ans.iter() {
                r.footprint().paint_into(&mut claimed);
            }
            let mask = residual_mask(self.image, &claimed, &self.params.residual);
            let before = ans.len();
            let min = self.params.filter_min_size;
            let max = self.params.residual.max_size;
            Self::collect(
                &mask,
                |area| area >= min && max.map_or(true, |m| area <= m),
                &mut ans,
            );
            log::debug!("residual pass kept {} candidates", ans.len() - before);
            steps.advance(progress);
        }
        ans
    }

    /// 单个阶段的前景掩码.
    fn stage_mask(&self, stage: &SegmentationStage) -> BinaryMask {
        let kernel = stage.blur_kernel();
        match stage {
            SegmentationStage::Color(args) => {
                let colors = resolve_colors(args.colors.iter().map(String::as_str));
                if colors.is_empty() {
                    return BinaryMask::new(self.image.shape());
                }
                let mut hsv = hsv_planes(&blur_rgb(self.image, kernel));
                self.enhance(&mut hsv[channel::V], channel::V, kernel);
                color_mask(&hsv, &colors)
            }
            SegmentationStage::Saturation(args) => {
                let mut hsv = hsv_planes(&blur_rgb(self.image, kernel));
                self.enhance(&mut hsv[channel::S], channel::S, kernel);
                let cutoff = resolve_cutoff(hsv[channel::S].view(), args.cutoff);
                log::debug!("saturation cutoff: {cutoff}");
                saturation_mask(hsv[channel::S].view(), hsv[channel::V].view(), cutoff)
            }
        }
    }

    /// 高斯差分增强: `P₁ + (P₁ − P₂)`, 其中 `P₂` 的 sigma 是阶段 sigma 的 `dog_factor` 倍.
    fn enhance(&self, p1: &mut Array2<f32>, c: usize, (kw, kh): (u32, u32)) {
        let Some(factor) = self.params.dog_factor.filter(|f| *f > 1.0) else {
            return;
        };
        let original = self.image.hsv().index_axis(ndarray::Axis(2), c).mapv(|v| v as f32);
        let p2 = gaussian_blur_sigma(
            original.view(),
            (sigma_for_kernel(kw) * factor, sigma_for_kernel(kh) * factor),
        );
        *p1 = sharpen(p1, &p2);
    }

    fn collect(mask: &BinaryMask, accept: impl Fn(usize) -> bool, out: &mut Vec<Region>) {
        out.extend(
            external_contours(mask)
                .iter()
                .filter_map(|c| Region::from_contour(c))
                .filter(|r| accept(r.area())),
        );
    }
}
