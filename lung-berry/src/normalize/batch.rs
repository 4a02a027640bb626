use super::error::NormalizeError;
use super::illumination::non_uniformity_correction;
use super::matching::color_correction;
use super::reference::find_color_correction_reference;
use crate::progress::{notify, ProgressReport};
use crate::{CorrectedBatch, ImageBatch, MicroImage};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    }
}

/// 批次预处理: 逐图光照校正, 选出参考图像, 再做批内颜色校正.
///
/// 参考图像只在这里选一次, 记录在返回的 [`CorrectedBatch`] 中.
/// 图像不足 2 幅时直接返回错误, 不做任何计算.
///
/// 进度在三个阶段结束后分别汇报 (光照校正, 参考选择, 颜色校正).
pub fn preprocess_batch(
    batch: ImageBatch,
    progress: &mut dyn ProgressReport,
) -> Result<CorrectedBatch, NormalizeError> {
    if batch.len() < 2 {
        return Err(NormalizeError::TooFewImages(batch.len()));
    }
    let (names, images) = batch.into_parts();

    let flattened = correct_illumination(&images);
    notify(progress, 1.0 / 3.0);

    let reference_index = find_color_correction_reference(&flattened)?;
    notify(progress, 2.0 / 3.0);

    let corrected = color_correction(&flattened, reference_index)?;
    notify(progress, 1.0);

    log::info!(
        "pre-processed {} images, color reference: {} (#{reference_index})",
        corrected.len(),
        names[reference_index]
    );
    Ok(CorrectedBatch::new(names, corrected, reference_index))
}

#[cfg(feature = "rayon")]
fn correct_illumination(images: &[MicroImage]) -> Vec<MicroImage> {
    images.par_iter().map(non_uniformity_correction).collect()
}

#[cfg(not(feature = "rayon"))]
fn correct_illumination(images: &[MicroImage]) -> Vec<MicroImage> {
    images.iter().map(non_uniformity_correction).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{FnProgress, NoProgress, RecordingProgress};

    fn tinted(name: &str, rgb: [u8; 3]) -> (String, MicroImage) {
        let img = MicroImage::from_rgb_fn((24, 24), |(h, w)| {
            if (h / 6 + w / 6) % 2 == 0 {
                rgb
            } else {
                [rgb[0] / 2, rgb[1] / 2, rgb[2] / 2]
            }
        });
        (name.to_string(), img)
    }

    #[test]
    fn test_preprocess_batch() {
        let batch = ImageBatch::new(vec![
            tinted("c.png", [200, 100, 60]),
            tinted("a.png", [180, 90, 50]),
            tinted("b.png", [190, 95, 55]),
        ]);
        let mut rec = RecordingProgress::default();
        let out = preprocess_batch(batch, &mut rec).unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(rec.values.len(), 3);
        assert_eq!(rec.values.last(), Some(&1.0));
        assert!(rec.values.windows(2).all(|w| w[0] <= w[1]));

        // 参考图像的颜色校正是恒等变换.
        let r = out.reference_index();
        let reference = out.images()[r].clone();
        let again = color_correction(out.images(), r).unwrap();
        assert_eq!(again[r], reference);
        assert!(out.get("a.png").is_some());
    }

    #[test]
    fn test_singleton_batch_is_rejected() {
        let batch = ImageBatch::new(vec![tinted("only.png", [10, 200, 10])]);
        let err = preprocess_batch(batch, &mut RecordingProgress::default()).unwrap_err();
        assert_eq!(err, NormalizeError::TooFewImages(1));
    }

    #[test]
    fn test_panicking_reporter_does_not_change_result() {
        let batch = || {
            ImageBatch::new(vec![
                tinted("a.png", [180, 90, 50]),
                tinted("b.png", [120, 140, 60]),
            ])
        };
        let expected = preprocess_batch(batch(), &mut NoProgress).unwrap();

        let mut seen = Vec::new();
        let mut panicking = FnProgress(|f: f64| {
            seen.push(f);
            panic!("reporter bug at {f}");
        });
        let out = preprocess_batch(batch(), &mut panicking).unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(out.reference_index(), expected.reference_index());
        assert_eq!(out.images(), expected.images());
        assert_eq!(out.reference_name(), expected.reference_name());
    }
}
