//! 🫁欢迎光临🔬
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Point2d};

pub use crate::data::{
    BinaryMask, Connectivity, CorrectedBatch, ImageBatch, ImgWriteVis, IntensityWindow,
    MicroImage,
};

#[cfg(feature = "plot")]
pub use crate::data::ImgDisplay;

pub use crate::consts::gray::{MASK_BACKGROUND, MASK_FOREGROUND};
pub use crate::consts::{BACKGROUND_CLASS, DEFAULT_FILTER_MIN_SIZE};

pub use crate::geometry::{Polygon, Rect, Region};

pub use crate::normalize::{
    color_correction, find_color_correction_reference, non_uniformity_correction,
    preprocess_batch, NormalizeError,
};

pub use crate::segment::{
    generate_structure_candidates, generate_structure_candidates_in, generate_with,
    ConfigBuilder, GenerateParams, ProbeStructureMap, SegmentationConfig, SegmentationStage,
};

pub use crate::split::{split_region, SplitError};

pub use crate::eval::{evaluate, generate_iou_pred_matrices, EvalData, EvalReport};

pub use crate::annotation::{AnnotationSet, LabelCode, RegionId, RegionStore};

pub use crate::progress::{NoProgress, ProgressReport};

pub use crate::worker::{JobMessage, SegmentationWorker};
