//! 子命令的实际运行.

use crate::report;
use clap::Args;
use lung_berry::annotation::{AnnotationSet, RegionStore};
use lung_berry::consts::DEFAULT_FILTER_MIN_SIZE;
use lung_berry::eval::{evaluate as evaluate_data, EvalData};
use lung_berry::geometry::Region;
use lung_berry::normalize::preprocess_batch;
use lung_berry::progress::{FnProgress, NoProgress};
use lung_berry::segment::{
    generate_with, ConfigBuilder, GenerateParams, ProbeStructureMap, SegmentationConfig,
    StageColorSets,
};
use lung_berry::MicroImage;
use std::error::Error;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::panic;
use std::path::{Path, PathBuf};
use std::thread;
use utils::loader;

type RunResult = Result<(), Box<dyn Error>>;

/// `segment` 子命令参数.
#[derive(Args, Debug)]
pub struct SegmentArgs {
    /// Image directory; defaults to $LUNGMAP_IMAGE_DIR or ~/dataset/lungmap/images
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Segmentation config file (a JSON list of stages)
    #[arg(short, long, value_name = "FILE", conflicts_with = "probe_map")]
    config: Option<PathBuf>,

    /// Probe-structure map file, used with --probe to build the config
    #[arg(long, value_name = "FILE")]
    probe_map: Option<PathBuf>,

    /// Probe and its color in the image, may be repeated
    #[arg(short, long, value_name = "PROBE=COLOR", requires = "probe_map")]
    probe: Vec<String>,

    /// Output annotation file
    #[arg(short, long, value_name = "FILE", default_value = "annotations.json")]
    out: PathBuf,

    /// Minimum candidate area shared by all stages
    #[arg(long, value_name = "N", default_value_t = DEFAULT_FILTER_MIN_SIZE)]
    filter_min_size: usize,

    /// Difference-of-Gaussians sigma factor
    #[arg(long, value_name = "FLOAT")]
    dog_factor: Option<f32>,

    /// Run the residual pass after all stages
    #[arg(long)]
    residual: bool,

    /// Number of parallel threads
    #[arg(short = 'j', long, value_name = "N")]
    threads: Option<usize>,
}

impl SegmentArgs {
    fn params(&self) -> GenerateParams {
        GenerateParams {
            filter_min_size: self.filter_min_size,
            dog_factor: self.dog_factor,
            process_residual: self.residual,
            ..Default::default()
        }
    }

    fn config(&self) -> Result<SegmentationConfig, Box<dyn Error>> {
        if let Some(p) = self.config.as_ref() {
            return Ok(SegmentationConfig::from_json(&fs::read_to_string(p)?)?);
        }
        let Some(p) = self.probe_map.as_ref() else {
            return Err("either --config or --probe-map must be given".into());
        };
        let map = ProbeStructureMap::from_reader(BufReader::new(File::open(p)?))?;
        let pairs = parse_probes(&self.probe)?;
        let colors = StageColorSets::from_probes(pairs.iter().map(|(p, c)| (*p, *c)), &map);
        let config = ConfigBuilder::default().build(&colors);
        if config.is_empty() {
            return Err("no probe has structure relations, nothing to segment".into());
        }
        Ok(config)
    }
}

/// 解析 `PROBE=COLOR`.
fn parse_probes(items: &[String]) -> Result<Vec<(&str, &str)>, String> {
    items
        .iter()
        .map(|s| match s.split_once('=') {
            Some((p, c)) if !p.trim().is_empty() && !c.trim().is_empty() => Ok((p.trim(), c.trim())),
            _ => Err(format!("invalid probe `{s}`, expected PROBE=COLOR")),
        })
        .collect()
}

/// 在 `threads` 个线程上对所有图像执行 `generate`, 保持输入顺序.
///
/// 任一工作线程 panic 时, 在调用线程上重新抛出, 不会丢掉该线程负责的图像.
fn generate_all<'a, F>(
    items: &[(&'a str, &'a MicroImage)],
    generate: F,
    threads: usize,
) -> Vec<(&'a str, Vec<Region>)>
where
    F: Fn(&MicroImage) -> Vec<Region> + Sync,
{
    let chunk = items.len().div_ceil(threads.max(1)).max(1);
    let generate = &generate;
    thread::scope(|s| {
        let handles: Vec<_> = items
            .chunks(chunk)
            .map(|part| {
                s.spawn(move || {
                    part.iter()
                        .map(|&(name, image)| (name, generate(image)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut ans = Vec::with_capacity(items.len());
        for h in handles {
            match h.join() {
                Ok(part) => ans.extend(part),
                Err(e) => panic::resume_unwind(e),
            }
        }
        ans
    })
}

/// `segment`: 归一化整批图像, 生成候选区域并写出标注文件.
pub fn segment(args: &SegmentArgs) -> RunResult {
    let dir = match args.dir.clone().or_else(loader::image_dir_from_env_or_home) {
        Some(d) => d,
        None => return Err("cannot determine the image directory".into()),
    };
    let config = args.config()?;
    let params = args.params();
    let batch = loader::load_batch(&dir)?;

    let corrected;
    let items: Vec<(&str, &MicroImage)> = if batch.len() >= 2 {
        let mut progress = FnProgress(|f: f64| log::debug!("normalization {:.0}%", f * 100.0));
        corrected = preprocess_batch(batch, &mut progress)?;
        log::info!("color reference: `{}`", corrected.reference_name());
        corrected.iter().collect()
    } else {
        log::warn!("a single image cannot be color corrected, using it as is");
        batch.iter().collect()
    };

    let threads = args.threads.unwrap_or_else(utils::cpus);
    log::info!(
        "generating candidates for {} images with {} stages on {threads} threads",
        items.len(),
        config.len()
    );
    let mut set = AnnotationSet::new();
    let generate = |image: &MicroImage| generate_with(image, &config, &params, &mut NoProgress);
    for (name, regions) in generate_all(&items, generate, threads) {
        log::debug!("`{name}`: {} candidates", regions.len());
        set.insert(name, &RegionStore::from_candidates(regions));
    }
    set.save(&args.out)?;

    utils::sep();
    report::describe_annotations(&set, &mut std::io::stdout().lock())?;
    log::info!("annotations written to `{}`", args.out.display());
    Ok(())
}

fn load_eval_data(path: &Path) -> Result<EvalData, Box<dyn Error>> {
    Ok(EvalData::from_reader(BufReader::new(File::open(path)?))?)
}

/// `evaluate`: 匹配预测与真值并输出各类别的 ROC / PR 指标.
pub fn evaluate(file: Option<PathBuf>, json: Option<PathBuf>) -> RunResult {
    let path = match file.or_else(loader::eval_file_from_env_or_home) {
        Some(p) => p,
        None => return Err("cannot determine the evaluation file".into()),
    };
    let data = load_eval_data(&path)?;
    log::info!(
        "{} truth regions, {} predictions",
        data.truth.regions.len(),
        data.predictions.len()
    );
    let ans = evaluate_data(&data);

    utils::sep();
    report::describe_into(&ans, &mut std::io::stdout().lock())?;
    utils::sep();

    if let Some(out) = json {
        let mut w = BufWriter::new(File::create(&out)?);
        serde_json::to_writer_pretty(&mut w, &ans)?;
        w.flush()?;
        log::info!("report written to `{}`", out.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red_square() -> MicroImage {
        MicroImage::from_rgb_fn((30, 30), |(h, w)| {
            if (5..25).contains(&h) && (5..25).contains(&w) {
                [220, 30, 30]
            } else {
                [0, 0, 0]
            }
        })
    }

    #[test]
    fn test_parse_probes() {
        let items = vec!["Acta2 = red".to_string(), "Sox9=green".to_string()];
        assert_eq!(parse_probes(&items).unwrap(), vec![("Acta2", "red"), ("Sox9", "green")]);
        assert!(parse_probes(&["Acta2".to_string()]).is_err());
        assert!(parse_probes(&["=red".to_string()]).is_err());
    }

    #[test]
    fn test_generate_all_keeps_order() {
        let a = red_square();
        let b = MicroImage::from_rgb_fn((30, 30), |_| [0, 0, 0]);
        let items = vec![("a", &a), ("b", &b), ("c", &a)];
        let config = SegmentationConfig::from_json(
            r#"[{"type": "color", "args": {"blur_kernel": [1, 1], "min_size": 10, "max_size": null, "colors": ["red"]}}]"#,
        )
        .unwrap();
        let params = GenerateParams::default();
        let generate = |image: &MicroImage| generate_with(image, &config, &params, &mut NoProgress);
        let ans = generate_all(&items, generate, 2);
        let names: Vec<_> = ans.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(ans[0].1.len(), 1);
        assert!(ans[1].1.is_empty());
        assert_eq!(ans[2].1, ans[0].1);
    }

    #[test]
    #[should_panic(expected = "cannot segment an all-black image")]
    fn test_generate_all_propagates_worker_panic() {
        let a = red_square();
        let b = MicroImage::from_rgb_fn((30, 30), |_| [0, 0, 0]);
        let items = vec![("a", &a), ("b", &b), ("c", &a), ("d", &a)];
        let generate = |image: &MicroImage| {
            if image.rgb_at((0, 0)) == [0, 0, 0] && image.rgb_at((15, 15)) == [0, 0, 0] {
                panic!("cannot segment an all-black image");
            }
            vec![]
        };
        generate_all(&items, generate, 2);
    }
}
