//! 数据集路径解析和批量加载.

use lung_berry::{ImageBatch, MicroImage};
use std::env;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 能够被加载的图像扩展名 (小写).
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "tif", "tiff", "jpg", "jpeg"];

/// 获取 `{用户主目录}/dataset/lungmap` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.push("lungmap");
    ans.extend(it);
    Some(ans)
}

fn from_env_or_home(key: &str, tail: &[&str]) -> Option<PathBuf> {
    match env::var(key) {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => home_dataset_dir_with(tail),
    }
}

/// 获取显微图像目录.
///
/// 1. 若环境变量 `$LUNGMAP_IMAGE_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/lungmap/images`.
pub fn image_dir_from_env_or_home() -> Option<PathBuf> {
    from_env_or_home("LUNGMAP_IMAGE_DIR", &["images"])
}

/// 获取评估数据文件.
///
/// 1. 若环境变量 `$LUNGMAP_EVAL_FILE` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/lungmap/eval.json`.
pub fn eval_file_from_env_or_home() -> Option<PathBuf> {
    from_env_or_home("LUNGMAP_EVAL_FILE", &["eval.json"])
}

/// 加载图像批次失败.
#[derive(Debug)]
pub enum LoadError {
    /// 读取目录失败.
    IoError(io::Error),

    /// 解码某个图像文件失败.
    ImageError(PathBuf, image::ImageError),

    /// 目录中没有可加载的图像.
    NoImages(PathBuf),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::IoError(e) => write!(f, "cannot read image directory: {e}"),
            LoadError::ImageError(p, e) => write!(f, "cannot decode `{}`: {e}", p.display()),
            LoadError::NoImages(p) => write!(f, "no images found in `{}`", p.display()),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::IoError(e) => Some(e),
            LoadError::ImageError(_, e) => Some(e),
            LoadError::NoImages(_) => None,
        }
    }
}

impl From<io::Error> for LoadError {
    fn from(e: io::Error) -> Self {
        LoadError::IoError(e)
    }
}

fn is_image_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
}

/// 列出目录下所有图像文件, 按文件名升序.
pub fn list_images<P: AsRef<Path>>(dir: P) -> io::Result<Vec<PathBuf>> {
    let mut ans = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if is_image_file(&path) {
            ans.push(path);
        }
    }
    ans.sort();
    Ok(ans)
}

/// 加载目录下所有图像为一个批次, 以文件名作为图像名称.
pub fn load_batch<P: AsRef<Path>>(dir: P) -> Result<ImageBatch, LoadError> {
    let dir = dir.as_ref();
    let paths = list_images(dir)?;
    if paths.is_empty() {
        return Err(LoadError::NoImages(dir.to_path_buf()));
    }

    let mut items = Vec::with_capacity(paths.len());
    for path in paths {
        let image = MicroImage::open(&path).map_err(|e| LoadError::ImageError(path.clone(), e))?;
        let name = path
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
        log::debug!("loaded `{name}` with shape {:?}", image.shape());
        items.push((name, image));
    }
    log::info!("{} images loaded from `{}`", items.len(), dir.display());
    Ok(ImageBatch::new(items))
}
