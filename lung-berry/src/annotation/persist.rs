use super::error::PersistError;
use super::label::LabelCode;
use super::store::RegionStore;
use crate::geometry::{Polygon, Region};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// 一幅图像的标注: 并行的候选多边形与整数标签.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAnnotation {
    /// 候选区域, 每个都是 `[[x, y], ...]`.
    pub candidates: Vec<Polygon>,

    /// 标签编码, 与 `candidates` 等长.
    pub labels: Vec<LabelCode>,
}

impl ImageAnnotation {
    /// 从区域存储导出. 已删除的区域也会被保存.
    pub fn from_store(store: &RegionStore) -> Self {
        Self {
            candidates: store.regions().iter().map(|r| r.polygon().clone()).collect(),
            labels: store.labels().to_vec(),
        }
    }

    /// 还原为区域存储, 同时检查并行序列的长度和多边形.
    pub fn to_store(&self, image: &str) -> Result<RegionStore, PersistError> {
        self.validate(image)?;
        let mut regions = Vec::with_capacity(self.candidates.len());
        for (index, p) in self.candidates.iter().enumerate() {
            let region = Region::new(p.clone()).ok_or_else(|| PersistError::EmptyPolygon {
                image: image.to_string(),
                index,
            })?;
            regions.push(region);
        }
        RegionStore::from_parts(regions, self.labels.clone()).ok_or_else(|| self.lockstep(image))
    }

    fn validate(&self, image: &str) -> Result<(), PersistError> {
        if self.candidates.len() != self.labels.len() {
            return Err(self.lockstep(image));
        }
        match self.candidates.iter().position(Polygon::is_empty) {
            Some(index) => Err(PersistError::EmptyPolygon {
                image: image.to_string(),
                index,
            }),
            None => Ok(()),
        }
    }

    fn lockstep(&self, image: &str) -> PersistError {
        PersistError::Lockstep {
            image: image.to_string(),
            candidates: self.candidates.len(),
            labels: self.labels.len(),
        }
    }
}

/// 一批图像的标注, `图像名称 -> 标注`. 以缩进的 JSON 保存.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationSet {
    images: BTreeMap<String, ImageAnnotation>,
}

impl AnnotationSet {
    /// 空集合.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存 (或替换) 一幅图像的标注.
    pub fn insert(&mut self, image: impl Into<String>, store: &RegionStore) {
        self.images
            .insert(image.into(), ImageAnnotation::from_store(store));
    }

    /// 查询一幅图像的标注.
    #[inline]
    pub fn get(&self, image: &str) -> Option<&ImageAnnotation> {
        self.images.get(image)
    }

    /// 还原一幅图像的区域存储. 图像不存在时返回 `Ok(None)`.
    pub fn store(&self, image: &str) -> Result<Option<RegionStore>, PersistError> {
        self.images
            .get(image)
            .map(|a| a.to_store(image))
            .transpose()
    }

    /// 图像个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// 按名称升序迭代.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ImageAnnotation)> {
        self.images.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// 检查所有图像的标注.
    pub fn validate(&self) -> Result<(), PersistError> {
        self.images.iter().try_for_each(|(k, v)| v.validate(k))
    }

    /// 序列化为缩进的 JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// 从 JSON 字符串解析并检查.
    pub fn from_json(s: &str) -> Result<Self, PersistError> {
        let set: AnnotationSet = serde_json::from_str(s)?;
        set.validate()?;
        Ok(set)
    }

    /// 写入文件.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistError> {
        let mut w = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(&mut w, self)?;
        w.flush()?;
        Ok(())
    }

    /// 从文件读取并检查.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PersistError> {
        let r = BufReader::new(File::open(path.as_ref())?);
        let set: AnnotationSet = serde_json::from_reader(r)?;
        set.validate()?;
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::RegionId;

    fn triangle(x: i32) -> Region {
        Region::new(Polygon::new(vec![(x, 0), (x + 6, 0), (x, 6)])).unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let mut store = RegionStore::from_candidates(vec![triangle(0), triangle(10)]);
        let label = LabelCode::structure(1).unwrap();
        store.set_label(RegionId::from_index(1), label).unwrap();
        store.delete(RegionId::from_index(0)).unwrap();

        let mut set = AnnotationSet::new();
        set.insert("img_01.tif", &store);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotations.json");
        set.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"img_01.tif\""));
        assert!(text.contains('\n'));

        let loaded = AnnotationSet::load(&path).unwrap();
        assert_eq!(loaded, set);
        assert_eq!(loaded.store("img_01.tif").unwrap(), Some(store));
        assert_eq!(loaded.store("missing.tif").unwrap(), None);
    }

    #[test]
    fn test_json_layout() {
        let store = RegionStore::from_candidates(vec![triangle(0)]);
        let mut set = AnnotationSet::new();
        set.insert("a", &store);
        let value: serde_json::Value = serde_json::from_str(&set.to_json_pretty().unwrap()).unwrap();
        assert_eq!(value["a"]["labels"], serde_json::json!([0]));
        assert_eq!(value["a"]["candidates"][0][1], serde_json::json!([6, 0]));
    }

    #[test]
    fn test_lockstep_is_validated() {
        let err = AnnotationSet::from_json(r#"{"a": {"candidates": [[[0, 0], [2, 0], [0, 2]]], "labels": []}}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            PersistError::Lockstep { candidates: 1, labels: 0, .. }
        ));

        let err = AnnotationSet::from_json(r#"{"a": {"candidates": [[]], "labels": [0]}}"#).unwrap_err();
        assert!(matches!(err, PersistError::EmptyPolygon { index: 0, .. }));

        assert!(matches!(
            AnnotationSet::from_json(r#"{"a": {"candidates": [], "labels": [-3]}}"#),
            Err(PersistError::JsonError(_))
        ));
    }
}
