//! 运行结果.

use lung_berry::annotation::AnnotationSet;
use lung_berry::eval::{ClassMetrics, EvalReport};
use std::io::{self, Write};
use utils::f64_to_display;

const S4: &str = "    ";

fn describe_class<W: Write>(c: &ClassMetrics, w: &mut W) -> io::Result<()> {
    writeln!(w, "Class `{}`:", c.class)?;
    writeln!(w, "{S4}Positives: {}", c.positives)?;
    writeln!(w, "{S4}ROC AUC: {}", f64_to_display(c.roc_auc))?;
    writeln!(w, "{S4}Average precision: {}", f64_to_display(c.average_precision))?;
    writeln!(w, "{S4}ROC points: {}", c.roc.fpr.len())?;
    writeln!(w, "{S4}PR points: {}", c.pr.precision.len())
}

/// 将评估结果写进 `w` 中.
pub fn describe_into<W: Write>(r: &EvalReport, w: &mut W) -> io::Result<()> {
    writeln!(w, "Categories: {}", r.categories.join(", "))?;
    writeln!(w, "Predictions: {}", r.matches.len())?;
    writeln!(w, "{S4}Matched to a truth region: {}", r.matched_count())?;
    writeln!(w, "{S4}Background: {}", r.background_count())?;
    for c in r.classes.iter() {
        utils::sep_to(&mut *w)?;
        describe_class(c, w)?;
    }
    Ok(())
}

/// 将标注文件的概况写进 `w` 中.
pub fn describe_annotations<W: Write>(set: &AnnotationSet, w: &mut W) -> io::Result<()> {
    let mut total = 0;
    for (name, a) in set.iter() {
        writeln!(w, "{name}: {} candidates", a.candidates.len())?;
        total += a.candidates.len();
    }
    writeln!(w, "Images: {}, candidates in total: {total}", set.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lung_berry::eval::{evaluate, EvalData};

    #[test]
    fn test_describe_report() {
        let data = EvalData::from_json(
            r#"{
                "truth": {"regions": [
                    {"label": "airway", "polygon": [[0, 0], [9, 0], [9, 9], [0, 9]]}
                ]},
                "predictions": [
                    {"label": {"prob": {"airway": 0.9}}, "polygon": [[0, 0], [9, 0], [9, 9], [0, 9]]},
                    {"label": {"prob": {"airway": 0.2}}, "polygon": [[50, 50], [59, 50], [59, 59], [50, 59]]}
                ]
            }"#,
        )
        .unwrap();
        let report = evaluate(&data);

        let mut buf = Vec::new();
        describe_into(&report, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Matched to a truth region: 1"));
        assert!(text.contains("Background: 1"));
        assert!(text.contains("Class `airway`:"));
        assert!(text.contains("ROC AUC: 1.000000"));
    }

    #[test]
    fn test_describe_annotations() {
        let mut buf = Vec::new();
        describe_annotations(&AnnotationSet::new(), &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Images: 0, candidates in total: 0\n");
    }
}
