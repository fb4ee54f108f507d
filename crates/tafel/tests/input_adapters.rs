//! Input adapter integration tests.
//!
//! Feeds Tesseract TSV and PaddleOCR JSON through the adapters and the full
//! pipeline, checking that engine output reconstructs to the expected grid.

use tafel::{
    BoundingBox, Fragment, TableConfig, TableParser, TafelError, fragments_from_json, fragments_from_paddle_json,
    fragments_from_tsv, table_to_markdown,
};

const TSV_HEADER: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

fn tsv_word(left: u32, top: u32, width: u32, conf: f64, text: &str) -> String {
    format!("5\t1\t1\t1\t1\t1\t{}\t{}\t{}\t20\t{}\t{}", left, top, width, conf, text)
}

fn invoice_tsv() -> String {
    [
        TSV_HEADER.to_string(),
        "1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t".to_string(),
        "4\t1\t1\t1\t1\t0\t40\t100\t500\t20\t-1\t".to_string(),
        tsv_word(40, 100, 110, 96.0, "Product"),
        tsv_word(300, 101, 40, 95.0, "Qty"),
        tsv_word(480, 100, 60, 94.0, "Total"),
        tsv_word(40, 140, 50, 91.0, "Green"),
        tsv_word(95, 141, 30, 89.0, "tea"),
        tsv_word(305, 140, 20, 93.0, "2"),
        tsv_word(482, 139, 55, 92.0, "8.40"),
        tsv_word(40, 180, 60, 90.0, "Honey"),
        tsv_word(305, 181, 20, 88.0, "1"),
        tsv_word(482, 180, 55, 91.0, "6.10"),
    ]
    .join("\n")
}

#[test]
fn test_tesseract_tsv_to_table() {
    let fragments = fragments_from_tsv(&invoice_tsv(), 0.0).unwrap();
    assert_eq!(fragments.len(), 10);

    // "Green" and "tea" sit 45px apart center to center, so the column floor
    // is raised to 2.5 text heights to keep them in one cell.
    let config = TableConfig {
        min_column_gap_ratio: 2.5,
        ..Default::default()
    };
    let parser = TableParser::new(config).unwrap();
    let parsed = parser.parse(fragments).unwrap();

    assert_eq!(
        parsed.table.to_text_grid(),
        vec![
            vec!["Product", "Qty", "Total"],
            vec!["Green tea", "2", "8.40"],
            vec!["Honey", "1", "6.10"],
        ]
    );
    assert!(!parsed.quality.needs_review);
    assert_eq!(
        table_to_markdown(&parsed.table),
        "| Product | Qty | Total |\n| --- | --- | --- |\n| Green tea | 2 | 8.40 |\n| Honey | 1 | 6.10 |\n"
    );
}

#[test]
fn test_tesseract_tsv_confidence_rescaled() {
    let fragments = fragments_from_tsv(&invoice_tsv(), 0.0).unwrap();

    assert!(fragments.iter().all(|fragment| (0.0..=1.0).contains(&fragment.confidence)));
    assert!((fragments[0].confidence - 0.96).abs() < 1e-9);
}

#[test]
fn test_tesseract_tsv_min_confidence() {
    let fragments = fragments_from_tsv(&invoice_tsv(), 0.9).unwrap();

    let texts: Vec<&str> = fragments.iter().map(|fragment| fragment.text.as_str()).collect();
    assert!(!texts.contains(&"tea"));
    assert!(!texts.contains(&"1"));
    assert_eq!(fragments.len(), 8);
}

#[test]
fn test_tesseract_tsv_empty_input() {
    assert!(fragments_from_tsv("", 0.0).unwrap().is_empty());
    assert!(fragments_from_tsv(TSV_HEADER, 0.0).unwrap().is_empty());
}

#[test]
fn test_paddle_json_to_table() {
    let json = r#"[
        [[[12, 8], [62, 10], [61, 31], [11, 29]], ["Ciudad", 0.99]],
        [[[202, 9], [300, 9], [300, 30], [202, 30]], ["Habitantes", 0.97]],
        [[[12, 48], [60, 48], [60, 69], [12, 69]], ["Lima", 0.96]],
        [[[215, 49], [285, 49], [285, 70], [215, 70]], ["10.7M", 0.93]],
        [[[12, 88], [70, 88], [70, 109], [12, 109]], ["Quito", 0.95]],
        [[[220, 87], [280, 87], [280, 108], [220, 108]], ["2.8M", 0.94]]
    ]"#;

    let fragments = fragments_from_paddle_json(json).unwrap();
    assert_eq!(fragments[0].bbox, BoundingBox::new(11.0, 8.0, 62.0, 31.0));

    let parsed = TableParser::new(TableConfig::default()).unwrap().parse(fragments).unwrap();

    assert_eq!(parsed.table.row_count(), 3);
    assert_eq!(parsed.table.column_count(), 2);
    assert_eq!(parsed.table.cell(1, 1).unwrap().text, "10.7M");
    assert_eq!(parsed.table.cell(2, 0).unwrap().text, "Quito");
}

#[test]
fn test_paddle_json_malformed() {
    let result = fragments_from_paddle_json("[[[1, 2]], \"oops\"]");
    assert!(matches!(result, Err(TafelError::Serialization { .. })));
}

#[test]
fn test_native_json_roundtrip_through_parser() {
    let fragments = vec![
        Fragment::new("Key", 0.9, BoundingBox::new(0.0, 0.0, 30.0, 12.0)),
        Fragment::new("Value", 0.8, BoundingBox::new(100.0, 0.0, 140.0, 12.0)),
    ];
    let json = serde_json::to_string(&fragments).unwrap();

    let parsed_back = fragments_from_json(&json).unwrap();
    assert_eq!(parsed_back, fragments);

    let parsed = TableParser::new(TableConfig::default()).unwrap().parse(parsed_back).unwrap();
    assert_eq!(parsed.table.column_count(), 2);
}

#[test]
fn test_native_json_invalid_confidence_rejected_by_parser() {
    let json = r#"[{"text": "x", "confidence": 87.0, "bbox": {"left": 0, "top": 0, "right": 10, "bottom": 10}}]"#;

    let fragments = fragments_from_json(json).unwrap();
    let result = TableParser::new(TableConfig::default()).unwrap().parse(fragments);

    assert!(matches!(result, Err(TafelError::Validation { .. })));
}
