//! Round trip of persisted observation tables.

use badea_common::{column_names, frame_from_columns, string_values};
use badea_ingest::{read_table, write_table};
use tempfile::tempdir;

fn observations() -> polars::prelude::DataFrame {
    frame_from_columns(vec![
        (
            "SEXO".to_string(),
            vec![Some("H".to_string()), Some("M".to_string()), None],
        ),
        (
            "TEMPORAL".to_string(),
            vec![Some("2020-03".to_string()); 3],
        ),
        (
            "INDICATOR".to_string(),
            vec![Some("Personas".to_string()); 3],
        ),
        (
            "OBS_VALUE".to_string(),
            vec![Some("10".to_string()), Some("12.5".to_string()), Some("7".to_string())],
        ),
        ("FREQ".to_string(), vec![Some("M".to_string()); 3]),
    ])
    .expect("frame")
}

#[test]
fn written_table_reads_back_with_same_shape() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("datos").join("EMPLEO").join("procesados").join("1.csv");
    let mut df = observations();

    write_table(&mut df, &path).unwrap();
    let back = read_table(&path).unwrap();

    assert_eq!(column_names(&back), column_names(&df));
    assert_eq!(back.height(), df.height());
    assert_eq!(
        string_values(&back, "OBS_VALUE").unwrap(),
        string_values(&df, "OBS_VALUE").unwrap()
    );
    // Missing codes stay missing.
    assert_eq!(string_values(&back, "SEXO").unwrap()[2], None);
}

#[test]
fn tables_use_semicolon_separator() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.csv");
    let mut df = observations();

    write_table(&mut df, &path).unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();

    assert_eq!(
        contents.lines().next(),
        Some("SEXO;TEMPORAL;INDICATOR;OBS_VALUE;FREQ")
    );
    assert_eq!(contents.lines().nth(1), Some("H;2020-03;Personas;10;M"));
}
