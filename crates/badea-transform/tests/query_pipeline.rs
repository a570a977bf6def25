//! End-to-end build of observation tables from query and hierarchy payloads.

use badea_common::{column_names, string_values};
use badea_model::{HierarchyProperty, HierarchyResponse, ProcessingOptions, QueryResponse};
use badea_transform::{QueryHierarchy, QueryProcessor, TransformError, expand_hierarchy};
use serde_json::json;

fn sex_hierarchy() -> QueryHierarchy {
    let payload: HierarchyResponse = serde_json::from_value(json!({
        "data": {
            "id": 100, "cod": "0", "label": "Total", "des": "Ambos sexos",
            "parentId": null, "order": 1, "isLastLevel": false,
            "children": [
                {"id": 101, "cod": "1", "label": "Hombres", "des": "null",
                 "parentId": 100, "order": 2, "isLastLevel": true, "children": []},
                {"id": 102, "cod": "2", "label": "Mujeres", "des": "null",
                 "parentId": 100, "order": 3, "isLastLevel": true, "children": []}
            ]
        }
    }))
    .expect("hierarchy payload");
    let response: QueryResponse = serde_json::from_value(query_json("Mensual")).expect("query");

    QueryHierarchy {
        meta: response.hierarchies[1].clone(),
        table: expand_hierarchy(payload.roots(), &HierarchyProperty::ALL).expect("expand"),
    }
}

fn query_json(periodicity: &str) -> serde_json::Value {
    json!({
        "metainfo": {
            "id": 4511, "title": "Population by sex", "periodicity": periodicity,
            "activity": "Padrón", "type": "table"
        },
        "hierarchies": [
            {"alias": "D_TEMPORAL_0", "cod": "12", "des": "Periodo", "url": ""},
            {"alias": "D_SEXO_0", "cod": "7", "des": "Sexo", "url": "https://example.org/h/7"}
        ],
        "measures": [
            {"id": 1, "des": "Personas"},
            {"id": 2, "des": "Porcentaje"}
        ],
        "data": [
            [{"cod": ["2020", "202003"]}, {"cod": ["0", "1"]}, {"val": 120}, {"val": 48.5}],
            [{"cod": ["2020", "202003"]}, {"cod": ["0", "2"]}, {"val": 130}, {"val": 51.5}],
            [{"cod": ["2020", "202003"]}, {"cod": ["0"]}, {"val": 250}, {"val": 100}]
        ]
    })
}

fn build(periodicity: &str) -> Result<badea_transform::ObservationTable, TransformError> {
    let response: QueryResponse =
        serde_json::from_value(query_json(periodicity)).expect("query");
    QueryProcessor::new(&ProcessingOptions::default()).build(&response, &[sex_hierarchy()])
}

#[test]
fn monthly_query_builds_long_table() {
    let table = build("Mensual").unwrap();
    let frame = table.frame();

    assert_eq!(
        column_names(frame),
        vec!["D_TEMPORAL_0", "D_SEXO_0", "INDICATOR", "OBS_VALUE", "FREQ"]
    );
    assert_eq!(table.height(), 6);
    assert_eq!(
        string_values(frame, "D_TEMPORAL_0").unwrap(),
        vec![Some("2020-03".to_string()); 6]
    );
    assert_eq!(
        string_values(frame, "D_SEXO_0").unwrap()[..3].to_vec(),
        vec![
            Some("101".to_string()),
            Some("102".to_string()),
            Some("100".to_string())
        ]
    );
    assert_eq!(string_values(frame, "FREQ").unwrap(), vec![Some("M".to_string()); 6]);
}

#[test]
fn annual_query_keeps_period_codes() {
    let table = build("Anual").unwrap();
    let frame = table.frame();

    assert_eq!(
        string_values(frame, "D_TEMPORAL_0").unwrap()[0].as_deref(),
        Some("202003")
    );
    assert_eq!(string_values(frame, "FREQ").unwrap(), vec![Some("A".to_string()); 6]);
}

#[test]
fn unknown_periodicity_stops_the_build() {
    let err = build("Bienal").unwrap_err();
    assert!(matches!(err, TransformError::Model(_)));
}

#[test]
fn excluded_and_status_measures_shape_the_table() {
    let response: QueryResponse = serde_json::from_value(query_json("Trimestral")).expect("query");
    let options = ProcessingOptions {
        status_measures: vec!["Porcentaje".to_string()],
        ..ProcessingOptions::default()
    };

    let table = QueryProcessor::new(&options)
        .build(&response, &[sex_hierarchy()])
        .unwrap();

    assert_eq!(table.height(), 3);
    assert_eq!(
        table.column_names(),
        vec!["D_TEMPORAL_0", "D_SEXO_0", "OBS_STATUS", "INDICATOR", "OBS_VALUE", "FREQ"]
    );
    assert_eq!(
        string_values(table.frame(), "FREQ").unwrap()[0].as_deref(),
        Some("Q")
    );
}
