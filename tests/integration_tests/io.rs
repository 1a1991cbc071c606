use crate::integration_tests::data_output_path;
use fenris_codegen::factory::ElementFactory;
use fenris_codegen::io::{load_element_ir_json, load_element_irs_json, load_settings_json, parse_element_ir_json};
use fenris_codegen::{CodegenSettings, OdometerCombinations};
use std::fs;
use std::path::PathBuf;
use util::fixtures::{all_elements, lagrange_triangle};

fn write_test_file(test_name: &str, file_name: &str, contents: &str) -> eyre::Result<PathBuf> {
    let dir = data_output_path().join(test_name);
    fs::create_dir_all(&dir)?;
    let path = dir.join(file_name);
    fs::write(&path, contents)?;
    Ok(path)
}

#[test]
fn element_ir_file_round_trip() -> eyre::Result<()> {
    let ir = lagrange_triangle(2);
    let path = write_test_file("element_ir_file_round_trip", "lagrange.json", &serde_json::to_string_pretty(&ir)?)?;
    assert_eq!(load_element_ir_json(&path)?, ir);
    Ok(())
}

#[test]
fn element_ir_list_round_trip() -> eyre::Result<()> {
    let elements = all_elements(1);
    let path = write_test_file("element_ir_list_round_trip", "elements.json", &serde_json::to_string(&elements)?)?;
    assert_eq!(load_element_irs_json(&path)?, elements);

    let empty = write_test_file("element_ir_list_round_trip", "empty.json", "[]")?;
    let error = load_element_irs_json(&empty).unwrap_err();
    assert!(error.to_string().starts_with("no elements in"));
    Ok(())
}

#[test]
fn missing_file_reports_path() {
    let path = data_output_path().join("does_not_exist.json");
    let error = load_element_ir_json(&path).unwrap_err();
    assert!(error.to_string().contains("does_not_exist.json"));
}

#[test]
fn invalid_ir_reports_cause() {
    let json = r#"{ "tdim": 3, "gdim": 2, "max_order": 0, "reference_value_size": 1,
                   "physical_value_size": 1, "dofs": [] }"#;
    let error = parse_element_ir_json(json).unwrap_err();
    assert_eq!(error.to_string(), "failed to parse element IR");
    let cause = format!("{:?}", error);
    assert!(cause.contains("Invalid element dimensions (tdim = 3, gdim = 2)"));
}

#[test]
fn partial_settings_use_defaults() -> eyre::Result<()> {
    let path = write_test_file("partial_settings_use_defaults", "settings.json", r#"{ "index_type": "int" }"#)?;
    let settings = load_settings_json(&path)?;
    assert_eq!(
        settings,
        CodegenSettings {
            index_type: "int".to_string(),
            ..CodegenSettings::default()
        }
    );

    let factory = ElementFactory::from_element(&lagrange_triangle(1), &settings, &OdometerCombinations)?;
    let source = factory.render()?;
    assert!(source.contains("for (int ip = 0; ip < num_points; ++ip)"));
    assert!(!source.contains("int64_t ip"));
    Ok(())
}

#[test]
fn rendering_is_reproducible() -> eyre::Result<()> {
    let settings = CodegenSettings::default();
    for ir in all_elements(2) {
        let first = ElementFactory::from_element(&ir, &settings, &OdometerCombinations)?.render()?;
        let json = serde_json::to_string(&ir)?;
        let reloaded = parse_element_ir_json(&json)?;
        let second = ElementFactory::from_element(&reloaded, &settings, &OdometerCombinations)?.render()?;
        assert_eq!(first.as_bytes(), second.as_bytes());
    }
    Ok(())
}
