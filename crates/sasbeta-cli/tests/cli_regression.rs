use sasbeta_core::domain::{ExecutionMode, Normalization};
use sasbeta_core::models::{Contrast, Polydispersity};
use sasbeta_core::theory::{
    SphereGeometry, StructureSpec, TheoryField, TheoryRecord, sphere_theory,
};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const SPHERE_REQUEST: &str = r#"{
  "q": { "kind": "explicit", "values": [0.001, 0.01, 0.05, 0.1, 0.2] },
  "geometry": {
    "shape": "sphere",
    "radius": 20,
    "radius_pd": { "fraction": 0.1, "kind": "gaussian" }
  },
  "contrast": { "sld": 4, "sld_solvent": 1 },
  "structure": { "volume_fraction": 0.3 },
  "normalization": "sasfit"
}"#;

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent directory should be created");
    }
    fs::write(path, content).expect("file should be written");
}

fn run_binary(args: &[&str]) -> std::process::Output {
    let binary_path = env!("CARGO_BIN_EXE_sasbeta");
    Command::new(binary_path)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("sasbeta should run")
}

fn read_record(path: &Path) -> TheoryRecord {
    let source = fs::read_to_string(path).expect("record should be written");
    serde_json::from_str(&source).expect("record should be valid JSON")
}

fn expected_request_record() -> TheoryRecord {
    sphere_theory(
        &[0.001, 0.01, 0.05, 0.1, 0.2],
        &SphereGeometry::new(20.0, Polydispersity::gaussian(0.1)),
        Contrast::new(4.0, 1.0),
        &StructureSpec::new(0.3, None),
        Normalization::SasFit,
        ExecutionMode::Serial,
    )
    .expect("record")
}

#[test]
fn sphere_command_writes_all_columns_as_json() {
    let temp = TempDir::new().expect("tempdir should be created");
    let output_path = temp.path().join("out/sphere.json");

    let output = run_binary(&[
        "sphere",
        "--radius",
        "20",
        "--radius-pd",
        "0.1",
        "--radius-pd-type",
        "schulz",
        "--volfraction",
        "0.15",
        "--q-start=-3",
        "--q-end=-1",
        "--q-count",
        "9",
        "--output",
        output_path.to_str().expect("utf-8 path"),
    ]);
    assert!(
        output.status.success(),
        "command should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let parsed: Value =
        serde_json::from_str(&fs::read_to_string(&output_path).expect("output file"))
            .expect("valid JSON");
    for column in ["Q", "F1", "F2", "P", "S", "I", "Seff", "Ibeta"] {
        assert_eq!(
            parsed[column].as_array().map(Vec::len),
            Some(9),
            "column {column}"
        );
    }
}

#[test]
fn request_command_matches_library_result() {
    let temp = TempDir::new().expect("tempdir should be created");
    let request_path = temp.path().join("request.json");
    let output_path = temp.path().join("record.json");
    write_file(&request_path, SPHERE_REQUEST);

    let code = sasbeta_cli::run([
        "request",
        request_path.to_str().expect("utf-8 path"),
        "--output",
        output_path.to_str().expect("utf-8 path"),
    ])
    .expect("request should run");
    assert_eq!(code, 0);

    let actual = read_record(&output_path);
    let expected = expected_request_record();
    assert_eq!(actual.available_fields(), TheoryField::ALL.to_vec());
    for field in TheoryField::ALL {
        let pairs = expected
            .field(field)
            .expect("expected field")
            .iter()
            .zip(actual.field(field).expect("actual field"));
        for (lhs, rhs) in pairs {
            assert!((lhs - rhs).abs() <= 1.0e-12 * lhs.abs(), "{field}: {lhs} vs {rhs}");
        }
    }
}

#[test]
fn table_output_has_header_and_one_row_per_q() {
    let temp = TempDir::new().expect("tempdir should be created");
    let output_path = temp.path().join("ellipsoid.txt");

    let code = sasbeta_cli::run([
        "ellipsoid",
        "--radius-polar",
        "20",
        "--radius-equatorial",
        "10",
        "--single",
        "--sld",
        "2",
        "--volfraction",
        "0.15",
        "--radius-effective",
        "12.59921049894873",
        "--q",
        "0.001,0.01,0.1",
        "--format",
        "table",
        "--output",
        output_path.to_str().expect("utf-8 path"),
    ])
    .expect("ellipsoid should run");
    assert_eq!(code, 0);

    let table = fs::read_to_string(&output_path).expect("table");
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "Q F1 F2 P S I Seff Ibeta");
    assert!(lines[1].starts_with("1.0000000000e-3 "));
    assert_eq!(lines[2].split_whitespace().count(), 8);
}

#[test]
fn compare_command_passes_against_matching_reference() {
    let temp = TempDir::new().expect("tempdir should be created");
    let request_path = temp.path().join("request.json");
    let report_path = temp.path().join("report.json");
    write_file(&request_path, SPHERE_REQUEST);

    let expected = expected_request_record();
    let mut references = Vec::new();
    for field in [TheoryField::S, TheoryField::Seff] {
        let path = temp.path().join(format!("sasfit_{field}.txt"));
        let body: String = expected
            .q
            .iter()
            .zip(expected.field(field).expect("field"))
            .map(|(q, value)| format!("{q};{value}\n"))
            .collect();
        write_file(&path, &body);
        references.push(format!("{field}={}", path.display()));
    }

    let output = run_binary(&[
        "compare",
        "--request",
        request_path.to_str().expect("utf-8 path"),
        "--reference",
        &references[0],
        "--reference",
        &references[1],
        "--output",
        report_path.to_str().expect("utf-8 path"),
    ]);
    assert!(
        output.status.success(),
        "compare should pass, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: Value =
        serde_json::from_str(&fs::read_to_string(&report_path).expect("report")).expect("JSON");
    let fields = report["fields"].as_array().expect("fields array");
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0]["field"], "S");
    assert_eq!(fields[1]["passes"], true);
}

#[test]
fn compare_command_exits_one_on_mismatch() {
    let temp = TempDir::new().expect("tempdir should be created");
    let request_path = temp.path().join("request.json");
    let reference_path = temp.path().join("sq.txt");
    write_file(&request_path, SPHERE_REQUEST);
    write_file(
        &reference_path,
        "0.001;0.5\n0.01;0.5\n0.05;0.5\n0.1;0.5\n0.2;0.5\n",
    );

    let output = run_binary(&[
        "compare",
        "--request",
        request_path.to_str().expect("utf-8 path"),
        "--reference",
        &format!("S={}", reference_path.display()),
        "--format",
        "table",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Comparison status: FAIL"));
}

#[test]
fn unknown_normalization_exits_with_configuration_code() {
    let output = run_binary(&["sphere", "--radius", "20", "--norm", "guinier"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("ERROR: [CONFIG.UNKNOWN_NORMALIZATION]"),
        "stderr: {stderr}"
    );
    assert!(stderr.contains("FATAL EXIT CODE: 2"));
}

#[test]
fn invalid_inputs_map_to_exit_codes() {
    let error = sasbeta_cli::run(["sphere", "--radius=-5"]).expect_err("negative radius");
    assert_eq!(error.as_sas_error().placeholder(), "INPUT.THEORY");
    assert_eq!(error.as_sas_error().exit_code(), 2);

    let error = sasbeta_cli::run(["request", "/nonexistent/request.json"]).expect_err("missing");
    assert_eq!(error.as_sas_error().exit_code(), 3);

    let error = sasbeta_cli::run(["sphere"]).expect_err("missing radius");
    assert!(matches!(error, sasbeta_cli::CliError::Usage(_)));
}

#[test]
fn help_exits_successfully() {
    assert_eq!(sasbeta_cli::run(["--help"]).expect("help"), 0);
    assert_eq!(sasbeta_cli::run(["sphere", "--help"]).expect("help"), 0);
}
