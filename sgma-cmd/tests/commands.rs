use sgma_cmd::{load_config, run, Command, Inputs, ReportOptions};
use std::path::PathBuf;

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn output_path(name: &str) -> String {
    std::env::temp_dir()
        .join(format!("sgma-cmd-{}-{}", std::process::id(), name))
        .to_string_lossy()
        .into_owned()
}

fn inputs(output: &str) -> Inputs {
    Inputs {
        wells_csv: fixture("wells.csv"),
        readings_csv: fixture("readings.csv"),
        output: Some(output.to_string()),
    }
}

fn report(district: Option<&str>) -> ReportOptions {
    ReportOptions {
        allocations_csv: fixture("allocations.csv"),
        as_of: Some("2024-03-01".to_string()),
        district: district.map(str::to_string),
    }
}

fn run_json(command: Command, output: &str) -> serde_json::Value {
    let config = load_config(Some(fixture("engine.toml").as_str())).unwrap();
    run(command, &config).unwrap();
    let data = std::fs::read_to_string(output).unwrap();
    std::fs::remove_file(output).ok();
    serde_json::from_str(&data).unwrap()
}

#[test]
fn test_readings_command_writes_csv() {
    let output = output_path("readings.csv");
    run(Command::Readings { inputs: inputs(&output) }, &load_config(None).unwrap()).unwrap();
    let data = std::fs::read_to_string(&output).unwrap();
    std::fs::remove_file(&output).ok();

    assert!(data.starts_with("WELL_ID,READING_ID,DATE,TYPE,EXTRACTION_AF"));
    assert!(data.contains("W-100,r100-2,2023-11-15,manual,100.0000,4000.00,3000.00,200.00,0.00,7200.00,ok,"));
    assert!(data.contains("W-100,r100-4,2024-02-20,manual,80.0000,"));
    assert!(data.contains("W-400,WY2023-Q2,2024-01-01,period_fee,,,,,300.00,300.00,ok,"));
    let rejected: Vec<&str> = data.lines().filter(|l| l.contains(",ambiguous,")).collect();
    assert_eq!(rejected.len(), 1);
    assert!(rejected[0].starts_with("W-200,r200-3,"));
}

#[test]
fn test_allocation_command_for_one_district() {
    let output = output_path("allocation.json");
    let json = run_json(
        Command::Allocation {
            inputs: inputs(&output),
            report: report(Some("GSA-TULE")),
        },
        &output,
    );
    let districts = json.as_array().unwrap();
    assert_eq!(districts.len(), 1);
    let district = &districts[0]["district"];
    assert_eq!(district["subject_id"], "GSA-TULE");
    assert_eq!(district["ytd_extraction_af"], 40.0);
    assert_eq!(district["percent_allocation_used"], 100.0);
    assert_eq!(district["next_report_due"], "2024-04-30");
    assert_eq!(districts[0]["wells"][0]["subject_id"], "W-400");
}

#[test]
fn test_alerts_command_orders_by_severity() {
    let output = output_path("alerts.json");
    let json = run_json(
        Command::Alerts {
            inputs: inputs(&output),
            report: report(None),
        },
        &output,
    );
    assert_eq!(json["as_of"], "2024-03-01");
    assert_eq!(json["critical"], 2);
    assert_eq!(json["warning"], 3);
    assert_eq!(json["info"], 0);
    let alerts = json["alerts"].as_array().unwrap();
    assert_eq!(alerts.len(), 5);
    assert_eq!(alerts[0]["severity"], "critical");
    assert_eq!(alerts[0]["subject_well_id"], "GSA-TULE");
    assert_eq!(alerts[4]["severity"], "warning");
}

#[test]
fn test_unknown_district_is_an_error() {
    let output = output_path("none.json");
    let result = run(
        Command::Alerts {
            inputs: inputs(&output),
            report: report(Some("GSA-NOWHERE")),
        },
        &load_config(None).unwrap(),
    );
    assert!(result.is_err());
}
