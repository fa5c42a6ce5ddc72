use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use vacancy_stats::load_config::{load_config, InputSource, SELECTED_TITLE_ENV, WORKERS_ENV};
use vacancy_stats_core::vacancy::YearMonth;

fn config_file(yaml: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), yaml).unwrap();
    file
}

fn clear_env() {
    env::remove_var(WORKERS_ENV);
    env::remove_var(SELECTED_TITLE_ENV);
}

#[test]
#[serial]
fn test_load_config_full_file() {
    clear_env();
    let file = config_file(
        r#"
input:
  csv: ./data/vacancies.csv
stats:
  selected_title: Developer
  workers: 6
  date_field: created_at
currency:
  rates:
    USD: 90.0
output: ./out/stats.json
"#,
    );

    let config = load_config(file.path()).expect("Config should load");

    assert_eq!(
        config.input,
        InputSource::Csv(PathBuf::from("./data/vacancies.csv"))
    );
    assert_eq!(config.stats.selected_title, "Developer");
    assert_eq!(config.stats.workers, 6);
    assert_eq!(config.stats.date_field, "created_at");
    assert_eq!(config.output, Some(PathBuf::from("./out/stats.json")));

    let converter = config.currency.converter().unwrap();
    let at = YearMonth { year: 2020, month: 1 };
    assert_eq!(converter.to_rub(10.0, "USD", at).unwrap(), 900.0);
    // Codes not overridden keep their default rate.
    assert_eq!(converter.to_rub(10.0, "RUR", at).unwrap(), 10.0);
}

#[test]
#[serial]
fn test_load_config_defaults_for_missing_sections() {
    clear_env();
    let file = config_file("input:\n  partitions_dir: ./split\n");

    let config = load_config(file.path()).expect("Config should load");

    assert_eq!(
        config.input,
        InputSource::PartitionsDir(PathBuf::from("./split"))
    );
    assert_eq!(config.stats.selected_title, "");
    assert_eq!(config.stats.workers, 4);
    assert_eq!(config.stats.date_field, "published_at");
    assert!(config.output.is_none());
}

#[test]
#[serial]
fn test_env_overrides_win_over_file() {
    clear_env();
    let file = config_file(
        "input:\n  csv: a.csv\nstats:\n  selected_title: Developer\n  workers: 2\n",
    );
    env::set_var(WORKERS_ENV, "9");
    env::set_var(SELECTED_TITLE_ENV, "Analyst");

    let config = load_config(file.path());
    clear_env();
    let config = config.expect("Config should load");

    assert_eq!(config.stats.workers, 9);
    assert_eq!(config.stats.selected_title, "Analyst");
}

#[test]
#[serial]
fn test_invalid_worker_override_is_rejected() {
    clear_env();
    let file = config_file("input:\n  csv: a.csv\n");
    env::set_var(WORKERS_ENV, "many");

    let result = load_config(file.path());
    clear_env();

    let msg = format!("{:#}", result.unwrap_err());
    assert!(msg.contains(WORKERS_ENV), "got: {msg}");
}

#[test]
#[serial]
fn test_input_requires_exactly_one_source() {
    clear_env();
    let both = config_file("input:\n  csv: a.csv\n  partitions_dir: ./split\n");
    let err = load_config(both.path()).unwrap_err().to_string();
    assert!(err.contains("not both"), "got: {err}");

    let neither = config_file("input: {}\n");
    let err = load_config(neither.path()).unwrap_err().to_string();
    assert!(err.contains("required"), "got: {err}");
}

#[test]
#[serial]
fn test_invalid_yaml_reports_parse_error() {
    clear_env();
    let file = config_file("input: [not, a, mapping\n");
    let err = load_config(file.path()).unwrap_err().to_string();
    assert!(err.contains("parse") && err.contains("YAML"), "got: {err}");
}

#[test]
#[serial]
fn test_missing_config_file_reports_read_error() {
    clear_env();
    let err = load_config("does/not/exist.yaml").unwrap_err().to_string();
    assert!(err.contains("Failed to read config file"), "got: {err}");
}

#[test]
#[serial]
fn test_monthly_rates_csv_builds_month_aware_converter() {
    clear_env();
    let rates = NamedTempFile::new().unwrap();
    write(rates.path(), "date,USD,EUR\n2021-01,70,80\n2021-02,72,\n").unwrap();
    let file = config_file(&format!(
        "input:\n  csv: a.csv\ncurrency:\n  monthly_rates_csv: {}\n",
        rates.path().display()
    ));

    let config = load_config(file.path()).expect("Config should load");
    let converter = config.currency.converter().expect("rates load");

    let jan = YearMonth { year: 2021, month: 1 };
    let feb = YearMonth { year: 2021, month: 2 };
    assert_eq!(converter.to_rub(2.0, "USD", jan).unwrap(), 140.0);
    assert_eq!(converter.to_rub(2.0, "USD", feb).unwrap(), 144.0);
    assert!(converter.to_rub(2.0, "EUR", feb).is_err());
    assert_eq!(converter.to_rub(2.0, "RUR", feb).unwrap(), 2.0);
}

#[test]
#[serial]
fn test_missing_monthly_rates_file_fails_converter() {
    clear_env();
    let file = config_file(
        "input:\n  csv: a.csv\ncurrency:\n  monthly_rates_csv: does/not/exist.csv\n",
    );
    let config = load_config(file.path()).expect("Config should load");
    assert!(config.currency.converter().is_err());
}
