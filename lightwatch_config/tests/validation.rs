//! Config validation and file loading.

use lightwatch_config::{Config, load_toml};
use rstest::rstest;
use std::io::Write;

#[rstest]
#[case::inverted_hysteresis(
    "[dips]\ntrigger_delta = 0.05\nrelease_delta = 0.07\n",
    "release_delta"
)]
#[case::zero_width("[dips]\nmin_width = 0\n", "min_width")]
#[case::zero_rate("[sampler]\nrate_hz = 0\n", "rate_hz")]
#[case::bad_channel("[sensor]\nchannel = 9\n", "channel")]
#[case::same_lines("[encoder]\nline_a = 5\nline_b = 5\n", "must differ")]
#[case::negative_vref("[sensor]\nvref_volts = -1.0\n", "vref_volts")]
fn invalid_configs_are_rejected(#[case] toml: &str, #[case] needle: &str) {
    let config = load_toml(toml).expect("parse");
    let err = config.validate().expect_err("must be rejected");
    assert!(
        err.to_string().contains(needle),
        "error {err} missing {needle}"
    );
}

#[test]
fn load_reads_and_validates_a_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[server]\nport = 4242\n[sampler]\nrate_hz = 500").expect("write");

    let config = Config::load(file.path()).expect("load");
    assert_eq!(config.server.port, 4242);
    assert_eq!(config.sampler.rate_hz, 500);
}

#[test]
fn load_rejects_an_invalid_file_with_context() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[sampler]\nrate_hz = 0").expect("write");

    let err = Config::load(file.path()).expect_err("must fail");
    assert!(err.to_string().contains("rate_hz"));
}

#[test]
fn load_reports_missing_files() {
    let err = Config::load(std::path::Path::new("/nonexistent/lightwatch.toml"))
        .expect_err("must fail");
    assert!(err.to_string().contains("/nonexistent/lightwatch.toml"));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    assert!(load_toml("not toml at [[").is_err());
}
