use std::fs::File;
use std::io::Write;

use axle_config::{TraceTick, load_trace_csv};
use rstest::rstest;
use tempfile::tempdir;

fn write_csv(body: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trace.csv");
    let mut f = File::create(&path).unwrap();
    f.write_all(body.as_bytes()).unwrap();
    (dir, path)
}

#[test]
fn loads_levels_in_order() {
    let (_dir, path) = write_csv("cell,arm\n0,0\n1,1\n0, 1\n");
    let ticks = load_trace_csv(&path).unwrap();
    assert_eq!(
        ticks,
        vec![
            TraceTick {
                blocked: false,
                arm: false
            },
            TraceTick {
                blocked: true,
                arm: true
            },
            TraceTick {
                blocked: false,
                arm: true
            },
        ]
    );
}

#[rstest]
#[case("arm,cell\n0,0\n", "must have headers 'cell,arm'")]
#[case("cell,arm,wake\n0,0,0\n", "must have headers 'cell,arm'")]
#[case("cell,arm\n2,0\n", "levels must be 0 or 1")]
#[case("cell,arm\nx,0\n", "invalid CSV row 2")]
#[case("cell,arm\n", "has no rows")]
fn rejects_malformed_traces(#[case] body: &str, #[case] needle: &str) {
    let (_dir, path) = write_csv(body);
    let err = load_trace_csv(&path).expect_err("should reject");
    assert!(
        format!("{err}").contains(needle),
        "error {err} does not mention {needle:?}"
    );
}

#[test]
fn missing_file_is_reported() {
    let dir = tempdir().unwrap();
    let err = load_trace_csv(&dir.path().join("nope.csv")).unwrap_err();
    assert!(format!("{err}").contains("open trace CSV"));
}
