use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn mandel() -> Command {
    Command::cargo_bin("mandel").unwrap()
}

#[test]
fn renders_grid_from_flags() {
    let output = mandel()
        .args(&["--rows", "2", "--cols", "2", "--iterations", "1", "--threads", "1"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(output.stdout, b"##\n##\n".to_vec());
}

#[test]
fn output_matches_the_library() {
    let output = mandel()
        .args(&["-r", "30", "-c", "60", "-i", "100", "-t", "3"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let grid = mandelbrot::GridSpec::new(30, 60, 100).unwrap();
    let expected = mandelbrot::output::to_ascii(&mandelbrot::render_serial(&grid));
    assert_eq!(String::from_utf8(output.stdout).unwrap(), expected);
}

#[test]
fn thread_count_comes_from_the_environment() {
    mandel()
        .env("MAX_CPUS", "1")
        .args(&["-r", "4", "-c", "4", "-i", "10"])
        .assert()
        .success()
        .stderr(predicate::str::contains("working with 1 thread").from_utf8());
}

#[test]
fn writes_a_pgm_alongside() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("set.pgm");
    mandel()
        .args(&["-r", "8", "-c", "12", "-i", "20", "-t", "2", "--pgm"])
        .arg(&path)
        .assert()
        .success();
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"P5"));
    assert!(bytes.len() > 8 * 12);
}

#[test]
fn rejects_partial_grid_arguments() {
    mandel()
        .args(&["--rows", "10", "--cols", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be given together").from_utf8());
}

#[test]
fn rejects_zero_rows() {
    mandel()
        .args(&["--rows", "0", "--cols", "10", "--iterations", "10"])
        .assert()
        .failure();
}

#[test]
fn rejects_absurd_thread_counts() {
    mandel()
        .args(&["-r", "4", "-c", "4", "-i", "4", "-t", "100000"])
        .assert()
        .failure();
}

#[test]
fn logs_the_worker_join() {
    mandel()
        .args(&["-r", "4", "-c", "4", "-i", "10", "-t", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("worker(s) joined").from_utf8());
}
