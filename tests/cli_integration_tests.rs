//! CLI smoke tests through the built binary.

mod common;

use assert_cmd::Command;
use common::srt_content;
use predicates::prelude::*;
use tempfile::TempDir;

fn bisub(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bisub").unwrap();
    // Keep the user's real configuration out of the tests.
    cmd.env("HOME", config_home.path());
    cmd.env("XDG_CONFIG_HOME", config_home.path().join(".config"));
    cmd
}

#[test]
fn help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    bisub(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("merge"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("tracks"))
        .stdout(predicate::str::contains("detect-encoding"));
}

#[test]
fn merge_two_files_writes_bilingual_output() {
    let home = TempDir::new().unwrap();
    let tmp = TempDir::new().unwrap();
    let zh = tmp.path().join("Film.srt");
    std::fs::write(
        &zh,
        srt_content(&[(1000, 3000, "你好"), (4000, 6000, "再见")]),
    )
    .unwrap();
    let en = tmp.path().join("Film.en.srt");
    std::fs::write(
        &en,
        srt_content(&[(1000, 3000, "Hello"), (4000, 6000, "Goodbye")]),
    )
    .unwrap();

    bisub(&home)
        .arg("merge")
        .arg("--primary")
        .arg(&zh)
        .arg("--secondary")
        .arg(&en)
        .arg("--threshold")
        .arg("0.3")
        .assert()
        .success()
        .stdout(predicate::str::contains("Film.zh-en.srt"));

    let output = tmp.path().join("Film.zh-en.srt");
    assert!(output.exists());
    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.contains("你好"));
    assert!(content.contains("Hello"));
}

#[test]
fn merge_without_sources_fails_with_usage_hint() {
    let home = TempDir::new().unwrap();
    bisub(&home)
        .arg("merge")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--primary"));
}

#[test]
fn merge_rejects_bad_threshold() {
    let home = TempDir::new().unwrap();
    bisub(&home)
        .args(["merge", "-v", "x.mkv", "--threshold", "3.0"])
        .assert()
        .failure();
}

#[test]
fn detect_encoding_reports_charset() {
    let home = TempDir::new().unwrap();
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("legacy.srt");
    let content = srt_content(&[(1000, 3000, "你好，这是一段简体中文字幕测试。")]);
    let (gbk, _, _) = encoding_rs::GBK.encode(&content);
    std::fs::write(&path, &gbk).unwrap();

    bisub(&home)
        .arg("detect-encoding")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("confidence"));
}

#[test]
fn config_get_unknown_key_fails() {
    let home = TempDir::new().unwrap();
    bisub(&home)
        .args(["config", "get", "no.such.key"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn batch_merges_directory_with_sidecars() {
    let home = TempDir::new().unwrap();
    let tmp = TempDir::new().unwrap();
    // Both sidecars exist, so no container tooling is touched.
    std::fs::write(tmp.path().join("Ep01.mkv"), b"video bytes").unwrap();
    std::fs::write(
        tmp.path().join("Ep01.zh.srt"),
        srt_content(&[(1000, 3000, "你好")]),
    )
    .unwrap();
    std::fs::write(
        tmp.path().join("Ep01.en.srt"),
        srt_content(&[(1000, 3000, "Hello")]),
    )
    .unwrap();

    // Relax the confidence threshold via the config file the CLI reads.
    let config_dir = home.path().join(".config").join("bisub");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        "[alignment]\nthreshold = 0.3\n",
    )
    .unwrap();

    let mut cmd = bisub(&home);
    cmd.arg("batch")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1/1 inputs merged"));

    assert!(tmp.path().join("Ep01.zh-en.srt").exists());
}
