// Speleo - Cave survey data conversion toolkit
//
// Copyright (c) 2025 Speleo contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! End-to-end tests for the speleo binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn speleo_cmd() -> Command {
    Command::cargo_bin("speleo").expect("Failed to find speleo binary")
}

fn write_fixture(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write fixture");
    path.to_str().expect("non-utf8 temp path").to_string()
}

// ==================== convert ====================

#[test]
fn test_convert_survex_to_stdout() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_fixture(&dir, "cave.svx", speleo_test::SURVEX_SAMPLE);

    speleo_cmd()
        .args(["convert", &input])
        .assert()
        .success()
        .stdout(predicate::str::contains("*begin cave"));
}

#[test]
fn test_convert_to_toporobot_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_fixture(&dir, "cave.svx", speleo_test::SURVEX_SAMPLE);
    let output = dir.path().join("cave.text");
    let output = output.to_str().expect("non-utf8 temp path");

    speleo_cmd()
        .args(["convert", &input, "--to", "toporobot", "-o", output])
        .assert()
        .success();

    let text = fs::read_to_string(output).expect("Failed to read output");
    assert!(text.contains("    -6     1   1   1"));
}

#[test]
fn test_convert_compass_detected_by_extension() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_fixture(&dir, "cave.dat", speleo_test::COMPASS_SAMPLE);

    speleo_cmd()
        .args(["convert", &input, "--lrud", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("*begin"));
}

#[test]
fn test_convert_unknown_extension_needs_from() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_fixture(&dir, "cave.raw", speleo_test::SURVEX_SAMPLE);

    speleo_cmd()
        .args(["convert", &input])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--from"));

    speleo_cmd()
        .args(["convert", &input, "--from", "survex"])
        .assert()
        .success();
}

#[test]
fn test_convert_missing_file_fails() {
    speleo_cmd()
        .args(["convert", "no_such_file.svx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no_such_file.svx"));
}

// ==================== info ====================

#[test]
fn test_info_reports_counts() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_fixture(&dir, "cave.svx", speleo_test::SURVEX_SAMPLE);

    speleo_cmd()
        .args(["info", &input])
        .assert()
        .success()
        .stdout(predicate::str::contains("Series:"))
        .stdout(predicate::str::contains("Legs:"));
}
