// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    plan = { Stage::Plan, "plan", 0 },
    build = { Stage::Build, "build", 1 },
    test_ = { Stage::Test, "test", 2 },
)]
fn display_and_ordinal(stage: Stage, name: &str, ordinal: u8) {
    assert_eq!(stage.to_string(), name);
    assert_eq!(stage.ordinal(), ordinal);
    assert_eq!(name.parse::<Stage>(), Ok(stage));
}

#[test]
fn unknown_stage_rejected() {
    assert!("deploy".parse::<Stage>().is_err());
    assert!("".parse::<Stage>().is_err());
}

#[test]
fn ordering_is_linear() {
    let [plan, build, test] = Stage::all();
    assert!(plan.ordinal() < build.ordinal());
    assert!(build.ordinal() < test.ordinal());
}

#[test]
fn serde_uses_lowercase() {
    assert_eq!(serde_json::to_string(&Stage::Build).unwrap(), "\"build\"");
    let parsed: Stage = serde_json::from_str("\"test\"").unwrap();
    assert_eq!(parsed, Stage::Test);
}
