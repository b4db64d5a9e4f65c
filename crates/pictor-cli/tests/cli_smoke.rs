use std::path::Path;
use std::process::{Command, Output};

fn pictor(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pictor"))
        .args(args)
        .output()
        .unwrap()
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "pictor failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn cli_generate_then_info() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("board.png");

    let output = pictor(&["generate", "checkerboard", "--width", "40", "--height", "20", "--out", arg(&out)]);
    assert_success(&output);
    assert!(out.is_file());

    let output = pictor(&["info", arg(&out)]);
    assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("40x20"), "unexpected info: {stdout}");
    assert!(stdout.contains("opaque=true"), "unexpected info: {stdout}");
}

#[test]
fn cli_apply_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("noise.tiff");
    let pipeline = dir.path().join("pipeline.json");
    let out = dir.path().join("nested").join("out.png");

    assert_success(&pictor(&["generate", "random", "--width", "30", "--height", "10", "--seed", "3", "--out", arg(&input)]));

    let json = serde_json::json!({
        "steps": [
            {"transform": {"rotate": {"degrees": 90}}},
            {"filter": {"kind": "invert"}},
            {"filter": {"kind": {"gaussian_blur": {"radius": 1}}}}
        ]
    });
    std::fs::write(&pipeline, json.to_string()).unwrap();

    let output = pictor(&["apply", "--in", arg(&input), "--pipeline", arg(&pipeline), "--out", arg(&out)]);
    assert_success(&output);

    let info = pictor(&["info", arg(&out)]);
    assert!(String::from_utf8_lossy(&info.stdout).contains("10x30"));
}

#[test]
fn cli_stitch_forced() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.png");
    let b = dir.path().join("b.png");
    let out = dir.path().join("stitched.png");

    assert_success(&pictor(&["generate", "stripes", "--width", "12", "--height", "7", "--out", arg(&a)]));
    assert_success(&pictor(&["generate", "checkerboard", "--width", "5", "--height", "9", "--out", arg(&b)]));

    let output = pictor(&["stitch", "--vertical", "--force", "8x4", "--out", arg(&out), arg(&a), arg(&b)]);
    assert_success(&output);

    let info = pictor(&["info", arg(&out)]);
    assert!(String::from_utf8_lossy(&info.stdout).contains("8x8"));
}

#[test]
fn cli_reports_bad_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    let pipeline = dir.path().join("bad.json");
    std::fs::write(&pipeline, r#"{"steps": [{"filter": {"kind": "sparkle"}}]}"#).unwrap();

    assert_success(&pictor(&["generate", "stripes", "--width", "4", "--height", "4", "--out", arg(&input)]));
    let output = pictor(&["apply", "--in", arg(&input), "--pipeline", arg(&pipeline), "--out", arg(&dir.path().join("x.png"))]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("load pipeline"));
}

#[test]
fn cli_qr_requires_text() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("qr.png");
    let output = pictor(&["generate", "qr", "--out", arg(&out)]);
    assert!(!output.status.success());

    let output = pictor(&["generate", "qr", "--text", "hello", "--width", "120", "--out", arg(&out)]);
    assert_success(&output);
}
