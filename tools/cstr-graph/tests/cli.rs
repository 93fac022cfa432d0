//! End-to-end tests for the cstr-graph binary.
//!
//! Each test runs the compiled binary as a subprocess against small Catch2
//! XML fixtures written into a scratch directory.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn cstr_graph() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cstr-graph"))
}

/// Catch2 XML with the given test cases; each case is `(name, runs)`.
fn results_xml(cases: &[(&str, &[(&str, f64)])]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Catch2TestRun name=\"benchmarks\">\n",
    );
    for (case, runs) in cases {
        xml.push_str(&format!("  <TestCase name=\"{case}\">\n"));
        for (name, mean) in *runs {
            xml.push_str(&format!(
                "    <BenchmarkResults name=\"{name}\" samples=\"100\">\n      \
                 <mean value=\"{mean}\" lowerBound=\"{mean}\" upperBound=\"{mean}\" ci=\"0.95\"/>\n    \
                 </BenchmarkResults>\n"
            ));
        }
        xml.push_str("    <OverallResult success=\"true\"/>\n  </TestCase>\n");
    }
    xml.push_str("</Catch2TestRun>\n");
    xml
}

const SINGLE: &[(&str, f64)] = &[("1024: unsized", 1000.0), ("1024: strlen + sized", 1200.0)];

fn write_input(dir: &TempDir, xml: &str) -> std::path::PathBuf {
    let path = dir.path().join("results.xml");
    std::fs::write(&path, xml).expect("failed to write fixture");
    path
}

fn run_files(input: &Path, output: &Path) -> Output {
    cstr_graph()
        .arg("-i")
        .arg(input)
        .arg("-o")
        .arg(output)
        .output()
        .expect("failed to execute cstr-graph")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "cstr-graph failed (exit={:?}):\nstderr:\n{}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr),
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn renders_chart_to_file() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &results_xml(&[("cstr", SINGLE)]));
    let svg_path = dir.path().join("chart.svg");

    let output = run_files(&input, &svg_path);
    assert_success(&output);

    let svg = std::fs::read_to_string(&svg_path).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("Performance benefit of accepting unsized ranges"));
    assert_eq!(svg.matches("<polyline").count(), 2);
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("1-point"));
}

#[test]
fn stdin_to_stdout() {
    let mut child = cstr_graph()
        .args(["-i", "-", "-o", "-", "-q"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn cstr-graph");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(results_xml(&[("cstr", SINGLE)]).as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert_success(&output);
    let svg = String::from_utf8(output.stdout).unwrap();
    assert!(svg.starts_with("<?xml"));
    assert!(svg.trim_end().ends_with("</svg>"));
    assert!(output.stderr.is_empty(), "quiet mode printed to stderr");
}

#[test]
fn rendering_twice_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let runs: &[(&str, f64)] = &[
        ("16: strlen + sized", 30.0),
        ("16: unsized", 20.0),
        ("4096: strlen + sized", 900.0),
        ("4096: unsized", 500.0),
        ("1048576: strlen + sized", 210_000.0),
        ("1048576: unsized", 120_000.0),
    ];
    let input = write_input(&dir, &results_xml(&[("cstr", runs)]));
    let first = dir.path().join("first.svg");
    let second = dir.path().join("second.svg");

    assert_success(&run_files(&input, &first));
    assert_success(&run_files(&input, &second));
    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
}

#[test]
fn missing_case_fails_without_writing() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &results_xml(&[("strlen", SINGLE)]));
    let svg_path = dir.path().join("chart.svg");

    let output = run_files(&input, &svg_path);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("select stage failed"), "stderr:\n{stderr}");
    assert!(stderr.contains("no test case named 'cstr'"), "stderr:\n{stderr}");
    assert!(!svg_path.exists(), "output file created on failure");
}

#[test]
fn existing_output_is_untouched_on_failure() {
    let dir = TempDir::new().unwrap();
    let runs: &[(&str, f64)] = &[("1024: unsized", 1000.0), ("2048: strlen + sized", 1.0)];
    let input = write_input(&dir, &results_xml(&[("cstr", runs)]));
    let svg_path = dir.path().join("chart.svg");
    std::fs::write(&svg_path, "previous").unwrap();

    let output = run_files(&input, &svg_path);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("build stage failed"));
    assert_eq!(std::fs::read_to_string(&svg_path).unwrap(), "previous");
}

#[test]
fn malformed_xml_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "<Catch2TestRun><TestCase name=\"cstr\">");
    let output = run_files(&input, &dir.path().join("chart.svg"));

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("load stage failed"));
}

#[test]
fn unreadable_input_fails() {
    let dir = TempDir::new().unwrap();
    let output = run_files(&dir.path().join("absent.xml"), &dir.path().join("chart.svg"));
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot read benchmark results"));
}

#[test]
fn missing_arguments_are_a_usage_error() {
    let output = cstr_graph()
        .args(["-i", "results.xml"])
        .output()
        .expect("failed to execute cstr-graph");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn verbose_reports_run_counts() {
    let dir = TempDir::new().unwrap();
    let runs: &[(&str, f64)] = &[
        ("64: unsized", 50.0),
        ("64: strlen + sized", 70.0),
        ("64: memchr", 10.0),
    ];
    let input = write_input(&dir, &results_xml(&[("cstr", runs)]));
    let output = cstr_graph()
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("chart.svg"))
        .arg("-v")
        .output()
        .expect("failed to execute cstr-graph");

    assert_success(&output);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 unsized runs, 1 strlen + sized runs, 1 skipped"), "{stderr}");
}
