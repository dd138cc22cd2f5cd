use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use serde_json::Value;
use tempfile::TempDir;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_apistub"))
}

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("test_fixtures/sample_package.json")
}

/// Copy the sample snapshot into a fresh temp dir so config discovery only sees that dir.
fn sample_in_temp() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("temp dir");
    let snapshot = temp_dir.path().join("snapshot.json");
    std::fs::copy(fixture(), &snapshot).expect("copy fixture");
    (temp_dir, snapshot)
}

fn run(args: &[&str]) -> Output {
    bin().args(args).output().expect("run apistub")
}

fn render_json(snapshot: &Path) -> Value {
    let output = run(&["render", snapshot.to_string_lossy().as_ref()]);
    assert!(
        output.status.success(),
        "stderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

fn find_line<'a>(lines: &'a Value, id: &str) -> Option<&'a Value> {
    for line in lines.as_array()? {
        if line["LineId"] == id {
            return Some(line);
        }
        if let Some(found) = line.get("Children").and_then(|c| find_line(c, id)) {
            return Some(found);
        }
    }
    None
}

fn token_text(line: &Value) -> String {
    line["Tokens"]
        .as_array()
        .map(|tokens| {
            tokens
                .iter()
                .map(|t| t["Value"].as_str().unwrap_or_default())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

fn class_children<'a>(code_file: &'a Value, id: &str) -> &'a Vec<Value> {
    find_line(&code_file["ReviewLines"], id)
        .and_then(|l| l["Children"].as_array())
        .expect("class children")
}

#[test]
fn e2e_render_writes_code_file() {
    let (_temp, snapshot) = sample_in_temp();
    let code_file = render_json(&snapshot);

    assert_eq!(code_file["PackageName"], "azure-widgets");
    assert_eq!(code_file["PackageVersion"], "1.2.0");
    assert_eq!(code_file["Language"], "Python");
    assert!(code_file.get("CrossLanguagePackageId").is_none());

    let module = &code_file["ReviewLines"][0];
    assert_eq!(module["LineId"], "azure.widgets");
    assert_eq!(module["Tokens"][0]["Value"], "namespace");
    assert_eq!(module["Tokens"][1]["RenderClasses"][0], "namespace");

    let client = find_line(&code_file["ReviewLines"], "azure.widgets.WidgetClient").unwrap();
    assert_eq!(client["CrossLanguageId"], "Azure.Widgets.WidgetClient");
}

#[test]
fn e2e_absent_fields_are_omitted() {
    let (_temp, snapshot) = sample_in_temp();
    let output = run(&["render", snapshot.to_string_lossy().as_ref()]);
    let json = String::from_utf8_lossy(&output.stdout);
    assert!(!json.contains("null"), "Got:\n{}", json);
}

#[test]
fn e2e_overload_markers_link_to_following_line() {
    let (_temp, snapshot) = sample_in_temp();
    let code_file = render_json(&snapshot);
    let children = class_children(&code_file, "azure.widgets.WidgetClient");

    let mut linked = Vec::new();
    for (i, line) in children.iter().enumerate() {
        if token_text(line) == "@overload" {
            assert!(line.get("LineId").is_none());
            let related = line["RelatedToLine"].as_str().expect("related line");
            assert_eq!(children[i + 1]["LineId"], related);
            linked.push(related.to_string());
        }
    }
    assert_eq!(
        linked,
        vec![
            "azure.widgets.WidgetClient.get_widget:overload:1",
            "azure.widgets.WidgetClient.get_widget:overload:2",
            "azure.widgets.WidgetClient.get_widget:overload:3",
        ]
    );
    assert!(find_line(&code_file["ReviewLines"], "azure.widgets.WidgetClient.get_widget").is_some());
}

#[test]
fn e2e_sync_and_async_ids_are_distinct() {
    let (_temp, snapshot) = sample_in_temp();
    let code_file = render_json(&snapshot);
    let lines = &code_file["ReviewLines"];

    let sync = find_line(lines, "azure.widgets.WidgetClient.close").expect("sync close");
    let async_close = find_line(lines, "azure.widgets.WidgetClient.close:async").expect("async close");
    assert_eq!(sync["Tokens"][0]["Value"], "def");
    assert_eq!(async_close["Tokens"][0]["Value"], "async");
}

#[test]
fn e2e_layout_threshold() {
    let (_temp, snapshot) = sample_in_temp();
    let code_file = render_json(&snapshot);
    let lines = &code_file["ReviewLines"];

    // cls, conn_str
    let single = find_line(lines, "azure.widgets.WidgetClient.from_connection_string").unwrap();
    assert!(single.get("Children").is_none());

    // self, *, max_results
    let multi = find_line(lines, "azure.widgets.WidgetClient.list_widgets").unwrap();
    let children = multi["Children"].as_array().unwrap();
    assert_eq!(children.len(), 4);
    assert_eq!(children[0]["LineId"], "azure.widgets.WidgetClient.list_widgets.param(self)");
    assert!(children[1].get("LineId").is_none());
    assert_eq!(children[3]["LineId"], "azure.widgets.WidgetClient.list_widgets.returntype");
}

#[test]
fn e2e_docstring_fills_gaps() {
    let (_temp, snapshot) = sample_in_temp();
    let code_file = render_json(&snapshot);
    let lines = &code_file["ReviewLines"];

    let etag = find_line(lines, "azure.widgets.WidgetClient.get_widget.param(etag)")
        .expect("docstring-only keyword");
    assert_eq!(token_text(etag), "etag : str ,");

    let returns = find_line(lines, "azure.widgets.WidgetClient.get_widget.returntype").unwrap();
    let widget = returns["Tokens"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["Value"] == "Widget")
        .expect("shortened return type");
    assert_eq!(widget["NavigateToId"], "azure.widgets.Widget");

    let endpoint = find_line(lines, "azure.widgets.WidgetClient.__init__.param(endpoint)").unwrap();
    assert_eq!(token_text(endpoint), "endpoint : str ,");
}

#[test]
fn e2e_text_preview() {
    let (_temp, snapshot) = sample_in_temp();
    let output = run(&[
        "render",
        snapshot.to_string_lossy().as_ref(),
        "--format",
        "text",
    ]);
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);

    for expected in [
        "namespace azure.widgets\n",
        "    class WidgetClient(object):\n",
        "        ivar api_version: str\n",
        "        def from_connection_string(cls, conn_str: str) -> WidgetClient\n",
        "        async def close(self)\n",
        "        def list_widgets(\n            self,\n            *,\n            max_results: int = None\n            ) -> ItemPaged[Widget]\n",
        "    class Color(str, Enum):\n        RED = \"red\"\n        BLUE = \"blue\"\n",
        "        cvar max_size: int = 10\n",
        "        property etag: Optional[str] # Read-only\n",
        "    def azure.widgets.paint(\n        widget: Widget,\n        color: Union[Color, str],\n        /,\n        *,\n        dry_run: bool = False\n        ) -> None\n",
    ] {
        assert!(text.contains(expected), "missing {:?} in:\n{}", expected, text);
    }
}

#[test]
fn e2e_render_is_idempotent() {
    let (temp, snapshot) = sample_in_temp();
    let first = temp.path().join("first.json");
    let second = temp.path().join("second.json");

    for out in [&first, &second] {
        let status = bin()
            .args([
                "render",
                snapshot.to_string_lossy().as_ref(),
                "--pretty",
                "-o",
                out.to_string_lossy().as_ref(),
            ])
            .status()
            .expect("run apistub");
        assert!(status.success());
    }

    let first = std::fs::read_to_string(first).expect("read first");
    let second = std::fs::read_to_string(second).expect("read second");
    assert_eq!(first, second);
}

#[test]
fn e2e_config_overrides() {
    let (temp, snapshot) = sample_in_temp();
    std::fs::write(
        temp.path().join("apistub.toml"),
        r#"
[render]
multi_line_threshold = 5

[package]
name = "widgets"
cross_language_package_id = "Azure.Widgets"

[cross_language_ids]
"azure.widgets.WidgetClient.close:async" = "Azure.Widgets.WidgetClient.CloseAsync"
"#,
    )
    .expect("write config");

    let code_file = render_json(&snapshot);
    assert_eq!(code_file["PackageName"], "widgets");
    assert_eq!(code_file["PackageVersion"], "1.2.0");
    assert_eq!(code_file["CrossLanguagePackageId"], "Azure.Widgets");

    let lines = &code_file["ReviewLines"];
    let list = find_line(lines, "azure.widgets.WidgetClient.list_widgets").unwrap();
    assert!(list.get("Children").is_none());

    let close = find_line(lines, "azure.widgets.WidgetClient.close:async").unwrap();
    assert_eq!(close["CrossLanguageId"], "Azure.Widgets.WidgetClient.CloseAsync");
}

#[test]
fn e2e_hidden_function_and_decorators() {
    let (_temp, snapshot) = sample_in_temp();
    let code_file = render_json(&snapshot);
    let lines = &code_file["ReviewLines"];

    let hidden = find_line(lines, "azure.widgets.WidgetClient._send").unwrap();
    assert_eq!(hidden["IsHidden"], true);

    let children = class_children(&code_file, "azure.widgets.WidgetClient");
    let send = children
        .iter()
        .position(|l| l["LineId"] == "azure.widgets.WidgetClient._send")
        .expect("hidden method line");
    assert!(children[send + 1].get("LineId").is_none());
    assert_eq!(children[send + 1]["IsHidden"], true);

    let classmethod = children
        .iter()
        .find(|l| token_text(l) == "@classmethod")
        .expect("decorator line");
    assert_eq!(
        classmethod["RelatedToLine"],
        "azure.widgets.WidgetClient.from_connection_string"
    );
    assert_eq!(children.last().unwrap()["IsContextEndLine"], true);
}

#[test]
fn e2e_check_reports_ids() {
    let output = run(&["check", fixture().to_string_lossy().as_ref()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("azure-widgets 1.2.0: "), "Got:\n{}", stdout);
    assert!(stdout.contains("unique ids"), "Got:\n{}", stdout);
}

#[test]
fn e2e_identity_collision_fails() {
    let temp_dir = TempDir::new().expect("temp dir");
    let snapshot = temp_dir.path().join("dup.json");
    std::fs::write(
        &snapshot,
        r#"{
            "package_name": "dup",
            "modules": [{
                "kind": "module", "name": "dup", "source_order": 0,
                "children": [
                    {"kind": "function", "name": "run", "source_order": 0},
                    {"kind": "function", "name": "run", "source_order": 1}
                ]
            }]
        }"#,
    )
    .expect("write snapshot");
    let out = temp_dir.path().join("out.json");

    let check = run(&["check", snapshot.to_string_lossy().as_ref()]);
    let render = run(&[
        "render",
        snapshot.to_string_lossy().as_ref(),
        "-o",
        out.to_string_lossy().as_ref(),
    ]);

    for output in [check, render] {
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("identity collision"), "Got:\n{}", stderr);
        assert!(stderr.contains("dup.run"), "Got:\n{}", stderr);
    }
    assert!(!out.exists());
}

#[test]
fn e2e_missing_snapshot_fails() {
    let temp_dir = TempDir::new().expect("temp dir");
    let missing = temp_dir.path().join("nope.json");
    let output = run(&["render", missing.to_string_lossy().as_ref()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load snapshot"));
}
