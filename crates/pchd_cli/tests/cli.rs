//! Runs the `pchd` binary against a small project on disk.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

struct Project {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = std::fs::canonicalize(dir.path()).unwrap();
        let write = |rel: &str, contents: &str| {
            let path = root.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, contents).unwrap();
        };

        write("third_party/common.h", "#pragma once\n");
        write("third_party/only_a.h", "#pragma once\n");
        write("a/a.cpp", "#include <common.h>\n#include <only_a.h>\n");
        write("b/b.cpp", "#include <common.h>\n");
        write(
            "pchd.toml",
            r#"
[compiler]
path = "clang++"

[output]
directory = "out"

[[project_parts]]
id = "a"
arguments = ["-I", "third_party"]
sources = ["a/a.cpp"]

[[project_parts]]
id = "b"
arguments = ["-I", "third_party"]
sources = ["b/b.cpp"]
"#,
        );
        Self { _dir: dir, root }
    }

    fn pchd(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_pchd"))
            .args(args)
            .current_dir(&self.root)
            .env_remove("RUST_LOG")
            .output()
            .unwrap()
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn generate_writes_every_pch() {
    let project = Project::new();
    let output = project.pchd(&["--quiet", "generate"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    assert!(project.path("out/global-pch.pch").is_file());
    let lines = stdout_lines(&output);
    assert_eq!(lines[0], format!("global: {}", display(&project.path("out/global-pch.pch"))));
    assert!(lines[1].starts_with("a: "));
    assert!(lines[2].starts_with("b: "));
}

#[test]
fn generate_json_report() {
    let project = Project::new();
    let output = project.pchd(&["generate", "--format", "json"]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["global"]["scope"]["scope"], "global");
    assert_eq!(report["project_parts"].as_array().unwrap().len(), 2);
    assert_eq!(report["includes"][0]["id"], "a");
    assert_eq!(report["includes"][0]["paths"][0], display(&project.path("third_party/only_a.h")));
    assert!(report["includes"][1]["paths"].as_array().unwrap().is_empty());
}

#[test]
fn includes_global_and_per_part() {
    let project = Project::new();

    let global = project.pchd(&["includes"]);
    assert!(global.status.success());
    assert_eq!(stdout_lines(&global), vec![display(&project.path("third_party/common.h"))]);

    let part = project.pchd(&["includes", "--part", "a"]);
    assert_eq!(stdout_lines(&part), vec![display(&project.path("third_party/only_a.h"))]);
}

#[test]
fn command_line_for_part() {
    let project = Project::new();
    let output = project.pchd(&["command-line", "--part", "b"]);
    assert!(output.status.success());

    let lines = stdout_lines(&output);
    assert_eq!(lines[0], "clang++");
    assert!(lines.contains(&"-include-pch".to_string()));
    assert!(lines.contains(&display(&project.path("out/global-pch.pch"))));
}

#[test]
fn unknown_part_fails() {
    let project = Project::new();
    let output = project.pchd(&["command-line", "--part", "zzz"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error: "));
}

#[test]
fn reparse_prints_document_includes() {
    let project = Project::new();
    let output = project.pchd(&["reparse", "a/a.cpp"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout_lines(&output),
        vec![
            display(&project.path("third_party/common.h")),
            display(&project.path("third_party/only_a.h")),
        ]
    );
}
