//! `pchd generate`: the full PCH generation pass.

use std::error::Error;

use pchd_creator::{PchArtifact, PchCreator, PchScope};
use pchd_diagnostics::{Diagnostic, Severity};
use serde::Serialize;

use crate::pipeline::{display_paths, open_session, render_diagnostics};
use crate::{GenerateArgs, GlobalArgs, ReportFormat};

/// Machine-readable result of a generation pass.
#[derive(Debug, Serialize)]
struct GenerateReport {
    global: Option<PchArtifact>,
    project_parts: Vec<PchArtifact>,
    includes: Vec<PartIncludes>,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Serialize)]
struct PartIncludes {
    id: String,
    paths: Vec<String>,
}

/// Runs `pchd generate`. Returns exit code 1 if any error was reported.
pub fn run(args: &GenerateArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let session = open_session(global)?;
    let environment = session.environment();

    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!(
            "  Generating PCHs for {} project part(s) into {}",
            session.config.project_parts.len(),
            session.config.output_directory.display()
        );
    }

    let mut creator = PchCreator::new(
        session.config.project_parts.clone(),
        &environment,
        &session.cache,
        session.frontend.as_ref(),
    );

    if let Err(error) = creator.generate_pchs() {
        render_diagnostics(&creator.diagnostics().take_all(), global);
        return Err(error.into());
    }

    let mut includes = Vec::new();
    for id_paths in creator.take_projects_includes() {
        includes.push(PartIncludes {
            paths: display_paths(&session.cache, &id_paths.paths)?,
            id: id_paths.id,
        });
    }
    let report = GenerateReport {
        global: creator.take_global_pch(),
        project_parts: creator.take_project_part_pchs(),
        includes,
        diagnostics: creator.diagnostics().take_all(),
    };

    match args.format {
        ReportFormat::Text => print_text(&report, global),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    let errors = report
        .diagnostics
        .iter()
        .filter(|diag| diag.severity == Severity::Error)
        .count();
    Ok(if errors > 0 { 1 } else { 0 })
}

fn print_text(report: &GenerateReport, global: &GlobalArgs) {
    render_diagnostics(&report.diagnostics, global);
    for artifact in report.global.iter().chain(&report.project_parts) {
        let label = match &artifact.scope {
            PchScope::Global => "global".to_string(),
            PchScope::ProjectPart(id) => id.clone(),
        };
        println!("{label}: {}", artifact.path.display());
    }
    if global.quiet {
        return;
    }
    for part in &report.includes {
        println!("includes of {}:", part.id);
        for path in &part.paths {
            println!("  {path}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_json_shape() {
        let report = GenerateReport {
            global: None,
            project_parts: vec![],
            includes: vec![PartIncludes {
                id: "app".to_string(),
                paths: vec!["/usr/include/vector".to_string()],
            }],
            diagnostics: vec![],
        };
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert!(json["global"].is_null());
        assert_eq!(json["includes"][0]["id"], "app");
        assert_eq!(json["includes"][0]["paths"][0], "/usr/include/vector");
    }
}
