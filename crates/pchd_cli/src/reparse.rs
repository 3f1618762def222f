//! `pchd reparse`: run one document through the job queue.

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use pchd_common::{normalize_with_base, ProjectPart};
use pchd_jobs::{JobQueue, JobRequest, PreferredTranslationUnit};

use crate::pipeline::{display_paths, open_session, render_diagnostics};
use crate::{GlobalArgs, ReparseArgs};

/// Runs `pchd reparse`. Returns exit code 1 if the reparse reported errors.
pub fn run(args: &ReparseArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let session = open_session(global)?;
    let file = normalize_with_base(&std::env::current_dir()?, &args.file);
    let part = select_part(&session.config.project_parts, &file, args.part.as_deref())?;

    let mut queue = JobQueue::new(
        Arc::clone(&session.frontend),
        Arc::clone(&session.cache),
        session.config.compiler_path.clone(),
        session.config.threads,
    )?;
    queue.open_document(
        &file,
        part.id.clone(),
        part.arguments.clone(),
        session.config.working_directory.clone(),
    )?;

    let (request, unit) = if args.supportive {
        (JobRequest::reparse_supportive(&file), PreferredTranslationUnit::Supportive)
    } else {
        (JobRequest::reparse(&file), PreferredTranslationUnit::Primary)
    };
    queue.add(request)?;
    let report = queue.wait_until_idle();
    tracing::debug!(?report, "job queue idle");
    render_diagnostics(&queue.diagnostics().take_all(), global);

    let document = queue.documents().get(&file)?;
    let Some(result) = document.update_result(unit) else {
        return Ok(1);
    };
    render_diagnostics(&result.diagnostics, global);
    for path in display_paths(&session.cache, &result.include_ids)? {
        println!("{path}");
    }
    let failed = result.diagnostics.iter().any(|diag| diag.severity.is_error());
    Ok(if failed { 1 } else { 0 })
}

/// Picks the part named by `--part`, or else the first part listing `file`.
fn select_part<'a>(parts: &'a [ProjectPart], file: &Path, id: Option<&str>) -> Result<&'a ProjectPart, String> {
    match id {
        Some(id) => parts
            .iter()
            .find(|part| part.id == id)
            .ok_or_else(|| format!("unknown project part '{id}'")),
        None => parts
            .iter()
            .find(|part| part.sources.iter().chain(&part.headers).any(|path| path == file))
            .ok_or_else(|| format!("{} is not in any project part; pass --part", file.display())),
    }
}
