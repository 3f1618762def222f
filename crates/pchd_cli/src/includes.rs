//! `pchd includes`: show what a PCH would contain without emitting it.

use std::error::Error;

use pchd_creator::PchCreator;

use crate::pipeline::{display_paths, open_session, render_diagnostics};
use crate::{GlobalArgs, IncludesArgs};

/// Runs `pchd includes`.
///
/// With `--part`, prints the headers the part adds on top of the global set;
/// otherwise prints the global set.
pub fn run(args: &IncludesArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let session = open_session(global)?;
    let environment = session.environment();
    let mut creator = PchCreator::new(
        session.config.project_parts.clone(),
        &environment,
        &session.cache,
        session.frontend.as_ref(),
    );

    let includes = match &args.part {
        Some(id) => {
            let part = creator.project_part(id)?.clone();
            creator.generate_project_part_pch_includes(&part)?
        }
        None => creator.generate_global_pch_include_ids(),
    };

    render_diagnostics(&creator.diagnostics().take_all(), global);
    for path in display_paths(&session.cache, includes.as_slice())? {
        println!("{path}");
    }
    Ok(0)
}
