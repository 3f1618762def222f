//! `pchd command-line`: print a part's PCH compiler invocation.

use std::error::Error;

use pchd_creator::PchCreator;

use crate::pipeline::open_session;
use crate::{CommandLineArgs, GlobalArgs};

/// Runs `pchd command-line`. Prints one argument per line, executable first.
pub fn run(args: &CommandLineArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let session = open_session(global)?;
    let environment = session.environment();
    let creator = PchCreator::new(
        session.config.project_parts.clone(),
        &environment,
        &session.cache,
        session.frontend.as_ref(),
    );

    let part = creator.project_part(&args.part)?;
    for argument in creator.generate_project_part_pch_compiler_arguments(part) {
        println!("{argument}");
    }
    Ok(0)
}
