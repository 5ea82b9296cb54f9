//! `vigil lvs`: write the layout-vs-schematic job and optionally run it.

use std::error::Error;

use vigil_actions::Sequence;
use vigil_backend::{run_artifact, BackendContext, BackendRegistry};
use vigil_signal::Circuit;

use crate::project::load_project;
use crate::report;
use crate::{GlobalArgs, LvsArgs};

/// Runs the `vigil lvs` command.
///
/// The job compares the configured layout and schematic; it takes no test
/// file. Returns 1 if the job could not be written or `calibre` failed.
pub fn run(args: &LvsArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let project = load_project(global)?;
    let registry = BackendRegistry::with_defaults(&project.config, &project.root);
    let backend = registry.get("lvs")?;

    let program = Sequence::new(Circuit::new(project.config.project.name.clone())).finalize();
    let dir = project.build_dir(args.out_dir.as_deref()).join(backend.name());
    let mut ctx = BackendContext::from_config(dir, &project.config);

    let artifact = match backend.emit(&program, &mut ctx) {
        Ok(artifact) => artifact,
        Err(e) => {
            report::render(&[report::backend_error(backend.name(), &e)], global);
            return Ok(1);
        }
    };
    if !global.quiet {
        for file in &artifact.files {
            eprintln!("      Wrote {}", file.display());
        }
    }

    if !args.run {
        if !global.quiet {
            for invocation in &artifact.invocations {
                eprintln!("        Run {invocation}");
            }
        }
        return Ok(0);
    }

    match run_artifact(&artifact) {
        Ok(outcome) => {
            for output in &outcome.outputs {
                print!("{}", output.stdout);
            }
            if !global.quiet {
                eprintln!(
                    "   Completed LVS, report in {}",
                    artifact.dir.join(&project.config.lvs.report).display()
                );
            }
            Ok(0)
        }
        Err(e) => {
            report::render(&[report::backend_error(backend.name(), &e)], global);
            Ok(1)
        }
    }
}
