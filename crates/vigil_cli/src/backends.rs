//! `vigil backends`: list the configured backends.

use std::error::Error;

use vigil_backend::{Backend, BackendRegistry};

use crate::project::load_project;
use crate::{GlobalArgs, ReportFormat};

/// Runs the `vigil backends` command.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let project = load_project(global)?;
    let registry = BackendRegistry::with_defaults(&project.config, &project.root);
    for backend in registry.iter() {
        println!("{}", describe(backend, global.format));
    }
    Ok(0)
}

/// One line describing `backend`.
fn describe(backend: &dyn Backend, format: ReportFormat) -> String {
    match format {
        ReportFormat::Json => serde_json::json!({
            "name": backend.name(),
            "mode": backend.mode(),
            "naming": backend.naming().name,
            "stimulus": backend.accepts_stimulus(),
        })
        .to_string(),
        ReportFormat::Text => format!(
            "{:<16} {:<12} {}",
            backend.name(),
            backend.mode().to_string(),
            backend.naming().name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use vigil_config::VigilConfig;

    #[test]
    fn describe_text_and_json() {
        let registry = BackendRegistry::with_defaults(&VigilConfig::for_project("p"), Path::new("."));
        let verilator = registry.get("verilator").unwrap();
        assert_eq!(
            describe(verilator, ReportFormat::Text),
            "verilator        static       verilator"
        );

        let lvs = registry.get("lvs").unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&describe(lvs, ReportFormat::Json)).unwrap();
        assert_eq!(json["name"], "lvs");
        assert_eq!(json["mode"], "static");
        assert_eq!(json["naming"], "root-only");
        assert_eq!(json["stimulus"], false);
    }
}
