pub mod config;
pub mod create;
pub mod delete;
pub mod status;

use anyhow::{Context as _, Result};
use stackkit::{Failure, Provisioner};

use crate::config::Settings;
use crate::ui;

/// Build the provisioner selected by `settings`.
fn connect(settings: &Settings) -> Result<Box<dyn Provisioner>> {
    stackkit::backend::connect(
        settings.provider,
        &settings.region,
        settings.project.as_deref(),
    )
    .with_context(|| format!("Could not set up the {} provider", settings.provider))
}

/// Print the closing status line of a failed run and hand the failure back
/// for `main` to log.
fn report_failure(failure: Failure) -> anyhow::Error {
    ui::final_status(&failure.name, failure.status);
    let category = failure.source.category();
    ui::dim(&format!("{}: {}", category.description(), category.advice()));
    anyhow::Error::new(failure)
}
