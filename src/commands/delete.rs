use anyhow::Result;
use stackkit::{Orchestrator, stack_name};

use crate::Context;
use crate::config::{ConfigLoadError, Settings};
use crate::progress::StatusSpinner;
use crate::ui;

pub fn run(ctx: &Context, settings: &Settings, name: Option<&str>) -> Result<()> {
    let name = stack_name(name, &settings.stack_name);

    // The template only gates the delete when it is present
    let template = match settings.load_template() {
        Ok(template) => Some(template),
        Err(ConfigLoadError::MissingTemplate { path }) => {
            log::debug!("No template at {}, skipping validation", path.display());
            None
        }
        Err(e) => return Err(e.into()),
    };
    let provisioner = super::connect(settings)?;

    if !ctx.quiet {
        ui::header(&format!("Deleting stack {name}"));
        ui::kv("Provider", &settings.provider.to_string());
        println!();
    }

    let spinner = StatusSpinner::new(&name, ctx.quiet);
    let result = Orchestrator::new(provisioner.as_ref(), settings.poll.clone())
        .with_observer(&spinner)
        .with_cancel(ctx.cancel.clone())
        .delete(&name, template.as_ref());
    spinner.finish();

    match result {
        Ok(report) => {
            ui::final_status(&report.name, report.status);
            log::debug!("{} status checks, stages: {:?}", report.attempts, report.stages);
            Ok(())
        }
        Err(failure) => Err(super::report_failure(failure)),
    }
}
