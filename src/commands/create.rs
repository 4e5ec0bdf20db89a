use anyhow::Result;
use stackkit::{Orchestrator, stack_name};

use crate::Context;
use crate::config::Settings;
use crate::progress::StatusSpinner;
use crate::{prompt, ui};

pub fn run(ctx: &Context, settings: &Settings, name: Option<&str>) -> Result<()> {
    let name = stack_name(name, &settings.stack_name);
    let template = settings.load_template()?;
    let provisioner = super::connect(settings)?;

    if !ctx.quiet {
        ui::header(&format!("Creating stack {name}"));
        ui::kv("Provider", &settings.provider.to_string());
        ui::kv("Template", &settings.template_path.display().to_string());
        println!();
    }

    let spinner = StatusSpinner::new(&name, ctx.quiet);
    let mut input = prompt::input_source();

    let result = Orchestrator::new(provisioner.as_ref(), settings.poll.clone())
        .with_observer(&spinner)
        .with_cancel(ctx.cancel.clone())
        .create(&name, &template, input.as_mut());
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
