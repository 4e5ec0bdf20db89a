use anyhow::Result;
use stackkit::{Error, stack_name};

use crate::Context;
use crate::config::Settings;
use crate::ui;

pub fn run(ctx: &Context, settings: &Settings, name: Option<&str>) -> Result<()> {
    let name = stack_name(name, &settings.stack_name);
    let provisioner = super::connect(settings)?;

    match provisioner.describe(&name) {
        Ok(status) => {
            if ctx.quiet {
                println!("{status}");
            } else {
                ui::kv(&name, &ui::status(status));
            }
            Ok(())
        }
        Err(Error::StackNotFound { .. }) => {
            ui::warn(&format!("Stack {name} does not exist"));
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
