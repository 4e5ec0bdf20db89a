use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::config::{Ec2Config, Settings};
use crate::{paths, ui};

pub fn run(settings: &Settings) -> Result<()> {
    ui::header("Furnace Configuration");

    ui::section("Files");
    ui::kv("Config dir", &settings.config_dir.display().to_string());
    show_file("Settings", &settings.config_dir.join(paths::SETTINGS_FILE));
    show_file("Template", &settings.template_path);
    show_file("EC2 settings", &settings.ec2_path());

    ui::section("Stack");
    ui::kv("Provider", &settings.provider.to_string());
    ui::kv("Default name", &settings.stack_name);
    match settings.provider {
        stackkit::Provider::Aws => ui::kv("Region", &settings.region),
        stackkit::Provider::Gcp => ui::kv(
            "Project",
            settings.project.as_deref().unwrap_or("(not set)"),
        ),
    }

    ui::section("Polling");
    let poll = &settings.poll;
    ui::kv("Interval", &format!("{}s", poll.interval.as_secs_f64()));
    ui::kv("Max checks", &poll.max_attempts.to_string());
    ui::kv(
        "Timeout",
        &poll
            .timeout
            .map(|t| format!("{}s", t.as_secs()))
            .unwrap_or_else(|| "none".to_string()),
    );
    ui::kv(
        "Retries",
        &format!(
            "{} attempts, {}s base delay, x{} backoff, {}s cap",
            poll.retry.max_attempts,
            poll.retry.base_delay.as_secs_f64(),
            poll.retry.backoff_factor,
            poll.retry.max_delay.as_secs_f64()
        ),
    );

    if let Some(ec2) = Ec2Config::load(&settings.ec2_path())? {
        show_ec2(&ec2);
    }

    println!();
    Ok(())
}

fn show_file(label: &str, path: &Path) {
    let marker = if path.exists() {
        "✓".green()
    } else {
        "missing".yellow()
    };
    ui::kv(label, &format!("{} {}", path.display(), marker));
}

fn show_ec2(ec2: &Ec2Config) {
    ui::section("EC2");
    ui::kv("Image", &ec2.image_id);
    ui::kv("Instance type", &ec2.instance_type);
    ui::kv("Key name", &ec2.key_name);
    ui::kv("Count", &format!("{}..{}", ec2.min_count, ec2.max_count));
    ui::kv("Monitoring", if ec2.monitoring.enabled { "on" } else { "off" });
    if ec2.dry_run {
        ui::dim("dry run enabled");
    }
}
