use colored::Colorize;
use stackkit::StackStatus;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Color a stack status by outcome
pub fn status(status: StackStatus) -> String {
    let text = status.as_str();
    if status.is_success() {
        text.green().bold().to_string()
    } else if status.is_failure() {
        text.red().bold().to_string()
    } else {
        text.yellow().to_string()
    }
}

/// Print the final line of a create or delete
pub fn final_status(name: &str, status: StackStatus) {
    let line = format!("Stack {} finished with status {}", name.bold(), self::status(status));
    if status.is_success() {
        success(&line);
    } else {
        error(&line);
    }
}
