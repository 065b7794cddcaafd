//! `wayfarer update-status` command implementation

use crate::CliError;
use crate::context::CliContext;
use crate::output::{or_dash, print_json};
use colored::Colorize;
use wayfarer_build::status::{UpdateStatusSnapshot, read_update_status};

pub fn run(ctx: &CliContext) -> Result<(), CliError> {
    let update = read_update_status(ctx.config.data_path());

    if ctx.format.is_json() {
        print_json(&update)?;
    } else {
        print_update(&update);
    }
    Ok(())
}

pub(crate) fn print_update(update: &UpdateStatusSnapshot) {
    let available = if update.update_available {
        "yes".green()
    } else {
        "no".normal()
    };

    println!("  {}", "Update".bold());
    println!("    Available: {}   State: {}", available, update.state.yellow());
    println!("    Reason:    {}", or_dash(Some(update.reason.clone())));
    if !update.message.is_empty() {
        println!("    Message:   {}", update.message);
    }
    println!(
        "    Checked:   {}   Next: {}",
        or_dash(update.checked_at.map(|t| t.to_rfc3339())),
        or_dash(update.next_check_at.map(|t| t.to_rfc3339()))
    );
    if update.marker_exists {
        println!("    Marker:    {}", "present".yellow());
    }
    if let Some(error) = &update.remote.error {
        println!("    Remote:    {}", error.red());
    }
}
