//! Configuration view command — `proposer config`.

use console::style;

use proposer::config::Settings;

pub fn cmd_config(settings: &Settings) {
    println!();
    println!("Proposer Configuration");
    println!("======================");
    println!();
    println!("{}", settings);

    let warnings = settings.validate();
    if warnings.is_empty() {
        println!();
        println!("{}", style("Configuration is valid.").green());
        return;
    }

    println!();
    println!("{}", style("Warnings:").yellow().bold());
    for warning in warnings {
        println!("  - {}", warning);
    }
}
