#![forbid(unsafe_code)]

use colored::*;

fn main() {
    println!("{}", "Mockscan CLI".bright_cyan().bold());
    println!("{}", "------------".bright_cyan());
    println!();
    println!(
        "{}",
        "This is the main entry point, but most functionality is in separate binaries.".yellow()
    );
    println!(
        "{}",
        "Use 'cargo run --bin <binary_name>' to run a specific command.".yellow()
    );
    println!();
    println!("{}", "Available binaries:".bright_green().underline());
    println!("  - {}", "mockscan-explorer".bright_white());
    println!("  - {}", "mockscan-api".bright_white());
    println!();
    println!("{}", "Examples:".bright_green().underline());
    println!("{}", "  cargo run --bin mockscan-explorer -- latest --count 5".italic());
    println!("{}", "  cargo run --bin mockscan-explorer -- search 3".italic());
    println!("{}", "  cargo run --bin mockscan-api".italic());
}
