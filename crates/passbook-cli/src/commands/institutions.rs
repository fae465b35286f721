//! Institutions command - list the statement layouts the pipeline knows.

use console::style;

use passbook_core::SchemaRegistry;

pub async fn run() -> anyhow::Result<()> {
    let registry = SchemaRegistry::builtin();

    println!(
        "{:<10} {:<24} {:<20} {}",
        style("KEY").bold(),
        style("NAME").bold(),
        style("SOURCES").bold(),
        style("ALIASES").bold()
    );

    for schema in registry.iter() {
        let sources: Vec<String> = schema
            .supported_sources()
            .iter()
            .map(ToString::to_string)
            .collect();

        println!(
            "{:<10} {:<24} {:<20} {}",
            schema.key,
            schema.name,
            sources.join(","),
            schema.aliases.join(", ")
        );
    }

    println!();
    println!(
        "{} {} institutions. Pass the key or an alias to --bank.",
        style("ℹ").blue(),
        registry.len()
    );

    Ok(())
}
