//! Ashe CLI
//!
//! Usage:
//!   ashe [OPTIONS] [TEMPLATE]
//!
//! Options:
//!   -d, --data <FILE>     JSON file with the template data
//!   -c, --config <FILE>   Engine config (TOML format)
//!   --set <KEY=VALUE>     Extra data binding, repeatable
//!   --debug               Fail on undefined loop sources
//!   -s, --syntax          Show template syntax reference
//!   -h, --help            Print help

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ashe::{Context, Engine, EngineConfig, RenderConfig, Value};

#[derive(Parser)]
#[command(name = "ashe")]
#[command(about = "Render text templates against JSON data")]
struct Cli {
    /// Template file (reads from stdin if not provided)
    template: Option<PathBuf>,

    /// JSON file with the template data
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Engine config file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind KEY to VALUE; VALUE is parsed as JSON, or taken as a string
    #[arg(long = "set", value_name = "KEY=VALUE")]
    sets: Vec<String>,

    /// Debug mode: undefined loop sources are errors
    #[arg(long)]
    debug: bool,

    /// Show template syntax reference
    #[arg(short, long)]
    syntax: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.syntax {
        print_syntax();
        return;
    }

    let config = match &cli.config {
        Some(path) => match EngineConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    init_logging(config.log_level.as_deref());

    // If no template file and stdin is a terminal (interactive), show intro help
    if cli.template.is_none() && io::stdin().is_terminal() {
        print_intro();
        return;
    }

    let template = match &cli.template {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => buffer,
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    process::exit(1);
                }
            }
        }
    };

    let mut data = match &cli.data {
        Some(path) => match load_data(path) {
            Ok(ctx) => ctx,
            Err(e) => {
                eprintln!("Error loading data '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => Context::new(),
    };

    for binding in &cli.sets {
        match parse_binding(binding) {
            Some((key, value)) => data.set(key, value),
            None => {
                eprintln!("Error: --set expects KEY=VALUE, got '{}'", binding);
                process::exit(1);
            }
        }
    }

    let debug = cli.debug || config.debug;
    let engine = Engine::with_config(RenderConfig::from(config).with_debug(debug));
    match engine.render(&template, data) {
        Ok(output) => print!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn init_logging(config_level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config_level.unwrap_or("warn")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_data(path: &Path) -> Result<Context, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let json: serde_json::Value = serde_json::from_str(&content).map_err(|e| e.to_string())?;
    match Value::from(json) {
        Value::Object(map) => Ok(Context::from(map)),
        _ => Err("top-level JSON value must be an object".to_string()),
    }
}

fn parse_binding(binding: &str) -> Option<(&str, Value)> {
    let (key, raw) = binding.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let value = serde_json::from_str::<serde_json::Value>(raw)
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(raw));
    Some((key, value))
}

fn print_intro() {
    println!(
        r#"Ashe - Text templates with filters, loops, conditionals and assignment

USAGE:
    ashe [OPTIONS] [TEMPLATE]
    echo '<template>' | ashe [OPTIONS]

OPTIONS:
    -d, --data       JSON file with the template data
    -c, --config     Engine config (TOML file)
    --set K=V        Extra data binding (repeatable)
    --debug          Fail on undefined loop sources
    -s, --syntax     Show template syntax reference
    -h, --help       Print help

QUICK START:
    echo 'Hello {{{{ name | upper }}}}!' | ashe --set name=world

Run --syntax for the template syntax reference."#
    );
}

fn print_syntax() {
    println!(
        r#"ASHE TEMPLATE SYNTAX
====================

OUTPUT
------
{{{{ user.name }}}}                    Dotted path into the data
{{{{ items.0 }}}}  {{{{ items.length }}}}    Sequence index and length
{{{{ 'literal' }}}}                    Quoted literal
{{{{ title | lower | truncate(20) }}}}  Filters, applied left to right

Absent, null, false, 0 and empty values print as empty text.

CONDITIONALS
------------
{{% if user.admin %}} ... {{% else %}} ... {{% endif %}}

LOOPS
-----
{{% for item in items %}} ... {{% endfor %}}
{{% for key, value in mapping %}} ... {{% else %}} empty {{% endfor %}}

Each iteration gets its own copy of the data; assignments made inside
a loop body stay inside that iteration.

ASSIGNMENT
----------
{{% set title = page.title %}}
{{% set banner %}}Welcome, {{{{ name }}}}{{% endset %}}

BUILT-IN FILTERS
----------------
upper  lower  capitalize  trim  length  escape  slugify  json
default(fallback)  join(sep)  truncate(n)  replace(from, to)

Filter arguments are quoted literals or paths into the data."#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_binding_json_and_string() {
        assert_eq!(parse_binding("n=3"), Some(("n", Value::from(3))));
        assert_eq!(parse_binding("name=ada"), Some(("name", Value::from("ada"))));
        assert_eq!(
            parse_binding("xs=[1,2]"),
            Some(("xs", Value::from(vec![1, 2])))
        );
        assert_eq!(parse_binding("eq=a=b"), Some(("eq", Value::from("a=b"))));
    }

    #[test]
    fn test_parse_binding_rejects_missing_key() {
        assert_eq!(parse_binding("novalue"), None);
        assert_eq!(parse_binding("=3"), None);
    }
}
