use clap::Parser;
use itertools::Itertools;
use journey::prelude::*;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Walk a workflow document interactively from the terminal
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory holding the workflow documents
    documents: PathBuf,
    /// Document to start with, relative to the directory
    #[arg(default_value = "start")]
    url: String,
    /// Task name to always stop at (repeatable)
    #[arg(short, long)]
    breakpoint: Vec<String>,
    /// Upper bound on passes of any single loop
    #[arg(long)]
    max_loop_passes: Option<usize>,
    /// JSON file with engine settings
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("journey=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to read config '{}': {}", path.display(), e))
            });
            serde_json::from_str::<EngineConfig>(&text)
                .unwrap_or_else(|e| exit_with_error(&format!("Invalid config file: {}", e)))
        }
        None => EngineConfig::default(),
    };
    config.breakpoints.extend(cli.breakpoint);
    if let Some(limit) = cli.max_loop_passes {
        config.max_loop_passes = limit;
    }

    let source = DirectorySource::new(&cli.documents);
    let mut client = Client::with_config(source, &cli.url, config)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to start: {}", e)));

    println!("--- Journey Interactive Mode ---");
    loop {
        let task = client
            .get_task()
            .unwrap_or_else(|e| exit_with_error(&format!("Workflow failed: {}", e)));
        let Some(mut task) = task else {
            break;
        };

        let outcome = match task.kind() {
            TaskKind::Screen => run_screen(&mut task),
            TaskKind::Jsonrpc => run_remote_call(&mut task),
            kind => {
                println!("\n== Breakpoint: {} ({}) ==", task.name(), kind);
                prompt_for_input("Press enter to continue", None);
                Ok(())
            }
        };
        if let Err(e) = outcome {
            println!("  ! {}", e);
        }

        for event in client.take_events() {
            println!("  event: {:?}", event);
        }
    }

    println!("\nWorkflow finished.");
    let state = client.session().state();
    println!(
        "{}",
        serde_json::to_string_pretty(state).unwrap_or_else(|_| state.to_string())
    );
}

fn run_screen(task: &mut PendingTask<'_>) -> std::result::Result<(), EngineError> {
    println!("\n== Screen: {} ==", task.name());
    let components = task.get_components()?;
    for view in &components {
        println!("  [{}] {} {}", view.kind, view.name, view.display);
        if !view.errors.is_empty() {
            println!("      errors: {}", view.errors.iter().join("; "));
        }
    }

    for view in components.iter().filter(|v| matches!(v.kind, "input" | "datetime" | "selection")) {
        let current = view.value.as_ref().filter(|v| !v.is_null()).map(|v| v.to_string());
        let answer = prompt_for_input(&format!("Value for '{}'", view.name), current.as_deref());
        if !answer.is_empty() {
            task.set(&view.name, parse_value(&answer))?;
        }
    }

    let clickable = components
        .iter()
        .filter(|v| matches!(v.kind, "button" | "toggle") && !v.disabled)
        .map(|v| v.name.as_str())
        .collect_vec();
    if clickable.is_empty() {
        return Ok(());
    }
    let choice = prompt_for_input(
        &format!("Click one of [{}]", clickable.iter().join(", ")),
        clickable.first().copied(),
    );
    task.click(&choice)?;

    let errors = task.errors()?;
    for (name, messages) in errors.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
        println!("  ! {}: {}", name, messages.iter().join("; "));
    }
    Ok(())
}

fn run_remote_call(task: &mut PendingTask<'_>) -> std::result::Result<(), EngineError> {
    println!("\n== Remote call: {} ==", task.name());
    println!("  endpoint: {}", task.get_endpoint()?);
    println!("  payload:  {}", task.get_payload()?);
    let answer = prompt_for_input("Result (JSON)", Some("null"));
    task.set_result(parse_value(&answer))
}

/// Reads JSON when the answer parses as JSON, otherwise keeps it as a string.
fn parse_value(answer: &str) -> serde_json::Value {
    serde_json::from_str(answer).unwrap_or_else(|_| serde_json::Value::String(answer.to_string()))
}

/// A helper function to prompt the user and read a line of input.
fn prompt_for_input(prompt_text: &str, default: Option<&str>) -> String {
    let mut line = String::new();
    let default_prompt = default.map_or("".to_string(), |d| format!(" [default: {}]", d));

    print!("> {}{}: ", prompt_text, default_prompt);
    io::stdout().flush().unwrap();

    io::stdin()
        .read_line(&mut line)
        .expect("Failed to read line");
    let trimmed = line.trim().to_string();

    if trimmed.is_empty() {
        default.unwrap_or("").to_string()
    } else {
        trimmed
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
