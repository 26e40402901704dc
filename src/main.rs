mod debug_report;

use formwork::{Context, EmailRule, EmailTemplate, FormSchema, Options, SubmissionData, process_verbose_with};
use serde::Deserialize;
use std::io::{self, IsTerminal, Read};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let case = match load_case(config.case.as_deref()) {
        Ok(case) => case,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = case.schema.validate() {
        eprintln!("warning: schema: {err}");
    }

    let ctx = Context {
        rules: case.rules,
        templates: case.templates,
        notification_email: config.notify.or(case.notification_email),
    };
    let opts = Options {};
    let res = process_verbose_with(&case.schema, &case.submission, &ctx, &opts);
    debug_report::print_run(&res, config.color);
}

/// One self-contained case: a schema plus everything a submission is
/// processed against.
#[derive(Debug, Deserialize)]
struct CaseFile {
    schema: FormSchema,
    #[serde(default)]
    submission: SubmissionData,
    #[serde(default)]
    rules: Vec<EmailRule>,
    #[serde(default)]
    templates: Vec<EmailTemplate>,
    #[serde(default)]
    notification_email: Option<String>,
}

struct CliConfig {
    case: Option<String>,
    notify: Option<String>,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut case: Option<String> = None;
    let mut notify: Option<String> = None;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("formwork {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--notify" => {
                let value = args.next().ok_or_else(|| "error: --notify expects a value".to_string())?;
                notify = Some(value);
            }
            "--case" | "-c" => {
                let value = args.next().ok_or_else(|| "error: --case expects a value".to_string())?;
                if case.is_some() {
                    return Err("error: case file provided multiple times".to_string());
                }
                case = Some(value);
            }
            "--" => {
                if let Some(rest) = args.next() {
                    if case.is_some() {
                        return Err("error: case file provided multiple times".to_string());
                    }
                    case = Some(rest);
                }
                break;
            }
            _ if arg.starts_with("--notify=") => {
                let value = arg.trim_start_matches("--notify=");
                notify = Some(value.to_string());
            }
            _ if arg.starts_with("--case=") => {
                let value = arg.trim_start_matches("--case=");
                if case.is_some() {
                    return Err("error: case file provided multiple times".to_string());
                }
                case = Some(value.to_string());
            }
            _ if arg.starts_with('-') && arg != "-" => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                if case.is_some() {
                    return Err("error: case file provided multiple times".to_string());
                }
                case = Some(arg);
            }
        }
    }

    Ok(CliConfig { case, notify, color })
}

fn load_case(path: Option<&str>) -> Result<CaseFile, String> {
    let raw = match path {
        Some("-") | None => read_stdin_input()?,
        Some(path) => std::fs::read_to_string(path)
            .map_err(|err| format!("error: failed to read {path}: {err}"))?,
    };

    if raw.trim().is_empty() {
        return Err(format!("error: no case provided\n\n{}", help_text()));
    }

    serde_json::from_str(&raw).map_err(|err| format!("error: invalid case JSON: {err}"))
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "formwork {version}

Form-submission processing CLI.

Runs one submission through field mapping, conditional logic, email rules,
and template rendering, then reports every decision along the way.

Usage:
  formwork [OPTIONS] [--] <case.json>
  formwork [OPTIONS] < case.json

The case file is a JSON object with `schema`, and optionally `submission`,
`rules`, `templates`, and `notification_email`.

Options:
  -c, --case <path>          Case file to process. `-` or no path reads stdin.
  --notify <email>           Team notification address; overrides the case file.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Exit codes:
  0  Success.
  1  Case file could not be read or parsed.
  2  Invalid arguments.
",
        version = env!("CARGO_PKG_VERSION")
    )
}
