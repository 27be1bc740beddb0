// Main entry point for the CampusDB server
// Serves the query API over HTTP, or answers queries from the command line

use anyhow::{Context, Result};
use campusdb::{server, Dataset, QueryEngine, QueryParser};
use clap::Parser as ClapParser;
use std::io::{self, Write};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CampusDB - a read-only query API over students, courses and grades
#[derive(ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON dataset loaded once at startup
    #[arg(short, long, env = "CAMPUSDB_DATA", default_value = "data.json")]
    data: PathBuf,

    /// Address to bind the HTTP server to
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// Run a single API path (e.g. /api/students/1/gpa), print the result and exit
    #[arg(short, long)]
    execute: Option<String>,

    /// Start an interactive shell instead of the HTTP server
    #[arg(long)]
    shell: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campusdb=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Missing or malformed data aborts startup
    let dataset = Dataset::load(&args.data)
        .with_context(|| format!("could not load {}", args.data.display()))?;
    tracing::info!("Loaded {}: {}", args.data.display(), dataset.summary());

    let engine = QueryEngine::new(dataset);

    if let Some(path) = args.execute {
        return execute_query(&engine, &path);
    }

    if args.shell {
        println!("CampusDB shell - type an API path such as /api/students");
        println!("Type '.help' for help, '.exit' to quit");
        println!();
        return repl(|path| execute_query(&engine, path));
    }

    let addr = SocketAddr::new(args.host, args.port);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::serve(engine, addr))
}

/// REPL (Read-Eval-Print Loop) over API paths
fn repl<F>(mut execute_fn: F) -> Result<()>
where
    F: FnMut(&str) -> Result<()>,
{
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("campusdb> ");
        stdout.flush()?;

        let mut input = String::new();
        if stdin.read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input.starts_with('.') {
            match input {
                ".exit" | ".quit" => break,
                ".help" => {
                    print_help();
                    continue;
                }
                _ => {
                    println!("Unknown command: {}", input);
                    println!("Type '.help' for help");
                    continue;
                }
            }
        }

        if let Err(e) = execute_fn(input) {
            eprintln!("Error: {}", e);
        }
    }

    Ok(())
}

/// Resolve one API path and print the result as JSON
fn execute_query(engine: &QueryEngine, path: &str) -> Result<()> {
    let query = QueryParser::parse(path)?;
    let result = engine.execute(&query)?;
    println!("{}", result.format());
    Ok(())
}

fn print_help() {
    println!("Special Commands:");
    println!("  .help              Show this help message");
    println!("  .exit, .quit       Exit the shell");
    println!();
    println!("Lookups:");
    println!("  /api/{{students,instructors,courses,enrollments,assignments,grades}}[/:id]");
    println!();
    println!("Relationships:");
    println!("  /api/students/:id/enrollments     /api/students/:id/courses");
    println!("  /api/courses/:id/students         /api/courses/:id/assignments");
    println!("  /api/instructors/:id/courses      /api/instructors/:id/students");
    println!("  /api/enrollments/:id/grades");
    println!();
    println!("Statistics:");
    println!("  /api/students/:id/gpa             /api/courses/:id/average");
    println!("  /api/students/:id/schedule");
    println!();
    println!("  /data dumps the whole dataset");
    println!();
}
