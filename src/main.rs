use std::error::Error;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::{ArgAction, Parser};
use encoding_rs::Encoding;
use tracing::{debug, Level};

use html5_tagrewriter::env::{generate_env_docs, EnvConfig, ProcessingMode};
use html5_tagrewriter::{RuleSet, TagRewriter};

const ANSI_COLOR_RED: &str = "\x1b[31m";
const ANSI_COLOR_RESET: &str = "\x1b[0m";

#[derive(Parser, Debug)]
#[command(
    name = "html5-tagrewriter",
    version,
    about = "Rewrite tags in HTML5 documents while keeping ESI markup intact"
)]
struct Cli {
    /// Input file, "-" reads from stdin
    #[arg(default_value = "-")]
    input: String,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Treat input as a fragment placed right after <body>
    #[arg(short, long)]
    fragment: bool,

    /// TOML file with rewrite rules
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Character encoding of the input (defaults to UTF-8)
    #[arg(short, long)]
    encoding: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print supported environment variables and exit
    #[arg(long)]
    env_docs: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.env_docs {
        print!("{}", generate_env_docs());
        return;
    }

    let env_config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            print_error_message(&e.to_string(), false);
            process::exit(1);
        }
    };

    init_logging(&cli, &env_config);

    if let Err(e) = run(&cli, &env_config) {
        print_error_message(&e.to_string(), env_config.no_color);
        process::exit(1);
    }
}

fn init_logging(cli: &Cli, env_config: &EnvConfig) {
    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::from_str(&env_config.log_level).unwrap_or(Level::WARN),
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_ansi(!env_config.no_color)
        .init();
}

fn run(cli: &Cli, env_config: &EnvConfig) -> Result<(), Box<dyn Error>> {
    let input_data = read_input(&cli.input)?;
    let input = decode_input(&input_data, cli.encoding.as_deref())?;

    let mut rewriter = TagRewriter::new();
    if let Some(rules_path) = &cli.rules {
        RuleSet::load(rules_path)?.register_into(&mut rewriter);
    }

    let mode = if cli.fragment {
        ProcessingMode::Fragment
    } else {
        env_config.mode
    };
    debug!(%mode, handlers = rewriter.handler_count(), "rewriting input");

    let result = match mode {
        ProcessingMode::Document => rewriter.process(&input)?,
        ProcessingMode::Fragment => rewriter.process_body_fragment(&input)?,
    };

    match &cli.output {
        Some(path) => fs::write(path, result.as_bytes())?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(result.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

fn read_input(target: &str) -> Result<Vec<u8>, Box<dyn Error>> {
    if target == "-" {
        let mut data = Vec::new();
        io::stdin().lock().read_to_end(&mut data)?;
        return Ok(data);
    }

    Ok(fs::read(target).map_err(|e| format!("Failed to read {target}: {e}"))?)
}

fn decode_input(data: &[u8], encoding_label: Option<&str>) -> Result<String, Box<dyn Error>> {
    match encoding_label {
        Some(label) => {
            let encoding = Encoding::for_label(label.as_bytes())
                .ok_or_else(|| format!("Unknown encoding: {label}"))?;
            let (text, _, _) = encoding.decode(data);
            Ok(text.into_owned())
        }
        None => Ok(String::from_utf8_lossy(data).into_owned()),
    }
}

fn print_error_message(msg: &str, no_color: bool) {
    if no_color {
        eprintln!("{msg}");
    } else {
        eprintln!("{ANSI_COLOR_RED}{msg}{ANSI_COLOR_RESET}");
    }
}
