use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use nailang::parser::get_all_raw_blocks;
use nailang::runtime::{Arg, HostError, NailangHost};
use nailang::{Engine, EngineOptions, Error, ExecutionOptions, render_error};

/// Nailang - run Nailang scripts
#[derive(Parser, Debug)]
#[command(name = "nailang")]
#[command(about = "Run Nailang scripts", long_about = None)]
struct Args {
    /// Evaluate a single expression instead of a script
    #[arg(short = 'e', long = "expr", conflicts_with = "script")]
    expression: Option<String>,

    /// Define a root variable from an expression, e.g. `-D limit=10`
    #[arg(short = 'D', value_name = "NAME=EXPR")]
    define: Vec<String>,

    /// List the raw blocks of the script instead of running it
    #[arg(long)]
    raw: bool,

    /// Print the root variables after the script ran
    #[arg(long)]
    dump: bool,

    /// Abort loops after this many iterations
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Script to run (if not provided, reads from stdin)
    script: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
enum CliError {
    #[error("invalid definition [{0}], expect NAME=EXPR")]
    #[diagnostic(code(nailang::define))]
    BadDefine(String),
    #[error("no script given and stdin is a terminal")]
    #[diagnostic(help("pass a script path, `-e <expr>`, or pipe a script into stdin"))]
    NoInput,
    #[error("{0}")]
    #[diagnostic(code(nailang::failed))]
    Failed(String),
}

/// Functions the command line offers to scripts.
struct CliHost;

impl<'a> NailangHost<'a> for CliHost {
    fn call_function(&mut self, name: &str, args: &[Arg<'a>]) -> Result<Option<Arg<'a>>, HostError> {
        match name {
            "Print" => {
                let line = args.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
                println!("{line}");
                Ok(Some(Arg::Empty))
            }
            _ => Ok(None),
        }
    }
}

/// Renders `err` against `source` and turns it into the process error.
fn report(err: Error, file_name: &str, source: &str) -> CliError {
    render_error(&err, file_name, source);
    CliError::Failed(err.to_string())
}

fn apply_defines(engine: &mut Engine<'_>, defines: &[String]) -> Result<(), CliError> {
    for define in defines {
        let Some((name, expr)) = define.split_once('=') else {
            return Err(CliError::BadDefine(define.clone()));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(CliError::BadDefine(define.clone()));
        }
        let value = engine.evaluate(expr).map_err(|err| report(err, "<define>", expr))?;
        tracing::debug!(name, %value, "root definition");
        engine.set_root(name, value);
    }
    Ok(())
}

fn read_script(args: &Args) -> Result<(String, String)> {
    if let Some(path) = &args.script {
        let source = std::fs::read_to_string(path).into_diagnostic()?;
        return Ok((path.display().to_string(), source));
    }
    if atty::is(atty::Stream::Stdin) {
        return Err(CliError::NoInput.into());
    }
    let mut source = String::new();
    std::io::stdin().read_to_string(&mut source).into_diagnostic()?;
    Ok(("<stdin>".to_string(), source))
}

fn list_raw_blocks(options: &EngineOptions, file_name: &str, source: &str) -> Result<(), CliError> {
    let pool = options.new_pool();
    let text = pool.alloc_str(source);
    let blocks = get_all_raw_blocks(&pool, text, file_name).map_err(|err| report(err.into(), file_name, source))?;
    for block in blocks {
        let metas: Vec<_> = block.metas.iter().map(|meta| format!("@{}", meta.name)).collect();
        println!(
            "{}:{} #Raw.{}(\"{}\") {}",
            file_name,
            block.raw.position,
            block.raw.block_type,
            block.raw.name,
            metas.join(" ")
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging subscriber
    use tracing_subscriber::{EnvFilter, fmt};

    // Use RUST_LOG to control the log level, WARN when not set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let options = EngineOptions {
        default_execution_options: ExecutionOptions {
            max_iterations: args.max_iterations,
            ..Default::default()
        },
        ..Default::default()
    };
    let pool = options.new_pool();
    let mut engine = Engine::new(&pool, options.clone(), |_| {}).with_host(CliHost);
    apply_defines(&mut engine, &args.define)?;

    if let Some(expr) = &args.expression {
        let value = engine.evaluate(expr).map_err(|err| report(err, "<expr>", expr))?;
        println!("{value}");
        return Ok(());
    }

    let (file_name, source) = read_script(&args)?;
    if args.raw {
        return Ok(list_raw_blocks(&options, &file_name, &source)?);
    }

    let value = engine
        .run_source(&source, &file_name)
        .map_err(|err| report(err, &file_name, &source))?;
    if !value.is_empty() {
        println!("{value}");
    }

    if args.dump {
        for (name, value) in engine.root_vars() {
            println!("{name} = {value}");
        }
    }
    Ok(())
}
