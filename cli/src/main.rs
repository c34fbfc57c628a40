mod config;
mod error;
mod logging;
mod report;
mod test_runner;
mod toolchain;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use tracing::{debug, warn};

use codegen::{Translation, translate};
use xf::ModSet;

use crate::config::Config;
use crate::error::CliError;
use crate::report::Reporter;

const SUBCOMMANDS: &[&str] = &["translate", "build", "check", "test", "help"];

/// Global options that take a value, so their argument is not mistaken for a file.
const VALUE_OPTIONS: &[&str] = &["--config"];

#[derive(Parser)]
#[command(name = "xfc", version, about = "xf to C translator")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log translation progress at debug level
    #[arg(long, global = true)]
    debug: bool,

    /// Config file (defaults to ./xfc.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Translate an xf program to C
    Translate(TranslateArgs),

    /// Translate and compile with the configured C compiler
    Build(BuildArgs),

    /// Translate without writing output and report diagnostics
    Check(SourceArgs),

    /// Run .test.xf test files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct SourceArgs {
    /// xf source file
    file: PathBuf,

    /// Directory of .xfmod rule files (overrides the config)
    #[arg(long)]
    mods_dir: Option<PathBuf>,

    /// Reserved entry-point name. Repeatable; replaces the configured list.
    #[arg(long = "entry-name")]
    entry_names: Vec<String>,
}

#[derive(clap::Args)]
struct TranslateArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output C file (stdout when absent)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Dump the scanned program instead of emitting C
    #[arg(long)]
    ast: bool,

    /// List every function with its mangled name
    #[arg(long)]
    list_functions: bool,
}

#[derive(clap::Args)]
struct BuildArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Executable to produce (defaults to the input path without extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep the generated C at this path
    #[arg(long)]
    emit_c: Option<PathBuf>,

    /// Keep the intermediate C file
    #[arg(long)]
    keep_temp: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.xf file or directory containing them
    path: PathBuf,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let args = inject_default_subcommand(std::env::args().collect());
    let cli = Cli::parse_from(&args);
    logging::init(cli.debug, !cli.no_color);

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            1
        }
    };
    process::exit(code);
}

/// `xfc file.xf` means `xfc translate file.xf`.
fn inject_default_subcommand(mut args: Vec<String>) -> Vec<String> {
    let mut i = 1;
    while i < args.len() {
        let arg = &args[i];
        if VALUE_OPTIONS.contains(&arg.as_str()) {
            i += 2;
            continue;
        }
        if arg.starts_with('-') {
            i += 1;
            continue;
        }
        if !SUBCOMMANDS.contains(&arg.as_str()) {
            args.insert(i, "translate".to_string());
        }
        break;
    }
    args
}

fn run(cli: Cli) -> Result<i32, CliError> {
    if let Command::Test(args) = &cli.command {
        if args.list_categories {
            test_runner::list_categories(&args.path);
            return Ok(0);
        }
        return Ok(test_runner::run_tests(&args.path, cli.no_color, &args.category));
    }

    let config = Config::load(cli.config.as_deref())?;
    let reporter = Reporter::new(cli.no_color, config.context_lines);

    match cli.command {
        Command::Translate(args) => do_translate(args, &config, &reporter),
        Command::Build(args) => do_build(args, &config, &reporter),
        Command::Check(args) => do_check(args, &config, &reporter),
        Command::Test(_) => Ok(0),
    }
}

/// A loaded source file registered with the diagnostic renderer.
struct Session {
    files: SimpleFiles<String, String>,
    file_id: usize,
    source: String,
    mods: ModSet,
}

impl Session {
    fn open(args: &SourceArgs, config: &Config) -> Result<Session, CliError> {
        let source = read_source(&args.file, config.max_source_bytes)?;
        let mut files = SimpleFiles::new();
        let file_id = files.add(args.file.display().to_string(), source.clone());

        let mods_dir = args.mods_dir.as_deref().unwrap_or(&config.mods_dir);
        let mods = ModSet::load_dir(mods_dir);
        debug!("{} mod rule(s) from '{}'", mods.len(), mods_dir.display());

        Ok(Session {
            files,
            file_id,
            source,
            mods,
        })
    }

    fn translate(&self, args: &SourceArgs, config: &Config) -> Translation {
        translate(
            &self.source,
            self.file_id,
            self.mods.clone(),
            config.parser_options(&args.entry_names),
        )
    }

    fn parser(&self, args: &SourceArgs, config: &Config) -> xf::Parser {
        xf::Parser::new(self.source.clone(), self.file_id)
            .with_mods(self.mods.clone())
            .with_options(config.parser_options(&args.entry_names))
    }
}

fn read_source(path: &Path, limit: usize) -> Result<String, CliError> {
    let size = std::fs::metadata(path)
        .map_err(|e| CliError::io(path, e))?
        .len();
    if size > limit as u64 {
        return Err(CliError::SourceTooLarge {
            path: path.to_path_buf(),
            size,
            limit,
        });
    }
    let bytes = std::fs::read(path).map_err(|e| CliError::io(path, e))?;
    decode_source(path, bytes)
}

/// Print literals are copied byte for byte, so a non-UTF-8 source is rejected rather than repaired.
fn decode_source(path: &Path, bytes: Vec<u8>) -> Result<String, CliError> {
    String::from_utf8(bytes).map_err(|e| {
        let offset = e.utf8_error().valid_up_to();
        let line = e.as_bytes()[..offset].iter().filter(|&&b| b == b'\n').count() + 1;
        CliError::InvalidUtf8 {
            path: path.to_path_buf(),
            line,
            offset,
        }
    })
}

fn do_translate(args: TranslateArgs, config: &Config, reporter: &Reporter) -> Result<i32, CliError> {
    let session = Session::open(&args.source, config)?;

    if args.ast || args.list_functions {
        let (program, failure) = match session.parser(&args.source, config).parse() {
            Ok(program) => (Some(program), None),
            Err(failure) => (failure.partial.clone(), Some(failure)),
        };
        if let Some(program) = &program {
            if args.ast {
                println!("{:#?}", program);
            } else {
                for function in program.functions() {
                    let marker = if function.is_entry { "  (entry)" } else { "" };
                    println!("{}@{} -> {}{}", function.block, function.name, function.mangled, marker);
                }
            }
        }
        return Ok(match failure {
            Some(failure) => {
                reporter.diagnostics(&session.files, &failure.errors, failure.dropped);
                1
            }
            None => 0,
        });
    }

    let translation = session.translate(&args.source, config);
    reporter.diagnostics(&session.files, &translation.diagnostics, translation.dropped);

    if let Some(c) = &translation.output {
        if translation.is_success() || config.keep_partial_output {
            match &args.output {
                Some(path) => std::fs::write(path, c).map_err(|e| CliError::io(path, e))?,
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout
                        .write_all(c.as_bytes())
                        .and_then(|()| stdout.flush())
                        .map_err(|e| CliError::io("<stdout>", e))?;
                }
            }
        }
    }

    Ok(if translation.is_success() { 0 } else { 1 })
}

fn do_check(args: SourceArgs, config: &Config, reporter: &Reporter) -> Result<i32, CliError> {
    let session = Session::open(&args, config)?;
    let translation = session.translate(&args, config);
    reporter.diagnostics(&session.files, &translation.diagnostics, translation.dropped);

    if translation.is_success() {
        eprintln!(
            "ok: {} translated successfully (entry {})",
            args.file.display(),
            translation.entry.as_deref().unwrap_or("?")
        );
        Ok(0)
    } else {
        Ok(1)
    }
}

fn do_build(args: BuildArgs, config: &Config, reporter: &Reporter) -> Result<i32, CliError> {
    let session = Session::open(&args.source, config)?;
    let translation = session.translate(&args.source, config);
    reporter.diagnostics(&session.files, &translation.diagnostics, translation.dropped);

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.source.file.with_extension(""));
    let c_path = args
        .emit_c
        .clone()
        .unwrap_or_else(|| output.with_extension("c"));

    let Some(c) = &translation.output else {
        return Ok(1);
    };
    if !translation.is_success() {
        if config.keep_partial_output {
            std::fs::write(&c_path, c).map_err(|e| CliError::io(&c_path, e))?;
            eprintln!("note: partial C kept at {}", c_path.display());
        }
        return Ok(1);
    }

    std::fs::write(&c_path, c).map_err(|e| CliError::io(&c_path, e))?;
    if let Err(e) = toolchain::compile(&config.cc, &config.cc_args, &c_path, &output) {
        eprintln!("note: generated C kept at {}", c_path.display());
        return Err(e);
    }

    if !args.keep_temp && args.emit_c.is_none() {
        if let Err(e) = std::fs::remove_file(&c_path) {
            warn!("cannot remove '{}': {}", c_path.display(), e);
        }
    }
    eprintln!("ok: built {}", output.display());
    Ok(0)
}
