//! ingen-drv - Driver for the ingen code generator.
//!
//! One invocation runs the whole pipeline:
//!
//! 1. Parse the command line (`ingen <input.ins> -O <outputdir>`).
//! 2. Parse the root inspect file (and its imports) into the global
//!    data dictionary.
//! 3. Derive the two output names by replacing the input extension with
//!    `.gen.h` / `.gen.cpp` under the output directory, and insert them
//!    into the global scope as `HeaderFile` / `SourceFile`.
//! 4. Evaluate the header template and the source template, writing one
//!    output file each.
//!
//! Each successfully generated file prints its path on standard output;
//! a failed file prints the error followed by `<path> -- FAILED`. Exit
//! code 0 only when everything succeeded.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;
use ingen_data::{DataStore, DictId, Item};
use thiserror::Error;

/// Template evaluated into the `.gen.h` output.
pub const HEADER_TEMPLATE_PATH: &str = "codegen/templates/data.header";
/// Template evaluated into the `.gen.cpp` output.
pub const SOURCE_TEMPLATE_PATH: &str = "codegen/templates/data.source";

const DEBUG_INPUT: &str = "codegen/debug_files/debug.ins";
const DEBUG_TEMPLATE: &str = "codegen/debug_files/debug.template";
const DEBUG_OUTPUT_DIR: &str = "codegen/debug_files";

/// Usage line printed for `-?` and after command-line errors.
pub const USAGE: &str = "Usage: ingen inputfile -O outputdir";

/// Command-line errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("Invalid command line: No input file specified.")]
    NoInput,

    #[error("Invalid command line: Multiple uses of \"{0}\"")]
    DuplicateSwitch(String),

    #[error("Invalid command line: Expected file name after \"{0}\"")]
    MissingSwitchArgument(String),

    #[error("Invalid command line: \"{0}\" is not a directory.")]
    NotADirectory(String),

    #[error("Invalid command line: Unknown switch \"{0}\"")]
    UnknownSwitch(String),

    #[error("Invalid command line: Input file specified multiple times (\"{0}\" and \"{1}\").")]
    DuplicateInput(String, String),

    #[error(
        "Invalid command line: No input file or output directory can be specified when using the \"/D\" switch."
    )]
    DebugConflicts,

    #[error("Invalid command line: Input file required.")]
    InputRequired,

    #[error("Invalid command line: Output directory required.")]
    OutputRequired,
}

/// Parsed command line.
#[derive(Debug, Default, PartialEq)]
pub struct Config {
    /// Root inspect file.
    pub input: Option<PathBuf>,
    /// Output directory (`-O`); must already exist.
    pub output_dir: Option<PathBuf>,
    /// `-?`: print usage and do nothing else.
    pub show_usage: bool,
    /// `-D`: run against the built-in debug paths.
    pub debug_files: bool,
}

impl Config {
    /// Parses arguments (without the program name). Switches accept
    /// both `-` and `/` prefixes.
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Result<Config, UsageError> {
        let args: Vec<String> = args.into_iter().collect();
        if args.is_empty() {
            return Err(UsageError::NoInput);
        }

        let mut config = Config::default();
        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "-O" | "/O" => {
                    if config.output_dir.is_some() {
                        return Err(UsageError::DuplicateSwitch(arg.clone()));
                    }
                    let Some(dir) = args.get(i + 1) else {
                        return Err(UsageError::MissingSwitchArgument(arg.clone()));
                    };
                    if !Path::new(dir).is_dir() {
                        return Err(UsageError::NotADirectory(dir.clone()));
                    }
                    config.output_dir = Some(PathBuf::from(dir));
                    i += 1;
                }
                "-?" | "/?" => config.show_usage = true,
                "-D" | "/D" => config.debug_files = true,
                _ if arg.starts_with('-') || arg.starts_with('/') => {
                    return Err(UsageError::UnknownSwitch(arg.clone()));
                }
                _ => {
                    if let Some(existing) = &config.input {
                        return Err(UsageError::DuplicateInput(
                            existing.display().to_string(),
                            arg.clone(),
                        ));
                    }
                    config.input = Some(PathBuf::from(arg));
                }
            }
            i += 1;
        }

        if config.show_usage {
            return Ok(config);
        }
        if config.debug_files {
            if config.input.is_some() || config.output_dir.is_some() {
                return Err(UsageError::DebugConflicts);
            }
            return Ok(config);
        }
        if config.input.is_none() {
            return Err(UsageError::InputRequired);
        }
        if config.output_dir.is_none() {
            return Err(UsageError::OutputRequired);
        }
        Ok(config)
    }
}

/// Runs one generator invocation. Returns the process exit code.
pub fn run(config: &Config) -> i32 {
    if config.show_usage {
        println!("{USAGE}");
        return 0;
    }

    let mut store = DataStore::new();
    let global = store.new_dict(None);

    if config.debug_files {
        let input = Path::new(DEBUG_INPUT);
        if let Err(error) = ingen_par::parse_file(&mut store, global, input) {
            println!("{error}");
            return 1;
        }

        let output = output_path(input, Path::new(DEBUG_OUTPUT_DIR), ".gen.cpp");
        store.insert(global, "HeaderFile", Item::str("no_header.h"));
        store.insert(global, "SourceFile", Item::str(file_name(&output)));

        if !generate_file(&mut store, global, Path::new(DEBUG_TEMPLATE), &output) {
            return 1;
        }
        return 0;
    }

    let (Some(input), Some(output_dir)) = (&config.input, &config.output_dir) else {
        // from_args guarantees both are present outside debug mode.
        return 1;
    };

    if let Err(error) = ingen_par::parse_file(&mut store, global, input) {
        println!("{error}");
        return 1;
    }

    let header = output_path(input, output_dir, ".gen.h");
    let source = output_path(input, output_dir, ".gen.cpp");
    store.insert(global, "HeaderFile", Item::str(file_name(&header)));
    store.insert(global, "SourceFile", Item::str(file_name(&source)));

    if !generate_file(&mut store, global, Path::new(HEADER_TEMPLATE_PATH), &header) {
        return 1;
    }
    if !generate_file(&mut store, global, Path::new(SOURCE_TEMPLATE_PATH), &source) {
        return 1;
    }
    0
}

/// Evaluates one template into one output file, printing the path on
/// success or the error plus a `-- FAILED` line.
pub fn generate_file(
    store: &mut DataStore,
    global: DictId,
    template: &Path,
    output: &Path,
) -> bool {
    match generate(store, global, template, output) {
        Ok(()) => {
            println!("{}", output.display());
            true
        }
        Err(error) => {
            println!("{error:#}");
            println!("{} -- FAILED", output.display());
            false
        }
    }
}

fn generate(
    store: &mut DataStore,
    global: DictId,
    template: &Path,
    output: &Path,
) -> anyhow::Result<()> {
    let source = fs::read_to_string(template)
        .with_context(|| format!("Unable to open template \"{}\"", template.display()))?;
    let file = fs::File::create(output)
        .with_context(|| format!("Unable to create output file \"{}\"", output.display()))?;
    let mut writer = BufWriter::new(file);

    let template_name = template.display().to_string();
    ingen_eval::evaluate_template(&source, &template_name, store, global, &mut writer)?;
    Ok(())
}

/// `dir/<input stem><suffix>`: the input's last extension replaced.
fn output_path(input: &Path, dir: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(format!("{stem}{suffix}"))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
