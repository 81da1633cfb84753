use clap::Parser;
use std::path::PathBuf;

/// Command-line options, modeled on `unzip`.
///
/// Without `-l`/`-v` every matching file is extracted under `-d` (default `.`).
#[derive(Parser, Debug)]
#[command(name = "runasar")]
#[command(version)]
#[command(about = "A Rust extractor for Electron ASAR archives", long_about = None)]
#[command(after_help = "Examples:\n  \
  runasar app.asar -d app              extract everything into ./app\n  \
  runasar app.asar -x node_modules     extract all files except node_modules\n  \
  runasar -p app.asar package.json     print package.json to stdout\n  \
  runasar -v app.asar                  list files with sizes and offsets")]
pub struct Cli {
    /// ASAR archive path
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Files to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely with sizes and offsets
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<PathBuf>,

    /// Exclude files that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Extraction root, defaulting to the current directory
    pub fn output_root(&self) -> PathBuf {
        self.extract_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// True when every file goes to its archive path with no per-file
    /// decisions, so the whole tree can be extracted in one pass.
    pub fn extracts_everything(&self) -> bool {
        self.files.is_empty()
            && self.exclude.is_empty()
            && !self.junk_paths
            && !self.pipe
            && self.overwrite
            && !self.never_overwrite
    }
}
