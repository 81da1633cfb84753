//! Main entry point for the runasar CLI application.
//!
//! This binary provides an unzip-style command-line interface for listing
//! and extracting Electron ASAR archives.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use runasar::{AsarArchive, AsarExtractor, Cli, FileEntry};

/// Application entry point.
///
/// Parses command-line arguments, loads the archive and dispatches to
/// listing or extraction.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let archive = AsarArchive::open(&cli.file)
        .await
        .with_context(|| format!("failed to open {}", cli.file.display()))?;

    process_archive(&archive, &cli).await
}

/// Install the stderr log subscriber, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Process an archive based on CLI options.
///
/// - List mode (`-l` or `-v`): Display archive contents
/// - Bulk mode (`-o` with no filters): Extract the whole tree in one pass
/// - Extract mode: Extract files matching the specified filters
async fn process_archive(archive: &AsarArchive, cli: &Cli) -> Result<()> {
    let extractor = AsarExtractor::new(archive);

    if cli.list || cli.verbose {
        list_files(&extractor, cli.verbose);
        return Ok(());
    }

    if cli.extracts_everything() {
        let root = cli.output_root();
        let written = extractor
            .extract_all(&root)
            .await
            .with_context(|| format!("failed to extract into {}", root.display()))?;
        if !cli.is_very_quiet() {
            println!("  extracted {} files into {}", written, root.display());
        }
        return Ok(());
    }

    let files_to_extract: Vec<_> = extractor
        .list_files()
        .filter(|e| is_selected(e.relative_path(), cli))
        .collect();

    let multiple_files = cli.pipe && files_to_extract.len() > 1;
    for entry in files_to_extract {
        extract_file(&extractor, entry, cli, multiple_files).await?;
    }

    Ok(())
}

/// Decide whether an entry passes the positional filters and `-x` exclusions.
///
/// Filters match the full logical path (with or without the leading `/`),
/// the file name, or a `*`/`?` glob against the path.
///
/// # Arguments
///
/// * `path` - The entry's logical path without the leading `/`
/// * `cli` - Parsed command-line arguments
///
/// # Returns
///
/// Returns `true` if the entry should be extracted.
fn is_selected(path: &str, cli: &Cli) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);

    if !cli.files.is_empty() {
        let matches = cli.files.iter().any(|f| {
            let f = f.trim_start_matches('/');
            if has_glob_chars(f) {
                glob_match(f, path)
            } else {
                path == f || name == f
            }
        });
        if !matches {
            return false;
        }
    }

    !cli
        .exclude
        .iter()
        .any(|x| path.contains(x.as_str()) || glob_match(x, path))
}

/// List files in the archive.
///
/// - Simple format (`-l`): Just paths, one per line
/// - Verbose format (`-v`): Size, absolute offset and executable flag
fn list_files(extractor: &AsarExtractor<'_>, verbose: bool) {
    if verbose {
        println!("{:>10}  {:>10}  {:>4}  Name", "Length", "Offset", "Exec");
        println!("{}", "-".repeat(50));
    }

    let mut total_size = 0u64;
    let mut file_count = 0usize;

    for entry in extractor.list_files() {
        if verbose {
            println!(
                "{:>10}  {:>10}  {:>4}  {}",
                entry.size,
                entry.offset,
                if entry.executable { "x" } else { "" },
                entry.path
            );
            total_size += entry.size;
            file_count += 1;
        } else {
            println!("{}", entry.path);
        }
    }

    if verbose {
        println!("{}", "-".repeat(50));
        println!(
            "{:>10}  {:>10}  {:>4}  {} files ({})",
            total_size,
            "",
            "",
            file_count,
            format_size(total_size)
        );
    }
}

/// Extract a single file from the archive.
///
/// - Pipe mode (`-p`): Write to stdout instead of file
/// - Custom output directory (`-d`): Extract under the specified directory
/// - Junk paths (`-j`): Ignore directory structure in archive
/// - Overwrite control (`-n`, `-o`): Handle existing files
async fn extract_file(
    extractor: &AsarExtractor<'_>,
    entry: &FileEntry,
    cli: &Cli,
    show_filename: bool,
) -> Result<()> {
    if cli.pipe {
        if show_filename {
            use tokio::io::AsyncWriteExt;
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(format!("--- {} ---\n", entry.path).as_bytes())
                .await?;
        }
        extractor.extract_to_stdout(entry).await?;
        return Ok(());
    }

    let output_path = output_path(entry, cli)?;

    if output_path.exists() {
        if cli.never_overwrite {
            if !cli.is_very_quiet() {
                eprintln!("Skipping: {} (file exists)", entry.path);
            }
            return Ok(());
        }

        if !cli.overwrite {
            if !cli.is_very_quiet() {
                eprintln!("Skipping: {} (use -o to overwrite)", entry.path);
            }
            return Ok(());
        }
    }

    if !cli.is_quiet() {
        println!("  extracting: {}", entry.path);
    }

    extractor
        .extract_one(&entry.path, &output_path)
        .await
        .with_context(|| format!("failed to extract {}", entry.path))?;

    Ok(())
}

/// Where an entry lands on disk under the CLI's output root.
///
/// With `-j` only the file name is kept; otherwise the archive layout is
/// recreated, refusing paths that would escape the root.
fn output_path(entry: &FileEntry, cli: &Cli) -> Result<PathBuf> {
    let root = cli.output_root();
    if cli.junk_paths {
        Ok(root.join(entry.name()))
    } else {
        Ok(runasar::asar::extractor::target_path(&root, entry)?)
    }
}

/// Check if a pattern contains glob wildcard characters.
///
/// # Arguments
///
/// * `pattern` - The pattern to check
///
/// # Returns
///
/// Returns `true` if the pattern contains `*` or `?` wildcards.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob pattern matching supporting `*` and `?` wildcards.
///
/// - `*` matches zero or more characters, including `/`
/// - `?` matches exactly one character
///
/// # Arguments
///
/// * `pattern` - The glob pattern to match against
/// * `text` - The logical path to check
///
/// # Returns
///
/// Returns `true` if the whole path matches the pattern.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            // Skip the star, or let it swallow one more character
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}

/// Format a byte size for the verbose listing summary.
///
/// # Arguments
///
/// * `size` - Total size in bytes
///
/// # Returns
///
/// The size with the largest unit (bytes, KB, MB, GB) that keeps it above one.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
