//! File discovery and per-file wrapping logic

use colored::*;
use core::error::Error;
use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;
use mdwrap_lib::config::Config;
use mdwrap_lib::document::{ChangedLine, Document, TextDocument};
use mdwrap_lib::wrap::{self, WrapError, WrapOptions};
use std::fs;
use std::io::{self, Read};
use std::path::Path;

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown", "mdx", "mkd", "mkdn", "mdown", "mdwn", "qmd", "rmd", "Rmd"];

/// What to do with each file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Rewrite files in place (or print a diff with `--diff`)
    Wrap,
    /// Only report lines that would be wrapped
    Check,
}

/// Result of processing one file, printed by the caller in input order
#[derive(Debug, Default)]
pub struct FileOutcome {
    pub path: String,
    /// Zero-based indices of lines that were (or would be) wrapped
    pub changed_lines: Vec<usize>,
    /// Text to print on stdout: a diff, check findings, or wrapped stdin
    pub output: String,
}

/// Expands directory-style patterns to also match files within them.
/// Pattern "dir/path" becomes ["dir/path", "dir/path/**"].
///
/// Patterns containing glob characters (*, ?, [) are returned unchanged.
fn expand_directory_pattern(pattern: &str) -> Vec<String> {
    if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
        return vec![pattern.to_string()];
    }

    let base = pattern.trim_end_matches('/');
    vec![base.to_string(), format!("{base}/**")]
}

fn split_patterns(patterns: &str) -> Vec<String> {
    patterns
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn has_markdown_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MARKDOWN_EXTENSIONS.contains(&ext))
}

/// Path relative to `root` when it lives underneath it, for pattern matching
fn path_for_matching(path: &Path, fallback: &str, root: Option<&Path>) -> String {
    root.and_then(|root| {
        let canonical_path = path.canonicalize().ok()?;
        let canonical_root = root.canonicalize().ok()?;
        canonical_path
            .strip_prefix(&canonical_root)
            .ok()
            .map(|relative| relative.to_string_lossy().to_string())
    })
    .unwrap_or_else(|| fallback.to_string())
}

fn matching_exclude<'a>(path: &str, patterns: &'a [String]) -> Option<&'a str> {
    patterns
        .iter()
        .find(|pattern| {
            globset::Glob::new(pattern)
                .map(|glob| glob.compile_matcher().is_match(path))
                .unwrap_or(false)
        })
        .map(String::as_str)
}

pub fn find_markdown_files(
    paths: &[String],
    args: &crate::WrapArgs,
    config: &Config,
    project_root: Option<&Path>,
) -> Result<Vec<String>, Box<dyn Error>> {
    let mut file_paths = Vec::new();

    let first_path = paths.first().cloned().unwrap_or_else(|| ".".to_string());
    let mut walk_builder = WalkBuilder::new(first_path);
    for path in paths.iter().skip(1) {
        walk_builder.add(path);
    }

    // Type filtering only applies when --include is not given
    if args.include.is_none() {
        let mut types_builder = ignore::types::TypesBuilder::new();
        types_builder.add_defaults();
        for ext in MARKDOWN_EXTENSIONS {
            types_builder.add("markdown", &format!("*.{ext}"))?;
        }
        types_builder.select("markdown");
        walk_builder.types(types_builder.build()?);
    }

    let is_discovery_mode = paths.is_empty() || paths == ["."];
    let has_explicit_cli_include = args.include.is_some();

    // Include patterns: CLI > Config (only in discovery mode)
    let final_include_patterns: Vec<String> = if let Some(cli_include) = args.include.as_deref() {
        split_patterns(cli_include)
    } else if is_discovery_mode {
        config.global.include.clone()
    } else {
        Vec::new()
    };

    let final_exclude_patterns: Vec<String> = match args.exclude.as_deref() {
        Some(cli_exclude) => split_patterns(cli_exclude),
        None => config.global.exclude.clone(),
    }
    .iter()
    .flat_map(|p| expand_directory_pattern(p))
    .collect();

    log::debug!("Include patterns: {final_include_patterns:?}");
    log::debug!("Exclude patterns: {final_exclude_patterns:?}");

    if !final_include_patterns.is_empty() || !final_exclude_patterns.is_empty() {
        let pattern_base = project_root.unwrap_or(Path::new("."));
        let mut override_builder = OverrideBuilder::new(pattern_base);

        for pattern in &final_include_patterns {
            if let Err(e) = override_builder.add(pattern) {
                log::warn!("Invalid include pattern '{pattern}': {e}");
            }
        }

        for pattern in &final_exclude_patterns {
            let exclude_rule = if pattern.starts_with('!') {
                pattern.clone()
            } else {
                format!("!{pattern}")
            };
            if let Err(e) = override_builder.add(&exclude_rule) {
                log::warn!("Invalid exclude pattern '{pattern}': {e}");
            }
        }

        match override_builder.build() {
            Ok(overrides) => {
                walk_builder.overrides(overrides);
            }
            Err(e) => {
                log::warn!("Error building path overrides: {e}");
            }
        };
    }

    let use_gitignore = config.global.respect_gitignore;
    walk_builder.ignore(use_gitignore);
    walk_builder.git_ignore(use_gitignore);
    walk_builder.git_global(use_gitignore);
    walk_builder.git_exclude(use_gitignore);
    walk_builder.parents(use_gitignore);
    walk_builder.hidden(false);
    walk_builder.require_git(false);

    // Explicit files are taken as given, unless an exclude pattern matches them
    if !is_discovery_mode {
        let mut processed_explicit_files = false;

        for path_str in paths {
            let path = Path::new(path_str);
            if !path.exists() {
                return Err(format!("File not found: {path_str}").into());
            }
            if !path.is_file() {
                continue;
            }
            processed_explicit_files = true;
            let cleaned_path = path_str.strip_prefix("./").unwrap_or(path_str).to_string();
            let matching_path = path_for_matching(path, &cleaned_path, project_root);

            if let Some(pattern) = matching_exclude(&matching_path, &final_exclude_patterns) {
                eprintln!(
                    "{}: {cleaned_path} ignored because of exclude pattern '{pattern}'",
                    "warning".yellow().bold()
                );
            } else {
                file_paths.push(cleaned_path);
            }
        }

        if processed_explicit_files {
            file_paths.sort();
            file_paths.dedup();
            return Ok(file_paths);
        }
    }

    for result in walk_builder.build() {
        match result {
            Ok(entry) => {
                let path = entry.path();
                if path.is_file() {
                    let file_path = path.to_string_lossy().to_string();
                    let cleaned_path = file_path.strip_prefix("./").map(str::to_string).unwrap_or(file_path);
                    file_paths.push(cleaned_path);
                }
            }
            Err(err) => {
                if is_discovery_mode {
                    log::warn!("Error walking directory: {err}");
                }
            }
        }
    }

    file_paths.sort();
    file_paths.dedup();

    // Overrides are relative to the walk root; re-check excludes against the project root
    if !final_exclude_patterns.is_empty()
        && let Some(root) = project_root
    {
        file_paths.retain(|file_path| {
            let matching_path = path_for_matching(Path::new(file_path), file_path, Some(root));
            matching_exclude(&matching_path, &final_exclude_patterns).is_none()
        });
    }

    if !has_explicit_cli_include {
        file_paths.retain(|path_str| has_markdown_extension(Path::new(path_str)));
    }

    Ok(file_paths)
}

/// Render replacements as a line-oriented diff
fn format_diff(path: &str, doc: &TextDocument, changes: &[ChangedLine]) -> String {
    let mut out = format!("{}\n{}\n", format!("--- {path}").red(), format!("+++ {path}").green());
    for change in changes {
        let index = change.span.line;
        let old = doc.line(index).map_or("", |line| line.text);
        let new_lines: Vec<&str> = change.replacement.lines().collect();
        out.push_str(&format!(
            "{}\n",
            format!("@@ -{},1 +{},{} @@", index + 1, index + 1, new_lines.len()).cyan()
        ));
        out.push_str(&format!("{}\n", format!("-{old}").red()));
        for line in new_lines {
            out.push_str(&format!("{}\n", format!("+{line}").green()));
        }
    }
    out
}

fn format_findings(path: &str, doc: &TextDocument, changes: &[ChangedLine], wrap_column: usize) -> String {
    changes
        .iter()
        .map(|change| {
            let index = change.span.line;
            let width = doc.line(index).map_or(0, |line| line.width());
            format!(
                "{}:{}: line is {width} columns, exceeds wrap column {wrap_column}\n",
                path.blue().bold(),
                (index + 1).to_string().cyan(),
            )
        })
        .collect()
}

/// Wrap or check one document, filling in `outcome.output` as needed.
/// Returns the rewritten content when it changed and should be written back.
fn process_content(
    content: &str,
    display_path: &str,
    config: &Config,
    args: &crate::WrapArgs,
    mode: Mode,
    outcome: &mut FileOutcome,
) -> Result<Option<String>, WrapError> {
    let options = WrapOptions {
        respect_inline_directives: config.global.inline_directives,
    };

    // An explicit --wrap-column beats a configure-file comment
    let wrap_column = match args.wrap_column {
        Some(column) => Some(column),
        None => mdwrap_lib::effective_wrap_column(content, config, options),
    }
    .ok_or(WrapError::MissingWrapColumn)?;

    let mut doc = TextDocument::from_content(content);
    if doc.line_count() == 0 {
        return Ok(None);
    }
    let (first, last) = match args.lines {
        Some(range) => (range.first, range.last),
        None => (0, doc.line_count() - 1),
    };

    let changes = wrap::line_changes(&doc, first, last, wrap_column, options);
    outcome.changed_lines = changes.iter().map(|c| c.span.line).collect();
    if changes.is_empty() {
        return Ok(None);
    }

    match mode {
        Mode::Check => {
            outcome.output = format_findings(display_path, &doc, &changes, wrap_column);
            Ok(None)
        }
        Mode::Wrap if args.diff => {
            outcome.output = format_diff(display_path, &doc, &changes);
            Ok(None)
        }
        Mode::Wrap => {
            doc.apply_edits(&changes)?;
            Ok(Some(doc.content()))
        }
    }
}

pub fn process_file(
    file_path: &str,
    config: &Config,
    args: &crate::WrapArgs,
    mode: Mode,
) -> Result<FileOutcome, Box<dyn Error + Send + Sync>> {
    let mut outcome = FileOutcome {
        path: file_path.to_string(),
        ..Default::default()
    };

    let content = fs::read_to_string(file_path).map_err(|e| format!("Failed to read {file_path}: {e}"))?;
    if let Some(wrapped) = process_content(&content, file_path, config, args, mode, &mut outcome)? {
        fs::write(file_path, wrapped).map_err(|e| format!("Failed to write {file_path}: {e}"))?;
        log::debug!("Wrapped {} lines in {file_path}", outcome.changed_lines.len());
    }

    Ok(outcome)
}

/// Process every file, in parallel when the `parallel` feature is enabled.
/// Results come back in input order.
pub fn process_files(
    file_paths: &[String],
    config: &Config,
    args: &crate::WrapArgs,
    mode: Mode,
) -> Vec<Result<FileOutcome, Box<dyn Error + Send + Sync>>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        file_paths
            .par_iter()
            .map(|path| process_file(path, config, args, mode))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        file_paths
            .iter()
            .map(|path| process_file(path, config, args, mode))
            .collect()
    }
}

/// Read a document from stdin. In wrap mode without `--diff` the wrapped text
/// (or the original, if nothing changed) goes to `outcome.output`.
pub fn process_stdin(
    config: &Config,
    args: &crate::WrapArgs,
    mode: Mode,
) -> Result<FileOutcome, Box<dyn Error + Send + Sync>> {
    let mut content = String::new();
    io::stdin()
        .read_to_string(&mut content)
        .map_err(|e| format!("Failed to read stdin: {e}"))?;

    let mut outcome = FileOutcome {
        path: "<stdin>".to_string(),
        ..Default::default()
    };
    let wrapped = process_content(&content, "<stdin>", config, args, mode, &mut outcome)?;
    if mode == Mode::Wrap && !args.diff {
        outcome.output = wrapped.unwrap_or(content);
    }
    Ok(outcome)
}
