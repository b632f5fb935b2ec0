//! Problem archive packaging.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ConfigError, Result};
use crate::problem::Validator;

const REQUIRED_DIRS: &[&str] = &["statements", "solutions", "cases"];
const OPTIONAL_DIRS: &[&str] = &["examples", "interactive"];

/// Writes the upload archive for the problem in `problem_dir` to `out`.
///
/// Entry names are relative to `problem_dir`. A `custom` validator must have
/// exactly one `validator*` file next to `settings.json`.
pub fn package_problem(problem_dir: &Path, validator: &Validator, out: &Path) -> Result<()> {
    let mut files = Vec::new();

    let testplan = problem_dir.join("testplan");
    if testplan.is_file() {
        files.push(testplan);
    }

    if validator.is_custom() {
        files.push(custom_validator(problem_dir)?);
    }

    for dir in REQUIRED_DIRS {
        collect_files(&problem_dir.join(dir), &mut files)?;
    }
    for dir in OPTIONAL_DIRS {
        let dir = problem_dir.join(dir);
        if dir.is_dir() {
            collect_files(&dir, &mut files)?;
        }
    }

    let archive_err = |source| ConfigError::Archive {
        path: problem_dir.to_path_buf(),
        source,
    };
    let file = File::create(out).map_err(|e| ConfigError::io(out, e))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in &files {
        let name = entry_name(problem_dir, path);
        tracing::debug!(entry = %name, "Writing archive entry");
        writer.start_file(name, options).map_err(archive_err)?;
        let mut source = File::open(path).map_err(|e| ConfigError::io(path, e))?;
        io::copy(&mut source, &mut writer).map_err(|e| ConfigError::io(path, e))?;
    }
    writer.finish().map_err(archive_err)?;
    Ok(())
}

fn custom_validator(problem_dir: &Path) -> Result<PathBuf> {
    let entries = fs::read_dir(problem_dir).map_err(|e| ConfigError::io(problem_dir, e))?;
    let mut validators = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::io(problem_dir, e))?;
        if entry.file_name().to_string_lossy().starts_with("validator") {
            validators.push(entry.path());
        }
    }
    match validators.len() {
        0 => Err(ConfigError::invalid(problem_dir, "custom validator missing")),
        1 => Ok(validators.remove(0)),
        _ => Err(ConfigError::invalid(problem_dir, "more than one validator found")),
    }
}

/// Recursively collects regular files under `dir`, sorted for stable output.
/// A missing directory contributes nothing.
fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| ConfigError::io(dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<_>>()
        .map_err(|e| ConfigError::io(dir, e))?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

fn entry_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
