//! One minimization run: load, find, prune, write, correct.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use nova_resolve::{Resolver, SourceUniverse};
use nova_syntax::Parse;
use walkdir::WalkDir;

use crate::config::MinimizeConfig;
use crate::error::MinimizeError;
use crate::finder::TargetMethodFinder;
use crate::pruner::{prune_unit, PrunedFile};
use crate::report::{FileOutcome, MinimizeReport};
use crate::stubs::{NoStubs, SourceFile, StubRequest, StubSynthesizer};
use crate::target::TargetSignature;
use crate::type_correct::{TypeChecker, TypeCorrections};

/// Minimizes without synthesizing stand-ins for external code.
pub fn minimize(config: &MinimizeConfig) -> Result<MinimizeReport, MinimizeError> {
    minimize_with(config, &mut NoStubs)
}

pub fn minimize_with(
    config: &MinimizeConfig,
    stubs: &mut dyn StubSynthesizer,
) -> Result<MinimizeReport, MinimizeError> {
    let targets = parse_targets(&config.targets)?;
    let mut files = load_sources(&config.root, Some(&config.output))?;
    tracing::info!(
        target: "nova.minimize",
        root = %config.root.display(),
        files = files.len(),
        targets = targets.len(),
        "starting minimization"
    );

    let mut stub_rounds = 0;
    let (mut report, pruned) = loop {
        let parses: Vec<Parse> = files.iter().map(|file| nova_syntax::parse(&file.text)).collect();
        let parse_errors = log_parse_errors(&files, &parses);
        let universe = SourceUniverse::new(parses.iter().map(Parse::compilation_unit));
        let resolver = Resolver::new(&universe);
        let output = TargetMethodFinder::new(&resolver, &targets).run();
        let missing_classes = output.used.missing_classes(&universe);

        if stub_rounds < config.max_stub_rounds {
            let request = StubRequest {
                used: &output.used,
                unresolved: &output.unresolved,
                missing_classes: &missing_classes,
            };
            let added = stubs.synthesize(&request);
            if !added.is_empty() {
                stub_rounds += 1;
                tracing::debug!(
                    target: "nova.minimize",
                    round = stub_rounds,
                    added = added.len(),
                    "stub synthesizer added files"
                );
                merge_files(&mut files, added);
                continue;
            }
        }

        if !output.unfound.is_empty() {
            return Err(MinimizeError::UnfoundTargets(output.unfound));
        }

        let mut pruned = Vec::with_capacity(files.len());
        for (idx, file) in files.iter().enumerate() {
            pruned.push((file.path.clone(), prune_unit(&resolver, idx, &file.text, &output.used)?));
        }
        let mut report = MinimizeReport::from_finder(&output, missing_classes);
        report.parse_errors = parse_errors;
        break (report, pruned);
    };
    report.stub_rounds = stub_rounds;

    let keep: HashSet<&Path> = pruned
        .iter()
        .filter(|(_, file)| file.has_types)
        .map(|(path, _)| path.as_path())
        .collect();
    remove_stale_sources(&config.output, &config.root, &keep)?;
    let written = write_pruned(&config.output, pruned, &mut report.files)?;
    tracing::info!(
        target: "nova.minimize",
        output = %config.output.display(),
        written = written.len(),
        "wrote minimized sources"
    );

    if config.checker.enabled && !written.is_empty() {
        let corrections =
            TypeChecker::from_config(&config.checker).correct_types(&config.output, &written)?;
        if !corrections.is_empty() {
            for file in stubs.apply_type_corrections(&corrections) {
                write_source(&config.output, &file)?;
            }
        }
        report.type_corrections = corrections;
    }
    Ok(report)
}

/// Runs the checker over every `.java` file under `root`.
pub fn correct_types_in(
    root: &Path,
    checker: &TypeChecker,
) -> Result<TypeCorrections, MinimizeError> {
    let files: Vec<PathBuf> = load_sources(root, None)?
        .into_iter()
        .map(|file| file.path)
        .collect();
    Ok(checker.correct_types(root, &files)?)
}

pub fn parse_targets(targets: &[String]) -> Result<Vec<TargetSignature>, MinimizeError> {
    if targets.is_empty() {
        return Err(MinimizeError::InvalidTarget {
            target: String::new(),
            reason: "no target methods given".to_string(),
        });
    }
    targets.iter().map(|t| TargetSignature::parse(t)).collect()
}

/// Every `.java` file under `root`, in a stable order, with paths relative to
/// `root`. `skip` (typically the output directory) is not descended into.
pub fn load_sources(root: &Path, skip: Option<&Path>) -> Result<Vec<SourceFile>, MinimizeError> {
    let skip = skip.and_then(|path| std::path::absolute(path).ok());
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            skip.is_none() || std::path::absolute(entry.path()).ok() != skip
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|err| {
            let path = err
                .path()
                .map_or_else(|| root.to_path_buf(), Path::to_path_buf);
            MinimizeError::io(path, err.into())
        })?;
        if !entry.file_type().is_file() || entry.path().extension() != Some(OsStr::new("java")) {
            continue;
        }
        let text = fs::read_to_string(entry.path())
            .map_err(|err| MinimizeError::io(entry.path(), err))?;
        let path = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();
        files.push(SourceFile { path, text });
    }
    Ok(files)
}

fn log_parse_errors(files: &[SourceFile], parses: &[Parse]) -> usize {
    let mut total = 0;
    for (file, parse) in files.iter().zip(parses) {
        let errors = parse.errors();
        if let Some(first) = errors.first() {
            tracing::warn!(
                target: "nova.minimize",
                path = %file.path.display(),
                errors = errors.len(),
                first = %first.message,
                "source has syntax errors; continuing with a partial tree"
            );
        }
        total += errors.len();
    }
    total
}

fn merge_files(files: &mut Vec<SourceFile>, added: Vec<SourceFile>) {
    for file in added {
        match files.iter_mut().find(|existing| existing.path == file.path) {
            Some(existing) => existing.text = file.text,
            None => files.push(file),
        }
    }
}

/// Deletes the `.java` files an earlier run left under `output` that this
/// run does not write, so the checker never sees them on its source path.
/// Nothing is deleted when `output` is `root` or encloses it.
fn remove_stale_sources(
    output: &Path,
    root: &Path,
    keep: &HashSet<&Path>,
) -> Result<(), MinimizeError> {
    if !output.is_dir() {
        return Ok(());
    }
    let (Ok(abs_output), Ok(abs_root)) = (std::path::absolute(output), std::path::absolute(root))
    else {
        return Ok(());
    };
    if abs_root.starts_with(&abs_output) {
        tracing::warn!(
            target: "nova.minimize",
            output = %output.display(),
            "output directory encloses the sources; leaving earlier output in place"
        );
        return Ok(());
    }

    for entry in WalkDir::new(output) {
        let entry = entry.map_err(|err| {
            let path = err
                .path()
                .map_or_else(|| output.to_path_buf(), Path::to_path_buf);
            MinimizeError::io(path, err.into())
        })?;
        if !entry.file_type().is_file() || entry.path().extension() != Some(OsStr::new("java")) {
            continue;
        }
        let relative = entry.path().strip_prefix(output).unwrap_or(entry.path());
        if keep.contains(relative) {
            continue;
        }
        tracing::debug!(
            target: "nova.minimize",
            path = %entry.path().display(),
            "removing output of an earlier run"
        );
        fs::remove_file(entry.path()).map_err(|err| MinimizeError::io(entry.path(), err))?;
    }
    Ok(())
}

fn write_pruned(
    output: &Path,
    pruned: Vec<(PathBuf, PrunedFile)>,
    outcomes: &mut Vec<FileOutcome>,
) -> Result<Vec<PathBuf>, MinimizeError> {
    let mut written = Vec::new();
    for (path, file) in pruned {
        if file.has_types {
            write_source(output, &SourceFile::new(path.clone(), file.text))?;
            written.push(path.clone());
        } else {
            tracing::debug!(
                target: "nova.minimize",
                path = %path.display(),
                "dropping file without surviving types"
            );
        }
        outcomes.push(FileOutcome {
            path,
            kept: file.has_types,
        });
    }
    Ok(written)
}

fn write_source(output: &Path, file: &SourceFile) -> Result<(), MinimizeError> {
    let path = output.join(&file.path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| MinimizeError::io(parent, err))?;
    }
    fs::write(&path, &file.text).map_err(|err| MinimizeError::io(&path, err))
}
