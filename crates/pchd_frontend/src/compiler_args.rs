//! Interpretation of a compiler argument vector by the in-process frontend.

use std::path::{Path, PathBuf};

use pchd_common::normalize_with_base;

/// Flags that take their value as the next argument and are otherwise ignored.
const SKIPPED_VALUE_FLAGS: &[&str] = &[
    "-D", "-U", "-MF", "-MT", "-MQ", "-target", "-arch", "-isysroot", "-Xlinker", "-Xpreprocessor",
    "-imacros", "-iprefix", "-iwithprefix", "-x",
];

/// The subset of a clang-style command line the include scanner acts on.
///
/// Unknown flags are ignored. Paths are kept as spelled; use
/// [`absolutize`](Self::absolutize) to resolve them against a working directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerArguments {
    /// `-iquote` directories, searched for quoted includes only.
    pub quote_dirs: Vec<PathBuf>,
    /// `-I` directories.
    pub include_dirs: Vec<PathBuf>,
    /// `-isystem` directories.
    pub system_dirs: Vec<PathBuf>,
    /// `-idirafter` directories, searched last.
    pub after_dirs: Vec<PathBuf>,
    /// `-include` files, entered before the main file. Kept as spelled: they
    /// are searched like quoted includes from the working directory.
    pub forced_includes: Vec<PathBuf>,
    /// PCHs consumed as implicit prefixes.
    pub include_pch: Vec<PathBuf>,
    /// Output path given with `-o`.
    pub output: Option<PathBuf>,
    /// `-Xclang -emit-pch` was given.
    pub emit_pch: bool,
    /// Input files, in order.
    pub inputs: Vec<PathBuf>,
}

impl CompilerArguments {
    /// Parses an argument vector (without the executable).
    pub fn parse(arguments: &[String]) -> Self {
        let mut parsed = Self::default();
        let mut iter = arguments.iter().map(String::as_str).peekable();

        while let Some(arg) = iter.next() {
            match arg {
                "-Xclang" => match iter.next() {
                    Some("-emit-pch") => parsed.emit_pch = true,
                    Some("-include-pch") => {
                        if iter.peek() == Some(&"-Xclang") {
                            iter.next();
                        }
                        if let Some(path) = iter.next() {
                            parsed.include_pch.push(PathBuf::from(path));
                        }
                    }
                    _ => {}
                },
                "-include-pch" => {
                    if let Some(path) = iter.next() {
                        parsed.include_pch.push(PathBuf::from(path));
                    }
                }
                _ if SKIPPED_VALUE_FLAGS.contains(&arg) => {
                    iter.next();
                }
                _ if arg.starts_with('-') => {
                    if let Some((flag, inline)) = split_value_flag(arg) {
                        let value = match inline {
                            Some(value) => Some(value),
                            None => iter.next(),
                        };
                        if let Some(value) = value {
                            parsed.apply(flag, value);
                        }
                    }
                }
                _ => parsed.inputs.push(PathBuf::from(arg)),
            }
        }

        parsed
    }

    fn apply(&mut self, flag: &str, value: &str) {
        match flag {
            "-iquote" => self.quote_dirs.push(PathBuf::from(value)),
            "-isystem" => self.system_dirs.push(PathBuf::from(value)),
            "-idirafter" => self.after_dirs.push(PathBuf::from(value)),
            "-include" => self.forced_includes.push(PathBuf::from(value)),
            "-I" => self.include_dirs.push(PathBuf::from(value)),
            "-o" => self.output = Some(PathBuf::from(value)),
            _ => {}
        }
    }

    /// Resolves every relative path except forced includes against
    /// `working_directory`.
    pub fn absolutize(&mut self, working_directory: &Path) {
        let resolve = |paths: &mut Vec<PathBuf>| {
            for path in paths.iter_mut() {
                *path = normalize_with_base(working_directory, path);
            }
        };
        resolve(&mut self.quote_dirs);
        resolve(&mut self.include_dirs);
        resolve(&mut self.system_dirs);
        resolve(&mut self.after_dirs);
        resolve(&mut self.include_pch);
        resolve(&mut self.inputs);
        if let Some(output) = self.output.as_mut() {
            *output = normalize_with_base(working_directory, output);
        }
    }
}

/// Splits a path-taking flag into its name and inline value.
///
/// Returns `None` for flags the scanner does not act on. `-include-pch` is
/// matched before this is reached, so `-include` never swallows it.
fn split_value_flag(arg: &str) -> Option<(&str, Option<&str>)> {
    const FLAGS: &[&str] = &["-iquote", "-isystem", "-idirafter", "-include", "-I", "-o"];
    FLAGS.iter().find_map(|&flag| {
        let rest = arg.strip_prefix(flag)?;
        Some((flag, (!rest.is_empty()).then_some(rest)))
    })
}
