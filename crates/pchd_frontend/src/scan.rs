//! An in-process frontend that follows `#include` directives itself.
//!
//! The scanner reads sources, strips comments and resolves every include
//! directive against the search paths in the argument vector. It does not
//! evaluate macros or conditionals, so every directive in a file is followed,
//! including ones inside `#if 0`. Computed includes (`#include MACRO`) are
//! skipped. `#include_next` and `#import` are treated like `#include`.
//!
//! Compiling with `-Xclang -emit-pch` writes a [`PchSnapshot`] listing the
//! headers the input reaches; consuming one with `-include-pch` marks those
//! headers as already visited.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use pchd_common::{normalize_path, normalize_with_base, ContentHash};

use crate::compiler_args::CompilerArguments;
use crate::error::FrontendError;
use crate::frontend::{Frontend, Invocation, PreprocessOutput, UnresolvedInclude};
use crate::identity::FileIdentity;
use crate::snapshot::{PchSnapshot, SnapshotEntry};

/// The in-process include scanner.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanFrontend;

impl ScanFrontend {
    /// Creates a scanner.
    pub fn new() -> Self {
        Self
    }

    fn scan(
        &self,
        invocation: &Invocation<'_>,
        excluded: &[PathBuf],
    ) -> Result<(CompilerArguments, Scanner), FrontendError> {
        let mut args = CompilerArguments::parse(invocation.arguments);
        args.absolutize(invocation.working_directory);

        let input = args.inputs.first().cloned().ok_or(FrontendError::MissingInput)?;
        let source = std::fs::read(&input).map_err(|source| FrontendError::UnreadableInput {
            path: input.clone(),
            source,
        })?;

        let mut scanner = Scanner::new(&args);
        for path in excluded {
            let path = normalize_with_base(invocation.working_directory, path);
            scanner.visited.insert(FileIdentity::resolve_or_lexical(&path));
        }
        for pch in &args.include_pch {
            let snapshot = PchSnapshot::read(pch)?;
            let stale = snapshot.stale_entries();
            if !stale.is_empty() {
                tracing::warn!(
                    pch = %pch.display(),
                    stale = stale.len(),
                    first = %stale[0].path.display(),
                    "prefix PCH is older than headers it contains"
                );
            }
            for path in snapshot.paths() {
                scanner.visited.insert(FileIdentity::resolve_or_lexical(path));
            }
            scanner.prefix.extend(snapshot.entries().iter().cloned());
        }
        scanner.visited.insert(FileIdentity::resolve_or_lexical(&input));

        for forced in &args.forced_includes {
            let spelling = forced.to_string_lossy();
            match scanner.resolve(invocation.working_directory, IncludeKind::Quoted, &spelling) {
                Some(path) => scanner.enter(path),
                None => scanner.unresolved.push(UnresolvedInclude {
                    includer: input.clone(),
                    spelling: spelling.into_owned(),
                }),
            }
        }
        scanner.scan_source(&input, &String::from_utf8_lossy(&source));

        tracing::trace!(
            input = %input.display(),
            headers = scanner.entered.len(),
            unresolved = scanner.unresolved.len(),
            "scanned translation unit"
        );
        Ok((args, scanner))
    }
}

impl Frontend for ScanFrontend {
    fn name(&self) -> &str {
        "scan"
    }

    fn preprocess(
        &self,
        invocation: &Invocation<'_>,
        excluded: &[PathBuf],
    ) -> Result<PreprocessOutput, FrontendError> {
        let (_, scanner) = self.scan(invocation, excluded)?;
        Ok(PreprocessOutput {
            headers: scanner.entered.into_iter().map(|entry| entry.path).collect(),
            unresolved: scanner.unresolved,
        })
    }

    fn compile(&self, invocation: &Invocation<'_>) -> Result<(), FrontendError> {
        let (args, scanner) = self.scan(invocation, &[])?;

        if !scanner.unresolved.is_empty() {
            let stderr = scanner
                .unresolved
                .iter()
                .map(|u| format!("{}: fatal error: '{}' file not found", u.includer.display(), u.spelling))
                .collect::<Vec<_>>()
                .join("\n");
            return Err(FrontendError::failed(invocation.compiler, Some(1), stderr));
        }

        if args.emit_pch {
            let output = args.output.as_deref().ok_or(FrontendError::MissingOutput)?;
            let mut entries = scanner.prefix;
            entries.extend(scanner.entered);
            PchSnapshot::new(entries).write(output)?;
            tracing::debug!(output = %output.display(), "wrote pch snapshot");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IncludeKind {
    Quoted,
    Angled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Directive {
    kind: IncludeKind,
    spelling: String,
}

/// Depth-first walk state for one translation unit.
struct Scanner {
    quoted_search: Vec<PathBuf>,
    angled_search: Vec<PathBuf>,
    visited: HashSet<FileIdentity>,
    prefix: Vec<SnapshotEntry>,
    entered: Vec<SnapshotEntry>,
    unresolved: Vec<UnresolvedInclude>,
}

impl Scanner {
    fn new(args: &CompilerArguments) -> Self {
        let angled_search: Vec<PathBuf> = args
            .include_dirs
            .iter()
            .chain(&args.system_dirs)
            .chain(&args.after_dirs)
            .cloned()
            .collect();
        let quoted_search = args.quote_dirs.iter().chain(&angled_search).cloned().collect();
        Self {
            quoted_search,
            angled_search,
            visited: HashSet::new(),
            prefix: Vec::new(),
            entered: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    fn scan_source(&mut self, file: &Path, source: &str) {
        let includer_dir = file.parent().unwrap_or(Path::new("/"));
        for directive in include_directives(source) {
            match self.resolve(includer_dir, directive.kind, &directive.spelling) {
                Some(path) => self.enter(path),
                None => self.unresolved.push(UnresolvedInclude {
                    includer: file.to_path_buf(),
                    spelling: directive.spelling,
                }),
            }
        }
    }

    fn enter(&mut self, path: PathBuf) {
        if !self.visited.insert(FileIdentity::resolve_or_lexical(&path)) {
            return;
        }
        let contents = match std::fs::read(&path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(header = %path.display(), error = %e, "cannot read header");
                Vec::new()
            }
        };
        self.entered.push(SnapshotEntry {
            path: path.clone(),
            hash: ContentHash::from_bytes(&contents),
        });
        self.scan_source(&path, &String::from_utf8_lossy(&contents));
    }

    fn resolve(&self, includer_dir: &Path, kind: IncludeKind, spelling: &str) -> Option<PathBuf> {
        let spelled = Path::new(spelling);
        if spelled.is_absolute() {
            let path = normalize_path(spelled);
            return path.is_file().then_some(path);
        }

        let search = match kind {
            IncludeKind::Quoted => {
                let local = normalize_path(&includer_dir.join(spelled));
                if local.is_file() {
                    return Some(local);
                }
                &self.quoted_search
            }
            IncludeKind::Angled => &self.angled_search,
        };
        search
            .iter()
            .map(|dir| normalize_path(&dir.join(spelled)))
            .find(|candidate| candidate.is_file())
    }
}

/// Extracts include directives from a source file, in order.
fn include_directives(source: &str) -> Vec<Directive> {
    let joined = source.replace("\\\r\n", "").replace("\\\n", "");
    strip_comments(&joined)
        .lines()
        .filter_map(parse_directive)
        .collect()
}

fn parse_directive(line: &str) -> Option<Directive> {
    let rest = line.trim_start().strip_prefix('#')?.trim_start();
    let rest = ["include_next", "include", "import"]
        .iter()
        .find_map(|keyword| rest.strip_prefix(keyword))?;
    if !rest.starts_with([' ', '\t', '"', '<']) {
        return None;
    }
    let rest = rest.trim_start();

    let (kind, close) = match rest.chars().next()? {
        '"' => (IncludeKind::Quoted, '"'),
        '<' => (IncludeKind::Angled, '>'),
        _ => return None,
    };
    let body = &rest[1..];
    let end = body.find(close)?;
    let spelling = &body[..end];
    if spelling.is_empty() {
        return None;
    }
    Some(Directive {
        kind,
        spelling: spelling.to_string(),
    })
}

/// Replaces comments with whitespace, keeping line structure intact.
fn strip_comments(source: &str) -> String {
    #[derive(Clone, Copy)]
    enum State {
        Code,
        LineComment,
        BlockComment,
        Literal(char),
    }

    let mut out = String::with_capacity(source.len());
    let mut state = State::Code;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push(' ');
                    state = State::BlockComment;
                }
                '"' | '\'' => {
                    out.push(c);
                    state = State::Literal(c);
                }
                _ => out.push(c),
            },
            State::LineComment => {
                if c == '\n' {
                    out.push('\n');
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                } else if c == '\n' {
                    out.push('\n');
                }
            }
            State::Literal(quote) => {
                out.push(c);
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                } else if c == quote || c == '\n' {
                    state = State::Code;
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn root(dir: &tempfile::TempDir) -> PathBuf {
        std::fs::canonicalize(dir.path()).unwrap()
    }

    #[test]
    fn parses_directive_forms() {
        assert_eq!(
            parse_directive("#include \"a.h\""),
            Some(Directive { kind: IncludeKind::Quoted, spelling: "a.h".into() })
        );
        assert_eq!(
            parse_directive("  #  include <sys/types.h>"),
            Some(Directive { kind: IncludeKind::Angled, spelling: "sys/types.h".into() })
        );
        assert_eq!(
            parse_directive("#include_next <b.h>").map(|d| d.spelling),
            Some("b.h".to_string())
        );
        assert_eq!(parse_directive("#import \"c.h\"").map(|d| d.kind), Some(IncludeKind::Quoted));
        assert_eq!(parse_directive("#include HEADER_MACRO"), None);
        assert_eq!(parse_directive("#includes <x.h>"), None);
        assert_eq!(parse_directive("#define X 1"), None);
    }

    #[test]
    fn comments_hide_directives() {
        let source = "/* #include \"a.h\"\n#include \"b.h\" */\n// #include \"c.h\"\n#include \"d.h\" // trailing\n";
        let spellings: Vec<String> = include_directives(source).into_iter().map(|d| d.spelling).collect();
        assert_eq!(spellings, vec!["d.h"]);
    }

    #[test]
    fn string_literals_are_not_comments() {
        let stripped = strip_comments("const char* s = \"//not a comment\"; // comment");
        assert!(stripped.contains("//not a comment"));
        assert!(!stripped.contains("comment\"; // comment"));
    }

    #[test]
    fn preprocess_reports_headers_in_entry_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = root(&dir);
        write(&root, "inc/a.h", "#include \"b.h\"\n");
        write(&root, "inc/b.h", "#pragma once\n");
        write(&root, "inc/c.h", "#include <a.h>\n");
        let main = write(&root, "main.cpp", "#include <a.h>\n#include <c.h>\n");

        let arguments = args(&["-I", "inc", "main.cpp"]);
        let output = ScanFrontend
            .preprocess(&Invocation::new("clang++", &arguments, &root), &[])
            .unwrap();

        assert_eq!(
            output.headers,
            vec![root.join("inc/a.h"), root.join("inc/b.h"), root.join("inc/c.h")]
        );
        assert!(!output.headers.contains(&main));
        assert!(output.unresolved.is_empty());
    }

    #[test]
    fn quoted_includes_search_includer_directory_first() {
        let dir = tempfile::tempdir().unwrap();
        let root = root(&dir);
        write(&root, "src/local.h", "");
        write(&root, "inc/local.h", "");
        write(&root, "src/main.cpp", "#include \"local.h\"\n#include <local.h>\n");

        let arguments = args(&["-Iinc", "src/main.cpp"]);
        let output = ScanFrontend
            .preprocess(&Invocation::new("clang++", &arguments, &root), &[])
            .unwrap();
        assert_eq!(output.headers, vec![root.join("src/local.h"), root.join("inc/local.h")]);
    }

    #[test]
    fn excluded_headers_and_their_subtrees_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = root(&dir);
        write(&root, "global.h", "#include \"deep.h\"\n");
        write(&root, "deep.h", "");
        write(&root, "own.h", "");
        write(&root, "main.cpp", "#include \"global.h\"\n#include \"own.h\"\n");

        let arguments = args(&["main.cpp"]);
        let output = ScanFrontend
            .preprocess(
                &Invocation::new("clang++", &arguments, &root),
                &[root.join("global.h")],
            )
            .unwrap();
        assert_eq!(output.headers, vec![root.join("own.h")]);
    }

    #[test]
    fn cycles_terminate() {
        let dir = tempfile::tempdir().unwrap();
        let root = root(&dir);
        write(&root, "a.h", "#include \"b.h\"\n");
        write(&root, "b.h", "#include \"a.h\"\n");
        write(&root, "main.cpp", "#include \"a.h\"\n");

        let arguments = args(&["main.cpp"]);
        let output = ScanFrontend
            .preprocess(&Invocation::new("clang++", &arguments, &root), &[])
            .unwrap();
        assert_eq!(output.headers, vec![root.join("a.h"), root.join("b.h")]);
    }

    #[test]
    fn forced_includes_come_first() {
        let dir = tempfile::tempdir().unwrap();
        let root = root(&dir);
        write(&root, "config.h", "");
        write(&root, "a.h", "");
        write(&root, "main.cpp", "#include \"a.h\"\n");

        let arguments = args(&["-include", "config.h", "main.cpp"]);
        let output = ScanFrontend
            .preprocess(&Invocation::new("clang++", &arguments, &root), &[])
            .unwrap();
        assert_eq!(output.headers, vec![root.join("config.h"), root.join("a.h")]);
    }

    #[test]
    fn unresolved_includes_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let root = root(&dir);
        let main = write(&root, "main.cpp", "#include <missing.h>\n");

        let arguments = args(&["main.cpp"]);
        let output = ScanFrontend
            .preprocess(&Invocation::new("clang++", &arguments, &root), &[])
            .unwrap();
        assert!(output.headers.is_empty());
        assert_eq!(
            output.unresolved,
            vec![UnresolvedInclude { includer: main, spelling: "missing.h".into() }]
        );
    }

    #[test]
    fn missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let arguments = args(&["-I", "inc"]);
        let err = ScanFrontend
            .preprocess(&Invocation::new("clang++", &arguments, dir.path()), &[])
            .unwrap_err();
        assert!(matches!(err, FrontendError::MissingInput));
    }

    #[test]
    fn unreadable_input() {
        let dir = tempfile::tempdir().unwrap();
        let arguments = args(&["nope.cpp"]);
        let err = ScanFrontend
            .preprocess(&Invocation::new("clang++", &arguments, dir.path()), &[])
            .unwrap_err();
        assert!(matches!(err, FrontendError::UnreadableInput { .. }));
    }

    #[test]
    fn emit_pch_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let root = root(&dir);
        write(&root, "a.h", "#include \"b.h\"\n");
        write(&root, "b.h", "");
        write(&root, "pch.h", "#include \"a.h\"\n");

        let arguments = args(&["-x", "c++-header", "-Xclang", "-emit-pch", "-o", "pch.pch", "pch.h"]);
        ScanFrontend
            .compile(&Invocation::new("clang++", &arguments, &root))
            .unwrap();

        let snapshot = PchSnapshot::read(&root.join("pch.pch")).unwrap();
        let paths: Vec<PathBuf> = snapshot.paths().map(Path::to_path_buf).collect();
        assert_eq!(paths, vec![root.join("a.h"), root.join("b.h")]);
    }

    #[test]
    fn emit_pch_without_output_fails() {
        let dir = tempfile::tempdir().unwrap();
        let root = root(&dir);
        write(&root, "pch.h", "");
        let arguments = args(&["-Xclang", "-emit-pch", "pch.h"]);
        let err = ScanFrontend
            .compile(&Invocation::new("clang++", &arguments, &root))
            .unwrap_err();
        assert!(matches!(err, FrontendError::MissingOutput));
    }

    #[test]
    fn compile_fails_on_missing_header() {
        let dir = tempfile::tempdir().unwrap();
        let root = root(&dir);
        write(&root, "pch.h", "#include \"gone.h\"\n");
        let arguments = args(&["-Xclang", "-emit-pch", "-o", "pch.pch", "pch.h"]);
        let err = ScanFrontend
            .compile(&Invocation::new("clang++", &arguments, &root))
            .unwrap_err();
        match err {
            FrontendError::Failed { status, stderr, .. } => {
                assert_eq!(status, Some(1));
                assert!(stderr.contains("'gone.h' file not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!root.join("pch.pch").exists());
    }

    #[test]
    fn consumed_pch_marks_headers_visited() {
        let dir = tempfile::tempdir().unwrap();
        let root = root(&dir);
        write(&root, "shared.h", "");
        write(&root, "own.h", "");
        write(&root, "global.h", "#include \"shared.h\"\n");
        write(&root, "main.cpp", "#include \"shared.h\"\n#include \"own.h\"\n");

        let emit = args(&["-Xclang", "-emit-pch", "-o", "global.pch", "global.h"]);
        ScanFrontend.compile(&Invocation::new("clang++", &emit, &root)).unwrap();

        let consume = args(&["-Xclang", "-include-pch", "-Xclang", "global.pch", "main.cpp"]);
        let output = ScanFrontend
            .preprocess(&Invocation::new("clang++", &consume, &root), &[])
            .unwrap();
        assert_eq!(output.headers, vec![root.join("own.h")]);
    }

    #[test]
    fn chained_pch_includes_prefix_entries() {
        let dir = tempfile::tempdir().unwrap();
        let root = root(&dir);
        write(&root, "shared.h", "");
        write(&root, "own.h", "");
        write(&root, "global.h", "#include \"shared.h\"\n");
        write(&root, "part.h", "#include \"shared.h\"\n#include \"own.h\"\n");

        let global = args(&["-Xclang", "-emit-pch", "-o", "global.pch", "global.h"]);
        ScanFrontend.compile(&Invocation::new("clang++", &global, &root)).unwrap();
        let part = args(&[
            "-Xclang", "-include-pch", "-Xclang", "global.pch", "-Xclang", "-emit-pch", "-o", "part.pch", "part.h",
        ]);
        ScanFrontend.compile(&Invocation::new("clang++", &part, &root)).unwrap();

        let snapshot = PchSnapshot::read(&root.join("part.pch")).unwrap();
        let paths: Vec<PathBuf> = snapshot.paths().map(Path::to_path_buf).collect();
        assert_eq!(paths, vec![root.join("shared.h"), root.join("own.h")]);
    }
}
