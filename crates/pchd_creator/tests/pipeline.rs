//! End-to-end PCH generation over a small two-part project on disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use pchd_common::{PathId, PathStringCache, ProjectPart};
use pchd_creator::{CreatorState, PchCreator, PchError, PchScope, StaticEnvironment};
use pchd_frontend::{PchSnapshot, ScanFrontend};

struct Project {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Project {
    /// Two parts sharing `shared.h`, each with one private external header
    /// and one project header the other part also includes.
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = std::fs::canonicalize(dir.path()).unwrap();
        let write = |rel: &str, contents: &str| {
            let path = root.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, contents).unwrap();
        };

        write("external/shared.h", "#pragma once\nstruct Shared {};\n");
        write("external/external1.h", "#pragma once\n");
        write("external/external2.h", "#pragma once\n");
        write("project/header1.h", "#pragma once\n");
        write("project/header2.h", "#pragma once\n");
        write(
            "project/main1.cpp",
            "#include \"header1.h\"\n#include \"header2.h\"\n#include <shared.h>\n#include <external1.h>\n",
        );
        write(
            "project/main2.cpp",
            "#include \"header2.h\"\n#include \"header1.h\"\n#include <shared.h>\n#include <external2.h>\n",
        );

        Self { _dir: dir, root }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    fn parts(&self) -> Vec<ProjectPart> {
        let include = self.path("external").display().to_string();
        vec![
            ProjectPart::new(
                "project1",
                vec!["-I".to_string(), include.clone()],
                vec![self.path("project/header1.h")],
                vec![self.path("project/main1.cpp")],
            ),
            ProjectPart::new(
                "project2",
                vec!["-I".to_string(), include],
                vec![self.path("project/header2.h")],
                vec![self.path("project/main2.cpp")],
            ),
        ]
    }

    fn environment(&self) -> StaticEnvironment {
        StaticEnvironment::new("clang++", self.path("out"), &self.root)
    }
}

fn id_set(cache: &PathStringCache, paths: &[PathBuf]) -> HashSet<PathId> {
    paths.iter().map(|path| cache.id(path)).collect()
}

#[test]
fn global_include_set_is_the_shared_header() {
    let project = Project::new();
    let env = project.environment();
    let cache = PathStringCache::new();
    let frontend = ScanFrontend::new();
    let mut creator = PchCreator::new(project.parts(), &env, &cache, &frontend);

    let includes = creator.generate_global_pch_include_ids();
    assert_eq!(includes.to_set(), id_set(&cache, &[project.path("external/shared.h")]));
    assert_eq!(creator.state(), &CreatorState::GlobalIncludesCollected);
}

#[test]
fn global_header_content() {
    let project = Project::new();
    let env = project.environment();
    let cache = PathStringCache::new();
    let frontend = ScanFrontend::new();
    let mut creator = PchCreator::new(project.parts(), &env, &cache, &frontend);

    assert_eq!(
        creator.generate_global_pch_header_file_content().unwrap(),
        format!("#include <{}>\n", project.path("external/shared.h").display())
    );
}

#[test]
fn part_includes_exclude_the_global_set() {
    let project = Project::new();
    let env = project.environment();
    let cache = PathStringCache::new();
    let frontend = ScanFrontend::new();
    let parts = project.parts();
    let mut creator = PchCreator::new(parts.clone(), &env, &cache, &frontend);

    let part1 = creator.generate_project_part_pch_includes(&parts[0]).unwrap();
    let part2 = creator.generate_project_part_pch_includes(&parts[1]).unwrap();

    assert_eq!(
        part1.to_set(),
        id_set(&cache, &[project.path("project/header2.h"), project.path("external/external1.h")])
    );
    assert_eq!(
        part2.to_set(),
        id_set(&cache, &[project.path("project/header1.h"), project.path("external/external2.h")])
    );
    assert!(!part1.contains(cache.id(&project.path("external/shared.h"))));
}

#[test]
fn global_arguments_concatenate_in_input_order() {
    let project = Project::new();
    let env = project.environment();
    let cache = PathStringCache::new();
    let frontend = ScanFrontend::new();
    let parts = vec![
        ProjectPart::new("a", vec!["A1".into(), "A2".into()], vec![], vec![]),
        ProjectPart::new("b", vec!["B1".into(), "B2".into()], vec![], vec![]),
    ];
    let creator = PchCreator::new(parts, &env, &cache, &frontend);
    assert_eq!(creator.generate_global_arguments(), vec!["A1", "A2", "B1", "B2"]);
}

#[test]
fn generate_pchs_writes_every_artifact() {
    let project = Project::new();
    let env = project.environment();
    let cache = PathStringCache::new();
    let frontend = ScanFrontend::new();
    let mut creator = PchCreator::new(project.parts(), &env, &cache, &frontend);

    creator.generate_pchs().unwrap();
    assert_eq!(creator.state(), &CreatorState::Done);
    assert!(!creator.diagnostics().has_errors());

    let global = creator.take_global_pch().unwrap();
    assert_eq!(global.scope, PchScope::Global);
    assert_eq!(global.path, project.path("out/global-pch.pch"));
    assert!(global.path.is_file());
    assert!(global.header_path.is_file());
    assert_eq!(global.arguments[0], "clang++");

    let pchs = creator.take_project_part_pchs();
    let ids: Vec<Option<&str>> = pchs.iter().map(|pch| pch.project_part_id()).collect();
    assert_eq!(ids, vec![Some("project1"), Some("project2")]);
    for pch in &pchs {
        assert!(pch.path.is_file());
        assert!(pch.arguments.iter().any(|arg| arg == "-include-pch"));
    }

    let includes = creator.take_projects_includes();
    assert_eq!(includes.len(), 2);
    assert_eq!(includes[0].id, "project1");
    assert_eq!(
        includes[0].paths.iter().copied().collect::<HashSet<_>>(),
        id_set(&cache, &[project.path("project/header2.h"), project.path("external/external1.h")])
    );
    assert_eq!(includes[1].id, "project2");

    // Taken results are gone.
    assert!(creator.take_project_part_pchs().is_empty());
    assert!(creator.take_projects_includes().is_empty());
}

#[test]
fn part_pch_layers_on_the_global_pch() {
    let project = Project::new();
    let env = project.environment();
    let cache = PathStringCache::new();
    let frontend = ScanFrontend::new();
    let mut creator = PchCreator::new(project.parts(), &env, &cache, &frontend);
    creator.generate_pchs().unwrap();

    let pchs = creator.take_project_part_pchs();
    let snapshot = PchSnapshot::read(&pchs[0].path).unwrap();
    let paths: Vec<&Path> = snapshot.paths().collect();
    assert_eq!(paths[0], project.path("external/shared.h").as_path());
    assert!(paths.contains(&project.path("external/external1.h").as_path()));
    assert!(!paths.contains(&project.path("external/external2.h").as_path()));
}

#[test]
fn part_pch_requires_the_global_pch() {
    let project = Project::new();
    let env = project.environment();
    let cache = PathStringCache::new();
    let frontend = ScanFrontend::new();
    let parts = project.parts();
    let mut creator = PchCreator::new(parts.clone(), &env, &cache, &frontend);

    let err = creator.generate_project_part_pch(&parts[0]).unwrap_err();
    assert!(matches!(err, PchError::PipelineAborted { .. }));
    assert!(!creator.generate_project_part_pch_file_path(&parts[0]).exists());

    creator.generate_global_pch().unwrap();
    let (artifact, id_paths) = creator.generate_project_part_pch(&parts[0]).unwrap();
    assert!(artifact.path.is_file());
    assert_eq!(id_paths.id, "project1");
}

#[test]
fn failing_part_discards_the_pass() {
    let project = Project::new();
    let env = project.environment();
    let cache = PathStringCache::new();
    let frontend = ScanFrontend::new();
    // Collection only warns about the missing header; emission fails on it.
    std::fs::write(project.path("external/external2.h"), "#include <vanished.h>\n").unwrap();
    let mut creator = PchCreator::new(project.parts(), &env, &cache, &frontend);

    let err = creator.generate_pchs().unwrap_err();
    assert!(matches!(err, PchError::PipelineAborted { .. }));
    assert!(err.to_string().contains("project2"));
    assert_eq!(creator.state(), &CreatorState::Aborted);
    assert!(creator.take_project_part_pchs().is_empty());
    assert!(creator.take_projects_includes().is_empty());
    assert!(creator.diagnostics().has_errors());
}
