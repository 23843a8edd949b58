//! Engine scenarios: initial pass, cascades, failure isolation.

use super::*;
use crate::dialect::{Dialect, DialectSet, Render, RenderOptions};
use std::fs;
use tempfile::TempDir;

/// Inlines `extends <name>` lines with `<name>.tmpl`, fails on `FAIL`.
struct Inline;

impl Render for Inline {
    fn render(
        &self,
        source: &Path,
        content: &str,
        options: &RenderOptions,
    ) -> Result<String, CompileError> {
        let dir = source.parent().unwrap_or(Path::new("."));
        let mut out = String::new();
        for (n, line) in content.lines().enumerate() {
            if line.contains("FAIL") {
                return Err(CompileError::new("template error").at(n as u32 + 1, None));
            }
            match line.strip_prefix("extends ") {
                Some(name) => {
                    let dep = dir.join(format!("{}.tmpl", name.trim()));
                    let text = fs::read_to_string(&dep)
                        .map_err(|err| CompileError::io("cannot read", &dep, err))?;
                    out.push_str(&self.render(&dep, &text, options)?);
                }
                None => {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        Ok(out)
    }
}

fn dialects() -> Arc<DialectSet> {
    let mut set = DialectSet::new();
    set.insert(Dialect::new(
        "tmpl",
        &["tmpl"],
        "out",
        Some(ReferenceSyntax::Include),
        Arc::new(Inline),
    ));
    Arc::new(set)
}

struct Site {
    _dir: TempDir,
    root: PathBuf,
}

impl Site {
    fn new(files: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        for (name, content) in files {
            let path = root.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        Self { _dir: dir, root }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path(name)).unwrap()
    }

    fn write(&self, name: &str, content: &str) {
        fs::write(self.path(name), content).unwrap();
    }

    fn engine(&self, mode: CascadeMode) -> Arc<RebuildEngine> {
        Arc::new(RebuildEngine::new(&self.root, dialects()).with_mode(mode))
    }
}

fn compiled_sources(report: &CascadeReport) -> Vec<PathBuf> {
    report.compiled.iter().map(|(s, _)| s.clone()).collect()
}

#[test]
fn initial_pass_records_dependents() {
    let site = Site::new(&[
        ("layout.tmpl", "<html>"),
        ("index.tmpl", "extends layout\nhome"),
    ]);
    let engine = site.engine(CascadeMode::Direct);

    let report = engine.compile_all().unwrap();

    assert_eq!(report.compiled.len(), 2);
    assert!(report.failed.is_empty());
    assert!(engine
        .dependents_of(&site.path("layout.tmpl"))
        .contains(&site.path("index.tmpl")));
    assert_eq!(site.read("layout.out"), "<html>\n");
    assert_eq!(site.read("index.out"), "<html>\nhome\n");
}

#[tokio::test]
async fn touching_layout_regenerates_both() {
    let site = Site::new(&[
        ("layout.tmpl", "<html>"),
        ("index.tmpl", "extends layout\nhome"),
    ]);
    let engine = site.engine(CascadeMode::Direct);
    engine.compile_all().unwrap();

    site.write("layout.tmpl", "<html lang=en>");
    let report = engine.cascade(&site.path("layout.tmpl")).await.unwrap();

    assert_eq!(
        compiled_sources(&report),
        vec![site.path("layout.tmpl"), site.path("index.tmpl")]
    );
    assert_eq!(site.read("index.out"), "<html lang=en>\nhome\n");
}

#[tokio::test]
async fn touching_index_regenerates_only_index() {
    let site = Site::new(&[
        ("layout.tmpl", "<html>"),
        ("index.tmpl", "extends layout\nhome"),
    ]);
    let engine = site.engine(CascadeMode::Transitive);
    engine.compile_all().unwrap();
    fs::remove_file(site.path("layout.out")).unwrap();

    site.write("index.tmpl", "extends layout\nwelcome");
    let report = engine.cascade(&site.path("index.tmpl")).await.unwrap();

    assert_eq!(compiled_sources(&report), vec![site.path("index.tmpl")]);
    assert!(!site.path("layout.out").exists());
    assert_eq!(site.read("index.out"), "<html>\nwelcome\n");
}

#[tokio::test]
async fn removed_include_drops_edge() {
    let site = Site::new(&[
        ("layout.tmpl", "<html>"),
        ("index.tmpl", "extends layout\nhome"),
    ]);
    let engine = site.engine(CascadeMode::Direct);
    engine.compile_all().unwrap();

    site.write("index.tmpl", "standalone");
    engine.cascade(&site.path("index.tmpl")).await.unwrap();

    assert!(engine.dependents_of(&site.path("layout.tmpl")).is_empty());
    let report = engine.cascade(&site.path("layout.tmpl")).await.unwrap();
    assert_eq!(compiled_sources(&report), vec![site.path("layout.tmpl")]);
}

#[tokio::test]
async fn repeated_cascade_keeps_edge_set() {
    let site = Site::new(&[
        ("layout.tmpl", "<html>"),
        ("nav.tmpl", "<nav>"),
        ("index.tmpl", "extends layout\nextends nav"),
    ]);
    let engine = site.engine(CascadeMode::Direct);
    engine.compile_all().unwrap();
    let before = engine.dependencies_of(&site.path("index.tmpl"));

    engine.cascade(&site.path("index.tmpl")).await.unwrap();
    engine.cascade(&site.path("index.tmpl")).await.unwrap();

    assert_eq!(engine.dependencies_of(&site.path("index.tmpl")), before);
    assert_eq!(before.len(), 2);
}

#[tokio::test]
async fn direct_and_transitive_differ_on_chain() {
    let files = [
        ("layout.tmpl", "<html>"),
        ("section.tmpl", "extends layout\n<section>"),
        ("page.tmpl", "extends section\npage"),
    ];

    let site = Site::new(&files);
    let direct = site.engine(CascadeMode::Direct);
    direct.compile_all().unwrap();
    site.write("layout.tmpl", "<html v2>");
    let report = direct.cascade(&site.path("layout.tmpl")).await.unwrap();
    assert_eq!(report.compiled.len(), 2);
    assert_eq!(site.read("page.out"), "<html>\n<section>\npage\n");

    let site = Site::new(&files);
    let transitive = site.engine(CascadeMode::Transitive);
    transitive.compile_all().unwrap();
    site.write("layout.tmpl", "<html v2>");
    let report = transitive.cascade(&site.path("layout.tmpl")).await.unwrap();
    assert_eq!(
        compiled_sources(&report),
        vec![
            site.path("layout.tmpl"),
            site.path("section.tmpl"),
            site.path("page.tmpl")
        ]
    );
    assert_eq!(site.read("page.out"), "<html v2>\n<section>\npage\n");
}

#[tokio::test]
async fn failure_is_isolated_and_recoverable() {
    let site = Site::new(&[
        ("broken.tmpl", "FAIL"),
        ("other.tmpl", "fine"),
    ]);
    let engine = site.engine(CascadeMode::Transitive);

    let report = engine.compile_all().unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.compiled.len(), 1);
    assert!(engine.state(&site.path("broken.tmpl")).unwrap().is_failed());
    assert!(engine.watch_targets().contains(&site.path("broken.tmpl")));

    site.write("other.tmpl", "still fine");
    let report = engine.cascade(&site.path("other.tmpl")).await.unwrap();
    assert!(report.failed.is_empty());
    assert_eq!(site.read("other.out"), "still fine\n");
    assert!(report.recovered.is_empty());

    site.write("broken.tmpl", "fixed");
    let report = engine.cascade(&site.path("broken.tmpl")).await.unwrap();
    assert!(report.failed.is_empty());
    assert_eq!(report.recovered, vec![site.path("broken.tmpl")]);
    assert!(matches!(
        engine.state(&site.path("broken.tmpl")),
        Some(FileState::Compiled)
    ));
}

#[tokio::test]
async fn failing_dependency_still_compiles_other_dependents() {
    let site = Site::new(&[
        ("layout.tmpl", "<html>"),
        ("a.tmpl", "extends layout\nFAIL"),
        ("b.tmpl", "extends layout\nb"),
    ]);
    let engine = site.engine(CascadeMode::Direct);
    engine.compile_all().unwrap();

    site.write("layout.tmpl", "<html v2>");
    let report = engine.cascade(&site.path("layout.tmpl")).await.unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, site.path("a.tmpl"));
    assert_eq!(site.read("b.out"), "<html v2>\nb\n");
}

#[tokio::test]
async fn failed_compile_keeps_new_edges() {
    let site = Site::new(&[
        ("layout.tmpl", "<html>"),
        ("index.tmpl", "home"),
    ]);
    let engine = site.engine(CascadeMode::Direct);
    engine.compile_all().unwrap();

    site.write("index.tmpl", "extends layout\nFAIL");
    let report = engine.cascade(&site.path("index.tmpl")).await.unwrap();

    assert_eq!(report.failed.len(), 1);
    assert!(engine
        .dependents_of(&site.path("layout.tmpl"))
        .contains(&site.path("index.tmpl")));
}

#[tokio::test]
async fn unresolved_reference_reported_and_watched() {
    let site = Site::new(&[("index.tmpl", "extends ghost\nhome")]);
    let engine = site.engine(CascadeMode::Direct);

    let report = engine.compile_all().unwrap();

    assert_eq!(report.unresolved.len(), 1);
    assert_eq!(report.unresolved[0].candidate, site.path("ghost.tmpl"));
    assert!(engine.watch_targets().contains(&site.path("ghost.tmpl")));

    // Creating the missing file cascades into its dependent
    site.write("ghost.tmpl", "<ghost>");
    let report = engine.cascade(&site.path("ghost.tmpl")).await.unwrap();
    assert_eq!(report.skipped, Vec::<PathBuf>::new());
    assert_eq!(site.read("index.out"), "<ghost>\nhome\n");
}

#[tokio::test]
async fn dependency_only_file_has_no_action() {
    let site = Site::new(&[
        ("index.tmpl", "extends partials/nav\nhome"),
        ("partials/nav.tmpl", "<nav>"),
    ]);
    // Non-recursive: partials/ is never scanned
    let engine = site.engine(CascadeMode::Direct);
    engine.compile_all().unwrap();

    assert!(engine.state(&site.path("partials/nav.tmpl")).is_none());
    assert!(engine.watch_targets().contains(&site.path("partials/nav.tmpl")));

    let report = engine.cascade(&site.path("partials/nav.tmpl")).await.unwrap();
    assert_eq!(compiled_sources(&report), vec![site.path("index.tmpl")]);
    assert!(!site.path("partials/nav.out").exists());
}

#[tokio::test]
async fn include_added_by_cascade_follows_dependency_only_chain() {
    let site = Site::new(&[
        ("index.tmpl", "home"),
        ("partials/nav.tmpl", "extends foot\n<nav>"),
        ("partials/foot.tmpl", "<foot>"),
    ]);
    let engine = site.engine(CascadeMode::Transitive);
    engine.compile_all().unwrap();
    assert!(engine.dependents_of(&site.path("partials/foot.tmpl")).is_empty());

    site.write("index.tmpl", "extends partials/nav\nhome");
    let report = engine.cascade(&site.path("index.tmpl")).await.unwrap();
    assert!(report.dependencies.contains(&site.path("partials/nav.tmpl")));
    assert!(report.dependencies.contains(&site.path("partials/foot.tmpl")));
    assert!(
        engine
            .dependents_of(&site.path("partials/foot.tmpl"))
            .contains(&site.path("partials/nav.tmpl"))
    );
    assert!(engine.watch_targets().contains(&site.path("partials/foot.tmpl")));

    site.write("partials/foot.tmpl", "<footer>");
    let report = engine.cascade(&site.path("partials/foot.tmpl")).await.unwrap();
    assert_eq!(compiled_sources(&report), vec![site.path("index.tmpl")]);
    assert_eq!(site.read("index.out"), "<footer>\n<nav>\nhome\n");
}

#[tokio::test]
async fn deleted_file_event_is_ignored() {
    let site = Site::new(&[("index.tmpl", "home")]);
    let engine = site.engine(CascadeMode::Direct);
    engine.compile_all().unwrap();

    fs::remove_file(site.path("index.tmpl")).unwrap();
    assert!(engine.cascade(&site.path("index.tmpl")).await.is_none());
    assert!(engine.watch_targets().contains(&site.path("index.tmpl")));
}

#[test]
fn output_dir_mirrors_layout() {
    let site = Site::new(&[("pages/about.tmpl", "about")]);
    let out = site.path("public");
    let engine = RebuildEngine::new(&site.root, dialects())
        .with_recursive(true)
        .with_output_dir(Some(out.clone()));

    engine.compile_all().unwrap();

    assert_eq!(
        fs::read_to_string(out.join("pages/about.out")).unwrap(),
        "about\n"
    );
}
