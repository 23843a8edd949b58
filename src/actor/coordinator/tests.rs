use super::*;
use crate::actor::fs::PollWatcher;
use crate::dialect::{Dialect, DialectSet, Render, RenderOptions};
use crate::engine::{CascadeMode, CompileError, ReferenceSyntax};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tokio::time::timeout;

const TICK: Duration = Duration::from_millis(20);

struct Upper;

impl Render for Upper {
    fn render(&self, _: &Path, content: &str, _: &RenderOptions) -> Result<String, CompileError> {
        if content.contains("FAIL") {
            return Err(CompileError::new("bad template"));
        }
        Ok(content.to_uppercase())
    }
}

struct Fixture {
    _dir: TempDir,
    root: PathBuf,
    ctx: Arc<Context>,
    hub_rx: mpsc::Receiver<HubMsg>,
}

/// Engine over `files`, poll watcher, and a hub channel owned by the test.
fn fixture(files: &[(&str, &str)]) -> Fixture {
    let dir = TempDir::new().unwrap();
    let root = dir.path().canonicalize().unwrap();
    for (name, content) in files {
        fs::write(root.join(name), content).unwrap();
    }

    let mut dialects = DialectSet::new();
    dialects.insert(Dialect::new(
        "tmpl",
        &["tmpl"],
        "html",
        Some(ReferenceSyntax::Include),
        Arc::new(Upper),
    ));
    let engine = Arc::new(RebuildEngine::new(&root, Arc::new(dialects)).with_mode(CascadeMode::Direct));
    engine.compile_all().unwrap();

    let (event_tx, event_rx) = mpsc::channel(CHANNEL_BUFFER);
    let (hub_tx, hub_rx) = mpsc::channel(CHANNEL_BUFFER);
    let ctx = Arc::new(Context {
        engine,
        watcher: Arc::new(PollWatcher::new(event_tx)),
        poll_interval: TICK,
        hub: Some(Hub {
            tx: hub_tx,
            serve_root: root.clone(),
            asset_interval: TICK,
        }),
    });
    ctx.subscribe_sources();
    ctx.subscribe_assets();
    tokio::spawn(runtime::dispatch(Arc::clone(&ctx), event_rx));

    Fixture {
        _dir: dir,
        root,
        ctx,
        hub_rx,
    }
}

async fn next_modified(rx: &mut mpsc::Receiver<HubMsg>) -> Option<String> {
    loop {
        match timeout(Duration::from_secs(3), rx.recv()).await.ok().flatten()? {
            HubMsg::FileModified(path) => return Some(path),
            _ => continue,
        }
    }
}

#[tokio::test]
async fn source_change_reaches_hub_as_output() {
    let mut fx = fixture(&[("index.tmpl", "home")]);
    assert!(fx.ctx.watcher.is_watching(&fx.root.join("index.html"), WatchTag::Asset));
    tokio::time::sleep(TICK * 3).await;

    fs::write(fx.root.join("index.tmpl"), "welcome home").unwrap();

    assert_eq!(next_modified(&mut fx.hub_rx).await.as_deref(), Some("/index.html"));
    assert_eq!(
        fs::read_to_string(fx.root.join("index.html")).unwrap(),
        "WELCOME HOME"
    );
}

#[tokio::test]
async fn first_output_is_announced_immediately() {
    let mut fx = fixture(&[("about.tmpl", "FAIL")]);
    let output = fx.root.join("about.html");
    assert!(!fx.ctx.watcher.is_watching(&output, WatchTag::Asset));
    tokio::time::sleep(TICK * 3).await;

    fs::write(fx.root.join("about.tmpl"), "fixed").unwrap();

    assert_eq!(next_modified(&mut fx.hub_rx).await.as_deref(), Some("/about.html"));
    assert!(fx.ctx.watcher.is_watching(&output, WatchTag::Asset));
}

#[tokio::test]
async fn static_asset_change_is_forwarded() {
    let mut fx = fixture(&[("site.css", "body{}")]);
    tokio::time::sleep(TICK * 3).await;

    fs::write(fx.root.join("site.css"), "body{color:red}").unwrap();

    assert_eq!(next_modified(&mut fx.hub_rx).await.as_deref(), Some("/site.css"));
}

#[tokio::test]
async fn dependency_that_is_also_served_reaches_hub_and_dependents() {
    let mut fx = fixture(&[("app.js", "let a = 1;"), ("index.tmpl", "extends app.js")]);
    let app = fx.root.join("app.js");
    assert!(fx.ctx.watcher.is_watching(&app, WatchTag::Source));
    assert!(fx.ctx.watcher.is_watching(&app, WatchTag::Asset));
    tokio::time::sleep(TICK * 3).await;

    fs::write(&app, "let a = 2;").unwrap();

    // The asset itself and its recompiled dependent, in either order
    let mut seen = Vec::new();
    while seen.len() < 2 {
        let Some(path) = next_modified(&mut fx.hub_rx).await else {
            break;
        };
        if !seen.contains(&path) {
            seen.push(path);
        }
    }
    seen.sort();
    assert_eq!(seen, vec!["/app.js".to_string(), "/index.html".to_string()]);
    assert_eq!(
        fs::read_to_string(fx.root.join("index.html")).unwrap(),
        "EXTENDS APP.JS"
    );
    assert_eq!(fx.ctx.engine.dependents_of(&app).len(), 1);
}

#[tokio::test]
async fn include_added_later_subscribes_served_target_as_source() {
    let fx = fixture(&[("app.js", "let a = 1;"), ("index.tmpl", "home")]);
    let app = fx.root.join("app.js");
    assert!(fx.ctx.watcher.is_watching(&app, WatchTag::Asset));
    assert!(!fx.ctx.watcher.is_watching(&app, WatchTag::Source));

    fs::write(fx.root.join("index.tmpl"), "extends app.js").unwrap();
    fx.ctx.on_source_change(fx.root.join("index.tmpl")).await;

    assert!(fx.ctx.watcher.is_watching(&app, WatchTag::Source));
}

#[test]
fn asset_extensions() {
    assert!(cascade_is_asset("a/b.html"));
    assert!(cascade_is_asset("x.js"));
    assert!(!cascade_is_asset("x.styl"));
}

fn cascade_is_asset(path: &str) -> bool {
    super::cascade::is_asset(Path::new(path))
}
