use std::collections::HashSet;
use std::fs;
use std::ops::ControlFlow;
use std::path::Path;
use std::time::Duration;

use photowall::config::{DiscoveryConfig, LayoutConfig};
use photowall::discovery::{self, DiscoveryWorker, StopReason};
use photowall::gallery::Gallery;
use photowall::manifest;
use photowall::probe::{self, FsProber};
use photowall::renumber;
use photowall::resource::{Base, ResourceId};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn touch(dir: &Path, names: &[&str]) {
    for name in names {
        fs::write(dir.join(name), b"").expect("fixture file should be writable");
    }
}

fn params() -> DiscoveryConfig {
    DiscoveryConfig {
        batch_delay: Duration::ZERO,
        ..DiscoveryConfig::default()
    }
}

fn sorted_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_filesystem_discovery_stops_after_gap() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["1.webp", "2.webp", "3.webp", "9.webp"]);

    let prober = FsProber::new(dir.path());
    let mut found = Vec::new();
    let report = discovery::run(&prober, "webp", &params(), |id| {
        found.push(id.name());
        ControlFlow::Continue(())
    });

    assert_eq!(found, ["1.webp", "2.webp", "3.webp"]);
    assert_eq!(report.stop, StopReason::FailureThreshold { last_index: 8 });
    assert_eq!(report.found, 3);
}

#[test]
fn test_filesystem_discovery_bridges_short_gap() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["1.webp", "4.webp", "12.webp", "13.webp"]);

    let prober = FsProber::new(dir.path());
    let mut found = Vec::new();
    discovery::run(&prober, "webp", &params(), |id| {
        found.push(id.index());
        ControlFlow::Continue(())
    });

    // 5..=11 is a gap of 7 misses, so 12 and 13 are never reached.
    assert_eq!(found, [1, 4]);
}

#[test]
fn test_discovery_ignores_other_extensions_and_directories() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["1.webp", "2.jpg"]);
    fs::create_dir(dir.path().join("3.webp")).unwrap();

    let prober = probe::for_base(
        &Base::parse(dir.path().to_str().unwrap()),
        Duration::from_secs(1),
    );
    let mut found = Vec::new();
    discovery::run(prober.as_ref(), "webp", &params(), |id| {
        found.push(id.index());
        ControlFlow::Continue(())
    });
    assert_eq!(found, [1]);
}

#[test]
fn test_worker_feeds_gallery_in_order() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["1.webp", "2.webp", "3.webp", "4.webp", "5.webp"]);

    let base = Base::parse(dir.path().to_str().unwrap());
    let worker = DiscoveryWorker::spawn(
        Box::new(FsProber::new(dir.path())),
        "webp".into(),
        DiscoveryConfig {
            batch_size: 2,
            ..params()
        },
    );
    let mut gallery = Gallery::new(base, LayoutConfig::default(), 1400);

    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    let report = loop {
        let drained = worker.drain();
        for id in drained.found {
            gallery.on_discovered(id);
        }
        if let Some(report) = drained.finished {
            break report;
        }
        assert!(std::time::Instant::now() < deadline, "worker did not finish");
        std::thread::sleep(Duration::from_millis(5));
    };

    assert_eq!(report.found, 5);
    let names: Vec<String> = gallery.resources().iter().map(ResourceId::name).collect();
    assert_eq!(names, ["1.webp", "2.webp", "3.webp", "4.webp", "5.webp"]);
    assert_eq!(gallery.layout().column_positions(0), [0, 3]);
    assert_eq!(gallery.layout().column_positions(1), [1, 4]);
    assert_eq!(gallery.layout().column_positions(2), [2]);
}

#[test]
fn test_gallery_resize_replays_discovered_list() {
    let mut gallery = Gallery::new(Base::parse("./photos"), LayoutConfig::default(), 1400);
    for n in [1, 2, 3, 4] {
        gallery.on_discovered(ResourceId::new(n, "webp"));
    }
    assert_eq!(gallery.layout().column_count(), 3);

    assert!(gallery.apply_width(700));
    assert_eq!(gallery.layout().column_positions(0), [0, 1, 2, 3]);

    assert!(gallery.apply_width(1000));
    assert_eq!(gallery.layout().column_positions(0), [0, 2]);
    assert_eq!(gallery.layout().column_positions(1), [1, 3]);

    assert!(!gallery.apply_width(900));
    assert_eq!(gallery.rebuild_count(), 2);
}

#[test]
fn test_update_list_rewrites_block() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let images = dir.path().join("photos");
    fs::create_dir(&images).unwrap();
    touch(&images, &["x.png", "y.txt", "z.jpeg"]);

    let script = dir.path().join("script.js");
    fs::write(
        &script,
        "const a = 1;\n// photowall:images:begin\nconst images = [\n  'old.webp'\n];\n// photowall:images:end\nstart(images);\n",
    )
    .unwrap();

    let report = manifest::update_image_list(&images, &script).unwrap();
    let listed: HashSet<&str> = report.images.iter().map(String::as_str).collect();
    assert_eq!(listed, HashSet::from(["x.png", "z.jpeg"]));

    // Entries follow directory enumeration order.
    let expected = manifest::scan_images(&images).unwrap();
    let text = fs::read_to_string(&script).unwrap();
    assert!(text.contains(&manifest::render_block(&expected)));
    assert!(text.starts_with("const a = 1;\n"));
    assert!(text.ends_with("start(images);\n"));
    assert!(!text.contains("old.webp"));
}

#[test]
fn test_update_list_without_markers_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["a.png"]);
    let script = dir.path().join("script.js");
    let original = "const images = ['a.png'];\n";
    fs::write(&script, original).unwrap();

    assert!(manifest::update_image_list(dir.path(), &script).is_err());
    assert_eq!(fs::read_to_string(&script).unwrap(), original);
}

#[test]
fn test_update_list_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("script.js");
    let original = "// photowall:images:begin\n// photowall:images:end\n";
    fs::write(&script, original).unwrap();

    let err = manifest::update_image_list(&dir.path().join("nope"), &script).unwrap_err();
    assert!(format!("{err:#}").contains("nope"));
    assert_eq!(fs::read_to_string(&script).unwrap(), original);
}

#[test]
fn test_number_then_discover() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["1.webp", "2.webp", "holiday.webp", "beach.WEBP", "notes.txt"]);

    let plan = renumber::plan_numbering(dir.path()).unwrap();
    let report = renumber::execute(&plan.renames, "_temp_number_");
    assert_eq!(report, renumber::RenameReport { renamed: 2, errors: 0 });
    assert_eq!(
        sorted_names(dir.path()),
        ["1.webp", "2.webp", "3.webp", "4.webp", "notes.txt"]
    );

    // beach sorts before holiday.
    let prober = FsProber::new(dir.path());
    let mut found = Vec::new();
    discovery::run(&prober, "webp", &params(), |id| {
        found.push(id.index());
        ControlFlow::Continue(())
    });
    assert_eq!(found, [1, 2, 3, 4]);
}

#[test]
fn test_apply_order_swaps_and_skips_missing() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("1.webp"), b"first").unwrap();
    fs::write(dir.path().join("2.webp"), b"second").unwrap();
    let order_path = dir.path().join("order.json");
    fs::write(
        &order_path,
        r#"{"order": ["2.webp", "gone.webp", "1.webp"], "timestamp": "2024-05-01T10:00:00Z"}"#,
    )
    .unwrap();

    let order = renumber::load_order(&order_path).unwrap();
    let plan = renumber::plan_order(dir.path(), &order).unwrap();
    assert_eq!(plan.missing, ["gone.webp"]);

    let report = renumber::execute(&plan.renames, "_temp_reorder_");
    assert_eq!(report.renamed, 2);
    assert_eq!(report.errors, 0);
    assert_eq!(fs::read(dir.path().join("1.webp")).unwrap(), b"second");
    assert_eq!(fs::read(dir.path().join("2.webp")).unwrap(), b"first");
    assert_eq!(
        sorted_names(dir.path()),
        ["1.webp", "2.webp", "order.json"]
    );
}

#[test]
fn test_apply_order_refuses_to_clobber_unlisted_file() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["a.webp", "1.webp"]);
    let order = renumber::OrderFile {
        order: vec!["a.webp".into()],
        timestamp: None,
    };
    assert!(renumber::plan_order(dir.path(), &order).is_err());
}

#[test]
fn test_apply_order_malformed_json_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("order.json");
    fs::write(&path, "{not json").unwrap();
    assert!(renumber::load_order(&path).is_err());
}
