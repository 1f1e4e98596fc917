use std::{fs, path::PathBuf};

use tempfile::tempdir;

use fleetmap_cli::{Args, run};

/// Demo inventories live at the workspace root, relative to workspace not the crate
fn demos_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

/// Collects all .json files from a directory
fn collect_json_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json")
            })
            .collect()
    } else {
        Vec::new()
    };

    files.sort();
    files
}

fn args(input: &PathBuf, output: PathBuf) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: output.to_string_lossy().to_string(),
        simulate_ms: 500,
        config: None,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let demos = collect_json_files(demos_path());

    assert!(!demos.is_empty(), "No demo inventories found in demos/");

    let mut failed = Vec::new();

    for demo in &demos {
        let stem = demo.file_stem().unwrap().to_string_lossy().to_string();
        for extension in ["svg", "json"] {
            let output = temp_dir.path().join(format!("{stem}.{extension}"));
            match run(&args(demo, output.clone())) {
                Ok(()) if output.exists() => {}
                Ok(()) => failed.push((demo.clone(), "no output written".to_string())),
                Err(e) => failed.push((demo.clone(), e.to_string())),
            }
        }
    }

    if !failed.is_empty() {
        eprintln!("\nDemos that failed:");
        for (path, err) in &failed {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} demo run(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let error_demos = collect_json_files(demos_path().join("errors"));

    assert!(
        !error_demos.is_empty(),
        "No error inventories found in demos/errors/"
    );

    let mut unexpectedly_succeeded = Vec::new();

    for demo in &error_demos {
        let output = temp_dir.path().join(format!(
            "error_{}.svg",
            demo.file_stem().unwrap().to_string_lossy()
        ));

        if run(&args(demo, output)).is_ok() {
            unexpectedly_succeeded.push(demo.clone());
        }
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError inventories that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error inventory(ies) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }
}

#[test]
fn e2e_json_output_carries_view_model() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("small_lab.json");

    run(&args(&demos_path().join("small_lab.json"), output.clone())).unwrap();

    let written = fs::read_to_string(&output).unwrap();
    let value: serde_json::Value = serde_json::from_str(&written).unwrap();

    assert_eq!(value["nodes"].as_array().unwrap().len(), 5);
    assert_eq!(value["edges"].as_array().unwrap().len(), 4);
    assert_eq!(value["simulating"], false);
    assert!(written.contains("172.31.128.1"));
    assert!(written.contains("localRackHDSocketLeft"));
}

#[test]
fn e2e_missing_input_fails() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let missing = temp_dir.path().join("nope.json");

    assert!(run(&args(&missing, temp_dir.path().join("out.svg"))).is_err());
}

#[test]
fn e2e_explicit_config_is_applied() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        "[layout]\nroot_name = \"compute-01\"\n\n[simulation]\nseed = 3\n",
    )
    .unwrap();

    let output = temp_dir.path().join("renamed_root.svg");
    let mut args = args(&demos_path().join("no_root.json"), output.clone());
    args.config = Some(config_path.to_string_lossy().to_string());

    run(&args).unwrap();

    let svg = fs::read_to_string(&output).unwrap();
    assert!(svg.contains("compute-01"));
    assert!(svg.contains("compute-02"));
}
