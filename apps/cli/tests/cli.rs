use std::error::Error;
use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cli(workspace: &Path) -> Result<Command, Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("voyagelog")?;
    cmd.current_dir(workspace).env_remove("RUST_LOG");
    Ok(cmd)
}

fn long_body(lines: usize) -> String {
    (1..=lines)
        .map(|n| format!("Day {n}: the lookout reports nothing but open water."))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn empty_workspace_paginates_to_one_blank_page() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    cli(dir.path())?
        .args(["paginate", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""""#));
    Ok(())
}

#[test]
fn paginate_reports_each_page() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("body.txt");
    fs::write(&input, long_body(90))?;

    cli(dir.path())?
        .args(["paginate", "--input", "body.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 page(s)"))
        .stdout(predicate::str::contains("Page 3:"));
    Ok(())
}

#[test]
fn draft_set_persists_between_runs() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    cli(dir.path())?
        .args(["draft", "set", "title", "Storm at Dawn"])
        .assert()
        .success();
    cli(dir.path())?
        .args(["draft", "set", "mode", "skirmish"])
        .assert()
        .success();

    assert!(dir.path().join(".voyagelog").join("draft.json").exists());

    let output = cli(dir.path())?.args(["draft", "show"]).output()?;
    assert!(output.status.success());
    let draft: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(draft["title"], "Storm at Dawn");
    assert_eq!(draft["mode"], "skirmish");
    Ok(())
}

#[test]
fn invalid_mode_is_rejected() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    cli(dir.path())?
        .args(["draft", "set", "mode", "voyage"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("mode must be"));
    Ok(())
}

#[test]
fn sample_draft_renders_a_message() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    cli(dir.path())?
        .args(["draft", "load-sample", "--mode", "patrol"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded sample patrol log"));

    cli(dir.path())?
        .arg("message")
        .assert()
        .success()
        .stdout(predicate::str::contains("Test Patrol Title"))
        .stdout(predicate::str::contains("Capt. Test"));

    cli(dir.path())?
        .args(["message", "--format", "Saber"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Unknown format 'Saber', using Standard"));
    Ok(())
}

#[test]
fn message_list_names_each_format() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    cli(dir.path())?
        .args(["message", "--list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Standard\tStandard"))
        .stdout(predicate::str::contains("Trigs\tTrig's Format"));
    Ok(())
}

#[test]
fn reset_keeps_mode() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    cli(dir.path())?
        .args(["draft", "load-sample", "--mode", "skirmish"])
        .assert()
        .success();
    cli(dir.path())?.args(["draft", "reset"]).assert().success();

    let output = cli(dir.path())?.args(["draft", "show"]).output()?;
    let draft: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(draft["mode"], "skirmish");
    assert_eq!(draft["title"], "");
    Ok(())
}

#[test]
fn export_writes_one_file_per_page() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("body.txt"), long_body(60))?;
    cli(dir.path())?
        .args(["draft", "set", "body", "--file", "body.txt"])
        .assert()
        .success();
    cli(dir.path())?
        .args(["draft", "set", "title", "Night Watch"])
        .assert()
        .success();

    cli(dir.path())?
        .args(["export", "--kind", "all", "--out", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 of 2 page(s) as pdf"))
        .stdout(predicate::str::contains("Exported 2 of 2 page(s) as png"));

    let out = dir.path().join("out");
    for number in 1..=2 {
        let pdf = fs::read(out.join(format!("Night-Watch_page{number}.pdf")))?;
        assert!(pdf.starts_with(b"%PDF"));
        let png = image::open(out.join(format!("Night-Watch_page{number}.png")))?;
        assert_eq!((png.width(), png.height()), (1632, 2112));
    }
    Ok(())
}

#[test]
fn preferences_round_trip_through_files() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    cli(dir.path())?
        .args(["preferences", "export", "--output", "prefs.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported preferences to"));

    let exported = fs::read_to_string(dir.path().join("prefs.json"))?;
    let mut prefs: serde_json::Value = serde_json::from_str(&exported)?;
    prefs["message_format"] = serde_json::Value::from("Trigs");
    fs::write(dir.path().join("prefs.json"), serde_json::to_string(&prefs)?)?;

    cli(dir.path())?
        .args(["preferences", "import", "prefs.json"])
        .assert()
        .success();
    assert!(dir.path().join(".voyagelog").join("preferences.json").exists());

    cli(dir.path())?
        .args(["preferences", "import", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
    Ok(())
}
