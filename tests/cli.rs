use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn write_scene() -> NamedTempFile {
    let scene = r##"<room background="#000000">
  <camera position="0 1.6 2"/>
  <point name="lamp" position="0 2 0" intensity="0" range="6"/>
  <material name="wood" color="#8b5a2b"/>
  <object name="floor" shape="box" size="4 0.2 4" material="wood"/>
  <object name="lamp-shade" shape="cone" radius="0.3" height="0.4" segments="12"
          position="0 1.5 0" material="wood" interactive="lamp" label="Lamp"/>
</room>
"##;
    let mut tmp = NamedTempFile::new().expect("temp scene");
    tmp.write_all(scene.as_bytes()).expect("write scene");
    tmp
}

#[test]
fn summary_lists_the_built_in_room() {
    let mut cmd = Command::cargo_bin("cozy-room").expect("binary exists");
    cmd.arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("Loaded room with"))
        .stdout(contains(" - cat-hitbox (box) [Cat (Pet me!)]"))
        .stdout(contains(" - lamp-shade (cone) [Lamp]"))
        .stdout(contains(
            " - lamp=off tv=off channel=1 computer=off seated=false pets=0",
        ));
}

#[test]
fn custom_scene_replaces_the_room() {
    let scene = write_scene();
    let mut cmd = Command::cargo_bin("cozy-room").expect("binary exists");
    cmd.arg("--scene").arg(scene.path()).arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("Loaded room with 2 objects (3 lights)"))
        .stdout(contains(" - floor (box)"))
        .stdout(contains(" - camera pos=(0.00, 1.60, 2.00)"))
        .stdout(contains("cat-hitbox").not());
}

#[test]
fn broken_scene_is_reported() {
    let mut scene = NamedTempFile::new().expect("temp scene");
    scene
        .write_all(br#"<room><object name="fridge" shape="box" interactive="fridge"/></room>"#)
        .expect("write scene");
    let mut cmd = Command::cargo_bin("cozy-room").expect("binary exists");
    cmd.arg("--scene").arg(scene.path()).arg("--summary-only");
    cmd.assert()
        .failure()
        .stderr(contains("failed to parse scene XML"));
}

#[test]
fn terminal_mode_runs_commands_from_stdin() {
    let mut cmd = assert_cmd::Command::cargo_bin("cozy-room").expect("binary exists");
    cmd.arg("--terminal").arg("--seed").arg("7");
    cmd.write_stdin("  HELP  \nfrobnicate\nexit\nhello\n");
    cmd.assert()
        .success()
        .stdout(contains("OS v1.0 - Welcome!"))
        .stdout(contains("$ help"))
        .stdout(contains("Unknown command: frobnicate"))
        .stdout(contains("$ exit"))
        .stdout(contains("$ hello").not());
}
