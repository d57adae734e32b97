//! Script loading from a directory through the runtime.

use std::fs;

use nestor::prelude::*;
use nestor::runtime::config::RobotConfig;

fn greet(robot: &Robot) -> RegisterResult {
    robot.respond_async(r"hello(?: (\w+))?", |res| async move {
        let name = res.captures().get(1).unwrap_or("stranger").to_string();
        res.reply([format!("hello, {name}")]).await.ok();
    })
}

script!("greet", greet);

fn runtime_for(dir: &std::path::Path) -> NestorRuntime {
    NestorRuntime::from_config(NestorConfig {
        robot: RobotConfig {
            team_id: "T1".into(),
            debug_mode: true,
            scripts_dir: Some(dir.to_path_buf()),
            ..Default::default()
        },
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn compiled_in_script_is_selected_by_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("greet.coffee"), "").unwrap();

    let runtime = runtime_for(dir.path());
    assert_eq!(runtime.load_scripts().unwrap(), 1);

    runtime.receive(Message::new("nestor hello ada")).await;
    runtime.receive(Message::new("nestor: hello")).await;

    assert_eq!(
        runtime.robot().replies(),
        vec!["hello, ada", "hello, stranger"]
    );
}

#[tokio::test]
async fn malformed_scripts_do_not_stop_loading() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a-missing.js", "greet.js", "z-missing.js"] {
        fs::write(dir.path().join(name), "").unwrap();
    }

    let mut runtime = runtime_for(dir.path());
    runtime.scripts_mut().register("z-missing", |robot: &Robot| {
        robot.hear("[unclosed", |_res, done| done.complete())
    });

    assert_eq!(runtime.load_scripts().unwrap(), 1);
    assert_eq!(runtime.robot().listener_count(), 1);
}

#[test]
fn unselected_scripts_stay_inactive() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = runtime_for(dir.path());

    assert_eq!(runtime.load_scripts().unwrap(), 0);
    assert_eq!(runtime.robot().listener_count(), 0);
}
