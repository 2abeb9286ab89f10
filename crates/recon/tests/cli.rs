use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const POOL: &str = "0xaAaAaAaaAaAaAaaAaAAAAAAAAaaaAaAaAaaAaaAa";
const ROUTER: &str = "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB";
const ZERO: &str = "0x0000000000000000000000000000000000000000";

fn write_session(data_dir: &Path, name: &str, address: &str, external: Option<Value>) {
    let directory = data_dir
        .join("sessions")
        .join(format!("mainet:{address}:{name}"));
    fs::create_dir_all(&directory).unwrap();

    let mut contract_data = serde_json::json!({
        "all_library_calls": [],
        "all_external_calls": [],
    });
    if let Some(external) = external {
        contract_data["external_addresses"] = external;
    }
    let session = serde_json::json!({
        "network_info": {
            "contract_name": name,
            "contract_address": address,
            "contract_network": "mainet",
            "data_directory": directory.display().to_string(),
        },
        "contract_data": contract_data,
        "functions_data": [],
        "variables_data": [],
    });
    fs::write(
        directory.join("sessionData.json"),
        serde_json::to_string_pretty(&session).unwrap(),
    )
    .unwrap();
}

fn recon(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("recon").expect("cargo bin recon");
    cmd.arg("--data-dir").arg(data_dir);
    cmd
}

#[test]
fn list_reports_session_status() {
    let temp_dir = TempDir::new().expect("temp data dir");
    write_session(temp_dir.path(), "Pool", POOL, Some(serde_json::json!({ "router": ROUTER })));
    write_session(temp_dir.path(), "Router", ROUTER, None);
    fs::create_dir_all(temp_dir.path().join("sessions").join(format!("mainet:{ZERO}"))).unwrap();

    recon(temp_dir.path())
        .args(["list", "--header"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Sessions:"))
        .stdout(predicate::str::contains(format!("mainet:{POOL}:Pool\tmapped")))
        .stdout(predicate::str::contains(format!("mainet:{ROUTER}:Router\tanalyzed")))
        .stdout(predicate::str::contains(format!("mainet:{ZERO}\tincomplete")));
}

#[test]
fn graph_json_reports_mutual_dependencies() {
    let temp_dir = TempDir::new().expect("temp data dir");
    write_session(temp_dir.path(), "Pool", POOL, Some(serde_json::json!({ "router": ROUTER, "burn": ZERO })));
    write_session(temp_dir.path(), "Router", ROUTER, Some(serde_json::json!({ "pool": POOL })));

    let output = recon(temp_dir.path())
        .args(["graph", "--json", "--exclude-zero"])
        .output()
        .expect("run recon graph");
    assert!(output.status.success());

    let body: Value = serde_json::from_slice(&output.stdout).expect("graph JSON");
    assert_eq!(body["graph"]["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(body["statistics"]["node_count"], 2);
    assert_eq!(body["statistics"]["strongly_connected_components"][0]["size"], 2);
    assert_eq!(body["statistics"]["cluster_strength"], 2.0);
}

#[test]
fn graph_writes_node_link_file() {
    let temp_dir = TempDir::new().expect("temp data dir");
    write_session(temp_dir.path(), "Pool", POOL, Some(serde_json::json!({ "router": ROUTER })));
    let output_path = temp_dir.path().join("protocol.json");

    recon(temp_dir.path())
        .arg("graph")
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Nodes:            2"));

    let node_link: Value =
        serde_json::from_str(&fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(node_link["directed"], true);
    assert_eq!(node_link["links"].as_array().unwrap().len(), 1);
}

#[test]
fn index_writes_address_index() {
    let temp_dir = TempDir::new().expect("temp data dir");
    write_session(temp_dir.path(), "Pool", POOL, None);

    recon(temp_dir.path()).arg("index").assert().success();

    let index = fs::read_to_string(temp_dir.path().join("address_index.json")).unwrap();
    assert!(index.contains(POOL));
}

#[test]
fn crawl_rejects_unsupported_level() {
    let temp_dir = TempDir::new().expect("temp data dir");

    recon(temp_dir.path())
        .args(["crawl", "--level", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported crawl level 2"));
}

#[test]
fn crawl_over_known_dependencies_dispatches_nothing() {
    let temp_dir = TempDir::new().expect("temp data dir");
    write_session(temp_dir.path(), "Pool", POOL, Some(serde_json::json!({ "router": ROUTER, "burn": ZERO })));
    write_session(temp_dir.path(), "Router", ROUTER, Some(serde_json::json!({})));

    // Nothing listens on the discard port; any dispatch would be recorded as a failure.
    let output = recon(temp_dir.path())
        .args(["crawl", "--level", "1", "--json", "--dispatch-url", "http://127.0.0.1:9"])
        .output()
        .expect("run recon crawl");
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).expect("crawl JSON");
    assert_eq!(report["dispatched"].as_array().unwrap().len(), 0);
    assert_eq!(report["failures"].as_array().unwrap().len(), 0);
    assert!(!temp_dir.path().join("fails.jsonl").exists());
}

#[test]
fn map_unknown_target_fails() {
    let temp_dir = TempDir::new().expect("temp data dir");

    recon(temp_dir.path())
        .args(["map", POOL, "--rpc-url", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No session found"));
}
