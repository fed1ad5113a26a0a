use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PARTITIONS: &str = "\
major minor  #blocks  name

   8        0  976762584 sda
   8       16  976762584 sdb
";

const TRACE: &str = "\
# tracer: nop
 kworker/0:1-12 [000] d.h1. 10.000100: block_rq_complete: 8,0 R () 2048 + 8 [0]
 kworker/0:1-12 [000] d.h1. 10.000200: block_rq_complete: 8,0 R () 2056 + 8 [0]
 kworker/1:1-13 [001] d.h1. 10.000300: block_rq_issue: 8,0 R 4096 () 2064 + 8 [fio]
 kworker/1:1-13 [001] d.h1. 10.000400: block_rq_complete: 8,0 W () 2064 + 8 [0]
 kworker/1:1-13 [001] d.h1. 10.000500: block_rq_complete: 8,0 WS () 9000 + 8 [0]
 kworker/0:1-12 [000] d.h1. 10.000600: block_rq_complete: 8,16 FWS () 0 + 0 [0]
 kworker/0:1-12 [000] d.h1. 10.000700: block_rq_complete: 259,0 R () 16 + 16 [0]
 kworker/0:1-12 [000] d.h1. 10.000800: block_rq_complete: 259,0 R () 512 + 16 [0]
";

fn fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("partitions"), PARTITIONS).unwrap();
    std::fs::write(dir.path().join("block.trace"), TRACE).unwrap();
    dir
}

fn biopattern(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("biopattern").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("BIOPATTERN_TRACEFS")
        .arg("--partitions")
        .arg(dir.join("partitions"))
        .arg("--replay")
        .arg(dir.join("block.trace"));
    cmd
}

#[test]
fn replay_reports_each_active_disk() {
    let dir = fixture();

    let output = biopattern(dir.path()).assert().success().get_output().clone();
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<_> = stdout.lines().collect();

    assert_eq!(lines.len(), 3, "{stdout}");
    assert!(lines[0].starts_with("TIME      DISK     %RND  %SEQ  %READ  %WRITE  %DISCARD  %FLUSH"));
    // the first sda completion only seeds it
    assert!(
        lines[1].ends_with("sda        33    67     33      67         0       0        3         12"),
        "{}",
        lines[1]
    );
    assert!(
        lines[2].ends_with("Unknown   100     0    100       0         0       0        1          8"),
        "{}",
        lines[2]
    );
}

#[test]
fn sync_variant_columns() {
    let dir = fixture();

    biopattern(dir.path())
        .args(["--variant", "sync", "--drain", "snapshot"])
        .assert()
        .success()
        .stdout(predicate::str::contains("%OTHER  %SYNC  %ASYNC"))
        .stdout(predicate::str::contains(
            "sda        33    67     33      67       0     33      67        3         12",
        ));
}

#[test]
fn disk_filter_resolves_under_dev_dir() {
    let dir = fixture();

    biopattern(dir.path())
        .arg("--dev-dir")
        .arg(dir.path())
        .args(["-d", "sdz"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("no such disk 'sdz'"));
}

#[test]
fn missing_partition_table_still_reports() {
    let dir = fixture();

    Command::cargo_bin("biopattern")
        .unwrap()
        .env_remove("RUST_LOG")
        .arg("--partitions")
        .arg(dir.path().join("missing"))
        .arg("--replay")
        .arg(dir.path().join("block.trace"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Unknown").count(2))
        .stderr(predicate::str::contains("unable to load device names"));
}

#[test]
fn replay_from_stdin() {
    let dir = fixture();

    Command::cargo_bin("biopattern")
        .unwrap()
        .arg("--partitions")
        .arg(dir.path().join("partitions"))
        .args(["--replay", "-", "1", "5"])
        .write_stdin(TRACE)
        .assert()
        .success()
        .stdout(predicate::str::contains("sda "));
}

#[test]
fn batch_drain_without_batch_ops_is_rejected() {
    let dir = fixture();

    biopattern(dir.path())
        .args(["--drain", "batch", "--no-batch-ops"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("batch draining was requested"));
}

#[test]
fn zero_count_is_a_usage_error() {
    Command::cargo_bin("biopattern")
        .unwrap()
        .args(["1", "0"])
        .assert()
        .code(2);
}
