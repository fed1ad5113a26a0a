use std::process::Command;

use chrono::prelude::*;

pub fn main() {
    // Set BIOPATTERN_BUILD_GIT_HASH
    let git_hash = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .unwrap_or_default();
    println!("cargo:rustc-env=BIOPATTERN_BUILD_GIT_HASH={git_hash}");

    if git_hash.len() > 7 {
        println!(
            "cargo:rustc-env=BIOPATTERN_BUILD_GIT_HASH_SHORT={}",
            &git_hash[..7]
        );
    } else {
        println!("cargo:rustc-env=BIOPATTERN_BUILD_GIT_HASH_SHORT=???????");
    }

    let utc: DateTime<Utc> = Utc::now();
    let date = utc.format("%Y-%m-%d").to_string();
    println!("cargo:rustc-env=BIOPATTERN_BUILD_DATE={date}");
}
