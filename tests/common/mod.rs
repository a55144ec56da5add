#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestEnv {
    _tmp: TempDir,
    pub config: PathBuf,
}

impl TestEnv {
    pub fn new(base_url: &str) -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let config = tmp.path().join("config.yaml");
        fs::write(
            &config,
            format!(
                "base_url: {}\n\
                 ProjectUnderTest: Demo\n\
                 ReviewUnderTest: Dailies\n\
                 ItemUnderTest: shot_010\n\
                 timeout_secs: 5\n",
                base_url
            ),
        )
        .expect("write config");

        Self { _tmp: tmp, config }
    }

    /// The binary with credentials set and `--config` pointing at the fixture.
    pub fn cmd(&self) -> Command {
        let mut cmd = self.bare_cmd();
        cmd.arg("--config").arg(&self.config);
        cmd
    }

    pub fn bare_cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("syncsketch-dump").expect("binary is built");
        cmd.env_remove("RUST_LOG")
            .env("ss_username", "me@example.com")
            .env("ss_api_key", "s3cret");
        cmd
    }
}

pub fn guidance(what: &str, var: &str) -> String {
    format!(
        "\nPlease export your Syncsketch {} as an environment variable called \"{}\"\n\n",
        what, var
    )
}
