//! Common test utilities for CLI testing.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Output;

use assert_cmd::Command;
use tempfile::{tempdir, TempDir};

/// Test context with an isolated project and home directory
pub struct TestContext {
    pub project_dir: TempDir,
    pub home_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            project_dir: tempdir().expect("Failed to create project dir"),
            home_dir: tempdir().expect("Failed to create home dir"),
        }
    }

    /// Write `.gitcompass/config.yaml` in the project
    pub fn with_config(self, config: &str) -> Self {
        let path = self.path().join(".gitcompass/config.yaml");
        std::fs::create_dir_all(path.parent().unwrap()).expect("Failed to create config dir");
        std::fs::write(&path, config).expect("Failed to write config");
        self
    }

    /// Write a project-local template
    pub fn with_template(self, category: &str, file_name: &str, content: &str) -> Self {
        let dir = self.project_templates().join(category);
        std::fs::create_dir_all(&dir).expect("Failed to create template dir");
        std::fs::write(dir.join(file_name), content).expect("Failed to write template");
        self
    }

    /// Get path to the project directory
    pub fn path(&self) -> &Path {
        self.project_dir.path()
    }

    pub fn project_templates(&self) -> PathBuf {
        self.path().join(".gitcompass/templates")
    }

    pub fn user_templates(&self) -> PathBuf {
        self.home_dir.path().join(".gitcompass/templates")
    }

    /// Templates packaged with the repository
    pub fn builtin_templates() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates")
    }

    /// Create a command configured for this context
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("gitcompass").expect("Binary not found");
        cmd.current_dir(self.path())
            .env("HOME", self.home_dir.path())
            .env("GITCOMPASS_BUILTIN_TEMPLATES", Self::builtin_templates())
            .env_remove("GITCOMPASS_CONFIG")
            .env_remove("GITCOMPASS_LOG")
            .env_remove("GITCOMPASS_LOG_FORMAT")
            .env("NO_COLOR", "1");
        cmd
    }

    /// Run `gitcompass templates <args>` and capture the output
    pub fn templates(&self, args: &[&str]) -> Output {
        self.command()
            .arg("templates")
            .args(args)
            .output()
            .expect("Failed to run gitcompass")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Assert helpers for CLI output
pub trait OutputAssertions {
    fn assert_success(&self);
    fn assert_stdout_contains(&self, text: &str);
    fn assert_stderr_contains(&self, text: &str);
    fn assert_exit_code(&self, code: i32);
}

impl OutputAssertions for Output {
    fn assert_success(&self) {
        assert!(
            self.status.success(),
            "Command failed with status: {}\nstderr: {}",
            self.status,
            String::from_utf8_lossy(&self.stderr)
        );
    }

    fn assert_stdout_contains(&self, text: &str) {
        let stdout = String::from_utf8_lossy(&self.stdout);
        assert!(
            stdout.contains(text),
            "stdout did not contain '{}'\nstdout: {}",
            text,
            stdout
        );
    }

    fn assert_stderr_contains(&self, text: &str) {
        let stderr = String::from_utf8_lossy(&self.stderr);
        assert!(
            stderr.contains(text),
            "stderr did not contain '{}'\nstderr: {}",
            text,
            stderr
        );
    }

    fn assert_exit_code(&self, code: i32) {
        assert_eq!(
            self.status.code(),
            Some(code),
            "Expected exit code {}, got {:?}\nstderr: {}",
            code,
            self.status.code(),
            String::from_utf8_lossy(&self.stderr)
        );
    }
}

/// JSON output assertions
pub mod json {
    use serde_json::Value;

    pub fn parse_output(output: &[u8]) -> Value {
        serde_json::from_slice(output).expect("Failed to parse JSON output")
    }
}
