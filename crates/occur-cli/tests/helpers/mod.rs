#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test harness running the binary inside a temporary working directory
pub struct CliTestHarness {
    temp_dir: TempDir,
}

impl CliTestHarness {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        Self { temp_dir }
    }

    /// Command with a clean environment: no config overrides, no log noise
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("occur").expect("Failed to find occur binary");
        cmd.current_dir(self.temp_dir.path());
        for (key, _) in std::env::vars() {
            if key.starts_with("OCCUR_") {
                cmd.env_remove(key);
            }
        }
        cmd
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `content` to `name` inside the working directory
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write test file");
        path
    }

    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }
}

/// Common test fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// Events around June 2024: a weekly Monday/Thursday session anchored in
    /// May, a one-off in the window, a one-off outside it, a daily rule that
    /// ran out in May and a record with a corrupt rule.
    pub fn events_json() -> &'static str {
        r#"[
            {
                "id": "0190b7d2-4c4e-7a3b-9f00-000000000001",
                "title": "Track session",
                "dateTime": "2024-05-06T18:00:00",
                "durationMinutes": 90,
                "location": "Paris",
                "capacity": 20,
                "recurrence": "FREQ=WEEKLY;BYDAY=MO,TH",
                "organizerId": "0190b7d2-4c4e-7a3b-9f00-0000000000ff",
                "activityTypes": ["Running"]
            },
            {
                "id": "0190b7d2-4c4e-7a3b-9f00-000000000002",
                "title": "Charity 10k",
                "dateTime": "2024-06-05T09:00:00",
                "durationMinutes": 120,
                "location": "Paris",
                "capacity": 500,
                "organizerId": "0190b7d2-4c4e-7a3b-9f00-0000000000ff",
                "activityTypes": ["Running"]
            },
            {
                "id": "0190b7d2-4c4e-7a3b-9f00-000000000003",
                "title": "Summer hike",
                "dateTime": "2024-08-20T07:00:00",
                "durationMinutes": 300,
                "location": "Lyon",
                "capacity": 12,
                "organizerId": "0190b7d2-4c4e-7a3b-9f00-0000000000ff",
                "activityTypes": ["Hiking"]
            },
            {
                "id": "0190b7d2-4c4e-7a3b-9f00-000000000004",
                "title": "Spring bootcamp",
                "dateTime": "2024-05-01T07:00:00",
                "durationMinutes": 45,
                "location": "Paris",
                "capacity": 15,
                "recurrence": "FREQ=DAILY;COUNT=10",
                "organizerId": "0190b7d2-4c4e-7a3b-9f00-0000000000ff",
                "activityTypes": ["Fitness"]
            },
            {
                "id": "0190b7d2-4c4e-7a3b-9f00-000000000005",
                "title": "Corrupt record",
                "dateTime": "2024-06-02T10:00:00",
                "durationMinutes": 60,
                "location": "Paris",
                "capacity": 10,
                "recurrence": "FREQ=FORTNIGHTLY",
                "organizerId": "0190b7d2-4c4e-7a3b-9f00-0000000000ff",
                "activityTypes": ["Running"]
            }
        ]"#
    }
}
