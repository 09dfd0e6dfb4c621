//! Shared test infrastructure for integration tests.
//!
//! A fixture is a temp project root with stand-in prover and build programs
//! that append their argv to a log instead of doing any work.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub struct SessionFixture {
    pub dir: TempDir,
    pub log: PathBuf,
}

impl SessionFixture {
    /// Create a project root with tool stand-ins and a `session.json`
    /// pointing at them. A prover invocation whose argv contains `fail_on`
    /// exits with status 3.
    pub fn new(fail_on: Option<&str>) -> anyhow::Result<Self> {
        let dir = TempDir::new()?;
        let tools = dir.path().join("tools");
        fs::create_dir_all(&tools)?;
        let log = dir.path().join("tools.log");

        let fail_clause = fail_on
            .map(|needle| format!("case \"$*\" in *{needle}*) exit 3;; esac\n"))
            .unwrap_or_default();
        let prover = tools.join("gnatprove");
        write_script(
            &prover,
            &format!(
                "#!/bin/sh\n\
                 workspace=no\n\
                 if [ -f sparklib_gen.gpr ] && [ -d src2 ]; then workspace=yes; fi\n\
                 echo \"gnatprove $* installed=$SPARKLIB_INSTALLED workspace=$workspace\" >> \"{}\"\n\
                 {fail_clause}exit 0\n",
                log.display()
            ),
        )?;
        let build = tools.join("make");
        write_script(
            &build,
            &format!(
                "#!/bin/sh\necho \"make $*\" >> \"{}\"\nexit 0\n",
                log.display()
            ),
        )?;

        let config = serde_json::json!({
            "prover_program": prover.display().to_string(),
            "build_program": build.display().to_string(),
        });
        fs::write(
            dir.path().join("session.json"),
            serde_json::to_vec_pretty(&config)?,
        )?;
        fs::create_dir_all(dir.path().join("src"))?;
        fs::create_dir_all(dir.path().join("proof"))?;

        Ok(Self { dir, log })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directory");
        }
        fs::write(path, contents).expect("write fixture file");
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.root().join(rel)).expect("read fixture file")
    }

    /// Run the binary against this fixture's root.
    pub fn run(&self, extra: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_prove-session"))
            .arg("--root")
            .arg(self.root())
            .args(extra)
            .env_remove("SPARKLIB_INSTALLED")
            .env("SPARKLIB_BODY_MODE", "On")
            .env("RUST_LOG", "info")
            .output()
            .expect("run prove-session")
    }

    /// Commands the stand-ins saw, in order.
    pub fn logged_commands(&self) -> Vec<String> {
        match fs::read_to_string(&self.log) {
            Ok(text) => text.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }
}

fn write_script(path: &Path, body: &str) -> anyhow::Result<()> {
    fs::write(path, body)?;
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions)?;
    Ok(())
}
