//! Shared fixtures for unit tests.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use crate::arch::Arch;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::process::{Invocation, ProcessOutput, ProcessRunner};
use crate::recipe::BuildSteps;

/// A runner that records invocations instead of executing them.
///
/// Clones share the same log, so a test can keep one handle while the
/// context owns another.
#[derive(Clone, Default)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<Invocation>>>,
    fail_on: Option<String>,
    output: Option<String>,
}

impl RecordingRunner {
    /// Fail every invocation whose rendered command line contains `needle`.
    pub fn failing_on(needle: &str) -> Self {
        Self {
            fail_on: Some(needle.to_string()),
            ..Self::default()
        }
    }

    /// Write `contents` to the `-o` path of every invocation before it
    /// succeeds or fails, the way a download tool leaves its output.
    pub fn writing_output(mut self, contents: &str) -> Self {
        self.output = Some(contents.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Rendered command lines, in call order.
    pub fn commands(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.to_string()).collect()
    }

    /// How many recorded command lines contain `needle`.
    pub fn count(&self, needle: &str) -> usize {
        self.commands().iter().filter(|c| c.contains(needle)).count()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        self.calls.lock().unwrap().push(invocation.clone());
        if let Some(contents) = &self.output {
            let target = invocation.args.iter().skip_while(|a| *a != "-o").nth(1);
            if let Some(target) = target {
                std::fs::write(target, contents).unwrap();
            }
        }
        let command = invocation.to_string();
        if let Some(needle) = &self.fail_on {
            if command.contains(needle.as_str()) {
                return Err(Error::ProcessFailed {
                    command,
                    exit_code: Some(1),
                    stdout: String::new(),
                    stderr: format!("simulated failure on '{}'", needle),
                });
            }
        }
        Ok(ProcessOutput::default())
    }
}

/// A context rooted in a fresh temporary directory, targeting `armeabi`.
pub fn test_context() -> (TempDir, Context) {
    let (temp, ctx, _) = recording_context(RecordingRunner::default());
    (temp, ctx)
}

/// Like [`test_context`], returning a handle on the runner's call log.
pub fn recording_context(runner: RecordingRunner) -> (TempDir, Context, RecordingRunner) {
    let temp = TempDir::new().unwrap();
    let archs = vec![Arch::from_name("armeabi").unwrap()];
    let ctx = Context::new(temp.path(), Box::new(runner.clone())).with_archs(archs);
    (temp, ctx, runner)
}

/// A [`BuildSteps`] implementation that only records which steps ran.
///
/// Entries look like `prebuild:sdl2:armeabi`, or `download:sdl2`.
pub struct FakeRecipe {
    name: String,
    log: Arc<Mutex<Vec<String>>>,
    built: bool,
    fail_step: Option<&'static str>,
}

impl FakeRecipe {
    pub fn new(name: &str, log: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.to_string(),
            log: Arc::clone(log),
            built: false,
            fail_step: None,
        }
    }

    /// Report the recipe as already built, so `should_build` is false.
    pub fn already_built(mut self) -> Self {
        self.built = true;
        self
    }

    pub fn failing_in(mut self, step: &'static str) -> Self {
        self.fail_step = Some(step);
        self
    }

    fn record(&self, step: &str, arch: Option<&Arch>) -> Result<()> {
        let entry = match arch {
            Some(arch) => format!("{}:{}:{}", step, self.name, arch.name),
            None => format!("{}:{}", step, self.name),
        };
        self.log.lock().unwrap().push(entry.clone());
        if self.fail_step == Some(step) {
            return Err(Error::ProcessFailed {
                command: entry,
                exit_code: Some(2),
                stdout: String::new(),
                stderr: "simulated failure".to_string(),
            });
        }
        Ok(())
    }
}

/// Entries of a shared step log that start with `prefix`.
pub fn entries(log: &Arc<Mutex<Vec<String>>>, prefix: &str) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|e| e.starts_with(prefix))
        .cloned()
        .collect()
}

impl BuildSteps for FakeRecipe {
    fn name(&self) -> &str {
        &self.name
    }

    fn download(&self, _ctx: &Context) -> Result<()> {
        self.record("download", None)
    }

    fn prepare_build_dir(&self, _ctx: &Context, arch: &Arch) -> Result<()> {
        self.record("unpack", Some(arch))
    }

    fn prebuild(&self, _ctx: &Context, arch: &Arch) -> Result<()> {
        self.record("prebuild", Some(arch))
    }

    fn apply_patches(&self, _ctx: &Context, arch: &Arch) -> Result<()> {
        self.record("patch", Some(arch))
    }

    fn should_build(&self, _ctx: &Context, _arch: &Arch) -> bool {
        !self.built
    }

    fn build(&self, _ctx: &Context, arch: &Arch) -> Result<()> {
        self.record("build", Some(arch))
    }

    fn postbuild(&self, _ctx: &Context, arch: &Arch) -> Result<()> {
        self.record("postbuild", Some(arch))
    }

    fn object_files_dir(&self, _ctx: &Context, _arch: &Arch) -> Option<PathBuf> {
        None
    }
}
