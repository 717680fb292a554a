//! Toolchain Runner
//!
//! Command construction and execution for the Vulkan SDK tools (`dxc`,
//! `glslang`, `spirv-cross`). Converters build a [`ToolInvocation`] and hand
//! it to a [`ToolchainRunner`]; tests substitute a runner that records the
//! invocation instead of spawning anything.

use core::fmt;
use std::env;
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use crate::error::{TranspileError, TranspileResult};
use crate::scratch::ScratchSpace;

// ============================================================================
// Configuration
// ============================================================================

/// Environment variable holding the SDK root
pub const SDK_ENV_VAR: &str = "VULKAN_SDK";

/// SDK root used when the environment variable is absent
pub const DEFAULT_SDK_ROOT: &str = "C:/VulkanSDK/default";

/// Default hard limit on a single tool run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Minimum wait for captured output once the tool has exited
const OUTPUT_GRACE: Duration = Duration::from_millis(100);

/// External tool
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tool {
    /// DirectX shader compiler, used as HLSL validator
    Dxc,
    /// GLSL to SPIR-V assembler
    Glslang,
    /// SPIR-V to Metal cross-compiler
    SpirvCross,
}

impl Tool {
    /// Executable name without extension
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Dxc => "dxc",
            Self::Glslang => "glslang",
            Self::SpirvCross => "spirv-cross",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the tools live and how long they may run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolchainConfig {
    /// SDK root; tools are looked up in `<sdk_root>/Bin`
    pub sdk_root: PathBuf,
    /// Hard timeout per tool run, `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl ToolchainConfig {
    /// Creates a config rooted at `sdk_root`
    pub fn new(sdk_root: impl Into<PathBuf>) -> Self {
        Self {
            sdk_root: sdk_root.into(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Resolves the SDK root from [`SDK_ENV_VAR`]
    pub fn from_env() -> Self {
        Self::from_sdk_var(env::var_os(SDK_ENV_VAR))
    }

    /// Resolves the SDK root from an already-read variable value
    pub fn from_sdk_var(value: Option<OsString>) -> Self {
        match value {
            Some(root) if !root.is_empty() => Self::new(root),
            _ => Self::new(DEFAULT_SDK_ROOT),
        }
    }

    /// Sets the timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Directory holding the tool executables
    pub fn bin_dir(&self) -> PathBuf {
        self.sdk_root.join("Bin")
    }

    /// Full path of a tool executable
    pub fn tool_path(&self, tool: Tool) -> PathBuf {
        self.bin_dir()
            .join(format!("{}{}", tool.name(), env::consts::EXE_SUFFIX))
    }

    /// `dxc -T <profile> -E main <hlsl>`
    pub fn dxc(&self, profile: &str, hlsl: &Path) -> ToolInvocation {
        ToolInvocation::new(Tool::Dxc, self.tool_path(Tool::Dxc))
            .arg("-T")
            .arg(profile)
            .arg("-E")
            .arg("main")
            .arg(hlsl.display().to_string())
    }

    /// `glslang -V <glsl> -o <spv>`
    pub fn glslang(&self, glsl: &Path, spv: &Path) -> ToolInvocation {
        ToolInvocation::new(Tool::Glslang, self.tool_path(Tool::Glslang))
            .arg("-V")
            .arg(glsl.display().to_string())
            .arg("-o")
            .arg(spv.display().to_string())
    }

    /// `spirv-cross -V <spv> -o <metal>`
    pub fn spirv_cross(&self, spv: &Path, metal: &Path) -> ToolInvocation {
        ToolInvocation::new(Tool::SpirvCross, self.tool_path(Tool::SpirvCross))
            .arg("-V")
            .arg(spv.display().to_string())
            .arg("-o")
            .arg(metal.display().to_string())
    }
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SDK_ROOT)
    }
}

// ============================================================================
// Invocation & Output
// ============================================================================

/// One tool command line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Tool being run
    pub tool: Tool,
    /// Executable path
    pub program: PathBuf,
    /// Arguments, in order
    pub args: Vec<String>,
}

impl ToolInvocation {
    /// Creates an invocation without arguments
    pub fn new(tool: Tool, program: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends an argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Shell-style rendering, for logs
    pub fn command_line(&self) -> String {
        let mut line = format!("\"{}\"", self.program.display());
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// What a finished tool run left behind
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when terminated by a signal
    pub exit_code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ToolOutput {
    /// Output with the given exit code and no captured text
    pub fn exited(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Self::default()
        }
    }

    /// Exit code 0
    #[inline]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Best diagnostic text: stderr, falling back to stdout
    pub fn diagnostics(&self) -> &str {
        if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }

    /// Maps a non-zero exit to [`TranspileError::Toolchain`]
    pub fn check(self, tool: Tool) -> TranspileResult<()> {
        if self.success() {
            return Ok(());
        }
        Err(TranspileError::Toolchain {
            tool,
            status: self.exit_code,
            diagnostics: self.diagnostics().to_string(),
        })
    }
}

// ============================================================================
// Runners
// ============================================================================

/// Executes tool invocations
pub trait ToolchainRunner {
    /// Runs the tool to completion
    fn run(&self, invocation: &ToolInvocation) -> TranspileResult<ToolOutput>;
}

impl<R: ToolchainRunner + ?Sized> ToolchainRunner for &R {
    fn run(&self, invocation: &ToolInvocation) -> TranspileResult<ToolOutput> {
        (**self).run(invocation)
    }
}

impl<R: ToolchainRunner + ?Sized> ToolchainRunner for Box<R> {
    fn run(&self, invocation: &ToolInvocation) -> TranspileResult<ToolOutput> {
        (**self).run(invocation)
    }
}

/// Runs tools as child processes
///
/// Blocks the calling thread until the tool exits or the timeout fires. On
/// timeout the child is killed and the call returns at once, even when
/// processes the tool spawned still hold its output pipes.
#[derive(Clone, Debug, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    /// Creates a runner with a hard timeout
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Creates a runner using the config's timeout
    pub fn from_config(config: &ToolchainConfig) -> Self {
        Self::new(config.timeout)
    }

    /// Configured timeout
    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl ToolchainRunner for ProcessRunner {
    fn run(&self, invocation: &ToolInvocation) -> TranspileResult<ToolOutput> {
        let tool = invocation.tool;
        debug!("running {}", invocation.command_line());

        let deadline = self.timeout.map(|limit| (Instant::now() + limit, limit));
        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| TranspileError::Process { tool, source })?;

        // Readers are detached; an early return drops the receivers and
        // leaves each thread to finish whenever its pipe closes.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let status = wait(&mut child, tool, deadline)?;

        let output_deadline = deadline.map(|(at, _)| at.max(Instant::now() + OUTPUT_GRACE));
        let stdout = collect(&stdout, output_deadline);
        let stderr = collect(&stderr, output_deadline);

        debug!("{} exited with {:?}", tool, status.code());
        Ok(ToolOutput {
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

fn drain<P: Read + Send + 'static>(pipe: Option<P>) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut text = String::new();
        if let Some(mut pipe) = pipe {
            let mut bytes = Vec::new();
            if pipe.read_to_end(&mut bytes).is_ok() {
                text = String::from_utf8_lossy(&bytes).into_owned();
            }
        }
        let _ = tx.send(text);
    });
    rx
}

/// Captured text, or empty when the pipe is still held open at `deadline`
fn collect(output: &Receiver<String>, deadline: Option<Instant>) -> String {
    match deadline {
        Some(at) => output
            .recv_timeout(at.saturating_duration_since(Instant::now()))
            .unwrap_or_default(),
        None => output.recv().unwrap_or_default(),
    }
}

fn wait(
    child: &mut Child,
    tool: Tool,
    deadline: Option<(Instant, Duration)>,
) -> TranspileResult<ExitStatus> {
    let Some((at, limit)) = deadline else {
        return child
            .wait()
            .map_err(|source| TranspileError::Process { tool, source });
    };

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {},
            Err(source) => return Err(TranspileError::Process { tool, source }),
        }
        if Instant::now() >= at {
            let _ = child.kill();
            let _ = child.wait();
            return Err(TranspileError::Timeout { tool, after: limit });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

// ============================================================================
// Session
// ============================================================================

/// What a converter needs to reach the toolchain for one call
#[derive(Debug)]
pub struct ToolchainSession<'a, R: ?Sized> {
    config: &'a ToolchainConfig,
    runner: &'a R,
    scratch_dir: &'a Path,
}

impl<'a, R: ToolchainRunner + ?Sized> ToolchainSession<'a, R> {
    /// Bundles config, runner and scratch directory
    pub fn new(config: &'a ToolchainConfig, runner: &'a R, scratch_dir: &'a Path) -> Self {
        Self {
            config,
            runner,
            scratch_dir,
        }
    }

    /// Toolchain configuration
    #[inline]
    pub fn config(&self) -> &'a ToolchainConfig {
        self.config
    }

    /// Allocates scratch files for one conversion
    pub fn scratch(&self) -> TranspileResult<ScratchSpace> {
        ScratchSpace::new(self.scratch_dir)
    }

    /// Runs a tool and requires exit code 0
    pub fn run(&self, invocation: &ToolInvocation) -> TranspileResult<()> {
        self.runner.run(invocation)?.check(invocation.tool)
    }
}
