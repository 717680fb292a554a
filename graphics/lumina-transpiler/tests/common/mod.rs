//! Shared test doubles

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use lumina_transpiler::spirv::{words_to_bytes, SPIRV_MAGIC};
use lumina_transpiler::{
    ShaderTranspiler, Tool, ToolInvocation, ToolOutput, ToolchainConfig, ToolchainRunner,
    TranspileResult, TranspilerConfig,
};
use tempfile::TempDir;

pub const VERTEX: &str = "#version 330 core
layout(location = 0) in vec3 aPos;
layout(location = 2) in vec3 normal;
uniform mat4 model;
uniform mat4 view;
out vec3 vNormal;
void main()
{
    vNormal = normal;
    gl_Position = vec4(aPos, 1.0);
}
";

pub const FRAGMENT: &str = "#version 330 core
in vec3 vNormal;
uniform vec3 tint;
void main()
{
    gl_FragColor = vec4(vNormal * tint, 1.0);
}
";

pub const METAL_SOURCE: &str = "#include <metal_stdlib>\nusing namespace metal;\n";

/// Module glslang would have written
pub fn spirv_module() -> Vec<u32> {
    vec![SPIRV_MAGIC, 0x0001_0000, 0x0008_000b, 12, 0, 0x0002_0011, 1]
}

/// Records invocations and fakes the artifacts of each tool
#[derive(Debug, Default)]
pub struct FakeRunner {
    calls: Mutex<Vec<ToolInvocation>>,
    exit_codes: HashMap<Tool, i32>,
    arg_exit_codes: HashMap<String, i32>,
    skip_artifacts: bool,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `tool` exit with `code`
    pub fn failing(mut self, tool: Tool, code: i32) -> Self {
        self.exit_codes.insert(tool, code);
        self
    }

    /// Makes any invocation carrying `arg` exit with `code`
    pub fn failing_on_arg(mut self, arg: &str, code: i32) -> Self {
        self.arg_exit_codes.insert(arg.to_string(), code);
        self
    }

    /// Exit 0 without writing any output file
    pub fn without_artifacts(mut self) -> Self {
        self.skip_artifacts = true;
        self
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn tools(&self) -> Vec<Tool> {
        self.calls().iter().map(|c| c.tool).collect()
    }
}

impl ToolchainRunner for FakeRunner {
    fn run(&self, invocation: &ToolInvocation) -> TranspileResult<ToolOutput> {
        self.calls.lock().unwrap().push(invocation.clone());

        let code = invocation
            .args
            .iter()
            .find_map(|arg| self.arg_exit_codes.get(arg).copied())
            .or_else(|| self.exit_codes.get(&invocation.tool).copied())
            .unwrap_or(0);
        if code != 0 {
            return Ok(ToolOutput {
                exit_code: Some(code),
                stdout: String::new(),
                stderr: format!("{} rejected the input", invocation.tool),
            });
        }

        if !self.skip_artifacts {
            let output = invocation
                .args
                .iter()
                .position(|arg| arg == "-o")
                .map(|i| Path::new(&invocation.args[i + 1]).to_path_buf());
            match (invocation.tool, output) {
                (Tool::Glslang, Some(path)) => {
                    fs::write(path, words_to_bytes(&spirv_module())).unwrap();
                },
                (Tool::SpirvCross, Some(path)) => {
                    fs::write(path, METAL_SOURCE).unwrap();
                },
                _ => {},
            }
        }
        Ok(ToolOutput::exited(0))
    }
}

/// Transpiler over `runner` with an isolated scratch directory
pub fn transpiler(runner: &FakeRunner) -> (ShaderTranspiler<&FakeRunner>, TempDir) {
    let _ = env_logger::builder().is_test(true).try_init();
    let scratch = tempfile::tempdir().unwrap();
    let config = TranspilerConfig::default()
        .with_toolchain(ToolchainConfig::new("/sdk"))
        .with_scratch_dir(scratch.path());
    (ShaderTranspiler::with_runner(config, runner), scratch)
}
