//! Transpiler Facade
//!
//! Public entry point. Validates input, dispatches to the converter for the
//! requested target and turns every error, including panics inside a
//! converter, into a failed [`TranspilationResult`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use log::{error, info};

use crate::error::{TranspileError, TranspileResult};
use crate::extract;
use crate::hlsl;
use crate::metal;
use crate::rewrite::MulRewrite;
use crate::scratch::DEFAULT_SCRATCH_DIR;
use crate::toolchain::{ProcessRunner, ToolchainConfig, ToolchainRunner, ToolchainSession};
use crate::types::{ShaderStage, ShaderTarget, TranspilationResult, UniformBinding, VertexAttribute};
use crate::vulkan;

/// Section banner preceding the vertex output of a combined program
pub const VERTEX_BANNER: &str = "// === VERTEX SHADER ===\n";

/// Section banner preceding the fragment output of a combined program
pub const FRAGMENT_BANNER: &str = "\n\n// === FRAGMENT SHADER ===\n";

// ============================================================================
// Configuration
// ============================================================================

/// Transpiler configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranspilerConfig {
    /// Toolchain location and timeout
    pub toolchain: ToolchainConfig,
    /// Directory for per-call scratch files
    pub scratch_dir: PathBuf,
    /// Matrix multiplication rewrite used by the HLSL path
    pub mul_rewrite: MulRewrite,
}

impl TranspilerConfig {
    /// Config with the toolchain resolved from the environment
    pub fn from_env() -> Self {
        Self {
            toolchain: ToolchainConfig::from_env(),
            ..Self::default()
        }
    }

    /// Sets the toolchain config
    pub fn with_toolchain(mut self, toolchain: ToolchainConfig) -> Self {
        self.toolchain = toolchain;
        self
    }

    /// Sets the scratch directory
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// Sets the multiplication rewrite
    pub fn with_mul_rewrite(mut self, mode: MulRewrite) -> Self {
        self.mul_rewrite = mode;
        self
    }
}

impl Default for TranspilerConfig {
    fn default() -> Self {
        Self {
            toolchain: ToolchainConfig::default(),
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
            mul_rewrite: MulRewrite::default(),
        }
    }
}

// ============================================================================
// Transpiler
// ============================================================================

/// Shader transpiler
///
/// Calls are synchronous and block for as long as the external tools run.
/// The transpiler holds no per-call state, so one instance may serve
/// concurrent calls when its runner allows it.
#[derive(Debug)]
pub struct ShaderTranspiler<R = ProcessRunner> {
    config: TranspilerConfig,
    runner: R,
}

impl ShaderTranspiler<ProcessRunner> {
    /// Creates a transpiler that spawns the real tools
    pub fn new(config: TranspilerConfig) -> Self {
        let runner = ProcessRunner::from_config(&config.toolchain);
        Self { config, runner }
    }

    /// Creates a transpiler configured from the environment
    pub fn from_env() -> Self {
        Self::new(TranspilerConfig::from_env())
    }
}

impl<R: ToolchainRunner> ShaderTranspiler<R> {
    /// Creates a transpiler with a custom runner
    pub fn with_runner(config: TranspilerConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Configuration
    #[inline]
    pub fn config(&self) -> &TranspilerConfig {
        &self.config
    }

    /// Runner
    #[inline]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Transpiles one stage to `target`
    pub fn transpile(&self, source: &str, target: ShaderTarget, stage: ShaderStage) -> TranspilationResult {
        let result = match validate_source(source) {
            Ok(()) => guarded(|| self.dispatch(source, target, stage)),
            Err(err) => TranspilationResult::failure(err.to_string()),
        };

        if result.success {
            info!("Shader transpilation successful (target: {}, stage: {})", target, stage);
        } else {
            error!(
                "Shader transpilation failed (target: {}, stage: {}): {}",
                target, stage, result.message
            );
        }
        result
    }

    /// Transpiles a vertex/fragment pair into one combined result
    ///
    /// The vertex stage runs first. The first failure is returned unchanged;
    /// a combined result never carries a binary.
    pub fn transpile_program(
        &self,
        vertex_source: &str,
        fragment_source: &str,
        target: ShaderTarget,
    ) -> TranspilationResult {
        let vertex = self.transpile(vertex_source, target, ShaderStage::Vertex);
        if !vertex.success {
            return vertex;
        }
        let fragment = self.transpile(fragment_source, target, ShaderStage::Fragment);
        if !fragment.success {
            return fragment;
        }

        let mut combined = String::with_capacity(
            VERTEX_BANNER.len() + vertex.output.len() + FRAGMENT_BANNER.len() + fragment.output.len(),
        );
        combined.push_str(VERTEX_BANNER);
        combined.push_str(&vertex.output);
        combined.push_str(FRAGMENT_BANNER);
        combined.push_str(&fragment.output);
        TranspilationResult::success(combined)
    }

    /// Applies the textual rewrites for `target` without running any tool
    ///
    /// HLSL output is unvalidated, Vulkan output is the glslang input and
    /// Metal output is a direct rewrite rather than spirv-cross output.
    pub fn preview(&self, source: &str, target: ShaderTarget, stage: ShaderStage) -> TranspilationResult {
        if let Err(err) = validate_source(source) {
            return TranspilationResult::failure(err.to_string());
        }
        guarded(|| {
            let text = match target {
                ShaderTarget::SourceFormat => source.to_string(),
                ShaderTarget::Hlsl => hlsl::generate(source, stage, self.config.mul_rewrite),
                ShaderTarget::VulkanSpirv => vulkan::wrap(source),
                ShaderTarget::Metal => metal::rewrite_source(source, stage),
            };
            TranspilationResult::success(text)
        })
    }

    /// Extracts uniform declarations
    pub fn extract_uniforms(&self, source: &str) -> Vec<UniformBinding> {
        extract::extract_uniforms(source)
    }

    /// Extracts vertex attribute declarations
    pub fn extract_attributes(&self, source: &str) -> Vec<VertexAttribute> {
        extract::extract_attributes(source)
    }

    fn dispatch(&self, source: &str, target: ShaderTarget, stage: ShaderStage) -> TranspilationResult {
        let tools = ToolchainSession::new(&self.config.toolchain, &self.runner, &self.config.scratch_dir);
        match target {
            ShaderTarget::SourceFormat => TranspilationResult::success(source),
            ShaderTarget::Hlsl => hlsl::convert(source, stage, self.config.mul_rewrite, &tools),
            ShaderTarget::VulkanSpirv => vulkan::convert(source, stage, &tools),
            ShaderTarget::Metal => metal::convert(source, stage, &tools),
        }
    }
}

/// Coarse input check: non-empty, with at least one `{` and one `}`
///
/// Brace balance and nesting are not checked.
pub fn validate_source(source: &str) -> TranspileResult<()> {
    if source.is_empty() {
        return Err(TranspileError::EmptySource);
    }
    if !source.contains('{') || !source.contains('}') {
        return Err(TranspileError::MissingBraces);
    }
    Ok(())
}

fn guarded(convert: impl FnOnce() -> TranspilationResult) -> TranspilationResult {
    panic::catch_unwind(AssertUnwindSafe(convert)).unwrap_or_else(|payload| {
        TranspilationResult::failure(TranspileError::Internal(panic_message(payload.as_ref())).to_string())
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
