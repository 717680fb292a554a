//! HLSL Converter
//!
//! Rewrites GLSL-like source into HLSL and validates it with `dxc`.
//!
//! Passes, in order:
//! 1. strip `#version`
//! 2. uniforms into `cbuffer Uniforms : register(b0)`
//! 3. vertex attributes to `TEXCOORDn` members
//! 4. varyings to `TEXCOORD0` members
//! 5. builtin vector/matrix types
//! 6. `A * B` to `mul(A, B)`
//! 7. `gl_Position` / `gl_FragColor`
//! 8. banner, plus the `inverse()` placeholder when needed

use log::warn;

use crate::error::TranspileResult;
use crate::extract::extract_uniforms;
use crate::rewrite::{self, MulRewrite, INVERSE_PLACEHOLDER};
use crate::scratch::ScratchFile;
use crate::toolchain::{ToolchainRunner, ToolchainSession};
use crate::types::{ShaderStage, ShaderTarget, TranspilationResult};

/// Message prefix for a failed dxc run
pub const VALIDATION_FAILED: &str = "DXC Validation Failed! Check shader syntax.";

/// Produces HLSL text without validating it
pub fn generate(source: &str, stage: ShaderStage, mul: MulRewrite) -> String {
    let body = rewrite::strip_version(source);
    let body = convert_uniforms(&body);
    let body = match stage {
        ShaderStage::Vertex => rewrite::hlsl_attributes(&body),
        ShaderStage::Fragment => body,
    };
    let body = rewrite::hlsl_varyings(&body, stage);
    let body = rewrite::builtin_types(&body);
    let body = rewrite::matrix_multiply(&body, mul);
    let body = rewrite::semantics(&body, ShaderTarget::Hlsl, stage);

    let mut hlsl = String::with_capacity(body.len() + 128);
    if rewrite::uses_inverse(&body) {
        warn!("{} shader calls inverse(); injecting placeholder that returns its input", stage);
        hlsl.push_str(INVERSE_PLACEHOLDER);
    }
    hlsl.push_str(ShaderTarget::Hlsl.version_string());
    hlsl.push('\n');
    hlsl.push_str(&body);
    hlsl
}

fn convert_uniforms(source: &str) -> String {
    let uniforms = extract_uniforms(source);
    if uniforms.is_empty() {
        return source.to_string();
    }
    let mut out = rewrite::uniform_block(&uniforms);
    out.push_str(&rewrite::strip_uniforms(source));
    out
}

/// Converts to HLSL and validates with dxc
///
/// On validation failure the generated text stays in `output` for
/// diagnostics.
pub fn convert<R: ToolchainRunner + ?Sized>(
    source: &str,
    stage: ShaderStage,
    mul: MulRewrite,
    tools: &ToolchainSession<'_, R>,
) -> TranspilationResult {
    let hlsl = generate(source, stage, mul);
    match validate(&hlsl, stage, tools) {
        Ok(()) => TranspilationResult::success(hlsl),
        Err(err) => TranspilationResult::failure(format!("{} {}", VALIDATION_FAILED, err))
            .with_output(hlsl),
    }
}

fn validate<R: ToolchainRunner + ?Sized>(
    hlsl: &str,
    stage: ShaderStage,
    tools: &ToolchainSession<'_, R>,
) -> TranspileResult<()> {
    let scratch = tools.scratch()?;
    let path = scratch.write(ScratchFile::ValidateHlsl, hlsl)?;
    tools.run(&tools.config().dxc(stage.hlsl_profile(), &path))
}
