//! Metal Converter
//!
//! Assembles SPIR-V through the Vulkan path, then cross-compiles it with
//! `spirv-cross`. [`rewrite_source`] is the text-only approximation used for
//! previews when the toolchain is not consulted.

use crate::error::TranspileResult;
use crate::rewrite;
use crate::scratch::{ScratchFile, ScratchSpace};
use crate::toolchain::{ToolchainRunner, ToolchainSession};
use crate::types::{ShaderStage, ShaderTarget, TranspilationResult};
use crate::vulkan;

/// Message attached to a successful cross-compilation
pub const CROSS_COMPILE_SUCCEEDED: &str = "Metal transpilation success!";

/// Message prefix for a failed cross-compilation
pub const CROSS_COMPILE_FAILED: &str = "Metal transpilation failed!";

/// Converts to Metal source
///
/// A failed assembly is returned exactly as the Vulkan converter reports it.
pub fn convert<R: ToolchainRunner + ?Sized>(
    source: &str,
    stage: ShaderStage,
    tools: &ToolchainSession<'_, R>,
) -> TranspilationResult {
    let scratch = match tools.scratch() {
        Ok(scratch) => scratch,
        Err(err) => return vulkan::failure(&err),
    };
    let glsl = vulkan::wrap(source);
    if let Err(err) = vulkan::assemble(&glsl, stage, tools, &scratch) {
        return vulkan::failure(&err);
    }

    match cross_compile(tools, &scratch) {
        Ok(metal) => TranspilationResult::success(metal).with_message(CROSS_COMPILE_SUCCEEDED),
        Err(err) => TranspilationResult::failure(format!("{} {}", CROSS_COMPILE_FAILED, err)),
    }
}

fn cross_compile<R: ToolchainRunner + ?Sized>(
    tools: &ToolchainSession<'_, R>,
    scratch: &ScratchSpace,
) -> TranspileResult<String> {
    let spv = scratch.path(ScratchFile::Spirv);
    let metal = scratch.path(ScratchFile::OutputMetal);
    tools.run(&tools.config().spirv_cross(&spv, &metal))?;
    scratch.read_string(ScratchFile::OutputMetal)
}

/// Textual Metal rewrite, no toolchain involved
pub fn rewrite_source(source: &str, stage: ShaderStage) -> String {
    let body = rewrite::strip_version(source);
    let body = match stage {
        ShaderStage::Vertex => rewrite::metal_attributes(&body),
        ShaderStage::Fragment => body,
    };
    let body = rewrite::metal_varyings(&body, stage);
    let body = rewrite::builtin_types(&body);
    let body = rewrite::semantics(&body, ShaderTarget::Metal, stage);
    format!("{}\n{}", ShaderTarget::Metal.version_string(), body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_vertex() {
        let src = "#version 330 core\n\
layout(location = 0) in vec3 aPos;\n\
out vec2 vUv;\n\
void main() { gl_Position = vec4(aPos, 1.0); }";
        let metal = rewrite_source(src, ShaderStage::Vertex);
        assert!(metal.starts_with("// Metal Shader Language\n"));
        assert!(metal.contains("float3 aPos [[attribute(0)]];"));
        assert!(metal.contains("float2 vUv [[user(locn0)]];"));
        assert!(metal.contains("out.position = float4(aPos, 1.0);"));
    }

    #[test]
    fn test_rewrite_fragment() {
        let src = "in vec2 vUv;\nvoid main() { gl_FragColor = vec4(vUv, 0.0, 1.0); }";
        let metal = rewrite_source(src, ShaderStage::Fragment);
        assert!(metal.contains("in float2 vUv;"));
        assert!(metal.contains("out.color = float4(vUv, 0.0, 1.0);"));
    }
}
