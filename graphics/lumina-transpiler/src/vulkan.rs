//! Vulkan/SPIR-V Converter
//!
//! Wraps source in a `#version 450 core` header and assembles it with
//! `glslang`. The Metal converter reuses [`assemble`] so both steps agree on
//! where the SPIR-V module lives.

use crate::error::{TranspileError, TranspileResult};
use crate::rewrite;
use crate::scratch::{ScratchFile, ScratchSpace};
use crate::spirv;
use crate::toolchain::{ToolchainRunner, ToolchainSession};
use crate::types::{ShaderStage, ShaderTarget, TranspilationResult};

/// Message attached to a successful assembly
pub const ASSEMBLY_SUCCEEDED: &str = "SPIR-V compilation success!";

/// Message prefix for a failed assembly
pub const ASSEMBLY_FAILED: &str = "SPIR-V compilation failed!";

/// Source as handed to glslang
///
/// Any existing `#version` line is dropped so the 450 header is the only one.
pub fn wrap(source: &str) -> String {
    format!(
        "{}\n\n{}",
        ShaderTarget::VulkanSpirv.version_string(),
        rewrite::strip_version(source)
    )
}

/// Writes `glsl` to scratch, runs glslang and loads the module
///
/// The module stays at [`ScratchFile::Spirv`] in `scratch` for later steps.
pub fn assemble<R: ToolchainRunner + ?Sized>(
    glsl: &str,
    stage: ShaderStage,
    tools: &ToolchainSession<'_, R>,
    scratch: &ScratchSpace,
) -> TranspileResult<Vec<u32>> {
    let input = scratch.write(ScratchFile::InputGlsl(stage), glsl)?;
    let output = scratch.path(ScratchFile::Spirv);
    tools.run(&tools.config().glslang(&input, &output))?;
    let bytes = scratch.read_bytes(ScratchFile::Spirv)?;
    spirv::words_from_bytes(&bytes)
}

/// Failed result for an assembly error
pub fn failure(err: &TranspileError) -> TranspilationResult {
    TranspilationResult::failure(format!("{} {}", ASSEMBLY_FAILED, err))
}

/// Converts to a SPIR-V binary
///
/// `output` carries the text handed to glslang; `binary` the module words.
pub fn convert<R: ToolchainRunner + ?Sized>(
    source: &str,
    stage: ShaderStage,
    tools: &ToolchainSession<'_, R>,
) -> TranspilationResult {
    let glsl = wrap(source);
    let words = tools
        .scratch()
        .and_then(|scratch| assemble(&glsl, stage, tools, &scratch));
    match words {
        Ok(words) => TranspilationResult::success(glsl)
            .with_binary(words)
            .with_message(ASSEMBLY_SUCCEEDED),
        Err(err) => failure(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_replaces_version() {
        let glsl = wrap("#version 330 core\nvoid main() {}\n");
        assert_eq!(glsl, "#version 450 core\n\nvoid main() {}\n");
    }

    #[test]
    fn test_wrap_without_version() {
        let glsl = wrap("void main() {}");
        assert!(glsl.starts_with("#version 450 core\n\n"));
        assert!(glsl.ends_with("void main() {}"));
    }

    #[test]
    fn test_failure_message() {
        let result = failure(&TranspileError::InvalidSpirv("bad magic 0x00000000".into()));
        assert!(!result.success);
        assert!(result.output.is_empty());
        assert!(result.message.starts_with(ASSEMBLY_FAILED));
    }
}
