//! Transpiler data model
//!
//! Value types exchanged between the facade, the converters and callers.
//! Every value is created per call and owned by whoever receives it.

use core::fmt;

// ============================================================================
// Targets & Stages
// ============================================================================

/// Destination shading representation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderTarget {
    /// Source language passthrough
    SourceFormat,
    /// HLSL text, validated with dxc
    Hlsl,
    /// SPIR-V binary assembled by glslang
    VulkanSpirv,
    /// Metal source produced by spirv-cross
    Metal,
}

impl ShaderTarget {
    /// All targets, in declaration order
    pub const ALL: [ShaderTarget; 4] = [
        ShaderTarget::SourceFormat,
        ShaderTarget::Hlsl,
        ShaderTarget::VulkanSpirv,
        ShaderTarget::Metal,
    ];

    /// Returns the target name
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SourceFormat => "glsl",
            Self::Hlsl => "hlsl",
            Self::VulkanSpirv => "spirv",
            Self::Metal => "metal",
        }
    }

    /// Header or banner line emitted at the top of converted output
    #[inline]
    pub const fn version_string(&self) -> &'static str {
        match self {
            Self::SourceFormat => "#version 330 core",
            Self::Hlsl => "// HLSL Shader (Target: Direct3D 11)",
            Self::VulkanSpirv => "#version 450 core",
            Self::Metal => "// Metal Shader Language",
        }
    }
}

impl fmt::Display for ShaderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pipeline stage a shader executes in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Fragment/pixel shader
    Fragment,
}

impl ShaderStage {
    /// Returns the stage name
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }

    /// Returns the DXC shader model profile
    #[inline]
    pub const fn hlsl_profile(&self) -> &'static str {
        match self {
            Self::Vertex => "vs_6_0",
            Self::Fragment => "ps_6_0",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Declaration Metadata
// ============================================================================

/// Uniform declared in shader source
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UniformBinding {
    /// Uniform name
    pub name: String,
    /// Declared source-language type
    pub ty: String,
    /// Binding slot, in discovery order
    pub binding: u32,
    /// Descriptor set
    pub set: u32,
}

/// Per-vertex input declared with a location qualifier
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Attribute name
    pub name: String,
    /// Declared source-language type
    pub ty: String,
    /// Location index
    pub location: u32,
}

// ============================================================================
// Transpilation Result
// ============================================================================

/// Outcome of a transpilation call
///
/// `output` may be populated on failure for diagnostics only. Callers must
/// check `success` before consuming `output` or `binary`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TranspilationResult {
    /// Whether the conversion and any toolchain step succeeded
    pub success: bool,
    /// Target source text
    pub output: String,
    /// SPIR-V words, only for a successful Vulkan conversion
    pub binary: Vec<u32>,
    /// Human-readable diagnostic or informational note
    pub message: String,
}

impl TranspilationResult {
    /// Successful result carrying text only
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            binary: Vec::new(),
            message: String::new(),
        }
    }

    /// Failed result with no output
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            binary: Vec::new(),
            message: message.into(),
        }
    }

    /// Attaches a SPIR-V payload
    pub fn with_binary(mut self, binary: Vec<u32>) -> Self {
        self.binary = binary;
        self
    }

    /// Attaches a message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attaches diagnostic output
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }
}
