//! # LUMINA Transpiler
//!
//! Shader cross-compilation for the LUMINA rendering backends.
//!
//! This crate provides:
//! - Uniform and vertex attribute extraction from GLSL-like source
//! - HLSL conversion validated with `dxc`
//! - SPIR-V assembly through `glslang`
//! - Metal conversion through `spirv-cross`
//! - A facade that validates input and reports every outcome as a
//!   [`TranspilationResult`]
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  LUMINA TRANSPILER PIPELINE                     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │   GLSL-like source                                              │
//! │       │                                                         │
//! │       ▼                                                         │
//! │   ┌─────────────────┐                                           │
//! │   │   Validation    │ ◄── empty source / brace check            │
//! │   └────────┬────────┘                                           │
//! │            │                                                    │
//! │     ┌──────┴──────┬──────────────┐                              │
//! │     ▼             ▼              ▼                              │
//! │ ┌────────┐  ┌──────────┐  ┌────────────┐                        │
//! │ │  HLSL  │  │  Vulkan  │─►│   Metal    │                        │
//! │ └────┬───┘  └────┬─────┘  └─────┬──────┘                        │
//! │      │           │              │                               │
//! │      ▼           ▼              ▼                               │
//! │    dxc        glslang      spirv-cross     (Toolchain Runner)   │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The rewrites are textual. There is no grammar, AST or type checker
//! behind them; see [`rewrite`] for the exact transformations.

pub mod error;
pub mod extract;
pub mod hlsl;
pub mod metal;
pub mod rewrite;
pub mod scratch;
pub mod spirv;
pub mod toolchain;
pub mod transpiler;
pub mod types;
pub mod vulkan;

// Re-exports
pub use error::{ErrorKind, TranspileError, TranspileResult};
pub use extract::{extract_attributes, extract_uniforms};
pub use rewrite::MulRewrite;
pub use toolchain::{ProcessRunner, Tool, ToolInvocation, ToolOutput, ToolchainConfig, ToolchainRunner};
pub use transpiler::{ShaderTranspiler, TranspilerConfig};
pub use types::{ShaderStage, ShaderTarget, TranspilationResult, UniformBinding, VertexAttribute};

/// LUMINA Transpiler version
pub const LUMINA_TRANSPILER_VERSION: (u32, u32, u32) = (0, 1, 0);
