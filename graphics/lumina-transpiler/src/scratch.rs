//! Per-call scratch files
//!
//! Each conversion gets its own freshly created directory inside the scratch
//! root so concurrent calls never share a path. The directory and everything
//! the tools wrote into it are removed when the [`ScratchSpace`] is dropped.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{TranspileError, TranspileResult};
use crate::types::ShaderStage;

/// Default scratch directory, relative to the working directory
pub const DEFAULT_SCRATCH_DIR: &str = "Saved/ShaderCache";

/// Name prefix of every per-call directory
const CALL_DIR_PREFIX: &str = "lumina-";

/// Scratch file roles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScratchFile {
    /// HLSL handed to dxc
    ValidateHlsl,
    /// GLSL handed to glslang; the stage suffix tells glslang what to build
    InputGlsl(ShaderStage),
    /// SPIR-V written by glslang, read by spirv-cross
    Spirv,
    /// Metal source written by spirv-cross
    OutputMetal,
}

impl ScratchFile {
    /// File name inside the call directory
    #[inline]
    pub const fn file_name(&self) -> &'static str {
        match self {
            Self::ValidateHlsl => "validate.hlsl",
            Self::InputGlsl(ShaderStage::Vertex) => "input.vert.glsl",
            Self::InputGlsl(ShaderStage::Fragment) => "input.frag.glsl",
            Self::Spirv => "input.spv",
            Self::OutputMetal => "output.metal",
        }
    }
}

/// Scratch directory owned by one call
#[derive(Debug)]
pub struct ScratchSpace {
    dir: TempDir,
}

impl ScratchSpace {
    /// Creates a fresh call directory under `root`, creating `root` if needed
    ///
    /// The call directory is created exclusively, so leftovers from an
    /// earlier process are never reused.
    pub fn new(root: impl AsRef<Path>) -> TranspileResult<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|e| TranspileError::io(root, e))?;
        let dir = tempfile::Builder::new()
            .prefix(CALL_DIR_PREFIX)
            .tempdir_in(root)
            .map_err(|e| TranspileError::io(root, e))?;
        Ok(Self { dir })
    }

    /// Call directory
    #[inline]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Path for a file role
    pub fn path(&self, file: ScratchFile) -> PathBuf {
        self.dir.path().join(file.file_name())
    }

    /// Writes text to a scratch file
    pub fn write(&self, file: ScratchFile, contents: &str) -> TranspileResult<PathBuf> {
        let path = self.path(file);
        fs::write(&path, contents).map_err(|e| TranspileError::io(&path, e))?;
        Ok(path)
    }

    /// Reads a scratch file as bytes
    pub fn read_bytes(&self, file: ScratchFile) -> TranspileResult<Vec<u8>> {
        let path = self.path(file);
        fs::read(&path).map_err(|e| TranspileError::io(&path, e))
    }

    /// Reads a scratch file as text
    pub fn read_string(&self, file: ScratchFile) -> TranspileResult<String> {
        let path = self.path(file);
        fs::read_to_string(&path).map_err(|e| TranspileError::io(&path, e))
    }
}
