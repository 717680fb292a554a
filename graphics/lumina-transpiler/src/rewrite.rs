//! Builtin/Type Rewriter
//!
//! Textual rewrites shared by the converters. Each function is one
//! transformation over a recognised token shape and leaves any text that
//! does not match untouched. None of them parse the shading language.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::extract::ATTRIBUTE_RE;
use crate::types::{ShaderStage, ShaderTarget, UniformBinding};

// ============================================================================
// Patterns
// ============================================================================

static VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*#version[ \t]+[0-9]+[^\n]*\n?").expect("version regex init failed")
});

/// Uniform declaration with an optional `layout(...)` qualifier; the
/// declaration part is the shape the extractor matches.
const UNIFORM_DECL: &str = r"(?:layout\s*\([^)]*\)\s*)?uniform\s+\w+\s+\w+;";

static UNIFORM_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?m)^[ \t]*(?:{}[ \t]*)+$\n?", UNIFORM_DECL))
        .expect("uniform line regex init failed")
});

static UNIFORM_INLINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"[ \t]*{}", UNIFORM_DECL)).expect("uniform declaration regex init failed")
});

static VERTEX_OUT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bout\s+(\w+)\s+(\w+);").expect("varying out regex init failed"));

static FRAGMENT_IN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bin\s+(\w+)\s+(\w+);").expect("varying in regex init failed"));

static BUILTIN_TYPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(vec[234]|mat[34])\b").expect("builtin type regex init failed"));

static GL_POSITION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bgl_Position\b").expect("gl_Position regex init failed"));

static GL_FRAG_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bgl_FragColor\b").expect("gl_FragColor regex init failed"));

static INVERSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\binverse\b").expect("inverse regex init failed"));

static NAIVE_MUL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*\*\s*([\w\(\).]+)").expect("mul regex init failed"));

static MUL_LHS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\w+)\s*\*\s*").expect("mul operand regex init failed"));

static VECTOR_DECL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:float[234](?:x[234])?|vec[234]|mat[234])\s+(\w+)")
        .expect("vector declaration regex init failed")
});

/// Stand-in for `inverse()` in HLSL output.
///
/// Returns its argument unchanged. The math is wrong; it only keeps dxc
/// from rejecting call sites.
pub const INVERSE_PLACEHOLDER: &str = "// WARNING: placeholder inverse(), returns its argument unchanged\n\
float4x4 inverse(float4x4 m)\n\
{\n    return m;\n}\n\n";

// ============================================================================
// Types
// ============================================================================

/// Maps a source-language type to its HLSL/Metal spelling
///
/// Types without a mapping pass through unchanged.
pub fn map_type(ty: &str) -> &str {
    match ty {
        "vec2" => "float2",
        "vec3" => "float3",
        "vec4" => "float4",
        "mat3" => "float3x3",
        "mat4" => "float4x4",
        other => other,
    }
}

/// Rewrites builtin vector and matrix type tokens
///
/// Function names (`normalize`, `dot`, `max`, `transpose`, `inverse`) are
/// spelled the same in HLSL and Metal and are left alone.
pub fn builtin_types(source: &str) -> String {
    BUILTIN_TYPE_RE
        .replace_all(source, |caps: &Captures<'_>| map_type(&caps[1]).to_string())
        .into_owned()
}

// ============================================================================
// Declarations
// ============================================================================

/// Removes `#version N ...` directive lines
pub fn strip_version(source: &str) -> String {
    VERSION_RE.replace_all(source, "").into_owned()
}

/// Builds the HLSL constant buffer holding every uniform
pub fn uniform_block(uniforms: &[UniformBinding]) -> String {
    let mut block = String::from("cbuffer Uniforms : register(b0)\n{\n");
    for uniform in uniforms {
        block.push_str("    ");
        block.push_str(map_type(&uniform.ty));
        block.push(' ');
        block.push_str(&uniform.name);
        block.push_str(";\n");
    }
    block.push_str("};\n");
    block
}

/// Removes every `uniform <type> <name>;` declaration
///
/// Lines holding nothing but declarations are dropped entirely; a
/// declaration sharing its line with other code is cut out of that line.
pub fn strip_uniforms(source: &str) -> String {
    let body = UNIFORM_LINE_RE.replace_all(source, "");
    UNIFORM_INLINE_RE.replace_all(&body, "").into_owned()
}

/// `layout(location=N) in T name;` to `T name : TEXCOORDN;`
pub fn hlsl_attributes(source: &str) -> String {
    ATTRIBUTE_RE
        .replace_all(source, "${2} ${3} : TEXCOORD${1};")
        .into_owned()
}

/// Stage varyings to `T name : TEXCOORD0;`
///
/// Every varying lands on slot 0 regardless of how many there are.
pub fn hlsl_varyings(source: &str, stage: ShaderStage) -> String {
    let pattern = match stage {
        ShaderStage::Vertex => &*VERTEX_OUT_RE,
        ShaderStage::Fragment => &*FRAGMENT_IN_RE,
    };
    pattern.replace_all(source, "${1} ${2} : TEXCOORD0;").into_owned()
}

/// `layout(location=N) in T name;` to `T name [[attribute(N)]];`
pub fn metal_attributes(source: &str) -> String {
    ATTRIBUTE_RE
        .replace_all(source, "${2} ${3} [[attribute(${1})]];")
        .into_owned()
}

/// Vertex outputs to `T name [[user(locn0)]];`; fragment inputs are kept
pub fn metal_varyings(source: &str, stage: ShaderStage) -> String {
    match stage {
        ShaderStage::Vertex => VERTEX_OUT_RE
            .replace_all(source, "${1} ${2} [[user(locn0)]];")
            .into_owned(),
        ShaderStage::Fragment => source.to_string(),
    }
}

// ============================================================================
// Builtin Variables
// ============================================================================

/// Rewrites `gl_Position` / `gl_FragColor` for the target
///
/// Only HLSL and Metal have replacements; other targets are unchanged.
pub fn semantics(source: &str, target: ShaderTarget, stage: ShaderStage) -> String {
    let replacement = match (target, stage) {
        (ShaderTarget::Hlsl, ShaderStage::Vertex) => "position",
        (ShaderTarget::Hlsl, ShaderStage::Fragment) => "output",
        (ShaderTarget::Metal, ShaderStage::Vertex) => "out.position",
        (ShaderTarget::Metal, ShaderStage::Fragment) => "out.color",
        _ => return source.to_string(),
    };
    let pattern = match stage {
        ShaderStage::Vertex => &*GL_POSITION_RE,
        ShaderStage::Fragment => &*GL_FRAG_COLOR_RE,
    };
    pattern.replace_all(source, replacement).into_owned()
}

/// Checks for the `inverse` token
pub fn uses_inverse(source: &str) -> bool {
    INVERSE_RE.is_match(source)
}

// ============================================================================
// Matrix Multiplication
// ============================================================================

/// How `A * B` is turned into `mul(A, B)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MulRewrite {
    /// Every `A * B` shape, scalars included
    ///
    /// Known correctness hazard: `2.0 * x` and `a * b` on floats are
    /// rewritten too.
    #[default]
    Naive,
    /// Only when `A` is declared with a vector or matrix type
    Scoped,
}

/// Rewrites multiplications to `mul(A, B)`
pub fn matrix_multiply(source: &str, mode: MulRewrite) -> String {
    match mode {
        MulRewrite::Naive => NAIVE_MUL_RE.replace_all(source, "mul(${1}, ${2})").into_owned(),
        MulRewrite::Scoped => scoped_multiply(source),
    }
}

fn scoped_multiply(source: &str) -> String {
    let operands: HashSet<&str> = VECTOR_DECL_RE
        .captures_iter(source)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    if operands.is_empty() {
        return source.to_string();
    }

    let mut out = String::with_capacity(source.len() + 16);
    let mut cursor = 0;
    for caps in MUL_LHS_RE.captures_iter(source) {
        let (Some(whole), Some(lhs)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() < cursor || !operands.contains(lhs.as_str()) {
            continue;
        }
        let Some(len) = operand_len(&source[whole.end()..]) else {
            continue;
        };
        let rhs = &source[whole.end()..whole.end() + len];
        out.push_str(&source[cursor..whole.start()]);
        out.push_str("mul(");
        out.push_str(lhs.as_str());
        out.push_str(", ");
        out.push_str(rhs);
        out.push(')');
        cursor = whole.end() + len;
    }
    out.push_str(&source[cursor..]);
    out
}

/// Length of an operand: identifiers, member access and balanced calls
fn operand_len(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut pos = 0;
    loop {
        while pos < bytes.len() && is_operand_byte(bytes[pos]) {
            pos += 1;
        }
        if pos < bytes.len() && bytes[pos] == b'(' {
            let mut depth = 0usize;
            loop {
                match bytes.get(pos)? {
                    b'(' => depth += 1,
                    b')' => {
                        depth -= 1;
                        if depth == 0 {
                            pos += 1;
                            break;
                        }
                    },
                    _ => {},
                }
                pos += 1;
            }
        } else {
            break;
        }
    }
    (pos > 0).then_some(pos)
}

#[inline]
fn is_operand_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}
