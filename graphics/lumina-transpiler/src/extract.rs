//! Declaration Extractor
//!
//! Scans shader source for `uniform` and `layout(location = N) in`
//! declarations. Both scans are pure and keep the order in which
//! declarations first appear.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{UniformBinding, VertexAttribute};

/// `uniform <type> <name>;`
pub(crate) static UNIFORM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"uniform\s+(\w+)\s+(\w+);").expect("uniform regex init failed"));

/// `layout(location = N) in <type> <name>;`
pub(crate) static ATTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"layout\s*\(\s*location\s*=\s*([0-9]+)\s*\)\s*in\s+(\w+)\s+(\w+);")
        .expect("attribute regex init failed")
});

/// Extracts uniform declarations
///
/// Binding slots follow discovery order starting at 0; the descriptor set
/// is always 0.
pub fn extract_uniforms(source: &str) -> Vec<UniformBinding> {
    UNIFORM_RE
        .captures_iter(source)
        .enumerate()
        .map(|(slot, caps)| UniformBinding {
            ty: caps[1].to_string(),
            name: caps[2].to_string(),
            binding: slot as u32,
            set: 0,
        })
        .collect()
}

/// Extracts vertex attribute declarations
///
/// A location literal that does not fit in `u32` drops the declaration.
pub fn extract_attributes(source: &str) -> Vec<VertexAttribute> {
    ATTRIBUTE_RE
        .captures_iter(source)
        .filter_map(|caps| {
            let location = caps[1].parse::<u32>().ok()?;
            Some(VertexAttribute {
                location,
                ty: caps[2].to_string(),
                name: caps[3].to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "#version 330 core\n\
        layout(location = 0) in vec3 position;\n\
        layout(location=2) in vec3 normal;\n\
        uniform mat4 model;\n\
        uniform mat4 view;\n\
        uniform vec3 lightDir;\n\
        void main() { gl_Position = model * vec4(position, 1.0); }\n";

    #[test]
    fn test_uniform_slots_follow_discovery_order() {
        let uniforms = extract_uniforms(VERTEX);
        let names: Vec<_> = uniforms.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["model", "view", "lightDir"]);
        for (slot, uniform) in uniforms.iter().enumerate() {
            assert_eq!(uniform.binding, slot as u32);
            assert_eq!(uniform.set, 0);
        }
        assert_eq!(uniforms[2].ty, "vec3");
    }

    #[test]
    fn test_uniform_extraction_is_deterministic() {
        assert_eq!(extract_uniforms(VERTEX), extract_uniforms(VERTEX));
    }

    #[test]
    fn test_attribute_location_parsed() {
        let attributes = extract_attributes(VERTEX);
        assert_eq!(attributes.len(), 2);
        assert_eq!(
            attributes[1],
            VertexAttribute {
                name: "normal".into(),
                ty: "vec3".into(),
                location: 2,
            }
        );
        assert_eq!(attributes[0].location, 0);
    }

    #[test]
    fn test_no_declarations() {
        let source = "void main() { }";
        assert!(extract_uniforms(source).is_empty());
        assert!(extract_attributes(source).is_empty());
    }

    #[test]
    fn test_oversized_location_skipped() {
        let source = "layout(location = 99999999999) in vec2 uv;\nlayout(location = 1) in vec2 st;";
        let attributes = extract_attributes(source);
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes[0].name, "st");
    }

    #[test]
    fn test_location_requires_ascii_digits() {
        let source = "layout(location = \u{663}) in vec2 uv;\nlayout(location = 4) in vec2 st;";
        let attributes = extract_attributes(source);
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes[0].location, 4);
    }
}
