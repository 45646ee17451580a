use std::error::Error as StdError;

use session::{CompileError, CompileStage, UniformCache, UniformKind, UniformLocation};
use wgpu::naga::front::glsl::{Frontend, Options, ParseErrors};
use wgpu::naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};
use wgpu::naga::{Module, ScalarKind, ShaderStage, Span, TypeInner, VectorSize};

/// Uniform block group/binding shared by both stages.
pub(crate) const UNIFORM_GROUP: u32 = 0;
pub(crate) const UNIFORM_BINDING: u32 = 0;

/// Names the viewer feeds every frame; loose declarations of these are
/// replaced by the block members in [`HEADER`].
const BUILTIN_UNIFORMS: [&str; 2] = ["uTime", "uResolution"];

/// Prologue injected ahead of both stages.
///
/// Member offsets are reflected from the parsed module; the CPU side never
/// hardcodes this layout.
const HEADER: &str = r"#version 450
layout(std140, set = 0, binding = 0) uniform ShadartParams {
    vec2 _uResolution;
    float _uTime;
} shadart;

#define uResolution shadart._uResolution
#define uTime shadart._uTime
#line 1
";

/// Stage source after header injection, ready for naga or wgpu.
#[derive(Debug, Clone)]
pub(crate) struct PreparedStage {
    pub stage: CompileStage,
    pub source: String,
}

/// Rewrites desktop-GL style source into the Vulkan-flavoured GLSL wgpu accepts.
///
/// The `#version` directive and loose built-in uniform declarations are
/// blanked rather than removed so `#line 1` keeps diagnostics on the operator's
/// line numbers. Other names sharing a declaration with a built-in stay.
pub(crate) fn prepare(stage: CompileStage, source: &str) -> PreparedStage {
    let mut body = String::with_capacity(source.len());
    for line in source.lines() {
        if !is_version_directive(line) {
            match strip_builtin_uniforms(line) {
                Some(kept) => body.push_str(&kept),
                None => body.push_str(line),
            }
        }
        body.push('\n');
    }

    PreparedStage {
        stage,
        source: format!("{HEADER}{body}"),
    }
}

fn is_version_directive(line: &str) -> bool {
    line.trim_start().starts_with("#version")
}

/// Drops built-in names from a loose `uniform` declaration.
///
/// Returns `None` when the line declares no built-in, an empty string when it
/// declares nothing else, and the declaration with the remaining names
/// otherwise.
fn strip_builtin_uniforms(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if !trimmed.starts_with("uniform ") || trimmed.contains('{') {
        return None;
    }
    let declaration = trimmed.strip_suffix(';')?.trim_end();

    let (first, rest) = match declaration.split_once(',') {
        Some((first, rest)) => (first, Some(rest)),
        None => (declaration, None),
    };
    let (prefix, first_name) = first.trim_end().rsplit_once(char::is_whitespace)?;
    let names: Vec<&str> = std::iter::once(first_name)
        .chain(rest.into_iter().flat_map(|rest| rest.split(',')))
        .map(str::trim)
        .collect();

    let is_builtin = |name: &&str| {
        let base = name.split('[').next().unwrap_or_default().trim();
        BUILTIN_UNIFORMS.contains(&base)
    };
    if !names.iter().any(|name| is_builtin(name)) {
        return None;
    }

    let kept: Vec<&str> = names.into_iter().filter(|name| !is_builtin(name)).collect();
    if kept.is_empty() {
        return Some(String::new());
    }
    let indent = &line[..line.len() - line.trim_start().len()];
    Some(format!("{indent}{} {};", prefix.trim_end(), kept.join(", ")))
}

/// Parses and validates one stage, returning the module for reflection.
pub(crate) fn check(prepared: &PreparedStage) -> Result<(Module, ModuleInfo), CompileError> {
    let naga_stage = match prepared.stage {
        CompileStage::Vertex => ShaderStage::Vertex,
        _ => ShaderStage::Fragment,
    };

    let mut frontend = Frontend::default();
    let module = frontend
        .parse(&Options::from(naga_stage), &prepared.source)
        .map_err(|errors| {
            CompileError::new(
                prepared.stage,
                describe_parse_errors(&errors, &prepared.source),
            )
        })?;

    let info = Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|err| {
            let line = err
                .spans()
                .next()
                .and_then(|(span, _)| user_line(*span, &prepared.source));
            let message = error_chain(err.as_inner());
            let diagnostic = match line {
                Some(line) => format!("0:{line}: {message}"),
                None => message,
            };
            CompileError::new(prepared.stage, diagnostic)
        })?;

    Ok((module, info))
}

fn describe_parse_errors(errors: &ParseErrors, source: &str) -> String {
    errors
        .errors
        .iter()
        .map(|error| match user_line(error.meta, source) {
            Some(line) => format!("0:{line}: {}", error.kind),
            None => error.kind.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Maps a span in the prepared source back onto the operator's line number.
fn user_line(span: Span, source: &str) -> Option<u32> {
    if !span.is_defined() {
        return None;
    }
    let line = span.location(source).line_number;
    line.checked_sub(header_lines()).filter(|line| *line > 0)
}

fn header_lines() -> u32 {
    HEADER.lines().count() as u32
}

fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Builds the uniform cache from the block declared at group 0, binding 0.
///
/// Block sizes are rounded up to 16 bytes to satisfy uniform buffer binding
/// rules.
pub(crate) fn reflect_uniforms(module: &Module) -> UniformCache {
    let block = module.global_variables.iter().find_map(|(_, global)| {
        let binding = global.binding.as_ref()?;
        if binding.group != UNIFORM_GROUP || binding.binding != UNIFORM_BINDING {
            return None;
        }
        match &module.types[global.ty].inner {
            TypeInner::Struct { members, span } => Some((members, *span)),
            _ => None,
        }
    });

    let Some((members, span)) = block else {
        return UniformCache::new(16, std::iter::empty::<(String, UniformLocation)>());
    };

    let locations = members.iter().filter_map(|member| {
        let name = member.name.as_deref()?;
        let kind = uniform_kind(&module.types[member.ty].inner)?;
        Some((
            name.trim_start_matches('_').to_string(),
            UniformLocation {
                offset: member.offset as usize,
                kind,
            },
        ))
    });

    UniformCache::new(block_size(span), locations)
}

pub(crate) fn block_size(span: u32) -> usize {
    let span = span.max(16) as usize;
    span.div_ceil(16) * 16
}

fn uniform_kind(inner: &TypeInner) -> Option<UniformKind> {
    match inner {
        TypeInner::Scalar(scalar) if scalar.width == 4 => match scalar.kind {
            ScalarKind::Float => Some(UniformKind::Float),
            ScalarKind::Sint => Some(UniformKind::Int),
            _ => None,
        },
        TypeInner::Vector { size, scalar }
            if scalar.kind == ScalarKind::Float && scalar.width == 4 =>
        {
            match size {
                VectorSize::Bi => Some(UniformKind::Vec2),
                VectorSize::Tri => Some(UniformKind::Vec3),
                VectorSize::Quad => None,
            }
        }
        _ => None,
    }
}
