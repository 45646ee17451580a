//! Starter sources written when the operator creates a new shader.

/// Pass-through vertex stage for the full-screen quad.
pub const DEFAULT_VERTEX_SHADER: &str = "\
#version 330 core
layout (location = 0) in vec3 aPos;

void main()
{
    gl_Position = vec4(aPos, 1.0);
}
";

/// Animated gradient that exercises both built-in uniforms.
pub const FRAGMENT_TEMPLATE: &str = "\
#version 330 core
layout (location = 0) out vec4 FragColor;

uniform float uTime;
uniform vec2 uResolution;

void main()
{
    vec2 uv = gl_FragCoord.xy / uResolution;
    vec3 color = 0.5 + 0.5 * cos(uTime + uv.xyx + vec3(0.0, 2.0, 4.0));
    FragColor = vec4(color, 1.0);
}
";
