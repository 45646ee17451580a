use std::collections::HashMap;

/// Scalar shape of a uniform the viewer knows how to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec3,
    Int,
}

impl UniformKind {
    pub fn size(self) -> usize {
        match self {
            UniformKind::Float | UniformKind::Int => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 => 12,
        }
    }
}

/// Where a named uniform lives inside the program's uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformLocation {
    pub offset: usize,
    pub kind: UniformKind,
}

/// Name → location cache plus the CPU copy of the uniform block.
///
/// Built once per compiled program from the compiler's reflection data.
/// Writes to names the program does not declare are ignored, mirroring how a
/// GL driver treats a `-1` uniform location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformCache {
    locations: HashMap<String, UniformLocation>,
    data: Vec<u8>,
}

impl UniformCache {
    pub fn new<I, S>(block_size: usize, locations: I) -> Self
    where
        I: IntoIterator<Item = (S, UniformLocation)>,
        S: Into<String>,
    {
        let locations: HashMap<String, UniformLocation> = locations
            .into_iter()
            .map(|(name, location)| (name.into(), location))
            .filter(|(_, location)| location.offset + location.kind.size() <= block_size)
            .collect();
        Self {
            locations,
            data: vec![0; block_size],
        }
    }

    pub fn location(&self, name: &str) -> Option<UniformLocation> {
        self.locations.get(name).copied()
    }

    pub fn set_f32(&mut self, name: &str, value: f32) -> bool {
        self.write(name, UniformKind::Float, bytemuck::bytes_of(&value))
    }

    pub fn set_vec2(&mut self, name: &str, value: [f32; 2]) -> bool {
        self.write(name, UniformKind::Vec2, bytemuck::cast_slice(&value))
    }

    /// Bytes ready for upload into the GPU uniform buffer.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn write(&mut self, name: &str, kind: UniformKind, bytes: &[u8]) -> bool {
        let Some(location) = self.locations.get(name) else {
            return false;
        };
        if location.kind != kind {
            tracing::trace!(name, ?kind, expected = ?location.kind, "uniform type mismatch");
            return false;
        }
        self.data[location.offset..location.offset + bytes.len()].copy_from_slice(bytes);
        true
    }
}
