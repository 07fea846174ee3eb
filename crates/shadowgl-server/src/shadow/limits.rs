use shadowgl_types::gl::{
    GLenum, GLint, GL_MAX_COMBINED_TEXTURE_IMAGE_UNITS, GL_MAX_CUBE_MAP_TEXTURE_SIZE,
    GL_MAX_FRAGMENT_UNIFORM_VECTORS, GL_MAX_RENDERBUFFER_SIZE, GL_MAX_TEXTURE_IMAGE_UNITS,
    GL_MAX_TEXTURE_SIZE, GL_MAX_VARYING_VECTORS, GL_MAX_VERTEX_ATTRIBS,
    GL_MAX_VERTEX_TEXTURE_IMAGE_UNITS, GL_MAX_VERTEX_UNIFORM_VECTORS,
};

/// Driver limits that are queried at most once per context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Limit {
    MaxVertexAttribs,
    MaxTextureSize,
    MaxCubeMapTextureSize,
    MaxRenderbufferSize,
    MaxTextureImageUnits,
    MaxCombinedTextureImageUnits,
    MaxVaryingVectors,
    MaxVertexUniformVectors,
    MaxFragmentUniformVectors,
    MaxVertexTextureImageUnits,
}

impl Limit {
    pub const ALL: [Limit; 10] = [
        Limit::MaxVertexAttribs,
        Limit::MaxTextureSize,
        Limit::MaxCubeMapTextureSize,
        Limit::MaxRenderbufferSize,
        Limit::MaxTextureImageUnits,
        Limit::MaxCombinedTextureImageUnits,
        Limit::MaxVaryingVectors,
        Limit::MaxVertexUniformVectors,
        Limit::MaxFragmentUniformVectors,
        Limit::MaxVertexTextureImageUnits,
    ];

    pub const fn pname(self) -> GLenum {
        match self {
            Limit::MaxVertexAttribs => GL_MAX_VERTEX_ATTRIBS,
            Limit::MaxTextureSize => GL_MAX_TEXTURE_SIZE,
            Limit::MaxCubeMapTextureSize => GL_MAX_CUBE_MAP_TEXTURE_SIZE,
            Limit::MaxRenderbufferSize => GL_MAX_RENDERBUFFER_SIZE,
            Limit::MaxTextureImageUnits => GL_MAX_TEXTURE_IMAGE_UNITS,
            Limit::MaxCombinedTextureImageUnits => GL_MAX_COMBINED_TEXTURE_IMAGE_UNITS,
            Limit::MaxVaryingVectors => GL_MAX_VARYING_VECTORS,
            Limit::MaxVertexUniformVectors => GL_MAX_VERTEX_UNIFORM_VECTORS,
            Limit::MaxFragmentUniformVectors => GL_MAX_FRAGMENT_UNIFORM_VECTORS,
            Limit::MaxVertexTextureImageUnits => GL_MAX_VERTEX_TEXTURE_IMAGE_UNITS,
        }
    }

    pub fn from_pname(pname: GLenum) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.pname() == pname)
    }

    /// The minimum every ES2 implementation guarantees. Used until the driver has been asked, and
    /// in place of an answer when the query entry point is unbound.
    pub const fn minimum(self) -> GLint {
        match self {
            Limit::MaxVertexAttribs => 8,
            Limit::MaxTextureSize => 64,
            Limit::MaxCubeMapTextureSize => 16,
            Limit::MaxRenderbufferSize => 1,
            Limit::MaxTextureImageUnits => 8,
            Limit::MaxCombinedTextureImageUnits => 8,
            Limit::MaxVaryingVectors => 8,
            Limit::MaxVertexUniformVectors => 128,
            Limit::MaxFragmentUniformVectors => 16,
            Limit::MaxVertexTextureImageUnits => 0,
        }
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

/// Cached limit values. `None` means the driver hasn't been queried yet.
#[derive(Debug, Clone, Default)]
pub struct Limits {
    queried: [Option<GLint>; Limit::ALL.len()],
}

impl Limits {
    /// The cached value, if the driver has already been queried.
    pub fn cached(&self, limit: Limit) -> Option<GLint> {
        self.queried[limit.slot()]
    }

    /// Stores the driver's answer. Later calls for the same limit are ignored: the first answer
    /// stands for the lifetime of the context.
    pub fn record(&mut self, limit: Limit, value: GLint) -> GLint {
        *self.queried[limit.slot()].get_or_insert(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_answer_sticks() {
        let mut limits = Limits::default();
        assert_eq!(limits.cached(Limit::MaxTextureSize), None);
        assert_eq!(limits.record(Limit::MaxTextureSize, 4096), 4096);
        assert_eq!(limits.record(Limit::MaxTextureSize, 1), 4096);
        assert_eq!(limits.cached(Limit::MaxTextureSize), Some(4096));
        assert_eq!(limits.cached(Limit::MaxVertexAttribs), None);
    }

    #[test]
    fn pnames_round_trip() {
        for limit in Limit::ALL {
            assert_eq!(Limit::from_pname(limit.pname()), Some(limit));
        }
        assert_eq!(Limit::from_pname(0), None);
    }
}
