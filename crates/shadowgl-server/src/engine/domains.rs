//! Legal argument domains and the comparison used by the redundancy check.

use shadowgl_types::gl::*;

pub const BLEND_EQUATIONS: &[GLenum] = &[GL_FUNC_ADD, GL_FUNC_SUBTRACT, GL_FUNC_REVERSE_SUBTRACT];

pub const BLEND_FACTORS: &[GLenum] = &[
    GL_ZERO,
    GL_ONE,
    GL_SRC_COLOR,
    GL_ONE_MINUS_SRC_COLOR,
    GL_DST_COLOR,
    GL_ONE_MINUS_DST_COLOR,
    GL_SRC_ALPHA,
    GL_ONE_MINUS_SRC_ALPHA,
    GL_DST_ALPHA,
    GL_ONE_MINUS_DST_ALPHA,
    GL_CONSTANT_COLOR,
    GL_ONE_MINUS_CONSTANT_COLOR,
    GL_CONSTANT_ALPHA,
    GL_ONE_MINUS_CONSTANT_ALPHA,
    GL_SRC_ALPHA_SATURATE,
];

pub const FACES: &[GLenum] = &[GL_FRONT, GL_BACK, GL_FRONT_AND_BACK];
pub const WINDINGS: &[GLenum] = &[GL_CW, GL_CCW];

pub const COMPARE_FUNCS: &[GLenum] = &[
    GL_NEVER, GL_LESS, GL_EQUAL, GL_LEQUAL, GL_GREATER, GL_NOTEQUAL, GL_GEQUAL, GL_ALWAYS,
];

pub const STENCIL_OPS: &[GLenum] = &[
    GL_KEEP, GL_ZERO, GL_REPLACE, GL_INCR, GL_DECR, GL_INVERT, GL_INCR_WRAP, GL_DECR_WRAP,
];

pub const HINT_MODES: &[GLenum] = &[GL_FASTEST, GL_NICEST, GL_DONT_CARE];
pub const PIXEL_ALIGNMENTS: &[GLint] = &[1, 2, 4, 8];

pub const BUFFER_TARGETS: &[GLenum] = &[GL_ARRAY_BUFFER, GL_ELEMENT_ARRAY_BUFFER];
pub const BUFFER_USAGES: &[GLenum] = &[GL_STREAM_DRAW, GL_STATIC_DRAW, GL_DYNAMIC_DRAW];
pub const TEXTURE_TARGETS: &[GLenum] = &[GL_TEXTURE_2D, GL_TEXTURE_CUBE_MAP];
pub const TEXTURE_IMAGE_TARGETS: &[GLenum] = &[
    GL_TEXTURE_2D,
    GL_TEXTURE_CUBE_MAP_POSITIVE_X,
    GL_TEXTURE_CUBE_MAP_NEGATIVE_X,
    GL_TEXTURE_CUBE_MAP_POSITIVE_Y,
    GL_TEXTURE_CUBE_MAP_NEGATIVE_Y,
    GL_TEXTURE_CUBE_MAP_POSITIVE_Z,
    GL_TEXTURE_CUBE_MAP_NEGATIVE_Z,
];

pub const PIXEL_FORMATS: &[GLenum] = &[GL_ALPHA, GL_RGB, GL_RGBA, GL_LUMINANCE, GL_LUMINANCE_ALPHA];
pub const PIXEL_TYPES: &[GLenum] = &[
    GL_UNSIGNED_BYTE,
    GL_UNSIGNED_SHORT_5_6_5,
    GL_UNSIGNED_SHORT_4_4_4_4,
    GL_UNSIGNED_SHORT_5_5_5_1,
];

/// Bytes per pixel of a client image, or `None` when the format and type do not combine.
pub fn pixel_size(format: GLenum, ty: GLenum) -> Option<usize> {
    match (format, ty) {
        (GL_ALPHA | GL_LUMINANCE, GL_UNSIGNED_BYTE) => Some(1),
        (GL_LUMINANCE_ALPHA, GL_UNSIGNED_BYTE) => Some(2),
        (GL_RGB, GL_UNSIGNED_BYTE) => Some(3),
        (GL_RGBA, GL_UNSIGNED_BYTE) => Some(4),
        (GL_RGB, GL_UNSIGNED_SHORT_5_6_5) => Some(2),
        (GL_RGBA, GL_UNSIGNED_SHORT_4_4_4_4 | GL_UNSIGNED_SHORT_5_5_5_1) => Some(2),
        _ => None,
    }
}

/// Bytes the driver reads for a `width` x `height` image whose rows start on `alignment`.
///
/// The last row is not padded.
pub fn image_size(pixel: usize, width: usize, height: usize, alignment: usize) -> Option<usize> {
    if width == 0 || height == 0 {
        return Some(0);
    }
    let row = pixel.checked_mul(width)?;
    let stride = row.checked_next_multiple_of(alignment)?;
    stride.checked_mul(height - 1)?.checked_add(row)
}

pub const SHADER_KINDS: &[GLenum] = &[GL_VERTEX_SHADER, GL_FRAGMENT_SHADER];

pub const ATTRIB_TYPES: &[GLenum] = &[
    GL_BYTE,
    GL_UNSIGNED_BYTE,
    GL_SHORT,
    GL_UNSIGNED_SHORT,
    GL_FIXED,
    GL_FLOAT,
];

pub const DRAW_MODES: &[GLenum] = &[
    GL_POINTS,
    GL_LINES,
    GL_LINE_LOOP,
    GL_LINE_STRIP,
    GL_TRIANGLES,
    GL_TRIANGLE_STRIP,
    GL_TRIANGLE_FAN,
];

pub const INDEX_TYPES: &[GLenum] = &[GL_UNSIGNED_BYTE, GL_UNSIGNED_SHORT];

pub const CLEAR_MASK: GLbitfield = GL_COLOR_BUFFER_BIT | GL_DEPTH_BUFFER_BIT | GL_STENCIL_BUFFER_BIT;

/// `GL_INVALID_ENUM` unless every value is in `legal`.
pub fn enums_in<const N: usize>(legal: &'static [GLenum]) -> impl Fn(&[GLenum; N]) -> Option<GLenum> {
    move |values| (!values.iter().all(|v| legal.contains(v))).then_some(GL_INVALID_ENUM)
}

/// Single-value form of [`enums_in`].
pub fn enum_in(legal: &'static [GLenum]) -> impl Fn(&GLenum) -> Option<GLenum> {
    move |v| (!legal.contains(v)).then_some(GL_INVALID_ENUM)
}

/// Accepts anything.
pub fn any<T>(_: &T) -> Option<GLenum> {
    None
}

/// Bit-for-bit equality, so cached floats compare like the driver's stored values do
/// (`-0.0 != 0.0`, and a NaN equals an identical NaN).
pub trait BitEq {
    fn bit_eq(&self, other: &Self) -> bool;
}

macro_rules! bit_eq_by_value {
    ($($ty:ty),*) => {
        $(impl BitEq for $ty {
            fn bit_eq(&self, other: &Self) -> bool {
                self == other
            }
        })*
    };
}

bit_eq_by_value!(u32, i32, u64, bool);

impl BitEq for f32 {
    fn bit_eq(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

impl<T: BitEq, const N: usize> BitEq for [T; N] {
    fn bit_eq(&self, other: &Self) -> bool {
        self.iter().zip(other).all(|(a, b)| a.bit_eq(b))
    }
}

impl<A: BitEq, B: BitEq> BitEq for (A, B) {
    fn bit_eq(&self, other: &Self) -> bool {
        self.0.bit_eq(&other.0) && self.1.bit_eq(&other.1)
    }
}

impl<A: BitEq, B: BitEq, C: BitEq> BitEq for (A, B, C) {
    fn bit_eq(&self, other: &Self) -> bool {
        self.0.bit_eq(&other.0) && self.1.bit_eq(&other.1) && self.2.bit_eq(&other.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_compare_by_bits() {
        assert!(1.0f32.bit_eq(&1.0));
        assert!(!0.0f32.bit_eq(&-0.0));
        assert!(f32::NAN.bit_eq(&f32::NAN));
        assert!([0.5f32, 1.0].bit_eq(&[0.5, 1.0]));
        assert!(!(1.0f32, true).bit_eq(&(1.0, false)));
    }

    #[test]
    fn domain_checks_report_invalid_enum() {
        assert_eq!(enum_in(COMPARE_FUNCS)(&GL_LESS), None);
        assert_eq!(enum_in(COMPARE_FUNCS)(&GL_BLEND), Some(GL_INVALID_ENUM));
        assert_eq!(enums_in::<2>(BLEND_FACTORS)(&[GL_ONE, GL_ZERO]), None);
        assert_eq!(enums_in::<2>(BLEND_FACTORS)(&[GL_ONE, GL_LESS]), Some(GL_INVALID_ENUM));
    }

    #[test]
    fn image_rows_are_padded_to_the_unpack_alignment() {
        assert_eq!(pixel_size(GL_RGBA, GL_UNSIGNED_BYTE), Some(4));
        assert_eq!(pixel_size(GL_RGB, GL_UNSIGNED_SHORT_4_4_4_4), None);
        assert_eq!(image_size(4, 64, 64, 4), Some(16 * 1024));
        // Three 3-byte pixels pad each row to 12 bytes, except the last.
        assert_eq!(image_size(3, 3, 2, 4), Some(12 + 9));
        assert_eq!(image_size(3, 3, 2, 1), Some(18));
        assert_eq!(image_size(4, 0, 64, 4), Some(0));
        assert_eq!(image_size(4, usize::MAX, 2, 4), None);
    }

    #[test]
    fn es2_has_fifteen_blend_factors() {
        assert_eq!(BLEND_FACTORS.len(), 15);
    }
}
