//! Fixed-function state setters.
//!
//! Most of these are one-line instances of [`Ctx::set_cached`]: a value, the shadow field it
//! lives in, its legal domain, and the driver call.

use shadowgl_types::gl::*;

use super::domains::{self, enum_in, enums_in, BitEq};
use super::Ctx;
use crate::driver::Driver;
use crate::shadow::{Capabilities, Limit, ShadowState, StencilFace};

impl Ctx<'_> {
    pub(super) fn active_texture(&mut self, texture: GLenum) {
        if self.state.bindings.active_texture == texture {
            self.elide();
            return;
        }
        let in_range = (GL_TEXTURE0..=GL_TEXTURE31).contains(&texture);
        if !self.enum_ok(in_range) {
            return;
        }
        let units = self.limit(Limit::MaxCombinedTextureImageUnits);
        if !self.enum_ok(((texture - GL_TEXTURE0) as GLint) < units) {
            return;
        }
        self.state.bindings.active_texture = texture;
        self.forward(|d| d.active_texture(texture));
    }

    pub(super) fn blend_color(&mut self, rgba: [GLfloat; 4]) {
        let rgba = rgba.map(|c| c.clamp(0.0, 1.0));
        self.set_cached(rgba, |s| &mut s.blend.color, domains::any, |d, [r, g, b, a]| {
            d.blend_color(r, g, b, a)
        });
    }

    pub(super) fn blend_equation(&mut self, mode: GLenum) {
        self.set_cached(
            [mode, mode],
            |s| &mut s.blend.equation,
            enums_in::<2>(domains::BLEND_EQUATIONS),
            |d, _| d.blend_equation(mode),
        );
    }

    pub(super) fn blend_equation_separate(&mut self, mode_rgb: GLenum, mode_alpha: GLenum) {
        self.set_cached(
            [mode_rgb, mode_alpha],
            |s| &mut s.blend.equation,
            enums_in::<2>(domains::BLEND_EQUATIONS),
            |d, [rgb, alpha]| d.blend_equation_separate(rgb, alpha),
        );
    }

    pub(super) fn blend_func(&mut self, sfactor: GLenum, dfactor: GLenum) {
        self.set_cached(
            [sfactor, dfactor, sfactor, dfactor],
            |s| &mut s.blend.func,
            enums_in::<4>(domains::BLEND_FACTORS),
            |d, _| d.blend_func(sfactor, dfactor),
        );
    }

    pub(super) fn blend_func_separate(&mut self, factors: [GLenum; 4]) {
        self.set_cached(
            factors,
            |s| &mut s.blend.func,
            enums_in::<4>(domains::BLEND_FACTORS),
            |d, [src_rgb, dst_rgb, src_alpha, dst_alpha]| {
                d.blend_func_separate(src_rgb, dst_rgb, src_alpha, dst_alpha)
            },
        );
    }

    pub(super) fn clear_color(&mut self, rgba: [GLfloat; 4]) {
        let rgba = rgba.map(|c| c.clamp(0.0, 1.0));
        self.set_cached(rgba, |s| &mut s.clear_color, domains::any, |d, [r, g, b, a]| {
            d.clear_color(r, g, b, a)
        });
    }

    pub(super) fn clear_depthf(&mut self, depth: GLfloat) {
        self.set_cached(depth.clamp(0.0, 1.0), |s| &mut s.clear_depth, domains::any, |d, v| {
            d.clear_depthf(v)
        });
    }

    pub(super) fn clear_stencil(&mut self, s: GLint) {
        self.set_cached(s, |st| &mut st.clear_stencil, domains::any, |d, v| d.clear_stencil(v));
    }

    pub(super) fn color_mask(&mut self, mask: [bool; 4]) {
        self.set_cached(mask, |s| &mut s.color_writemask, domains::any, |d, [r, g, b, a]| {
            d.color_mask(r, g, b, a)
        });
    }

    pub(super) fn cull_face(&mut self, mode: GLenum) {
        self.set_cached(mode, |s| &mut s.cull_face_mode, enum_in(domains::FACES), |d, v| {
            d.cull_face(v)
        });
    }

    pub(super) fn depth_func(&mut self, func: GLenum) {
        self.set_cached(func, |s| &mut s.depth_func, enum_in(domains::COMPARE_FUNCS), |d, v| {
            d.depth_func(v)
        });
    }

    pub(super) fn depth_mask(&mut self, flag: bool) {
        self.set_cached(flag, |s| &mut s.depth_writemask, domains::any, |d, v| d.depth_mask(v));
    }

    pub(super) fn depth_rangef(&mut self, near: GLfloat, far: GLfloat) {
        let range = [near.clamp(0.0, 1.0), far.clamp(0.0, 1.0)];
        self.set_cached(range, |s| &mut s.depth_range, domains::any, |d, [n, f]| {
            d.depth_rangef(n, f)
        });
    }

    pub(super) fn front_face(&mut self, mode: GLenum) {
        self.set_cached(mode, |s| &mut s.front_face, enum_in(domains::WINDINGS), |d, v| {
            d.front_face(v)
        });
    }

    pub(super) fn line_width(&mut self, width: GLfloat) {
        self.set_cached(
            width,
            |s| &mut s.line_width,
            |w| (*w <= 0.0).then_some(GL_INVALID_VALUE),
            |d, v| d.line_width(v),
        );
    }

    pub(super) fn polygon_offset(&mut self, factor: GLfloat, units: GLfloat) {
        self.set_cached([factor, units], |s| &mut s.polygon_offset, domains::any, |d, [f, u]| {
            d.polygon_offset(f, u)
        });
    }

    pub(super) fn sample_coverage(&mut self, value: GLfloat, invert: bool) {
        self.set_cached(
            (value.clamp(0.0, 1.0), invert),
            |s| &mut s.sample_coverage,
            domains::any,
            |d, (v, i)| d.sample_coverage(v, i),
        );
    }

    pub(super) fn scissor(&mut self, rect: [GLint; 4]) {
        self.set_cached(rect, |s| &mut s.scissor_box, non_negative_extent, |d, [x, y, w, h]| {
            d.scissor(x, y, w, h)
        });
    }

    pub(super) fn viewport(&mut self, rect: [GLint; 4]) {
        self.set_cached(rect, |s| &mut s.viewport, non_negative_extent, |d, [x, y, w, h]| {
            d.viewport(x, y, w, h)
        });
    }

    pub(super) fn set_capability(&mut self, cap: GLenum, enable: bool) {
        let Some(flag) = Capabilities::from_cap(cap) else {
            self.error(GL_INVALID_ENUM);
            return;
        };
        if self.state.capabilities.contains(flag) == enable {
            self.elide();
            return;
        }
        self.state.capabilities.set(flag, enable);
        if enable {
            self.forward(|d| d.enable(cap));
        } else {
            self.forward(|d| d.disable(cap));
        }
    }

    pub(super) fn hint(&mut self, target: GLenum, mode: GLenum) {
        if target != GL_GENERATE_MIPMAP_HINT {
            // Targets the shadow doesn't know (extension hints) go straight to the driver.
            if self.check(enum_in(domains::HINT_MODES)(&mode)) {
                self.forward_unverified(|d| d.hint(target, mode));
            }
            return;
        }
        self.set_cached(
            mode,
            |s| &mut s.generate_mipmap_hint,
            enum_in(domains::HINT_MODES),
            |d, v| d.hint(GL_GENERATE_MIPMAP_HINT, v),
        );
    }

    pub(super) fn pixel_storei(&mut self, pname: GLenum, param: GLint) {
        let field: fn(&mut ShadowState) -> &mut GLint = match pname {
            GL_PACK_ALIGNMENT => |s| &mut s.pack_alignment,
            GL_UNPACK_ALIGNMENT => |s| &mut s.unpack_alignment,
            _ => {
                self.error(GL_INVALID_ENUM);
                return;
            }
        };
        self.set_cached(
            param,
            field,
            |p| (!domains::PIXEL_ALIGNMENTS.contains(p)).then_some(GL_INVALID_VALUE),
            |d, v| d.pixel_storei(pname, v),
        );
    }

    pub(super) fn stencil_func(&mut self, face: GLenum, func: GLenum, reference: GLint, mask: GLuint) {
        if !self.check(enum_in(domains::COMPARE_FUNCS)(&func)) {
            return;
        }
        self.set_stencil(face, (func, reference, mask), |f| &mut f.func, |d, face, (func, r, m)| {
            d.stencil_func_separate(face, func, r, m)
        });
    }

    pub(super) fn stencil_mask(&mut self, face: GLenum, mask: GLuint) {
        self.set_stencil(face, mask, |f| &mut f.writemask, |d, face, m| {
            d.stencil_mask_separate(face, m)
        });
    }

    pub(super) fn stencil_op(&mut self, face: GLenum, ops: [GLenum; 3]) {
        if !self.check(enums_in::<3>(domains::STENCIL_OPS)(&ops)) {
            return;
        }
        self.set_stencil(face, ops, |f| &mut f.op, |d, face, [fail, zfail, zpass]| {
            d.stencil_op_separate(face, fail, zfail, zpass)
        });
    }

    /// Cached setter over one or both stencil faces. Elided only if every addressed face
    /// already holds `value`.
    fn set_stencil<T: BitEq + Copy>(
        &mut self,
        face: GLenum,
        value: T,
        field: fn(&mut StencilFace) -> &mut T,
        call: impl FnOnce(&dyn Driver, GLenum, T),
    ) {
        let faces: &[usize] = match face {
            GL_FRONT => &[0],
            GL_BACK => &[1],
            GL_FRONT_AND_BACK => &[0, 1],
            _ => {
                self.error(GL_INVALID_ENUM);
                return;
            }
        };
        if faces
            .iter()
            .all(|&i| field(&mut self.state.stencil[i]).bit_eq(&value))
        {
            self.elide();
            return;
        }
        for &i in faces {
            *field(&mut self.state.stencil[i]) = value;
        }
        self.forward(|d| call(d, face, value));
    }
}

fn non_negative_extent(rect: &[GLint; 4]) -> Option<GLenum> {
    (rect[2] < 0 || rect[3] < 0).then_some(GL_INVALID_VALUE)
}
