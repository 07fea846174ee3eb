//! Opaque handle newtypes.
//!
//! Handles cross the command stream as little-endian `u64`s. On the server they carry the value the
//! native driver handed back (a pointer-sized opaque value); on the client they are just tokens.

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            /// The distinguished "no object" value (`EGL_NO_*`).
            pub const NONE: Self = Self(0);

            #[inline]
            pub const fn is_none(self) -> bool {
                self.0 == 0
            }

            #[inline]
            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(v: u64) -> Self {
                Self(v)
            }
        }
    };
}

handle!(
    /// `EGLDisplay`.
    Display
);
handle!(
    /// `EGLContext`.
    Context
);
handle!(
    /// `EGLSurface`.
    Surface
);
handle!(
    /// `EGLConfig`.
    Config
);
handle!(
    /// `EGLNativeDisplayType`.
    NativeDisplay
);
handle!(
    /// `EGLNativeWindowType`.
    NativeWindow
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_handles_are_zero() {
        assert!(Display::NONE.is_none());
        assert!(Context::default().is_none());
        assert!(!Surface(7).is_none());
        assert_eq!(Config::from(9).raw(), 9);
    }
}
