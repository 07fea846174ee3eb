//! Command and reply record wire format.
//!
//! A record is a [`RecordHeader`] followed by the payload and zero padding up to
//! [`RECORD_ALIGN`]. The header's `size` covers everything, so a reader can skip a record without
//! understanding its payload. All integers are little-endian.
//!
//! Variable-length arguments (name arrays, shader sources, pixel blobs) are inlined after the
//! fixed fields as a `u32` count followed by the elements. Decoding copies them into owned values,
//! so the ring bytes can be released as soon as the record is decoded.

use thiserror::Error;

use shadowgl_types::gl::{GLbitfield, GLenum, GLfloat, GLint, GLsizei, GLuint};
use shadowgl_types::{Config, Context, Display, NativeDisplay, NativeWindow, Surface};

use crate::layout::{align_up, header, HEADER_BYTES, RECORD_ALIGN};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of record")]
    UnexpectedEof,
    #[error("unknown opcode {0:#06x}")]
    UnknownOpcode(u32),
    #[error("unknown reply kind {0}")]
    UnknownReply(u32),
    #[error("record size {size} is invalid")]
    BadSize { size: u32 },
    #[error("invalid UTF-8 in string argument")]
    InvalidUtf8,
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),
}

/// Fixed header in front of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Opcode for command records, reply kind for reply records.
    pub opcode: u32,
    /// Total record size, header and padding included.
    pub size: u32,
    pub token: u32,
}

impl RecordHeader {
    /// Parses the header at the start of `bytes` and sanity-checks the size field.
    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < HEADER_BYTES {
            return Err(DecodeError::UnexpectedEof);
        }
        let word = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        let hdr = Self {
            opcode: word(header::OPCODE),
            size: word(header::SIZE),
            token: word(header::TOKEN),
        };
        let size = hdr.size as usize;
        if size < HEADER_BYTES || size % RECORD_ALIGN != 0 {
            return Err(DecodeError::BadSize { size: hdr.size });
        }
        Ok(hdr)
    }

    pub fn len(&self) -> usize {
        self.size as usize
    }

    pub fn is_empty(&self) -> bool {
        self.size as usize == HEADER_BYTES
    }
}

/// Number of ring bytes a record with `payload_len` payload bytes occupies.
pub fn record_size(payload_len: usize) -> usize {
    align_up(HEADER_BYTES + payload_len, RECORD_ALIGN)
}

/// A value that can be written to / read from a record payload.
pub trait Wire: Sized {
    fn put(&self, out: &mut Vec<u8>);
    fn get(r: &mut Reader<'_>) -> Result<Self, DecodeError>;
}

macro_rules! wire_le {
    ($($ty:ty),*) => {$(
        impl Wire for $ty {
            fn put(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }
            fn get(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
                let bytes = r.read_bytes(std::mem::size_of::<$ty>())?;
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                Ok(<$ty>::from_le_bytes(raw))
            }
        }
    )*};
}

wire_le!(u8, u32, i32, u64, i64, f32);

impl Wire for bool {
    fn put(&self, out: &mut Vec<u8>) {
        out.push(u8::from(*self));
    }
    fn get(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(r.read_u8()? != 0)
    }
}

macro_rules! wire_handle {
    ($($ty:ident),*) => {$(
        impl Wire for $ty {
            fn put(&self, out: &mut Vec<u8>) {
                self.0.put(out);
            }
            fn get(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
                Ok($ty(u64::get(r)?))
            }
        }
    )*};
}

wire_handle!(Display, Context, Surface, Config, NativeDisplay, NativeWindow);

impl<T: Wire> Wire for Vec<T> {
    fn put(&self, out: &mut Vec<u8>) {
        (self.len() as u32).put(out);
        for v in self {
            v.put(out);
        }
    }
    fn get(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let count = u32::get(r)? as usize;
        // Every element is at least one byte; refuse counts the record can't possibly hold.
        if count > r.remaining() {
            return Err(DecodeError::UnexpectedEof);
        }
        (0..count).map(|_| T::get(r)).collect()
    }
}

impl<T: Wire + Copy + Default, const N: usize> Wire for [T; N] {
    fn put(&self, out: &mut Vec<u8>) {
        for v in self {
            v.put(out);
        }
    }
    fn get(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let mut arr = [T::default(); N];
        for slot in &mut arr {
            *slot = T::get(r)?;
        }
        Ok(arr)
    }
}

impl Wire for String {
    fn put(&self, out: &mut Vec<u8>) {
        (self.len() as u32).put(out);
        out.extend_from_slice(self.as_bytes());
    }
    fn get(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let len = u32::get(r)? as usize;
        let bytes = r.read_bytes(len)?;
        core::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8)
    }
}

/// Optional byte blob (`None` encodes a null data pointer, e.g. `glBufferData(.., NULL, ..)`).
impl Wire for Option<Vec<u8>> {
    fn put(&self, out: &mut Vec<u8>) {
        match self {
            None => false.put(out),
            Some(bytes) => {
                true.put(out);
                bytes.put(out);
            }
        }
    }
    fn get(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        if bool::get(r)? {
            Ok(Some(Wire::get(r)?))
        } else {
            Ok(None)
        }
    }
}

macro_rules! commands {
    ($(
        $(#[$meta:meta])*
        $name:ident = $op:literal { $($field:ident : $ty:ty),* $(,)? }
    )*) => {
        /// A decoded command. Field names follow the GL/EGL parameter names.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Command {
            $( $(#[$meta])* $name { $($field: $ty),* }, )*
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum Opcode {
            $( $name = $op, )*
        }

        impl Opcode {
            pub const ALL: &'static [Opcode] = &[$(Opcode::$name),*];

            pub fn from_u32(raw: u32) -> Option<Self> {
                match raw {
                    $( $op => Some(Opcode::$name), )*
                    _ => None,
                }
            }
        }

        impl Command {
            pub fn opcode(&self) -> Opcode {
                match self {
                    $( Command::$name { .. } => Opcode::$name, )*
                }
            }

            fn encode_payload(&self, out: &mut Vec<u8>) {
                match self {
                    $( Command::$name { $($field),* } => { $( Wire::put($field, out); )* } )*
                }
            }

            fn decode_payload(opcode: Opcode, r: &mut Reader<'_>) -> Result<Self, DecodeError> {
                Ok(match opcode {
                    $( Opcode::$name => Command::$name { $($field: <$ty as Wire>::get(r)?),* }, )*
                })
            }
        }
    };
}

commands! {
    /// Filler / heartbeat. Handled by acknowledging its token.
    Nop = 0x0000 {}
    /// Stops the dispatch loop after acknowledging.
    Shutdown = 0x0001 {}

    GetDisplay = 0x0100 { native: NativeDisplay }
    Initialize = 0x0101 { display: Display }
    Terminate = 0x0102 { display: Display }
    ChooseConfig = 0x0103 { display: Display, attribs: Vec<i32>, max: i32 }
    CreateContext = 0x0104 { display: Display, config: Config, share: Context, attribs: Vec<i32> }
    DestroyContext = 0x0105 { display: Display, context: Context }
    CreateWindowSurface = 0x0106 { display: Display, config: Config, window: NativeWindow, attribs: Vec<i32> }
    CreatePbufferSurface = 0x0107 { display: Display, config: Config, attribs: Vec<i32> }
    DestroySurface = 0x0108 { display: Display, surface: Surface }
    MakeCurrent = 0x0109 { display: Display, draw: Surface, read: Surface, context: Context }
    ReleaseThread = 0x010A {}
    SwapBuffers = 0x010B { display: Display, surface: Surface }
    EglGetError = 0x010C {}

    GetError = 0x0200 {}
    ActiveTexture = 0x0201 { texture: GLenum }
    BlendColor = 0x0202 { rgba: [GLfloat; 4] }
    BlendEquation = 0x0203 { mode: GLenum }
    BlendEquationSeparate = 0x0204 { mode_rgb: GLenum, mode_alpha: GLenum }
    BlendFunc = 0x0205 { sfactor: GLenum, dfactor: GLenum }
    BlendFuncSeparate = 0x0206 { src_rgb: GLenum, dst_rgb: GLenum, src_alpha: GLenum, dst_alpha: GLenum }
    ClearColor = 0x0207 { rgba: [GLfloat; 4] }
    ClearDepthf = 0x0208 { depth: GLfloat }
    ClearStencil = 0x0209 { s: GLint }
    ColorMask = 0x020A { mask: [bool; 4] }
    CullFace = 0x020B { mode: GLenum }
    DepthFunc = 0x020C { func: GLenum }
    DepthMask = 0x020D { flag: bool }
    DepthRangef = 0x020E { near: GLfloat, far: GLfloat }
    Enable = 0x020F { cap: GLenum }
    Disable = 0x0210 { cap: GLenum }
    FrontFace = 0x0211 { mode: GLenum }
    Hint = 0x0212 { target: GLenum, mode: GLenum }
    LineWidth = 0x0213 { width: GLfloat }
    PixelStorei = 0x0214 { pname: GLenum, param: GLint }
    PolygonOffset = 0x0215 { factor: GLfloat, units: GLfloat }
    SampleCoverage = 0x0216 { value: GLfloat, invert: bool }
    Scissor = 0x0217 { x: GLint, y: GLint, width: GLsizei, height: GLsizei }
    Viewport = 0x0218 { x: GLint, y: GLint, width: GLsizei, height: GLsizei }
    StencilFunc = 0x0219 { func: GLenum, reference: GLint, mask: GLuint }
    StencilFuncSeparate = 0x021A { face: GLenum, func: GLenum, reference: GLint, mask: GLuint }
    StencilMask = 0x021B { mask: GLuint }
    StencilMaskSeparate = 0x021C { face: GLenum, mask: GLuint }
    StencilOp = 0x021D { fail: GLenum, zfail: GLenum, zpass: GLenum }
    StencilOpSeparate = 0x021E { face: GLenum, fail: GLenum, zfail: GLenum, zpass: GLenum }

    BindBuffer = 0x0300 { target: GLenum, buffer: GLuint }
    BindTexture = 0x0301 { target: GLenum, texture: GLuint }
    BindFramebuffer = 0x0302 { target: GLenum, framebuffer: GLuint }
    BindRenderbuffer = 0x0303 { target: GLenum, renderbuffer: GLuint }
    GenBuffers = 0x0304 { names: Vec<GLuint> }
    GenTextures = 0x0305 { names: Vec<GLuint> }
    GenFramebuffers = 0x0306 { names: Vec<GLuint> }
    GenRenderbuffers = 0x0307 { names: Vec<GLuint> }
    DeleteBuffers = 0x0308 { names: Vec<GLuint> }
    DeleteTextures = 0x0309 { names: Vec<GLuint> }
    DeleteFramebuffers = 0x030A { names: Vec<GLuint> }
    DeleteRenderbuffers = 0x030B { names: Vec<GLuint> }
    BufferData = 0x030C { target: GLenum, data: Option<Vec<u8>>, size: i64, usage: GLenum }
    BufferSubData = 0x030D { target: GLenum, offset: i64, data: Vec<u8> }
    TexImage2D = 0x030E {
        target: GLenum, level: GLint, internal_format: GLint, width: GLsizei, height: GLsizei,
        border: GLint, format: GLenum, ty: GLenum, pixels: Option<Vec<u8>>,
    }
    TexParameteri = 0x030F { target: GLenum, pname: GLenum, param: GLint }
    GenerateMipmap = 0x0310 { target: GLenum }
    CheckFramebufferStatus = 0x0311 { target: GLenum }

    CreateShader = 0x0400 { kind: GLenum }
    ShaderSource = 0x0401 { shader: GLuint, sources: Vec<String> }
    CompileShader = 0x0402 { shader: GLuint }
    CreateProgram = 0x0403 {}
    AttachShader = 0x0404 { program: GLuint, shader: GLuint }
    LinkProgram = 0x0405 { program: GLuint }
    UseProgram = 0x0406 { program: GLuint }
    DeleteProgram = 0x0407 { program: GLuint }
    GetAttribLocation = 0x0408 { program: GLuint, name: String }
    GetUniformLocation = 0x0409 { program: GLuint, name: String }

    EnableVertexAttribArray = 0x0500 { index: GLuint }
    DisableVertexAttribArray = 0x0501 { index: GLuint }
    VertexAttribPointer = 0x0502 {
        index: GLuint, size: GLint, ty: GLenum, normalized: bool, stride: GLsizei, offset: u64,
    }
    DrawArrays = 0x0503 { mode: GLenum, first: GLint, count: GLsizei }
    DrawElements = 0x0504 { mode: GLenum, count: GLsizei, ty: GLenum, offset: u64 }
    Clear = 0x0505 { mask: GLbitfield }
    Flush = 0x0506 {}
    Finish = 0x0507 {}

    GetIntegerv = 0x0600 { pname: GLenum }
    IsEnabled = 0x0601 { cap: GLenum }
}

impl Command {
    /// Whether the server posts a reply for this command.
    pub fn expects_reply(&self) -> bool {
        matches!(
            self,
            Command::GetDisplay { .. }
                | Command::Initialize { .. }
                | Command::Terminate { .. }
                | Command::ChooseConfig { .. }
                | Command::CreateContext { .. }
                | Command::DestroyContext { .. }
                | Command::CreateWindowSurface { .. }
                | Command::CreatePbufferSurface { .. }
                | Command::DestroySurface { .. }
                | Command::MakeCurrent { .. }
                | Command::ReleaseThread { .. }
                | Command::SwapBuffers { .. }
                | Command::EglGetError { .. }
                | Command::GetError { .. }
                | Command::CheckFramebufferStatus { .. }
                | Command::CreateShader { .. }
                | Command::CreateProgram { .. }
                | Command::GetAttribLocation { .. }
                | Command::GetUniformLocation { .. }
                | Command::GetIntegerv { .. }
                | Command::IsEnabled { .. }
        )
    }
}

/// Appends a complete command record (header, payload, padding) to `out`.
pub fn encode_command_into(token: u32, cmd: &Command, out: &mut Vec<u8>) {
    encode_record(cmd.opcode() as u32, token, out, |out| cmd.encode_payload(out));
}

pub fn encode_command(token: u32, cmd: &Command) -> Vec<u8> {
    let mut out = Vec::new();
    encode_command_into(token, cmd, &mut out);
    out
}

/// Decodes one complete command record. `bytes` must start at the header and may extend past
/// the record; only `header.size` bytes are looked at.
pub fn decode_command(bytes: &[u8]) -> Result<(RecordHeader, Command), DecodeError> {
    let hdr = RecordHeader::parse(bytes)?;
    let body = record_body(bytes, &hdr)?;
    let opcode = Opcode::from_u32(hdr.opcode).ok_or(DecodeError::UnknownOpcode(hdr.opcode))?;
    let mut r = Reader::new(body);
    let cmd = Command::decode_payload(opcode, &mut r)?;
    r.finish()?;
    Ok((hdr, cmd))
}

/// Return value of a command, posted on the reply ring under the command's token.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyValue {
    Bool(bool),
    Enum(GLenum),
    Int(GLint),
    Uint(GLuint),
    Ints(Vec<GLint>),
    Display(Display),
    Context(Context),
    Surface(Surface),
    Configs(Vec<Config>),
    Initialized { ok: bool, major: i32, minor: i32 },
}

const REPLY_BOOL: u32 = 0;
const REPLY_ENUM: u32 = 1;
const REPLY_INT: u32 = 2;
const REPLY_UINT: u32 = 3;
const REPLY_INTS: u32 = 4;
const REPLY_DISPLAY: u32 = 5;
const REPLY_CONTEXT: u32 = 6;
const REPLY_SURFACE: u32 = 7;
const REPLY_CONFIGS: u32 = 8;
const REPLY_INITIALIZED: u32 = 9;

pub fn encode_reply_into(token: u32, reply: &ReplyValue, out: &mut Vec<u8>) {
    let kind = match reply {
        ReplyValue::Bool(_) => REPLY_BOOL,
        ReplyValue::Enum(_) => REPLY_ENUM,
        ReplyValue::Int(_) => REPLY_INT,
        ReplyValue::Uint(_) => REPLY_UINT,
        ReplyValue::Ints(_) => REPLY_INTS,
        ReplyValue::Display(_) => REPLY_DISPLAY,
        ReplyValue::Context(_) => REPLY_CONTEXT,
        ReplyValue::Surface(_) => REPLY_SURFACE,
        ReplyValue::Configs(_) => REPLY_CONFIGS,
        ReplyValue::Initialized { .. } => REPLY_INITIALIZED,
    };
    encode_record(kind, token, out, |out| match reply {
        ReplyValue::Bool(v) => v.put(out),
        ReplyValue::Enum(v) | ReplyValue::Uint(v) => v.put(out),
        ReplyValue::Int(v) => v.put(out),
        ReplyValue::Ints(v) => v.put(out),
        ReplyValue::Display(v) => v.put(out),
        ReplyValue::Context(v) => v.put(out),
        ReplyValue::Surface(v) => v.put(out),
        ReplyValue::Configs(v) => v.put(out),
        ReplyValue::Initialized { ok, major, minor } => {
            ok.put(out);
            major.put(out);
            minor.put(out);
        }
    });
}

pub fn decode_reply(bytes: &[u8]) -> Result<(RecordHeader, ReplyValue), DecodeError> {
    let hdr = RecordHeader::parse(bytes)?;
    let mut r = Reader::new(record_body(bytes, &hdr)?);
    let value = match hdr.opcode {
        REPLY_BOOL => ReplyValue::Bool(bool::get(&mut r)?),
        REPLY_ENUM => ReplyValue::Enum(u32::get(&mut r)?),
        REPLY_INT => ReplyValue::Int(i32::get(&mut r)?),
        REPLY_UINT => ReplyValue::Uint(u32::get(&mut r)?),
        REPLY_INTS => ReplyValue::Ints(Wire::get(&mut r)?),
        REPLY_DISPLAY => ReplyValue::Display(Display::get(&mut r)?),
        REPLY_CONTEXT => ReplyValue::Context(Context::get(&mut r)?),
        REPLY_SURFACE => ReplyValue::Surface(Surface::get(&mut r)?),
        REPLY_CONFIGS => ReplyValue::Configs(Wire::get(&mut r)?),
        REPLY_INITIALIZED => ReplyValue::Initialized {
            ok: bool::get(&mut r)?,
            major: i32::get(&mut r)?,
            minor: i32::get(&mut r)?,
        },
        other => return Err(DecodeError::UnknownReply(other)),
    };
    r.finish()?;
    Ok((hdr, value))
}

fn encode_record(opcode: u32, token: u32, out: &mut Vec<u8>, payload: impl FnOnce(&mut Vec<u8>)) {
    let start = out.len();
    opcode.put(out);
    0u32.put(out);
    token.put(out);
    payload(out);
    let size = align_up(out.len() - start, RECORD_ALIGN);
    out.resize(start + size, 0);
    let size_at = start + header::SIZE;
    out[size_at..size_at + 4].copy_from_slice(&(size as u32).to_le_bytes());
}

fn record_body<'a>(bytes: &'a [u8], hdr: &RecordHeader) -> Result<&'a [u8], DecodeError> {
    bytes
        .get(HEADER_BYTES..hdr.len())
        .ok_or(DecodeError::UnexpectedEof)
}

pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let b = *self.bytes.get(self.pos).ok_or(DecodeError::UnexpectedEof)?;
        self.pos += 1;
        Ok(b)
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::UnexpectedEof);
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.bytes[start..start + len])
    }

    /// Only alignment padding may follow the payload.
    fn finish(&self) -> Result<(), DecodeError> {
        let rest = self.remaining();
        if rest >= RECORD_ALIGN {
            return Err(DecodeError::TrailingBytes(rest));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadowgl_types::gl::*;

    #[test]
    fn size_field_covers_header_payload_and_padding() {
        let bytes = encode_command(
            7,
            &Command::ShaderSource {
                shader: 3,
                sources: vec!["void main(){}".into(), "x".into()],
            },
        );
        assert_eq!(bytes.len() % RECORD_ALIGN, 0);
        let hdr = RecordHeader::parse(&bytes).unwrap();
        assert_eq!(hdr.len(), bytes.len());
        assert_eq!(hdr.token, 7);
        assert_eq!(hdr.opcode, Opcode::ShaderSource as u32);
    }

    #[test]
    fn decode_ignores_bytes_after_the_record() {
        let mut bytes = encode_command(1, &Command::BlendFunc { sfactor: GL_ONE, dfactor: GL_ZERO });
        let first = bytes.len();
        encode_command_into(2, &Command::Flush {}, &mut bytes);

        let (hdr, cmd) = decode_command(&bytes).unwrap();
        assert_eq!(hdr.len(), first);
        assert_eq!(cmd, Command::BlendFunc { sfactor: GL_ONE, dfactor: GL_ZERO });

        let (hdr, cmd) = decode_command(&bytes[first..]).unwrap();
        assert_eq!(hdr.token, 2);
        assert_eq!(cmd, Command::Flush {});
    }

    #[test]
    fn unknown_opcode_is_rejected_but_skippable() {
        let mut bytes = encode_command(1, &Command::Nop {});
        bytes[0..4].copy_from_slice(&0xBEEFu32.to_le_bytes());
        assert_eq!(decode_command(&bytes), Err(DecodeError::UnknownOpcode(0xBEEF)));
        assert_eq!(RecordHeader::parse(&bytes).unwrap().len(), HEADER_BYTES);
    }

    #[test]
    fn bad_sizes_are_rejected() {
        let mut bytes = encode_command(1, &Command::Nop {});
        bytes[4..8].copy_from_slice(&6u32.to_le_bytes());
        assert_eq!(RecordHeader::parse(&bytes), Err(DecodeError::BadSize { size: 6 }));

        let bytes = encode_command(1, &Command::ClearStencil { s: 1 });
        assert_eq!(decode_command(&bytes[..HEADER_BYTES]), Err(DecodeError::UnexpectedEof));
    }

    #[test]
    fn huge_array_counts_fail_cleanly() {
        let mut bytes = encode_command(1, &Command::GenBuffers { names: vec![1] });
        let count_at = HEADER_BYTES;
        bytes[count_at..count_at + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert_eq!(decode_command(&bytes), Err(DecodeError::UnexpectedEof));
    }

    #[test]
    fn null_blob_survives() {
        let cmd = Command::BufferData {
            target: GL_ARRAY_BUFFER,
            data: None,
            size: 64,
            usage: GL_STATIC_DRAW,
        };
        let (_, back) = decode_command(&encode_command(5, &cmd)).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn replies_carry_tokens() {
        let mut out = Vec::new();
        encode_reply_into(9, &ReplyValue::Ints(vec![0, 0, 640, 480]), &mut out);
        let (hdr, value) = decode_reply(&out).unwrap();
        assert_eq!(hdr.token, 9);
        assert_eq!(value, ReplyValue::Ints(vec![0, 0, 640, 480]));
    }

    #[test]
    fn opcode_table_is_consistent() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_u32(*op as u32), Some(*op));
        }
    }
}
