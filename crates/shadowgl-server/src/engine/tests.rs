use std::sync::Arc;

use shadowgl_ipc::{Command, ReplyValue};
use shadowgl_types::gl::*;
use shadowgl_types::{Config, Context, Display, NativeDisplay, Surface};

use super::Engine;
use crate::driver::EntryPoint;
use crate::names::NameTranslation;
use crate::registry::ContextRegistry;
use crate::stats::EngineStats;
use crate::testing::{RecordingDriver, DRIVER_NAME_BASE};

struct Fixture {
    driver: Arc<RecordingDriver>,
    registry: Arc<ContextRegistry>,
    names: Arc<NameTranslation>,
    stats: Arc<EngineStats>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            driver: Arc::new(RecordingDriver::new()),
            registry: Arc::new(ContextRegistry::new()),
            names: Arc::new(NameTranslation::new()),
            stats: Arc::new(EngineStats::default()),
        }
    }

    fn engine(&self) -> Engine {
        Engine::new(
            self.driver.clone(),
            self.registry.clone(),
            self.names.clone(),
            self.stats.clone(),
        )
    }
}

struct Bound {
    display: Display,
    context: Context,
    surface: Surface,
}

/// Display, context and pbuffer surface, made current on `engine`.
fn make_current(engine: &mut Engine) -> Bound {
    let Some(ReplyValue::Display(display)) = engine.execute(Command::GetDisplay {
        native: NativeDisplay(0),
    }) else {
        panic!("get-display failed");
    };
    engine.execute(Command::Initialize { display });
    let Some(ReplyValue::Context(context)) = engine.execute(Command::CreateContext {
        display,
        config: Config(1),
        share: Context::NONE,
        attribs: vec![],
    }) else {
        panic!("create-context failed");
    };
    let Some(ReplyValue::Surface(surface)) = engine.execute(Command::CreatePbufferSurface {
        display,
        config: Config(1),
        attribs: vec![],
    }) else {
        panic!("create-pbuffer-surface failed");
    };
    let bound = Bound {
        display,
        context,
        surface,
    };
    assert!(bind(engine, &bound));
    bound
}

fn bind(engine: &mut Engine, b: &Bound) -> bool {
    engine.execute(Command::MakeCurrent {
        display: b.display,
        draw: b.surface,
        read: b.surface,
        context: b.context,
    }) == Some(ReplyValue::Bool(true))
}

fn gl_error(engine: &mut Engine) -> GLenum {
    match engine.execute(Command::GetError {}) {
        Some(ReplyValue::Enum(error)) => error,
        other => panic!("unexpected reply {other:?}"),
    }
}

fn integers(engine: &mut Engine, pname: GLenum) -> Vec<GLint> {
    match engine.execute(Command::GetIntegerv { pname }) {
        Some(ReplyValue::Ints(values)) => values,
        other => panic!("unexpected reply {other:?}"),
    }
}

#[test]
fn calls_without_a_current_context_are_dropped() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    engine.execute(Command::Enable { cap: GL_BLEND });
    assert_eq!(fx.driver.count(EntryPoint::Enable), 0);
    assert_eq!(gl_error(&mut engine), GL_INVALID_OPERATION);
}

#[test]
fn unbound_entry_point_records_invalid_operation() {
    let fx = Fixture::new();
    fx.driver.unbind(EntryPoint::CullFace);
    let mut engine = fx.engine();
    make_current(&mut engine);

    engine.execute(Command::CullFace { mode: GL_FRONT });
    assert_eq!(gl_error(&mut engine), GL_INVALID_OPERATION);
    assert_eq!(gl_error(&mut engine), GL_NO_ERROR);
}

#[test]
fn identical_state_is_sent_once() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    make_current(&mut engine);

    for _ in 0..2 {
        engine.execute(Command::ClearColor {
            rgba: [0.25, 0.5, 0.75, 1.0],
        });
    }
    assert_eq!(fx.driver.count(EntryPoint::ClearColor), 1);
    assert_eq!(gl_error(&mut engine), GL_NO_ERROR);
    assert_eq!(fx.driver.count(EntryPoint::GetError), 0);
}

#[test]
fn default_valued_setter_never_reaches_the_driver() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    make_current(&mut engine);

    engine.execute(Command::DepthFunc { func: GL_LESS });
    engine.execute(Command::Disable { cap: GL_BLEND });
    assert_eq!(fx.driver.count(EntryPoint::DepthFunc), 0);
    assert_eq!(fx.driver.count(EntryPoint::Disable), 0);
}

#[test]
fn invalid_enum_short_circuits() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    make_current(&mut engine);

    engine.execute(Command::Enable { cap: GL_TEXTURE_2D });
    assert_eq!(fx.driver.count(EntryPoint::Enable), 0);
    assert_eq!(gl_error(&mut engine), GL_INVALID_ENUM);
    assert_eq!(gl_error(&mut engine), GL_NO_ERROR);
}

#[test]
fn first_recorded_error_wins() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    make_current(&mut engine);

    engine.execute(Command::DepthFunc { func: 0xdead });
    engine.execute(Command::LineWidth { width: 0.0 });
    assert_eq!(gl_error(&mut engine), GL_INVALID_ENUM);
    assert_eq!(fx.driver.count(EntryPoint::LineWidth), 0);
}

#[test]
fn forwarded_calls_make_the_next_error_query_authoritative() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    make_current(&mut engine);

    engine.execute(Command::DrawArrays {
        mode: GL_TRIANGLES,
        first: 0,
        count: 3,
    });
    fx.driver.push_error(GL_INVALID_FRAMEBUFFER_OPERATION);
    assert_eq!(gl_error(&mut engine), GL_INVALID_FRAMEBUFFER_OPERATION);
    assert_eq!(fx.driver.count(EntryPoint::GetError), 1);

    assert_eq!(gl_error(&mut engine), GL_NO_ERROR);
    assert_eq!(fx.driver.count(EntryPoint::GetError), 1);
    assert_eq!(fx.stats.snapshot().authoritative_error_queries, 1);
}

#[test]
fn authoritative_query_returns_the_driver_answer() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    make_current(&mut engine);

    engine.execute(Command::CullFace { mode: GL_TRIANGLES });
    engine.execute(Command::Flush {});
    assert_eq!(gl_error(&mut engine), GL_NO_ERROR);
    assert_eq!(fx.driver.count(EntryPoint::GetError), 1);

    // The cached error was cleared along with the flag.
    assert_eq!(gl_error(&mut engine), GL_NO_ERROR);
    assert_eq!(fx.driver.count(EntryPoint::GetError), 1);

    fx.driver.push_error(GL_OUT_OF_MEMORY);
    engine.execute(Command::Flush {});
    assert_eq!(gl_error(&mut engine), GL_OUT_OF_MEMORY);
}

#[test]
fn binds_translate_client_names() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    make_current(&mut engine);

    engine.execute(Command::GenBuffers { names: vec![1, 2] });
    engine.execute(Command::BindBuffer {
        target: GL_ARRAY_BUFFER,
        buffer: 2,
    });
    let bind = fx.driver.last(EntryPoint::BindBuffer).unwrap();
    assert_eq!(bind.args, format!("{:?}", (GL_ARRAY_BUFFER, DRIVER_NAME_BASE + 1)));
    assert_eq!(integers(&mut engine, GL_ARRAY_BUFFER_BINDING), vec![2]);

    engine.execute(Command::BindBuffer {
        target: GL_ARRAY_BUFFER,
        buffer: 2,
    });
    assert_eq!(fx.driver.count(EntryPoint::BindBuffer), 1);
}

#[test]
fn binding_an_unknown_name_creates_the_object() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    make_current(&mut engine);

    engine.execute(Command::BindTexture {
        target: GL_TEXTURE_2D,
        texture: 7,
    });
    assert_eq!(fx.driver.count(EntryPoint::GenTextures), 1);
    let bind = fx.driver.last(EntryPoint::BindTexture).unwrap();
    assert_eq!(bind.args, format!("{:?}", (GL_TEXTURE_2D, DRIVER_NAME_BASE)));
    assert_eq!(fx.names.lookup(crate::names::ObjectClass::Texture, 7), Some(DRIVER_NAME_BASE));
}

#[test]
fn deleting_a_bound_buffer_resets_the_binding() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    make_current(&mut engine);

    engine.execute(Command::GenBuffers { names: vec![4] });
    engine.execute(Command::BindBuffer {
        target: GL_ELEMENT_ARRAY_BUFFER,
        buffer: 4,
    });
    engine.execute(Command::DeleteBuffers { names: vec![4] });

    let delete = fx.driver.last(EntryPoint::DeleteBuffers).unwrap();
    assert_eq!(delete.args, format!("{:?}", [DRIVER_NAME_BASE]));
    assert_eq!(integers(&mut engine, GL_ELEMENT_ARRAY_BUFFER_BINDING), vec![0]);
    assert_eq!(fx.names.lookup(crate::names::ObjectClass::Buffer, 4), None);
}

#[test]
fn limits_are_queried_once_and_bound_attribute_indices() {
    let fx = Fixture::new();
    fx.driver.set_integer(GL_MAX_VERTEX_ATTRIBS, &[16]);
    let mut engine = fx.engine();
    make_current(&mut engine);

    engine.execute(Command::EnableVertexAttribArray { index: 3 });
    engine.execute(Command::EnableVertexAttribArray { index: 15 });
    assert_eq!(fx.driver.count(EntryPoint::GetIntegerv), 1);
    assert_eq!(fx.driver.count(EntryPoint::EnableVertexAttribArray), 2);

    engine.execute(Command::EnableVertexAttribArray { index: 16 });
    assert_eq!(gl_error(&mut engine), GL_INVALID_VALUE);
    assert_eq!(integers(&mut engine, GL_MAX_VERTEX_ATTRIBS), vec![16]);
    assert_eq!(fx.driver.count(EntryPoint::GetIntegerv), 1);
}

fn tex_image(width: GLsizei, height: GLsizei, format: GLenum, pixels: Option<Vec<u8>>) -> Command {
    Command::TexImage2D {
        target: GL_TEXTURE_2D,
        level: 0,
        internal_format: format as GLint,
        width,
        height,
        border: 0,
        format,
        ty: GL_UNSIGNED_BYTE,
        pixels,
    }
}

#[test]
fn short_pixel_uploads_never_reach_the_driver() {
    let fx = Fixture::new();
    fx.driver.set_integer(GL_MAX_TEXTURE_SIZE, &[4096]);
    let mut engine = fx.engine();
    make_current(&mut engine);

    engine.execute(tex_image(64, 64, GL_RGBA, Some(vec![0; 4])));
    assert_eq!(fx.driver.count(EntryPoint::TexImage2D), 0);
    assert_eq!(gl_error(&mut engine), GL_INVALID_VALUE);

    // 3-byte rows padded to the default alignment of 4; the last row is not padded.
    engine.execute(tex_image(3, 2, GL_RGB, Some(vec![0; 12 + 8])));
    assert_eq!(fx.driver.count(EntryPoint::TexImage2D), 0);
    assert_eq!(gl_error(&mut engine), GL_INVALID_VALUE);
    engine.execute(tex_image(3, 2, GL_RGB, Some(vec![0; 12 + 9])));
    assert_eq!(fx.driver.count(EntryPoint::TexImage2D), 1);

    engine.execute(Command::PixelStorei { pname: GL_UNPACK_ALIGNMENT, param: 1 });
    engine.execute(tex_image(3, 2, GL_RGB, Some(vec![0; 18])));
    engine.execute(tex_image(64, 64, GL_RGBA, None));
    assert_eq!(fx.driver.count(EntryPoint::TexImage2D), 3);
}

#[test]
fn mismatched_pixel_format_and_type_is_rejected() {
    let fx = Fixture::new();
    fx.driver.set_integer(GL_MAX_TEXTURE_SIZE, &[64]);
    let mut engine = fx.engine();
    make_current(&mut engine);

    engine.execute(Command::TexImage2D {
        target: GL_TEXTURE_2D,
        level: 0,
        internal_format: GL_RGB as GLint,
        width: 1,
        height: 1,
        border: 0,
        format: GL_RGB,
        ty: GL_UNSIGNED_SHORT_4_4_4_4,
        pixels: Some(vec![0; 2]),
    });
    assert_eq!(gl_error(&mut engine), GL_INVALID_OPERATION);
    engine.execute(tex_image(1, 1, 0xbeef, None));
    assert_eq!(gl_error(&mut engine), GL_INVALID_ENUM);
    assert_eq!(fx.driver.count(EntryPoint::TexImage2D), 0);
}

#[test]
fn attribute_descriptors_spill_to_the_heap() {
    let fx = Fixture::new();
    fx.driver.set_integer(GL_MAX_VERTEX_ATTRIBS, &[64]);
    let mut engine = fx.engine();
    make_current(&mut engine);

    engine.execute(Command::VertexAttribPointer {
        index: 40,
        size: 3,
        ty: GL_FLOAT,
        normalized: false,
        stride: 12,
        offset: 0,
    });
    let attribs = &engine.current().unwrap().shadow().vertex_attribs;
    assert!(!attribs.is_inline());
    assert_eq!(attribs.len(), 41);
    assert_eq!(attribs.get(40).unwrap().size, 3);
}

#[test]
fn attribute_pointer_validates_size() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    make_current(&mut engine);

    engine.execute(Command::VertexAttribPointer {
        index: 0,
        size: 5,
        ty: GL_FLOAT,
        normalized: false,
        stride: 0,
        offset: 0,
    });
    assert_eq!(gl_error(&mut engine), GL_INVALID_VALUE);
    assert_eq!(fx.driver.count(EntryPoint::VertexAttribPointer), 0);
}

#[test]
fn locations_are_cached_until_relink() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    make_current(&mut engine);

    let query = || Command::GetUniformLocation {
        program: 3,
        name: "u_mvp".into(),
    };
    assert_eq!(engine.execute(query()), Some(ReplyValue::Int(5)));
    assert_eq!(engine.execute(query()), Some(ReplyValue::Int(5)));
    assert_eq!(fx.driver.count(EntryPoint::GetUniformLocation), 1);

    engine.execute(Command::LinkProgram { program: 3 });
    engine.execute(query());
    assert_eq!(fx.driver.count(EntryPoint::GetUniformLocation), 2);
}

#[test]
fn capabilities_answer_from_cache() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    make_current(&mut engine);

    assert_eq!(
        engine.execute(Command::IsEnabled { cap: GL_DITHER }),
        Some(ReplyValue::Bool(true))
    );
    engine.execute(Command::Enable { cap: GL_SCISSOR_TEST });
    assert_eq!(
        engine.execute(Command::IsEnabled { cap: GL_SCISSOR_TEST }),
        Some(ReplyValue::Bool(true))
    );
    assert_eq!(fx.driver.count(EntryPoint::IsEnabled), 0);

    assert_eq!(
        engine.execute(Command::IsEnabled { cap: 0x1234 }),
        Some(ReplyValue::Bool(false))
    );
    assert_eq!(gl_error(&mut engine), GL_INVALID_ENUM);
}

#[test]
fn repeating_make_current_skips_the_driver() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let bound = make_current(&mut engine);

    assert!(bind(&mut engine, &bound));
    assert_eq!(fx.driver.count(EntryPoint::EglMakeCurrent), 1);
}

#[test]
fn a_context_is_current_on_one_worker_at_a_time() {
    let fx = Fixture::new();
    let mut first = fx.engine();
    let bound = make_current(&mut first);

    let mut second = fx.engine();
    assert!(!bind(&mut second, &bound));
    assert!(second.current().is_none());

    drop(first);
    assert!(bind(&mut second, &bound));
}

#[test]
fn shadow_state_survives_a_context_switch() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let bound = make_current(&mut engine);
    engine.execute(Command::FrontFace { mode: GL_CW });

    engine.execute(Command::ReleaseThread {});
    assert!(engine.current().is_none());
    assert!(bind(&mut engine, &bound));
    assert_eq!(integers(&mut engine, GL_FRONT_FACE), vec![GL_CW as GLint]);
    assert_eq!(fx.driver.count(EntryPoint::FrontFace), 1);
}

#[test]
fn dropping_the_engine_releases_its_context() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    make_current(&mut engine);
    let handle = engine.current().unwrap().handle();

    drop(engine);
    let snapshot = fx.registry.snapshot(handle).unwrap();
    assert!(!snapshot.active);
}

#[test]
fn destroying_the_current_context_defers_the_reap() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let bound = make_current(&mut engine);
    let handle = engine.current().unwrap().handle();

    assert_eq!(
        engine.execute(Command::DestroyContext {
            display: bound.display,
            context: bound.context,
        }),
        Some(ReplyValue::Bool(true))
    );
    assert!(fx.registry.snapshot(handle).is_some());

    engine.execute(Command::ReleaseThread {});
    assert!(fx.registry.snapshot(handle).is_none());
}
