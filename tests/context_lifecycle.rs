mod common;

use shadowgl_ipc::{Command, ReplyValue};
use shadowgl_server::shadow::NUM_EMBEDDED_ATTRIBS;
use shadowgl_server::DestroyFlags;
use shadowgl_types::gl::*;
use shadowgl_types::Surface;

use common::{context, display, make_current, pbuffer, reply, server};

#[test]
fn switching_contexts_keeps_the_old_record_until_destroyed() {
    let (_driver, server) = server();
    let mut engine = server.engine();
    let dpy = display(&mut engine);
    let d1 = pbuffer(&mut engine, dpy);
    let ctx1 = context(&mut engine, dpy);
    let ctx2 = context(&mut engine, dpy);

    assert!(make_current(&mut engine, dpy, d1, ctx1));
    let records = server.registry().records();
    assert_eq!(records.len(), 1);
    assert!(records[0].active);

    assert!(make_current(&mut engine, dpy, d1, ctx2));
    let records = server.registry().records();
    assert_eq!(records.len(), 2);
    let first = records.iter().find(|r| r.context == ctx1).unwrap();
    assert!(!first.active);
    assert!(first.destroy.is_empty());

    assert_eq!(
        reply(&mut engine, Command::DestroyContext { display: dpy, context: ctx1 }),
        ReplyValue::Bool(true)
    );
    let records = server.registry().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].context, ctx2);
}

#[test]
fn destroying_surfaces_of_the_current_context_is_deferred() {
    let (_driver, server) = server();
    let mut engine = server.engine();
    let dpy = display(&mut engine);
    let surface = pbuffer(&mut engine, dpy);
    let ctx = context(&mut engine, dpy);
    assert!(make_current(&mut engine, dpy, surface, ctx));

    reply(&mut engine, Command::DestroySurface { display: dpy, surface });
    let record = server.registry().records()[0];
    assert_eq!(record.destroy, DestroyFlags::DRAW | DestroyFlags::READ);
    assert_eq!(record.draw, surface);

    reply(&mut engine, Command::ReleaseThread {});
    let records = server.registry().records();
    assert_eq!(records.len(), 1, "a context outlives its surfaces");
    assert_eq!(records[0].draw, Surface::NONE);
    assert_eq!(records[0].read, Surface::NONE);
    assert!(records[0].destroy.is_empty());
}

#[test]
fn terminate_reaps_idle_records_and_flags_the_callers_own() {
    let (_driver, server) = server();
    let mut busy = server.engine();
    let mut idle = server.engine();
    let mut elsewhere = server.engine();
    let dpy = display(&mut busy);
    reply(&mut busy, Command::Initialize { display: dpy });
    assert!(server.registry().is_initialized());

    let surface = pbuffer(&mut busy, dpy);
    let ctx_busy = context(&mut busy, dpy);
    let ctx_idle = context(&mut busy, dpy);
    let ctx_elsewhere = context(&mut busy, dpy);
    assert!(make_current(&mut busy, dpy, surface, ctx_busy));
    assert!(make_current(&mut elsewhere, dpy, surface, ctx_elsewhere));
    assert!(make_current(&mut idle, dpy, surface, ctx_idle));
    reply(&mut idle, Command::ReleaseThread {});
    assert_eq!(server.registry().len(), 3);

    assert_eq!(
        reply(&mut busy, Command::Terminate { display: dpy }),
        ReplyValue::Bool(true)
    );
    let records = server.registry().records();
    assert_eq!(records.len(), 2);
    let flagged = |ctx| {
        records
            .iter()
            .find(|r| r.context == ctx)
            .map(|r| r.destroy.contains(DestroyFlags::DISPLAY))
    };
    assert_eq!(flagged(ctx_busy), Some(true));
    assert_eq!(flagged(ctx_elsewhere), Some(false));

    drop(busy);
    assert_eq!(server.registry().len(), 1);
    drop(elsewhere);
    assert_eq!(server.registry().len(), 1);
}

#[test]
fn error_query_drains_once() {
    let (_driver, server) = server();
    let mut engine = server.engine();
    let dpy = display(&mut engine);
    let surface = pbuffer(&mut engine, dpy);
    let ctx = context(&mut engine, dpy);
    assert!(make_current(&mut engine, dpy, surface, ctx));

    engine.execute(Command::PixelStorei { pname: GL_PACK_ALIGNMENT, param: 3 });
    assert_eq!(reply(&mut engine, Command::GetError {}), ReplyValue::Enum(GL_INVALID_VALUE));
    assert_eq!(reply(&mut engine, Command::GetError {}), ReplyValue::Enum(GL_NO_ERROR));
    assert_eq!(reply(&mut engine, Command::GetError {}), ReplyValue::Enum(GL_NO_ERROR));
}

#[test]
fn vertex_attribs_grow_past_the_inline_capacity() {
    let (driver, server) = server();
    driver.set_integer(GL_MAX_VERTEX_ATTRIBS, &[64]);
    let mut engine = server.engine();
    let dpy = display(&mut engine);
    let surface = pbuffer(&mut engine, dpy);
    let ctx = context(&mut engine, dpy);
    assert!(make_current(&mut engine, dpy, surface, ctx));

    let n = NUM_EMBEDDED_ATTRIBS as u32 + 4;
    for index in 0..=n {
        engine.execute(Command::EnableVertexAttribArray { index });
    }
    assert_eq!(reply(&mut engine, Command::GetError {}), ReplyValue::Enum(GL_NO_ERROR));

    let attribs = &engine.current().unwrap().shadow().vertex_attribs;
    assert_eq!(attribs.len(), n as usize + 1);
    assert!(!attribs.is_inline());
    assert!(attribs.as_slice().iter().all(|a| a.enabled));
    // One allocation per index past the inline array; each replaced the one before it.
    assert_eq!(attribs.heap_allocations(), n as usize + 1 - NUM_EMBEDDED_ATTRIBS);
}

#[test]
fn object_names_are_shared_between_workers() {
    common::init_tracing();
    let driver = std::sync::Arc::new(shadowgl_server::testing::RecordingDriver::with_name_base(500));
    let server = shadowgl_server::Server::new(driver.clone());

    let mut first = server.engine();
    let dpy = display(&mut first);
    let surface = pbuffer(&mut first, dpy);
    let ctx_a = context(&mut first, dpy);
    let ctx_b = context(&mut first, dpy);
    assert!(make_current(&mut first, dpy, surface, ctx_a));
    first.execute(Command::GenTextures { names: vec![9] });

    let mut second = server.engine();
    assert!(make_current(&mut second, dpy, surface, ctx_b));
    second.execute(Command::BindTexture { target: GL_TEXTURE_2D, texture: 9 });

    let bind = driver.last(shadowgl_server::EntryPoint::BindTexture).unwrap();
    assert_eq!(bind.args, format!("{:?}", (GL_TEXTURE_2D, 500u32)));
    assert_eq!(driver.count(shadowgl_server::EntryPoint::GenTextures), 1);
}
