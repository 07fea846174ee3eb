mod common;

use std::thread;

use anyhow::Result;

use shadowgl_ipc::{channel, Command, ReplyValue, RingConfig, TransportMode};
use shadowgl_server::{DispatchOutcome, Dispatcher, EntryPoint};
use shadowgl_types::gl::*;
use shadowgl_types::{Config, Context, NativeDisplay};

fn round_trip(mode: TransportMode) -> Result<()> {
    let (driver, server) = common::server();
    let config = RingConfig::default().with_capacity(64 * 1024).with_mode(mode);
    let (mut client, server_end) = channel(&config)?;

    let engine = server.engine();
    let worker = thread::spawn(move || Dispatcher::new(server_end, engine).run());

    let ReplyValue::Display(display) = client.call(&Command::GetDisplay { native: NativeDisplay(0) })? else {
        panic!("get-display returned the wrong reply kind");
    };
    let ReplyValue::Context(context) = client.call(&Command::CreateContext {
        display,
        config: Config(1),
        share: Context::NONE,
        attribs: vec![],
    })?
    else {
        panic!("create-context returned the wrong reply kind");
    };
    let ReplyValue::Surface(surface) = client.call(&Command::CreatePbufferSurface {
        display,
        config: Config(1),
        attribs: vec![],
    })?
    else {
        panic!("create-pbuffer-surface returned the wrong reply kind");
    };
    assert_eq!(
        client.call(&Command::MakeCurrent { display, draw: surface, read: surface, context })?,
        ReplyValue::Bool(true)
    );

    for _ in 0..3 {
        client.send(&Command::Enable { cap: GL_DEPTH_TEST })?;
    }
    client.send(&Command::Enable { cap: 0xbeef })?;
    let token = client.send(&Command::Flush {})?;
    client.wait_for_token(token);
    assert_eq!(driver.count(EntryPoint::Enable), 1);
    assert_eq!(driver.count(EntryPoint::Flush), 1);

    // Flush made the query authoritative, so the driver's answer wins over the cached error.
    assert_eq!(client.call(&Command::GetError {})?, ReplyValue::Enum(GL_NO_ERROR));
    assert_eq!(driver.count(EntryPoint::GetError), 1);

    client.send(&Command::Enable { cap: 0xbeef })?;
    assert_eq!(client.call(&Command::GetError {})?, ReplyValue::Enum(GL_INVALID_ENUM));
    assert_eq!(client.call(&Command::GetError {})?, ReplyValue::Enum(GL_NO_ERROR));
    assert_eq!(driver.count(EntryPoint::GetError), 1);

    assert_eq!(
        client.call(&Command::GetIntegerv { pname: GL_VIEWPORT })?,
        ReplyValue::Ints(vec![0; 4])
    );

    client.shutdown()?;
    let outcome = worker.join().expect("dispatch thread panicked")?;
    assert_eq!(outcome, DispatchOutcome::Shutdown);
    assert!(server.registry().records().iter().all(|r| !r.active));
    Ok(())
}

#[test]
fn busy_poll_channel_round_trip() -> Result<()> {
    round_trip(TransportMode::BusyPoll)
}

#[test]
fn blocking_channel_round_trip() -> Result<()> {
    round_trip(TransportMode::Blocking)
}

#[test]
fn sync_waits_for_every_earlier_command() -> Result<()> {
    let (driver, server) = common::server();
    let (mut client, server_end) = channel(&RingConfig::default().with_capacity(16 * 1024))?;
    let engine = server.engine();
    let worker = thread::spawn(move || Dispatcher::new(server_end, engine).run());

    for _ in 0..100 {
        client.send(&Command::Nop {})?;
    }
    client.sync()?;
    assert_eq!(server.stats().snapshot().records_dispatched, 101);
    assert!(driver.calls().is_empty());

    client.shutdown()?;
    worker.join().expect("dispatch thread panicked")?;
    Ok(())
}
