#![allow(dead_code)]

use std::sync::Arc;

use shadowgl_ipc::{Command, ReplyValue};
use shadowgl_server::testing::RecordingDriver;
use shadowgl_server::{Engine, Server};
use shadowgl_types::{Config, Context, Display, NativeDisplay, Surface};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn server() -> (Arc<RecordingDriver>, Server) {
    init_tracing();
    let driver = Arc::new(RecordingDriver::new());
    let server = Server::new(driver.clone());
    (driver, server)
}

/// Runs `cmd` and fails the test if it produced no reply.
pub fn reply(engine: &mut Engine, cmd: Command) -> ReplyValue {
    let opcode = cmd.opcode();
    engine
        .execute(cmd)
        .unwrap_or_else(|| panic!("{opcode:?} produced no reply"))
}

pub fn display(engine: &mut Engine) -> Display {
    match reply(engine, Command::GetDisplay { native: NativeDisplay(0) }) {
        ReplyValue::Display(display) => display,
        other => panic!("unexpected reply {other:?}"),
    }
}

pub fn context(engine: &mut Engine, display: Display) -> Context {
    match reply(
        engine,
        Command::CreateContext {
            display,
            config: Config(1),
            share: Context::NONE,
            attribs: vec![],
        },
    ) {
        ReplyValue::Context(context) => context,
        other => panic!("unexpected reply {other:?}"),
    }
}

pub fn pbuffer(engine: &mut Engine, display: Display) -> Surface {
    match reply(
        engine,
        Command::CreatePbufferSurface {
            display,
            config: Config(1),
            attribs: vec![],
        },
    ) {
        ReplyValue::Surface(surface) => surface,
        other => panic!("unexpected reply {other:?}"),
    }
}

pub fn make_current(engine: &mut Engine, display: Display, surface: Surface, context: Context) -> bool {
    reply(
        engine,
        Command::MakeCurrent {
            display,
            draw: surface,
            read: surface,
            context,
        },
    ) == ReplyValue::Bool(true)
}
