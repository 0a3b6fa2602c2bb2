use std::{cell::Cell, rc::Rc, thread, time::Duration};

use assert_call::{call, CallRecorder};
use rstest::rstest;
use sigchat::{
    clock::{ClockSource, TimeSource, Timers},
    command_channel, effect,
    store::Manager,
    widgets::{ChatScreen, MountEnv},
    Key, Keyboard, Message, Runtime,
};

const TICK: Duration = Duration::from_millis(500);

struct Counter(Cell<u32>);

impl TimeSource for Counter {
    fn now(&self) -> String {
        let n = self.0.get();
        self.0.set(n + 1);
        format!("09:00:{n:02}")
    }
}

fn env(username: &str) -> MountEnv {
    MountEnv {
        username: username.into(),
        timers: Timers::new(),
        keyboard: Keyboard::new(),
        clock: ClockSource::new(TICK, Rc::new(Counter(Cell::new(0)))),
    }
}

#[rstest]
fn typing_session(#[values(Manager::Atom, Manager::Proxy, Manager::Selector)] manager: Manager) {
    let mut rt = Runtime::new();
    let env = env("carol");
    let screen = ChatScreen::mount(manager.create(), &env);
    rt.update();
    assert_eq!(screen.render(), ["carol | ", "> "]);

    env.timers.advance(TICK);
    rt.update();
    env.keyboard.type_text("hi", rt.ac());
    env.keyboard.dispatch(Key::Enter, rt.ac());
    env.timers.advance(TICK);
    rt.update();
    env.keyboard.dispatch(Key::Enter, rt.ac());
    rt.update();

    assert_eq!(
        screen.render(),
        ["carol | 09:00:01", "[09:00:00] hi", "[09:00:01] ", "> "]
    );
    assert_eq!(
        screen.store().messages(&mut rt.sc()).as_slice(),
        [Message::new("hi", "09:00:00"), Message::new("", "09:00:01")]
    );
}

#[rstest]
fn readers_see_only_their_slice(
    #[values(Manager::Atom, Manager::Proxy, Manager::Selector)] manager: Manager,
) {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let env = env("dave");
    let screen = ChatScreen::mount(manager.create(), &env);
    let _time = effect({
        let store = screen.store().clone();
        move |sc| call!("time {}", store.time(sc))
    });
    let _messages = effect({
        let store = screen.store().clone();
        move |sc| call!("messages {}", store.messages(sc).len())
    });
    rt.update();
    cr.verify(["time ", "messages 0"]);

    env.timers.advance(3 * TICK);
    rt.update();
    cr.verify(["time 09:00:02"]);

    env.keyboard.type_text("yo", rt.ac());
    env.keyboard.dispatch(Key::Enter, rt.ac());
    rt.update();
    cr.verify(["messages 1"]);
}

#[test]
fn commands_from_another_thread() {
    let mut rt = Runtime::new();
    let env = env("erin");
    let screen = ChatScreen::mount(Manager::Proxy.create(), &env);
    let (tx, mut rx) = command_channel();
    thread::spawn(move || {
        tx.set_time("23:59:59").unwrap();
        tx.append_message("remote").unwrap();
    })
    .join()
    .unwrap();

    assert_eq!(rx.drain(&**screen.store(), rt.ac()), 2);
    rt.update();
    assert_eq!(
        screen.render(),
        ["erin | 23:59:59", "[23:59:59] remote", "> "]
    );
}

#[test]
fn unmount_stops_everything() {
    let mut rt = Runtime::new();
    let env = env("frank");
    let screen = ChatScreen::mount(Manager::Selector.create(), &env);
    let store = screen.store().clone();
    rt.update();
    drop(screen);

    assert!(env.timers.is_empty());
    assert_eq!(env.keyboard.listener_count(), 0);
    env.timers.advance(10 * TICK);
    env.keyboard.type_text("ghost", rt.ac());
    env.keyboard.dispatch(Key::Enter, rt.ac());
    rt.update();
    assert_eq!(store.time(&mut rt.sc()), "");
    assert!(store.messages(&mut rt.sc()).is_empty());
}
