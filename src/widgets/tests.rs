use std::{cell::Cell, rc::Rc, time::Duration};

use rstest::rstest;

use super::*;
use crate::{clock::TimeSource, core::Runtime, store::Manager, Key, Message};

const SECOND: Duration = Duration::from_secs(1);

struct Ticks(Cell<u32>);

impl TimeSource for Ticks {
    fn now(&self) -> String {
        let n = self.0.get() + 1;
        self.0.set(n);
        format!("10:00:{n:02}")
    }
}

fn env() -> MountEnv {
    MountEnv {
        username: "alice".into(),
        timers: Timers::new(),
        keyboard: Keyboard::new(),
        clock: ClockSource::new(SECOND, Rc::new(Ticks(Cell::new(0)))),
    }
}

#[rstest]
fn header_renders_on_ticks_only(
    #[values(Manager::Atom, Manager::Proxy, Manager::Selector)] manager: Manager,
) {
    let mut rt = Runtime::new();
    let env = env();
    let store = manager.create();
    let header = Header::mount(&store, &env);
    rt.update();
    assert_eq!(header.view().lines(), ["alice | "]);
    assert_eq!(header.view().render_count(), 1);

    env.timers.advance(SECOND);
    rt.update();
    assert_eq!(header.view().lines(), ["alice | 10:00:01"]);
    assert_eq!(header.view().render_count(), 2);

    store.append_message("hi".into(), rt.ac());
    rt.update();
    assert_eq!(header.view().render_count(), 2);
}

#[rstest]
fn stream_renders_on_messages_only(
    #[values(Manager::Atom, Manager::Proxy, Manager::Selector)] manager: Manager,
) {
    let mut rt = Runtime::new();
    let env = env();
    let store = manager.create();
    let _header = Header::mount(&store, &env);
    let stream = Stream::mount(&store);
    rt.update();
    assert!(stream.view().lines().is_empty());
    assert_eq!(stream.view().render_count(), 1);

    env.timers.advance(3 * SECOND);
    rt.update();
    assert_eq!(stream.view().render_count(), 1);

    store.append_message("hi".into(), rt.ac());
    rt.update();
    assert_eq!(stream.view().lines(), ["[10:00:03] hi"]);
    assert_eq!(stream.view().render_count(), 2);
}

#[test]
fn header_unmount_stops_clock() {
    let mut rt = Runtime::new();
    let env = env();
    let store = Manager::Proxy.create();
    let header = Header::mount(&store, &env);
    assert_eq!(env.timers.len(), 1);

    drop(header);
    assert!(env.timers.is_empty());
    env.timers.advance(5 * SECOND);
    rt.update();
    assert_eq!(store.time(&mut rt.sc()), "");
}

#[test]
fn remounted_header_runs_one_clock() {
    let env = env();
    let store = Manager::Atom.create();
    for _ in 0..3 {
        let _header = Header::mount(&store, &env);
        assert_eq!(env.timers.len(), 1);
    }
    assert!(env.timers.is_empty());
}

#[test]
fn input_edits_local_text() {
    let mut rt = Runtime::new();
    let env = env();
    let store = Manager::Selector.create();
    let input = Input::mount(&store, &env);
    assert_eq!(input.view().lines(), ["> "]);

    env.keyboard.type_text("hey", rt.ac());
    env.keyboard.dispatch(Key::Backspace, rt.ac());
    assert_eq!(input.text(), "he");
    assert_eq!(input.view().lines(), ["> he"]);
    assert!(store.messages(&mut rt.sc()).is_empty());
}

#[rstest]
fn enter_appends_and_clears(
    #[values(Manager::Atom, Manager::Proxy, Manager::Selector)] manager: Manager,
) {
    let mut rt = Runtime::new();
    let env = env();
    let store = manager.create();
    let _header = Header::mount(&store, &env);
    let input = Input::mount(&store, &env);
    env.timers.advance(2 * SECOND);
    rt.update();

    env.keyboard.type_text("hello", rt.ac());
    env.keyboard.dispatch(Key::Enter, rt.ac());
    assert_eq!(input.text(), "");
    assert_eq!(input.view().lines(), ["> "]);
    assert_eq!(
        store.messages(&mut rt.sc()).as_slice(),
        [Message::new("hello", "10:00:02")]
    );
}

#[test]
fn send_button_appends_empty_text() {
    let mut rt = Runtime::new();
    let env = env();
    let store = Manager::Atom.create();
    let input = Input::mount(&store, &env);
    input.send(rt.ac());
    input.send(rt.ac());
    assert_eq!(
        store.messages(&mut rt.sc()).as_slice(),
        [Message::new("", ""), Message::new("", "")]
    );
}

#[test]
fn input_listener_removed_on_unmount() {
    let mut rt = Runtime::new();
    let env = env();
    let store = Manager::Proxy.create();
    for _ in 0..2 {
        let _input = Input::mount(&store, &env);
        assert_eq!(env.keyboard.listener_count(), 1);
    }
    assert_eq!(env.keyboard.listener_count(), 0);

    let _input = Input::mount(&store, &env);
    env.keyboard.dispatch(Key::Enter, rt.ac());
    assert_eq!(store.messages(&mut rt.sc()).len(), 1);
}

#[rstest]
fn screen_renders_all_widgets(
    #[values(Manager::Atom, Manager::Proxy, Manager::Selector)] manager: Manager,
) {
    let mut rt = Runtime::new();
    let env = env();
    let screen = ChatScreen::mount(manager.create(), &env);
    env.timers.advance(SECOND);
    rt.update();

    env.keyboard.type_text("first", rt.ac());
    env.keyboard.dispatch(Key::Enter, rt.ac());
    env.timers.advance(SECOND);
    rt.update();
    env.keyboard.type_text("sec", rt.ac());
    rt.update();

    assert_eq!(screen.render(), ["alice | 10:00:02", "[10:00:01] first", "> sec"]);
    assert_eq!(screen.store().manager(), manager);
    assert_eq!(screen.header().view().render_count(), 2);
    assert_eq!(screen.stream().view().render_count(), 2);
    assert_eq!(screen.input().text(), "sec");
}

#[test]
fn dropping_screen_unmounts_everything() {
    let mut rt = Runtime::new();
    let env = env();
    let screen = ChatScreen::mount(Manager::Selector.create(), &env);
    rt.update();
    assert_eq!(env.timers.len(), 1);
    assert_eq!(env.keyboard.listener_count(), 1);

    drop(screen);
    assert!(env.timers.is_empty());
    assert_eq!(env.keyboard.listener_count(), 0);
}

#[test]
fn long_chat_keeps_newest_messages_and_input_on_screen() {
    let mut rt = Runtime::new();
    let env = env();
    let screen = ChatScreen::mount(Manager::Atom.create(), &env);
    rt.update();
    for i in 0..30 {
        env.keyboard.type_text(&format!("m{i}"), rt.ac());
        env.keyboard.dispatch(Key::Enter, rt.ac());
    }
    env.keyboard.type_text("draft", rt.ac());
    rt.update();
    assert_eq!(screen.render().len(), 32);

    let lines = screen.render_viewport(24, 80);
    assert_eq!(lines.len(), 24);
    assert_eq!(lines[0], "alice | ");
    assert_eq!(lines[1], "[] m8");
    assert_eq!(lines[22], "[] m29");
    assert_eq!(lines[23], "> draft");
}

#[test]
fn viewport_pads_short_screen_and_clips_width() {
    let lines: Vec<String> = ["alice | 10:00:01", "[10:00:01] a long message", "> typing"]
        .map(String::from)
        .into();
    assert_eq!(
        viewport(&lines, 5, 10),
        ["alice | 10", "[10:00:01]", "", "", "> typing"]
    );
}

#[rstest]
#[case(0, Vec::new())]
#[case(1, vec!["> x"])]
#[case(2, vec!["head", "> x"])]
#[case(3, vec!["head", "c", "> x"])]
fn viewport_small_heights(#[case] rows: usize, #[case] expected: Vec<&str>) {
    let lines: Vec<String> = ["head", "a", "b", "c", "> x"].map(String::from).into();
    assert_eq!(viewport(&lines, rows, 80), expected);
}
