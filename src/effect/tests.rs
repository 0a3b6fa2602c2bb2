use assert_call::{call, CallRecorder};

use crate::{core::Runtime, effect, State};

#[test]
fn test_effect() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let s = State::new(10);

    let s0 = s.clone();
    let e = effect(move |sc| call!("{}", s0.get(sc)));
    cr.verify(());

    rt.update();
    cr.verify("10");

    rt.update();
    cr.verify(()); // not called again because state did not change

    s.set(20, rt.ac());
    rt.update();
    cr.verify("20"); // called again because state changed

    s.set(30, rt.ac());
    drop(e);
    rt.update();
    cr.verify(()); // not called again because effect was dropped
}

#[test]
fn notifications_before_update_coalesce() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let a = State::new(1);
    let b = State::new(2);
    let _e = effect({
        let a = a.clone();
        let b = b.clone();
        move |sc| call!("{}", a.get(sc) + b.get(sc))
    });
    rt.update();
    cr.verify("3");

    a.set(10, rt.ac());
    b.set(20, rt.ac());
    rt.update();
    cr.verify("30");
}

#[test]
fn dependencies_are_recorded_on_each_run() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let flag = State::new(true);
    let a = State::new("a");
    let b = State::new("b");
    let _e = effect({
        let flag = flag.clone();
        let a = a.clone();
        let b = b.clone();
        move |sc| {
            let v = if flag.get(sc) { a.get(sc) } else { b.get(sc) };
            call!("{v}");
        }
    });
    rt.update();
    cr.verify("a");

    b.set("b1", rt.ac());
    rt.update();
    cr.verify(()); // `b` was not read

    flag.set(false, rt.ac());
    rt.update();
    cr.verify("b1");

    a.set("a1", rt.ac());
    rt.update();
    cr.verify(()); // `a` is no longer read
    assert_eq!(a.sink_count(), 0);

    b.set("b2", rt.ac());
    rt.update();
    cr.verify("b2");
}

#[test]
fn effects_run_in_creation_order() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let s = State::new(0);
    let _e0 = effect({
        let s = s.clone();
        move |sc| call!("first {}", s.get(sc))
    });
    let _e1 = effect({
        let s = s.clone();
        move |sc| call!("second {}", s.get(sc))
    });
    rt.update();
    cr.verify(["first 0", "second 0"]);

    s.set(1, rt.ac());
    rt.update();
    cr.verify(["first 1", "second 1"]);
}
