//! The chat screen: a header with the clock, the message stream, and the input line.
//!
//! Widgets never hand data to each other. Each one is mounted with the same
//! [`ChatStore`] and reads or writes only the slice it needs.
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::{
    clock::{ClockSource, Timers},
    store::ChatStore,
    Keyboard,
};

mod header;
mod input;
mod stream;

pub use header::Header;
pub use input::Input;
pub use stream::Stream;

#[cfg(test)]
mod tests;

/// Rendered output of a widget.
#[derive(Debug, Default)]
pub struct View {
    lines: RefCell<Vec<String>>,
    renders: Cell<usize>,
}

impl View {
    fn render(&self, lines: Vec<String>) {
        *self.lines.borrow_mut() = lines;
        self.renders.set(self.renders.get() + 1);
    }
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
    /// How many times the widget has rendered since it was mounted.
    pub fn render_count(&self) -> usize {
        self.renders.get()
    }
}

/// What widgets need from the host besides the store.
#[derive(Clone)]
pub struct MountEnv {
    pub username: String,
    pub timers: Timers,
    pub keyboard: Keyboard,
    pub clock: ClockSource,
}

/// Header, stream and input mounted over one store.
///
/// Dropping the screen unmounts all three.
pub struct ChatScreen {
    store: Rc<dyn ChatStore>,
    header: Header,
    stream: Stream,
    input: Input,
}

impl ChatScreen {
    pub fn mount(store: Rc<dyn ChatStore>, env: &MountEnv) -> Self {
        Self {
            header: Header::mount(&store, env),
            stream: Stream::mount(&store),
            input: Input::mount(&store, env),
            store,
        }
    }
    pub fn store(&self) -> &Rc<dyn ChatStore> {
        &self.store
    }
    pub fn header(&self) -> &Header {
        &self.header
    }
    pub fn stream(&self) -> &Stream {
        &self.stream
    }
    pub fn input(&self) -> &Input {
        &self.input
    }

    /// Header line, one line per message, then the input line.
    pub fn render(&self) -> Vec<String> {
        let mut lines = self.header.view().lines();
        lines.extend(self.stream.view().lines());
        lines.extend(self.input.view().lines());
        lines
    }

    /// [`render`](Self::render) fitted into a `rows` x `cols` area with [`viewport`].
    pub fn render_viewport(&self, rows: usize, cols: usize) -> Vec<String> {
        viewport(&self.render(), rows, cols)
    }
}

/// Fits rendered screen lines into `rows` x `cols`.
///
/// The first line stays on the top row and the last line on the bottom row.
/// The rows between show the newest of the remaining lines. Every line is cut
/// to `cols` characters.
pub fn viewport(lines: &[String], rows: usize, cols: usize) -> Vec<String> {
    let clip = |line: &String| line.chars().take(cols).collect::<String>();
    let Some((last, rest)) = lines.split_last() else {
        return Vec::new();
    };
    if rows == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(rows);
    if let (Some((first, body)), true) = (rest.split_first(), rows >= 2) {
        out.push(clip(first));
        let start = body.len().saturating_sub(rows - 2);
        out.extend(body[start..].iter().map(clip));
    }
    out.resize(rows - 1, String::new());
    out.push(clip(last));
    out
}
