// ── Viewport capability ──
//
// The host owns a `ViewportHandle` and reports scroll and resize events on
// it; grids hold a `ViewportStream`. Dropping the stream unsubscribes.

use tokio::sync::watch;

/// Visible area of the grid body, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub scroll_offset: u64,
}

/// Host side of the viewport channel.
#[derive(Debug)]
pub struct ViewportHandle {
    sender: watch::Sender<Viewport>,
}

impl ViewportHandle {
    pub fn new(initial: Viewport) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    pub fn current(&self) -> Viewport {
        *self.sender.borrow()
    }

    pub fn scroll_to(&self, scroll_offset: u64) {
        self.update(|v| v.scroll_offset = scroll_offset);
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.update(|v| {
            v.width = width;
            v.height = height;
        });
    }

    pub fn set(&self, viewport: Viewport) {
        self.update(|v| *v = viewport);
    }

    pub fn subscribe(&self) -> ViewportStream {
        ViewportStream::new(self.sender.subscribe())
    }

    /// Apply `f` and notify subscribers only if the viewport changed.
    fn update(&self, f: impl FnOnce(&mut Viewport)) {
        self.sender.send_if_modified(|v| {
            let before = *v;
            f(v);
            *v != before
        });
    }
}

impl Default for ViewportHandle {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

/// Grid side of the viewport channel.
#[derive(Debug, Clone)]
pub struct ViewportStream {
    current: Viewport,
    receiver: watch::Receiver<Viewport>,
}

impl ViewportStream {
    fn new(mut receiver: watch::Receiver<Viewport>) -> Self {
        let current = *receiver.borrow_and_update();
        Self { current, receiver }
    }

    /// The last viewport observed by this stream.
    pub fn current(&self) -> Viewport {
        self.current
    }

    /// Wait for the next change. `None` once the handle is dropped.
    pub async fn changed(&mut self) -> Option<Viewport> {
        self.receiver.changed().await.ok()?;
        self.current = *self.receiver.borrow_and_update();
        Some(self.current)
    }
}
