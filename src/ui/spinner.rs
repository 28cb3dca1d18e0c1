use crossterm::{
    cursor, execute,
    style::{Print, Stylize},
    terminal::{Clear, ClearType},
    tty::IsTty,
};
use std::io::{stderr, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const FRAME_INTERVAL: Duration = Duration::from_millis(80);

/// Where the spinner draws. Cloning shares the same writer.
#[derive(Clone)]
pub struct SpinnerSink(Arc<Mutex<Box<dyn Write + Send>>>);

impl SpinnerSink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self(Arc::new(Mutex::new(Box::new(writer))))
    }

    /// Stderr, or `None` when stderr is not a terminal
    pub fn terminal() -> Option<Self> {
        stderr().is_tty().then(|| Self::new(stderr()))
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn draw(&self, frame: usize, message: &str) {
        let mut out = self.lock();
        let _ = execute!(
            out,
            cursor::MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(FRAMES[frame % FRAMES.len()].magenta()),
            Print(" "),
            Print(message.magenta().bold())
        );
    }

    fn clear(&self) {
        let mut out = self.lock();
        let _ = execute!(
            out,
            cursor::MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            cursor::Show
        );
    }
}

/// Busy indicator drawn while the crew works.
pub struct Spinner {
    sink: Option<SpinnerSink>,
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    /// Start animating on `sink`. The first frame is drawn before this returns.
    pub fn start(sink: SpinnerSink, message: impl Into<String>) -> Self {
        let message = message.into();
        {
            let mut out = sink.lock();
            let _ = execute!(out, cursor::Hide);
        }
        sink.draw(0, &message);

        let (stop_tx, mut stop_rx) = oneshot::channel();
        let task_sink = sink.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + FRAME_INTERVAL, FRAME_INTERVAL);
            let mut frame = 1usize;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        task_sink.draw(frame, &message);
                        frame += 1;
                    }
                }
            }
            task_sink.clear();
        });

        Self {
            sink: Some(sink),
            stop: Some(stop_tx),
            handle: Some(handle),
        }
    }

    pub fn disabled() -> Self {
        Self {
            sink: None,
            stop: None,
            handle: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Stop and wait until the line is cleared
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            if let Some(sink) = &self.sink {
                sink.clear();
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Writer whose bytes stay readable after the spinner lets go of it.
    #[derive(Clone, Default)]
    pub(crate) struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        pub(crate) fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_disabled_spinner_stops_immediately() {
        let spinner = Spinner::disabled();
        assert!(!spinner.is_active());
        spinner.stop().await;
    }

    #[tokio::test]
    async fn test_animates_until_stopped() {
        let capture = Capture::default();
        let spinner = Spinner::start(SpinnerSink::new(capture.clone()), "working");
        assert!(spinner.is_active());
        assert!(capture.text().contains(FRAMES[0]));

        tokio::time::sleep(FRAME_INTERVAL * 4).await;
        spinner.stop().await;

        let text = capture.text();
        assert!(text.contains(FRAMES[1]));
        assert!(text.contains("working"));
        // Cursor hidden while drawing, shown again at the end
        assert!(text.starts_with("\u{1b}[?25l"));
        assert!(text.ends_with("\u{1b}[?25h"));
    }

    #[tokio::test]
    async fn test_drop_clears_line() {
        let capture = Capture::default();
        let spinner = Spinner::start(SpinnerSink::new(capture.clone()), "working");
        drop(spinner);
        assert!(capture.text().ends_with("\u{1b}[?25h"));
    }
}
