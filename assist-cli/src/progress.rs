use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

const SPINNER_FRAMES: &[&str] = &["|", "/", "-", "\\"];
const FRAME_INTERVAL: Duration = Duration::from_millis(200);

/// Runs `work` on the calling thread while a spinner animates on stderr.
///
/// The spinner is only drawn when stderr is a terminal.
pub fn with_progress<T>(label: &str, work: impl FnOnce() -> T) -> T {
    if !io::stderr().is_terminal() {
        return work();
    }

    let done = AtomicBool::new(false);
    let start = Instant::now();

    let result = thread::scope(|scope| {
        scope.spawn(|| spin(label, &done));
        let _stop = StopOnDrop(&done);
        work()
    });

    eprintln!(
        "\r{label} ... finished in {:.1}s",
        start.elapsed().as_secs_f32()
    );
    result
}

fn spin(label: &str, done: &AtomicBool) {
    let mut frame_index = 0;
    while !done.load(Ordering::Relaxed) {
        eprint!("\r{label} {}", SPINNER_FRAMES[frame_index]);
        let _ = io::stderr().flush();
        frame_index = (frame_index + 1) % SPINNER_FRAMES.len();
        thread::sleep(FRAME_INTERVAL);
    }
}

struct StopOnDrop<'a>(&'a AtomicBool);

impl Drop for StopOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}
