use unicode_width::UnicodeWidthStr;

const GLOBE_FRAMES: &[&str] = &["🌍", "🌎", "🌏"];
const WAITING_MESSAGE: &str = "Waiting for response...";

pub struct SpinnerState {
    frames: &'static [&'static str],
    current_frame: usize,
    message: String,
}

impl Default for SpinnerState {
    fn default() -> Self {
        Self::new()
    }
}

impl SpinnerState {
    pub fn new() -> Self {
        Self::with_message(WAITING_MESSAGE)
    }

    pub fn with_message(message: &str) -> Self {
        Self {
            frames: GLOBE_FRAMES,
            current_frame: 0,
            message: message.to_string(),
        }
    }

    /// Advance to the next frame
    pub fn tick(&mut self) {
        self.current_frame = (self.current_frame + 1) % self.frames.len();
    }

    pub fn frame(&self) -> &'static str {
        self.frames.get(self.current_frame).copied().unwrap_or_default()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Display width of the frame, a space and the message
    pub fn width(&self) -> usize {
        self.frame().width() + 1 + self.message.width()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_wraps_around() {
        let mut spinner = SpinnerState::new();
        let first = spinner.frame();
        for _ in 0..GLOBE_FRAMES.len() {
            spinner.tick();
        }
        assert_eq!(spinner.frame(), first);
        spinner.tick();
        assert_ne!(spinner.frame(), first);
    }

    #[test]
    fn test_width_counts_wide_frames() {
        let spinner = SpinnerState::new();
        assert_eq!(spinner.width(), 2 + 1 + WAITING_MESSAGE.len());
    }
}
