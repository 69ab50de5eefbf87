/// Pattern shown in the code panel on load and after a reset. It describes
/// the fixed patch; editing it does not change the sound.
pub const DEFAULT_CODE: &str = r#"// vinyl studio patch
setcps(1)

stack(
  // low end: saw with a slow wobble
  note("c2").s("sawtooth").gain(0.3)
    .fm(sine.slow(4).range(-10, 10)),

  // arpeggio, one step every 250 ms
  note("c4 d4 e4 g4 c5").s("triangle").gain(0.2).fast(4),

  // pads into a feedback delay
  note("[c5,e5]").s("sine").gain(0.1)
    .delay(0.3).delayfeedback(0.4),

  // shimmer
  note("c6").s("sine").gain(0.08)
    .fm(sine.fast(5).range(-200, 200))
).gain(0.15)
"#;

/// Text of the code panel. Kept for display only.
#[derive(Clone, Debug)]
pub struct EditorBuffer {
    text: String,
    revision: u64,
}

impl EditorBuffer {
    pub fn new() -> Self {
        Self {
            text: DEFAULT_CODE.to_string(),
            revision: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Bumps the revision when the text actually changes.
    pub fn set_text(&mut self, text: &str) -> bool {
        if self.text == text {
            return false;
        }
        self.text.clear();
        self.text.push_str(text);
        self.revision += 1;
        true
    }

    pub fn reset(&mut self) {
        self.set_text(DEFAULT_CODE);
    }

    pub fn is_default(&self) -> bool {
        self.text == DEFAULT_CODE
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl Default for EditorBuffer {
    fn default() -> Self {
        Self::new()
    }
}
