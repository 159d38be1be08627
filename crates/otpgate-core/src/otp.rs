//! Four-slot OTP entry buffer.

/// Number of digits in an OTP code.
pub const OTP_LENGTH: usize = 4;

/// In-memory OTP entry: one digit per slot plus the focused slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtpBuffer {
    slots: [Option<char>; OTP_LENGTH],
    focus: usize,
}

impl OtpBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a slot from raw input. Accepts `""` (clears) or a single ASCII digit.
    ///
    /// Returns false, leaving the buffer untouched, for anything else. A digit
    /// moves focus to the next slot.
    pub fn set(&mut self, index: usize, value: &str) -> bool {
        if index >= OTP_LENGTH {
            return false;
        }
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (None, _) => {
                self.slots[index] = None;
                self.focus = index;
                true
            }
            (Some(c), None) if c.is_ascii_digit() => {
                self.slots[index] = Some(c);
                self.focus = (index + 1).min(OTP_LENGTH - 1);
                true
            }
            _ => false,
        }
    }

    /// Types a digit into the focused slot and advances.
    pub fn input_char(&mut self, c: char) -> bool {
        if !c.is_ascii_digit() {
            return false;
        }
        let mut buf = [0u8; 4];
        self.set(self.focus, c.encode_utf8(&mut buf))
    }

    /// Clears the focused slot, or steps back and clears the previous one when
    /// the focused slot is already empty.
    pub fn backspace(&mut self) {
        if self.slots[self.focus].is_some() {
            self.slots[self.focus] = None;
        } else if self.focus > 0 {
            self.focus -= 1;
            self.slots[self.focus] = None;
        }
    }

    /// Pastes digits from `text` starting at the first slot.
    ///
    /// Non-digits are skipped; at most four digits are taken. Returns the number
    /// of digits written.
    pub fn fill(&mut self, text: &str) -> usize {
        let digits: Vec<char> = text
            .chars()
            .filter(char::is_ascii_digit)
            .take(OTP_LENGTH)
            .collect();
        if digits.is_empty() {
            return 0;
        }
        self.slots = [None; OTP_LENGTH];
        for (slot, digit) in self.slots.iter_mut().zip(&digits) {
            *slot = Some(*digit);
        }
        self.focus = digits.len().min(OTP_LENGTH - 1);
        digits.len()
    }

    pub fn focus_left(&mut self) {
        self.focus = self.focus.saturating_sub(1);
    }

    pub fn focus_right(&mut self) {
        self.focus = (self.focus + 1).min(OTP_LENGTH - 1);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn slots(&self) -> &[Option<char>; OTP_LENGTH] {
        &self.slots
    }

    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.filled() == OTP_LENGTH
    }

    /// The entered code, only when every slot is filled.
    pub fn code(&self) -> Option<String> {
        self.slots.iter().copied().collect()
    }
}
