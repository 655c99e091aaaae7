/// Monotonic 0-100 progress value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Progress(u8);

impl Progress {
    pub fn percent(self) -> u8 {
        self.0
    }

    /// Raise progress to `pct` (clamped to 100). Returns whether it moved.
    pub fn advance_to(&mut self, pct: u8) -> bool {
        let pct = pct.min(100);
        if pct > self.0 {
            self.0 = pct;
            true
        } else {
            false
        }
    }
}
