use jiff::Timestamp;

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

#[cfg(test)]
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub Timestamp);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Instant after which nominations can no longer be saved.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Deadline(pub Timestamp);

impl Deadline {
    /// The deadline instant itself still counts as open.
    pub fn has_passed(self, now: Timestamp) -> bool {
        now > self.0
    }
}
