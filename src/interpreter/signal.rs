use crate::runtime::Value;

/// Pending non-local control flow. At most one is latched at a time; while
/// one is latched, statement sequences stop and unwind to the construct that
/// consumes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Signal {
    #[default]
    None,
    Return(Value),
    Break,
    Continue,
    Throw { value: Value, line: usize },
}

impl Signal {
    pub fn is_latched(&self) -> bool {
        !matches!(self, Signal::None)
    }

    pub fn take(&mut self) -> Signal {
        std::mem::take(self)
    }
}
