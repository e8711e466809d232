use std::fmt;
use bitflags::bitflags;

bitflags! {
    /// When an interceptor runs relative to the wrapped call.
    ///
    /// Interceptors are invoked with exactly one flag set. Before < {After xor OnError} < Finally.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct When: u16 {
        const BEFORE = 1 << 0;
        const AFTER = 1 << 1;
        const ON_ERROR = 1 << 2;
        const FINALLY = 1 << 3;
    }
}

impl When {
    /// Phase that follows the inner call
    pub fn after_inner(has_error: bool) -> Self {
        if has_error { When::ON_ERROR } else { When::AFTER }
    }
}

impl fmt::Display for When {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .iter()
            .map(|flag| match flag {
                When::BEFORE => "Before",
                When::AFTER => "After",
                When::ON_ERROR => "OnError",
                When::FINALLY => "Finally",
                _ => "Unknown",
            })
            .collect();
        write!(f, "{}", names.join("|"))
    }
}
