use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::debug;

use super::document::PageView;

/// Ordered strategy chain for one field: the first strategy yielding a
/// value wins, later strategies are never run, and a strategy that panics
/// is treated as a miss.
pub struct Cascade<'v> {
    view: &'v PageView,
    field: &'static str,
    found: Option<String>,
}

impl<'v> Cascade<'v> {
    pub fn new(view: &'v PageView, field: &'static str) -> Self {
        Self {
            view,
            field,
            found: None,
        }
    }

    pub fn then<F>(mut self, strategy: F) -> Self
    where
        F: FnOnce(&PageView) -> Option<String>,
    {
        if self.found.is_none() {
            let view = self.view;
            self.found = match catch_unwind(AssertUnwindSafe(|| strategy(view))) {
                Ok(value) => value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
                Err(_) => {
                    debug!(field = self.field, "Strategy panicked, skipping");
                    None
                }
            };
        }
        self
    }

    /// Try each selector in order, accepting text longer than `min_len` chars.
    pub fn selectors(self, selectors: &[&str], min_len: usize) -> Self {
        self.then(|view| {
            selectors
                .iter()
                .find_map(|sel| view.text_of(sel).filter(|t| longer_than(t, min_len)))
        })
    }

    pub fn found(self) -> Option<String> {
        if self.found.is_none() {
            debug!(field = self.field, "No strategy matched");
        }
        self.found
    }

    /// The winning value, or empty when nothing matched.
    pub fn value(self) -> String {
        self.found().unwrap_or_default()
    }
}

pub fn longer_than(text: &str, min_len: usize) -> bool {
    text.trim().chars().count() > min_len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> PageView {
        PageView::parse("<h1>Heading</h1><h2>  </h2><p>short</p>")
    }

    #[test]
    fn first_hit_wins() {
        let v = view();
        let got = Cascade::new(&v, "t")
            .then(|_| None)
            .then(|_| Some("second".into()))
            .then(|_| Some("third".into()))
            .value();
        assert_eq!(got, "second");
    }

    #[test]
    fn later_strategies_are_lazy() {
        let v = view();
        let mut ran = false;
        Cascade::new(&v, "t")
            .then(|_| Some("x".into()))
            .then(|_| {
                ran = true;
                None
            })
            .value();
        assert!(!ran);
    }

    #[test]
    fn panicking_strategy_falls_through() {
        let v = view();
        let got = Cascade::new(&v, "t")
            .then(|_| panic!("boom"))
            .then(|_| Some("after".into()))
            .value();
        assert_eq!(got, "after");
    }

    #[test]
    fn blank_values_do_not_win() {
        let v = view();
        let got = Cascade::new(&v, "t")
            .then(|_| Some("   ".into()))
            .selectors(&["h2", "h1"], 0)
            .value();
        assert_eq!(got, "Heading");
    }

    #[test]
    fn min_length_is_enforced() {
        let v = view();
        assert_eq!(Cascade::new(&v, "t").selectors(&["p"], 10).found(), None);
        assert_eq!(Cascade::new(&v, "t").selectors(&["p"], 4).value(), "short");
    }
}
