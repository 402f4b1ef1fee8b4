//! Ordered fallback search.
//!
//! Host markup is unstable, so both the scroll container and the conversation
//! title are found by trying a prioritized list of candidate locators and
//! keeping the first hit. Locators are evaluated lazily: nothing after the
//! first success runs.

/// A named probe that may find a `T`.
pub struct Locator<'a, T> {
    name: String,
    probe: Box<dyn Fn() -> Option<T> + 'a>,
}

impl<'a, T> Locator<'a, T> {
    /// Wrap a probe under a name used in logs.
    pub fn new(name: impl Into<String>, probe: impl Fn() -> Option<T> + 'a) -> Self {
        Self {
            name: name.into(),
            probe: Box::new(probe),
        }
    }

    /// Name reported when this locator wins.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The value found and the name of the locator that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located<T> {
    /// What was found
    pub value: T,
    /// Name of the successful locator
    pub via: String,
}

/// Run locators in order and return the first success.
pub fn locate_first<'a, T, I>(locators: I) -> Option<Located<T>>
where
    I: IntoIterator<Item = Locator<'a, T>>,
{
    locators.into_iter().find_map(|locator| {
        let value = (locator.probe)()?;
        tracing::trace!(via = %locator.name, "locator matched");
        Some(Located {
            value,
            via: locator.name,
        })
    })
}
