//! Unit filtering.
//!
//! A filter decides, per unit, whether it takes part in the run. Filtering
//! happens while compiling: a unit that is filtered out never reaches the
//! executor, and a group left without units is pruned just like a group that
//! never had any tests.
//!
//! Filters see the full name of a unit, the descriptions of its described
//! ancestor groups and the test joined with `::`, e.g.
//! `Main Group::Child Group::some test`.

/// A strategy for selecting the units of a run.
pub trait TestFilter {
    /// Whether the unit named `name` is part of the run.
    fn keep(&self, name: &str) -> bool;
}

/// A [`TestFilter`] that keeps every unit.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct NoFilter;

impl NoFilter {
    pub fn new() -> Self {
        Self
    }
}

impl TestFilter for NoFilter {
    fn keep(&self, _: &str) -> bool {
        true
    }
}

/// Name based filter, in the manner of `cargo test <filter> --skip <skip>`.
///
/// A unit is kept if it matches any filter (or no filters are set) and
/// matches no skip. Matching is by substring unless
/// [`with_exact`](Self::with_exact) is set.
#[derive(Debug, Default, Clone)]
pub struct DefaultFilter {
    exact: bool,
    filter: Vec<String>,
    skip: Vec<String>,
}

impl DefaultFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exact(self, exact: bool) -> Self {
        Self { exact, ..self }
    }

    pub fn extend_filter(mut self, filter: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.filter.extend(filter.into_iter().map(Into::into));
        self
    }

    pub fn extend_skip(mut self, skip: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.skip.extend(skip.into_iter().map(Into::into));
        self
    }

    fn matches(&self, name: &str, pattern: &str) -> bool {
        match self.exact {
            true => name == pattern,
            false => name.contains(pattern),
        }
    }
}

impl TestFilter for DefaultFilter {
    fn keep(&self, name: &str) -> bool {
        let in_filter = self.filter.is_empty() || self.filter.iter().any(|f| self.matches(name, f));
        in_filter && !self.skip.iter().any(|s| self.matches(name, s))
    }
}

impl<F> TestFilter for F
where
    F: Fn(&str) -> bool,
{
    fn keep(&self, name: &str) -> bool {
        self(name)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::no_patterns(DefaultFilter::new(), "Main::test", true)]
    #[case::substring(DefaultFilter::new().extend_filter(["Main"]), "Main::test", true)]
    #[case::no_match(DefaultFilter::new().extend_filter(["Other"]), "Main::test", false)]
    #[case::skipped(DefaultFilter::new().extend_skip(["test"]), "Main::test", false)]
    #[case::exact_miss(DefaultFilter::new().with_exact(true).extend_filter(["Main"]), "Main::test", false)]
    #[case::exact_hit(DefaultFilter::new().with_exact(true).extend_filter(["Main::test"]), "Main::test", true)]
    #[case::skip_wins(
        DefaultFilter::new().extend_filter(["Main"]).extend_skip(["Main::t"]),
        "Main::test",
        false
    )]
    fn default_filter_decisions(#[case] filter: DefaultFilter, #[case] name: &str, #[case] kept: bool) {
        assert_eq!(filter.keep(name), kept);
    }

    #[test]
    fn closures_are_filters() {
        let filter = |name: &str| name.ends_with("ok");
        assert!(filter.keep("Group::ok"));
        assert!(!filter.keep("Group::nope"));
        assert!(NoFilter.keep("anything"));
    }
}
