use crate::formatter::*;

/// A formatter that produces no output.
///
/// `NoFormatter` implements both formatter traits but discards every call.
/// Useful when running a suite from code that only inspects the returned
/// report.
#[derive(Debug, Default, Clone)]
pub struct NoFormatter;

macro_rules! impl_unit_from {
    [$($name:ident$(<$($generic:tt),*>)?),* $(,)?] => {$(
        impl$(<$($generic),*>)? From<$name$(<$($generic),*>)?> for () {
            fn from(_: $name$(<$($generic),*>)?) -> () {}
        })*
    };
}

impl_unit_from![
    FmtRunStart<'p>,
    FmtGroupEnter<'p>,
    FmtFixture<'p, 'o>,
    FmtTestStart<'p>,
    FmtTestOutcome<'p, 'o>,
    FmtGroupExit<'p>,
    FmtRunOutcomes<'p, 'o>,
    FmtBeginListing,
    FmtListGroup<'p>,
    FmtListTest<'p>,
    FmtEndListing,
];

impl<'p> TestFormatter<'p> for NoFormatter {
    type Error = ();
    type RunStart = ();
    type GroupEnter = ();
    type Fixture = ();
    type TestStart = ();
    type TestOutcome = ();
    type GroupExit = ();
    type RunOutcomes = ();
}

impl<'p> TestListFormatter<'p> for NoFormatter {
    type Error = ();
    type BeginListing = ();
    type ListGroup = ();
    type ListTest = ();
    type EndListing = ();
}
