use grovetest::{
    filter::DefaultFilter,
    formatter::{pretty::PrettyFormatter, terse::TerseFormatter},
    prelude::*,
};
use pretty_assertions::assert_eq;

use crate::lib::Buffer;

fn suite() -> Suite {
    let shared = Group::build("Shared", |g| g.test("is shared", || ())).unwrap();

    let main = Group::build("Main", |g| {
        g.test("first", || ())?;
        g.anonymous(GroupOptions::new(), |g| g.test("anonymous", || ()))?;
        g.group("Nested", |g| {
            g.include(&shared)?;
            g.test("second", || ())
        })
    })
    .unwrap();

    Suite::new().with(main)
}

#[test]
fn pretty_listing_is_a_tree() {
    let buffer = Buffer::default();
    let fmt_errors = grovetest::harness(&suite())
        .with_formatter(PrettyFormatter::default().with_target(buffer.clone()))
        .list()
        .unwrap();

    assert!(fmt_errors.is_empty());
    assert_eq!(
        buffer.to_string_lossy(),
        "\
Main
  first: test
  anonymous: test
  Nested
    second: test
    Shared
      is shared: test

4 tests
"
    );
}

#[test]
fn terse_listing_is_flat_and_filtered() {
    let buffer = Buffer::default();
    grovetest::harness(&suite())
        .with_filter(DefaultFilter::new().extend_skip(["first"]))
        .with_formatter(TerseFormatter::default().with_target(buffer.clone()))
        .list()
        .unwrap();

    assert_eq!(
        buffer.to_string_lossy(),
        "Main::anonymous: test\nMain::Nested::second: test\nMain::Nested::Shared::is shared: test\n"
    );
}
