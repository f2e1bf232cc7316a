use grovetest::prelude::*;
use pretty_assertions::assert_eq;

use crate::lib::{run_pretty, stream_lines};

fn sums() -> Result<Group, BuildError> {
    let pairs = ParamSets::sets([
        Params::positional([1, 2]),
        Params::positional([2, 4]),
    ]);

    Group::build("Sum", |g| {
        g.group_with("of", GroupOptions::new().params(pairs), |g| {
            g.param_setup(|ctx, params| -> Result<(), BoxError> {
                let value = |i| params.at(i).and_then(ParamValue::as_int).ok_or("missing value");
                ctx.set("sum", value(0)? + value(1)?);
                Ok(())
            })?;
            g.test_case("is positive", |case| -> Result<(), BoxError> {
                let sum = *case.require::<i64>("sum")?;
                case.assert_true(sum > 0)?;
                Ok(())
            })?;
            g.test_case("is odd", |case| -> Result<(), BoxError> {
                let sum = *case.require::<i64>("sum")?;
                case.assert_eq(sum % 2, 1)?;
                Ok(())
            })
        })
    })
}

fn checks() -> Result<Group, BuildError> {
    let sets = ParamSets::labeled([
        ("small", Params::named([("n", 1)])),
        ("large", Params::named([("n", 1000)])),
    ]);

    Group::build("Check", |g| {
        g.group_with("size", GroupOptions::new().params(sets), |g| {
            g.param_setup(|ctx, params| {
                ctx.set("n", params.named_value("n").and_then(ParamValue::as_int));
            })?;
            g.test_case("fits in a byte", |case| -> Result<(), BoxError> {
                let n = case.require::<Option<i64>>("n")?.ok_or("no n")?;
                case.assert_true(n < 256)?;
                Ok(())
            })
        })
    })
}

#[test]
fn parameterized_groups_run_once_per_set() {
    let suite = Suite::new().with(sums().unwrap()).with(checks().unwrap());
    let (output, report) = run_pretty(&suite).unwrap();

    assert_eq!(
        stream_lines(&output),
        [
            "Sum",
            "  of (1, 2)",
            "    is positive ... ok",
            "    is odd ... ok",
            "  of (2, 4)",
            "    is positive ... ok",
            "    is odd ... FAIL",
            "Check",
            "  size small",
            "    fits in a byte ... ok",
            "  size large",
            "    fits in a byte ... FAIL",
        ]
    );

    let failed: Vec<_> = report
        .outcomes
        .iter()
        .filter(|(_, outcome)| outcome.failed())
        .map(|(name, _)| name.as_str())
        .collect();
    assert_eq!(failed, ["Sum::of (2, 4)::is odd", "Check::size large::fits in a byte"]);
    assert!(output.contains("AssertionError: 0 != 1\n"));
    assert!(output.contains("AssertionError: false is not true\n"));
}
