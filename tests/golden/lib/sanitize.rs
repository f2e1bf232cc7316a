use std::sync::LazyLock;

use regex::Regex;

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"finished in \d+\.\d{2}s").unwrap());

pub fn sanitize_duration(input: &str) -> String {
    DURATION_RE
        .replace_all(input, "finished in <duration>")
        .into_owned()
}
