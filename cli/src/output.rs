use std::io::Write;

use anyhow::Context;

/// Print each submitted batch on its own line, or all of them as one JSON array.
pub fn write_batches(
    out: &mut impl Write,
    batches: &[Vec<String>],
    json: bool,
) -> anyhow::Result<()> {
    if json {
        serde_json::to_writer(&mut *out, batches).context("serialize batches")?;
        writeln!(out).context("write batches")?;
        return Ok(());
    }
    for batch in batches {
        writeln!(out, "{}", batch.join(", ")).context("write batches")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn batches() -> Vec<Vec<String>> {
        vec![
            vec!["a@x.com".to_string(), "b@x.com".to_string()],
            vec!["c@x.com".to_string()],
        ]
    }

    fn render(json: bool) -> String {
        let mut out = Vec::new();
        write_batches(&mut out, &batches(), json).expect("write batches");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn plain_output_is_one_line_per_batch() {
        assert_eq!(render(false), "a@x.com, b@x.com\nc@x.com\n");
    }

    #[test]
    fn json_output_is_an_array_of_batches() {
        assert_eq!(
            render(true),
            "[[\"a@x.com\",\"b@x.com\"],[\"c@x.com\"]]\n"
        );
    }

    #[test]
    fn nothing_submitted_prints_nothing() {
        let mut out = Vec::new();
        write_batches(&mut out, &[], false).expect("write batches");
        assert!(out.is_empty());
    }
}
