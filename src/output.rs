//! Terminal output for query results

use crate::index::reader::SearchResult;
use crate::index::types::CssClass;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print results of one query, one per line:
/// `label  name  -> prefix + url`, with the typed prefix highlighted
pub fn print_results(
    query: &str,
    results: &[SearchResult<'_>],
    symbol_prefix: &str,
    color: bool,
) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    write_results(&mut stdout, query, results, symbol_prefix)
}

/// Write results to any color-capable sink
pub fn write_results<W: WriteColor>(
    out: &mut W,
    query: &str,
    results: &[SearchResult<'_>],
    symbol_prefix: &str,
) -> io::Result<()> {
    if results.is_empty() {
        out.set_color(ColorSpec::new().set_dimmed(true))?;
        writeln!(out, "no results for {query:?}")?;
        out.reset()?;
        return Ok(());
    }

    for result in results {
        let mut spec = ColorSpec::new();
        spec.set_fg(kind_color(result.css_class));
        out.set_color(&spec)?;
        write!(out, "{:>9}", result.label)?;
        out.reset()?;
        write!(out, "  ")?;

        let mut name = ColorSpec::new();
        if result.deleted || result.deprecated {
            name.set_dimmed(true);
        }
        let highlighted = highlight_len(result.name, query);
        out.set_color(name.clone().set_bold(true))?;
        write!(out, "{}", &result.name[..highlighted])?;
        out.set_color(&name)?;
        write!(out, "{}", &result.name[highlighted..])?;
        out.reset()?;

        if result.deprecated {
            write!(out, " (deprecated)")?;
        }
        if result.deleted {
            write!(out, " (deleted)")?;
        }

        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
        write!(out, "  -> {symbol_prefix}{}", result.url)?;
        out.reset()?;
        writeln!(out)?;
    }
    Ok(())
}

/// Length of the part of `name` the query already matched, on a char boundary
fn highlight_len(name: &str, query: &str) -> usize {
    let mut len = 0;
    for (a, b) in name.chars().zip(query.chars()) {
        if !a.to_lowercase().eq(b.to_lowercase()) {
            break;
        }
        len += a.len_utf8();
    }
    len
}

fn kind_color(class: CssClass) -> Option<Color> {
    match class {
        CssClass::Default => None,
        CssClass::Primary => Some(Color::Blue),
        CssClass::Success => Some(Color::Green),
        CssClass::Warning => Some(Color::Yellow),
        CssClass::Danger => Some(Color::Red),
        CssClass::Info => Some(Color::Cyan),
        CssClass::Dim => Some(Color::White),
    }
}
