//! Severity tags
//!
//! Lines carry bracketed tags such as `[red]` or `[green]`; `[/]` and
//! `[default]` return to the default colour. Anything else in brackets is
//! ordinary text.

/// Colour attached to a span of output
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Default,
    Green,
    Red,
    Blue,
}

impl Severity {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "default" | "/" => Some(Severity::Default),
            "green" => Some(Severity::Green),
            "red" => Some(Severity::Red),
            "blue" => Some(Severity::Blue),
            _ => None,
        }
    }

    pub fn ansi(&self) -> &'static str {
        match self {
            Severity::Default => "\x1b[0m",
            Severity::Green => "\x1b[32m",
            Severity::Red => "\x1b[31m",
            Severity::Blue => "\x1b[34m",
        }
    }
}

/// Translate severity tags into ANSI escapes, or drop them when `colorize` is off
pub fn render(line: &str, colorize: bool) -> String {
    let mut output = String::with_capacity(line.len() + 16);
    let mut current = Severity::Default;
    let mut rest = line;

    while let Some(open) = rest.find('[') {
        output.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let tag = after
            .find(']')
            .and_then(|close| Severity::from_tag(&after[..close]).map(|s| (close, s)));

        match tag {
            Some((close, severity)) => {
                if colorize && severity != current {
                    output.push_str(severity.ansi());
                }
                current = severity;
                rest = &after[close + 1..];
            }
            None => {
                output.push('[');
                rest = after;
            }
        }
    }
    output.push_str(rest);

    if colorize && current != Severity::Default {
        output.push_str(Severity::Default.ansi());
    }
    output
}
