//! Line-based reader and writer for the config file.
//!
//! The format is a small subset of TOML: top-level `key = value` scalars,
//! one `[executors]` table and any number of `[commands.<alias>]` tables.
//! Every value is a string. A blank line closes the current section, so a
//! key after it lands back among the scalars.

use std::fmt::Write as _;

use super::{CommandEntry, Config};
use crate::error::{DecodeError, ValueError};

const EXECUTORS_SECTION: &str = "executors";
const COMMANDS_PREFIX: &str = "commands.";

#[derive(Debug)]
enum Section {
    Top,
    Executors,
    Command(String),
}

/// Parse config text. Built-in executors are merged in afterwards.
///
/// # Errors
/// Returns a [`DecodeError`] for the first malformed line; nothing from a
/// failed decode is kept.
pub fn decode(text: &str) -> Result<Config, DecodeError> {
    let mut cfg = Config::default();
    let mut section = Section::Top;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if line.is_empty() {
            section = Section::Top;
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        if let Some(inner) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section = parse_header(inner.trim(), line_no)?;
            if let Section::Command(alias) = &section {
                cfg.commands.entry(alias.clone()).or_default();
            }
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(DecodeError::InvalidLine {
                line: line_no,
                text: line.to_string(),
            });
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(DecodeError::EmptyKey {
                line: line_no,
                text: line.to_string(),
            });
        }
        let value = parse_value(value.trim()).map_err(|source| DecodeError::InvalidValue {
            line: line_no,
            key: key.to_string(),
            source,
        })?;

        match &section {
            Section::Top => {
                cfg.scalars.insert(key.to_string(), value);
            }
            Section::Executors => cfg.set_executor(key, value),
            Section::Command(alias) => {
                let entry = cfg.commands.entry(alias.clone()).or_default();
                match key {
                    "path" => entry.path = value,
                    "description" => entry.description = value,
                    _ => {
                        return Err(DecodeError::UnknownCommandKey {
                            line: line_no,
                            alias: alias.clone(),
                            key: key.to_string(),
                        });
                    }
                }
            }
        }
    }

    cfg.merge_default_executors();
    Ok(cfg)
}

fn parse_header(name: &str, line: usize) -> Result<Section, DecodeError> {
    if name == EXECUTORS_SECTION {
        return Ok(Section::Executors);
    }
    if let Some(alias) = name.strip_prefix(COMMANDS_PREFIX) {
        let alias = alias.trim();
        if alias.is_empty() {
            return Err(DecodeError::EmptyAlias { line });
        }
        return Ok(Section::Command(alias.to_string()));
    }
    Err(DecodeError::UnknownSection {
        line,
        name: name.to_string(),
    })
}

/// Decode one value. Quoted values follow TOML string rules (`"..."` with
/// backslash escapes, `'...'` literal) and must span the whole value;
/// anything else is taken verbatim.
fn parse_value(input: &str) -> Result<String, ValueError> {
    let Some(quote) = input.chars().next() else {
        return Err(ValueError::Empty);
    };
    if quote != '"' && quote != '\'' {
        return Ok(input.to_string());
    }
    if input.starts_with(r#"""""#) || input.starts_with("'''") {
        return Err(ValueError::MultiLine);
    }
    if !closes_at_end(input, quote) {
        return Err(ValueError::Unterminated);
    }

    let doc: toml::Table =
        toml::from_str(&format!("v = {input}")).map_err(ValueError::Unquote)?;
    match doc.get("v") {
        Some(toml::Value::String(s)) => Ok(s.clone()),
        _ => Err(ValueError::NotAString),
    }
}

/// True when the first unescaped `quote` after the opening one is the
/// last character of `input`.
fn closes_at_end(input: &str, quote: char) -> bool {
    let body = &input[quote.len_utf8()..];
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\\' && quote == '"' {
            chars.next();
        } else if c == quote {
            return i + c.len_utf8() == body.len();
        }
    }
    false
}

/// Render a config. Output is sorted and always quotes values, so
/// `decode(&encode(cfg))` gives `cfg` back.
pub fn encode(cfg: &Config) -> String {
    let mut out = String::new();

    for (key, value) in &cfg.scalars {
        let _ = writeln!(out, "{key} = {}", quote(value));
    }

    if !cfg.executors.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("[executors]\n");
        for (ext, template) in &cfg.executors {
            let _ = writeln!(out, "{ext} = {}", quote(template));
        }
    }

    if !cfg.commands.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        let blocks: Vec<String> = cfg
            .commands
            .iter()
            .map(|(alias, entry)| encode_command(alias, entry))
            .collect();
        out.push_str(&blocks.join("\n"));
    }

    out
}

fn encode_command(alias: &str, entry: &CommandEntry) -> String {
    format!(
        "[{COMMANDS_PREFIX}{alias}]\npath = {}\ndescription = {}\n",
        quote(&entry.path),
        quote(&entry.description)
    )
}

/// Quote as a TOML basic string.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_EXECUTORS;

    fn entry(path: &str, description: &str) -> CommandEntry {
        CommandEntry {
            path: path.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn decode_reads_all_sections() {
        let text = r#"
# personal scripts
commands_folder = "$HOME/scripts"
editor = vim

[executors]
RB = "ruby {{path}}"
sh = 'bash {{path}}'

[commands.deploy]
path = "$HOME/scripts/deploy.sh"
description = "Run deployment"
"#;
        let cfg = decode(text).unwrap();

        assert_eq!(cfg.scalar("commands_folder"), Some("$HOME/scripts"));
        assert_eq!(cfg.scalar("editor"), Some("vim"));
        assert_eq!(cfg.executor("rb"), Some("ruby {{path}}"));
        assert_eq!(cfg.executor("sh"), Some("bash {{path}}"));
        assert_eq!(cfg.executor("py"), Some("python3 {{path}}"));
        assert_eq!(
            cfg.commands.get("deploy"),
            Some(&entry("$HOME/scripts/deploy.sh", "Run deployment"))
        );
    }

    #[test]
    fn decode_without_executors_yields_exactly_defaults() {
        let cfg = decode("commands_folder = \"/x\"\n").unwrap();
        let want: Vec<(String, String)> = DEFAULT_EXECUTORS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let got: Vec<(String, String)> = cfg.executors.into_iter().collect();
        assert_eq!(got, want);
    }

    #[test]
    fn decode_override_keeps_other_defaults() {
        let cfg = decode("[executors]\npy = \"pypy3 {{path}}\"\n").unwrap();
        assert_eq!(cfg.executors.len(), 3);
        assert_eq!(cfg.executor("py"), Some("pypy3 {{path}}"));
        assert_eq!(cfg.executor("sh"), Some("sh {{path}}"));
        assert_eq!(cfg.executor("js"), Some("node {{path}}"));
    }

    #[test]
    fn blank_line_returns_to_scalars() {
        let cfg = decode("[executors]\nsh = \"sh {{path}}\"\n\nstray = \"yes\"\n").unwrap();
        assert_eq!(cfg.scalar("stray"), Some("yes"));
        assert!(!cfg.executors.contains_key("stray"));
    }

    #[test]
    fn header_alone_creates_empty_record() {
        let cfg = decode("[commands.empty]\n").unwrap();
        assert_eq!(cfg.commands.get("empty"), Some(&CommandEntry::default()));
    }

    #[test]
    fn value_split_on_first_equals() {
        let cfg = decode("url = a=b=c\n").unwrap();
        assert_eq!(cfg.scalar("url"), Some("a=b=c"));
    }

    #[test]
    fn decode_errors() {
        assert!(matches!(
            decode("[plugins]\n").unwrap_err(),
            DecodeError::UnknownSection { line: 1, name } if name == "plugins"
        ));
        assert!(matches!(
            decode("x = 1\n[commands.]\n").unwrap_err(),
            DecodeError::EmptyAlias { line: 2 }
        ));
        assert!(matches!(
            decode("just words\n").unwrap_err(),
            DecodeError::InvalidLine { line: 1, .. }
        ));
        assert!(matches!(
            decode(" = value\n").unwrap_err(),
            DecodeError::EmptyKey { line: 1, .. }
        ));
        assert!(matches!(
            decode("[commands.a]\nshell = \"zsh\"\n").unwrap_err(),
            DecodeError::UnknownCommandKey { line: 2, alias, key } if alias == "a" && key == "shell"
        ));
    }

    fn value_error(text: &str) -> ValueError {
        match decode(text) {
            Err(DecodeError::InvalidValue { source, .. }) => source,
            other => panic!("expected an invalid value for {text:?}, got {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_bad_values() {
        assert!(matches!(
            decode("k =\n").unwrap_err(),
            DecodeError::InvalidValue {
                line: 1,
                source: ValueError::Empty,
                ..
            }
        ));
        assert!(matches!(
            value_error("k = \"unterminated\n"),
            ValueError::Unterminated
        ));
        assert!(matches!(value_error("k = \"a\\\"\n"), ValueError::Unterminated));
    }

    #[test]
    fn bad_escape_keeps_the_toml_error() {
        let err = value_error("k = \"bad \\q escape\"\n");
        assert!(matches!(err, ValueError::Unquote(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn decode_rejects_multi_line_strings() {
        assert!(matches!(value_error("k = \"\"\"x\"\"\"\n"), ValueError::MultiLine));
        assert!(matches!(value_error("k = '''x'''\n"), ValueError::MultiLine));
    }

    #[test]
    fn decode_rejects_text_after_closing_quote() {
        assert!(matches!(value_error("k = \"a\" # c\n"), ValueError::Unterminated));
        assert!(matches!(value_error("k = 'a' b\n"), ValueError::Unterminated));
        assert!(matches!(value_error("k = \"a\" # c\"\n"), ValueError::Unterminated));
    }

    #[test]
    fn decode_accepts_escaped_quotes_and_literal_strings() {
        let cfg = decode("a = \"say \\\"hi\\\"\"\nb = 'C:\\dir'\n").unwrap();
        assert_eq!(cfg.scalar("a"), Some("say \"hi\""));
        assert_eq!(cfg.scalar("b"), Some("C:\\dir"));
    }

    #[test]
    fn decode_accepts_empty_quoted_value() {
        let cfg = decode("k = \"\"\n").unwrap();
        assert_eq!(cfg.scalar("k"), Some(""));
    }

    #[test]
    fn encode_layout() {
        let mut cfg = Config::default();
        cfg.scalars.insert("commands_folder".into(), "/c".into());
        cfg.scalars.insert("a".into(), "1".into());
        cfg.set_executor("sh", "sh {{path}}");
        cfg.commands.insert("zeta".into(), entry("/z.sh", "last"));
        cfg.commands.insert("alpha".into(), entry("/a.sh", "first"));

        let want = "\
a = \"1\"
commands_folder = \"/c\"

[executors]
sh = \"sh {{path}}\"

[commands.alpha]
path = \"/a.sh\"
description = \"first\"

[commands.zeta]
path = \"/z.sh\"
description = \"last\"
";
        assert_eq!(encode(&cfg), want);
    }

    #[test]
    fn encode_empty_config_is_empty() {
        assert_eq!(encode(&Config::default()), "");
    }

    #[test]
    fn encode_commands_only_has_no_leading_blank() {
        let mut cfg = Config::default();
        cfg.commands.insert("a".into(), entry("/a.sh", "x"));
        assert!(encode(&cfg).starts_with("[commands.a]\n"));
    }

    #[test]
    fn round_trip_preserves_awkward_values() {
        let mut cfg = Config::default();
        cfg.scalars.insert("eq".into(), "a = b".into());
        cfg.scalars.insert("bracket".into(), "[not a section]".into());
        cfg.scalars.insert("hash".into(), "# not a comment".into());
        cfg.scalars.insert("ws".into(), "  padded\tvalue  ".into());
        cfg.scalars.insert("quotes".into(), "it's \"quoted\" \\ here".into());
        cfg.scalars.insert("multi".into(), "line1\nline2\r\u{7}".into());
        cfg.scalars.insert("unicode".into(), "héllo ✓".into());
        cfg.scalars.insert("empty".into(), String::new());
        cfg.merge_default_executors();
        cfg.set_executor("rb", "ruby -w {{path}}");
        cfg.commands
            .insert("it's".into(), entry("$HOME/it's here.sh", "say \"hi\""));
        cfg.commands.insert("ruby-task".into(), entry("/opt/t.rb", ""));

        let back = decode(&encode(&cfg)).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn quote_escapes_controls() {
        assert_eq!(quote("a\"b\\c"), r#""a\"b\\c""#);
        assert_eq!(quote("\u{1}"), r#""\u0001""#);
        assert_eq!(quote("tab\there"), r#""tab\there""#);
    }
}
