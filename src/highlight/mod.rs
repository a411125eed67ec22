//! Syntax highlighting for code fences.
//!
//! Uses syntect with the bundled Sublime Text syntax definitions. Output is
//! a list of [`VNode`]s meant to sit inside a `<code>` element: colored
//! `<span>`s when the language is known, a single escaped text node when it is
//! not or when highlighting fails.

use std::sync::{Mutex, OnceLock};

use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, FontStyle, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::render::VNode;

const LIGHT_THEMES: &[&str] = &["InspiredGitHub", "Solarized (light)", "base16-ocean.light"];
const DARK_THEMES: &[&str] = &["base16-ocean.dark", "Solarized (dark)", "base16-eighties.dark"];

/// Palette used for highlighted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightBackground {
    Light,
    Dark,
}

static BACKGROUND_OVERRIDE: OnceLock<Mutex<Option<HighlightBackground>>> = OnceLock::new();

pub fn set_background_mode(mode: Option<HighlightBackground>) {
    let lock = BACKGROUND_OVERRIDE.get_or_init(|| Mutex::new(None));
    let mut guard = match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = mode;
}

/// The preview pane is light unless told otherwise.
fn background_mode() -> HighlightBackground {
    let lock = BACKGROUND_OVERRIDE.get_or_init(|| Mutex::new(None));
    lock.lock()
        .ok()
        .and_then(|guard| *guard)
        .unwrap_or(HighlightBackground::Light)
}

/// Whether `language` names a syntax we can highlight.
pub fn is_supported(language: &str) -> bool {
    find_syntax(language).is_some()
}

/// Highlight `code` written in `language`.
///
/// Unknown or missing languages, and any highlighter error, yield the code as
/// one plain text node. A failure never escapes this function.
pub fn highlight_code(language: Option<&str>, code: &str) -> Vec<VNode> {
    let Some(syntax) = language.and_then(find_syntax) else {
        return plain(code);
    };
    let _scope = crate::perf::scope("highlight.block");
    highlight_or_plain(language, code, || {
        highlight_with(syntax, code, theme_for(background_mode()))
    })
}

/// Run `highlight`, replacing any error with `code` as plain text.
pub(crate) fn highlight_or_plain(
    language: Option<&str>,
    code: &str,
    highlight: impl FnOnce() -> Result<Vec<VNode>, syntect::Error>,
) -> Vec<VNode> {
    match highlight() {
        Ok(nodes) => nodes,
        Err(err) => {
            tracing::warn!(language = ?language, error = %err, "highlighting failed, using plain text");
            plain(code)
        }
    }
}

fn plain(code: &str) -> Vec<VNode> {
    if code.is_empty() {
        Vec::new()
    } else {
        vec![VNode::text(code)]
    }
}

fn highlight_with(
    syntax: &SyntaxReference,
    code: &str,
    theme: &Theme,
) -> Result<Vec<VNode>, syntect::Error> {
    let syntax_set = syntax_set();
    let default_fg = theme.settings.foreground;
    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut nodes: Vec<VNode> = Vec::new();

    for line in LinesWithEndings::from(code) {
        for (style, text) in highlighter.highlight_line(line, syntax_set)? {
            if text.is_empty() {
                continue;
            }
            let plain_token = Some(style.foreground) == default_fg
                && style.font_style == FontStyle::empty();
            if plain_token {
                push_text(&mut nodes, text);
            } else {
                nodes.push(VNode::element_with_attrs(
                    "span",
                    vec![("style".to_string(), css_for(style.foreground, style.font_style))],
                    vec![VNode::text(text)],
                ));
            }
        }
    }
    Ok(nodes)
}

fn push_text(nodes: &mut Vec<VNode>, text: &str) {
    if let Some(VNode::Text(last)) = nodes.last_mut() {
        last.push_str(text);
    } else {
        nodes.push(VNode::text(text));
    }
}

fn css_for(color: Color, font: FontStyle) -> String {
    let mut css = format!("color:#{:02x}{:02x}{:02x}", color.r, color.g, color.b);
    if font.contains(FontStyle::BOLD) {
        css.push_str(";font-weight:bold");
    }
    if font.contains(FontStyle::ITALIC) {
        css.push_str(";font-style:italic");
    }
    if font.contains(FontStyle::UNDERLINE) {
        css.push_str(";text-decoration:underline");
    }
    css
}

fn find_syntax(language: &str) -> Option<&'static SyntaxReference> {
    let language = language.trim();
    if language.is_empty() {
        return None;
    }
    let syntax_set = syntax_set();
    syntax_set
        .find_syntax_by_token(language)
        .or_else(|| syntax_set.find_syntax_by_name(language))
        .filter(|syntax| syntax.name != "Plain Text")
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.syntax_set.load_defaults");
        SyntaxSet::load_defaults_newlines()
    })
}

fn theme_for(mode: HighlightBackground) -> &'static Theme {
    static THEMES: OnceLock<ThemeSet> = OnceLock::new();
    static FALLBACK: OnceLock<Theme> = OnceLock::new();
    let theme_set = THEMES.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.theme.load_defaults");
        ThemeSet::load_defaults()
    });
    let preferred = match mode {
        HighlightBackground::Light => LIGHT_THEMES,
        HighlightBackground::Dark => DARK_THEMES,
    };
    preferred
        .iter()
        .find_map(|name| theme_set.themes.get(*name))
        .or_else(|| theme_set.themes.values().next())
        .unwrap_or_else(|| FALLBACK.get_or_init(Theme::default))
}
