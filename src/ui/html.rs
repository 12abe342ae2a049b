// logdyn-viewer - ui/html.rs
//
// Markup generation for fragments and surfaces. Markup is always produced
// from the structured fragment model; it is never parsed back.
//
// Every piece of record-supplied text passes through `escape_html`.

use crate::core::surface::{DisplaySurface, Fragment};
use crate::ui::theme::{self, FILTERED_CLASS, SURFACE_CLASS};
use std::fmt::Write;

/// Escape the five HTML metacharacters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

/// Escaped message with every highlight range wrapped in `<mark>`.
///
/// Ranges must be sorted, non-overlapping and on char boundaries, which is
/// what `FilterPattern::evaluate` produces.
pub fn render_message(message: &str, highlights: &[std::ops::Range<usize>]) -> String {
    let mut out = String::with_capacity(message.len() + highlights.len() * 13);
    let mut cursor = 0;
    for range in highlights {
        if range.start < cursor || range.end > message.len() {
            continue;
        }
        out.push_str(&escape_html(&message[cursor..range.start]));
        out.push_str("<mark>");
        out.push_str(&escape_html(&message[range.clone()]));
        out.push_str("</mark>");
        cursor = range.end;
    }
    out.push_str(&escape_html(&message[cursor..]));
    out
}

/// Markup for a single fragment.
pub fn render_fragment(fragment: &Fragment) -> String {
    let (style, icon) = theme::level_style(&fragment.level);
    let level = escape_html(&fragment.level);

    let mut classes = format!("{} {}", style.css_class(), theme::level_class(&fragment.level));
    if fragment.is_filtered_out() {
        classes.push(' ');
        classes.push_str(FILTERED_CLASS);
    }

    let icon_class = match icon {
        Some(icon) => format!("glyphicon {}", icon.css_class()),
        None => "glyphicon".to_string(),
    };

    let iso = escape_html(&fragment.timestamp.iso);
    format!(
        "<samp class=\"{classes}\" data-level=\"{level}\">\
         <span class=\"{icon_class}\"></span>\
         <span class=\"timestamp\"><time datetime=\"{iso}\" title=\"{iso}\">{local}</time> : </span>\
         {level} : {message}<br/></samp>",
        local = escape_html(&fragment.timestamp.local),
        message = render_message(&fragment.message, fragment.highlights()),
    )
}

/// Markup for every fragment of a surface, in receipt order.
pub fn render_fragments(surface: &DisplaySurface) -> String {
    let mut out = String::new();
    for fragment in surface.fragments() {
        out.push_str(&render_fragment(fragment));
    }
    out
}

/// Classes the viewer owns on a surface container: `logElement` plus one
/// class per hidden level.
pub fn surface_class_names(surface: &DisplaySurface) -> Vec<String> {
    std::iter::once(SURFACE_CLASS.to_string())
        .chain(surface.hidden_levels().map(theme::hidden_level_class))
        .collect()
}

/// Class attribute of a surface container.
pub fn surface_classes(surface: &DisplaySurface) -> String {
    surface_class_names(surface).join(" ")
}

/// Stylesheet hiding filtered fragments and fragments of hidden levels.
/// Every rule is scoped to the surface's own container.
pub fn stylesheet(surface: &DisplaySurface) -> String {
    let scope = theme::surface_selector(surface.name());
    let mut css = format!(
        "{scope} samp {{ display: block; }}\n{scope} .{FILTERED_CLASS} {{ display: none; }}\n"
    );
    for level in surface.hidden_levels() {
        let _ = writeln!(
            css,
            "{scope}.{} .{} {{ display: none; }}",
            theme::hidden_level_class(level),
            theme::level_class(level)
        );
    }
    css
}

/// Standalone HTML document showing one surface.
pub fn render_document(surface: &DisplaySurface, title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>\n{css}</style>\n</head>\n<body>\n\
         <div class=\"{classes}\" id=\"{id}\">{body}</div>\n</body>\n</html>\n",
        title = escape_html(title),
        css = stylesheet(surface),
        classes = surface_classes(surface),
        id = escape_html(surface.name()),
        body = render_fragments(surface),
    )
}
