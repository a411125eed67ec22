//! Markdown to [`VNode`] conversion with comrak.

use comrak::nodes::{AstNode, ListType, NodeValue, TableAlignment};
use comrak::{Arena, Options, parse_document};

use super::RenderOptions;
use super::vdom::VNode;
use crate::highlight::highlight_code;

/// Parse `source` and build the node forest for the rendered pane.
///
/// Total over its input: anything the parser does not recognise ends up as
/// literal text.
pub fn render_markdown(source: &str, render_options: &RenderOptions) -> Vec<VNode> {
    render_markdown_with(source, render_options, highlight_code)
}

/// Code fence highlighter: language hint and code in, `<code>` children out.
pub(crate) type Highlighter = fn(Option<&str>, &str) -> Vec<VNode>;

struct Converter<'o> {
    options: &'o RenderOptions,
    highlight: Highlighter,
}

pub(crate) fn render_markdown_with(
    source: &str,
    render_options: &RenderOptions,
    highlight: Highlighter,
) -> Vec<VNode> {
    let arena = Arena::new();
    let options = create_options();
    let root = parse_document(&arena, source, &options);
    let converter = Converter {
        options: render_options,
        highlight,
    };

    let mut out = Vec::new();
    for child in root.children() {
        convert(child, &converter, &mut out);
    }
    out
}

fn create_options() -> Options<'static> {
    let mut options = Options::default();

    // GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.superscript = true;

    // Typographic quotes and dashes
    options.parse.smart = true;

    options
}

fn convert<'a>(node: &'a AstNode<'a>, opts: &Converter<'_>, out: &mut Vec<VNode>) {
    let value = node.data.borrow().value.clone();
    match value {
        NodeValue::Document => convert_children(node, opts, out),

        NodeValue::FrontMatter(_) => {}

        NodeValue::Heading(heading) => {
            let children = children_of(node, opts);
            let slug = slugify(&plain_text(node));
            let attrs = if slug.is_empty() {
                Vec::new()
            } else {
                vec![attr("id", slug)]
            };
            out.push(VNode::element_with_attrs(
                &format!("h{}", heading.level.clamp(1, 6)),
                attrs,
                children,
            ));
        }

        NodeValue::Paragraph => {
            let children = children_of(node, opts);
            if in_tight_list(node) {
                out.extend(children);
            } else {
                out.push(VNode::element("p", children));
            }
        }

        NodeValue::BlockQuote => out.push(VNode::element("blockquote", children_of(node, opts))),

        NodeValue::ThematicBreak => out.push(VNode::element("hr", Vec::new())),

        NodeValue::List(list) => {
            let items = children_of(node, opts);
            match list.list_type {
                ListType::Bullet => out.push(VNode::element("ul", items)),
                ListType::Ordered => {
                    let attrs = if list.start == 1 {
                        Vec::new()
                    } else {
                        vec![attr("start", list.start.to_string())]
                    };
                    out.push(VNode::element_with_attrs("ol", attrs, items));
                }
            }
        }

        NodeValue::Item(_) => out.push(VNode::element("li", children_of(node, opts))),

        NodeValue::TaskItem(symbol) => {
            let mut checkbox = vec![attr("type", "checkbox"), attr("disabled", "")];
            if symbol.is_some() {
                checkbox.push(attr("checked", ""));
            }
            let mut children = vec![
                VNode::element_with_attrs("input", checkbox, Vec::new()),
                VNode::text(" "),
            ];
            children.extend(children_of(node, opts));
            out.push(VNode::element_with_attrs(
                "li",
                vec![attr("class", "task-list-item")],
                children,
            ));
        }

        NodeValue::CodeBlock(code_block) => {
            let language = code_block
                .info
                .split_whitespace()
                .next()
                .filter(|s| !s.is_empty())
                .map(ToString::to_string);
            out.push(code_fence(language.as_deref(), &code_block.literal, opts.highlight));
        }

        NodeValue::HtmlBlock(block) => out.push(html_passthrough(block.literal, opts)),

        NodeValue::HtmlInline(html) => push_node(out, html_passthrough(html, opts)),

        NodeValue::Table(table) => out.push(convert_table(node, &table.alignments, opts)),

        NodeValue::FootnoteDefinition(def) => {
            let id = format!("fn-{}", def.name);
            out.push(VNode::element_with_attrs(
                "div",
                vec![attr("class", "footnote"), attr("id", id)],
                children_of(node, opts),
            ));
        }

        NodeValue::FootnoteReference(reference) => {
            out.push(VNode::element_with_attrs(
                "sup",
                vec![attr("class", "footnote-ref")],
                vec![VNode::element_with_attrs(
                    "a",
                    vec![attr("href", format!("#fn-{}", reference.name))],
                    vec![VNode::text(reference.name)],
                )],
            ));
        }

        NodeValue::Text(text) => push_node(out, VNode::Text(text)),

        NodeValue::Code(code) => {
            out.push(VNode::element("code", vec![VNode::Text(code.literal)]));
        }

        NodeValue::SoftBreak => push_node(out, VNode::text("\n")),

        NodeValue::LineBreak => out.push(VNode::element("br", Vec::new())),

        NodeValue::Emph => out.push(VNode::element("em", children_of(node, opts))),

        NodeValue::Strong => out.push(VNode::element("strong", children_of(node, opts))),

        NodeValue::Strikethrough => out.push(VNode::element("del", children_of(node, opts))),

        NodeValue::Superscript => out.push(VNode::element("sup", children_of(node, opts))),

        NodeValue::Link(link) => {
            let mut attrs = vec![attr("href", link.url)];
            if !link.title.is_empty() {
                attrs.push(attr("title", link.title));
            }
            out.push(VNode::element_with_attrs("a", attrs, children_of(node, opts)));
        }

        NodeValue::Image(image) => {
            let mut attrs = vec![attr("src", image.url), attr("alt", plain_text(node))];
            if !image.title.is_empty() {
                attrs.push(attr("title", image.title));
            }
            out.push(VNode::element_with_attrs("img", attrs, Vec::new()));
        }

        // Anything else degrades to its children.
        _ => convert_children(node, opts, out),
    }
}

fn convert_children<'a>(node: &'a AstNode<'a>, opts: &Converter<'_>, out: &mut Vec<VNode>) {
    for child in node.children() {
        convert(child, opts, out);
    }
}

fn children_of<'a>(node: &'a AstNode<'a>, opts: &Converter<'_>) -> Vec<VNode> {
    let mut out = Vec::new();
    convert_children(node, opts, &mut out);
    out
}

// Adjacent text runs are merged so edits inside one run patch a single node.
fn push_node(out: &mut Vec<VNode>, node: VNode) {
    if let (Some(VNode::Text(last)), VNode::Text(text)) = (out.last_mut(), &node) {
        last.push_str(text);
        return;
    }
    out.push(node);
}

fn attr(name: &str, value: impl Into<String>) -> (String, String) {
    (name.to_string(), value.into())
}

fn code_fence(language: Option<&str>, literal: &str, highlight: Highlighter) -> VNode {
    let code_attrs = language
        .map(|lang| vec![attr("class", format!("language-{lang}"))])
        .unwrap_or_default();
    VNode::element_with_attrs(
        "pre",
        vec![attr("class", "hljs")],
        vec![VNode::element_with_attrs(
            "code",
            code_attrs,
            highlight(language, literal),
        )],
    )
}

fn html_passthrough(literal: String, opts: &Converter<'_>) -> VNode {
    if opts.options.allow_html {
        VNode::Raw(literal)
    } else {
        VNode::Text(literal)
    }
}

fn convert_table<'a>(
    node: &'a AstNode<'a>,
    alignments: &[TableAlignment],
    opts: &Converter<'_>,
) -> VNode {
    let mut head = Vec::new();
    let mut body = Vec::new();

    for row in node.children() {
        let is_header = matches!(row.data.borrow().value, NodeValue::TableRow(true));
        let cell_tag = if is_header { "th" } else { "td" };
        let cells = row
            .children()
            .enumerate()
            .map(|(index, cell)| {
                let attrs = match alignments.get(index) {
                    Some(TableAlignment::Left) => vec![attr("style", "text-align: left")],
                    Some(TableAlignment::Center) => vec![attr("style", "text-align: center")],
                    Some(TableAlignment::Right) => vec![attr("style", "text-align: right")],
                    _ => Vec::new(),
                };
                VNode::element_with_attrs(cell_tag, attrs, children_of(cell, opts))
            })
            .collect();
        let row = VNode::element("tr", cells);
        if is_header {
            head.push(row);
        } else {
            body.push(row);
        }
    }

    let mut sections = vec![VNode::element("thead", head)];
    if !body.is_empty() {
        sections.push(VNode::element("tbody", body));
    }
    VNode::element("table", sections)
}

fn in_tight_list<'a>(node: &'a AstNode<'a>) -> bool {
    let Some(item) = node.parent() else {
        return false;
    };
    if !matches!(
        item.data.borrow().value,
        NodeValue::Item(_) | NodeValue::TaskItem(_)
    ) {
        return false;
    }
    item.parent().is_some_and(|list| {
        matches!(&list.data.borrow().value, NodeValue::List(list) if list.tight)
    })
}

fn plain_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    for descendant in node.descendants() {
        match &descendant.data.borrow().value {
            NodeValue::Text(t) => text.push_str(t),
            NodeValue::Code(code) => text.push_str(&code.literal),
            NodeValue::SoftBreak | NodeValue::LineBreak => text.push(' '),
            _ => {}
        }
    }
    text
}

/// GitHub-style heading anchor.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() || c == '_' || c == '-' {
            slug.push(c);
        } else if c.is_whitespace() {
            slug.push('-');
        }
    }
    slug
}
