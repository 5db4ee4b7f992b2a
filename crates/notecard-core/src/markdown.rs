//! Markdown to sanitized HTML.

use linkify::{LinkFinder, LinkKind};
use pulldown_cmark::{html, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream};

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Renders note content as HTML that is safe to embed.
///
/// GitHub-flavored extensions are enabled, bare URLs and email addresses
/// become links, and single newlines become `<br>`. The output passes an
/// allow-list sanitizer, so scripts, event handler attributes and
/// `javascript:` links never survive.
pub fn render_markdown(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let events = TextMergeStream::new(Parser::new_ext(text, parser_options())).map(|event| {
        match event {
            Event::SoftBreak => Event::HardBreak,
            other => other,
        }
    });
    let mut rendered = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut rendered, autolink(events).into_iter());

    sanitize(&rendered)
}

/// Wraps bare URLs and email addresses in link events, leaving text that is
/// already inside a link, an image or a code block alone.
fn autolink<'a>(events: impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
    let mut finder = LinkFinder::new();
    finder.kinds(&[LinkKind::Url, LinkKind::Email]);

    let mut nested = 0_usize;
    let mut output = Vec::new();
    for event in events {
        match event {
            Event::Start(tag @ (Tag::Link { .. } | Tag::Image { .. } | Tag::CodeBlock(_))) => {
                nested += 1;
                output.push(Event::Start(tag));
            }
            Event::End(end @ (TagEnd::Link | TagEnd::Image | TagEnd::CodeBlock)) => {
                nested = nested.saturating_sub(1);
                output.push(Event::End(end));
            }
            Event::Text(text) if nested == 0 => push_linked_text(&finder, &text, &mut output),
            other => output.push(other),
        }
    }
    output
}

fn push_linked_text<'a>(finder: &LinkFinder, text: &str, output: &mut Vec<Event<'a>>) {
    for span in finder.spans(text) {
        let fragment = span.as_str().to_string();
        let link_type = match span.kind() {
            Some(LinkKind::Url) => LinkType::Autolink,
            Some(LinkKind::Email) => LinkType::Email,
            _ => {
                output.push(Event::Text(fragment.into()));
                continue;
            }
        };
        output.push(Event::Start(Tag::Link {
            link_type,
            dest_url: fragment.clone().into(),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }));
        output.push(Event::Text(fragment.into()));
        output.push(Event::End(TagEnd::Link));
    }
}

fn sanitize(html: &str) -> String {
    ammonia::Builder::default()
        .add_tags(&["input"])
        .add_tag_attributes("input", &["type", "checked", "disabled"])
        .clean(html)
        .to_string()
}
