//! Prompt text for the generation and refinement rounds.

use std::sync::LazyLock;

use regex::Regex;

use crate::analysis::AnalysisContext;
use crate::models::RepositoryReference;
use crate::templates::Template;
use crate::util::truncate_chars;

/// How much of the previous round's document is resent for refinement.
pub const REFINE_PREFIX_CHARS: usize = 12000;

/// Attribute identifying the external-repository banner in a document.
pub const EXTERNAL_MARKER_ATTR: &str = "data-external-repo";

/// Banner that must appear in every page for a repository owned outside the
/// workspace's organization.
pub const EXTERNAL_MARKER: &str = r#"<div data-external-repo="true" style="background:#7c2d12;color:#fff7ed;padding:10px 16px;font:600 14px/1.4 system-ui,sans-serif;text-align:center">External repository: this project is maintained by a third party and is showcased here for reference only.</div>"#;

pub const SYSTEM_PROMPT: &str = "\
You are a senior front-end designer who turns source repositories into polished single-page showcases.
Always answer with one complete, self-contained HTML document inside a ```html code fence.
The document must start with <!DOCTYPE html>, inline all CSS and JavaScript, work without a build step, \
support both light and dark color schemes via prefers-color-scheme, and be responsive down to 360px wide.
Describe only what the provided repository context supports. Never invent features, metrics, or users.";

/// Improvement directives applied in every refinement round.
pub const REFINEMENT_CHECKLIST: [&str; 5] = [
    "Layout correctness: fix overlapping, clipped or misaligned elements and broken grid/flex structure.",
    "Dark/light mode consistency: every color must come from variables that switch with prefers-color-scheme, with readable contrast in both.",
    "Information density: remove filler and repetition, surface the concrete details from the repository context.",
    "Copy quality: tighten headings and body text, fix grammar, keep a confident technical tone.",
    "Responsiveness: verify the page at phone, tablet and desktop widths; nothing may overflow horizontally.",
];

static BODY_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<body[^>]*>").unwrap());

pub fn generation_prompt(
    reference: &RepositoryReference,
    repository_url: &str,
    context: &AnalysisContext,
    template: &Template,
    is_external: bool,
) -> String {
    let mut prompt = format!(
        "Create a showcase page for the repository {} ({}).\n\n\
         ## Visual template: {}\n{}\n\n\
         ## Repository context\n{}\n",
        reference.full_name(),
        repository_url,
        template.name,
        template.instructions,
        context.to_prompt(),
    );
    prompt.push_str(&format!(
        "\nLink to the repository at {} from the hero and the footer.\n",
        repository_url
    ));
    if is_external {
        prompt.push_str(&external_instruction());
    }
    prompt
}

pub fn refinement_prompt(previous: &str, is_external: bool, round: u32, total: u32) -> String {
    let prefix = truncate_chars(previous, REFINE_PREFIX_CHARS);
    let mut prompt = format!(
        "Refinement round {} of {}. Below is the current page{}.\n\n```html\n{}\n```\n\n\
         Return the complete improved document, applying every item of this checklist:\n",
        round,
        total,
        if prefix.len() < previous.len() {
            " (truncated; rebuild any missing tail)"
        } else {
            ""
        },
        prefix,
    );
    for (i, item) in REFINEMENT_CHECKLIST.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, item));
    }
    if is_external {
        prompt.push_str(&external_instruction());
    }
    prompt
}

fn external_instruction() -> String {
    format!(
        "\nThis repository is external. Keep this banner verbatim as the first element inside <body>:\n{}\n",
        EXTERNAL_MARKER
    )
}

pub fn has_external_banner(html: &str) -> bool {
    html.contains(EXTERNAL_MARKER_ATTR)
}

/// Insert the banner right after `<body ...>` (or at the top when there is
/// no body tag) unless it is already present.
pub fn ensure_external_banner(html: &str) -> String {
    if has_external_banner(html) {
        return html.to_string();
    }
    match BODY_OPEN.find(html) {
        Some(m) => format!("{}\n{}{}", &html[..m.end()], EXTERNAL_MARKER, &html[m.end()..]),
        None => format!("{}\n{}", EXTERNAL_MARKER, html),
    }
}
