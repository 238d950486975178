//! Visual template catalog: one fixed design brief per classification.

use crate::models::Classification;

/// Layout, palette and required elements for one project category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub classification: Classification,
    pub name: &'static str,
    pub instructions: &'static str,
}

pub static TEMPLATES: [Template; 8] = [
    Template {
        classification: Classification::Ml,
        name: "Research Lab",
        instructions: "\
Layout: hero with the model/task headline, then a pipeline diagram (data -> features -> model -> output) built from inline SVG boxes and arrows, a metrics strip of 3-4 stat cards, and a 'How it works' section with collapsible details.
Palette: deep indigo background (#0f1029), violet accents (#8b5cf6), cyan highlights (#22d3ee), soft white text.
Required elements: an animated gradient hero, a training/inference flow diagram, a table of datasets or model variants when the context mentions them, a quick-start code block with copy button.",
    },
    Template {
        classification: Classification::Api,
        name: "Endpoint Console",
        instructions: "\
Layout: split hero with the service name on the left and a mock request/response terminal on the right, then an endpoint reference grid grouped by resource, an architecture diagram, and a deployment section.
Palette: slate background (#0f172a), emerald for success states (#10b981), amber for methods (#f59e0b), monospaced accents.
Required elements: color-coded HTTP method badges, at least one example request with a JSON response, a request-lifecycle diagram (client -> router -> handler -> storage), a tech-stack badge row.",
    },
    Template {
        classification: Classification::Cli,
        name: "Terminal Showcase",
        instructions: "\
Layout: full-width fake terminal hero that types out an example invocation, followed by a command reference table, a feature grid, and an install section with tabs per package manager.
Palette: near-black background (#0b0f0c), phosphor green (#4ade80), muted gray chrome, a single magenta accent (#e879f9).
Required elements: a window-chrome terminal with a blinking cursor, a flags/options table, copyable install commands, an example output block.",
    },
    Template {
        classification: Classification::Frontend,
        name: "Product Gallery",
        instructions: "\
Layout: bold marketing hero with a browser-frame mockup, a component gallery in a responsive card grid, a feature list with icons, and a tech-stack footer.
Palette: white or near-white surfaces, one saturated brand color derived from the project name, soft shadows, generous rounding.
Required elements: a browser mockup built from HTML/CSS, hover states on cards, a component or page map, a getting-started snippet.",
    },
    Template {
        classification: Classification::Library,
        name: "Package Docs",
        instructions: "\
Layout: documentation-style page with a sticky side navigation, a hero with the package name and install one-liner, an API overview grid, usage examples, and a compatibility table.
Palette: paper white (#fafaf9) with charcoal text, a cool blue accent (#2563eb), subtle code-block backgrounds.
Required elements: an install command with copy button, at least two annotated usage examples, an exported-API summary, version and license badges.",
    },
    Template {
        classification: Classification::Infra,
        name: "Ops Blueprint",
        instructions: "\
Layout: blueprint-grid hero, a topology diagram of services/containers/resources, a components table, and a deploy runbook section with numbered steps.
Palette: blueprint navy (#0b1d3a) with grid lines, white linework, orange warnings (#fb923c), teal healthy states (#2dd4bf).
Required elements: an SVG topology diagram, a service/resource table with ports or providers, a step-by-step deployment timeline, an environment variables reference.",
    },
    Template {
        classification: Classification::Monorepo,
        name: "Workspace Atlas",
        instructions: "\
Layout: overview hero, an interactive package map showing each workspace package as a node with dependency links, a per-package card grid, and a shared-tooling section.
Palette: graphite background (#18181b), distinct pastel color per package, white connectors.
Required elements: a package dependency map, cards naming each package and its role, the workspace tool (pnpm, turbo, nx, cargo, go work) called out, a repository layout summary.",
    },
    Template {
        classification: Classification::Generic,
        name: "Project Spotlight",
        instructions: "\
Layout: clean hero with the project name and one-line pitch, a 'What it does' section, a feature card grid, a structure overview derived from the directory tree, and a getting-started section.
Palette: neutral gray scale with one accent color chosen from the project's language or theme.
Required elements: a feature grid of 3-6 cards, a repository structure visualization, a getting-started code block, a footer linking to the repository.",
    },
];

/// Look up the template for `classification`, falling back to `generic`.
pub fn template_for(classification: Classification) -> &'static Template {
    TEMPLATES
        .iter()
        .find(|t| t.classification == classification)
        .unwrap_or(&TEMPLATES[TEMPLATES.len() - 1])
}
