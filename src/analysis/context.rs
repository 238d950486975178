//! Bounded-size digest of a checkout used to ground the model call.

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use super::tree::render_tree;
use crate::models::Classification;
use crate::util::read_excerpt;

pub const README_CHARS: usize = 4000;
pub const MANIFEST_CHARS: usize = 2500;
pub const SOURCE_CHARS: usize = 1500;
pub const MAX_SOURCES: usize = 2;

/// Readme variants in precedence order.
pub const README_CANDIDATES: &[&str] = &[
    "README.md",
    "readme.md",
    "Readme.md",
    "README.rst",
    "README.txt",
    "README",
];

/// Manifest files in precedence order.
pub const MANIFEST_CANDIDATES: &[&str] = &[
    "package.json",
    "Cargo.toml",
    "pyproject.toml",
    "requirements.txt",
    "setup.py",
    "go.mod",
    "Gemfile",
    "pom.xml",
    "build.gradle",
    "composer.json",
];

/// Representative source files to sample, per classification.
pub fn source_candidates(classification: Classification) -> &'static [&'static str] {
    match classification {
        Classification::Ml => &[
            "train.py",
            "model.py",
            "src/model.py",
            "main.py",
            "src/train.py",
            "inference.py",
        ],
        Classification::Api => &[
            "src/main.rs",
            "src/server.ts",
            "src/index.ts",
            "src/app.ts",
            "app.py",
            "main.py",
            "server.js",
            "index.js",
            "main.go",
        ],
        Classification::Cli => &[
            "src/main.rs",
            "src/cli.rs",
            "src/cli.ts",
            "cli.py",
            "cmd/root.go",
            "main.go",
            "bin/cli.js",
            "index.js",
        ],
        Classification::Frontend => &[
            "src/App.tsx",
            "src/App.jsx",
            "src/App.vue",
            "src/App.svelte",
            "app/page.tsx",
            "pages/index.tsx",
            "src/routes/+page.svelte",
            "src/main.ts",
            "src/main.tsx",
        ],
        Classification::Library => &[
            "src/lib.rs",
            "src/index.ts",
            "src/index.js",
            "index.js",
            "lib/index.js",
        ],
        Classification::Infra => &[
            "Dockerfile",
            "docker-compose.yml",
            "compose.yaml",
            "main.tf",
            "variables.tf",
        ],
        Classification::Monorepo => &[
            "pnpm-workspace.yaml",
            "turbo.json",
            "nx.json",
            "lerna.json",
            "go.work",
        ],
        Classification::Generic => &[
            "main.py",
            "src/main.rs",
            "main.go",
            "index.js",
            "src/index.ts",
            "app.py",
        ],
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestExcerpt {
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceExcerpt {
    pub path: String,
    pub content: String,
}

/// Grounding material for one repository's generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisContext {
    pub classification: Classification,
    pub tree: String,
    pub readme: Option<String>,
    pub manifest: Option<ManifestExcerpt>,
    pub sources: Vec<SourceExcerpt>,
}

/// Build the context for `root`. Missing files leave fields empty.
pub fn build_context(root: &Path, classification: Classification) -> AnalysisContext {
    let readme = README_CANDIDATES
        .iter()
        .find_map(|name| read_excerpt(&root.join(name), README_CHARS));

    let manifest = MANIFEST_CANDIDATES.iter().find_map(|name| {
        read_excerpt(&root.join(name), MANIFEST_CHARS).map(|content| ManifestExcerpt {
            file_name: (*name).to_string(),
            content,
        })
    });

    let sources = source_candidates(classification)
        .iter()
        .filter_map(|rel| {
            read_excerpt(&root.join(rel), SOURCE_CHARS).map(|content| SourceExcerpt {
                path: (*rel).to_string(),
                content,
            })
        })
        .take(MAX_SOURCES)
        .collect();

    AnalysisContext {
        classification,
        tree: render_tree(root),
        readme,
        manifest,
        sources,
    }
}

impl AnalysisContext {
    /// Render as a prompt section. Omitted fields produce no heading.
    pub fn to_prompt(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Project type: {}\n", self.classification);
        let _ = writeln!(out, "## Directory structure\n```\n{}\n```\n", self.tree);
        if let Some(readme) = &self.readme {
            let _ = writeln!(out, "## README (excerpt)\n{}\n", readme);
        }
        if let Some(manifest) = &self.manifest {
            let _ = writeln!(
                out,
                "## {} (excerpt)\n```\n{}\n```\n",
                manifest.file_name, manifest.content
            );
        }
        for source in &self.sources {
            let _ = writeln!(out, "## {} (excerpt)\n```\n{}\n```\n", source.path, source.content);
        }
        out
    }
}
