//! Heuristic repository classification.
//!
//! Rules are evaluated strictly in table order and the first match wins, so
//! a repository with both a notebook and a Dockerfile is always `ml`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use walkdir::WalkDir;

use super::is_noise_dir;
use crate::models::Classification;

/// How deep the fact collector descends below the checkout root.
const WALK_DEPTH: usize = 4;

/// Upper bound on visited entries so huge repositories stay cheap.
const MAX_WALK_ENTRIES: usize = 20_000;

/// Extensions that decide a rule wherever they appear, so they are looked
/// for below `WALK_DEPTH` and past `MAX_WALK_ENTRIES` too.
const DEEP_EXTENSIONS: &[&str] = &["ipynb", "tf", "tfvars", "hcl"];

/// Largest manifest prefix kept for pattern matching.
const MAX_MANIFEST_BYTES: usize = 64 * 1024;

/// Root-level files whose contents name a project's dependencies.
pub const MANIFEST_FILES: &[&str] = &[
    "package.json",
    "Cargo.toml",
    "pyproject.toml",
    "requirements.txt",
    "setup.py",
    "setup.cfg",
    "Pipfile",
    "environment.yml",
    "go.mod",
    "Gemfile",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "composer.json",
];

static ML_LIBRARIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(torch|pytorch|tensorflow|keras|scikit-learn|sklearn|numpy|pandas|scipy|jax|transformers|xgboost|lightgbm|catboost|onnxruntime|candle-core|ndarray)\b",
    )
    .unwrap()
});

static FRONTEND_FRAMEWORKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r#""(react|react-dom|vue|svelte|@sveltejs/kit|@angular/core|next|nuxt|solid-js|preact|astro|gatsby|@remix-run/react)"\s*:"#).unwrap(),
        Regex::new(r"(?m)^\s*(yew|leptos|dioxus|sycamore)\s*=").unwrap(),
    ]
});

static SERVER_FRAMEWORKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r#""(express|fastify|koa|@hapi/hapi|@nestjs/core|hono|restify)"\s*:"#).unwrap(),
        Regex::new(r"(?m)^\s*(actix-web|axum|rocket|warp|poem|tide)\s*=").unwrap(),
        python_dependency("flask|django|fastapi|starlette|aiohttp|sanic|tornado"),
        Regex::new(r"github\.com/(gin-gonic/gin|labstack/echo|gofiber/fiber|go-chi/chi|gorilla/mux)").unwrap(),
        Regex::new(r"\b(spring-boot-starter-web|sinatra|rails)\b").unwrap(),
    ]
});

static CLI_LIBRARIES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r#""(commander|yargs|meow|oclif|@oclif/core|cac|citty)"\s*:"#).unwrap(),
        Regex::new(r"(?m)^\s*(clap|structopt|argh|pico-args)\s*=").unwrap(),
        python_dependency("click|typer|docopt"),
        Regex::new(r"github\.com/(spf13/cobra|urfave/cli)").unwrap(),
    ]
});

/// Matches `names` only where Python manifests declare dependencies: a
/// requirements or Poetry line that starts with the name, or a quoted entry
/// in a PEP 621 / setup.py list.
fn python_dependency(names: &str) -> Regex {
    let pattern = format!(
        r#"(?im)^\s*({names})\s*([<>=~!;\[]|$)|["']({names})\s*([<>=~!;\[]|["'])"#
    );
    Regex::new(&pattern).unwrap()
}

static NPM_BIN_FIELD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""bin"\s*:"#).unwrap());

static NPM_LIBRARY_FIELDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(main|exports|module|types|typings)"\s*:"#).unwrap());

static NPM_WORKSPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""workspaces"\s*:"#).unwrap());

static CARGO_WORKSPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\[workspace\]").unwrap());

static CARGO_LIB: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*\[lib\]").unwrap());

const WORKSPACE_FILES: &[&str] = &[
    "pnpm-workspace.yaml",
    "lerna.json",
    "nx.json",
    "turbo.json",
    "rush.json",
    "go.work",
];

const COMPOSE_FILES: &[&str] = &[
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

const IAC_EXTENSIONS: &[&str] = &["tf", "tfvars", "hcl"];

/// Everything the rules look at, gathered once per checkout.
#[derive(Debug, Default, Clone)]
pub struct RepoFacts {
    /// Relative `/`-separated paths of files within the walk depth.
    pub files: Vec<String>,
    /// Relative `/`-separated paths of directories within the walk depth.
    pub dirs: Vec<String>,
    /// Root-level manifest contents keyed by file name.
    pub manifests: BTreeMap<String, String>,
    /// Which of `DEEP_EXTENSIONS` occur anywhere outside noise directories.
    pub deep_extensions: BTreeSet<String>,
}

impl RepoFacts {
    /// Walk `root` and read its manifests. Errors are swallowed; a missing
    /// root produces empty facts.
    pub fn collect(root: &Path) -> Self {
        let mut facts = RepoFacts::default();

        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(WALK_DEPTH)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !(e.file_type().is_dir() && is_noise_dir(&e.file_name().to_string_lossy())));

        for entry in walker.filter_map(|e| e.ok()).take(MAX_WALK_ENTRIES) {
            let Ok(rel) = entry.path().strip_prefix(root) else {
                continue;
            };
            let rel = rel.to_string_lossy().replace('\\', "/");
            if entry.file_type().is_dir() {
                facts.dirs.push(rel);
            } else {
                facts.files.push(rel);
            }
        }

        facts.deep_extensions = scan_deep_extensions(root);

        for name in MANIFEST_FILES {
            if let Ok(bytes) = std::fs::read(root.join(name)) {
                let end = bytes.len().min(MAX_MANIFEST_BYTES);
                let text = String::from_utf8_lossy(&bytes[..end]).to_string();
                facts.manifests.insert((*name).to_string(), text);
            }
        }

        facts
    }

    pub fn manifest(&self, name: &str) -> Option<&str> {
        self.manifests.get(name).map(String::as_str)
    }

    fn any_manifest_matches(&self, patterns: &[Regex]) -> bool {
        self.manifests
            .values()
            .any(|text| patterns.iter().any(|re| re.is_match(text)))
    }

    fn has_root_file(&self, name: &str) -> bool {
        self.files.iter().any(|f| f == name)
    }

    fn has_file_named(&self, pred: impl Fn(&str) -> bool) -> bool {
        self.files
            .iter()
            .any(|f| pred(f.rsplit('/').next().unwrap_or(f)))
    }

    fn has_extension(&self, extensions: &[&str]) -> bool {
        let deep = extensions.iter().any(|x| self.deep_extensions.contains(*x));
        deep || self.files.iter().any(|f| {
            Path::new(f)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
        })
    }

    fn has_root_dir(&self, name: &str) -> bool {
        self.dirs.iter().any(|d| d == name)
    }

    /// True when `dir` exists at the root and has at least one subdirectory.
    fn has_populated_dir(&self, dir: &str) -> bool {
        let prefix = format!("{}/", dir);
        self.dirs
            .iter()
            .any(|d| d.strip_prefix(&prefix).is_some_and(|rest| !rest.is_empty() && !rest.contains('/')))
    }
}

/// Unbounded walk for `DEEP_EXTENSIONS`. Stops at the first notebook, since
/// nothing ranks above `ml`, or once every extension has been seen.
fn scan_deep_extensions(root: &Path) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && is_noise_dir(&e.file_name().to_string_lossy())));

    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(ext) = entry.path().extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if DEEP_EXTENSIONS.contains(&ext.as_str()) {
            let notebook = ext == "ipynb";
            found.insert(ext);
            if notebook || found.len() == DEEP_EXTENSIONS.len() {
                break;
            }
        }
    }
    found
}

/// One step of the classification priority chain.
pub struct Rule {
    pub label: Classification,
    pub description: &'static str,
    matches: fn(&RepoFacts) -> bool,
}

impl Rule {
    pub fn matches(&self, facts: &RepoFacts) -> bool {
        (self.matches)(facts)
    }
}

/// The priority chain. Order is significant.
pub static RULES: &[Rule] = &[
    Rule {
        label: Classification::Ml,
        description: "notebook present or ML library in a manifest",
        matches: is_ml,
    },
    Rule {
        label: Classification::Monorepo,
        description: "workspace manifest or populated packages/ or apps/",
        matches: is_monorepo,
    },
    Rule {
        label: Classification::Infra,
        description: "container, compose or infrastructure-as-code files",
        matches: is_infra,
    },
    Rule {
        label: Classification::Frontend,
        description: "front-end framework in a manifest",
        matches: is_frontend,
    },
    Rule {
        label: Classification::Api,
        description: "server framework in a manifest",
        matches: is_api,
    },
    Rule {
        label: Classification::Cli,
        description: "command-line entry directory or argument-parsing library",
        matches: is_cli,
    },
    Rule {
        label: Classification::Library,
        description: "package manifest exposing a library entry point",
        matches: is_library,
    },
];

fn is_ml(facts: &RepoFacts) -> bool {
    facts.has_extension(&["ipynb"]) || facts.manifests.values().any(|t| ML_LIBRARIES.is_match(t))
}

fn is_monorepo(facts: &RepoFacts) -> bool {
    WORKSPACE_FILES.iter().any(|f| facts.has_root_file(f))
        || facts.manifest("package.json").is_some_and(|t| NPM_WORKSPACES.is_match(t))
        || facts.manifest("Cargo.toml").is_some_and(|t| CARGO_WORKSPACE.is_match(t))
        || facts.has_populated_dir("packages")
        || facts.has_populated_dir("apps")
}

fn is_infra(facts: &RepoFacts) -> bool {
    facts.has_file_named(|name| {
        name == "Dockerfile"
            || name.starts_with("Dockerfile.")
            || name.ends_with(".dockerfile")
            || COMPOSE_FILES.contains(&name)
    }) || facts.has_extension(IAC_EXTENSIONS)
}

fn is_frontend(facts: &RepoFacts) -> bool {
    facts.any_manifest_matches(&FRONTEND_FRAMEWORKS)
}

fn is_api(facts: &RepoFacts) -> bool {
    facts.any_manifest_matches(&SERVER_FRAMEWORKS)
}

fn is_cli(facts: &RepoFacts) -> bool {
    facts.has_root_dir("bin")
        || facts.has_root_dir("cmd")
        || facts.manifest("package.json").is_some_and(|t| NPM_BIN_FIELD.is_match(t))
        || facts.any_manifest_matches(&CLI_LIBRARIES)
}

fn is_library(facts: &RepoFacts) -> bool {
    facts.manifest("package.json").is_some_and(|t| NPM_LIBRARY_FIELDS.is_match(t))
        || facts.manifest("Cargo.toml").is_some_and(|t| CARGO_LIB.is_match(t))
        || facts.has_root_file("src/lib.rs")
        || facts.has_root_file("setup.py")
        || facts.has_root_file("setup.cfg")
}

/// Evaluate the rule table against pre-collected facts.
pub fn classify_facts(facts: &RepoFacts) -> Classification {
    matching_rule(facts)
        .map(|rule| rule.label)
        .unwrap_or(Classification::Generic)
}

/// The first rule that matches, if any.
pub fn matching_rule(facts: &RepoFacts) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.matches(facts))
}

/// Classify the checkout at `root`.
pub fn classify(root: &Path) -> Classification {
    classify_facts(&RepoFacts::collect(root))
}
