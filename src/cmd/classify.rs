//! Local classification: `showcase classify`.

use std::path::Path;

use anyhow::{Result, bail};
use console::style;
use showcase::analysis::RepoFacts;
use showcase::analysis::classifier::{classify_facts, matching_rule};
use showcase::templates::template_for;

pub fn cmd_classify(path: &Path) -> Result<()> {
    if !path.is_dir() {
        bail!("{} is not a directory", path.display());
    }

    let facts = RepoFacts::collect(path);
    let label = classify_facts(&facts);
    let rule = matching_rule(&facts);

    println!("{}", style(label.as_str()).bold());
    match rule {
        Some(rule) => println!("  reason:   {}", rule.description),
        None => println!("  reason:   no rule matched"),
    }
    println!("  template: {}", template_for(label).name);
    Ok(())
}
