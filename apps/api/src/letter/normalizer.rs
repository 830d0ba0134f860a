//! Markup normalizer. Rewrites the LaTeX `letter` subset into a styled HTML document.
//!
//! This is a textual rewrite, not a parser: an ordered rule table applied over
//! the whole buffer, each rule seeing the output of the previous one.
//! Anything outside the table passes through literally.

use once_cell::sync::Lazy;
use regex::Regex;

/// Whether a rule rewrites the first match only or every match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    First,
    All,
}

struct Rule {
    pattern: Regex,
    replacement: &'static str,
    scope: Scope,
}

impl Rule {
    fn new(pattern: &str, replacement: &'static str, scope: Scope) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("normalizer rule pattern must compile"),
            replacement,
            scope,
        }
    }

    fn apply(&self, text: &str) -> String {
        match self.scope {
            Scope::First => self.pattern.replacen(text, 1, self.replacement).into_owned(),
            Scope::All => self.pattern.replace_all(text, self.replacement).into_owned(),
        }
    }
}

/// Order matters: preamble lines go first, then the letter block, then lists,
/// and paragraph splitting runs last so it sees the removed lines as gone.
static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(r"\\documentclass.*\n", "", Scope::First),
        Rule::new(r"\\usepackage.*\n", "", Scope::All),
        Rule::new(r"\\geometry.*\n", "", Scope::All),
        Rule::new(r"\\begin\{document\}", "", Scope::First),
        Rule::new(r"\\end\{document\}", "", Scope::First),
        Rule::new(
            r"\\begin\{letter\}\{([^}]+)\}",
            r#"<div class="letter-header">${1}</div>"#,
            Scope::First,
        ),
        Rule::new(r"\\end\{letter\}", "", Scope::First),
        Rule::new(
            r"\\opening\{([^}]+)\}",
            r#"<div class="opening">${1}</div>"#,
            Scope::First,
        ),
        Rule::new(
            r"\\closing\{([^}]+)\}",
            r#"<div class="closing">${1}</div>"#,
            Scope::First,
        ),
        Rule::new(
            r"\\signature\{([^}]+)\}",
            r#"<div class="signature">${1}</div>"#,
            Scope::First,
        ),
        Rule::new(r"\\begin\{itemize\}", "<ul>", Scope::All),
        Rule::new(r"\\end\{itemize\}", "</ul>", Scope::All),
        Rule::new(r"\\item\s+", "<li>", Scope::All),
        Rule::new(r"\\\\", "<br>", Scope::All),
        Rule::new(r"\n\s*\n", "</p><p>", Scope::All),
    ]
});

const DOCUMENT_HEAD: &str = r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Cover Letter</title>
    <style>
        body {
            font-family: 'Times New Roman', serif;
            line-height: 1.6;
            max-width: 8.5in;
            margin: 0 auto;
            padding: 1in;
            color: #333;
        }
        .letter-header {
            margin-bottom: 2em;
            white-space: pre-line;
        }
        .opening {
            margin-bottom: 1em;
        }
        .closing {
            margin-top: 2em;
            margin-bottom: 1em;
        }
        .signature {
            margin-top: 3em;
        }
        p {
            margin-bottom: 1em;
        }
        ul {
            margin: 1em 0;
            padding-left: 2em;
        }
        li {
            margin-bottom: 0.5em;
        }
    </style>
</head>
<body>
    <p>"#;

const DOCUMENT_TAIL: &str = "</p>\n</body>\n</html>";

/// Converts letter markup into a complete HTML document. Never fails.
pub fn normalize(markup: &str) -> String {
    let body = RULES
        .iter()
        .fold(markup.to_string(), |text, rule| rule.apply(&text));
    wrap_document(&body)
}

/// Places already-rewritten body text inside the fixed document shell.
pub fn wrap_document(body: &str) -> String {
    let mut html = String::with_capacity(DOCUMENT_HEAD.len() + body.len() + DOCUMENT_TAIL.len());
    html.push_str(DOCUMENT_HEAD);
    html.push_str(body);
    html.push_str(DOCUMENT_TAIL);
    html
}
