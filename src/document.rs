//! Document builder: wrap a LaTeX fragment in a minimal compilable document.
//!
//! Pure functions only — no I/O, no side effects. Given the same [`Item`]
//! the output is byte-identical, which is what makes the generated source
//! directly assertable in tests without running the toolchain.
//!
//! Equations get a math-oriented preamble; pseudocode additionally loads the
//! algorithm packages with numbering suppressed, so a bare
//! `\begin{algorithm}…\end{algorithm}` block compiles standalone.

use crate::loader::{Item, ItemKind};
use once_cell::sync::Lazy;
use regex::Regex;

/// Packages shared by every generated document.
const BASE_PREAMBLE: &str = r"\documentclass[12pt]{article}
\usepackage{amsmath}
\usepackage{amssymb}
\usepackage{amsfonts}
\usepackage{xcolor}
\usepackage[utf8]{inputenc}
\usepackage{siunitx}
\thispagestyle{empty}
";

/// Extra packages for pseudocode. algorithmicx and algpseudocode are the
/// compatible pair; adding `algorithmic` alongside them conflicts.
const ALGORITHM_PREAMBLE: &str = r"\usepackage{algorithm}
\usepackage{algorithmicx}
\usepackage{algpseudocode}
\usepackage{graphicx}
\renewcommand{\thealgorithm}{}
\floatname{algorithm}{}
";

static RE_CAPTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\caption\{(.*?)\}").unwrap());

/// Build the complete `.tex` source for one item.
pub fn build_document(item: &Item) -> String {
    match item.kind {
        ItemKind::Equation => {
            let body = align_equation(&item.latex, item.auto_align);
            format!("{BASE_PREAMBLE}\\begin{{document}}\n{body}\n\\end{{document}}")
        }
        ItemKind::Pseudocode => {
            let body = rewrite_caption(&item.latex);
            format!(
                "{BASE_PREAMBLE}{ALGORITHM_PREAMBLE}\\begin{{document}}\n{body}\n\\end{{document}}"
            )
        }
    }
}

/// Wrap a bare equation fragment in `align*` when requested.
///
/// Fragments that already contain an environment (`\begin{`/`\end{`) are left
/// alone even with `auto_align` on — double-wrapping `align*` inside, say,
/// `cases` or a user-provided `equation` environment would not compile.
fn align_equation(latex: &str, auto_align: bool) -> String {
    if auto_align && !latex.contains("\\begin{") && !latex.contains("\\end{") {
        format!("\\begin{{align*}}{latex}\\end{{align*}}")
    } else {
        latex.to_string()
    }
}

/// Prefix the first `\caption{…}` of an `algorithm` block with "Algorithm: ".
///
/// The preamble suppresses the float's own "Algorithm" label (so uncaptioned
/// blocks render clean); captioned blocks get the word back inside their
/// caption text instead.
fn rewrite_caption(latex: &str) -> String {
    if !latex.contains("\\begin{algorithm}") || !latex.contains("\\caption{") {
        return latex.to_string();
    }
    RE_CAPTION
        .replace(latex, |caps: &regex::Captures<'_>| {
            format!("\\caption{{Algorithm: {}}}", &caps[1])
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equation(latex: &str, auto_align: bool) -> Item {
        Item {
            index: 0,
            id: "equation_0".into(),
            latex: latex.into(),
            auto_align,
            kind: ItemKind::Equation,
        }
    }

    fn pseudocode(latex: &str) -> Item {
        Item {
            index: 0,
            id: "pseudocode_0".into(),
            latex: latex.into(),
            auto_align: true,
            kind: ItemKind::Pseudocode,
        }
    }

    #[test]
    fn equation_is_wrapped_in_align_star() {
        let doc = build_document(&equation("a + b = c", true));
        assert!(doc.contains("\\begin{align*}a + b = c\\end{align*}"));
        assert!(doc.starts_with("\\documentclass[12pt]{article}"));
        assert!(doc.ends_with("\\end{document}"));
    }

    #[test]
    fn auto_align_false_leaves_fragment_verbatim() {
        let doc = build_document(&equation("a + b = c", false));
        assert!(!doc.contains("align*"));
        assert!(doc.contains("\na + b = c\n"));
    }

    #[test]
    fn existing_environment_is_never_double_wrapped() {
        let doc = build_document(&equation("\\begin{equation}x\\end{equation}", true));
        assert!(!doc.contains("align*"));
        assert!(doc.contains("\\begin{equation}x\\end{equation}"));
    }

    #[test]
    fn equation_preamble_has_no_algorithm_packages() {
        let doc = build_document(&equation("x", true));
        assert!(doc.contains("\\usepackage{amsmath}"));
        assert!(!doc.contains("algpseudocode"));
    }

    #[test]
    fn pseudocode_loads_algorithm_packages() {
        let doc = build_document(&pseudocode(
            "\\begin{algorithmic}\\State $x \\gets 0$\\end{algorithmic}",
        ));
        assert!(doc.contains("\\usepackage{algorithm}"));
        assert!(doc.contains("\\usepackage{algpseudocode}"));
        assert!(doc.contains("\\renewcommand{\\thealgorithm}{}"));
        // pseudocode never gets align-wrapped
        assert!(!doc.contains("align*"));
    }

    #[test]
    fn algorithm_caption_gets_prefixed() {
        let doc = build_document(&pseudocode(
            "\\begin{algorithm}\\caption{Binary Search}\\begin{algorithmic}\\end{algorithmic}\\end{algorithm}",
        ));
        assert!(doc.contains("\\caption{Algorithm: Binary Search}"));
    }

    #[test]
    fn only_first_caption_is_rewritten() {
        let doc = build_document(&pseudocode(
            "\\begin{algorithm}\\caption{A}\\end{algorithm}\\begin{algorithm}\\caption{B}\\end{algorithm}",
        ));
        assert!(doc.contains("\\caption{Algorithm: A}"));
        assert!(doc.contains("\\caption{B}"));
    }

    #[test]
    fn caption_outside_algorithm_block_is_untouched() {
        let doc = build_document(&pseudocode("\\begin{algorithmic}\\caption{X}\\end{algorithmic}"));
        assert!(doc.contains("\\caption{X}"));
        assert!(!doc.contains("Algorithm: X"));
    }

    #[test]
    fn builder_is_deterministic() {
        let item = equation("\\frac{1}{2}", true);
        assert_eq!(build_document(&item), build_document(&item));
    }
}
