use std::fmt;

use kuchiki::NodeRef;
use kuchiki::traits::TendrilSink as _;

use crate::dom;
use crate::toggle::Selectors;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingIssue {
    /// Header at `header` (document order) has no element after it.
    MissingPanel { header: usize },
    /// Header's next element is something other than a panel.
    NotAPanel { header: usize, found: String },
    /// Panel at `panel` (document order) does not directly follow a header.
    OrphanPanel { panel: usize },
}

impl fmt::Display for PairingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairingIssue::MissingPanel { header } => {
                write!(f, "header #{header} has no following element")
            }
            PairingIssue::NotAPanel { header, found } => {
                write!(f, "header #{header} is followed by <{found}> instead of a panel")
            }
            PairingIssue::OrphanPanel { panel } => {
                write!(f, "panel #{panel} is not preceded by a header")
            }
        }
    }
}

/// Checks that every header is immediately followed by its panel.
pub fn check_pairing(html: &str, selectors: &Selectors) -> Vec<PairingIssue> {
    let doc = kuchiki::parse_html().one(html);
    check_document(&doc, selectors)
}

pub fn check_document(doc: &NodeRef, selectors: &Selectors) -> Vec<PairingIssue> {
    let is = |node: &NodeRef, class: &str| {
        node.as_element()
            .map(|el| dom::has_class(el, class))
            .unwrap_or(false)
    };

    let mut issues = Vec::new();
    for (i, header) in dom::elements_with_class(doc, &selectors.header_class)
        .iter()
        .enumerate()
    {
        match dom::next_element_sibling(header) {
            None => issues.push(PairingIssue::MissingPanel { header: i }),
            Some(next) if !is(&next, &selectors.panel_class) => {
                issues.push(PairingIssue::NotAPanel {
                    header: i,
                    found: dom::tag_name(&next),
                })
            }
            Some(_) => {}
        }
    }

    for (i, panel) in dom::elements_with_class(doc, &selectors.panel_class)
        .iter()
        .enumerate()
    {
        let paired = dom::previous_element_sibling(panel)
            .map(|prev| is(&prev, &selectors.header_class))
            .unwrap_or(false);
        if !paired {
            issues.push(PairingIssue::OrphanPanel { panel: i });
        }
    }

    issues
}
