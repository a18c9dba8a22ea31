//! Collapsible report sections.
//!
//! A report page pairs every header element with the details panel that
//! immediately follows it. Once the page signals that its content is ready,
//! [`ToggleController`] collapses every panel and starts handling clicks on
//! headers: a click flips the paired panel's hidden marker and rotates the
//! header's chevron to match.

use std::fmt;

use anyhow::Context as _;
use kuchiki::NodeRef;
use kuchiki::traits::TendrilSink as _;

use crate::dom;

/// Class names that tie headers, panels and indicators together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    pub header_class: String,
    pub panel_class: String,
    pub indicator_class: String,
    pub hidden_class: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            header_class: "test-header".to_string(),
            panel_class: "test-details".to_string(),
            indicator_class: "fa-chevron-right".to_string(),
            hidden_class: "hidden".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Deg0,
    Deg90,
}

impl Rotation {
    pub fn for_collapsed(collapsed: bool) -> Self {
        if collapsed {
            Rotation::Deg0
        } else {
            Rotation::Deg90
        }
    }

    fn transform(self) -> &'static str {
        match self {
            Rotation::Deg0 => "rotate(0deg)",
            Rotation::Deg90 => "rotate(90deg)",
        }
    }

    fn from_transform(value: &str) -> Self {
        let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.eq_ignore_ascii_case("rotate(90deg)") {
            Rotation::Deg90
        } else {
            Rotation::Deg0
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rotation::Deg0 => f.write_str("0deg"),
            Rotation::Deg90 => f.write_str("90deg"),
        }
    }
}

/// A registered header. Its panel and indicator are looked up from the
/// current tree each time they are needed, so later edits to the document
/// are always honoured.
#[derive(Debug, Clone)]
pub struct Section {
    pub header: NodeRef,
}

impl Section {
    /// The header's next element sibling.
    pub fn panel(&self) -> Option<NodeRef> {
        dom::next_element_sibling(&self.header)
    }

    pub fn indicator(&self, selectors: &Selectors) -> Option<NodeRef> {
        dom::find_descendant_with_class(&self.header, &selectors.indicator_class)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionState {
    pub index: usize,
    pub title: String,
    pub has_panel: bool,
    pub collapsed: Option<bool>,
    pub rotation: Option<Rotation>,
}

pub struct ToggleController {
    selectors: Selectors,
    sections: Vec<Section>,
}

impl ToggleController {
    pub fn new(selectors: Selectors) -> Self {
        Self {
            selectors,
            sections: Vec::new(),
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Marks every panel in the document collapsed.
    pub fn initialize(&self, document: &NodeRef) {
        let panels = dom::elements_with_class(document, &self.selectors.panel_class);
        for panel in &panels {
            if let Some(el) = panel.as_element() {
                dom::add_class(el, &self.selectors.hidden_class);
            }
        }
        tracing::debug!(count = panels.len(), "collapsed details panels");
    }

    pub fn register_handlers(&mut self, document: &NodeRef) {
        self.sections = dom::elements_with_class(document, &self.selectors.header_class)
            .into_iter()
            .map(|header| Section { header })
            .collect();
        tracing::debug!(count = self.sections.len(), "registered header click handlers");
    }

    pub fn section_index(&self, header: &NodeRef) -> Option<usize> {
        self.sections
            .iter()
            .position(|s| dom::same_node(&s.header, header))
    }

    /// Handles a click on the header at `index`. Headers without a following
    /// element are left untouched.
    pub fn on_header_click(&self, index: usize) {
        let Some(section) = self.sections.get(index) else {
            return;
        };
        let Some(panel) = section.panel() else {
            tracing::trace!(index, "header has no following element; skipping");
            return;
        };
        let Some(panel_el) = panel.as_element() else {
            return;
        };

        let collapsed = dom::toggle_class(panel_el, &self.selectors.hidden_class);

        let indicator = section.indicator(&self.selectors);
        if let Some(indicator) = indicator.as_ref().and_then(|i| i.as_element()) {
            dom::set_style_property(
                indicator,
                "transform",
                Rotation::for_collapsed(collapsed).transform(),
            );
        }
        tracing::trace!(index, collapsed, "toggled section");
    }

    pub fn is_collapsed(&self, index: usize) -> Option<bool> {
        let panel = self.sections.get(index)?.panel()?;
        let el = panel.as_element()?;
        Some(dom::has_class(el, &self.selectors.hidden_class))
    }

    pub fn rotation(&self, index: usize) -> Option<Rotation> {
        let indicator = self.sections.get(index)?.indicator(&self.selectors)?;
        let el = indicator.as_element()?;
        Some(
            dom::style_property(el, "transform")
                .map(|v| Rotation::from_transform(&v))
                .unwrap_or(Rotation::Deg0),
        )
    }

    pub fn state(&self, index: usize) -> Option<SectionState> {
        let section = self.sections.get(index)?;
        Some(SectionState {
            index,
            title: section_title(section, &self.selectors),
            has_panel: section.panel().is_some(),
            collapsed: self.is_collapsed(index),
            rotation: self.rotation(index),
        })
    }

    pub fn states(&self) -> Vec<SectionState> {
        (0..self.sections.len())
            .filter_map(|i| self.state(i))
            .collect()
    }
}

fn section_title(section: &Section, selectors: &Selectors) -> String {
    let name = dom::find_descendant_with_class(&section.header, "test-name")
        .map(|n| n.text_contents())
        .unwrap_or_else(|| section.header.text_contents());
    let title = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() {
        format!("<{} class=\"{}\">", dom::tag_name(&section.header), selectors.header_class)
    } else {
        title
    }
}

/// A loaded report page and the lifecycle events delivered to it.
pub struct Page {
    document: NodeRef,
    controller: ToggleController,
    ready: bool,
}

impl Page {
    pub fn parse(html: &str, selectors: Selectors) -> Self {
        Self::from_document(kuchiki::parse_html().one(html), selectors)
    }

    pub fn from_document(document: NodeRef, selectors: Selectors) -> Self {
        Self {
            document,
            controller: ToggleController::new(selectors),
            ready: false,
        }
    }

    pub fn document(&self) -> &NodeRef {
        &self.document
    }

    pub fn controller(&self) -> &ToggleController {
        &self.controller
    }

    /// Delivers the content-ready signal. Only the first call has any effect.
    pub fn content_ready(&mut self) -> bool {
        if self.ready {
            return false;
        }
        self.ready = true;
        self.controller.initialize(&self.document);
        self.controller.register_handlers(&self.document);
        true
    }

    /// Dispatches a click on `target`. The click bubbles through the target's
    /// ancestors and every registered header on the way handles it.
    pub fn click(&self, target: &NodeRef) {
        let mut cur = Some(target.clone());
        while let Some(node) = cur {
            if let Some(index) = self.controller.section_index(&node) {
                self.controller.on_header_click(index);
            }
            cur = node.parent();
        }
    }

    /// Clicks the `index`-th header in document order.
    pub fn click_header(&self, index: usize) -> anyhow::Result<()> {
        let header = self
            .controller
            .sections()
            .get(index)
            .map(|s| s.header.clone())
            .with_context(|| {
                format!(
                    "no header #{index} (page has {} headers)",
                    self.controller.sections().len()
                )
            })?;
        self.click(&header);
        Ok(())
    }

    pub fn to_html(&self) -> anyhow::Result<String> {
        let mut out = Vec::new();
        self.document
            .serialize(&mut out)
            .context("serialize page")?;
        String::from_utf8(out).context("page html not utf-8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kuchiki::traits::TendrilSink as _;

    const PAIR: &str = r#"
        <div class="test-header"><i class="fas fa-chevron-right"></i><span class="test-name">ping</span></div>
        <div class="test-details">log</div>
    "#;

    fn ready(html: &str) -> Page {
        let mut page = Page::parse(html, Selectors::default());
        assert!(page.content_ready());
        page
    }

    #[test]
    fn panels_start_collapsed() {
        let page = ready(
            r#"<div class="test-details"></div><div class="test-details hidden"></div><div class="test-details"></div>"#,
        );
        for panel in dom::elements_with_class(page.document(), "test-details") {
            assert!(dom::has_class(panel.as_element().unwrap(), "hidden"));
        }
    }

    #[test]
    fn click_expands_then_collapses() {
        let page = ready(PAIR);
        let c = page.controller();
        assert_eq!(c.is_collapsed(0), Some(true));
        assert_eq!(c.rotation(0), Some(Rotation::Deg0));

        page.click_header(0).unwrap();
        assert_eq!(c.is_collapsed(0), Some(false));
        assert_eq!(c.rotation(0), Some(Rotation::Deg90));

        page.click_header(0).unwrap();
        assert_eq!(c.is_collapsed(0), Some(true));
        assert_eq!(c.rotation(0), Some(Rotation::Deg0));
    }

    #[test]
    fn header_without_sibling_is_ignored() {
        let page = ready(
            r#"<div><div class="test-header"><i class="fa-chevron-right" style="color: red"></i></div></div>"#,
        );
        let before = page.to_html().unwrap();
        page.click_header(0).unwrap();
        assert_eq!(page.to_html().unwrap(), before);
        assert_eq!(page.controller().is_collapsed(0), None);
        assert_eq!(page.controller().rotation(0), Some(Rotation::Deg0));
    }

    #[test]
    fn click_on_chevron_bubbles_to_header() {
        let page = ready(PAIR);
        let chevron = page
            .document()
            .select_first(".fa-chevron-right")
            .unwrap()
            .as_node()
            .clone();
        page.click(&chevron);
        assert_eq!(page.controller().is_collapsed(0), Some(false));
    }

    #[test]
    fn clicks_before_ready_do_nothing() {
        let mut page = Page::parse(PAIR, Selectors::default());
        let header = page
            .document()
            .select_first(".test-header")
            .unwrap()
            .as_node()
            .clone();
        page.click(&header);
        assert!(!page.to_html().unwrap().contains("hidden"));

        assert!(page.content_ready());
        assert!(!page.content_ready());
        assert_eq!(page.controller().sections().len(), 1);
        assert_eq!(page.controller().is_collapsed(0), Some(true));
    }

    #[test]
    fn panel_is_looked_up_when_clicked() {
        let page = ready(
            r#"<div class="test-header">h</div><div class="test-details" id="old">x</div>"#,
        );
        let header = page.controller().sections()[0].header.clone();
        let inserted = kuchiki::parse_html()
            .one(r#"<section id="new"></section>"#)
            .select_first("section")
            .unwrap()
            .as_node()
            .clone();
        header.insert_after(inserted);

        page.click_header(0).unwrap();

        let new = page.document().select_first("#new").unwrap();
        let old = page.document().select_first("#old").unwrap();
        assert!(dom::has_class(&new, "hidden"));
        assert!(dom::has_class(&old, "hidden"));
        assert_eq!(page.controller().is_collapsed(0), Some(true));

        page.click_header(0).unwrap();
        assert!(!dom::has_class(&new, "hidden"));
        assert!(dom::has_class(&old, "hidden"));
    }

    #[test]
    fn indicator_added_after_ready_is_rotated() {
        let page = ready(PAIR);
        let header = page.controller().sections()[0].header.clone();
        for old in header.select(".fa-chevron-right").unwrap().collect::<Vec<_>>() {
            old.as_node().detach();
        }
        assert_eq!(page.controller().rotation(0), None);

        let arrow = kuchiki::parse_html()
            .one(r#"<b class="fa-chevron-right"></b>"#)
            .select_first("b")
            .unwrap()
            .as_node()
            .clone();
        header.append(arrow);
        page.click_header(0).unwrap();
        assert_eq!(page.controller().rotation(0), Some(Rotation::Deg90));
    }

    #[test]
    fn missing_header_index_is_an_error() {
        let page = ready(PAIR);
        assert!(page.click_header(3).is_err());
    }

    #[test]
    fn section_titles_come_from_test_name() {
        let page = ready(PAIR);
        let states = page.controller().states();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].title, "ping");
        assert!(states[0].has_panel);
    }

    #[test]
    fn custom_selectors() {
        let selectors = Selectors {
            header_class: "h".to_string(),
            panel_class: "p".to_string(),
            indicator_class: "arrow".to_string(),
            hidden_class: "collapsed".to_string(),
        };
        let mut page = Page::parse(
            r#"<h3 class="h"><span class="arrow"></span>A</h3><section class="p"></section>"#,
            selectors,
        );
        page.content_ready();
        assert_eq!(page.controller().is_collapsed(0), Some(true));
        page.click_header(0).unwrap();
        assert_eq!(page.controller().is_collapsed(0), Some(false));
        assert_eq!(page.controller().rotation(0), Some(Rotation::Deg90));
    }
}
