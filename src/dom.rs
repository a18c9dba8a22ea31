use kuchiki::{ElementData, NodeRef};

pub fn has_class(el: &ElementData, class: &str) -> bool {
    el.attributes
        .borrow()
        .get("class")
        .map(|v| v.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

pub fn add_class(el: &ElementData, class: &str) {
    if has_class(el, class) {
        return;
    }
    let mut attrs = el.attributes.borrow_mut();
    let current = attrs.get("class").unwrap_or("").trim().to_string();
    let next = if current.is_empty() {
        class.to_string()
    } else {
        format!("{current} {class}")
    };
    attrs.insert("class", next);
}

pub fn remove_class(el: &ElementData, class: &str) {
    let mut attrs = el.attributes.borrow_mut();
    let Some(current) = attrs.get("class").map(|s| s.to_string()) else {
        return;
    };
    let kept: Vec<&str> = current.split_whitespace().filter(|c| *c != class).collect();
    attrs.insert("class", kept.join(" "));
}

/// Flips `class` and returns whether it is present afterwards.
pub fn toggle_class(el: &ElementData, class: &str) -> bool {
    if has_class(el, class) {
        remove_class(el, class);
        false
    } else {
        add_class(el, class);
        true
    }
}

/// First element sibling after `node`, skipping text and comments.
pub fn next_element_sibling(node: &NodeRef) -> Option<NodeRef> {
    let mut cur = node.next_sibling();
    while let Some(n) = cur {
        if n.as_element().is_some() {
            return Some(n);
        }
        cur = n.next_sibling();
    }
    None
}

/// First element sibling before `node`, skipping text and comments.
pub fn previous_element_sibling(node: &NodeRef) -> Option<NodeRef> {
    let mut cur = node.previous_sibling();
    while let Some(n) = cur {
        if n.as_element().is_some() {
            return Some(n);
        }
        cur = n.previous_sibling();
    }
    None
}

/// First descendant (excluding `node` itself) carrying `class`.
pub fn find_descendant_with_class(node: &NodeRef, class: &str) -> Option<NodeRef> {
    node.descendants()
        .find(|d| d.as_element().map(|el| has_class(el, class)).unwrap_or(false))
}

pub fn elements_with_class(root: &NodeRef, class: &str) -> Vec<NodeRef> {
    root.descendants()
        .filter(|d| d.as_element().map(|el| has_class(el, class)).unwrap_or(false))
        .collect()
}

pub fn same_node(a: &NodeRef, b: &NodeRef) -> bool {
    std::rc::Rc::ptr_eq(&a.0, &b.0)
}

pub fn tag_name(node: &NodeRef) -> String {
    node.as_element()
        .map(|el| el.name.local.to_string())
        .unwrap_or_default()
}

/// Reads one declaration out of an inline `style` attribute.
pub fn style_property(el: &ElementData, property: &str) -> Option<String> {
    let attrs = el.attributes.borrow();
    let style = attrs.get("style")?;
    parse_declarations(style)
        .into_iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(property))
        .map(|(_, value)| value)
}

/// Sets one declaration of the inline `style` attribute, keeping the others in place.
pub fn set_style_property(el: &ElementData, property: &str, value: &str) {
    let mut attrs = el.attributes.borrow_mut();
    let mut decls = attrs
        .get("style")
        .map(parse_declarations)
        .unwrap_or_default();
    match decls
        .iter_mut()
        .find(|(name, _)| name.eq_ignore_ascii_case(property))
    {
        Some(slot) => slot.1 = value.to_string(),
        None => decls.push((property.to_string(), value.to_string())),
    }
    let style = decls
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ");
    attrs.insert("style", style);
}

fn parse_declarations(style: &str) -> Vec<(String, String)> {
    split_declarations(style)
        .into_iter()
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Splits at `;` outside quoted strings and parentheses.
fn split_declarations(style: &str) -> Vec<&str> {
    let re = regex::Regex::new(r#"(?s)"(?:[^"\\]|\\.)*"?|'(?:[^'\\]|\\.)*'?|[();]"#)
        .expect("style token regex");
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for m in re.find_iter(style) {
        match m.as_str() {
            "(" => depth += 1,
            ")" => depth = depth.saturating_sub(1),
            ";" if depth == 0 => {
                parts.push(&style[start..m.start()]);
                start = m.end();
            }
            _ => {}
        }
    }
    parts.push(&style[start..]);
    parts
}
